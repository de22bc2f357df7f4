use crate::traits::{ChatMessage, ChatRequest, ChatResponse, Provider, Role, ToolCall, ToolSpec};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
struct OllamaRequest {
    model: String,
    messages: Vec<OllamaMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<OllamaTool>>,
    options: OllamaOptions,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct OllamaMessage {
    role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<OllamaToolCall>>,
}

#[derive(Debug, Serialize, Deserialize)]
struct OllamaToolCall {
    function: OllamaFunction,
}

#[derive(Debug, Serialize, Deserialize)]
struct OllamaFunction {
    name: String,
    #[serde(default)]
    arguments: serde_json::Value,
}

#[derive(Debug, Serialize)]
struct OllamaTool {
    r#type: String,
    function: OllamaToolFunction,
}

#[derive(Debug, Serialize)]
struct OllamaToolFunction {
    name: String,
    description: String,
    parameters: serde_json::Value,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f64,
}

#[derive(Debug, Deserialize)]
struct OllamaResponse {
    message: OllamaResponseMessage,
}

#[derive(Debug, Deserialize)]
struct OllamaResponseMessage {
    content: Option<String>,
    tool_calls: Option<Vec<OllamaToolCall>>,
    #[serde(default)]
    thinking: Option<String>,
}

pub struct OllamaProvider {
    client: reqwest::Client,
    base_url: String,
    model: String,
    temperature: f64,
}

impl OllamaProvider {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(300))
            .connect_timeout(std::time::Duration::from_secs(30))
            .build()
            .unwrap_or_default();

        Self {
            client,
            base_url: "http://localhost:11434".to_string(),
            model: "qwen2.5:3b".to_string(),
            temperature: 0.0,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        let url = base_url.into();
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    /// Tool results go back as one user message of `<tool_result>` blocks,
    /// which small local models follow more reliably than `tool` messages.
    fn convert_messages(messages: &[ChatMessage]) -> Vec<OllamaMessage> {
        let mut result = Vec::new();
        let mut tool_results_buffer: Vec<String> = Vec::new();

        for m in messages {
            if m.role == Role::Tool {
                let name = m.name.as_deref().unwrap_or("unknown");
                tool_results_buffer.push(format!(
                    "<tool_result name=\"{}\">\n{}\n</tool_result>",
                    name, m.content
                ));
                continue;
            }

            if !tool_results_buffer.is_empty() {
                result.push(Self::tool_results_message(&mut tool_results_buffer));
            }

            let tool_calls = m.has_tool_calls().then(|| {
                m.tool_calls
                    .iter()
                    .map(|tc| OllamaToolCall {
                        function: OllamaFunction {
                            name: tc.name.clone(),
                            arguments: tc.arguments.clone(),
                        },
                    })
                    .collect()
            });

            result.push(OllamaMessage {
                role: m.role.to_string(),
                content: if m.content.is_empty() {
                    None
                } else {
                    Some(m.content.clone())
                },
                tool_calls,
            });
        }

        if !tool_results_buffer.is_empty() {
            result.push(Self::tool_results_message(&mut tool_results_buffer));
        }

        result
    }

    fn tool_results_message(buffer: &mut Vec<String>) -> OllamaMessage {
        let content = format!("[Tool results]\n{}", buffer.join("\n"));
        buffer.clear();
        OllamaMessage {
            role: "user".to_string(),
            content: Some(content),
            tool_calls: None,
        }
    }

    fn convert_tools(tools: &[ToolSpec]) -> Vec<OllamaTool> {
        tools
            .iter()
            .map(|t| OllamaTool {
                r#type: "function".to_string(),
                function: OllamaToolFunction {
                    name: t.name.clone(),
                    description: t.description.clone(),
                    parameters: t.parameters_schema.clone(),
                },
            })
            .collect()
    }
}

impl Default for OllamaProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Provider for OllamaProvider {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn chat(&self, request: ChatRequest<'_>) -> anyhow::Result<ChatResponse> {
        let ollama_request = OllamaRequest {
            model: self.model.clone(),
            messages: Self::convert_messages(request.messages),
            tools: request.tools.map(Self::convert_tools),
            options: OllamaOptions {
                temperature: self.temperature,
            },
            stream: false,
        };

        let response = self
            .client
            .post(format!("{}/api/chat", self.base_url))
            .json(&ollama_request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!(
                "Ollama API error ({}): {}",
                status,
                error_text
            ));
        }

        let ollama_response: OllamaResponse = response.json().await?;
        let message = ollama_response.message;

        let tool_calls: Vec<ToolCall> = message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|tc| ToolCall {
                id: format!("ollama_{}", uuid::Uuid::new_v4()),
                name: tc.function.name,
                arguments: tc.function.arguments,
            })
            .collect();

        let text = match message.content {
            Some(content) if !content.is_empty() => Some(content),
            _ if tool_calls.is_empty() => message.thinking.filter(|t| !t.is_empty()),
            other => other,
        };

        Ok(ChatResponse { text, tool_calls })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn tool_results_fold_into_one_user_message() {
        let call_a = ToolCall::new("a", "read_records", json!({}));
        let call_b = ToolCall::new("b", "missing", json!({}));
        let messages = vec![
            ChatMessage::system("sys"),
            ChatMessage::user("go"),
            ChatMessage::assistant_with_tool_calls("", vec![call_a.clone(), call_b.clone()]),
            ChatMessage::tool_result(&call_a, "Pepe Romero, 38, Bombero"),
            ChatMessage::tool_result(&call_b, "Error: Tool 'missing' not found"),
        ];

        let converted = OllamaProvider::convert_messages(&messages);

        assert_eq!(converted.len(), 4);
        assert!(converted[2].content.is_none());
        assert_eq!(converted[2].tool_calls.as_ref().unwrap().len(), 2);
        assert_eq!(converted[3].role, "user");
        let folded = converted[3].content.as_deref().unwrap();
        assert!(folded.starts_with("[Tool results]"));
        assert!(folded.contains("<tool_result name=\"read_records\">"));
        assert!(folded.contains("<tool_result name=\"missing\">"));
    }

    #[tokio::test]
    async fn parses_tool_calls_from_api() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/chat")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "message": {
                        "role": "assistant",
                        "content": "",
                        "tool_calls": [
                            {"function": {"name": "read_records", "arguments": {}}}
                        ]
                    },
                    "done": true
                })
                .to_string(),
            )
            .create_async()
            .await;

        let provider = OllamaProvider::new().with_base_url(server.url());
        let messages = [ChatMessage::user("go")];
        let response = provider
            .chat(ChatRequest {
                messages: &messages,
                tools: None,
            })
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(response.tool_calls.len(), 1);
        assert_eq!(response.tool_calls[0].name, "read_records");
        assert!(response.tool_calls[0].id.starts_with("ollama_"));
        assert_eq!(response.text.as_deref(), Some(""));
    }

    #[tokio::test]
    async fn http_errors_surface() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/api/chat")
            .with_status(404)
            .with_body("model 'qwen2.5:3b' not found")
            .create_async()
            .await;

        let provider = OllamaProvider::new().with_base_url(server.url());
        let messages = [ChatMessage::user("go")];
        let err = provider
            .chat(ChatRequest {
                messages: &messages,
                tools: None,
            })
            .await
            .unwrap_err();

        assert!(err.to_string().contains("not found"));
    }
}

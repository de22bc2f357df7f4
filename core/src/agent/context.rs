use crate::agent::Conversation;
use crate::agent::parser::{TOOL_CALL_CLOSE, TOOL_CALL_OPEN};
use crate::traits::{ChatMessage, ToolSpec};
use std::fmt::Write;
use std::path::{Path, PathBuf};

/// Assembles the opening of a run: one system message, one user message.
pub struct ContextBuilder {
    pub instruction: String,
    pub data_file: Option<PathBuf>,
    pub tool_specs: Vec<ToolSpec>,
    pub text_tool_calls: bool,
}

impl ContextBuilder {
    pub fn new(instruction: impl Into<String>) -> Self {
        Self {
            instruction: instruction.into(),
            data_file: None,
            tool_specs: vec![],
            text_tool_calls: false,
        }
    }

    pub fn with_data_file(mut self, path: impl AsRef<Path>) -> Self {
        self.data_file = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn with_tool_specs(mut self, tool_specs: Vec<ToolSpec>) -> Self {
        self.tool_specs = tool_specs;
        self
    }

    /// Describe the `<tool_call>` text protocol in the system prompt.
    pub fn with_text_tool_calls(mut self, enabled: bool) -> Self {
        self.text_tool_calls = enabled;
        self
    }

    pub fn build_system_prompt(&self) -> String {
        let mut parts = vec![self.instruction.trim().to_string()];

        if self.text_tool_calls
            && let Some(protocol) = self.get_tool_instructions()
        {
            parts.push(protocol);
        }

        parts.push(self.get_runtime_context());
        parts.join("\n\n---\n\n")
    }

    fn get_tool_instructions(&self) -> Option<String> {
        if self.tool_specs.is_empty() {
            return None;
        }

        let mut instructions = String::new();
        instructions.push_str("## Tool Use Protocol\n\n");
        instructions.push_str("If you cannot call tools natively, wrap a JSON object in tags:\n\n");
        let _ = writeln!(
            instructions,
            "{}\n{{\"name\": \"tool_name\", \"arguments\": {{\"param\": \"value\"}}}}\n{}\n",
            TOOL_CALL_OPEN, TOOL_CALL_CLOSE
        );
        instructions.push_str("You may request several tools in one response. ");
        instructions.push_str("Their results come back in the next message. ");
        instructions.push_str("Answer without tool calls once the task is done.\n\n");
        instructions.push_str("### Available Tools\n\n");

        for tool in &self.tool_specs {
            let _ = writeln!(
                instructions,
                "**{}**: {}\nParameters: `{}`\n",
                tool.name, tool.description, tool.parameters_schema
            );
        }

        Some(instructions)
    }

    fn get_runtime_context(&self) -> String {
        let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M (%A)");
        let mut context = format!("## Runtime Context\n\n### Current Time\n{}", timestamp);

        if let Some(path) = &self.data_file {
            let _ = write!(context, "\n\n### Data File\n{}", path.display());
        }

        context
    }

    pub fn build(&self, user_message: &str) -> Conversation {
        Conversation::from_messages([
            ChatMessage::system(self.build_system_prompt()),
            ChatMessage::user(user_message),
        ])
    }
}

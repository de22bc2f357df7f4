use crate::agent::parser::parse_tool_calls;
use crate::agent::{Conversation, ToolRegistry};
use crate::error::{AgentError, Phase};
use crate::traits::{
    ChatMessage, ChatRequest, ChatResponse, Provider, ToolCall, ToolErrorKind, ToolResult,
    ToolSpec,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

pub const DEFAULT_MAX_ITERATIONS: usize = 20;

pub type MessageObserver = Arc<dyn Fn(&ChatMessage) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The latest assistant message requested no tools.
    Completed,
    IterationLimit,
    DecideTimeout,
}

#[derive(Debug, Clone)]
pub struct RunReport {
    pub conversation: Conversation,
    pub stop: StopReason,
    pub decide_turns: usize,
    pub execute_turns: usize,
}

impl RunReport {
    pub fn final_answer(&self) -> &str {
        self.conversation.final_answer().unwrap_or_default()
    }
}

enum Decision {
    Message(ChatMessage),
    TimedOut(AgentError),
}

/// Alternates a Decide phase (one model call, one appended assistant
/// message) with an Execute phase (one appended result per requested tool
/// call, in request order) until the model stops asking for tools.
pub struct AgentLoop {
    provider: Arc<dyn Provider>,
    tool_registry: Arc<ToolRegistry>,
    max_iterations: Option<usize>,
    phase_timeout: Option<Duration>,
    text_tool_calls: bool,
    observer: Option<MessageObserver>,
}

impl AgentLoop {
    pub fn new(provider: Arc<dyn Provider>, tool_registry: Arc<ToolRegistry>) -> Self {
        Self {
            provider,
            tool_registry,
            max_iterations: Some(DEFAULT_MAX_ITERATIONS),
            phase_timeout: None,
            text_tool_calls: true,
            observer: None,
        }
    }

    /// Bound on Decide turns. `None` runs until the model stops on its own.
    pub fn with_max_iterations(mut self, max: Option<usize>) -> Self {
        self.max_iterations = max;
        self
    }

    pub fn with_phase_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.phase_timeout = timeout;
        self
    }

    /// Parse `<tool_call>` blocks out of plain-text responses.
    pub fn with_text_tool_calls(mut self, enabled: bool) -> Self {
        self.text_tool_calls = enabled;
        self
    }

    /// Called with every message the loop appends.
    pub fn with_observer(mut self, observer: MessageObserver) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn tool_registry(&self) -> &ToolRegistry {
        &self.tool_registry
    }

    pub async fn run(&self, mut conversation: Conversation) -> Result<RunReport, AgentError> {
        let specs = self.tool_registry.specs();
        let mut decide_turns = 0;
        let mut execute_turns = 0;

        let pending = conversation.pending_tool_calls().to_vec();
        if !pending.is_empty() {
            debug!(calls = pending.len(), "answering calls left in the initial conversation");
            self.execute(&pending, &mut conversation).await;
            execute_turns += 1;
        }

        let stop = loop {
            if let Some(max) = self.max_iterations
                && decide_turns >= max
            {
                warn!(max, "Iteration limit reached");
                break StopReason::IterationLimit;
            }

            decide_turns += 1;
            debug!(turn = decide_turns, messages = conversation.len(), "decide");

            let message = match self.decide(conversation.messages(), &specs).await? {
                Decision::Message(message) => message,
                Decision::TimedOut(e) => {
                    warn!("{}", e);
                    let message = ChatMessage {
                        error: Some(ToolErrorKind::Timeout),
                        ..ChatMessage::assistant(e.to_string())
                    };
                    self.append(&mut conversation, message);
                    break StopReason::DecideTimeout;
                }
            };

            let calls = message.tool_calls.clone();
            self.append(&mut conversation, message);

            if calls.is_empty() {
                break StopReason::Completed;
            }

            execute_turns += 1;
            debug!(turn = execute_turns, calls = calls.len(), "execute");
            self.execute(&calls, &mut conversation).await;
        };

        info!(?stop, decide_turns, execute_turns, "Agent run finished");

        Ok(RunReport {
            conversation,
            stop,
            decide_turns,
            execute_turns,
        })
    }

    async fn decide(
        &self,
        messages: &[ChatMessage],
        specs: &[ToolSpec],
    ) -> Result<Decision, AgentError> {
        let request = ChatRequest {
            messages,
            tools: if specs.is_empty() { None } else { Some(specs) },
        };

        let call = self.provider.chat(request);
        let response = match self.phase_timeout {
            Some(limit) => match tokio::time::timeout(limit, call).await {
                Ok(response) => response,
                Err(_) => {
                    return Ok(Decision::TimedOut(AgentError::Timeout {
                        phase: Phase::Decide,
                        after: limit,
                    }));
                }
            },
            None => call.await,
        }
        .map_err(|e| AgentError::ModelInvocation(format!("{:#}", e)))?;

        Ok(Decision::Message(self.assistant_message(response)))
    }

    fn assistant_message(&self, response: ChatResponse) -> ChatMessage {
        if response.has_tool_calls() {
            return ChatMessage::assistant_with_tool_calls(
                response.text.unwrap_or_default(),
                response.tool_calls,
            );
        }

        let text = response.text.unwrap_or_default();
        if self.text_tool_calls {
            let (prose, calls) = parse_tool_calls(&text);
            if !calls.is_empty() {
                debug!(calls = calls.len(), "parsed tool calls from text");
                return ChatMessage::assistant_with_tool_calls(prose, calls);
            }
        }

        ChatMessage::assistant(text)
    }

    async fn execute(&self, calls: &[ToolCall], conversation: &mut Conversation) {
        let deadline = self.phase_timeout.map(|limit| (Instant::now() + limit, limit));

        for call in calls {
            debug!(tool = %call.name, id = %call.id, "tool call");

            let result = match deadline {
                Some((deadline, limit)) => {
                    let timed_out = ToolResult::failure(
                        ToolErrorKind::Timeout,
                        AgentError::Timeout {
                            phase: Phase::Execute,
                            after: limit,
                        }
                        .to_string(),
                    );

                    if Instant::now() >= deadline {
                        timed_out
                    } else {
                        tokio::time::timeout_at(deadline, self.tool_registry.execute(call))
                            .await
                            .unwrap_or(timed_out)
                    }
                }
                None => self.tool_registry.execute(call).await,
            };

            let message = match result.kind {
                Some(kind) if !result.success => {
                    warn!(tool = %call.name, %kind, "tool call failed");
                    ChatMessage::tool_error(call, kind, result.to_content())
                }
                _ => ChatMessage::tool_result(call, result.to_content()),
            };

            self.append(conversation, message);
        }
    }

    fn append(&self, conversation: &mut Conversation, message: ChatMessage) {
        if let Some(observer) = &self.observer {
            observer(&message);
        }
        conversation.push(message);
    }
}

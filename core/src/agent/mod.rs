pub mod context;
pub mod conversation;
pub mod loop_;
pub mod parser;
pub mod registry;

pub use context::ContextBuilder;
pub use conversation::Conversation;
pub use loop_::{AgentLoop, DEFAULT_MAX_ITERATIONS, MessageObserver, RunReport, StopReason};
pub use parser::parse_tool_calls;
pub use registry::ToolRegistry;

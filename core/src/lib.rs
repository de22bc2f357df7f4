pub mod agent;
pub mod config;
pub mod error;
pub mod providers;
pub mod scenario;
pub mod store;
pub mod tools;
pub mod traits;

#[cfg(test)]
pub(crate) mod testing;

pub use agent::{AgentLoop, ContextBuilder, Conversation, RunReport, StopReason, ToolRegistry};
pub use config::*;
pub use error::{AgentError, Phase};
pub use providers::*;
pub use store::{Record, RecordFile, ValidationError};
pub use tools::*;
pub use traits::*;

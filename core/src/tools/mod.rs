use crate::error::AgentError;
use serde::de::DeserializeOwned;
use serde_json::Value;

pub mod append_note;
pub mod read_records;
pub mod write_records;

pub use append_note::AppendNoteTool;
pub use read_records::ReadRecordsTool;
pub use write_records::WriteRecordsTool;

pub fn extract_string_arg(tool: &str, args: &Value, key: &str) -> Result<String, AgentError> {
    args.get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| AgentError::InvalidArguments {
            tool: tool.to_string(),
            message: format!("Missing '{}' parameter", key),
        })
}

/// Deserializes the model-supplied payload into a tool's typed params.
/// A `null` payload is read as an empty object.
pub fn parse_args<T: DeserializeOwned>(tool: &str, args: Value) -> Result<T, AgentError> {
    let args = if args.is_null() {
        Value::Object(Default::default())
    } else {
        args
    };

    serde_json::from_value(args).map_err(|e| AgentError::InvalidArguments {
        tool: tool.to_string(),
        message: e.to_string(),
    })
}

use crate::store::RecordFile;
use crate::tools::extract_string_arg;
use crate::traits::{Tool, ToolResult};
use async_trait::async_trait;
use serde_json::json;
use std::path::Path;

/// Appends free-form notes to the file, one per line.
pub struct AppendNoteTool {
    file: RecordFile,
}

impl AppendNoteTool {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            file: RecordFile::new(path),
        }
    }
}

#[async_trait]
impl Tool for AppendNoteTool {
    fn name(&self) -> &str {
        "append_note"
    }

    fn description(&self) -> &str {
        "Save a new piece of information at the end of the local notes file. Use it to remember things."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "content": {
                    "type": "string",
                    "description": "Information to remember"
                }
            },
            "required": ["content"]
        })
    }

    async fn execute(&self, args: serde_json::Value) -> anyhow::Result<ToolResult> {
        let content = extract_string_arg(self.name(), &args, "content")?;

        match self.file.append_line(content.trim()) {
            Ok(()) => Ok(ToolResult::success("Saved.")),
            Err(e) => Ok(ToolResult::error(format!("{:#}", e))),
        }
    }
}

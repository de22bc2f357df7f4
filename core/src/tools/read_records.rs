use crate::store::{RecordFile, SAMPLE_RECORDS};
use crate::traits::{Tool, ToolResult};
use async_trait::async_trait;
use serde_json::json;
use std::path::Path;

const RECORDS_DESCRIPTION: &str =
    "Read the whole roster file. Each line is 'Name, Age, Profession' or 'Name, Age, Profession, Comment'.";

pub struct ReadRecordsTool {
    file: RecordFile,
    name: &'static str,
    description: &'static str,
    seed: Option<String>,
}

impl ReadRecordsTool {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            file: RecordFile::new(path),
            name: "read_records",
            description: RECORDS_DESCRIPTION,
            seed: None,
        }
    }

    /// Same whole-file read, exposed as the notes reader.
    pub fn notes(path: impl AsRef<Path>) -> Self {
        Self {
            name: "read_notes",
            description: "Read the local notes file where earlier information was saved.",
            ..Self::new(path)
        }
    }

    /// Create the file with sample records when it does not exist yet.
    pub fn with_sample_seed(mut self) -> Self {
        self.seed = Some(SAMPLE_RECORDS.to_string());
        self
    }
}

#[async_trait]
impl Tool for ReadRecordsTool {
    fn name(&self) -> &str {
        self.name
    }

    fn description(&self) -> &str {
        self.description
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {}
        })
    }

    async fn execute(&self, _args: serde_json::Value) -> anyhow::Result<ToolResult> {
        if let Some(seed) = &self.seed
            && self.file.seed_if_missing(seed)?
        {
            return Ok(ToolResult::success(format!(
                "File {} did not exist; created it with sample records:\n{}",
                self.file.path().display(),
                seed
            )));
        }

        if !self.file.exists() {
            return Ok(ToolResult::error(format!(
                "File {} does not exist",
                self.file.path().display()
            )));
        }

        match self.file.read_to_string() {
            Ok(content) if content.trim().is_empty() => {
                Ok(ToolResult::success("The file is empty."))
            }
            Ok(content) => Ok(ToolResult::success(content)),
            Err(e) => Ok(ToolResult::error(format!("{:#}", e))),
        }
    }
}

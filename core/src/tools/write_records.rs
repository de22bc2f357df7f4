use crate::error::AgentError;
use crate::store::{RecordFile, validate_line};
use crate::tools::parse_args;
use crate::traits::{Tool, ToolErrorKind, ToolResult};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct WriteParams {
    content: String,
}

/// Overwrites the roster file with the full content supplied by the model.
pub struct WriteRecordsTool {
    file: RecordFile,
    validate: bool,
}

impl WriteRecordsTool {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            file: RecordFile::new(path),
            validate: false,
        }
    }

    /// Only lines that parse as records with a numeric age and a short
    /// comment are written; the rest are reported back.
    pub fn with_validation(mut self, validate: bool) -> Self {
        self.validate = validate;
        self
    }

    fn write_validated(&self, content: &str) -> anyhow::Result<ToolResult> {
        let mut accepted = Vec::new();
        let mut rejected = Vec::new();

        for line in content.lines().map(str::trim).filter(|l| !l.is_empty()) {
            match validate_line(line) {
                Ok(record) => accepted.push(record),
                Err(e) => rejected.push(format!("INVALID '{}': {}", line, e)),
            }
        }

        if accepted.is_empty() {
            let error = if rejected.is_empty() {
                AgentError::Validation("nothing written, the content has no records".to_string())
            } else {
                AgentError::Validation(format!(
                    "nothing written, every line was rejected:\n{}",
                    rejected.join("\n")
                ))
            };
            return Ok(ToolResult::failure(ToolErrorKind::Validation, error.to_string()));
        }

        self.file.write_records(&accepted)?;

        let mut output = format!(
            "Saved {} record(s) to {}.",
            accepted.len(),
            self.file.path().display()
        );
        if !rejected.is_empty() {
            tracing::warn!(rejected = rejected.len(), "write_records dropped invalid lines");
            output.push_str(&format!(
                "\nRejected {} line(s):\n{}",
                rejected.len(),
                rejected.join("\n")
            ));
        }

        Ok(ToolResult::success(output))
    }
}

#[async_trait]
impl Tool for WriteRecordsTool {
    fn name(&self) -> &str {
        "write_records"
    }

    fn description(&self) -> &str {
        "Overwrite the roster file with the complete new content, one record per line."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "content": {
                    "type": "string",
                    "description": "Full file content, one 'Name, Age, Profession, Comment' record per line"
                }
            },
            "required": ["content"]
        })
    }

    async fn execute(&self, args: serde_json::Value) -> anyhow::Result<ToolResult> {
        let params: WriteParams = parse_args(self.name(), args)?;

        if self.validate {
            return self.write_validated(&params.content);
        }

        match self.file.write_string(&params.content) {
            Ok(()) => Ok(ToolResult::success(format!(
                "File {} updated.",
                self.file.path().display()
            ))),
            Err(e) => Ok(ToolResult::error(format!("{:#}", e))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn overwrites_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("roster.txt");
        std::fs::write(&path, "old").unwrap();

        let tool = WriteRecordsTool::new(&path);
        let result = tool
            .execute(json!({"content": "Pepe Romero, 38, Bombero, Apaga fuegos"}))
            .await
            .unwrap();

        assert!(result.success);
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "Pepe Romero, 38, Bombero, Apaga fuegos"
        );
    }

    #[tokio::test]
    async fn missing_content_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let tool = WriteRecordsTool::new(tmp.path().join("roster.txt"));

        let err = tool.execute(json!({})).await.unwrap_err();
        assert!(err.to_string().contains("Invalid arguments for 'write_records'"));
    }

    #[tokio::test]
    async fn validation_drops_non_numeric_ages() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("roster.txt");
        let tool = WriteRecordsTool::new(&path).with_validation(true);

        let content = "Pepe Romero, 38, Bombero, Apaga fuegos\nCarlos, VEINTE, Pintor\n";
        let result = tool.execute(json!({ "content": content })).await.unwrap();

        assert!(result.success);
        assert!(result.output.contains("Saved 1 record(s)"));
        assert!(result.output.contains("INVALID 'Carlos, VEINTE, Pintor'"));
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "Pepe Romero, 38, Bombero, Apaga fuegos\n"
        );
    }

    #[tokio::test]
    async fn validation_refuses_to_write_nothing_valid() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("roster.txt");
        std::fs::write(&path, "Maria Garcia, 29, Ingeniera\n").unwrap();
        let tool = WriteRecordsTool::new(&path).with_validation(true);

        let result = tool
            .execute(json!({"content": "Carlos, VEINTE, Pintor"}))
            .await
            .unwrap();

        assert_eq!(result.kind, Some(ToolErrorKind::Validation));
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "Maria Garcia, 29, Ingeniera\n"
        );
    }

    #[tokio::test]
    async fn validation_keeps_file_on_empty_content() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("roster.txt");
        std::fs::write(&path, "Maria Garcia, 29, Ingeniera\n").unwrap();
        let tool = WriteRecordsTool::new(&path).with_validation(true);

        let result = tool.execute(json!({"content": "  \n"})).await.unwrap();

        assert!(!result.success);
        assert_eq!(result.kind, Some(ToolErrorKind::Validation));
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "Maria Garcia, 29, Ingeniera\n"
        );
    }
}

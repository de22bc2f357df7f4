use crate::error::AgentError;
use crate::traits::{Tool, ToolCall, ToolErrorKind, ToolResult, ToolSpec};
use std::sync::Arc;

/// Tools resolvable by exact name. Built once, then shared read-only.
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, tool: impl Tool + 'static) -> Result<(), AgentError> {
        let name = tool.name();

        if name.is_empty()
            || !name
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
        {
            return Err(AgentError::InvalidToolName(name.to_string()));
        }

        if self.get(name).is_some() {
            return Err(AgentError::DuplicateTool(name.to_string()));
        }

        self.tools.push(Arc::new(tool));
        Ok(())
    }

    pub fn with_tool(mut self, tool: impl Tool + 'static) -> Result<Self, AgentError> {
        self.register(tool)?;
        Ok(self)
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.iter().find(|t| t.name() == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn specs(&self) -> Vec<ToolSpec> {
        self.tools.iter().map(|t| t.spec()).collect()
    }

    /// Runs one call. Never fails: every problem becomes an error result.
    pub async fn execute(&self, call: &ToolCall) -> ToolResult {
        let Some(tool) = self.get(&call.name) else {
            return ToolResult::failure(
                ToolErrorKind::NotFound,
                AgentError::ToolNotFound(call.name.clone()).to_string(),
            );
        };

        match tool.execute(call.arguments.clone()).await {
            Ok(result) => result,
            Err(e) => match e
                .downcast_ref::<AgentError>()
                .and_then(AgentError::tool_error_kind)
            {
                Some(kind) => ToolResult::failure(kind, format!("{:#}", e)),
                None => {
                    let error = AgentError::ToolExecution {
                        tool: call.name.clone(),
                        message: format!("{:#}", e),
                    };
                    ToolResult::failure(ToolErrorKind::Execution, error.to_string())
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;

    struct Echo(&'static str);

    #[async_trait]
    impl Tool for Echo {
        fn name(&self) -> &str {
            self.0
        }

        fn description(&self) -> &str {
            "echo"
        }

        fn parameters_schema(&self) -> serde_json::Value {
            json!({"type": "object"})
        }

        async fn execute(&self, args: serde_json::Value) -> anyhow::Result<ToolResult> {
            if args.get("fail").is_some() {
                anyhow::bail!("boom");
            }
            Ok(ToolResult::success(args.to_string()))
        }
    }

    #[test]
    fn rejects_duplicates_and_bad_names() {
        let mut registry = ToolRegistry::new();
        registry.register(Echo("echo")).unwrap();

        assert!(matches!(
            registry.register(Echo("echo")),
            Err(AgentError::DuplicateTool(_))
        ));
        assert!(matches!(
            registry.register(Echo("Echo Tool")),
            Err(AgentError::InvalidToolName(_))
        ));
        assert!(matches!(
            registry.register(Echo("")),
            Err(AgentError::InvalidToolName(_))
        ));
        assert_eq!(registry.names(), vec!["echo"]);
    }

    #[tokio::test]
    async fn unknown_tool_is_not_found_result() {
        let registry = ToolRegistry::new().with_tool(Echo("echo")).unwrap();
        let call = ToolCall::new("call_1", "search_web", json!({}));

        let result = registry.execute(&call).await;
        assert_eq!(result.kind, Some(ToolErrorKind::NotFound));
        assert_eq!(result.to_content(), "Error: Tool 'search_web' not found");
    }

    #[tokio::test]
    async fn tool_failures_become_execution_results() {
        let registry = ToolRegistry::new().with_tool(Echo("echo")).unwrap();
        let call = ToolCall::new("call_1", "echo", json!({"fail": true}));

        let result = registry.execute(&call).await;
        assert_eq!(result.kind, Some(ToolErrorKind::Execution));
        assert_eq!(result.error.as_deref(), Some("Tool 'echo' failed: boom"));
    }

    #[tokio::test]
    async fn specs_keep_registration_order() {
        let registry = ToolRegistry::new()
            .with_tool(Echo("b"))
            .unwrap()
            .with_tool(Echo("a"))
            .unwrap();

        let names: Vec<String> = registry.specs().into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["b", "a"]);
    }
}

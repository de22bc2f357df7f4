//! The canned requests the `roster` binary can run, each with its own
//! instruction and tool set over one data file.

use crate::agent::{AgentLoop, ContextBuilder, MessageObserver, RunReport, ToolRegistry};
use crate::config::Config;
use crate::error::AgentError;
use crate::tools::{AppendNoteTool, ReadRecordsTool, WriteRecordsTool};
use crate::traits::Provider;
use std::path::Path;
use std::sync::Arc;

const ANNOTATE_INSTRUCTION: &str = "You are an HR expert maintaining a roster file. Your workflow:
1. Read the file with the tool.
2. Find lines that only have 'Name, Age, Profession'.
3. Add a fourth column with a comment of AT MOST 10 WORDS about the profession.
4. The result must be strictly 'Name, Age, Profession, Comment', one record per line, keeping lines that already have a comment.
5. Save the complete result with write_records.";

const VALIDATE_INSTRUCTION: &str = "You are a data supervisor. Your workflow:
1. Read the file.
2. Check every line: Name, Age, Profession.
3. VALIDATION: if the Age is not a number, do not keep that line and report it as INVALID.
4. If a valid line has no comment, add one (at most 10 words).
5. Save the final file as 'Name, Age, Profession, Comment'.";

const REMEMBER_INSTRUCTION: &str = "You are a research assistant with a local notes file. \
Read the notes before answering questions about them, and save new facts the user asks you to remember.";

const ASK_INSTRUCTION: &str = "You are an assistant that manages a roster file \
('Name, Age, Profession[, Comment]' per line). Use the tools to read, rewrite or append to it.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scenario {
    /// Add profession comments to records that lack one.
    Annotate,
    /// Annotate, dropping records with a non-numeric age.
    Validate,
    /// Question-and-remember over a notes file.
    Remember,
    /// Free-form request with every file tool.
    Ask,
}

impl Scenario {
    pub fn instruction(&self) -> &'static str {
        match self {
            Self::Annotate => ANNOTATE_INSTRUCTION,
            Self::Validate => VALIDATE_INSTRUCTION,
            Self::Remember => REMEMBER_INSTRUCTION,
            Self::Ask => ASK_INSTRUCTION,
        }
    }

    /// Requests run in sequence, each as a fresh conversation.
    pub fn default_requests(&self) -> &'static [&'static str] {
        match self {
            Self::Annotate => &["Review my roster and add comments to the professions."],
            Self::Validate => &["Validate and update my roster."],
            Self::Remember => &[
                "What is the budget of the secret project?",
                "Remember that the new lead of the project is Jose Jimenez.",
            ],
            Self::Ask => &[],
        }
    }

    pub fn tools(&self, path: &Path) -> Result<ToolRegistry, AgentError> {
        let mut registry = ToolRegistry::new();

        match self {
            Self::Annotate => {
                registry.register(ReadRecordsTool::new(path).with_sample_seed())?;
                registry.register(WriteRecordsTool::new(path))?;
            }
            Self::Validate => {
                registry.register(ReadRecordsTool::new(path))?;
                registry.register(WriteRecordsTool::new(path).with_validation(true))?;
            }
            Self::Remember => {
                registry.register(ReadRecordsTool::notes(path))?;
                registry.register(AppendNoteTool::new(path))?;
            }
            Self::Ask => {
                registry.register(ReadRecordsTool::new(path))?;
                registry.register(WriteRecordsTool::new(path))?;
                registry.register(AppendNoteTool::new(path))?;
            }
        }

        Ok(registry)
    }
}

/// Wires a scenario to a provider according to the config.
pub struct ScenarioRunner {
    provider: Arc<dyn Provider>,
    config: Config,
    observer: Option<MessageObserver>,
}

impl ScenarioRunner {
    pub fn new(provider: Arc<dyn Provider>, config: Config) -> Self {
        Self {
            provider,
            config,
            observer: None,
        }
    }

    pub fn with_observer(mut self, observer: MessageObserver) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn agent(&self, scenario: Scenario) -> Result<AgentLoop, AgentError> {
        let registry = scenario.tools(&self.config.records_path)?;

        let mut agent = AgentLoop::new(self.provider.clone(), Arc::new(registry))
            .with_max_iterations(self.config.max_iterations)
            .with_phase_timeout(self.config.phase_timeout())
            .with_text_tool_calls(self.config.text_tool_calls);
        if let Some(observer) = &self.observer {
            agent = agent.with_observer(observer.clone());
        }

        Ok(agent)
    }

    pub async fn run(&self, scenario: Scenario, request: &str) -> Result<RunReport, AgentError> {
        let agent = self.agent(scenario)?;
        let conversation = ContextBuilder::new(scenario.instruction())
            .with_data_file(&self.config.records_path)
            .with_tool_specs(agent.tool_registry().specs())
            .with_text_tool_calls(self.config.text_tool_calls)
            .build(request);

        tracing::info!(?scenario, file = %self.config.records_path.display(), "Starting run");
        agent.run(conversation).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::StopReason;
    use crate::testing::{ScriptedProvider, tool_call};
    use crate::traits::{ChatResponse, Role, ToolErrorKind};
    use serde_json::json;
    use tempfile::TempDir;

    fn runner(provider: Arc<ScriptedProvider>, path: &Path) -> ScenarioRunner {
        let config = Config {
            records_path: path.to_path_buf(),
            ..Config::default()
        };
        ScenarioRunner::new(provider, config)
    }

    #[test]
    fn tool_sets_per_scenario() {
        let path = Path::new("base_datos.txt");
        assert_eq!(
            Scenario::Annotate.tools(path).unwrap().names(),
            vec!["read_records", "write_records"]
        );
        assert_eq!(
            Scenario::Remember.tools(path).unwrap().names(),
            vec!["read_notes", "append_note"]
        );
        assert_eq!(Scenario::Ask.tools(path).unwrap().len(), 3);
        assert_eq!(Scenario::Remember.default_requests().len(), 2);
    }

    #[tokio::test]
    async fn annotate_seeds_and_rewrites() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("base_datos.txt");
        let updated = "Pepe Romero, 38, Bombero, Apaga incendios y rescata personas\n\
                       Maria Garcia, 29, Ingeniera, Disena soluciones tecnicas para problemas reales\n";

        let provider = ScriptedProvider::new([
            ChatResponse {
                text: None,
                tool_calls: vec![tool_call("c1", "read_records", json!({}))],
            },
            ChatResponse {
                text: None,
                tool_calls: vec![tool_call("c2", "write_records", json!({ "content": updated }))],
            },
            ChatResponse::text("Both records now have comments."),
        ]);

        let report = runner(provider, &path)
            .run(Scenario::Annotate, Scenario::Annotate.default_requests()[0])
            .await
            .unwrap();

        assert_eq!(report.stop, StopReason::Completed);
        let messages = report.conversation.messages();
        assert_eq!(messages[0].role, Role::System);
        assert!(messages[0].content.contains("AT MOST 10 WORDS"));

        let records = crate::store::RecordFile::new(&path).read_records().unwrap();
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.has_comment() && r.validate().is_ok()));
    }

    #[tokio::test]
    async fn validate_rejects_bad_ages() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("base_datos.txt");
        std::fs::write(&path, "Carlos, VEINTE, Pintor\n").unwrap();

        let provider = ScriptedProvider::new([
            ChatResponse {
                text: None,
                tool_calls: vec![tool_call(
                    "c1",
                    "write_records",
                    json!({"content": "Carlos, VEINTE, Pintor, Pinta casas"}),
                )],
            },
            ChatResponse::text("Carlos is INVALID."),
        ]);

        let report = runner(provider, &path)
            .run(Scenario::Validate, "Validate and update my roster.")
            .await
            .unwrap();

        let result = &report.conversation.messages()[3];
        assert_eq!(result.error, Some(ToolErrorKind::Validation));
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "Carlos, VEINTE, Pintor\n"
        );
    }
}

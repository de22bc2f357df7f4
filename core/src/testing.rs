//! Test doubles for the loop: a provider that replays canned responses and
//! slow variants for deadline tests.

use crate::traits::{ChatRequest, ChatResponse, Provider, Tool, ToolCall, ToolResult};
use async_trait::async_trait;
use serde_json::json;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub fn tool_call(id: &str, name: &str, arguments: serde_json::Value) -> ToolCall {
    ToolCall::new(id, name, arguments)
}

/// Replays responses in order and fails once they run out.
pub struct ScriptedProvider {
    responses: Mutex<VecDeque<ChatResponse>>,
    failures_left: Mutex<usize>,
    history_lengths: Mutex<Vec<usize>>,
}

impl ScriptedProvider {
    pub fn new(responses: impl IntoIterator<Item = ChatResponse>) -> Arc<Self> {
        Self::failing_first(0, responses)
    }

    /// Fails the first `failures` calls before replaying.
    pub fn failing_first(
        failures: usize,
        responses: impl IntoIterator<Item = ChatResponse>,
    ) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into_iter().collect()),
            failures_left: Mutex::new(failures),
            history_lengths: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.history_lengths.lock().unwrap().len()
    }

    /// Number of messages the provider saw on each call.
    pub fn history_lengths(&self) -> Vec<usize> {
        self.history_lengths.lock().unwrap().clone()
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn chat(&self, request: ChatRequest<'_>) -> anyhow::Result<ChatResponse> {
        self.history_lengths
            .lock()
            .unwrap()
            .push(request.messages.len());

        {
            let mut failures_left = self.failures_left.lock().unwrap();
            if *failures_left > 0 {
                *failures_left -= 1;
                anyhow::bail!("connection reset");
            }
        }

        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| anyhow::anyhow!("quota exceeded"))
    }
}

pub struct SlowProvider(pub Duration);

#[async_trait]
impl Provider for SlowProvider {
    fn name(&self) -> &str {
        "slow"
    }

    async fn chat(&self, _request: ChatRequest<'_>) -> anyhow::Result<ChatResponse> {
        tokio::time::sleep(self.0).await;
        Ok(ChatResponse::text("too late"))
    }
}

pub struct SlowTool(pub Duration);

#[async_trait]
impl Tool for SlowTool {
    fn name(&self) -> &str {
        "slow"
    }

    fn description(&self) -> &str {
        "Sleeps before answering"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({"type": "object", "properties": {}})
    }

    async fn execute(&self, _args: serde_json::Value) -> anyhow::Result<ToolResult> {
        tokio::time::sleep(self.0).await;
        Ok(ToolResult::success("slept"))
    }
}

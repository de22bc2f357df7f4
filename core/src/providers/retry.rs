use crate::traits::{ChatRequest, ChatResponse, Provider};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Retries failed model calls with a linear backoff. The agent loop only
/// sees the final outcome.
pub struct RetryProvider {
    inner: Arc<dyn Provider>,
    max_retries: usize,
    backoff: Duration,
}

impl RetryProvider {
    pub fn new(inner: Arc<dyn Provider>, max_retries: usize) -> Self {
        Self {
            inner,
            max_retries,
            backoff: Duration::from_secs(2),
        }
    }
}

#[async_trait]
impl Provider for RetryProvider {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn chat(&self, request: ChatRequest<'_>) -> anyhow::Result<ChatResponse> {
        let mut attempt = 0;

        loop {
            match self.inner.chat(request).await {
                Ok(response) => return Ok(response),
                Err(e) if attempt < self.max_retries => {
                    attempt += 1;
                    tracing::warn!(
                        provider = self.inner.name(),
                        attempt,
                        max = self.max_retries,
                        "Model call failed, retrying: {:#}",
                        e
                    );
                    tokio::time::sleep(self.backoff * attempt as u32).await;
                }
                Err(e) => {
                    return Err(e.context(format!(
                        "{} failed after {} attempt(s)",
                        self.inner.name(),
                        attempt + 1
                    )));
                }
            }
        }
    }
}

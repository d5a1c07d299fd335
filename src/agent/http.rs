//! HTTP-backed agent forwarding work to an upstream endpoint.

use async_trait::async_trait;

use crate::agent::{Agent, AgentInput, AgentOutput};
use crate::error::AgentError;

/// Agent that POSTs the input as JSON to an upstream research endpoint and
/// expects an [`AgentOutput`] body back.
pub struct HttpAgent {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpAgent {
    /// Create an agent targeting the given endpoint URL.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl Agent for HttpAgent {
    fn name(&self) -> &str {
        "http"
    }

    async fn execute(&self, input: &AgentInput) -> Result<AgentOutput, AgentError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(input)
            .send()
            .await
            .map_err(|e| AgentError::RequestFailed {
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AgentError::RequestFailed {
                reason: format!("upstream returned {status}: {body}"),
            });
        }

        response
            .json::<AgentOutput>()
            .await
            .map_err(|e| AgentError::InvalidResponse {
                reason: e.to_string(),
            })
    }
}

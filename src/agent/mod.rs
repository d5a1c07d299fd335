//! Agent execution seam.
//!
//! The task/memory core never looks inside agent execution — it hands an
//! [`AgentInput`] to an [`Agent`] implementation and records whatever comes
//! back. `HttpAgent` forwards to an upstream research-agent endpoint;
//! `StaticAgent` answers locally and is the default when no endpoint is
//! configured.

mod http;

pub use http::HttpAgent;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::ServiceConfig;
use crate::error::{AgentError, ValidationError};

/// Bounds on a research query, matching the request contract.
pub const QUERY_MIN_LEN: usize = 5;
pub const QUERY_MAX_LEN: usize = 1000;
/// Bounds on agent iterations.
pub const MAX_ITERATIONS_LIMIT: u32 = 10;

fn default_max_iterations() -> u32 {
    3
}

/// Input payload for an agent execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentInput {
    /// Research query or task description.
    pub query: String,
    /// Maximum iterations the agent may perform.
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,
}

impl AgentInput {
    /// Create an input with the default iteration budget.
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            max_iterations: default_max_iterations(),
        }
    }

    /// Validate request-boundary constraints. Called before any task or
    /// memory item is created from this input.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let len = self.query.trim().len();
        if len == 0 {
            return Err(ValidationError::MissingField("query".to_string()));
        }
        if len < QUERY_MIN_LEN || len > QUERY_MAX_LEN {
            return Err(ValidationError::OutOfRange {
                field: "query".to_string(),
                message: format!(
                    "length {len} not in {QUERY_MIN_LEN}..={QUERY_MAX_LEN}"
                ),
            });
        }
        if self.max_iterations < 1 || self.max_iterations > MAX_ITERATIONS_LIMIT {
            return Err(ValidationError::OutOfRange {
                field: "max_iterations".to_string(),
                message: format!(
                    "{} not in 1..={MAX_ITERATIONS_LIMIT}",
                    self.max_iterations
                ),
            });
        }
        Ok(())
    }
}

/// Output returned from an agent after processing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentOutput {
    /// Generated markdown report or output text.
    pub report: String,
    /// Iterations the agent actually performed.
    pub iterations: u32,
    /// Number of findings gathered along the way.
    pub findings_count: u32,
}

/// Opaque collaborator executing research work.
#[async_trait]
pub trait Agent: Send + Sync {
    /// Human-readable implementation name (for logs and health reporting).
    fn name(&self) -> &str;

    /// Execute the given input to completion.
    async fn execute(&self, input: &AgentInput) -> Result<AgentOutput, AgentError>;
}

/// Agent that answers locally with a canned report. Used when no upstream
/// endpoint is configured, and by tests.
pub struct StaticAgent;

#[async_trait]
impl Agent for StaticAgent {
    fn name(&self) -> &str {
        "static"
    }

    async fn execute(&self, input: &AgentInput) -> Result<AgentOutput, AgentError> {
        Ok(AgentOutput {
            report: format!("# Research Report\n\nNo upstream agent is configured; echoing the query.\n\n> {}", input.query),
            iterations: 1,
            findings_count: 0,
        })
    }
}

/// Create an agent from configuration.
pub fn create_agent(config: &ServiceConfig) -> Arc<dyn Agent> {
    match &config.agent_endpoint {
        Some(endpoint) => {
            tracing::info!("Using upstream agent at {}", endpoint);
            Arc::new(HttpAgent::new(endpoint.clone()))
        }
        None => {
            tracing::info!("No agent endpoint configured, using static agent");
            Arc::new(StaticAgent)
        }
    }
}

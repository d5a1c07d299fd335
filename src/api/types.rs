//! Request/response types for the REST API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::agent::AgentInput;
use crate::task::{Task, TaskState, TaskSummary};

fn default_max_iterations() -> u32 {
    3
}

/// Request body for a synchronous chat turn.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    /// Conversation thread the turn belongs to.
    pub thread_id: String,
    /// Research query or task description.
    pub query: String,
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,
}

impl ChatRequest {
    pub fn to_input(&self) -> AgentInput {
        AgentInput {
            query: self.query.clone(),
            max_iterations: self.max_iterations,
        }
    }
}

/// Response body for a chat turn.
#[derive(Debug, Clone, Serialize)]
pub struct ChatResponse {
    pub thread_id: String,
    pub report: String,
    pub iterations: u32,
    pub findings_count: u32,
}

/// Request body to submit a long-running research task.
#[derive(Debug, Clone, Deserialize)]
pub struct ResearchTaskRequest {
    pub query: String,
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,
    /// Optional owning thread; the task result is appended there.
    #[serde(default)]
    pub thread_id: Option<String>,
}

impl ResearchTaskRequest {
    pub fn to_input(&self) -> AgentInput {
        AgentInput {
            query: self.query.clone(),
            max_iterations: self.max_iterations,
        }
    }
}

/// Response body for a task submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitResponse {
    pub task_id: Uuid,
}

/// Status snapshot of a task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskStatusResponse {
    pub task_id: Uuid,
    pub status: TaskState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Task> for TaskStatusResponse {
    fn from(task: Task) -> Self {
        Self {
            task_id: task.id,
            status: task.state,
            progress: task.progress,
            result: task.result,
            error: task.error,
            created_at: task.created_at,
            updated_at: task.updated_at,
        }
    }
}

/// Health check response.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub agent: String,
    pub tasks: TaskSummary,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_request_defaults_iterations() {
        let req: ChatRequest =
            serde_json::from_str(r#"{"thread_id": "t1", "query": "solar trends"}"#).unwrap();
        assert_eq!(req.max_iterations, 3);
    }

    #[test]
    fn task_request_thread_is_optional() {
        let req: ResearchTaskRequest =
            serde_json::from_str(r#"{"query": "ocean currents"}"#).unwrap();
        assert!(req.thread_id.is_none());
    }

    #[test]
    fn status_response_omits_empty_payloads() {
        let response = TaskStatusResponse {
            task_id: Uuid::new_v4(),
            status: TaskState::Pending,
            progress: None,
            result: None,
            error: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let json = serde_json::to_value(&response).unwrap();
        assert!(json.get("result").is_none());
        assert!(json.get("error").is_none());
        assert_eq!(json["status"], "pending");
    }
}

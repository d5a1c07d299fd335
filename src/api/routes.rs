//! REST endpoints for chat turns, research tasks, and health.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use tower_http::cors::CorsLayer;
use uuid::Uuid;

use crate::agent::Agent;
use crate::api::types::{
    ChatRequest, ChatResponse, HealthResponse, ResearchTaskRequest, SubmitResponse,
    TaskStatusResponse,
};
use crate::error::{AgentError, Error, MemoryError, TaskError};
use crate::memory::{MemoryStore, Origin};
use crate::task::Runner;

/// Shared state for the API routes.
#[derive(Clone)]
pub struct ApiState {
    pub runner: Arc<Runner>,
    pub memory: Arc<MemoryStore>,
    pub agent: Arc<dyn Agent>,
}

/// Error wrapper mapping core errors onto HTTP status codes.
#[derive(Debug)]
pub struct ApiError(Error);

impl<E: Into<Error>> From<E> for ApiError {
    fn from(e: E) -> Self {
        Self(e.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            Error::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Error::Task(TaskError::NotFound { .. }) => StatusCode::NOT_FOUND,
            Error::Task(TaskError::AlreadyClaimed { .. })
            | Error::Task(TaskError::InvalidTransition { .. }) => StatusCode::CONFLICT,
            Error::Task(TaskError::MaxTasksExceeded { .. }) => StatusCode::TOO_MANY_REQUESTS,
            Error::Task(TaskError::Unavailable(_))
            | Error::Memory(MemoryError::Unavailable(_)) => StatusCode::SERVICE_UNAVAILABLE,
            Error::Memory(MemoryError::ThreadNotFound { .. }) => StatusCode::NOT_FOUND,
            Error::Agent(AgentError::Timeout { .. }) => StatusCode::GATEWAY_TIMEOUT,
            Error::Agent(_) => StatusCode::BAD_GATEWAY,
            Error::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (
            status,
            Json(serde_json::json!({"error": self.0.to_string()})),
        )
            .into_response()
    }
}

/// POST /api/chat
///
/// Synchronous conversational turn: append the user turn, invoke the agent,
/// append the agent turn, return the output.
async fn post_chat(
    State(state): State<ApiState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let input = request.to_input();
    input.validate()?;

    state
        .memory
        .append(
            &request.thread_id,
            Origin::User,
            serde_json::json!({"query": input.query}),
            None,
        )
        .await?;

    let output = state.agent.execute(&input).await?;

    state
        .memory
        .append(
            &request.thread_id,
            Origin::Agent,
            serde_json::json!({
                "report": output.report,
                "iterations": output.iterations,
                "findings_count": output.findings_count,
            }),
            None,
        )
        .await?;

    Ok(Json(ChatResponse {
        thread_id: request.thread_id,
        report: output.report,
        iterations: output.iterations,
        findings_count: output.findings_count,
    }))
}

/// POST /api/research
///
/// Submit a long-running research task; returns the task ID immediately.
async fn post_research(
    State(state): State<ApiState>,
    Json(request): Json<ResearchTaskRequest>,
) -> Result<(StatusCode, Json<SubmitResponse>), ApiError> {
    let input = request.to_input();
    input.validate()?;

    let task_id = state.runner.submit(input, request.thread_id).await?;
    Ok((StatusCode::ACCEPTED, Json(SubmitResponse { task_id })))
}

/// GET /api/research/{task_id}
async fn get_research(
    State(state): State<ApiState>,
    Path(task_id): Path<Uuid>,
) -> Result<Json<TaskStatusResponse>, ApiError> {
    let task = state.runner.registry().get(task_id).await?;
    Ok(Json(task.into()))
}

/// DELETE /api/research/{task_id}
async fn cancel_research(
    State(state): State<ApiState>,
    Path(task_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.runner.cancel(task_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/health
async fn get_health(State(state): State<ApiState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        agent: state.agent.name().to_string(),
        tasks: state.runner.registry().summary().await,
    })
}

/// Build the REST routes.
pub fn api_routes(state: ApiState) -> Router {
    Router::new()
        .route("/api/chat", post(post_chat))
        .route("/api/research", post(post_research))
        .route(
            "/api/research/{task_id}",
            get(get_research).delete(cancel_research),
        )
        .route("/api/health", get(get_health))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::{AgentInput, StaticAgent};
    use crate::memory::MemoryStore;
    use crate::task::{ExecutorDeps, TaskRegistry};
    use std::time::Duration;

    fn state() -> ApiState {
        let registry = Arc::new(TaskRegistry::new(10));
        let memory = Arc::new(MemoryStore::new(None));
        let agent: Arc<dyn Agent> = Arc::new(StaticAgent);
        let runner = Arc::new(Runner::new(ExecutorDeps {
            registry,
            memory: Arc::clone(&memory),
            agent: Arc::clone(&agent),
            timeout: Duration::from_secs(5),
        }));
        ApiState {
            runner,
            memory,
            agent,
        }
    }

    #[tokio::test]
    async fn chat_appends_both_turns() {
        let state = state();
        let request = ChatRequest {
            thread_id: "t1".to_string(),
            query: "what is rust?".to_string(),
            max_iterations: 3,
        };

        let response = post_chat(State(state.clone()), Json(request)).await;
        assert!(response.is_ok());

        let items = state.memory.get("t1", None).await.unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].origin, Origin::User);
        assert_eq!(items[1].origin, Origin::Agent);
    }

    #[tokio::test]
    async fn chat_rejects_invalid_query() {
        let state = state();
        let request = ChatRequest {
            thread_id: "t1".to_string(),
            query: "hi".to_string(),
            max_iterations: 3,
        };

        let response = post_chat(State(state.clone()), Json(request)).await;
        assert!(response.is_err());
        // Validation failures must not create the thread.
        assert_eq!(state.memory.thread_count().await, 0);
    }

    #[tokio::test]
    async fn submit_then_poll_status() {
        let state = state();
        let request = ResearchTaskRequest {
            query: "ocean current research".to_string(),
            max_iterations: 3,
            thread_id: None,
        };

        let (status, Json(submitted)) = post_research(State(state.clone()), Json(request))
            .await
            .unwrap();
        assert_eq!(status, StatusCode::ACCEPTED);

        let Json(response) = get_research(State(state.clone()), Path(submitted.task_id))
            .await
            .unwrap();
        assert_eq!(response.task_id, submitted.task_id);
    }

    #[tokio::test]
    async fn unknown_task_is_404() {
        let state = state();
        let result = get_research(State(state), Path(Uuid::new_v4())).await;
        let Err(err) = result else {
            panic!("expected an error for an unknown task");
        };
        assert_eq!(
            err.into_response().status(),
            StatusCode::NOT_FOUND
        );
    }

    #[tokio::test]
    async fn health_reports_agent_and_counts() {
        let state = state();
        state
            .runner
            .registry()
            .create(AgentInput::new("pending work"), None)
            .await
            .unwrap();

        let Json(health) = get_health(State(state)).await;
        assert_eq!(health.status, "healthy");
        assert_eq!(health.agent, "static");
        assert_eq!(health.tasks.total, 1);
    }
}

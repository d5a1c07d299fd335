//! Per-task execution: drive one claimed task to a terminal state.

use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;

use crate::agent::Agent;
use crate::error::{AgentError, Error, TaskError};
use crate::memory::{MemoryStore, Origin};
use crate::task::registry::{Task, TaskRegistry};

/// Shared dependencies for task execution.
#[derive(Clone)]
pub struct ExecutorDeps {
    pub registry: Arc<TaskRegistry>,
    pub memory: Arc<MemoryStore>,
    pub agent: Arc<dyn Agent>,
    /// Overall timeout for the agent call.
    pub timeout: Duration,
}

/// Executes a single task.
pub struct Executor {
    task_id: Uuid,
    deps: ExecutorDeps,
}

impl Executor {
    /// Create an executor for a specific task.
    pub fn new(task_id: Uuid, deps: ExecutorDeps) -> Self {
        Self { task_id, deps }
    }

    /// Claim the task, invoke the agent, and record the outcome.
    ///
    /// Agent failures are converted into the task's error payload and never
    /// propagate out of the worker. No automatic retry.
    pub async fn run(self) -> Result<(), Error> {
        tracing::info!(task = %self.task_id, "Executor starting");

        let task = match self.deps.registry.claim(self.task_id).await {
            Ok(task) => task,
            Err(TaskError::AlreadyClaimed { state, .. }) => {
                // Cancelled (or raced) between submission and claim.
                tracing::debug!(task = %self.task_id, %state, "Task no longer claimable");
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        if let Err(e) = self
            .deps
            .registry
            .update_progress(self.task_id, serde_json::json!(0.0))
            .await
        {
            // Cancelled between claim and first progress update.
            tracing::debug!(task = %self.task_id, error = %e, "Task gone before execution");
            return Ok(());
        }

        let outcome = tokio::time::timeout(
            self.deps.timeout,
            self.deps.agent.execute(&task.input),
        )
        .await;

        match outcome {
            Ok(Ok(output)) => {
                let result = serde_json::to_value(&output).map_err(|e| {
                    AgentError::InvalidResponse {
                        reason: format!("unserializable agent output: {e}"),
                    }
                });
                match result {
                    Ok(value) => self.finish_success(&task, value).await,
                    Err(e) => self.finish_failure(&task, e.to_string()).await,
                }
            }
            Ok(Err(e)) => {
                tracing::warn!(task = %self.task_id, error = %e, "Agent call failed");
                self.finish_failure(&task, e.to_string()).await
            }
            Err(_) => {
                tracing::warn!(task = %self.task_id, "Agent call timed out");
                let e = AgentError::Timeout {
                    timeout: self.deps.timeout,
                };
                self.finish_failure(&task, e.to_string()).await
            }
        }

        Ok(())
    }

    async fn finish_success(&self, task: &Task, result: serde_json::Value) {
        if let Err(e) = self.deps.registry.complete(self.task_id, result.clone()).await {
            // Most likely cancelled while the agent was running.
            tracing::info!(task = %self.task_id, error = %e, "Could not complete task");
            return;
        }

        tracing::info!(task = %self.task_id, "Task completed");

        if let Some(thread_id) = &task.thread_id {
            self.append_turn(
                thread_id,
                Origin::Agent,
                serde_json::json!({
                    "task_id": self.task_id,
                    "result": result,
                }),
            )
            .await;
        }
    }

    async fn finish_failure(&self, task: &Task, reason: String) {
        if let Err(e) = self.deps.registry.fail(self.task_id, reason.clone()).await {
            tracing::info!(task = %self.task_id, error = %e, "Could not fail task");
            return;
        }

        if let Some(thread_id) = &task.thread_id {
            self.append_turn(
                thread_id,
                Origin::System,
                serde_json::json!({
                    "task_id": self.task_id,
                    "error": reason,
                }),
            )
            .await;
        }
    }

    /// Append the task outcome to the owning thread. The task is already
    /// terminal at this point, so a lost append is an inconsistency that must
    /// be surfaced in the logs rather than dropped.
    async fn append_turn(&self, thread_id: &str, origin: Origin, payload: serde_json::Value) {
        if let Err(e) = self
            .deps
            .memory
            .append(thread_id, origin, payload, None)
            .await
        {
            tracing::warn!(
                task = %self.task_id,
                thread = %thread_id,
                error = %e,
                "Task reached a terminal state but the memory append was lost"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::{AgentInput, AgentOutput, StaticAgent};
    use crate::task::state::TaskState;
    use async_trait::async_trait;

    struct FailingAgent;

    #[async_trait]
    impl Agent for FailingAgent {
        fn name(&self) -> &str {
            "failing"
        }
        async fn execute(&self, _input: &AgentInput) -> Result<AgentOutput, AgentError> {
            Err(AgentError::RequestFailed {
                reason: "timeout".to_string(),
            })
        }
    }

    struct SlowAgent;

    #[async_trait]
    impl Agent for SlowAgent {
        fn name(&self) -> &str {
            "slow"
        }
        async fn execute(&self, _input: &AgentInput) -> Result<AgentOutput, AgentError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            unreachable!("test agent should have been timed out")
        }
    }

    fn deps(agent: Arc<dyn Agent>, timeout: Duration) -> ExecutorDeps {
        ExecutorDeps {
            registry: Arc::new(TaskRegistry::new(10)),
            memory: Arc::new(MemoryStore::new(None)),
            agent,
            timeout,
        }
    }

    #[tokio::test]
    async fn success_completes_task_and_appends_memory() {
        let deps = deps(Arc::new(StaticAgent), Duration::from_secs(5));
        let id = deps
            .registry
            .create(AgentInput::new("what is rust?"), Some("t1".to_string()))
            .await
            .unwrap();

        Executor::new(id, deps.clone()).run().await.unwrap();

        let task = deps.registry.get(id).await.unwrap();
        assert_eq!(task.state, TaskState::Completed);
        assert!(task.result.is_some());
        assert!(task.error.is_none());

        let items = deps.memory.get("t1", None).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].origin, Origin::Agent);
        assert_eq!(items[0].payload["task_id"], serde_json::json!(id));
    }

    #[tokio::test]
    async fn agent_failure_fails_task_with_notice() {
        let deps = deps(Arc::new(FailingAgent), Duration::from_secs(5));
        let id = deps
            .registry
            .create(AgentInput::new("doomed query"), Some("t1".to_string()))
            .await
            .unwrap();

        Executor::new(id, deps.clone()).run().await.unwrap();

        let task = deps.registry.get(id).await.unwrap();
        assert_eq!(task.state, TaskState::Failed);
        assert!(task.result.is_none());
        assert!(task.error.as_deref().unwrap().contains("timeout"));

        let items = deps.memory.get("t1", None).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].origin, Origin::System);
    }

    #[tokio::test]
    async fn standalone_task_appends_nothing() {
        let deps = deps(Arc::new(StaticAgent), Duration::from_secs(5));
        let id = deps
            .registry
            .create(AgentInput::new("no thread here"), None)
            .await
            .unwrap();

        Executor::new(id, deps.clone()).run().await.unwrap();

        assert_eq!(
            deps.registry.get(id).await.unwrap().state,
            TaskState::Completed
        );
        assert_eq!(deps.memory.thread_count().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn agent_timeout_fails_task() {
        let deps = deps(Arc::new(SlowAgent), Duration::from_millis(100));
        let id = deps
            .registry
            .create(AgentInput::new("slow query"), None)
            .await
            .unwrap();

        Executor::new(id, deps.clone()).run().await.unwrap();

        let task = deps.registry.get(id).await.unwrap();
        assert_eq!(task.state, TaskState::Failed);
        assert!(task.error.as_deref().unwrap().contains("timed out"));
    }

    #[tokio::test]
    async fn cancelled_task_is_not_claimed() {
        let deps = deps(Arc::new(StaticAgent), Duration::from_secs(5));
        let id = deps
            .registry
            .create(AgentInput::new("cancel me now"), None)
            .await
            .unwrap();
        deps.registry.cancel(id).await.unwrap();

        Executor::new(id, deps.clone()).run().await.unwrap();

        assert_eq!(
            deps.registry.get(id).await.unwrap().state,
            TaskState::Cancelled
        );
    }
}

//! Task registry — authoritative record of every submitted task.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::agent::AgentInput;
use crate::error::TaskError;
use crate::task::state::TaskState;

/// A tracked asynchronous task.
///
/// Mutated only through the registry; everything handed out is a snapshot.
/// Once terminal, exactly one of `result` / `error` is populated — except
/// for cancelled tasks, which carry neither.
#[derive(Debug, Clone, Serialize)]
pub struct Task {
    /// Unique task ID.
    pub id: Uuid,
    /// Owning conversation thread, if the task is thread-scoped.
    pub thread_id: Option<String>,
    /// Current lifecycle state.
    pub state: TaskState,
    /// The input the agent will be invoked with.
    pub input: AgentInput,
    /// Free-form progress indicator, updated while running.
    pub progress: Option<serde_json::Value>,
    /// Result payload (terminal success only).
    pub result: Option<serde_json::Value>,
    /// Error description (terminal failure only).
    pub error: Option<String>,
    /// When the task was created.
    pub created_at: DateTime<Utc>,
    /// When the task last changed.
    pub updated_at: DateTime<Utc>,
    /// When the task was claimed.
    pub started_at: Option<DateTime<Utc>>,
    /// When the task reached a terminal state.
    pub completed_at: Option<DateTime<Utc>>,
}

impl Task {
    fn new(input: AgentInput, thread_id: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            thread_id,
            state: TaskState::Pending,
            input,
            progress: None,
            result: None,
            error: None,
            created_at: now,
            updated_at: now,
            started_at: None,
            completed_at: None,
        }
    }

    /// Transition to a new state, updating timestamps.
    fn transition_to(&mut self, target: TaskState) -> Result<(), TaskError> {
        if !self.state.can_transition_to(target) {
            return Err(TaskError::InvalidTransition {
                id: self.id,
                state: self.state,
                target,
            });
        }

        self.state = target;
        self.updated_at = Utc::now();

        match target {
            TaskState::Running if self.started_at.is_none() => {
                self.started_at = Some(self.updated_at);
            }
            TaskState::Completed | TaskState::Failed | TaskState::Cancelled => {
                self.completed_at = Some(self.updated_at);
            }
            _ => {}
        }

        Ok(())
    }
}

/// Tracks lifecycle state for all submitted tasks.
pub struct TaskRegistry {
    tasks: RwLock<HashMap<Uuid, Task>>,
    /// Maximum concurrently active (non-terminal) tasks.
    max_active: usize,
}

impl TaskRegistry {
    /// Create a new registry.
    pub fn new(max_active: usize) -> Self {
        Self {
            tasks: RwLock::new(HashMap::new()),
            max_active,
        }
    }

    /// Create a task in `Pending` state and return its ID.
    pub async fn create(
        &self,
        input: AgentInput,
        thread_id: Option<String>,
    ) -> Result<Uuid, TaskError> {
        let mut tasks = self.tasks.write().await;
        let active_count = tasks.values().filter(|t| t.state.is_active()).count();

        if active_count >= self.max_active {
            return Err(TaskError::MaxTasksExceeded {
                max: self.max_active,
            });
        }

        let task = Task::new(input, thread_id);
        let id = task.id;
        tasks.insert(id, task);
        Ok(id)
    }

    /// Atomically transition `Pending → Running` and return a snapshot.
    ///
    /// Fails with `AlreadyClaimed` if the task is in any other state, so at
    /// most one executor ever claims a given task.
    pub async fn claim(&self, id: Uuid) -> Result<Task, TaskError> {
        let mut tasks = self.tasks.write().await;
        let task = tasks.get_mut(&id).ok_or(TaskError::NotFound { id })?;

        if task.state != TaskState::Pending {
            return Err(TaskError::AlreadyClaimed {
                id,
                state: task.state,
            });
        }

        task.transition_to(TaskState::Running)?;
        Ok(task.clone())
    }

    /// Record free-form progress. Allowed only while `Running`.
    pub async fn update_progress(
        &self,
        id: Uuid,
        progress: serde_json::Value,
    ) -> Result<(), TaskError> {
        let mut tasks = self.tasks.write().await;
        let task = tasks.get_mut(&id).ok_or(TaskError::NotFound { id })?;

        if task.state != TaskState::Running {
            return Err(TaskError::InvalidTransition {
                id,
                state: task.state,
                target: TaskState::Running,
            });
        }

        task.progress = Some(progress);
        task.updated_at = Utc::now();
        Ok(())
    }

    /// Transition `Running → Completed` with a result payload.
    pub async fn complete(&self, id: Uuid, result: serde_json::Value) -> Result<(), TaskError> {
        let mut tasks = self.tasks.write().await;
        let task = tasks.get_mut(&id).ok_or(TaskError::NotFound { id })?;
        task.transition_to(TaskState::Completed)?;
        task.result = Some(result);
        Ok(())
    }

    /// Transition `Running → Failed` with an error description.
    pub async fn fail(&self, id: Uuid, error: impl Into<String>) -> Result<(), TaskError> {
        let mut tasks = self.tasks.write().await;
        let task = tasks.get_mut(&id).ok_or(TaskError::NotFound { id })?;
        task.transition_to(TaskState::Failed)?;
        task.error = Some(error.into());
        Ok(())
    }

    /// Cancel a `Pending` or `Running` task.
    pub async fn cancel(&self, id: Uuid) -> Result<(), TaskError> {
        let mut tasks = self.tasks.write().await;
        let task = tasks.get_mut(&id).ok_or(TaskError::NotFound { id })?;
        task.transition_to(TaskState::Cancelled)
    }

    /// Read-only snapshot of a task. Safe to call concurrently with writers.
    pub async fn get(&self, id: Uuid) -> Result<Task, TaskError> {
        self.tasks
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(TaskError::NotFound { id })
    }

    /// Count of active (non-terminal) tasks.
    pub async fn active_count(&self) -> usize {
        self.tasks
            .read()
            .await
            .values()
            .filter(|t| t.state.is_active())
            .count()
    }

    /// Find `Running` tasks whose last update is older than `threshold`.
    ///
    /// These are orphans left behind by a worker that died mid-execution.
    pub async fn find_stale(&self, threshold: Duration) -> Vec<Uuid> {
        let cutoff = Utc::now()
            - chrono::Duration::from_std(threshold).unwrap_or(chrono::Duration::zero());
        self.tasks
            .read()
            .await
            .values()
            .filter(|t| t.state == TaskState::Running && t.updated_at < cutoff)
            .map(|t| t.id)
            .collect()
    }

    /// Remove terminal tasks older than `retention`. Returns the number
    /// removed. Non-terminal tasks are never pruned.
    pub async fn prune(&self, retention: Duration) -> usize {
        let cutoff = Utc::now()
            - chrono::Duration::from_std(retention).unwrap_or(chrono::Duration::zero());
        let mut tasks = self.tasks.write().await;
        let before = tasks.len();
        tasks.retain(|_, t| {
            t.state.is_active() || t.completed_at.map(|at| at >= cutoff).unwrap_or(true)
        });
        before - tasks.len()
    }

    /// Per-state task counts.
    pub async fn summary(&self) -> TaskSummary {
        let tasks = self.tasks.read().await;

        let mut summary = TaskSummary::default();
        for task in tasks.values() {
            match task.state {
                TaskState::Pending => summary.pending += 1,
                TaskState::Running => summary.running += 1,
                TaskState::Completed => summary.completed += 1,
                TaskState::Failed => summary.failed += 1,
                TaskState::Cancelled => summary.cancelled += 1,
            }
        }

        summary.total = tasks.len();
        summary
    }
}

/// Summary of all tracked tasks.
#[derive(Debug, Default, Clone, Serialize)]
pub struct TaskSummary {
    pub total: usize,
    pub pending: usize,
    pub running: usize,
    pub completed: usize,
    pub failed: usize,
    pub cancelled: usize,
}

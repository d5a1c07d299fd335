//! Runner — spawns and tracks per-task workers, plus background maintenance.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio::sync::{RwLock, oneshot};
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::agent::AgentInput;
use crate::error::TaskError;
use crate::task::executor::{Executor, ExecutorDeps};

/// Owns the worker pool: one tokio task per submitted research task.
pub struct Runner {
    deps: ExecutorDeps,
    /// Live worker handles, for cancellation and shutdown.
    workers: Arc<RwLock<HashMap<Uuid, JoinHandle<()>>>>,
}

impl Runner {
    /// Create a runner over the shared executor dependencies.
    pub fn new(deps: ExecutorDeps) -> Self {
        Self {
            deps,
            workers: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Registry handle, for status reads by the request layer.
    pub fn registry(&self) -> &Arc<crate::task::TaskRegistry> {
        &self.deps.registry
    }

    /// Submit a task: create a `Pending` registry entry and hand it to a
    /// worker. Returns the task ID immediately.
    pub async fn submit(
        &self,
        input: AgentInput,
        thread_id: Option<String>,
    ) -> Result<Uuid, TaskError> {
        let id = self.deps.registry.create(input, thread_id).await?;

        // The worker waits for the start signal so it cannot finish (and try
        // to deregister itself) before it has been tracked.
        let (start_tx, start_rx) = oneshot::channel::<()>();
        let deps = self.deps.clone();
        let workers = Arc::clone(&self.workers);

        let handle = tokio::spawn(async move {
            if start_rx.await.is_err() {
                return;
            }
            if let Err(e) = Executor::new(id, deps).run().await {
                tracing::error!(task = %id, error = %e, "Worker failed");
            }
            workers.write().await.remove(&id);
        });

        self.workers.write().await.insert(id, handle);
        let _ = start_tx.send(());

        tracing::debug!(task = %id, "Task submitted");
        Ok(id)
    }

    /// Cancel a task and abort its worker if one is still running.
    pub async fn cancel(&self, id: Uuid) -> Result<(), TaskError> {
        self.deps.registry.cancel(id).await?;

        if let Some(handle) = self.workers.write().await.remove(&id) {
            if !handle.is_finished() {
                handle.abort();
            }
        }

        tracing::info!(task = %id, "Task cancelled");
        Ok(())
    }

    /// Number of live workers.
    pub async fn running_count(&self) -> usize {
        self.workers.read().await.len()
    }

    /// Abort all workers and wait for them to wind down.
    pub async fn shutdown(&self) {
        let handles: Vec<JoinHandle<()>> = {
            let mut workers = self.workers.write().await;
            workers.drain().map(|(_, handle)| handle).collect()
        };

        for handle in &handles {
            handle.abort();
        }
        join_all(handles).await;
    }

    /// Spawn the background maintenance loop: expiry sweeps, terminal-task
    /// pruning, and orphaned-task detection.
    pub fn spawn_maintenance(
        &self,
        interval: Duration,
        stale_threshold: Duration,
        retention: Duration,
    ) -> JoinHandle<()> {
        let runner = Self {
            deps: self.deps.clone(),
            workers: Arc::clone(&self.workers),
        };

        tokio::spawn(async move {
            loop {
                tokio::time::sleep(interval).await;
                runner.maintain(stale_threshold, retention).await;
            }
        })
    }

    /// One maintenance pass.
    async fn maintain(&self, stale_threshold: Duration, retention: Duration) {
        let swept = self.deps.memory.sweep().await;
        if swept > 0 {
            tracing::debug!(removed = swept, "Expired memory items swept");
        }

        // A Running task with no recent update means its worker died or
        // wedged. Fail it; resubmission is an operator decision.
        for id in self.deps.registry.find_stale(stale_threshold).await {
            tracing::warn!(task = %id, "Failing stale task");

            if let Some(handle) = self.workers.write().await.remove(&id) {
                handle.abort();
            }
            if let Err(e) = self
                .deps
                .registry
                .fail(
                    id,
                    format!(
                        "stale: no progress for at least {}s",
                        stale_threshold.as_secs()
                    ),
                )
                .await
            {
                // Lost the race with a finishing worker.
                tracing::debug!(task = %id, error = %e, "Stale task resolved itself");
            }
        }

        let pruned = self.deps.registry.prune(retention).await;
        if pruned > 0 {
            tracing::debug!(removed = pruned, "Old terminal tasks pruned");
        }
    }
}

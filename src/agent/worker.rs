//! Single worker agent loop

use super::pool::PoolStatus;
use crate::evaluator::ExpressionEvaluator;
use crate::observability::metrics::metrics;
use crate::tasks::{
    AgentId, DispatchConsumer, RegistryError, Task, TaskFailure, TaskId, TaskRegistry,
};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn, Instrument};

/// One worker agent
///
/// The agent never holds a registry lock while evaluating, so a slow
/// expression only occupies this agent.
pub struct WorkerAgent {
    id: AgentId,
    consumer: DispatchConsumer,
    registry: Arc<TaskRegistry>,
    evaluator: Arc<dyn ExpressionEvaluator>,
    status: Arc<PoolStatus>,
}

impl WorkerAgent {
    pub fn new(
        id: AgentId,
        consumer: DispatchConsumer,
        registry: Arc<TaskRegistry>,
        evaluator: Arc<dyn ExpressionEvaluator>,
        status: Arc<PoolStatus>,
    ) -> Self {
        Self {
            id,
            consumer,
            registry,
            evaluator,
            status,
        }
    }

    pub fn id(&self) -> AgentId {
        self.id
    }

    /// Pull and evaluate tasks until the dispatch queue closes
    pub async fn run(self) {
        info!(agent_id = self.id, "Agent started");

        while let Some(task_id) = self.consumer.dequeue().await {
            if let Err(e) = self.process_task(task_id).await {
                error!(
                    agent_id = self.id,
                    task_id = task_id,
                    error = %e,
                    "Failed to record task state"
                );
            }
        }

        info!(agent_id = self.id, "Dispatch queue closed, agent stopping");
    }

    /// Claim, evaluate and settle one task
    ///
    /// Evaluation failures settle the task as `failed`; only registry
    /// errors are returned.
    pub async fn process_task(&self, task_id: TaskId) -> Result<Task, RegistryError> {
        let task = self.registry.mark_calculating(task_id, self.id)?;
        let _busy = self.status.begin_task();
        metrics().task_started();

        info!(
            task_id = task_id,
            agent_id = self.id,
            expression = %task.expression,
            "Task claimed"
        );

        let started = Instant::now();
        let evaluation = self
            .evaluator
            .evaluate(&task.expression)
            .instrument(crate::task_span!(task_id = task_id, agent_id = self.id))
            .await;
        let elapsed = started.elapsed();

        match evaluation {
            Ok(value) => {
                metrics().task_completed(elapsed);
                let task = self.registry.mark_completed(task_id, value)?;
                info!(
                    task_id = task_id,
                    agent_id = self.id,
                    status = %task.status,
                    result = value,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Task completed"
                );
                Ok(task)
            }
            Err(err) => {
                metrics().task_failed(elapsed);
                let task = self.registry.mark_failed(task_id, TaskFailure::from(&err))?;
                warn!(
                    task_id = task_id,
                    agent_id = self.id,
                    status = %task.status,
                    error = %err,
                    "Task failed"
                );
                Ok(task)
            }
        }
    }
}

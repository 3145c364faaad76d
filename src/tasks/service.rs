//! Task submission and lookup facade used by the transport layer

use super::{DispatchQueue, Task, TaskFailure, TaskId, TaskRegistry, TaskStatus};
use crate::config::OverflowPolicy;
use crate::error::{ServiceError, ServiceResult};
use crate::observability::metrics::metrics;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

/// What a client polling for a result gets back
#[derive(Debug, Clone, PartialEq)]
pub enum TaskOutcome {
    Pending,
    Completed(f64),
    Failed(TaskFailure),
}

/// Couples the task registry with the dispatch queue
///
/// Identifier assignment and enqueue happen under one submission lock, so
/// agents always receive tasks in identifier order.
#[derive(Debug)]
pub struct TaskService {
    registry: Arc<TaskRegistry>,
    queue: Arc<DispatchQueue>,
    overflow: OverflowPolicy,
    submit_lock: Mutex<()>,
}

impl TaskService {
    pub fn new(
        registry: Arc<TaskRegistry>,
        queue: Arc<DispatchQueue>,
        overflow: OverflowPolicy,
    ) -> Self {
        Self {
            registry,
            queue,
            overflow,
            submit_lock: Mutex::new(()),
        }
    }

    pub fn registry(&self) -> &Arc<TaskRegistry> {
        &self.registry
    }

    pub fn queue(&self) -> &Arc<DispatchQueue> {
        &self.queue
    }

    /// Create a task for `expression` and hand it to the worker pool
    ///
    /// Under [`OverflowPolicy::Block`] this waits for queue capacity; under
    /// [`OverflowPolicy::Reject`] a full queue fails with
    /// [`ServiceError::QueueFull`] and no task is created.
    pub async fn submit(&self, expression: &str) -> ServiceResult<TaskId> {
        if expression.trim().is_empty() {
            return Err(ServiceError::decode_error("expression must not be empty"));
        }

        let _guard = self.submit_lock.lock().await;

        let permit = match self.overflow {
            OverflowPolicy::Block => self.queue.reserve().await,
            OverflowPolicy::Reject => self.queue.try_reserve(),
        }
        .map_err(|err| {
            metrics().task_rejected();
            warn!(error = %err, "Task submission rejected");
            ServiceError::from(err)
        })?;

        let id = self.registry.create(expression);
        permit.send(id);
        metrics().task_submitted();

        info!(task_id = id, expression = %expression, "Task queued");
        Ok(id)
    }

    pub fn get(&self, id: TaskId) -> ServiceResult<Task> {
        Ok(self.registry.get(id)?)
    }

    pub fn list(&self) -> Vec<Task> {
        self.registry.list()
    }

    /// Result of a task, or `Pending` while it is queued or calculating
    pub fn result(&self, id: TaskId) -> ServiceResult<TaskOutcome> {
        let task = self.registry.get(id)?;

        Ok(match (task.status, task.result, task.error) {
            (TaskStatus::Completed, Some(value), _) => TaskOutcome::Completed(value),
            (TaskStatus::Failed, _, Some(failure)) => TaskOutcome::Failed(failure),
            _ => TaskOutcome::Pending,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::EvaluationError;

    fn service(capacity: usize, overflow: OverflowPolicy) -> TaskService {
        TaskService::new(
            Arc::new(TaskRegistry::new()),
            Arc::new(DispatchQueue::new(capacity)),
            overflow,
        )
    }

    #[tokio::test]
    async fn test_submit_creates_and_enqueues() {
        let service = service(4, OverflowPolicy::Block);
        let consumer = service.queue().consumer();

        let id = service.submit("2+2").await.unwrap();

        assert_eq!(id, 1);
        assert_eq!(service.get(id).unwrap().status, TaskStatus::Queued);
        assert_eq!(consumer.dequeue().await, Some(id));
    }

    #[tokio::test]
    async fn test_submit_rejects_empty_expression() {
        let service = service(4, OverflowPolicy::Block);

        let err = service.submit("   ").await.unwrap_err();

        assert!(matches!(err, ServiceError::DecodeError { .. }));
        assert!(service.registry().is_empty());
    }

    #[tokio::test]
    async fn test_reject_policy_does_not_create_task() {
        let service = service(1, OverflowPolicy::Reject);
        service.submit("1+1").await.unwrap();

        let err = service.submit("2+2").await.unwrap_err();

        assert!(matches!(err, ServiceError::QueueFull { capacity: 1 }));
        assert_eq!(service.list().len(), 1);
    }

    #[tokio::test]
    async fn test_result_is_pending_until_completed() {
        let service = service(4, OverflowPolicy::Block);
        let id = service.submit("3*3").await.unwrap();

        assert_eq!(service.result(id).unwrap(), TaskOutcome::Pending);

        service.registry().mark_calculating(id, 1).unwrap();
        assert_eq!(service.result(id).unwrap(), TaskOutcome::Pending);

        service.registry().mark_completed(id, 9.0).unwrap();
        assert_eq!(service.result(id).unwrap(), TaskOutcome::Completed(9.0));
    }

    #[tokio::test]
    async fn test_result_reports_failure() {
        let service = service(4, OverflowPolicy::Block);
        let id = service.submit("(").await.unwrap();
        let failure = TaskFailure::from(&EvaluationError::UnbalancedParentheses);

        service.registry().mark_calculating(id, 1).unwrap();
        service.registry().mark_failed(id, failure.clone()).unwrap();

        assert_eq!(service.result(id).unwrap(), TaskOutcome::Failed(failure));
    }

    #[tokio::test]
    async fn test_result_for_unknown_task() {
        let service = service(4, OverflowPolicy::Block);
        assert!(matches!(
            service.result(99),
            Err(ServiceError::NotFound { id: 99 })
        ));
    }
}

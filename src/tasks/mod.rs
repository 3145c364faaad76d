//! Task records, the task registry and the dispatch queue
//!
//! A task moves `queued -> calculating -> completed | failed` and is never
//! removed. The registry owns the canonical record; the queue only carries
//! task identifiers from submission to whichever agent is free first.

pub mod queue;
pub mod registry;
pub mod service;

pub use queue::{DispatchConsumer, DispatchPermit, DispatchQueue, QueueError};
pub use registry::{RegistryError, TaskRegistry};
pub use service::{TaskOutcome, TaskService};

use crate::evaluator::EvaluationError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Task identifier, assigned from 1 upwards
pub type TaskId = u64;

/// Worker agent identifier, assigned from 1 upwards
pub type AgentId = u32;

/// Task lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Queued,
    Calculating,
    Completed,
    Failed,
}

impl TaskStatus {
    /// Only forward transitions are allowed
    pub fn can_transition_to(self, next: TaskStatus) -> bool {
        matches!(
            (self, next),
            (TaskStatus::Queued, TaskStatus::Calculating)
                | (TaskStatus::Calculating, TaskStatus::Completed)
                | (TaskStatus::Calculating, TaskStatus::Failed)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Failed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Queued => "queued",
            TaskStatus::Calculating => "calculating",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a task ended in the `failed` state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskFailure {
    pub kind: String,
    pub message: String,
}

impl From<&EvaluationError> for TaskFailure {
    fn from(err: &EvaluationError) -> Self {
        Self {
            kind: EvaluationError::KIND.to_string(),
            message: err.to_string(),
        }
    }
}

impl fmt::Display for TaskFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

/// Point-in-time copy of a task, safe to serialize and hand out
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub expression: String,
    pub status: TaskStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<AgentId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<TaskFailure>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
}

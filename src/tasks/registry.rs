//! Append-only task registry
//!
//! Storage is an arena of slots indexed by `id - 1`. The arena lock only
//! guards membership; each slot has its own mutex over the mutable fields,
//! so updating one task never blocks readers or writers of another.

use super::{AgentId, Task, TaskFailure, TaskId, TaskStatus};
use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use thiserror::Error;
use tracing::debug;

/// Task registry errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("task {id} not found")]
    NotFound { id: TaskId },

    #[error("task {id} cannot move from {from} to {to}")]
    InvalidTransition {
        id: TaskId,
        from: TaskStatus,
        to: TaskStatus,
    },
}

#[derive(Debug)]
struct TaskState {
    status: TaskStatus,
    result: Option<f64>,
    agent_id: Option<AgentId>,
    error: Option<TaskFailure>,
    started_at: Option<DateTime<Utc>>,
    finished_at: Option<DateTime<Utc>>,
}

#[derive(Debug)]
struct TaskSlot {
    id: TaskId,
    expression: String,
    created_at: DateTime<Utc>,
    state: Mutex<TaskState>,
}

impl TaskSlot {
    fn lock(&self) -> MutexGuard<'_, TaskState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn snapshot_with(&self, state: &TaskState) -> Task {
        Task {
            id: self.id,
            expression: self.expression.clone(),
            status: state.status,
            result: state.result,
            agent_id: state.agent_id,
            error: state.error.clone(),
            created_at: self.created_at,
            started_at: state.started_at,
            finished_at: state.finished_at,
        }
    }

    fn snapshot(&self) -> Task {
        let state = self.lock();
        self.snapshot_with(&state)
    }

    /// Apply `update` under the slot lock if `next` is a legal transition
    fn transition(
        &self,
        next: TaskStatus,
        update: impl FnOnce(&mut TaskState),
    ) -> Result<Task, RegistryError> {
        let mut state = self.lock();
        if !state.status.can_transition_to(next) {
            return Err(RegistryError::InvalidTransition {
                id: self.id,
                from: state.status,
                to: next,
            });
        }

        state.status = next;
        update(&mut state);
        Ok(self.snapshot_with(&state))
    }
}

/// Thread-safe registry of every task submitted during the process lifetime
#[derive(Debug, Default)]
pub struct TaskRegistry {
    slots: RwLock<Vec<Arc<TaskSlot>>>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a new queued task and return its identifier
    pub fn create(&self, expression: impl Into<String>) -> TaskId {
        let mut slots = self.slots.write().unwrap_or_else(PoisonError::into_inner);
        let id = slots.len() as TaskId + 1;

        slots.push(Arc::new(TaskSlot {
            id,
            expression: expression.into(),
            created_at: Utc::now(),
            state: Mutex::new(TaskState {
                status: TaskStatus::Queued,
                result: None,
                agent_id: None,
                error: None,
                started_at: None,
                finished_at: None,
            }),
        }));

        debug!(task_id = id, "Task created");
        id
    }

    pub fn get(&self, id: TaskId) -> Result<Task, RegistryError> {
        Ok(self.slot(id)?.snapshot())
    }

    /// Snapshot every task in creation order
    ///
    /// The arena lock is released before individual tasks are read, so tasks
    /// may advance while the list is being built.
    pub fn list(&self) -> Vec<Task> {
        let slots: Vec<Arc<TaskSlot>> = self
            .slots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        slots.iter().map(|slot| slot.snapshot()).collect()
    }

    pub fn len(&self) -> usize {
        self.slots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Record that `agent_id` claimed the task
    pub fn mark_calculating(&self, id: TaskId, agent_id: AgentId) -> Result<Task, RegistryError> {
        self.slot(id)?.transition(TaskStatus::Calculating, |state| {
            state.agent_id = Some(agent_id);
            state.started_at = Some(Utc::now());
        })
    }

    pub fn mark_completed(&self, id: TaskId, result: f64) -> Result<Task, RegistryError> {
        self.slot(id)?.transition(TaskStatus::Completed, |state| {
            state.result = Some(result);
            state.finished_at = Some(Utc::now());
        })
    }

    pub fn mark_failed(&self, id: TaskId, failure: TaskFailure) -> Result<Task, RegistryError> {
        self.slot(id)?.transition(TaskStatus::Failed, |state| {
            state.error = Some(failure);
            state.finished_at = Some(Utc::now());
        })
    }

    fn slot(&self, id: TaskId) -> Result<Arc<TaskSlot>, RegistryError> {
        let slots = self.slots.read().unwrap_or_else(PoisonError::into_inner);

        id.checked_sub(1)
            .and_then(|index| usize::try_from(index).ok())
            .and_then(|index| slots.get(index))
            .cloned()
            .ok_or(RegistryError::NotFound { id })
    }
}

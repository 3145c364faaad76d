//! Bounded FIFO dispatch queue between submission and the worker pool

use super::TaskId;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, Mutex};

/// Dispatch queue errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueueError {
    #[error("dispatch queue is full (capacity {capacity})")]
    Full { capacity: usize },

    #[error("dispatch queue is closed")]
    Closed,
}

/// Bounded multi-consumer queue of task identifiers
///
/// All consumers share the single receiver; an idle agent waits on the
/// receiver lock and the one holding it takes the oldest pending task.
#[derive(Debug)]
pub struct DispatchQueue {
    sender: mpsc::Sender<TaskId>,
    receiver: Arc<Mutex<mpsc::Receiver<TaskId>>>,
    capacity: usize,
}

/// A reserved slot in the queue, guaranteed to accept one task
pub struct DispatchPermit<'a> {
    permit: mpsc::Permit<'a, TaskId>,
}

impl DispatchPermit<'_> {
    pub fn send(self, id: TaskId) {
        self.permit.send(id);
    }
}

impl DispatchQueue {
    /// Create a queue holding at most `capacity` pending tasks
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero; configuration validation rejects that.
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = mpsc::channel(capacity);
        Self {
            sender,
            receiver: Arc::new(Mutex::new(receiver)),
            capacity,
        }
    }

    /// Wait until a slot is free
    pub async fn reserve(&self) -> Result<DispatchPermit<'_>, QueueError> {
        let permit = self
            .sender
            .reserve()
            .await
            .map_err(|_| QueueError::Closed)?;
        Ok(DispatchPermit { permit })
    }

    /// Reserve a slot without waiting
    pub fn try_reserve(&self) -> Result<DispatchPermit<'_>, QueueError> {
        match self.sender.try_reserve() {
            Ok(permit) => Ok(DispatchPermit { permit }),
            Err(mpsc::error::TrySendError::Full(())) => Err(QueueError::Full {
                capacity: self.capacity,
            }),
            Err(mpsc::error::TrySendError::Closed(())) => Err(QueueError::Closed),
        }
    }

    /// Enqueue a task, waiting while the queue is full
    pub async fn enqueue(&self, id: TaskId) -> Result<(), QueueError> {
        self.reserve().await?.send(id);
        Ok(())
    }

    /// Handle that agents use to pull tasks
    pub fn consumer(&self) -> DispatchConsumer {
        DispatchConsumer {
            receiver: Arc::clone(&self.receiver),
        }
    }

    /// Pending tasks plus reserved slots
    pub fn depth(&self) -> usize {
        self.capacity - self.sender.capacity()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// Consumer side of the dispatch queue, cloned once per agent
#[derive(Debug, Clone)]
pub struct DispatchConsumer {
    receiver: Arc<Mutex<mpsc::Receiver<TaskId>>>,
}

impl DispatchConsumer {
    /// Wait for the next task; `None` once every sender is gone
    pub async fn dequeue(&self) -> Option<TaskId> {
        let mut receiver = self.receiver.lock().await;
        receiver.recv().await
    }
}

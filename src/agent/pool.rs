//! Fixed-size worker pool

use super::worker::WorkerAgent;
use crate::evaluator::ExpressionEvaluator;
use crate::tasks::{AgentId, DispatchConsumer, TaskRegistry};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{info, Instrument};

/// Live view of pool utilisation, shared with the health endpoint
#[derive(Debug)]
pub struct PoolStatus {
    size: usize,
    alive: AtomicUsize,
    busy: AtomicUsize,
}

impl PoolStatus {
    /// All `size` agents count as alive until their loop exits
    pub fn new(size: usize) -> Self {
        Self {
            size,
            alive: AtomicUsize::new(size),
            busy: AtomicUsize::new(0),
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn alive(&self) -> usize {
        self.alive.load(Ordering::Relaxed)
    }

    /// Agents currently evaluating a task
    pub fn busy(&self) -> usize {
        self.busy.load(Ordering::Relaxed)
    }

    pub fn idle(&self) -> usize {
        self.alive().saturating_sub(self.busy())
    }

    pub(crate) fn begin_task(&self) -> BusyGuard<'_> {
        self.busy.fetch_add(1, Ordering::Relaxed);
        BusyGuard { status: self }
    }
}

/// Marks an agent busy until dropped
pub(crate) struct BusyGuard<'a> {
    status: &'a PoolStatus,
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.status.busy.fetch_sub(1, Ordering::Relaxed);
    }
}

/// Decrements the alive count when an agent's task ends, including on abort
struct AliveGuard {
    status: Arc<PoolStatus>,
}

impl Drop for AliveGuard {
    fn drop(&mut self) {
        self.status.alive.fetch_sub(1, Ordering::Relaxed);
    }
}

/// A fixed number of agents consuming one dispatch queue
///
/// Agents run until the queue closes or the pool is shut down; the pool is
/// never resized.
pub struct WorkerPool {
    handles: Vec<JoinHandle<()>>,
    status: Arc<PoolStatus>,
}

impl WorkerPool {
    /// Spawn `agents` agents numbered from 1. Must run inside a tokio runtime.
    pub fn start(
        agents: usize,
        consumer: DispatchConsumer,
        registry: Arc<TaskRegistry>,
        evaluator: Arc<dyn ExpressionEvaluator>,
    ) -> Self {
        let status = Arc::new(PoolStatus::new(agents));

        let handles = (1..=agents)
            .map(|n| {
                let agent_id = n as AgentId;
                let agent = WorkerAgent::new(
                    agent_id,
                    consumer.clone(),
                    Arc::clone(&registry),
                    Arc::clone(&evaluator),
                    Arc::clone(&status),
                );
                let alive = AliveGuard {
                    status: Arc::clone(&status),
                };

                tokio::spawn(
                    async move {
                        let _alive = alive;
                        agent.run().await;
                    }
                    .instrument(crate::agent_span!(agent_id = agent_id)),
                )
            })
            .collect();

        info!(agents = agents, "Worker pool started");
        Self { handles, status }
    }

    pub fn size(&self) -> usize {
        self.status.size()
    }

    pub fn busy_agents(&self) -> usize {
        self.status.busy()
    }

    pub fn status(&self) -> Arc<PoolStatus> {
        Arc::clone(&self.status)
    }

    /// Stop every agent; evaluations in progress are abandoned
    pub async fn shutdown(self) {
        for handle in &self.handles {
            handle.abort();
        }
        for handle in self.handles {
            // Aborted agents report a cancellation error; nothing to do with it
            let _ = handle.await;
        }
        info!("Worker pool stopped");
    }
}

//! Health reporting for the worker pool and dispatch queue
//!
//! Served by `GET /health`. An agent only stops when its task is aborted or
//! panics, so fewer alive agents than configured means the pool is degraded.

use crate::agent::PoolStatus;
use crate::tasks::{DispatchQueue, TaskRegistry};
use serde::Serialize;
use std::time::{SystemTime, UNIX_EPOCH};

/// Overall service health
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthState {
    Healthy,
    Degraded,
    Unhealthy,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub status: HealthState,
    pub agents: usize,
    pub agents_alive: usize,
    pub agents_busy: usize,
    pub queue_depth: usize,
    pub queue_capacity: usize,
    pub tasks_total: usize,
    pub timestamp: u64,
}

impl HealthReport {
    pub fn collect(pool: &PoolStatus, queue: &DispatchQueue, registry: &TaskRegistry) -> Self {
        let alive = pool.alive();

        let status = if alive == 0 {
            HealthState::Unhealthy
        } else if alive < pool.size() {
            HealthState::Degraded
        } else {
            HealthState::Healthy
        };

        Self {
            status,
            agents: pool.size(),
            agents_alive: alive,
            agents_busy: pool.busy(),
            queue_depth: queue.depth(),
            queue_capacity: queue.capacity(),
            tasks_total: registry.len(),
            timestamp: current_timestamp(),
        }
    }

    /// Degraded pools still make progress and report as serving
    pub fn is_serving(&self) -> bool {
        self.status != HealthState::Unhealthy
    }
}

fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_healthy_pool() {
        let pool = PoolStatus::new(3);
        let queue = DispatchQueue::new(10);
        let registry = TaskRegistry::new();
        registry.create("1+1");
        queue.enqueue(1).await.unwrap();

        let report = HealthReport::collect(&pool, &queue, &registry);

        assert_eq!(report.status, HealthState::Healthy);
        assert!(report.is_serving());
        assert_eq!(report.agents, 3);
        assert_eq!(report.queue_depth, 1);
        assert_eq!(report.queue_capacity, 10);
        assert_eq!(report.tasks_total, 1);
    }

    #[test]
    fn test_report_serializes_lowercase_status() {
        let pool = PoolStatus::new(1);
        let queue = DispatchQueue::new(1);
        let registry = TaskRegistry::new();

        let json = serde_json::to_value(HealthReport::collect(&pool, &queue, &registry)).unwrap();
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["agents_busy"], 0);
    }
}

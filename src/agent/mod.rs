//! Worker agents that evaluate queued tasks
//!
//! A fixed pool of agents shares one dispatch queue. Each agent claims one
//! task at a time, evaluates it and records the outcome in the registry.

pub mod pool;
pub mod worker;

pub use pool::{PoolStatus, WorkerPool};
pub use worker::WorkerAgent;

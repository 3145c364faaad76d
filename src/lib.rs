//! Calc Agents
//!
//! An HTTP service that accepts arithmetic expressions as tasks and evaluates
//! them on a fixed pool of worker agents. Each operator application takes a
//! configurable simulated duration.
//!
//! # Overview
//!
//! - [`tasks`]: task registry, bounded FIFO dispatch queue and the submission facade
//! - [`evaluator`]: two-stack expression evaluator and the operator catalog
//! - [`agent`]: worker agents and the fixed-size pool
//! - [`transport`]: warp HTTP API
//! - [`observability`]: structured logging, metrics and health
//!
//! # Quick Start
//!
//! ```rust
//! use calc_agents::evaluator::{ExpressionEvaluator, OperationCatalog, StackEvaluator};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # tokio_test::block_on(async {
//! let catalog = Arc::new(OperationCatalog::with_uniform_duration(Duration::ZERO));
//! let evaluator = StackEvaluator::new(catalog);
//!
//! assert_eq!(evaluator.evaluate("2+3*4").await, Ok(14.0));
//! assert_eq!(evaluator.evaluate("(2+3)*4").await, Ok(20.0));
//! # });
//! ```

pub mod agent;
pub mod app;
pub mod config;
pub mod error;
pub mod evaluator;
pub mod observability;
pub mod tasks;
pub mod testing;
pub mod transport;

pub use agent::{PoolStatus, WorkerPool};
pub use app::App;
pub use config::*;
pub use error::{ServiceError, ServiceResult};
pub use evaluator::{EvaluationError, ExpressionEvaluator, OperationCatalog, StackEvaluator};
pub use tasks::{Task, TaskId, TaskOutcome, TaskService, TaskStatus};
pub use transport::HttpApi;

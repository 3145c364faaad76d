//! Application bootstrap
//!
//! Wires configuration into the registry, dispatch queue, worker pool and
//! HTTP API. `main` only deals with the CLI and process signals.

use crate::agent::{PoolStatus, WorkerPool};
use crate::config::ServiceConfig;
use crate::error::ServiceResult;
use crate::evaluator::{ExpressionEvaluator, OperationCatalog, StackEvaluator};
use crate::tasks::{DispatchQueue, TaskRegistry, TaskService};
use crate::transport::HttpApi;
use std::future::Future;
use std::sync::Arc;
use tracing::info;

/// A running service: worker pool started, HTTP API ready to serve
pub struct App {
    config: ServiceConfig,
    service: Arc<TaskService>,
    catalog: Arc<OperationCatalog>,
    pool: WorkerPool,
    api: Arc<HttpApi>,
}

impl App {
    /// Start the pool with the stack evaluator and configured operator delays
    ///
    /// Must be called inside a tokio runtime.
    pub fn start(config: ServiceConfig) -> ServiceResult<Self> {
        let catalog = Arc::new(OperationCatalog::new(&config.operations));
        let evaluator = Arc::new(StackEvaluator::new(Arc::clone(&catalog)));
        Self::build(config, catalog, evaluator)
    }

    /// Start the pool with a custom evaluator
    pub fn with_evaluator(
        config: ServiceConfig,
        evaluator: Arc<dyn ExpressionEvaluator>,
    ) -> ServiceResult<Self> {
        let catalog = Arc::new(OperationCatalog::new(&config.operations));
        Self::build(config, catalog, evaluator)
    }

    fn build(
        config: ServiceConfig,
        catalog: Arc<OperationCatalog>,
        evaluator: Arc<dyn ExpressionEvaluator>,
    ) -> ServiceResult<Self> {
        config.validate()?;

        let registry = Arc::new(TaskRegistry::new());
        let queue = Arc::new(DispatchQueue::new(config.pool.queue_capacity));
        let pool = WorkerPool::start(
            config.pool.agents,
            queue.consumer(),
            Arc::clone(&registry),
            evaluator,
        );
        let service = Arc::new(TaskService::new(registry, queue, config.pool.overflow));
        let api = Arc::new(HttpApi::new(
            Arc::clone(&service),
            Arc::clone(&catalog),
            pool.status(),
        ));

        info!(
            agents = config.pool.agents,
            queue_capacity = config.pool.queue_capacity,
            overflow = ?config.pool.overflow,
            "Service initialized"
        );

        Ok(Self {
            config,
            service,
            catalog,
            pool,
            api,
        })
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub fn service(&self) -> Arc<TaskService> {
        Arc::clone(&self.service)
    }

    pub fn catalog(&self) -> Arc<OperationCatalog> {
        Arc::clone(&self.catalog)
    }

    pub fn pool_status(&self) -> Arc<PoolStatus> {
        self.pool.status()
    }

    pub fn api(&self) -> Arc<HttpApi> {
        Arc::clone(&self.api)
    }

    /// Serve HTTP on the configured address until `shutdown` resolves, then
    /// stop the worker pool
    pub async fn serve<F>(self, shutdown: F) -> ServiceResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = self.config.socket_addr()?;
        let served = Arc::clone(&self.api).serve(addr, shutdown).await;
        self.shutdown().await;
        served
    }

    /// Stop every agent. Queued and in-flight tasks are abandoned.
    pub async fn shutdown(self) {
        info!(
            tasks_total = self.service.registry().len(),
            "Stopping worker pool"
        );
        self.pool.shutdown().await;
    }
}

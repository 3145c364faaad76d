//! Mock implementations for testing
//!
//! Provides a mock expression evaluator whose progress tests can hold and
//! release, so pool scheduling can be observed without real delays.

use crate::evaluator::{
    EvaluationError, ExpressionEvaluator, OperationCatalog, StackEvaluator,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Semaphore;

/// Releases gated evaluations one at a time
#[derive(Debug, Clone)]
pub struct EvaluationGate {
    permits: Arc<Semaphore>,
}

impl EvaluationGate {
    /// Let `count` waiting (or future) evaluations finish
    pub fn release(&self, count: usize) {
        self.permits.add_permits(count);
    }

    /// Stop gating entirely
    pub fn open(&self) {
        self.permits.close();
    }
}

/// Mock evaluator for testing
///
/// Unscripted expressions are evaluated for real with zero operator delay.
#[derive(Debug)]
pub struct MockEvaluator {
    gate: Option<EvaluationGate>,
    scripted: HashMap<String, Result<f64, EvaluationError>>,
    calls: Mutex<Vec<String>>,
    started: AtomicUsize,
    finished: AtomicUsize,
    fallback: StackEvaluator,
}

impl Default for MockEvaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl MockEvaluator {
    pub fn new() -> Self {
        Self {
            gate: None,
            scripted: HashMap::new(),
            calls: Mutex::new(Vec::new()),
            started: AtomicUsize::new(0),
            finished: AtomicUsize::new(0),
            fallback: StackEvaluator::new(Arc::new(OperationCatalog::with_uniform_duration(
                Duration::ZERO,
            ))),
        }
    }

    /// Evaluator that holds every evaluation until the gate releases it
    pub fn gated() -> (Self, EvaluationGate) {
        let gate = EvaluationGate {
            permits: Arc::new(Semaphore::new(0)),
        };
        let evaluator = Self {
            gate: Some(gate.clone()),
            ..Self::new()
        };
        (evaluator, gate)
    }

    /// Return `result` whenever `expression` is evaluated
    pub fn with_result(
        mut self,
        expression: impl Into<String>,
        result: Result<f64, EvaluationError>,
    ) -> Self {
        self.scripted.insert(expression.into(), result);
        self
    }

    /// Expressions in the order agents started evaluating them
    pub fn calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }

    pub fn started(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }

    pub fn finished(&self) -> usize {
        self.finished.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ExpressionEvaluator for MockEvaluator {
    async fn evaluate(&self, expression: &str) -> Result<f64, EvaluationError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(expression.to_string());
        }
        self.started.fetch_add(1, Ordering::SeqCst);

        if let Some(gate) = &self.gate {
            // A closed gate lets everything through
            if let Ok(permit) = gate.permits.acquire().await {
                permit.forget();
            }
        }

        let result = match self.scripted.get(expression) {
            Some(result) => result.clone(),
            None => self.fallback.evaluate(expression).await,
        };

        self.finished.fetch_add(1, Ordering::SeqCst);
        result
    }
}

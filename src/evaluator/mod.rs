//! Arithmetic expression evaluation
//!
//! Expressions are made of single-digit operands, the four binary operators
//! `+ - * /` and parentheses. Each operator application waits for the
//! operator's configured duration before producing its value, modelling
//! operations with different costs.

pub mod operations;
pub mod stack;

pub use operations::{Operation, OperationCatalog, Operator};
pub use stack::StackEvaluator;

use async_trait::async_trait;
use thiserror::Error;

/// Reasons an expression cannot be reduced to a single value
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvaluationError {
    #[error("expression contains no operands")]
    EmptyExpression,

    #[error("unexpected character '{character}' at position {position}")]
    UnexpectedCharacter { character: char, position: usize },

    #[error("unbalanced parentheses")]
    UnbalancedParentheses,

    #[error("operator '{operator}' is missing an operand")]
    MissingOperand { operator: char },

    #[error("{count} operands remain after reduction")]
    LeftoverOperands { count: usize },
}

impl EvaluationError {
    /// Error kind recorded on failed tasks
    pub const KIND: &'static str = "malformed_expression";
}

/// Evaluates expressions on behalf of a worker agent
///
/// Implementations may suspend for a long time; they must only occupy the
/// calling agent's task while doing so.
#[async_trait]
pub trait ExpressionEvaluator: Send + Sync {
    async fn evaluate(&self, expression: &str) -> Result<f64, EvaluationError>;
}

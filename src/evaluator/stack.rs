//! Two-stack operator-precedence evaluator

use super::{EvaluationError, ExpressionEvaluator, OperationCatalog, Operator};
use crate::observability::metrics::metrics;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// Entry on the operator stack
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pending {
    OpenParen,
    Operator(Operator),
}

/// Shunting-yard evaluator with explicit operand and operator stacks
///
/// Every character that is not whitespace, a parenthesis or an operator must
/// be a decimal digit and becomes its own operand, so `12` is two operands
/// and fails to reduce.
#[derive(Debug, Clone)]
pub struct StackEvaluator {
    catalog: Arc<OperationCatalog>,
}

impl StackEvaluator {
    pub fn new(catalog: Arc<OperationCatalog>) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &OperationCatalog {
        &self.catalog
    }

    /// Pop one operator and two operands, wait out the operator's duration
    /// and push the result.
    async fn reduce(
        &self,
        operands: &mut Vec<f64>,
        operators: &mut Vec<Pending>,
    ) -> Result<(), EvaluationError> {
        let operator = match operators.pop() {
            Some(Pending::Operator(operator)) => operator,
            Some(Pending::OpenParen) | None => return Err(EvaluationError::UnbalancedParentheses),
        };

        let missing = EvaluationError::MissingOperand {
            operator: operator.symbol(),
        };
        let b = operands.pop().ok_or_else(|| missing.clone())?;
        let a = operands.pop().ok_or(missing)?;

        let delay = self.catalog.duration_of(operator);
        debug!(
            operator = operator.name(),
            lhs = a,
            rhs = b,
            delay_ms = delay.as_millis() as u64,
            "Applying operator"
        );
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        metrics().operation_applied(operator.name(), delay);

        operands.push(operator.apply(a, b));
        Ok(())
    }
}

#[async_trait]
impl ExpressionEvaluator for StackEvaluator {
    async fn evaluate(&self, expression: &str) -> Result<f64, EvaluationError> {
        let mut operands: Vec<f64> = Vec::new();
        let mut operators: Vec<Pending> = Vec::new();

        for (position, character) in expression.chars().enumerate() {
            if character.is_whitespace() {
                continue;
            }

            match character {
                '(' => operators.push(Pending::OpenParen),
                ')' => loop {
                    match operators.last().copied() {
                        Some(Pending::OpenParen) => {
                            operators.pop();
                            break;
                        }
                        Some(Pending::Operator(_)) => {
                            self.reduce(&mut operands, &mut operators).await?
                        }
                        None => return Err(EvaluationError::UnbalancedParentheses),
                    }
                },
                _ => {
                    if let Some(operator) = Operator::from_symbol(character) {
                        while let Some(Pending::Operator(top)) = operators.last().copied() {
                            if !operator.reduces_before(top) {
                                break;
                            }
                            self.reduce(&mut operands, &mut operators).await?;
                        }
                        operators.push(Pending::Operator(operator));
                    } else if let Some(digit) = character.to_digit(10) {
                        operands.push(f64::from(digit));
                    } else {
                        return Err(EvaluationError::UnexpectedCharacter {
                            character,
                            position,
                        });
                    }
                }
            }
        }

        while let Some(top) = operators.last().copied() {
            match top {
                Pending::OpenParen => return Err(EvaluationError::UnbalancedParentheses),
                Pending::Operator(_) => self.reduce(&mut operands, &mut operators).await?,
            }
        }

        match operands.as_slice() {
            [value] => Ok(*value),
            [] => Err(EvaluationError::EmptyExpression),
            rest => Err(EvaluationError::LeftoverOperands { count: rest.len() }),
        }
    }
}

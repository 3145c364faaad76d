//! Operator catalog with simulated execution durations
//!
//! The catalog is built once at startup and shared read-only between all
//! agents, so it needs no synchronization.

use crate::config::OperationsSection;
use serde::Serialize;
use std::time::Duration;

/// One of the four supported binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Addition,
    Subtraction,
    Multiplication,
    Division,
}

impl Operator {
    /// All operators in catalog order
    pub const ALL: [Operator; 4] = [
        Operator::Addition,
        Operator::Subtraction,
        Operator::Multiplication,
        Operator::Division,
    ];

    pub fn from_symbol(symbol: char) -> Option<Self> {
        match symbol {
            '+' => Some(Operator::Addition),
            '-' => Some(Operator::Subtraction),
            '*' => Some(Operator::Multiplication),
            '/' => Some(Operator::Division),
            _ => None,
        }
    }

    pub fn symbol(self) -> char {
        match self {
            Operator::Addition => '+',
            Operator::Subtraction => '-',
            Operator::Multiplication => '*',
            Operator::Division => '/',
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Operator::Addition => "Addition",
            Operator::Subtraction => "Subtraction",
            Operator::Multiplication => "Multiplication",
            Operator::Division => "Division",
        }
    }

    /// True for `*` and `/`
    pub fn is_multiplicative(self) -> bool {
        matches!(self, Operator::Multiplication | Operator::Division)
    }

    /// Whether a pending `top` operator must be applied before pushing `self`
    ///
    /// Additive operators drain every pending operator; multiplicative ones
    /// only drain other multiplicative operators.
    pub fn reduces_before(self, top: Operator) -> bool {
        !self.is_multiplicative() || top.is_multiplicative()
    }

    /// Division by zero follows IEEE 754 and yields an infinity or NaN.
    pub fn apply(self, a: f64, b: f64) -> f64 {
        match self {
            Operator::Addition => a + b,
            Operator::Subtraction => a - b,
            Operator::Multiplication => a * b,
            Operator::Division => a / b,
        }
    }

    fn index(self) -> usize {
        match self {
            Operator::Addition => 0,
            Operator::Subtraction => 1,
            Operator::Multiplication => 2,
            Operator::Division => 3,
        }
    }
}

/// Catalog entry exposed by `GET /operations`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Operation {
    pub name: String,
    pub symbol: char,
    pub duration: Duration,
}

/// Immutable operator catalog
#[derive(Debug, Clone)]
pub struct OperationCatalog {
    operations: Vec<Operation>,
}

impl OperationCatalog {
    /// Build the catalog from configured millisecond durations
    pub fn new(section: &OperationsSection) -> Self {
        let durations = [
            section.addition_ms,
            section.subtraction_ms,
            section.multiplication_ms,
            section.division_ms,
        ];

        let operations = Operator::ALL
            .iter()
            .zip(durations)
            .map(|(operator, millis)| Operation {
                name: operator.name().to_string(),
                symbol: operator.symbol(),
                duration: Duration::from_millis(millis),
            })
            .collect();

        Self { operations }
    }

    /// Catalog where every operator takes the same time, mostly for tests
    pub fn with_uniform_duration(duration: Duration) -> Self {
        let operations = Operator::ALL
            .iter()
            .map(|operator| Operation {
                name: operator.name().to_string(),
                symbol: operator.symbol(),
                duration,
            })
            .collect();

        Self { operations }
    }

    pub fn duration_of(&self, operator: Operator) -> Duration {
        self.operations[operator.index()].duration
    }

    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }
}

impl Default for OperationCatalog {
    fn default() -> Self {
        Self::new(&OperationsSection::default())
    }
}

//! Metadata describing how accurate and how expensive an oracle is.
//!
//! When oracles are combined into a composite oracle, their metadata is combined as well, with
//! [`OracleMetadata::combine`]. Costs add up, and error bounds add up when they are absolute.

use std::{collections::HashMap, fmt};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A bound on the error of an inexact oracle.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ErrorBound {
    /// The output is within this distance of the true value.
    Absolute(f64),

    /// The output is within this fraction of the magnitude of the true value.
    Relative(f64),

    /// The oracle is inexact, but by an unknown amount.
    Unknown,
}

/// Whether an oracle computes its result exactly.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Exactness {
    #[default]
    Exact,
    Inexact(ErrorBound),
}

/// A model of the cost of calling an oracle, in terms of dimension symbols.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Cost {
    /// A constant cost.
    Constant(f64),

    /// A dimension symbol raised to a power, such as `n^2`.
    Power(String, u32),

    /// The product of several costs.
    Product(Vec<Cost>),

    /// The sum of several costs.
    Sum(Vec<Cost>),
}

impl Cost {
    /// The cost of calling one oracle, then another.
    ///
    /// Nested sums are flattened and constant terms are folded into one.
    pub fn plus(self, other: Cost) -> Cost {
        let mut constant = 0.0;
        let mut terms = Vec::new();
        for cost in [self, other] {
            match cost {
                Cost::Sum(inner) => {
                    for term in inner {
                        match term {
                            Cost::Constant(c) => constant += c,
                            other => terms.push(other),
                        }
                    }
                },
                Cost::Constant(c) => constant += c,
                other => terms.push(other),
            }
        }

        if constant != 0.0 || terms.is_empty() {
            terms.push(Cost::Constant(constant));
        }

        match terms.len() {
            1 => terms.remove(0),
            _ => Cost::Sum(terms),
        }
    }

    /// Evaluates the cost for concrete dimensions. Returns [`None`] if a dimension symbol has no
    /// value.
    pub fn evaluate(&self, dims: &HashMap<String, f64>) -> Option<f64> {
        match self {
            Cost::Constant(c) => Some(*c),
            Cost::Power(symbol, exp) => dims.get(symbol).map(|d| d.powi(*exp as i32)),
            Cost::Product(factors) => factors.iter().map(|c| c.evaluate(dims)).product(),
            Cost::Sum(terms) => terms.iter().map(|c| c.evaluate(dims)).sum(),
        }
    }
}

impl fmt::Display for Cost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let join = |f: &mut fmt::Formatter<'_>, items: &[Cost], sep: &str| -> fmt::Result {
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    write!(f, "{}", sep)?;
                }
                match item {
                    Cost::Sum(_) => write!(f, "({})", item)?,
                    _ => write!(f, "{}", item)?,
                }
            }
            Ok(())
        };

        match self {
            Cost::Constant(c) => write!(f, "{}", c),
            Cost::Power(symbol, 1) => write!(f, "{}", symbol),
            Cost::Power(symbol, exp) => write!(f, "{}^{}", symbol, exp),
            Cost::Product(factors) => join(f, factors, "*"),
            Cost::Sum(terms) => join(f, terms, " + "),
        }
    }
}

/// Metadata attached to an oracle.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct OracleMetadata {
    /// Whether the oracle is exact.
    pub exactness: Exactness,

    /// The cost of calling the oracle, if known.
    pub cost: Option<Cost>,
}

impl OracleMetadata {
    /// Metadata for an inexact oracle with the given error bound.
    pub fn inexact(bound: ErrorBound) -> Self {
        Self { exactness: Exactness::Inexact(bound), cost: None }
    }

    /// Sets the cost of the oracle.
    pub fn with_cost(mut self, cost: Cost) -> Self {
        self.cost = Some(cost);
        self
    }

    /// Combines the metadata of every oracle contributing to a composite oracle.
    ///
    /// The result is exact only if every contributor is exact. Otherwise, absolute error bounds
    /// are summed; mixing a relative or unknown bound with any other inexact contributor makes the
    /// combined bound unknown. The cost is the sum of the costs, and is unknown if any
    /// contributor's cost is unknown.
    pub fn combine<'a>(parts: impl IntoIterator<Item = &'a OracleMetadata>) -> Self {
        let mut exactness = Exactness::Exact;
        let mut cost = Some(Cost::Constant(0.0));

        for part in parts {
            exactness = match (exactness, part.exactness) {
                (Exactness::Exact, other) | (other, Exactness::Exact) => other,
                (
                    Exactness::Inexact(ErrorBound::Absolute(a)),
                    Exactness::Inexact(ErrorBound::Absolute(b)),
                ) => Exactness::Inexact(ErrorBound::Absolute(a + b)),
                _ => Exactness::Inexact(ErrorBound::Unknown),
            };

            cost = match (cost, &part.cost) {
                (Some(total), Some(c)) => Some(total.plus(c.clone())),
                _ => None,
            };
        }

        Self { exactness, cost }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use super::*;

    #[test]
    fn exact_parts_stay_exact() {
        let a = OracleMetadata::default().with_cost(Cost::Constant(1.0));
        let b = OracleMetadata::default().with_cost(Cost::Power("n".into(), 2));
        let combined = OracleMetadata::combine([&a, &b]);
        assert_eq!(combined.exactness, Exactness::Exact);
        assert_eq!(
            combined.cost,
            Some(Cost::Sum(vec![Cost::Power("n".into(), 2), Cost::Constant(1.0)])),
        );
    }

    #[test]
    fn absolute_bounds_add() {
        let a = OracleMetadata::inexact(ErrorBound::Absolute(1e-3));
        let b = OracleMetadata::default();
        let c = OracleMetadata::inexact(ErrorBound::Absolute(2e-3));
        let combined = OracleMetadata::combine([&a, &b, &c]);
        match combined.exactness {
            Exactness::Inexact(ErrorBound::Absolute(bound)) => assert!((bound - 3e-3).abs() < 1e-12),
            other => panic!("unexpected exactness {:?}", other),
        }
    }

    #[test]
    fn relative_bounds_become_unknown() {
        let a = OracleMetadata::inexact(ErrorBound::Relative(0.1));
        let b = OracleMetadata::inexact(ErrorBound::Absolute(1.0));
        assert_eq!(
            OracleMetadata::combine([&a, &b]).exactness,
            Exactness::Inexact(ErrorBound::Unknown),
        );
    }

    #[test]
    fn missing_cost_is_unknown() {
        let a = OracleMetadata::default().with_cost(Cost::Constant(1.0));
        let b = OracleMetadata::default();
        assert_eq!(OracleMetadata::combine([&a, &b]).cost, None);
    }

    #[test]
    fn cost_evaluation() {
        let cost = Cost::Sum(vec![
            Cost::Product(vec![Cost::Constant(2.0), Cost::Power("n".into(), 2)]),
            Cost::Power("m".into(), 1),
        ]);
        let dims = [("n".to_string(), 3.0), ("m".to_string(), 4.0)].into_iter().collect();
        assert_eq!(cost.evaluate(&dims), Some(22.0));
        assert_eq!(cost.to_string(), "2*n^2 + m");
    }
}

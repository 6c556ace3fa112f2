//! Rewriting expressions into equivalent forms.
//!
//! A [`Strategy`] maps an expression to zero or more structurally different, but mathematically
//! equivalent, expressions. Strategies are registered by name in the [`Ctxt`], and
//! [`generate_reformulations`] applies every registered strategy repeatedly, breadth-first, until
//! nothing new is found or an iteration limit is reached.
//!
//! Every expression found is returned as a [`Reformulation`]: the expression together with the
//! properties and oracles the engine can derive for it.
//!
//! ```
//! use optalg_compute::ctxt::Ctxt;
//! use optalg_compute::expr::Expr;
//! use optalg_compute::reformulate::{generate_reformulations, DEFAULT_MAX_ITERATIONS};
//! use optalg_compute::space::Space;
//!
//! let mut ctxt = Ctxt::default();
//! let x = Expr::variable("x", Space::Scalar);
//! let sum = Expr::addition(vec![
//!     Expr::call("f", vec![x.clone()], Space::Scalar),
//!     Expr::call("g", vec![x], Space::Scalar),
//! ]).unwrap();
//!
//! let reformulations = generate_reformulations(&sum, DEFAULT_MAX_ITERATIONS, &mut ctxt).unwrap();
//! assert_eq!(reformulations[0].expr, sum);
//! assert!(reformulations.iter().any(|r| r.expr.to_string() == "g(x) + f(x)"));
//! ```

pub mod check;
pub mod error;
pub mod rules;

use crate::{
    ctxt::Ctxt,
    expr::Expr,
    oracle::{oracle_for_expression, Oracle, OracleKind},
    property::{infer_properties, PropertySet},
    step_collector::StepCollector,
};
use indexmap::{IndexMap, IndexSet};
use log::{debug, info};
use optalg_error::Error;

/// The iteration limit used by callers that have no better value.
pub const DEFAULT_MAX_ITERATIONS: usize = 3;

/// An expression along with everything the engine can derive for it.
///
/// A reformulation is a snapshot: it is computed once, from the registries as they were at the
/// time, and never updated.
#[derive(Debug, Clone)]
pub struct Reformulation {
    /// The expression.
    pub expr: Expr,

    /// The properties inferred for the expression.
    pub properties: PropertySet,

    /// The oracles available for the expression, by kind.
    pub oracles: IndexMap<OracleKind, Oracle>,
}

impl Reformulation {
    /// Annotates an expression with its inferred properties and available oracles.
    pub fn new(expr: Expr, ctxt: &Ctxt) -> Result<Self, Error> {
        let properties = infer_properties(&expr, ctxt)?;
        let oracles = OracleKind::ALL
            .into_iter()
            .filter_map(|kind| oracle_for_expression(&expr, kind, ctxt).map(|oracle| (kind, oracle)))
            .collect();
        Ok(Self { expr, properties, oracles })
    }

    /// Returns the oracle of the given kind, if it is available.
    pub fn oracle(&self, kind: OracleKind) -> Option<&Oracle> {
        self.oracles.get(&kind)
    }
}

/// A named rewrite rule producing equivalent expressions.
///
/// Strategies receive the context mutably, since some of them register new functions (see
/// [`rules::abstraction`]). They must not change the facts or oracles of existing functions.
///
/// Any `Fn(&Expr, &mut Ctxt) -> Result<Vec<Expr>, Error>` is a strategy.
pub trait Strategy: Send + Sync {
    /// Returns expressions equivalent to the given one. The result may contain duplicates and the
    /// input itself.
    fn rewrite(&self, expr: &Expr, ctxt: &mut Ctxt) -> Result<Vec<Expr>, Error>;

    /// Rewrites the expression, then annotates each distinct result, in the order first produced.
    fn reformulate(&self, expr: &Expr, ctxt: &mut Ctxt) -> Result<Vec<Reformulation>, Error> {
        let rewrites = self.rewrite(expr, ctxt)?
            .into_iter()
            .collect::<IndexSet<_>>();
        rewrites.into_iter()
            .map(|rewrite| Reformulation::new(rewrite, ctxt))
            .collect()
    }
}

impl<F> Strategy for F
where
    F: Fn(&Expr, &mut Ctxt) -> Result<Vec<Expr>, Error> + Send + Sync,
{
    fn rewrite(&self, expr: &Expr, ctxt: &mut Ctxt) -> Result<Vec<Expr>, Error> {
        self(expr, ctxt)
    }
}

/// The reason [`generate_reformulations_with_steps`] stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// An iteration found no new expression.
    Saturated,

    /// The iteration limit was hit. The data is the iteration limit.
    IterationLimit(usize),
}

/// A single rewrite found while generating reformulations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    /// The name of the strategy that produced the rewrite.
    pub strategy: String,

    /// The expression the strategy was applied to.
    pub from: Expr,

    /// The new expression.
    pub to: Expr,
}

/// Generates the reformulations of an expression by applying every registered strategy,
/// breadth-first, for at most `max_iterations` iterations.
///
/// The first reformulation is always the input expression. The others follow in the order they
/// were first discovered. The set of distinct expressions returned is deterministic for a given
/// context and iteration limit.
///
/// Rewriting itself never fails for a valid model; an error is only returned if annotating a
/// rewrite finds a [`DimensionMismatch`](crate::property::DimensionMismatch).
pub fn generate_reformulations(
    expr: &Expr,
    max_iterations: usize,
    ctxt: &mut Ctxt,
) -> Result<Vec<Reformulation>, Error> {
    generate_reformulations_with_steps(expr, max_iterations, ctxt, &mut ())
        .map(|(reformulations, _)| reformulations)
}

/// Generates the reformulations of an expression, like [`generate_reformulations`], collecting
/// every rewrite that produced a new expression into `step_collector` and reporting why the
/// search stopped.
pub fn generate_reformulations_with_steps(
    expr: &Expr,
    max_iterations: usize,
    ctxt: &mut Ctxt,
    step_collector: &mut dyn StepCollector<Step>,
) -> Result<(Vec<Reformulation>, StopReason), Error> {
    let strategies = ctxt.strategies();
    let mut known = IndexSet::from([expr.clone()]);
    let mut frontier = vec![expr.clone()];
    let mut stop_reason = StopReason::IterationLimit(max_iterations);

    for iteration in 0..max_iterations {
        let mut next = Vec::new();
        for current in &frontier {
            for (name, strategy) in &strategies {
                let rewrites = strategy.rewrite(current, ctxt)?;
                debug!(
                    "iteration {}: `{}` rewrote `{}` into {} expression(s)",
                    iteration,
                    name,
                    current,
                    rewrites.len(),
                );

                for rewrite in rewrites {
                    if known.insert(rewrite.clone()) {
                        step_collector.push(Step {
                            strategy: name.clone(),
                            from: current.clone(),
                            to: rewrite.clone(),
                        });
                        next.push(rewrite);
                    }
                }
            }
        }

        if next.is_empty() {
            stop_reason = StopReason::Saturated;
            break;
        }
        frontier = next;
    }

    info!("stopped after finding {} expression(s): {:?}", known.len(), stop_reason);

    let reformulations = known.into_iter()
        .map(|expr| Reformulation::new(expr, ctxt))
        .collect::<Result<Vec<_>, _>>()?;
    Ok((reformulations, stop_reason))
}

#[cfg(test)]
mod tests {
    use crate::space::Space;
    use pretty_assertions::assert_eq;
    use super::*;

    fn call(name: &str) -> Expr {
        Expr::call(name, vec![Expr::variable("x", Space::Scalar)], Space::Scalar)
    }

    fn init_logger() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    #[test]
    fn no_strategies_returns_input() {
        init_logger();
        let mut ctxt = Ctxt::new();
        let sum = Expr::addition(vec![call("f"), call("g")]).unwrap();
        let (reformulations, stop_reason) =
            generate_reformulations_with_steps(&sum, 5, &mut ctxt, &mut ()).unwrap();
        assert_eq!(reformulations.len(), 1);
        assert_eq!(reformulations[0].expr, sum);
        assert_eq!(stop_reason, StopReason::Saturated);
    }

    #[test]
    fn zero_iterations() {
        let mut ctxt = Ctxt::default();
        let sum = Expr::addition(vec![call("f"), call("g")]).unwrap();
        let (reformulations, stop_reason) =
            generate_reformulations_with_steps(&sum, 0, &mut ctxt, &mut ()).unwrap();
        assert_eq!(reformulations.len(), 1);
        assert_eq!(stop_reason, StopReason::IterationLimit(0));
    }

    #[test]
    fn steps_record_new_expressions() {
        init_logger();
        let mut ctxt = Ctxt::new();
        ctxt.register_strategy(rules::COMMUTATIVITY, rules::commute::commute);
        let sum = Expr::addition(vec![call("f"), call("g")]).unwrap();

        let mut steps = Vec::new();
        let (reformulations, stop_reason) =
            generate_reformulations_with_steps(&sum, 5, &mut ctxt, &mut steps).unwrap();
        assert_eq!(reformulations.len(), 2);
        assert_eq!(stop_reason, StopReason::Saturated);
        assert_eq!(steps, vec![Step {
            strategy: rules::COMMUTATIVITY.to_string(),
            from: sum,
            to: Expr::addition(vec![call("g"), call("f")]).unwrap(),
        }]);
    }

    #[test]
    fn strategy_results_are_deduplicated() {
        let mut ctxt = Ctxt::new();
        let sum = Expr::addition(vec![call("f"), call("g")]).unwrap();
        let reformulations = rules::commute::commute.reformulate(&sum, &mut ctxt).unwrap();
        let exprs = reformulations.iter().map(|r| r.expr.to_string()).collect::<Vec<_>>();
        assert_eq!(exprs, vec!["f(x) + g(x)", "g(x) + f(x)"]);
    }
}

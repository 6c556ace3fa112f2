//! The built-in reformulation strategies.
//!
//! Each strategy in this module is a function that takes the expression to rewrite and the
//! context, and returns the equivalent expressions it finds. A strategy that does not apply
//! returns an empty list.

pub mod abstraction;
pub mod commute;
pub mod monotone;
pub mod rebalance;

use crate::expr::Expr;
use optalg_error::Error;
use std::sync::Arc;
use super::Strategy;

/// The name of the [commutativity](commute::commute) strategy.
pub const COMMUTATIVITY: &str = "commutativity";

/// The name of the [rebalancing](rebalance::rebalance) strategy.
pub const REBALANCING: &str = "rebalancing";

/// The name of the [structure-loss](abstraction::abstract_subtrees) strategy.
pub const STRUCTURE_LOSS: &str = "structure-loss";

/// The name of the [monotone-transform](monotone::monotone_transform) strategy.
pub const MONOTONE_TRANSFORM: &str = "monotone-transform";

/// Applies a rewrite to the subexpression at every position of the tree, and re-embeds each
/// result into a copy of the whole tree.
///
/// Positions are visited in pre-order, so rewrites of the root come first.
pub(crate) fn at_every_position(
    expr: &Expr,
    f: impl Fn(&Expr) -> Result<Vec<Expr>, Error>,
) -> Result<Vec<Expr>, Error> {
    let mut out = Vec::new();
    for path in expr.positions() {
        let Some(subtree) = expr.get(&path) else {
            continue;
        };
        for rewrite in f(subtree)? {
            out.push(expr.replace_at(&path, rewrite)?);
        }
    }
    Ok(out)
}

/// Returns every built-in strategy, in the order the default context registers them.
pub fn all() -> Vec<(&'static str, Arc<dyn Strategy>)> {
    macro_rules! build {
        ($($name:ident => $strategy:path),* $(,)?) => {
            vec![$(($name, Arc::new($strategy) as Arc<dyn Strategy>)),*]
        };
    }

    build![
        COMMUTATIVITY => commute::commute,
        REBALANCING => rebalance::rebalance,
        STRUCTURE_LOSS => abstraction::abstract_subtrees,
        MONOTONE_TRANSFORM => monotone::monotone_transform,
    ]
}

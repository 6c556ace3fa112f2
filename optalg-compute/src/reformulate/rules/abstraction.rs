//! Collapsing subexpressions into opaque functions.

use crate::{
    ctxt::Ctxt,
    expr::Expr,
    oracle::{oracle_for_expression, OracleKind},
    property::infer_properties,
};
use log::debug;
use optalg_error::Error;

/// Returns a call to the fresh function standing for `subtree`, registering the function the
/// first time the subtree is seen.
///
/// The function is registered with the properties and oracles derived for the subtree, so that
/// later inference sees through it exactly as far as it could see through the subtree.
fn collapse(subtree: &Expr, ctxt: &mut Ctxt) -> Result<Expr, Error> {
    let args = subtree.free_variables();
    let space = subtree.space().clone();
    if let Some(name) = ctxt.abstraction_of(subtree) {
        return Ok(Expr::call(name, args, space));
    }

    // nothing is recorded unless inference succeeds
    let properties = infer_properties(subtree, ctxt)?;
    let oracles = OracleKind::ALL
        .into_iter()
        .filter_map(|kind| oracle_for_expression(subtree, kind, ctxt))
        .collect::<Vec<_>>();

    let name = ctxt.insert_abstraction(subtree);
    debug!(
        "`{}` stands for `{}` ({} properties, {} oracles)",
        name,
        subtree,
        properties.len(),
        oracles.len(),
    );

    ctxt.register_properties(name.clone(), properties);
    for oracle in oracles {
        ctxt.insert_oracle(name.clone(), oracle);
    }

    Ok(Expr::call(name, args, space))
}

/// The structure-loss strategy.
///
/// For every position in the tree holding a non-atomic subexpression, the root included, returns
/// one variant where that subexpression is replaced by a call to a fresh function over its free
/// variables.
///
/// `f(x) + g(y)` -> `_h0(x, y)`
pub fn abstract_subtrees(expr: &Expr, ctxt: &mut Ctxt) -> Result<Vec<Expr>, Error> {
    let mut out = Vec::new();
    for path in expr.positions() {
        let Some(subtree) = expr.get(&path) else {
            continue;
        };
        if subtree.is_atomic() {
            continue;
        }

        let call = collapse(subtree, ctxt)?;
        out.push(expr.replace_at(&path, call)?);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use assert_float_eq::*;
    use crate::{property::Property, space::Space};
    use pretty_assertions::assert_eq;
    use super::*;

    fn var(name: &str) -> Expr {
        Expr::variable(name, Space::Scalar)
    }

    fn call(name: &str, arg: &str) -> Expr {
        Expr::call(name, vec![var(arg)], Space::Scalar)
    }

    #[test]
    fn atomic_expressions_are_kept() {
        let mut ctxt = Ctxt::new();
        assert!(abstract_subtrees(&call("f", "x"), &mut ctxt).unwrap().is_empty());
        assert!(abstract_subtrees(&var("x"), &mut ctxt).unwrap().is_empty());
    }

    #[test]
    fn collapses_root() {
        let mut ctxt = Ctxt::new();
        let sum = Expr::addition(vec![call("f", "y"), call("g", "x")]).unwrap();
        let out = abstract_subtrees(&sum, &mut ctxt).unwrap();
        assert_eq!(out, vec![Expr::call("_h0", vec![var("x"), var("y")], Space::Scalar)]);
    }

    #[test]
    fn collapses_every_position() {
        let mut ctxt = Ctxt::new();
        let inner = Expr::addition(vec![call("g", "x"), call("h", "x")]).unwrap();
        let diff = Expr::subtraction(vec![call("f", "x"), inner]).unwrap();
        let out = abstract_subtrees(&diff, &mut ctxt).unwrap();
        let rendered = out.iter().map(ToString::to_string).collect::<Vec<_>>();
        assert_eq!(rendered, vec!["_h0(x)", "f(x) - _h1(x)"]);
    }

    #[test]
    fn same_subtree_same_name() {
        let mut ctxt = Ctxt::new();
        let sum = Expr::addition(vec![call("f", "x"), call("g", "x")]).unwrap();
        let first = abstract_subtrees(&sum, &mut ctxt).unwrap();
        let second = abstract_subtrees(&sum, &mut ctxt).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn fresh_function_carries_properties_and_oracles() {
        let mut ctxt = Ctxt::new();
        ctxt.register_property("f", Property::Convex);
        ctxt.register_property("g", Property::Convex);
        ctxt.register_scalar_oracle("f", OracleKind::Evaluation, |x| x * x);
        ctxt.register_scalar_oracle("g", OracleKind::Evaluation, |x| 3.0 * x);

        let sum = Expr::addition(vec![call("f", "x"), call("g", "x")]).unwrap();
        abstract_subtrees(&sum, &mut ctxt).unwrap();

        assert!(ctxt.properties_of("_h0").unwrap().contains(&Property::Convex));
        let eval = ctxt.oracle_of("_h0", OracleKind::Evaluation).unwrap();
        assert_f64_near!(eval.call_scalar(2.0).unwrap(), 10.0);
        assert!(ctxt.oracle_of("_h0", OracleKind::Derivative).is_none());
    }

    #[test]
    fn failed_inference_records_nothing() {
        let mut ctxt = Ctxt::new();
        ctxt.register_property("f", Property::Convex);
        ctxt.register_property("A", Property::linear(None, None));
        let bad = Expr::addition(vec![call("f", "x"), call("A", "x")]).unwrap();
        assert!(abstract_subtrees(&bad, &mut ctxt).is_err());
        assert!(ctxt.properties_of("_h0").is_none());

        // once the model is fixed, the subtree gets a fully registered function
        ctxt.clear_properties("A");
        ctxt.register_property("A", Property::Convex);
        let out = abstract_subtrees(&bad, &mut ctxt).unwrap();
        assert_eq!(out, vec![Expr::call("_h0", vec![var("x")], Space::Scalar)]);
        assert!(ctxt.properties_of("_h0").unwrap().contains(&Property::Convex));
    }
}

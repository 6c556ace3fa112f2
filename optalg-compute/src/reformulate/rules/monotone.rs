//! Wrapping convex objectives in increasing functions.

use crate::{
    ctxt::Ctxt,
    expr::Expr,
    funcs::{LOG1P, SQRT},
    property::infer_properties,
};
use log::trace;
use optalg_error::Error;

/// The monotone-transform strategy.
///
/// If the expression is a scalar objective that is provably convex, returns `sqrt(expr)` and
/// `log1p(expr)`. Both functions are increasing, so the transformed objectives have the same
/// minimizers as the original.
pub fn monotone_transform(expr: &Expr, ctxt: &mut Ctxt) -> Result<Vec<Expr>, Error> {
    if !expr.space().is_scalar() {
        return Ok(Vec::new());
    }

    let properties = infer_properties(expr, ctxt)?;
    if !properties.iter().any(|p| p.implies_convex()) {
        trace!("`{}` is not known to be convex", expr);
        return Ok(Vec::new());
    }

    Ok([SQRT, LOG1P]
        .into_iter()
        .map(|name| Expr::call(name, vec![expr.clone()], expr.space().clone()))
        .collect())
}

#[cfg(test)]
mod tests {
    use crate::{
        interval::Interval,
        oracle::OracleKind,
        property::Property,
        space::Space,
    };
    use assert_float_eq::*;
    use pretty_assertions::assert_eq;
    use super::*;

    fn call(name: &str) -> Expr {
        Expr::call(name, vec![Expr::variable("x", Space::Scalar)], Space::Scalar)
    }

    #[test]
    fn convex_objective() {
        let mut ctxt = Ctxt::default();
        ctxt.register_property("f", Property::StronglyConvex(Some(Interval::point(1.0))));
        let out = monotone_transform(&call("f"), &mut ctxt).unwrap();
        let rendered = out.iter().map(ToString::to_string).collect::<Vec<_>>();
        assert_eq!(rendered, vec!["sqrt(f(x))", "log1p(f(x))"]);
    }

    #[test]
    fn unknown_objective() {
        let mut ctxt = Ctxt::default();
        ctxt.register_property("f", Property::Lipschitz(None));
        assert!(monotone_transform(&call("f"), &mut ctxt).unwrap().is_empty());
    }

    #[test]
    fn vector_valued_expression() {
        let mut ctxt = Ctxt::default();
        ctxt.register_property("A", Property::Convex);
        let a = Expr::call("A", vec![Expr::variable("y", Space::vector(3))], Space::vector(3));
        assert!(monotone_transform(&a, &mut ctxt).unwrap().is_empty());
    }

    #[test]
    fn transformed_objective_is_evaluable() {
        let mut ctxt = Ctxt::default();
        ctxt.register_property("f", Property::Convex);
        ctxt.register_scalar_oracle("f", OracleKind::Evaluation, |x| x * x);
        let out = monotone_transform(&call("f"), &mut ctxt).unwrap();

        let sqrt = ctxt.oracle_for(&out[0], OracleKind::Evaluation).unwrap();
        assert_f64_near!(sqrt.call_scalar(3.0).unwrap(), 3.0);
        let log1p = ctxt.oracle_for(&out[1], OracleKind::Evaluation).unwrap();
        assert_float_absolute_eq!(log1p.call_scalar(1.0).unwrap(), 2f64.ln());
    }
}

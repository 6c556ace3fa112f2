//! Reordering the operands of commutative operators.

use crate::{
    ctxt::Ctxt,
    expr::{Expr, NaryOp},
};
use optalg_error::Error;
use super::at_every_position;

/// Returns every expression obtained by swapping two adjacent operands of the given node, if it is
/// a commutative operator.
///
/// `a + b + c` -> `b + a + c`, `a + c + b`
fn adjacent_swaps(expr: &Expr) -> Result<Vec<Expr>, Error> {
    let (Some(op), Some(terms)) = (expr.nary_op(), expr.terms()) else {
        return Ok(Vec::new());
    };
    if !matches!(op, NaryOp::Addition | NaryOp::Maximum | NaryOp::Minimum) {
        return Ok(Vec::new());
    }

    (1..terms.len())
        .map(|i| {
            let mut swapped = terms.to_vec();
            swapped.swap(i - 1, i);
            Expr::nary(op, swapped, expr.space().clone())
        })
        .collect()
}

/// The commutativity strategy.
///
/// Returns the original expression and every adjacent swap of the operands of any sum, maximum or
/// minimum in the tree. Repeated application reaches every permutation. Returns nothing if the
/// tree has no commutative operator with two or more operands.
pub fn commute(expr: &Expr, _: &mut Ctxt) -> Result<Vec<Expr>, Error> {
    let mut out = at_every_position(expr, adjacent_swaps)?;
    if !out.is_empty() {
        out.insert(0, expr.clone());
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use crate::space::Space;
    use pretty_assertions::assert_eq;
    use super::*;

    fn call(name: &str) -> Expr {
        Expr::call(name, vec![Expr::variable("x", Space::Scalar)], Space::Scalar)
    }

    fn render(exprs: Vec<Expr>) -> Vec<String> {
        exprs.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn two_terms() {
        let sum = Expr::addition(vec![call("f"), call("g")]).unwrap();
        let out = commute(&sum, &mut Ctxt::new()).unwrap();
        assert_eq!(render(out), vec!["f(x) + g(x)", "g(x) + f(x)"]);
    }

    #[test]
    fn three_terms() {
        let sum = Expr::addition(vec![call("f"), call("g"), call("h")]).unwrap();
        let out = commute(&sum, &mut Ctxt::new()).unwrap();
        assert_eq!(
            render(out),
            vec!["f(x) + g(x) + h(x)", "g(x) + f(x) + h(x)", "f(x) + h(x) + g(x)"],
        );
    }

    #[test]
    fn nested_terms_are_swapped_in_place() {
        let inner = Expr::maximum(vec![call("g"), call("h")]).unwrap();
        let diff = Expr::subtraction(vec![call("f"), inner]).unwrap();
        let out = commute(&diff, &mut Ctxt::new()).unwrap();
        assert_eq!(
            render(out),
            vec!["f(x) - max(g(x), h(x))", "f(x) - max(h(x), g(x))"],
        );
    }

    #[test]
    fn subtraction_is_not_commutative() {
        let diff = Expr::subtraction(vec![call("f"), call("g")]).unwrap();
        assert!(commute(&diff, &mut Ctxt::new()).unwrap().is_empty());
        assert!(commute(&call("f"), &mut Ctxt::new()).unwrap().is_empty());
    }
}

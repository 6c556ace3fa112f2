//! Regrouping chains of sums, differences and compositions.

use crate::{
    ctxt::Ctxt,
    expr::{Expr, ExprKind, NaryOp},
};
use optalg_error::Error;
use super::at_every_position;

/// Splices the terms of nested sums into `out`.
///
/// `(a + b) + (c + d)` -> `[a, b, c, d]`
fn splice_additions(terms: &[Expr], out: &mut Vec<Expr>) {
    for term in terms {
        match term.kind() {
            ExprKind::Addition(inner) => splice_additions(inner, out),
            _ => out.push(term.clone()),
        }
    }
}

/// Flattens a chain of sums or differences into a single list of terms.
///
/// `(a - b) - c` -> `a - b - c`
/// `a - (b + c)` -> `a - b - c`
///
/// Returns [`None`] if the node is not a sum or difference.
fn flatten(expr: &Expr) -> Option<(NaryOp, Vec<Expr>)> {
    match expr.kind() {
        ExprKind::Addition(terms) => {
            let mut out = Vec::new();
            splice_additions(terms, &mut out);
            Some((NaryOp::Addition, out))
        },
        ExprKind::Subtraction(terms) => {
            let (first, rest) = terms.split_first()?;
            let mut out = match first.kind() {
                ExprKind::Subtraction(_) => flatten(first).map(|(_, terms)| terms)?,
                _ => vec![first.clone()],
            };
            splice_additions(rest, &mut out);
            Some((NaryOp::Subtraction, out))
        },
        _ => None,
    }
}

/// Groups terms under the given operator, leaving a single term on its own.
fn group(op: NaryOp, terms: &[Expr], like: &Expr) -> Result<Expr, Error> {
    match terms {
        [term] => Ok(term.clone()),
        _ => Expr::nary(op, terms.to_vec(), like.space().clone()),
    }
}

/// Returns the flattened form of a chain, followed by every binary split of it.
///
/// `a + b + c` -> `a + b + c`, `a + (b + c)`, `(a + b) + c`
/// `a - b - c` -> `a - b - c`, `a - (b + c)`, `(a - b) - c`
fn regroup_chain(expr: &Expr) -> Result<Vec<Expr>, Error> {
    let Some((op, terms)) = flatten(expr) else {
        return Ok(Vec::new());
    };

    // the terms after a split are subtracted as one group
    let right_op = match op {
        NaryOp::Subtraction => NaryOp::Addition,
        other => other,
    };

    let mut out = vec![Expr::nary(op, terms.clone(), expr.space().clone())?];
    for i in 1..terms.len() {
        let (left, right) = terms.split_at(i);
        let split = vec![group(op, left, expr)?, group(right_op, right, expr)?];
        out.push(Expr::nary(op, split, expr.space().clone())?);
    }
    Ok(out)
}

/// Reassociates a composition in both directions.
///
/// `(f ∘ g) ∘ h` -> `f ∘ (g ∘ h)`
/// `f ∘ (g ∘ h)` -> `(f ∘ g) ∘ h`
fn reassociate(expr: &Expr) -> Vec<Expr> {
    let ExprKind::Composition(outer, inner) = expr.kind() else {
        return Vec::new();
    };

    let mut out = Vec::new();
    if let ExprKind::Composition(f, g) = outer.kind() {
        let right = Expr::composition((**g).clone(), (**inner).clone());
        out.push(Expr::composition((**f).clone(), right));
    }
    if let ExprKind::Composition(g, h) = inner.kind() {
        let left = Expr::composition((**outer).clone(), (**g).clone());
        out.push(Expr::composition(left, (**h).clone()));
    }
    out
}

/// Regroupings of a single node.
fn regroupings(expr: &Expr) -> Result<Vec<Expr>, Error> {
    match expr.kind() {
        ExprKind::Composition(..) => Ok(reassociate(expr)),
        _ => regroup_chain(expr),
    }
}

/// The rebalancing strategy.
///
/// For every chain of sums or differences in the tree, returns the fully flattened chain and
/// every binary split of it. For every composition, returns both associativity directions.
pub fn rebalance(expr: &Expr, _: &mut Ctxt) -> Result<Vec<Expr>, Error> {
    at_every_position(expr, regroupings)
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
    fn splits_flat_sum() {
        let sum = Expr::addition(vec![call("f"), call("g"), call("h")]).unwrap();
        let out = rebalance(&sum, &mut Ctxt::new()).unwrap();
        assert_eq!(
            render(out),
            vec!["f(x) + g(x) + h(x)", "f(x) + (g(x) + h(x))", "(f(x) + g(x)) + h(x)"],
        );
    }

    #[test]
    fn flattens_nested_sum() {
        let nested = Expr::addition(vec![
            Expr::addition(vec![call("f"), call("g")]).unwrap(),
            call("h"),
        ]).unwrap();
        let out = rebalance(&nested, &mut Ctxt::new()).unwrap();
        assert_eq!(out[0].to_string(), "f(x) + g(x) + h(x)");
        assert!(out.contains(&nested));
    }

    #[test]
    fn subtraction_groups_subtracted_terms() {
        let diff = Expr::subtraction(vec![
            Expr::subtraction(vec![call("f"), call("g")]).unwrap(),
            call("h"),
        ]).unwrap();
        let out = rebalance(&diff, &mut Ctxt::new()).unwrap();
        assert_eq!(
            render(out)[..3],
            ["f(x) - g(x) - h(x)", "f(x) - (g(x) + h(x))", "(f(x) - g(x)) - h(x)"],
        );
    }

    #[test]
    fn difference_of_difference_is_kept() {
        // f - (g - h) = f - g + h, which is not a pure chain of differences
        let diff = Expr::subtraction(vec![
            call("f"),
            Expr::subtraction(vec![call("g"), call("h")]).unwrap(),
        ]).unwrap();
        let out = rebalance(&diff, &mut Ctxt::new()).unwrap();
        assert!(out.iter().all(|e| e == &diff));
    }

    #[test]
    fn reassociates_compositions() {
        let f = Expr::function("f", Space::Scalar);
        let g = Expr::function("g", Space::Scalar);
        let h = Expr::function("h", Space::Scalar);
        let left = Expr::composition(Expr::composition(f.clone(), g.clone()), h.clone());
        let right = Expr::composition(f, Expr::composition(g, h));

        let out = rebalance(&left, &mut Ctxt::new()).unwrap();
        assert_eq!(out[0], right);
        let out = rebalance(&right, &mut Ctxt::new()).unwrap();
        assert_eq!(out[0], left);
    }
}

use crate::{
    ctxt::Ctxt,
    expr::{Callee, Expr, ExprKind},
};
use log::trace;
use std::sync::Arc;
use super::{CallError, Oracle, OracleKind, OracleMetadata, Value};

/// Builds an oracle of the given kind for a whole expression, by combining the oracles registered
/// on its leaf functions.
///
/// Returns [`None`] if the oracle is not available, which is an ordinary outcome. A handler in the
/// special-combination registry that matches the expression takes precedence over every generic
/// rule.
///
/// | Expression        | Evaluation                 | Derivative                          | Proximal |
/// | ----------------- | -------------------------- | ----------------------------------- | -------- |
/// | `f(x)`            | registered                 | registered                          | registered |
/// | `f(g(x))`, `f ∘ g` | `f(g(x))`                  | `f'(g(x)) · g'(x)`                  | -        |
/// | `t1 + ... + tn`   | sum                        | sum                                 | -        |
/// | `t1 - ... - tn`   | difference                 | difference                          | -        |
/// | `max`, `min`      | pointwise                  | -                                   | -        |
///
/// ```
/// use optalg_compute::ctxt::Ctxt;
/// use optalg_compute::expr::Expr;
/// use optalg_compute::oracle::{oracle_for_expression, OracleKind};
/// use optalg_compute::space::Space;
///
/// let mut ctxt = Ctxt::new();
/// ctxt.register_scalar_oracle("f", OracleKind::Evaluation, |x| x * x);
/// ctxt.register_scalar_oracle("g", OracleKind::Evaluation, f64::sin);
///
/// let x = Expr::variable("x", Space::Scalar);
/// let sum = Expr::addition(vec![
///     Expr::call("f", vec![x.clone()], Space::Scalar),
///     Expr::call("g", vec![x], Space::Scalar),
/// ]).unwrap();
///
/// let oracle = oracle_for_expression(&sum, OracleKind::Evaluation, &ctxt).unwrap();
/// assert!((oracle.call_scalar(2.0).unwrap() - (4.0 + 2f64.sin())).abs() < 1e-12);
/// ```
pub fn oracle_for_expression(expr: &Expr, kind: OracleKind, ctxt: &Ctxt) -> Option<Oracle> {
    if let Some(handler) = ctxt.special_combination(expr.op(), &expr.leaf_functions(), kind) {
        trace!("using special {} oracle for `{}`", kind, expr);
        return Some(handler(expr));
    }

    let oracle = match expr.kind() {
        ExprKind::Literal(_) | ExprKind::Variable(_) => None,
        ExprKind::Call(Callee::Named(name), args) => match args.as_slice() {
            // implicit composition, `f(g(x))`
            [arg] if !arg.is_leaf() => {
                chain(|kind| ctxt.oracle_of(name, kind).cloned(), arg, kind, ctxt)
            },
            _ if args.iter().all(Expr::is_leaf) => ctxt.oracle_of(name, kind).cloned(),
            _ => None,
        },
        ExprKind::Call(Callee::Expr(callee), args) => match args.as_slice() {
            [arg] if !arg.is_leaf() => {
                chain(|kind| oracle_for_expression(callee, kind, ctxt), arg, kind, ctxt)
            },
            _ if args.iter().all(Expr::is_leaf) => oracle_for_expression(callee, kind, ctxt),
            _ => None,
        },
        ExprKind::Composition(outer, inner) => {
            chain(|kind| oracle_for_expression(outer, kind, ctxt), inner, kind, ctxt)
        },
        ExprKind::Addition(terms) => additive(terms, kind, ctxt, Value::add),
        ExprKind::Subtraction(terms) => additive(terms, kind, ctxt, Value::sub),
        ExprKind::Maximum(terms) => pointwise(terms, kind, ctxt, Value::max),
        ExprKind::Minimum(terms) => pointwise(terms, kind, ctxt, Value::min),
    };

    if oracle.is_none() {
        trace!("no {} oracle available for `{}`", kind, expr);
    }
    oracle
}

/// Combines the values of several callables into one callable, folding from left to right.
fn fold(
    kind: OracleKind,
    oracles: Vec<Oracle>,
    combine: fn(&Value, &Value) -> Result<Value, CallError>,
) -> Oracle {
    let metadata = OracleMetadata::combine(oracles.iter().map(Oracle::metadata));
    let callables = oracles.into_iter().map(|oracle| oracle.func).collect::<Vec<_>>();
    let func = move |args: &[Value]| -> Result<Value, CallError> {
        let mut values = callables.iter().map(|f| f(args));
        let mut acc = match values.next() {
            Some(value) => value?,
            None => return Ok(Value::Scalar(0.0)),
        };
        for value in values {
            acc = combine(&acc, &value?)?;
        }
        Ok(acc)
    };
    Oracle::from_callable(kind, Arc::new(func), metadata)
}

/// Collects the oracles of every term, or returns [`None`] if any is unavailable.
fn term_oracles(terms: &[Expr], kind: OracleKind, ctxt: &Ctxt) -> Option<Vec<Oracle>> {
    terms.iter()
        .map(|term| oracle_for_expression(term, kind, ctxt))
        .collect()
}

/// The sum rule, for sums and differences. Evaluation and differentiation are both additive, so
/// the per-term results are combined with the same operator as the expression.
fn additive(
    terms: &[Expr],
    kind: OracleKind,
    ctxt: &Ctxt,
    combine: fn(&Value, &Value) -> Result<Value, CallError>,
) -> Option<Oracle> {
    match kind {
        OracleKind::Evaluation | OracleKind::Derivative => {
            Some(fold(kind, term_oracles(terms, kind, ctxt)?, combine))
        },
        OracleKind::Proximal => None,
    }
}

/// The pointwise maximum or minimum, which is only available for evaluation.
fn pointwise(
    terms: &[Expr],
    kind: OracleKind,
    ctxt: &Ctxt,
    combine: fn(&Value, &Value) -> Result<Value, CallError>,
) -> Option<Oracle> {
    match kind {
        OracleKind::Evaluation => Some(fold(kind, term_oracles(terms, kind, ctxt)?, combine)),
        OracleKind::Derivative | OracleKind::Proximal => None,
    }
}

/// Composes the oracles of an outer function with the oracles of an inner expression.
///
/// `outer` returns the outer function's oracle of the requested kind. For derivatives, the chain
/// rule `f'(g(x)) · g'(x)` is applied element-wise, and additionally requires the evaluation
/// oracle of the inner expression.
fn chain(
    outer: impl Fn(OracleKind) -> Option<Oracle>,
    inner: &Expr,
    kind: OracleKind,
    ctxt: &Ctxt,
) -> Option<Oracle> {
    match kind {
        OracleKind::Evaluation => {
            let f = outer(OracleKind::Evaluation)?;
            let g = oracle_for_expression(inner, OracleKind::Evaluation, ctxt)?;
            let metadata = OracleMetadata::combine([f.metadata(), g.metadata()]);
            let (f, g) = (f.func, g.func);
            let func = move |args: &[Value]| -> Result<Value, CallError> {
                let inner = g(args)?;
                f(&[inner])
            };
            Some(Oracle::from_callable(kind, Arc::new(func), metadata))
        },
        OracleKind::Derivative => {
            let df = outer(OracleKind::Derivative)?;
            let g = oracle_for_expression(inner, OracleKind::Evaluation, ctxt)?;
            let dg = oracle_for_expression(inner, OracleKind::Derivative, ctxt)?;
            let metadata = OracleMetadata::combine([df.metadata(), g.metadata(), dg.metadata()]);
            let (df, g, dg) = (df.func, g.func, dg.func);
            let func = move |args: &[Value]| -> Result<Value, CallError> {
                let inner = g(args)?;
                df(&[inner])?.mul(&dg(args)?)
            };
            Some(Oracle::from_callable(kind, Arc::new(func), metadata))
        },
        OracleKind::Proximal => None,
    }
}

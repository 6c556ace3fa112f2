use crate::{
    ctxt::Ctxt,
    expr::{covering_span, render_operands, Callee, Expr, ExprKind, Op},
};
use log::trace;
use optalg_error::Error;
use super::{add, comp, sub, Combined, DimensionMismatch, PairTable, Property, PropertySet};

/// Infers the set of properties the given expression provably has, from the facts registered on
/// its leaf functions.
///
/// An empty set means nothing could be proven, which is an ordinary outcome. An error is only
/// returned if the expression combines a linear operator with a scalar-valued function, in which
/// case the error kind is [`DimensionMismatch`].
///
/// ```
/// use optalg_compute::ctxt::Ctxt;
/// use optalg_compute::expr::Expr;
/// use optalg_compute::interval::Interval;
/// use optalg_compute::property::{infer_properties, Property};
/// use optalg_compute::space::Space;
///
/// let mut ctxt = Ctxt::new();
/// ctxt.register_property("f", Property::Convex);
/// ctxt.register_property("g", Property::StronglyConvex(Some(Interval::point(2.0))));
///
/// let x = Expr::variable("x", Space::Scalar);
/// let sum = Expr::addition(vec![
///     Expr::call("f", vec![x.clone()], Space::Scalar),
///     Expr::call("g", vec![x], Space::Scalar),
/// ]).unwrap();
///
/// let properties = infer_properties(&sum, &ctxt).unwrap();
/// assert!(properties.contains(&Property::StronglyConvex(Some(Interval::point(2.0)))));
/// ```
pub fn infer_properties(expr: &Expr, ctxt: &Ctxt) -> Result<PropertySet, Error> {
    let properties = match expr.kind() {
        ExprKind::Literal(_) | ExprKind::Variable(_) => PropertySet::new(),
        ExprKind::Call(Callee::Named(name), args) => {
            let facts = ctxt.properties_of(name).cloned().unwrap_or_default();
            match args.as_slice() {
                // implicit composition, `f(g(x))`
                [arg] if !arg.is_leaf() => compose(&facts, &infer_properties(arg, ctxt)?),
                _ if args.iter().all(Expr::is_leaf) => facts,
                _ => {
                    trace!("`{}` is called with more than one built argument", name);
                    PropertySet::new()
                },
            }
        },
        ExprKind::Call(Callee::Expr(callee), args) => match args.as_slice() {
            [arg] if !arg.is_leaf() => {
                compose(&infer_properties(callee, ctxt)?, &infer_properties(arg, ctxt)?)
            },
            _ if args.iter().all(Expr::is_leaf) => infer_properties(callee, ctxt)?,
            _ => PropertySet::new(),
        },
        ExprKind::Addition(terms) => fold(Op::Addition, terms, ctxt)?,
        ExprKind::Subtraction(terms) => fold(Op::Subtraction, terms, ctxt)?,
        ExprKind::Composition(outer, inner) => {
            compose(&infer_properties(outer, ctxt)?, &infer_properties(inner, ctxt)?)
        },
        ExprKind::Maximum(_) | ExprKind::Minimum(_) => {
            trace!("no combination rules for {}, nothing inferred for `{}`", expr.op(), expr);
            PropertySet::new()
        },
    };

    trace!("inferred {} properties for `{}`", properties.len(), expr);
    Ok(properties)
}

/// Folds the properties of the terms of a sum or difference from left to right.
fn fold(op: Op, terms: &[Expr], ctxt: &Ctxt) -> Result<PropertySet, Error> {
    let sets = terms.iter()
        .map(|term| infer_properties(term, ctxt))
        .collect::<Result<Vec<_>, _>>()?;

    if let Some(idx) = sets.iter().position(PropertySet::is_empty) {
        trace!("term `{}` has no known properties", terms[idx]);
        return Ok(PropertySet::new());
    }

    let table: &PairTable = match op {
        Op::Subtraction => &sub::TABLE,
        _ => &add::TABLE,
    };

    let Some((first, rest)) = sets.split_first() else {
        return Ok(PropertySet::new());
    };
    let mut running = first.clone();
    for (offset, set) in rest.iter().enumerate() {
        let mut next = PropertySet::new();
        for left in &running {
            for right in set {
                match table.combine(left, right) {
                    Combined::Derived(derived) => {
                        next.insert(derived);
                    },
                    Combined::Incompatible => (),
                    Combined::DimensionMismatch => {
                        return Err(dimension_mismatch(op, terms, offset + 1, *left, *right));
                    },
                }
            }
        }

        if next.is_empty() {
            trace!("no property survives the first {} terms", offset + 2);
            return Ok(next);
        }
        running = next;
    }

    Ok(running)
}

/// Combines the properties of an outer and inner function.
fn compose(outer: &PropertySet, inner: &PropertySet) -> PropertySet {
    if outer.is_empty() || inner.is_empty() {
        return PropertySet::new();
    }

    let mut out = comp::combine_sets(outer, inner);
    for p in outer {
        for q in inner {
            if let Combined::Derived(derived) = comp::combine(p, q) {
                out.insert(derived);
            }
        }
    }
    out
}

/// Builds the error for a dimension mismatch found when combining the term at `idx` with the
/// terms before it.
fn dimension_mismatch(op: Op, terms: &[Expr], idx: usize, left: Property, right: Property) -> Error {
    let (source, spans) = render_operands(op, terms);
    Error::new(
        source,
        vec![covering_span(&spans[..idx]), spans[idx].clone()],
        DimensionMismatch { op, left, right },
    )
}

#[cfg(test)]
mod tests {
    use crate::{interval::Interval, space::Space};
    use pretty_assertions::assert_eq;
    use super::*;

    fn x() -> Expr {
        Expr::variable("x", Space::Scalar)
    }

    fn call(name: &str) -> Expr {
        Expr::call(name, vec![x()], Space::Scalar)
    }

    fn point(v: f64) -> Option<Interval> {
        Some(Interval::point(v))
    }

    fn set(properties: impl IntoIterator<Item = Property>) -> PropertySet {
        properties.into_iter().collect()
    }

    #[test]
    fn leaves_have_no_properties() {
        let ctxt = Ctxt::new();
        assert!(infer_properties(&x(), &ctxt).unwrap().is_empty());
        assert!(infer_properties(&Expr::literal(1.0), &ctxt).unwrap().is_empty());
    }

    #[test]
    fn registered_facts() {
        let mut ctxt = Ctxt::new();
        ctxt.register_property("f", Property::Convex);
        ctxt.register_property("f", Property::Smooth(point(1.0)));
        assert_eq!(
            infer_properties(&call("f"), &ctxt).unwrap(),
            set([Property::Convex, Property::Smooth(point(1.0))]),
        );
        assert!(infer_properties(&call("unknown"), &ctxt).unwrap().is_empty());
    }

    #[test]
    fn opaque_term_empties_sum() {
        let mut ctxt = Ctxt::new();
        ctxt.register_property("f", Property::Convex);
        let sum = Expr::addition(vec![call("f"), call("g")]).unwrap();
        assert!(infer_properties(&sum, &ctxt).unwrap().is_empty());
    }

    #[test]
    fn sum_folds_pairwise() {
        let mut ctxt = Ctxt::new();
        ctxt.register_property("f", Property::Convex);
        ctxt.register_property("g", Property::StronglyConvex(point(1.0)));
        ctxt.register_property("h", Property::StronglyConvex(point(2.0)));
        let sum = Expr::addition(vec![call("f"), call("g"), call("h")]).unwrap();
        assert_eq!(
            infer_properties(&sum, &ctxt).unwrap(),
            set([Property::StronglyConvex(point(3.0))]),
        );
    }

    #[test]
    fn incompatible_pairs_empty_the_fold() {
        let mut ctxt = Ctxt::new();
        ctxt.register_property("f", Property::Lipschitz(None));
        ctxt.register_property("g", Property::Convex);
        let sum = Expr::addition(vec![call("f"), call("g")]).unwrap();
        assert!(infer_properties(&sum, &ctxt).unwrap().is_empty());
    }

    #[test]
    fn subtraction_uses_its_own_table() {
        let mut ctxt = Ctxt::new();
        ctxt.register_property("f", Property::StronglyConvex(point(3.0)));
        ctxt.register_property("g", Property::Smooth(point(1.0)));
        let diff = Expr::subtraction(vec![call("f"), call("g")]).unwrap();
        assert_eq!(
            infer_properties(&diff, &ctxt).unwrap(),
            set([Property::StronglyConvex(point(2.0))]),
        );
    }

    #[test]
    fn linear_plus_convex_is_dimension_mismatch() {
        let mut ctxt = Ctxt::new();
        ctxt.register_property("f", Property::Convex);
        ctxt.register_property("A", Property::linear(point(1.0), point(2.0)));
        let sum = Expr::addition(vec![call("f"), call("A")]).unwrap();
        let err = infer_properties(&sum, &ctxt).unwrap_err();
        let kind = err.downcast_ref::<DimensionMismatch>().unwrap();
        assert_eq!(kind.op, Op::Addition);
        assert_eq!(kind.left, Property::Convex);
        assert_eq!(err.spans, vec![0..4, 7..11]);
    }

    #[test]
    fn explicit_composition() {
        let mut ctxt = Ctxt::new();
        ctxt.register_property("f", Property::StronglyConvex(point(1.0)));
        ctxt.register_property("A", Property::linear(point(2.0), point(3.0)));
        let composed = Expr::composition(
            Expr::function("f", Space::Scalar),
            Expr::function("A", Space::Scalar),
        );
        assert_eq!(
            infer_properties(&composed, &ctxt).unwrap(),
            set([Property::StronglyConvex(point(5.0))]),
        );
    }

    #[test]
    fn implicit_composition_uses_set_rules() {
        let mut ctxt = Ctxt::new();
        ctxt.register_properties("f", [Property::MonotonicallyIncreasing, Property::Convex]);
        ctxt.register_property("g", Property::Convex);
        let nested = Expr::call("f", vec![call("g")], Space::Scalar);
        assert_eq!(infer_properties(&nested, &ctxt).unwrap(), set([Property::Convex]));
    }

    #[test]
    fn composition_with_opaque_side_is_empty() {
        let mut ctxt = Ctxt::new();
        ctxt.register_property("f", Property::Convex);
        let nested = Expr::call("f", vec![call("g")], Space::Scalar);
        assert!(infer_properties(&nested, &ctxt).unwrap().is_empty());
    }

    #[test]
    fn maximum_is_unknown() {
        let mut ctxt = Ctxt::new();
        ctxt.register_property("f", Property::Convex);
        ctxt.register_property("g", Property::Convex);
        let max = Expr::maximum(vec![call("f"), call("g")]).unwrap();
        assert!(infer_properties(&max, &ctxt).unwrap().is_empty());
    }
}

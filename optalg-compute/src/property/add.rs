//! Combination rules for the properties of a sum `f + g`.
//!
//! Each rule receives the property of `f` first and of `g` second.

use crate::interval::Interval;
use once_cell::sync::Lazy;
use super::{
    both,
    curvature,
    pair_table,
    quadratic_smoothness,
    Combined::{self, Derived},
    PairTable,
    Property,
};

/// `convex + convex = convex`
fn convex(_: &Property, _: &Property) -> Combined {
    Derived(Property::Convex)
}

/// `convex + μ-strongly convex = μ-strongly convex`
fn convex_strongly_convex(_: &Property, q: &Property) -> Combined {
    Derived(Property::StronglyConvex(q.bound()))
}

/// `μ1-strongly convex + μ2-strongly convex = (μ1 + μ2)-strongly convex`
fn strongly_convex(p: &Property, q: &Property) -> Combined {
    Derived(Property::StronglyConvex(both(p.bound(), q.bound(), |a, b| a + b)))
}

/// `convex + ρ-hypoconvex = ρ-hypoconvex`
fn convex_hypo_convex(_: &Property, q: &Property) -> Combined {
    Derived(Property::HypoConvex(q.bound()))
}

/// `ρ1-hypoconvex + ρ2-hypoconvex = (ρ1 + ρ2)-hypoconvex`
fn hypo_convex(p: &Property, q: &Property) -> Combined {
    Derived(Property::HypoConvex(both(p.bound(), q.bound(), |a, b| a + b)))
}

/// `μ-strongly convex + ρ-hypoconvex` has curvature at least `μ - ρ`.
fn strongly_convex_hypo_convex(p: &Property, q: &Property) -> Combined {
    Derived(curvature(both(p.curvature(), q.curvature(), |a, b| a + b)))
}

/// `L-smooth + convex = L-hypoconvex`
fn smooth_convex(p: &Property, _: &Property) -> Combined {
    Derived(Property::HypoConvex(p.bound()))
}

/// `L1-smooth + L2-smooth = (L1 + L2)-smooth`
fn smooth(p: &Property, q: &Property) -> Combined {
    Derived(Property::Smooth(both(p.bound(), q.bound(), |a, b| a + b)))
}

/// `L-smooth + μ-strongly convex` has curvature at least `μ - L`.
fn smooth_strongly_convex(p: &Property, q: &Property) -> Combined {
    Derived(curvature(both(q.bound(), p.bound(), |mu, l| mu - l)))
}

/// `L-smooth + ρ-hypoconvex = (L + ρ)-hypoconvex`
fn smooth_hypo_convex(p: &Property, q: &Property) -> Combined {
    Derived(Property::HypoConvex(both(p.bound(), q.bound(), |a, b| a + b)))
}

/// `M1-lipschitz + M2-lipschitz = (M1 + M2)-lipschitz`
fn lipschitz(p: &Property, q: &Property) -> Combined {
    Derived(Property::Lipschitz(both(p.bound(), q.bound(), |a, b| a + b)))
}

/// `increasing + increasing = increasing`
fn monotone(_: &Property, _: &Property) -> Combined {
    Derived(Property::MonotonicallyIncreasing)
}

/// Eigenvalue bounds of a sum of symmetric matrices: `λmin(A + B) >= λmin(A) + λmin(B)` and
/// `λmax(A + B) <= λmax(A) + λmax(B)`.
fn eigenvalue_sum(p: &Property, q: &Property) -> (Option<Interval>, Option<Interval>) {
    let (p_min, p_max) = p.eigenvalues();
    let (q_min, q_max) = q.eigenvalues();
    (both(p_min, q_min, |a, b| a + b), both(p_max, q_max, |a, b| a + b))
}

/// `A + B` for linear operators
fn linear(p: &Property, q: &Property) -> Combined {
    let (lambda_min, lambda_max) = eigenvalue_sum(p, q);
    Derived(Property::linear(lambda_min, lambda_max))
}

/// `xᵀAx + xᵀBx = xᵀ(A + B)x`
fn quadratic(p: &Property, q: &Property) -> Combined {
    let (lambda_min, lambda_max) = eigenvalue_sum(p, q);
    Derived(Property::quadratic(lambda_min, lambda_max))
}

/// `convex / strongly convex / hypoconvex + quadratic` adds the quadratic's smallest eigenvalue
/// to the curvature.
fn curved_quadratic(p: &Property, q: &Property) -> Combined {
    Derived(curvature(both(p.curvature(), q.curvature(), |a, b| a + b)))
}

/// `quadratic + L-smooth = (max(|λmin|, |λmax|) + L)-smooth`
fn quadratic_smooth(p: &Property, q: &Property) -> Combined {
    Derived(Property::Smooth(both(quadratic_smoothness(p), q.bound(), |a, b| a + b)))
}

/// The combination table for addition.
pub static TABLE: Lazy<PairTable> = Lazy::new(|| pair_table! {
    checks_dimensions: true;
    one(Convex, Convex) => convex,
    sym(Convex, StronglyConvex) => convex_strongly_convex,
    one(StronglyConvex, StronglyConvex) => strongly_convex,
    sym(Convex, HypoConvex) => convex_hypo_convex,
    one(HypoConvex, HypoConvex) => hypo_convex,
    sym(StronglyConvex, HypoConvex) => strongly_convex_hypo_convex,
    sym(Smooth, Convex) => smooth_convex,
    one(Smooth, Smooth) => smooth,
    sym(Smooth, StronglyConvex) => smooth_strongly_convex,
    sym(Smooth, HypoConvex) => smooth_hypo_convex,
    one(Lipschitz, Lipschitz) => lipschitz,
    one(MonotonicallyIncreasing, MonotonicallyIncreasing) => monotone,
    one(Linear, Linear) => linear,
    one(Quadratic, Quadratic) => quadratic,
    sym(Convex, Quadratic) => curved_quadratic,
    sym(StronglyConvex, Quadratic) => curved_quadratic,
    sym(HypoConvex, Quadratic) => curved_quadratic,
    sym(Quadratic, Smooth) => quadratic_smooth,
});

/// Combines the properties of two terms of a sum.
pub fn combine(left: &Property, right: &Property) -> Combined {
    TABLE.combine(left, right)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use super::*;

    fn point(x: f64) -> Option<Interval> {
        Some(Interval::point(x))
    }

    #[test]
    fn convex_plus_strongly_convex() {
        let sc = Property::StronglyConvex(point(2.0));
        assert_eq!(combine(&Property::Convex, &sc), Derived(sc));
        assert_eq!(combine(&sc, &Property::Convex), Derived(sc));
    }

    #[test]
    fn strongly_convex_moduli_add() {
        let a = Property::StronglyConvex(Some(Interval::new(1.0, 2.0)));
        let b = Property::StronglyConvex(point(0.5));
        assert_eq!(combine(&a, &b), Derived(Property::StronglyConvex(Some(Interval::new(1.5, 2.5)))));
    }

    #[test]
    fn smooth_plus_convex_is_hypo_convex() {
        let s = Property::Smooth(point(3.0));
        assert_eq!(combine(&s, &Property::Convex), Derived(Property::HypoConvex(point(3.0))));
        assert_eq!(combine(&Property::Convex, &s), Derived(Property::HypoConvex(point(3.0))));
    }

    #[test]
    fn strongly_convex_plus_hypo_convex() {
        let sc = Property::StronglyConvex(point(2.0));
        assert_eq!(
            combine(&sc, &Property::HypoConvex(point(0.5))),
            Derived(Property::StronglyConvex(point(1.5))),
        );
        assert_eq!(combine(&sc, &Property::HypoConvex(point(2.0))), Derived(Property::Convex));
        assert_eq!(
            combine(&Property::HypoConvex(point(5.0)), &sc),
            Derived(Property::HypoConvex(point(3.0))),
        );
    }

    #[test]
    fn smooth_plus_strongly_convex() {
        assert_eq!(
            combine(&Property::Smooth(point(1.0)), &Property::StronglyConvex(point(4.0))),
            Derived(Property::StronglyConvex(point(3.0))),
        );
    }

    #[test]
    fn unknown_bounds_propagate() {
        assert_eq!(
            combine(&Property::StronglyConvex(None), &Property::StronglyConvex(point(1.0))),
            Derived(Property::StronglyConvex(None)),
        );
    }

    #[test]
    fn quadratic_plus_convex() {
        let q = Property::quadratic(point(2.0), point(5.0));
        assert_eq!(combine(&q, &Property::Convex), Derived(Property::StronglyConvex(point(2.0))));
        assert_eq!(
            combine(&Property::Smooth(point(1.0)), &q),
            Derived(Property::Smooth(point(6.0))),
        );
    }

    #[test]
    fn unrelated_pairs_are_incompatible() {
        assert_eq!(
            combine(&Property::Lipschitz(None), &Property::Convex),
            Combined::Incompatible,
        );
        assert_eq!(
            combine(&Property::MonotonicallyIncreasing, &Property::Smooth(None)),
            Combined::Incompatible,
        );
    }

    #[test]
    fn operator_with_function_is_dimension_mismatch() {
        let lin = Property::linear(point(1.0), point(2.0));
        assert_eq!(combine(&lin, &Property::Convex), Combined::DimensionMismatch);
        assert_eq!(combine(&Property::Smooth(None), &lin), Combined::DimensionMismatch);
        assert_eq!(
            combine(&lin, &lin),
            Derived(Property::linear(point(2.0), point(4.0))),
        );
    }
}

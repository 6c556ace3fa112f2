//! Combination rules for the properties of a difference `f - g`.
//!
//! Each rule receives the property of `f` first and of the subtracted `g` second. The negation of
//! a function is rarely convex, so this table is much sparser than the one for addition.

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

/// `convex - L-smooth = L-hypoconvex`
fn convex_smooth(_: &Property, q: &Property) -> Combined {
    Derived(Property::HypoConvex(q.bound()))
}

/// `μ-strongly convex - L-smooth` has curvature at least `μ - L`.
fn strongly_convex_smooth(p: &Property, q: &Property) -> Combined {
    Derived(curvature(both(p.bound(), q.bound(), |mu, l| mu - l)))
}

/// `ρ-hypoconvex - L-smooth = (ρ + L)-hypoconvex`
fn hypo_convex_smooth(p: &Property, q: &Property) -> Combined {
    Derived(Property::HypoConvex(both(p.bound(), q.bound(), |a, b| a + b)))
}

/// `L1-smooth - L2-smooth = (L1 + L2)-smooth`
fn smooth(p: &Property, q: &Property) -> Combined {
    Derived(Property::Smooth(both(p.bound(), q.bound(), |a, b| a + b)))
}

/// `M1-lipschitz - M2-lipschitz = (M1 + M2)-lipschitz`
fn lipschitz(p: &Property, q: &Property) -> Combined {
    Derived(Property::Lipschitz(both(p.bound(), q.bound(), |a, b| a + b)))
}

/// Eigenvalue bounds of a difference of symmetric matrices: `λmin(A - B) >= λmin(A) - λmax(B)`
/// and `λmax(A - B) <= λmax(A) - λmin(B)`.
fn eigenvalue_difference(p: &Property, q: &Property) -> (Option<Interval>, Option<Interval>) {
    let (p_min, p_max) = p.eigenvalues();
    let (q_min, q_max) = q.eigenvalues();
    (both(p_min, q_max, |a, b| a - b), both(p_max, q_min, |a, b| a - b))
}

/// `A - B` for linear operators
fn linear(p: &Property, q: &Property) -> Combined {
    let (lambda_min, lambda_max) = eigenvalue_difference(p, q);
    Derived(Property::linear(lambda_min, lambda_max))
}

/// `xᵀAx - xᵀBx = xᵀ(A - B)x`
fn quadratic(p: &Property, q: &Property) -> Combined {
    let (lambda_min, lambda_max) = eigenvalue_difference(p, q);
    Derived(Property::quadratic(lambda_min, lambda_max))
}

/// `convex / strongly convex / hypoconvex - quadratic` lowers the curvature by the quadratic's
/// largest eigenvalue.
fn curved_quadratic(p: &Property, q: &Property) -> Combined {
    let (_, lambda_max) = q.eigenvalues();
    Derived(curvature(both(p.curvature(), lambda_max, |a, b| a - b)))
}

/// `quadratic - L-smooth = (max(|λmin|, |λmax|) + L)-smooth`
fn quadratic_smooth(p: &Property, q: &Property) -> Combined {
    Derived(Property::Smooth(both(quadratic_smoothness(p), q.bound(), |a, b| a + b)))
}

/// `L-smooth - quadratic = (L + max(|λmin|, |λmax|))-smooth`
fn smooth_quadratic(p: &Property, q: &Property) -> Combined {
    Derived(Property::Smooth(both(p.bound(), quadratic_smoothness(q), |a, b| a + b)))
}

/// The combination table for subtraction.
pub static TABLE: Lazy<PairTable> = Lazy::new(|| pair_table! {
    checks_dimensions: true;
    one(Convex, Smooth) => convex_smooth,
    one(StronglyConvex, Smooth) => strongly_convex_smooth,
    one(HypoConvex, Smooth) => hypo_convex_smooth,
    one(Smooth, Smooth) => smooth,
    one(Lipschitz, Lipschitz) => lipschitz,
    one(Linear, Linear) => linear,
    one(Quadratic, Quadratic) => quadratic,
    one(Convex, Quadratic) => curved_quadratic,
    one(StronglyConvex, Quadratic) => curved_quadratic,
    one(HypoConvex, Quadratic) => curved_quadratic,
    one(Quadratic, Smooth) => quadratic_smooth,
    one(Smooth, Quadratic) => smooth_quadratic,
});

/// Combines the properties of the running difference and the next subtracted term.
pub fn combine(left: &Property, right: &Property) -> Combined {
    TABLE.combine(left, right)
}

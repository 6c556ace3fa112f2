//! Combination rules for the properties of a composition `f ∘ g`.
//!
//! Each pairwise rule receives a property of the outer function `f` first and a property of the
//! inner function `g` second. Some facts need more than one property of the outer function at
//! once; those are handled by the [set-level rules](SET_RULES).

use crate::interval::Interval;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use super::{
    both,
    pair_table,
    Combined::{self, Derived},
    PairTable,
    Property,
    PropertySet,
    PropertyTag,
};

/// `convex ∘ linear = convex`
fn convex_linear(_: &Property, _: &Property) -> Combined {
    Derived(Property::Convex)
}

/// `μ-strongly convex ∘ linear(λmin, ·) = (μ + λmin²)-strongly convex` when `λmin > 0`, and
/// `convex` otherwise.
fn strongly_convex_linear(p: &Property, q: &Property) -> Combined {
    match q.eigenvalues() {
        (Some(lambda_min), _) if lambda_min.is_positive() => {
            Derived(Property::StronglyConvex(p.bound().map(|mu| mu + lambda_min.square())))
        },
        _ => Derived(Property::Convex),
    }
}

/// `L-smooth ∘ M-lipschitz = (L·M²)-smooth`
fn smooth_lipschitz(p: &Property, q: &Property) -> Combined {
    Derived(Property::Smooth(both(p.bound(), q.bound(), |l, m| l * m.square())))
}

/// `M1-lipschitz ∘ M2-lipschitz = (M1·M2)-lipschitz`
fn lipschitz(p: &Property, q: &Property) -> Combined {
    Derived(Property::Lipschitz(both(p.bound(), q.bound(), |a, b| a * b)))
}

/// `L-smooth ∘ linear(·, λmax) = (L·λmax²)-smooth`
fn smooth_linear(p: &Property, q: &Property) -> Combined {
    let (_, lambda_max) = q.eigenvalues();
    Derived(Property::Smooth(both(p.bound(), lambda_max, |l, hi| l * hi.square())))
}

/// `ρ-hypoconvex ∘ linear(·, λmax) = (ρ·λmax²)-hypoconvex`
fn hypo_convex_linear(p: &Property, q: &Property) -> Combined {
    let (_, lambda_max) = q.eigenvalues();
    Derived(Property::HypoConvex(both(p.bound(), lambda_max, |rho, hi| rho * hi.square())))
}

/// `M-lipschitz ∘ linear(·, λmax) = (M·|λmax|)-lipschitz`
fn lipschitz_linear(p: &Property, q: &Property) -> Combined {
    let (_, lambda_max) = q.eigenvalues();
    Derived(Property::Lipschitz(both(p.bound(), lambda_max, |m, hi| m * hi.abs())))
}

/// Eigenvalue bounds of a product of two matrices, known only when both have nonnegative
/// spectra.
fn eigenvalue_product(p: &Property, q: &Property) -> (Option<Interval>, Option<Interval>) {
    let (p_min, p_max) = p.eigenvalues();
    let (q_min, q_max) = q.eigenvalues();
    let nonnegative = |bound: Option<Interval>| bound.map_or(false, |b| b.is_nonnegative());
    if nonnegative(p_min) && nonnegative(q_min) {
        (both(p_min, q_min, |a, b| a * b), both(p_max, q_max, |a, b| a * b))
    } else {
        (None, None)
    }
}

/// `A ∘ B = AB` for linear operators
fn linear(p: &Property, q: &Property) -> Combined {
    let (lambda_min, lambda_max) = eigenvalue_product(p, q);
    Derived(Property::linear(lambda_min, lambda_max))
}

/// `xᵀAx ∘ Bx = xᵀBᵀABx`
fn quadratic_linear(p: &Property, q: &Property) -> Combined {
    let (p_min, p_max) = p.eigenvalues();
    let (q_min, q_max) = q.eigenvalues();
    let nonnegative = |bound: Option<Interval>| bound.map_or(false, |b| b.is_nonnegative());
    if nonnegative(p_min) && nonnegative(q_min) {
        Derived(Property::quadratic(
            both(p_min, q_min, |a, b| a * b.square()),
            both(p_max, q_max, |a, b| a * b.square()),
        ))
    } else {
        Derived(Property::quadratic(None, None))
    }
}

/// `increasing ∘ increasing = increasing`
fn monotone(_: &Property, _: &Property) -> Combined {
    Derived(Property::MonotonicallyIncreasing)
}

/// The pairwise combination table for composition.
///
/// Composition does not check dimensions: a linear operator is the usual inner function.
pub static TABLE: Lazy<PairTable> = Lazy::new(|| pair_table! {
    checks_dimensions: false;
    one(Convex, Linear) => convex_linear,
    one(StronglyConvex, Linear) => strongly_convex_linear,
    one(Smooth, Lipschitz) => smooth_lipschitz,
    one(Lipschitz, Lipschitz) => lipschitz,
    one(Smooth, Linear) => smooth_linear,
    one(HypoConvex, Linear) => hypo_convex_linear,
    one(Lipschitz, Linear) => lipschitz_linear,
    one(Linear, Linear) => linear,
    one(Quadratic, Linear) => quadratic_linear,
    one(MonotonicallyIncreasing, MonotonicallyIncreasing) => monotone,
});

/// Combines a property of the outer function with a property of the inner function.
pub fn combine(outer: &Property, inner: &Property) -> Combined {
    TABLE.combine(outer, inner)
}

/// Set-level rules for composition, keyed by the tags of two properties of the outer function and
/// one property of the inner function, all of which must hold at once.
///
/// `f ∘ g` is convex when `f` is increasing and convex, and `g` is convex.
pub static SET_RULES: Lazy<HashMap<(PropertyTag, PropertyTag, PropertyTag), Property>> =
    Lazy::new(|| {
        use PropertyTag::*;
        let mut rules = HashMap::new();
        for outer in [Convex, StronglyConvex] {
            for inner in [Convex, StronglyConvex] {
                rules.insert((MonotonicallyIncreasing, outer, inner), Property::Convex);
            }
        }
        rules
    });

/// Applies the set-level rules to the full property sets of the outer and inner functions.
pub fn combine_sets(outer: &PropertySet, inner: &PropertySet) -> PropertySet {
    let mut out = PropertySet::new();
    for first in outer {
        for second in outer {
            for third in inner {
                if let Some(derived) = SET_RULES.get(&(first.tag(), second.tag(), third.tag())) {
                    out.insert(*derived);
                }
            }
        }
    }
    out
}

//! Mathematical properties of functions, and the algebra that derives them for whole expressions.
//!
//! A leaf function is described by a [`PropertySet`]: the facts it is known to satisfy, such as
//! being convex or `L`-smooth. [`infer_properties`] folds these facts over an expression tree,
//! producing the facts the whole expression provably has.
//!
//! Facts are combined pairwise through per-operator combination tables ([`add`], [`sub`] and
//! [`comp`]), each an explicit lookup keyed by the [`PropertyTag`] of the two operands. A pair
//! with no entry is simply dropped: it does not contradict anything, we just cannot prove a fact
//! about the result. A pair that mixes a linear operator with a scalar-valued function is a
//! modeling error, reported as [`DimensionMismatch`].
//!
//! Numeric parameters are optional [`Interval`]s. An absent parameter means the function has the
//! qualitative property but the bound is unknown, and any combination involving an unknown bound
//! produces an unknown bound.

pub mod add;
pub mod comp;
mod error;
mod infer;
pub mod sub;

pub use error::DimensionMismatch;
pub use infer::infer_properties;

use crate::interval::Interval;
use indexmap::IndexSet;
use std::collections::HashMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A provable fact about a function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Property {
    /// The function is convex.
    Convex,

    /// The function is monotonically increasing.
    MonotonicallyIncreasing,

    /// The function is strongly convex with modulus `μ`.
    StronglyConvex(Option<Interval>),

    /// The function is hypoconvex (weakly convex) with modulus `ρ`, i.e. `f + ρ/2 |x|²` is
    /// convex.
    HypoConvex(Option<Interval>),

    /// The function has an `L`-Lipschitz gradient.
    Smooth(Option<Interval>),

    /// The function is `M`-Lipschitz continuous.
    Lipschitz(Option<Interval>),

    /// The function is a linear operator whose eigenvalues lie within the given bounds.
    Linear {
        lambda_min: Option<Interval>,
        lambda_max: Option<Interval>,
    },

    /// The function is a quadratic form whose matrix has eigenvalues within the given bounds.
    Quadratic {
        lambda_min: Option<Interval>,
        lambda_max: Option<Interval>,
    },
}

/// The variant of a [`Property`], without its parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum PropertyTag {
    Convex,
    MonotonicallyIncreasing,
    StronglyConvex,
    HypoConvex,
    Smooth,
    Lipschitz,
    Linear,
    Quadratic,
}

/// The facts known about a function. Insertion order is kept, so that inference results are
/// reported deterministically.
pub type PropertySet = IndexSet<Property>;

impl Property {
    /// A linear operator with the given eigenvalue bounds.
    pub fn linear(lambda_min: Option<Interval>, lambda_max: Option<Interval>) -> Self {
        Self::Linear { lambda_min, lambda_max }
    }

    /// A quadratic form with the given eigenvalue bounds.
    pub fn quadratic(lambda_min: Option<Interval>, lambda_max: Option<Interval>) -> Self {
        Self::Quadratic { lambda_min, lambda_max }
    }

    /// The variant of this property.
    pub fn tag(&self) -> PropertyTag {
        match self {
            Self::Convex => PropertyTag::Convex,
            Self::MonotonicallyIncreasing => PropertyTag::MonotonicallyIncreasing,
            Self::StronglyConvex(_) => PropertyTag::StronglyConvex,
            Self::HypoConvex(_) => PropertyTag::HypoConvex,
            Self::Smooth(_) => PropertyTag::Smooth,
            Self::Lipschitz(_) => PropertyTag::Lipschitz,
            Self::Linear { .. } => PropertyTag::Linear,
            Self::Quadratic { .. } => PropertyTag::Quadratic,
        }
    }

    /// Returns true if this property describes a linear operator rather than a scalar-valued
    /// function.
    pub fn is_operator(&self) -> bool {
        matches!(self, Self::Linear { .. })
    }

    /// Returns true if the property implies convexity.
    pub fn implies_convex(&self) -> bool {
        matches!(self, Self::Convex | Self::StronglyConvex(_))
    }

    /// The single numeric parameter of the property, if it has one and it is known.
    pub fn bound(&self) -> Option<Interval> {
        match self {
            Self::StronglyConvex(b) | Self::HypoConvex(b) | Self::Smooth(b) | Self::Lipschitz(b) => *b,
            _ => None,
        }
    }

    /// The eigenvalue bounds of a linear operator or quadratic form.
    pub fn eigenvalues(&self) -> (Option<Interval>, Option<Interval>) {
        match self {
            Self::Linear { lambda_min, lambda_max }
            | Self::Quadratic { lambda_min, lambda_max } => (*lambda_min, *lambda_max),
            _ => (None, None),
        }
    }

    /// A lower bound on the curvature of the function, if the property provides one.
    ///
    /// A convex function has curvature at least `0`, a `μ`-strongly convex one at least `μ`, a
    /// `ρ`-hypoconvex one at least `-ρ`, and a quadratic form at least its smallest eigenvalue.
    pub(crate) fn curvature(&self) -> Option<Interval> {
        match self {
            Self::Convex => Some(Interval::point(0.0)),
            Self::StronglyConvex(mu) => *mu,
            Self::HypoConvex(rho) => rho.map(|rho| -rho),
            Self::Quadratic { lambda_min, .. } => *lambda_min,
            _ => None,
        }
    }
}

/// Formats an optional parameter for display.
fn fmt_param(
    f: &mut std::fmt::Formatter<'_>,
    name: &str,
    symbol: &str,
    param: &Option<Interval>,
) -> std::fmt::Result {
    match param {
        Some(value) => write!(f, "{} ({} = {})", name, symbol, value),
        None => write!(f, "{}", name),
    }
}

impl std::fmt::Display for Property {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Convex => write!(f, "convex"),
            Self::MonotonicallyIncreasing => write!(f, "monotonically increasing"),
            Self::StronglyConvex(mu) => fmt_param(f, "strongly convex", "μ", mu),
            Self::HypoConvex(rho) => fmt_param(f, "hypoconvex", "ρ", rho),
            Self::Smooth(l) => fmt_param(f, "smooth", "L", l),
            Self::Lipschitz(m) => fmt_param(f, "lipschitz", "M", m),
            Self::Linear { lambda_min, lambda_max }
            | Self::Quadratic { lambda_min, lambda_max } => {
                let name = if self.is_operator() { "linear" } else { "quadratic" };
                write!(f, "{}", name)?;
                match (lambda_min, lambda_max) {
                    (Some(lo), Some(hi)) => write!(f, " (λmin = {}, λmax = {})", lo, hi),
                    (Some(lo), None) => write!(f, " (λmin = {})", lo),
                    (None, Some(hi)) => write!(f, " (λmax = {})", hi),
                    (None, None) => Ok(()),
                }
            },
        }
    }
}

/// The outcome of combining two properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combined {
    /// The combination provably has this property.
    Derived(Property),

    /// Nothing can be proven from this pair.
    Incompatible,

    /// The two properties describe objects that cannot be combined, e.g. a linear operator and a
    /// scalar-valued function.
    DimensionMismatch,
}

/// A rule combining the left and right operand's properties.
pub type PairRule = fn(&Property, &Property) -> Combined;

/// A combination table for one operator, keyed by the tags of the left and right operand's
/// properties.
#[derive(Debug)]
pub struct PairTable {
    rules: HashMap<(PropertyTag, PropertyTag), PairRule>,

    /// Whether operands must agree on being a linear operator. This holds for addition and
    /// subtraction, but not for composition, where an operator is the usual inner function.
    checks_dimensions: bool,
}

impl PairTable {
    /// Combines the properties of a left and right operand.
    pub fn combine(&self, left: &Property, right: &Property) -> Combined {
        if self.checks_dimensions && left.is_operator() != right.is_operator() {
            return Combined::DimensionMismatch;
        }

        match self.rules.get(&(left.tag(), right.tag())) {
            Some(rule) => rule(left, right),
            None => Combined::Incompatible,
        }
    }

    /// Returns true if the table has a rule for the given pair of tags.
    pub fn has_rule(&self, left: PropertyTag, right: PropertyTag) -> bool {
        self.rules.contains_key(&(left, right))
    }
}

/// Builds a [`PairTable`].
///
/// `one` entries apply only to the given order of tags. `sym` entries also apply to the flipped
/// order, with the rule still receiving its operands in the declared order.
macro_rules! pair_table {
    (checks_dimensions: $checks:expr; $($kind:ident ($left:ident, $right:ident) => $rule:path),* $(,)?) => {{
        let mut rules: ::std::collections::HashMap<
            ($crate::property::PropertyTag, $crate::property::PropertyTag),
            $crate::property::PairRule,
        > = ::std::collections::HashMap::new();
        $(pair_table!(@insert rules, $kind, $left, $right, $rule);)*
        $crate::property::PairTable::from_rules(rules, $checks)
    }};
    (@insert $rules:ident, one, $left:ident, $right:ident, $rule:path) => {
        $rules.insert(
            ($crate::property::PropertyTag::$left, $crate::property::PropertyTag::$right),
            $rule,
        );
    };
    (@insert $rules:ident, sym, $left:ident, $right:ident, $rule:path) => {
        $rules.insert(
            ($crate::property::PropertyTag::$left, $crate::property::PropertyTag::$right),
            $rule,
        );
        $rules.insert(
            ($crate::property::PropertyTag::$right, $crate::property::PropertyTag::$left),
            |p, q| $rule(q, p),
        );
    };
}

pub(crate) use pair_table;

impl PairTable {
    pub(crate) fn from_rules(
        rules: HashMap<(PropertyTag, PropertyTag), PairRule>,
        checks_dimensions: bool,
    ) -> Self {
        Self { rules, checks_dimensions }
    }
}

/// Applies `f` to two bounds, producing an unknown bound if either is unknown.
pub(crate) fn both(
    a: Option<Interval>,
    b: Option<Interval>,
    f: impl FnOnce(Interval, Interval) -> Interval,
) -> Option<Interval> {
    Some(f(a?, b?))
}

/// The property of a function whose curvature is bounded below by `c`.
///
/// Positive curvature is strong convexity, zero curvature is convexity, and anything else is
/// hypoconvexity with modulus `|c|`. An unknown curvature only proves hypoconvexity.
pub(crate) fn curvature(c: Option<Interval>) -> Property {
    match c {
        Some(c) if c.is_positive() => Property::StronglyConvex(Some(c)),
        Some(c) if c.is_nonnegative() => Property::Convex,
        Some(c) => Property::HypoConvex(Some(c.abs())),
        None => Property::HypoConvex(None),
    }
}

/// The smoothness constant of a quadratic form, `max(|λmin|, |λmax|)`.
pub(crate) fn quadratic_smoothness(property: &Property) -> Option<Interval> {
    let (lambda_min, lambda_max) = property.eigenvalues();
    both(lambda_min, lambda_max, |lo, hi| lo.abs().max(hi.abs()))
}

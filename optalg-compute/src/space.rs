//! The mathematical spaces that expressions take their values in.
//!
//! A [`Space`] is only used to reject dimension-incompatible operations when an expression is
//! built. Two spaces are compatible exactly when they are structurally equal; no broadcasting or
//! unification of symbolic dimensions is attempted.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The dimension of a vector space.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Dim {
    /// A concrete, positive dimension, such as `3`.
    Fixed(usize),

    /// A dimension known only by name, such as `n`.
    Symbol(String),
}

impl std::fmt::Display for Dim {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Fixed(n) => write!(f, "{}", n),
            Self::Symbol(sym) => write!(f, "{}", sym),
        }
    }
}

/// The space an expression's value lives in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Space {
    /// The real line.
    #[default]
    Scalar,

    /// A real vector space of the given dimension.
    Vector(Dim),
}

impl Space {
    /// A vector space with a concrete dimension.
    pub fn vector(n: usize) -> Self {
        Self::Vector(Dim::Fixed(n))
    }

    /// A vector space whose dimension is the given symbol.
    pub fn symbolic(name: impl Into<String>) -> Self {
        Self::Vector(Dim::Symbol(name.into()))
    }

    /// Returns true if this is the scalar space.
    pub fn is_scalar(&self) -> bool {
        matches!(self, Self::Scalar)
    }
}

impl std::fmt::Display for Space {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Scalar => write!(f, "scalar"),
            Self::Vector(dim) => write!(f, "vector({})", dim),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structural_equality() {
        assert_eq!(Space::vector(3), Space::Vector(Dim::Fixed(3)));
        assert_ne!(Space::vector(3), Space::symbolic("n"));
        assert_ne!(Space::Scalar, Space::vector(1));
    }

    #[test]
    fn display() {
        assert_eq!(Space::Scalar.to_string(), "scalar");
        assert_eq!(Space::symbolic("n").to_string(), "vector(n)");
    }
}

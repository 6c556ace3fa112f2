//! Runtime values passed to and returned from oracles.

use std::fmt;

/// A value an oracle consumes or produces.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// A real number.
    Scalar(f64),

    /// A vector of real numbers.
    Vector(Vec<f64>),
}

/// Represents an error that can occur while calling an oracle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallError {
    /// The oracle was called with fewer arguments than it needs.
    MissingArgument {
        expected: usize,
        given: usize,
    },

    /// Two vectors of different lengths were combined element-wise.
    LengthMismatch {
        left: usize,
        right: usize,
    },

    /// A scalar was required, but a vector was given or produced.
    NotScalar,
}

impl fmt::Display for CallError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingArgument { expected, given } => {
                write!(f, "expected {} argument(s), but {} were given", expected, given)
            },
            Self::LengthMismatch { left, right } => {
                write!(f, "cannot combine vectors of length {} and {}", left, right)
            },
            Self::NotScalar => write!(f, "expected a scalar, found a vector"),
        }
    }
}

impl std::error::Error for CallError {}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Scalar(value)
    }
}

impl From<Vec<f64>> for Value {
    fn from(value: Vec<f64>) -> Self {
        Self::Vector(value)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar(x) => write!(f, "{}", x),
            Self::Vector(v) => {
                write!(f, "[")?;
                for (i, x) in v.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", x)?;
                }
                write!(f, "]")
            },
        }
    }
}

impl Value {
    /// Returns the value as a scalar, if it is one.
    pub fn as_scalar(&self) -> Result<f64, CallError> {
        match self {
            Self::Scalar(x) => Ok(*x),
            Self::Vector(_) => Err(CallError::NotScalar),
        }
    }

    /// Applies `f` to the value, element-wise for vectors.
    pub fn map(&self, f: impl Fn(f64) -> f64) -> Self {
        match self {
            Self::Scalar(x) => Self::Scalar(f(*x)),
            Self::Vector(v) => Self::Vector(v.iter().copied().map(f).collect()),
        }
    }

    /// Combines two values element-wise. A scalar is broadcast against a vector.
    pub fn zip_with(&self, other: &Self, f: impl Fn(f64, f64) -> f64) -> Result<Self, CallError> {
        match (self, other) {
            (Self::Scalar(a), Self::Scalar(b)) => Ok(Self::Scalar(f(*a, *b))),
            (Self::Scalar(a), Self::Vector(v)) => {
                Ok(Self::Vector(v.iter().map(|b| f(*a, *b)).collect()))
            },
            (Self::Vector(v), Self::Scalar(b)) => {
                Ok(Self::Vector(v.iter().map(|a| f(*a, *b)).collect()))
            },
            (Self::Vector(u), Self::Vector(v)) => {
                if u.len() != v.len() {
                    return Err(CallError::LengthMismatch { left: u.len(), right: v.len() });
                }
                Ok(Self::Vector(u.iter().zip(v).map(|(a, b)| f(*a, *b)).collect()))
            },
        }
    }

    /// `self + other`
    pub fn add(&self, other: &Self) -> Result<Self, CallError> {
        self.zip_with(other, |a, b| a + b)
    }

    /// `self - other`
    pub fn sub(&self, other: &Self) -> Result<Self, CallError> {
        self.zip_with(other, |a, b| a - b)
    }

    /// `self * other`, element-wise
    pub fn mul(&self, other: &Self) -> Result<Self, CallError> {
        self.zip_with(other, |a, b| a * b)
    }

    /// `max(self, other)`, element-wise
    pub fn max(&self, other: &Self) -> Result<Self, CallError> {
        self.zip_with(other, f64::max)
    }

    /// `min(self, other)`, element-wise
    pub fn min(&self, other: &Self) -> Result<Self, CallError> {
        self.zip_with(other, f64::min)
    }

    /// `-self`
    pub fn neg(&self) -> Self {
        self.map(|x| -x)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use super::*;

    #[test]
    fn broadcast() {
        let v = Value::Vector(vec![1.0, 2.0]);
        assert_eq!(Value::Scalar(1.0).add(&v), Ok(Value::Vector(vec![2.0, 3.0])));
        assert_eq!(v.mul(&Value::Scalar(3.0)), Ok(Value::Vector(vec![3.0, 6.0])));
    }

    #[test]
    fn length_mismatch() {
        let a = Value::Vector(vec![1.0, 2.0]);
        let b = Value::Vector(vec![1.0]);
        assert_eq!(a.sub(&b), Err(CallError::LengthMismatch { left: 2, right: 1 }));
    }

    #[test]
    fn scalar_access() {
        assert_eq!(Value::Scalar(2.0).as_scalar(), Ok(2.0));
        assert_eq!(Value::Vector(vec![2.0]).as_scalar(), Err(CallError::NotScalar));
        assert_eq!(Value::Vector(vec![1.0, -2.5]).to_string(), "[1, -2.5]");
    }
}

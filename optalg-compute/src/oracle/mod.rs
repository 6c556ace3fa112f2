//! Oracles: computational capabilities attached to functions.
//!
//! An [`Oracle`] wraps a callable, such as a function's evaluation or its derivative, along with
//! [`OracleMetadata`] describing its accuracy and cost. Oracles are registered on leaf functions in
//! the [`Ctxt`](crate::ctxt::Ctxt), and [`oracle_for_expression`] combines them into an oracle for
//! a whole expression.
//!
//! Every oracle receives the full argument list of the expression it belongs to. Composite oracles
//! forward that list unchanged to each leaf oracle they are built from.

mod compose;
pub mod metadata;
pub mod value;

pub use compose::oracle_for_expression;
pub use metadata::{Cost, ErrorBound, Exactness, OracleMetadata};
pub use value::{CallError, Value};

use std::{fmt, sync::Arc};

#[cfg(feature = "serde")]
use serde_repr::{Deserialize_repr, Serialize_repr};

/// The kind of capability an oracle provides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize_repr, Deserialize_repr))]
#[repr(u8)]
pub enum OracleKind {
    /// Evaluates the function.
    Evaluation,

    /// Evaluates the derivative (or gradient) of the function.
    Derivative,

    /// Evaluates the proximal operator of the function.
    Proximal,
}

impl OracleKind {
    /// Every oracle kind, in declaration order.
    pub const ALL: [OracleKind; 3] = [Self::Evaluation, Self::Derivative, Self::Proximal];
}

impl fmt::Display for OracleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Evaluation => write!(f, "evaluation"),
            Self::Derivative => write!(f, "derivative"),
            Self::Proximal => write!(f, "proximal"),
        }
    }
}

/// The callable wrapped by an oracle.
pub type Callable = Arc<dyn Fn(&[Value]) -> Result<Value, CallError> + Send + Sync>;

/// A callable capability of a function, along with its metadata.
///
/// Oracles are cheap to clone; clones share the same callable.
#[derive(Clone)]
pub struct Oracle {
    kind: OracleKind,
    func: Callable,
    metadata: OracleMetadata,
}

impl fmt::Debug for Oracle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Oracle")
            .field("kind", &self.kind)
            .field("metadata", &self.metadata)
            .finish_non_exhaustive()
    }
}

impl Oracle {
    /// Creates an oracle from a callable over the full argument list.
    pub fn new(
        kind: OracleKind,
        func: impl Fn(&[Value]) -> Result<Value, CallError> + Send + Sync + 'static,
    ) -> Self {
        Self::from_callable(kind, Arc::new(func), OracleMetadata::default())
    }

    /// Creates an oracle from an existing callable and metadata.
    pub fn from_callable(kind: OracleKind, func: Callable, metadata: OracleMetadata) -> Self {
        Self { kind, func, metadata }
    }

    /// Creates an oracle of a function of one real variable. The function is applied to the first
    /// argument, element-wise if it is a vector.
    pub fn from_scalar(kind: OracleKind, f: impl Fn(f64) -> f64 + Send + Sync + 'static) -> Self {
        Self::new(kind, move |args| match args.first() {
            Some(arg) => Ok(arg.map(&f)),
            None => Err(CallError::MissingArgument { expected: 1, given: 0 }),
        })
    }

    /// Replaces the metadata of the oracle.
    pub fn with_metadata(mut self, metadata: OracleMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// The kind of capability this oracle provides.
    pub fn kind(&self) -> OracleKind {
        self.kind
    }

    /// The metadata of this oracle.
    pub fn metadata(&self) -> &OracleMetadata {
        &self.metadata
    }

    /// The callable of this oracle.
    pub(crate) fn callable(&self) -> &Callable {
        &self.func
    }

    /// Calls the oracle with the given arguments.
    pub fn call(&self, args: &[Value]) -> Result<Value, CallError> {
        (self.func)(args)
    }

    /// Calls the oracle with a single scalar argument, expecting a scalar result.
    pub fn call_scalar(&self, x: f64) -> Result<f64, CallError> {
        self.call(&[Value::Scalar(x)])?.as_scalar()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use super::*;

    #[test]
    fn scalar_oracle() {
        let square = Oracle::from_scalar(OracleKind::Evaluation, |x| x * x);
        assert_eq!(square.call_scalar(3.0), Ok(9.0));
        assert_eq!(
            square.call(&[Value::Vector(vec![1.0, 2.0])]),
            Ok(Value::Vector(vec![1.0, 4.0])),
        );
        assert_eq!(square.call(&[]), Err(CallError::MissingArgument { expected: 1, given: 0 }));
    }

    #[test]
    fn clones_share_the_callable() {
        let oracle = Oracle::from_scalar(OracleKind::Derivative, |x| 2.0 * x);
        let clone = oracle.clone();
        assert!(Arc::ptr_eq(oracle.callable(), clone.callable()));
        assert_eq!(clone.kind(), OracleKind::Derivative);
    }
}

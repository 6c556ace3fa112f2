use ariadne::Fmt;
use optalg_attrs::ErrorKind;
use optalg_error::{ErrorKind, EXPR};
use super::Op;
use crate::space::Space;

/// An operand does not live in the space its operator was declared to produce.
#[derive(Debug, Clone, ErrorKind, PartialEq)]
#[error(
    message = format!("expected an operand in `{}`, found one in `{}`", self.expected, self.found),
    labels = [format!("this operand lives in `{}`", self.found)],
    help = format!("every operand of this {} must live in {}", self.op, (&self.expected).fg(EXPR)),
)]
pub struct SpaceMismatch {
    /// The operator being constructed.
    pub op: Op,

    /// The space the operator was declared to produce.
    pub expected: Space,

    /// The space of the offending operand.
    pub found: Space,
}

/// An n-ary operator was constructed without any operands.
#[derive(Debug, Clone, ErrorKind, PartialEq)]
#[error(
    message = format!("cannot build an empty {}", self.op),
    labels = ["this operator has no operands"],
    help = "give the operator at least one operand",
)]
pub struct EmptyOperation {
    /// The operator being constructed.
    pub op: Op,
}

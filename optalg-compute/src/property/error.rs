use ariadne::Fmt;
use crate::expr::Op;
use optalg_attrs::ErrorKind;
use optalg_error::{ErrorKind, EXPR};
use super::Property;

/// A property of a linear operator was combined with a property of a scalar-valued function.
///
/// This is always a modeling error: the operands of the expression cannot be combined in the
/// first place.
#[derive(Debug, Clone, ErrorKind, PartialEq)]
#[error(
    message = format!("cannot combine a {} operand that is `{}` with one that is `{}`", self.op, self.left, self.right),
    labels = [format!("these operands are `{}`", self.left), format!("this operand is `{}`", self.right)],
    help = format!("a {} maps vectors to vectors; it can only be combined with other linear operators, or used as the inner function of a {}", "linear operator".fg(EXPR), "composition".fg(EXPR)),
)]
pub struct DimensionMismatch {
    /// The operator whose operands were being combined.
    pub op: Op,

    /// The property of the operands to the left.
    pub left: Property,

    /// The property of the offending operand.
    pub right: Property,
}

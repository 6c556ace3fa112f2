use ariadne::Fmt;
use optalg_attrs::ErrorKind;
use optalg_error::{ErrorKind, EXPR};

/// No reformulation strategy is registered with the given name.
#[derive(Debug, Clone, ErrorKind, PartialEq)]
#[error(
    message = format!("unknown reformulation strategy `{}`", self.name),
    labels = ["this expression could not be reformulated"],
    help = if self.suggestions.is_empty() {
        String::from("register the strategy before applying it")
    } else {
        format!(
            "did you mean {}?",
            self.suggestions.iter()
                .map(|s| format!("`{}`", s.fg(EXPR)))
                .collect::<Vec<_>>()
                .join(", ")
        )
    },
)]
pub struct StrategyNotFound {
    /// The name that was requested.
    pub name: String,

    /// Registered strategies with a similar name.
    pub suggestions: Vec<String>,
}

//! Contains the common [`ErrorKind`] trait used by all errors to display user-facing error
//! messages.
//!
//! Expressions in `optalg` are built in code rather than parsed from text, so an [`Error`] carries
//! its own source: the rendered form of the expression that caused it. The spans of the error
//! point into that rendering, which lets [`ariadne`] underline the offending operands.

// lets `#[derive(ErrorKind)]` resolve `optalg_error::EXPR` inside this crate's tests
#[cfg(test)]
extern crate self as optalg_error;

use ariadne::{Color, Report, Source};
use std::{any::Any, fmt::Debug, ops::Range};

/// The color to use to highlight expressions.
pub const EXPR: Color = Color::RGB(52, 235, 152);

/// Represents any kind of error that can occur during some operation.
pub trait ErrorKind: Debug + Send + Sync {
    /// Returns `self` as [`Any`], so that the concrete kind can be recovered.
    fn as_any(&self) -> &dyn Any;

    /// Builds the report for this error.
    fn build_report<'a>(
        &self,
        src_id: &'a str,
        spans: &[Range<usize>],
    ) -> Report<(&'a str, Range<usize>)>;
}

/// An error associated with regions of a rendered expression that can be highlighted.
#[derive(Debug)]
pub struct Error {
    /// The rendered expression that the spans point into.
    pub source: String,

    /// The regions of the source that this error originated from.
    pub spans: Vec<Range<usize>>,

    /// The kind of error that occurred.
    pub kind: Box<dyn ErrorKind>,
}

impl Error {
    /// Creates a new error with the given source, spans and kind.
    pub fn new(
        source: impl Into<String>,
        spans: Vec<Range<usize>>,
        kind: impl ErrorKind + 'static,
    ) -> Self {
        Self { source: source.into(), spans, kind: Box::new(kind) }
    }

    /// Build a report from this error kind.
    pub fn build_report<'a>(&self, src_id: &'a str) -> Report<(&'a str, Range<usize>)> {
        self.kind.build_report(src_id, &self.spans)
    }

    /// Renders the report into a string, including the highlighted source.
    ///
    /// The `ariadne` crate's [`Report`] type does not have a `Display` implementation, so the
    /// report is written into a buffer instead.
    pub fn report_to_string(&self, src_id: &str) -> String {
        let mut buf = Vec::new();
        let written = self
            .build_report(src_id)
            .write((src_id, Source::from(&self.source)), &mut buf);
        match written {
            Ok(()) => String::from_utf8_lossy(&buf).into_owned(),
            Err(err) => format!("{:?} (failed to render report: {})", self.kind, err),
        }
    }

    /// Returns the concrete kind of this error if it is a `K`.
    pub fn downcast_ref<K: ErrorKind + 'static>(&self) -> Option<&K> {
        self.kind.as_any().downcast_ref::<K>()
    }

    /// Returns true if the kind of this error is a `K`.
    pub fn is<K: ErrorKind + 'static>(&self) -> bool {
        self.downcast_ref::<K>().is_some()
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?} in `{}`", self.kind, self.source)
    }
}

impl std::error::Error for Error {}

use super::Error;

/// Error when a filter expression cannot be parsed or its argument has the
/// wrong shape for the operator (e.g. `in` without a list).
#[derive(Debug)]
pub(super) struct MalformedFilter {
    expr: Box<str>,
    reason: Box<str>,
}

impl std::error::Error for MalformedFilter {}

impl core::fmt::Display for MalformedFilter {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "malformed filter `{}`: {}", self.expr, self.reason)
    }
}

impl Error {
    /// Creates a malformed filter error.
    pub fn malformed_filter(expr: impl Into<String>, reason: impl Into<String>) -> Error {
        Error::from(super::ErrorKind::MalformedFilter(MalformedFilter {
            expr: expr.into().into(),
            reason: reason.into().into(),
        }))
    }

    /// Returns `true` if this error is a malformed filter error.
    pub fn is_malformed_filter(&self) -> bool {
        matches!(self.kind(), super::ErrorKind::MalformedFilter(_))
    }
}

use super::Error;

/// Error when a query expected to match exactly one row matched more.
#[derive(Debug)]
pub(super) struct InvalidRecordCount {
    context: Box<str>,
}

impl std::error::Error for InvalidRecordCount {}

impl core::fmt::Display for InvalidRecordCount {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(
            f,
            "invalid record count: expected 1 record, found multiple: {}",
            self.context
        )
    }
}

impl Error {
    /// Creates an invalid record count error.
    pub fn invalid_record_count(context: impl Into<String>) -> Error {
        Error::from(super::ErrorKind::InvalidRecordCount(InvalidRecordCount {
            context: context.into().into(),
        }))
    }

    /// Returns `true` if this error is an invalid record count error.
    pub fn is_invalid_record_count(&self) -> bool {
        matches!(self.kind(), super::ErrorKind::InvalidRecordCount(_))
    }
}

use super::Error;

/// Error when an operation receives arguments it cannot work with, such as
/// an empty slice for a bulk insert.
#[derive(Debug)]
pub(super) struct ArgsError {
    message: Box<str>,
}

impl std::error::Error for ArgsError {}

impl core::fmt::Display for ArgsError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "invalid arguments: {}", self.message)
    }
}

impl Error {
    /// Creates an invalid arguments error.
    pub fn args(message: impl Into<String>) -> Error {
        Error::from(super::ErrorKind::Args(ArgsError {
            message: message.into().into(),
        }))
    }

    /// Returns `true` if this error is an invalid arguments error.
    pub fn is_args(&self) -> bool {
        matches!(self.kind(), super::ErrorKind::Args(_))
    }
}

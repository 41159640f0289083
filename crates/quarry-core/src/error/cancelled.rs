use super::Error;

/// Error when the operation's [`Context`](crate::Context) was cancelled.
#[derive(Debug)]
pub(super) struct Cancelled;

impl std::error::Error for Cancelled {}

impl core::fmt::Display for Cancelled {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        f.write_str("operation cancelled")
    }
}

impl Error {
    pub fn cancelled() -> Error {
        Error::from(super::ErrorKind::Cancelled(Cancelled))
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self.kind(), super::ErrorKind::Cancelled(_))
    }
}

use super::Error;

/// Error when the operation's [`Context`](crate::Context) deadline passed
/// before the driver answered.
#[derive(Debug)]
pub(super) struct DeadlineExceeded;

impl std::error::Error for DeadlineExceeded {}

impl core::fmt::Display for DeadlineExceeded {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        f.write_str("deadline exceeded")
    }
}

impl Error {
    pub fn deadline_exceeded() -> Error {
        Error::from(super::ErrorKind::DeadlineExceeded(DeadlineExceeded))
    }

    pub fn is_deadline_exceeded(&self) -> bool {
        matches!(self.kind(), super::ErrorKind::DeadlineExceeded(_))
    }
}

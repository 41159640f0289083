use super::Error;

/// Error when the same model (or a second model mapping to the same table)
/// is registered twice.
#[derive(Debug)]
pub(super) struct DuplicateModel {
    name: Box<str>,
}

impl std::error::Error for DuplicateModel {}

impl core::fmt::Display for DuplicateModel {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "model `{}` is already registered", self.name)
    }
}

impl Error {
    /// Creates a duplicate model error.
    pub fn duplicate_model(name: impl Into<String>) -> Error {
        Error::from(super::ErrorKind::DuplicateModel(DuplicateModel {
            name: name.into().into(),
        }))
    }

    /// Returns `true` if this error is a duplicate model error.
    pub fn is_duplicate_model(&self) -> bool {
        matches!(self.kind(), super::ErrorKind::DuplicateModel(_))
    }
}

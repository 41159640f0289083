use super::Error;

/// Error when an operation names a record type the registry does not know.
#[derive(Debug)]
pub(super) struct ModelNotRegistered {
    name: Box<str>,
}

impl std::error::Error for ModelNotRegistered {}

impl core::fmt::Display for ModelNotRegistered {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "model `{}` is not registered", self.name)
    }
}

impl Error {
    /// Creates a model-not-registered error for the given fully-qualified
    /// model name or table name.
    pub fn model_not_registered(name: impl Into<String>) -> Error {
        Error::from(super::ErrorKind::ModelNotRegistered(ModelNotRegistered {
            name: name.into().into(),
        }))
    }

    /// Returns `true` if this error is a model-not-registered error.
    pub fn is_model_not_registered(&self) -> bool {
        matches!(self.kind(), super::ErrorKind::ModelNotRegistered(_))
    }
}

use super::Error;

/// Error when a field declaration carries a malformed or contradictory
/// option.
///
/// This occurs when:
/// - `size` is set on a non-string field
/// - `digits`/`decimals` are set on a non-float field, or both size and
///   precision are set
/// - `auto` is set on a non-integer field
/// - more than one primary key is declared, or the primary key is nullable
///   or a relation
/// - a relation names a target that was never registered
#[derive(Debug)]
pub(super) struct InvalidTag {
    model: Box<str>,
    field: Option<Box<str>>,
    reason: Box<str>,
}

impl std::error::Error for InvalidTag {}

impl core::fmt::Display for InvalidTag {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        match &self.field {
            Some(field) => write!(
                f,
                "invalid declaration for `{}.{}`: {}",
                self.model, field, self.reason
            ),
            None => write!(
                f,
                "invalid declaration for `{}`: {}",
                self.model, self.reason
            ),
        }
    }
}

impl Error {
    /// Creates an invalid tag error for a field of `model`.
    pub fn invalid_tag(
        model: impl Into<String>,
        field: impl Into<String>,
        reason: impl Into<String>,
    ) -> Error {
        Error::from(super::ErrorKind::InvalidTag(InvalidTag {
            model: model.into().into(),
            field: Some(field.into().into()),
            reason: reason.into().into(),
        }))
    }

    /// Creates an invalid tag error that concerns the model as a whole.
    pub fn invalid_model(model: impl Into<String>, reason: impl Into<String>) -> Error {
        Error::from(super::ErrorKind::InvalidTag(InvalidTag {
            model: model.into().into(),
            field: None,
            reason: reason.into().into(),
        }))
    }

    /// Returns `true` if this error is an invalid tag error.
    pub fn is_invalid_tag(&self) -> bool {
        matches!(self.kind(), super::ErrorKind::InvalidTag(_))
    }
}

use super::Error;

/// Error when a reverse relation has no reciprocal forward field on its
/// target model.
#[derive(Debug)]
pub(super) struct DanglingRelation {
    model: Box<str>,
    field: Box<str>,
    target: Box<str>,
}

impl std::error::Error for DanglingRelation {}

impl core::fmt::Display for DanglingRelation {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(
            f,
            "relation `{}.{}` has no reciprocal field on `{}`",
            self.model, self.field, self.target
        )
    }
}

impl Error {
    pub fn dangling_relation(
        model: impl Into<String>,
        field: impl Into<String>,
        target: impl Into<String>,
    ) -> Error {
        Error::from(super::ErrorKind::DanglingRelation(DanglingRelation {
            model: model.into().into(),
            field: field.into().into(),
            target: target.into().into(),
        }))
    }

    /// Returns `true` if this error is a dangling relation error.
    pub fn is_dangling_relation(&self) -> bool {
        matches!(self.kind(), super::ErrorKind::DanglingRelation(_))
    }
}

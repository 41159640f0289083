use super::Error;

/// Error when a relation operation (`load_related`, `query_m2m`, ...) names a
/// field that is not a relation of the required kind.
#[derive(Debug)]
pub(super) struct NotRelation {
    model: Box<str>,
    field: Box<str>,
    expected: &'static str,
}

impl std::error::Error for NotRelation {}

impl core::fmt::Display for NotRelation {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(
            f,
            "field `{}.{}` is not a {}",
            self.model, self.field, self.expected
        )
    }
}

impl Error {
    /// Creates a not-a-relation error. `expected` describes the required
    /// relation kind, e.g. `"relation"` or `"many-to-many relation"`.
    pub fn not_relation(
        model: impl Into<String>,
        field: impl Into<String>,
        expected: &'static str,
    ) -> Error {
        Error::from(super::ErrorKind::NotRelation(NotRelation {
            model: model.into().into(),
            field: field.into().into(),
            expected,
        }))
    }

    /// Returns `true` if this error is a not-a-relation error.
    pub fn is_not_relation(&self) -> bool {
        matches!(self.kind(), super::ErrorKind::NotRelation(_))
    }
}

use super::Error;

/// Error when a bulk update or delete is issued without any filter.
///
/// Full-table mutations must be requested explicitly with
/// `QuerySet::allow_full_table`.
#[derive(Debug)]
pub(super) struct EmptyConditionForbidden {
    table: Box<str>,
}

impl std::error::Error for EmptyConditionForbidden {}

impl core::fmt::Display for EmptyConditionForbidden {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(
            f,
            "refusing to update or delete every row of `{}` without a condition",
            self.table
        )
    }
}

impl Error {
    pub fn empty_condition_forbidden(table: impl Into<String>) -> Error {
        Error::from(super::ErrorKind::EmptyConditionForbidden(
            EmptyConditionForbidden {
                table: table.into().into(),
            },
        ))
    }

    /// Returns `true` if this error is an empty condition error.
    pub fn is_empty_condition_forbidden(&self) -> bool {
        matches!(self.kind(), super::ErrorKind::EmptyConditionForbidden(_))
    }
}

use super::Error;

#[derive(Debug)]
pub(super) struct DuplicateAlias {
    alias: Box<str>,
}

impl std::error::Error for DuplicateAlias {}

impl core::fmt::Display for DuplicateAlias {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "database alias `{}` is already registered", self.alias)
    }
}

impl Error {
    /// Creates a duplicate alias error.
    pub fn duplicate_alias(alias: impl Into<String>) -> Error {
        Error::from(super::ErrorKind::DuplicateAlias(DuplicateAlias {
            alias: alias.into().into(),
        }))
    }

    /// Returns `true` if this error is a duplicate alias error.
    pub fn is_duplicate_alias(&self) -> bool {
        matches!(self.kind(), super::ErrorKind::DuplicateAlias(_))
    }
}

use super::Error;

/// Error when a session is requested for a database alias that was never
/// registered on the builder.
#[derive(Debug)]
pub(super) struct AliasNotRegistered {
    alias: Box<str>,
}

impl std::error::Error for AliasNotRegistered {}

impl core::fmt::Display for AliasNotRegistered {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "database alias `{}` is not registered", self.alias)
    }
}

impl Error {
    pub fn alias_not_registered(alias: impl Into<String>) -> Error {
        Error::from(super::ErrorKind::AliasNotRegistered(AliasNotRegistered {
            alias: alias.into().into(),
        }))
    }

    /// Returns `true` if this error is an alias-not-registered error.
    pub fn is_alias_not_registered(&self) -> bool {
        matches!(self.kind(), super::ErrorKind::AliasNotRegistered(_))
    }
}

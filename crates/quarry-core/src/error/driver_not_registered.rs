use super::Error;

/// Error when a connection URL names a driver that is not compiled in.
///
/// Drivers are enabled with crate features, e.g. `sqlite`.
#[derive(Debug)]
pub(super) struct DriverNotRegistered {
    scheme: Box<str>,
}

impl std::error::Error for DriverNotRegistered {}

impl core::fmt::Display for DriverNotRegistered {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "no driver registered for scheme `{}`", self.scheme)
    }
}

impl Error {
    pub fn driver_not_registered(scheme: impl Into<String>) -> Error {
        Error::from(super::ErrorKind::DriverNotRegistered(DriverNotRegistered {
            scheme: scheme.into().into(),
        }))
    }

    pub fn is_driver_not_registered(&self) -> bool {
        matches!(self.kind(), super::ErrorKind::DriverNotRegistered(_))
    }
}

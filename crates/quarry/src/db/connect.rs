use quarry_core::{driver::Driver, Error, Result};

use url::Url;

/// Picks the driver for a connection URL by its scheme.
///
/// Drivers are compiled in with crate features; a scheme without an
/// enabled driver fails with `DriverNotRegistered`.
pub(crate) fn driver_for_url(url: &str) -> Result<Box<dyn Driver>> {
    let parsed = Url::parse(url)
        .map_err(|err| Error::args(format!("invalid connection URL `{url}`: {err}")))?;

    match parsed.scheme() {
        "sqlite" => connect_sqlite(url),
        scheme => Err(Error::driver_not_registered(scheme)),
    }
}

#[cfg(feature = "sqlite")]
fn connect_sqlite(url: &str) -> Result<Box<dyn Driver>> {
    let driver = quarry_driver_sqlite::Sqlite::new(url)?;
    Ok(Box::new(driver))
}

#[cfg(not(feature = "sqlite"))]
fn connect_sqlite(_url: &str) -> Result<Box<dyn Driver>> {
    Err(Error::driver_not_registered("sqlite"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_scheme() {
        let err = driver_for_url("oracle://localhost/db").unwrap_err();
        assert!(err.is_driver_not_registered());
    }

    #[test]
    fn malformed_url() {
        let err = driver_for_url("not a url").unwrap_err();
        assert!(err.is_args());
    }

    #[cfg(feature = "sqlite")]
    #[test]
    fn sqlite_scheme() {
        let driver = driver_for_url("sqlite::memory:").unwrap();
        assert_eq!(driver.name(), "sqlite");
    }
}

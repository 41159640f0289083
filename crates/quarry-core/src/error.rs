mod adhoc;
mod alias_not_registered;
mod args;
mod cancelled;
mod connection_pool;
mod dangling_relation;
mod deadline_exceeded;
mod driver_not_registered;
mod driver_operation_failed;
mod duplicate_alias;
mod duplicate_model;
mod empty_condition_forbidden;
mod invalid_record_count;
mod invalid_tag;
mod malformed_filter;
mod missing_primary_key;
mod model_not_registered;
mod not_relation;
mod record_not_found;
mod transaction_already_done;
mod transaction_rollback;
mod type_conversion;
mod unknown_field;
mod unsupported_feature;

use adhoc::AdhocError;
use alias_not_registered::AliasNotRegistered;
use args::ArgsError;
use cancelled::Cancelled;
use connection_pool::ConnectionPoolError;
use dangling_relation::DanglingRelation;
use deadline_exceeded::DeadlineExceeded;
use driver_not_registered::DriverNotRegistered;
use driver_operation_failed::DriverOperationFailed;
use duplicate_alias::DuplicateAlias;
use duplicate_model::DuplicateModel;
use empty_condition_forbidden::EmptyConditionForbidden;
use invalid_record_count::InvalidRecordCount;
use invalid_tag::InvalidTag;
use malformed_filter::MalformedFilter;
use missing_primary_key::MissingPrimaryKey;
use model_not_registered::ModelNotRegistered;
use not_relation::NotRelation;
use record_not_found::RecordNotFoundError;
use std::sync::Arc;
use transaction_already_done::TransactionAlreadyDone;
use transaction_rollback::TransactionRollback;
use type_conversion::TypeConversionError;
use unknown_field::UnknownField;
use unsupported_feature::UnsupportedFeature;

/// Returns early with an ad-hoc error built from a format string.
#[macro_export]
macro_rules! bail {
    ($($arg:tt)*) => {
        return Err($crate::Error::from_args(format_args!($($arg)*)))
    };
}

/// Builds an ad-hoc error from a format string.
#[macro_export]
macro_rules! err {
    ($($arg:tt)*) => {
        $crate::Error::from_args(format_args!($($arg)*))
    };
}

/// An error that can occur in Quarry.
///
/// The error is a single pointer wide. Context can be layered on top of an
/// error with [`Error::context`]; `Display` renders the whole chain, most
/// recent context first.
#[derive(Clone)]
pub struct Error {
    inner: Option<Arc<ErrorInner>>,
}

#[derive(Debug)]
struct ErrorInner {
    kind: ErrorKind,
    cause: Option<Error>,
}

/// Conversion into an [`Error`] used by [`Error::context`].
pub trait IntoError {
    fn into_error(self) -> Error;
}

impl IntoError for Error {
    fn into_error(self) -> Error {
        self
    }
}

impl IntoError for &str {
    fn into_error(self) -> Error {
        Error::from_args(format_args!("{self}"))
    }
}

impl IntoError for String {
    fn into_error(self) -> Error {
        Error::from(ErrorKind::Adhoc(AdhocError::new(self)))
    }
}

impl Error {
    /// Adds context to this error.
    ///
    /// Context is displayed in reverse order: the most recently added context is shown first,
    /// followed by earlier context, ending with the root cause.
    #[inline(always)]
    pub fn context(self, consequent: impl IntoError) -> Error {
        self.context_impl(consequent.into_error())
    }

    #[inline(never)]
    #[cold]
    fn context_impl(self, consequent: Error) -> Error {
        let kind = match consequent.inner {
            Some(inner) => match Arc::try_unwrap(inner) {
                Ok(inner) => inner.kind,
                Err(shared) => ErrorKind::Adhoc(AdhocError::new(shared.kind.to_string())),
            },
            None => ErrorKind::Unknown,
        };

        Error {
            inner: Some(Arc::new(ErrorInner {
                kind,
                cause: Some(self),
            })),
        }
    }

    /// Builds an ad-hoc error from formatting arguments. Used by [`bail!`] and [`err!`].
    pub fn from_args(args: core::fmt::Arguments<'_>) -> Error {
        let message = match args.as_str() {
            Some(message) => message.to_string(),
            None => args.to_string(),
        };
        Error::from(ErrorKind::Adhoc(AdhocError::new(message)))
    }

    /// Returns the innermost error of the context chain.
    pub fn root(&self) -> &Error {
        let mut err = self;
        while let Some(cause) = err.inner.as_ref().and_then(|inner| inner.cause.as_ref()) {
            err = cause;
        }
        err
    }

    fn chain(&self) -> impl Iterator<Item = &Error> {
        let mut err = self;
        core::iter::once(err).chain(core::iter::from_fn(move || {
            err = err.inner.as_ref().and_then(|inner| inner.cause.as_ref())?;
            Some(err)
        }))
    }

    /// The kind of the root cause. Predicates look through added context so
    /// that `err.context("loading user").is_record_not_found()` still holds.
    fn kind(&self) -> &ErrorKind {
        self.root()
            .inner
            .as_ref()
            .map(|inner| &inner.kind)
            .unwrap_or(&ErrorKind::Unknown)
    }

    fn own_kind(&self) -> &ErrorKind {
        self.inner
            .as_ref()
            .map(|inner| &inner.kind)
            .unwrap_or(&ErrorKind::Unknown)
    }

    /// Returns `true` for errors caused by registration or configuration
    /// mistakes, as opposed to runtime failures.
    pub fn is_configuration(&self) -> bool {
        use ErrorKind::*;

        matches!(
            self.kind(),
            ModelNotRegistered(_)
                | AliasNotRegistered(_)
                | DriverNotRegistered(_)
                | DuplicateModel(_)
                | DuplicateAlias(_)
                | InvalidTag(_)
                | DanglingRelation(_)
        )
    }

    /// Returns `true` for errors caused by invalid arguments to an operation.
    pub fn is_validation(&self) -> bool {
        use ErrorKind::*;

        matches!(
            self.kind(),
            UnknownField(_)
                | MalformedFilter(_)
                | EmptyConditionForbidden(_)
                | Args(_)
                | MissingPrimaryKey(_)
                | NotRelation(_)
        )
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self.own_kind() {
            ErrorKind::DriverOperationFailed(err) => Some(err),
            ErrorKind::ConnectionPool(err) => Some(err),
            ErrorKind::Anyhow(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        let mut it = self.chain().peekable();
        while let Some(err) = it.next() {
            core::fmt::Display::fmt(err.own_kind(), f)?;
            if it.peek().is_some() {
                f.write_str(": ")?;
            }
        }
        Ok(())
    }
}

impl core::fmt::Debug for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        if !f.alternate() {
            core::fmt::Display::fmt(self, f)
        } else {
            let Some(ref inner) = self.inner else {
                return f.debug_struct("Error").field("kind", &"None").finish();
            };
            f.debug_struct("Error")
                .field("kind", &inner.kind)
                .field("cause", &inner.cause)
                .finish()
        }
    }
}

#[derive(Debug)]
enum ErrorKind {
    Anyhow(anyhow::Error),
    Adhoc(AdhocError),
    // Configuration
    ModelNotRegistered(ModelNotRegistered),
    AliasNotRegistered(AliasNotRegistered),
    DriverNotRegistered(DriverNotRegistered),
    DuplicateModel(DuplicateModel),
    DuplicateAlias(DuplicateAlias),
    InvalidTag(InvalidTag),
    DanglingRelation(DanglingRelation),
    // Validation
    UnknownField(UnknownField),
    MalformedFilter(MalformedFilter),
    EmptyConditionForbidden(EmptyConditionForbidden),
    Args(ArgsError),
    MissingPrimaryKey(MissingPrimaryKey),
    NotRelation(NotRelation),
    // Results
    RecordNotFound(RecordNotFoundError),
    InvalidRecordCount(InvalidRecordCount),
    TypeConversion(TypeConversionError),
    // Transactions
    TransactionAlreadyDone(TransactionAlreadyDone),
    TransactionRollback(TransactionRollback),
    // Driver
    DriverOperationFailed(DriverOperationFailed),
    ConnectionPool(ConnectionPoolError),
    UnsupportedFeature(UnsupportedFeature),
    // Context
    Cancelled(Cancelled),
    DeadlineExceeded(DeadlineExceeded),
    Unknown,
}

impl core::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        use self::ErrorKind::*;

        match self {
            Anyhow(err) => core::fmt::Display::fmt(err, f),
            Adhoc(err) => core::fmt::Display::fmt(err, f),
            ModelNotRegistered(err) => core::fmt::Display::fmt(err, f),
            AliasNotRegistered(err) => core::fmt::Display::fmt(err, f),
            DriverNotRegistered(err) => core::fmt::Display::fmt(err, f),
            DuplicateModel(err) => core::fmt::Display::fmt(err, f),
            DuplicateAlias(err) => core::fmt::Display::fmt(err, f),
            InvalidTag(err) => core::fmt::Display::fmt(err, f),
            DanglingRelation(err) => core::fmt::Display::fmt(err, f),
            UnknownField(err) => core::fmt::Display::fmt(err, f),
            MalformedFilter(err) => core::fmt::Display::fmt(err, f),
            EmptyConditionForbidden(err) => core::fmt::Display::fmt(err, f),
            Args(err) => core::fmt::Display::fmt(err, f),
            MissingPrimaryKey(err) => core::fmt::Display::fmt(err, f),
            NotRelation(err) => core::fmt::Display::fmt(err, f),
            RecordNotFound(err) => core::fmt::Display::fmt(err, f),
            InvalidRecordCount(err) => core::fmt::Display::fmt(err, f),
            TypeConversion(err) => core::fmt::Display::fmt(err, f),
            TransactionAlreadyDone(err) => core::fmt::Display::fmt(err, f),
            TransactionRollback(err) => core::fmt::Display::fmt(err, f),
            DriverOperationFailed(err) => core::fmt::Display::fmt(err, f),
            ConnectionPool(err) => core::fmt::Display::fmt(err, f),
            UnsupportedFeature(err) => core::fmt::Display::fmt(err, f),
            Cancelled(err) => core::fmt::Display::fmt(err, f),
            DeadlineExceeded(err) => core::fmt::Display::fmt(err, f),
            Unknown => f.write_str("unknown quarry error"),
        }
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Error {
        Error {
            inner: Some(Arc::new(ErrorInner { kind, cause: None })),
        }
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Error {
        Error::from(ErrorKind::Anyhow(err))
    }
}

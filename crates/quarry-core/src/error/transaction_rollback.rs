use super::Error;

/// Error returned by a transaction body to request a rollback without
/// reporting a failure of its own.
#[derive(Debug)]
pub(super) struct TransactionRollback;

impl std::error::Error for TransactionRollback {}

impl core::fmt::Display for TransactionRollback {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        f.write_str("transaction rolled back by caller")
    }
}

impl Error {
    /// Creates a caller-raised rollback error.
    ///
    /// Returning this from the closure passed to `run_in_transaction` rolls
    /// the transaction back; the error is then handed back to the caller.
    pub fn transaction_rollback() -> Error {
        Error::from(super::ErrorKind::TransactionRollback(TransactionRollback))
    }

    /// Returns `true` if this error is a caller-raised rollback.
    pub fn is_transaction_rollback(&self) -> bool {
        matches!(self.kind(), super::ErrorKind::TransactionRollback(_))
    }
}

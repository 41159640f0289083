use super::Error;

/// Error when a transaction is used after it was committed or rolled back.
#[derive(Debug)]
pub(super) struct TransactionAlreadyDone;

impl std::error::Error for TransactionAlreadyDone {}

impl core::fmt::Display for TransactionAlreadyDone {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        f.write_str("transaction has already been committed or rolled back")
    }
}

impl Error {
    pub fn transaction_already_done() -> Error {
        Error::from(super::ErrorKind::TransactionAlreadyDone(
            TransactionAlreadyDone,
        ))
    }

    /// Returns `true` if this error is a transaction-already-done error.
    pub fn is_transaction_already_done(&self) -> bool {
        matches!(self.kind(), super::ErrorKind::TransactionAlreadyDone(_))
    }
}

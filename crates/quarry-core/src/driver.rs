mod capability;
pub use capability::{Capability, Dialect, StorageTypes};

mod response;
pub use response::{Response, Rows};

pub mod operation;
pub use operation::{IsolationLevel, Operation, Sql, Transaction};

use crate::async_trait;

use std::fmt::Debug;

/// A database backend.
///
/// The driver hands out connections; pooling and transactions are handled
/// above it.
#[async_trait]
pub trait Driver: Debug + Send + Sync + 'static {
    /// Short name of the backend, e.g. `"sqlite"`.
    fn name(&self) -> &'static str;

    /// Describes the driver's capability, which selects the SQL flavor.
    fn capability(&self) -> &'static Capability;

    /// Opens a new connection.
    async fn connect(&self) -> crate::Result<Box<dyn Connection>>;

    /// Upper bound on concurrent connections, if the backend has one (an
    /// in-memory SQLite database only exists on a single connection).
    fn max_connections(&self) -> Option<usize> {
        None
    }
}

/// A single connection to the database.
#[async_trait]
pub trait Connection: Debug + Send + 'static {
    /// Execute a database operation
    async fn exec(&mut self, op: Operation) -> crate::Result<Response>;
}

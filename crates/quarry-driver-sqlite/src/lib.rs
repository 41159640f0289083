mod value;
pub(crate) use value::Value;

use quarry_core::{
    async_trait,
    driver::{
        operation::{IsolationLevel, Operation, Sql, Transaction},
        Capability, Driver, Response,
    },
    Error, Result,
};
use quarry_sql::Serializer;
use rusqlite::Connection as RusqliteConnection;
use std::path::{Path, PathBuf};
use url::Url;

#[derive(Debug)]
pub enum Sqlite {
    File(PathBuf),
    InMemory,
}

impl Sqlite {
    /// Create a new SQLite driver from a connection URL.
    ///
    /// `sqlite::memory:` opens an in-memory database, `sqlite:path/to/db`
    /// (or `sqlite:///abs/path`) a database file.
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let url_str = url.into();
        let url = Url::parse(&url_str).map_err(Error::driver_operation_failed)?;

        if url.scheme() != "sqlite" {
            return Err(Error::driver_not_registered(url.scheme()));
        }

        if url.path() == ":memory:" {
            Ok(Self::InMemory)
        } else {
            Ok(Self::File(PathBuf::from(url.path())))
        }
    }

    /// Create an in-memory SQLite database
    pub fn in_memory() -> Self {
        Self::InMemory
    }

    /// Open a SQLite database at the specified file path
    pub fn open<P: AsRef<Path>>(path: P) -> Self {
        Self::File(path.as_ref().to_path_buf())
    }
}

#[async_trait]
impl Driver for Sqlite {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn capability(&self) -> &'static Capability {
        &Capability::SQLITE
    }

    async fn connect(&self) -> Result<Box<dyn quarry_core::Connection>> {
        let connection = match self {
            Sqlite::File(path) => Connection::open(path)?,
            Sqlite::InMemory => Connection::in_memory()?,
        };
        Ok(Box::new(connection))
    }

    fn max_connections(&self) -> Option<usize> {
        // Every in-memory connection is a separate database.
        matches!(self, Self::InMemory).then_some(1)
    }
}

#[derive(Debug)]
pub struct Connection {
    connection: RusqliteConnection,
}

impl Connection {
    pub fn in_memory() -> Result<Self> {
        let connection =
            RusqliteConnection::open_in_memory().map_err(Error::driver_operation_failed)?;
        Self::init(connection)
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        tracing::debug!(path = %path.as_ref().display(), "opening sqlite database");

        let connection = RusqliteConnection::open(path).map_err(Error::driver_operation_failed)?;
        Self::init(connection)
    }

    fn init(connection: RusqliteConnection) -> Result<Self> {
        // `contains` and friends are case sensitive; the `i` variants lower
        // both sides explicitly.
        connection
            .execute_batch("PRAGMA case_sensitive_like = ON;")
            .map_err(Error::driver_operation_failed)?;

        Ok(Self { connection })
    }

    fn execute(&mut self, sql: &Sql) -> Result<Response> {
        let mut stmt = self
            .connection
            .prepare_cached(&sql.sql)
            .map_err(Error::driver_operation_failed)?;

        let params = sql.params.iter().cloned().map(Value::from);
        let count = stmt
            .execute(rusqlite::params_from_iter(params))
            .map_err(Error::driver_operation_failed)?;

        Ok(Response::inserted(
            count as u64,
            self.connection.last_insert_rowid(),
        ))
    }

    fn query(&mut self, sql: &Sql) -> Result<Response> {
        let mut stmt = self
            .connection
            .prepare_cached(&sql.sql)
            .map_err(Error::driver_operation_failed)?;

        let columns: Vec<String> = stmt
            .column_names()
            .into_iter()
            .map(str::to_string)
            .collect();
        let width = columns.len();

        let params = sql.params.iter().cloned().map(Value::from);
        let mut rows = stmt
            .query(rusqlite::params_from_iter(params))
            .map_err(Error::driver_operation_failed)?;

        let mut ret = vec![];

        loop {
            match rows.next() {
                Ok(Some(row)) => {
                    let mut items = Vec::with_capacity(width);

                    for index in 0..width {
                        let value =
                            Value::from_sql(row, index).map_err(Error::driver_operation_failed)?;
                        items.push(value.into_inner());
                    }

                    ret.push(items);
                }
                Ok(None) => break,
                Err(err) => {
                    return Err(Error::driver_operation_failed(err));
                }
            }
        }

        Ok(Response::values(columns, ret))
    }

    fn transaction(&mut self, op: Transaction) -> Result<Response> {
        if let Transaction::Start {
            isolation,
            read_only,
        } = op
        {
            // SQLite transactions are always serializable.
            if !matches!(isolation, None | Some(IsolationLevel::Serializable)) {
                return Err(Error::unsupported_feature(
                    "SQLite only supports serializable transactions",
                ));
            }
            if read_only {
                return Err(Error::unsupported_feature(
                    "SQLite does not support read-only transactions",
                ));
            }
        }

        let sql = Serializer::sqlite().serialize_transaction(&op);
        self.connection
            .execute_batch(&sql)
            .map_err(Error::driver_operation_failed)?;

        Ok(Response::count(0))
    }
}

#[async_trait]
impl quarry_core::driver::Connection for Connection {
    async fn exec(&mut self, op: Operation) -> Result<Response> {
        match op {
            Operation::Execute(sql) => self.execute(&sql),
            Operation::Query(sql) => self.query(&sql),
            Operation::Transaction(op) => self.transaction(op),
        }
    }
}

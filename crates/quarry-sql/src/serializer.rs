#[macro_use]
mod fmt;
use fmt::ToSql;

mod delim;
use delim::Comma;

mod flavor;

mod ident;
use ident::Ident;

mod params;
pub use params::{Params, Placeholder};

mod raw;

// Fragment serializers
mod column_def;
mod expr;
mod statement;
mod value;

use crate::stmt::Statement;

use quarry_core::{
    driver::{Capability, Dialect, IsolationLevel, Transaction},
    stmt::Value,
};

/// Serialize a statement to a SQL string
///
/// The serializer holds no connection state. It is built once per flavor
/// and shared by every session of a database alias.
#[derive(Debug, Clone, Copy)]
pub struct Serializer {
    /// The database capability handles the differences between SQL dialects
    /// and supported features.
    capability: &'static Capability,
}

struct Formatter<'a, T> {
    /// Handle to the serializer
    serializer: &'a Serializer,

    /// Where to write the serialized SQL
    dst: &'a mut String,

    /// Where to store parameters
    params: &'a mut T,
}

impl Serializer {
    pub fn serialize(&self, stmt: &Statement, params: &mut impl Params) -> String {
        let mut ret = String::new();

        let mut fmt = Formatter {
            serializer: self,
            dst: &mut ret,
            params,
        };

        stmt.to_sql(&mut fmt);

        ret.push(';');
        ret
    }

    /// Serialize a transaction control operation to a SQL string.
    ///
    /// The generated SQL is flavor-specific (e.g., MySQL uses `START TRANSACTION`
    /// while other databases use `BEGIN`).
    pub fn serialize_transaction(&self, op: &Transaction) -> String {
        match op {
            Transaction::Start {
                isolation,
                read_only,
            } => self.serialize_transaction_start(*isolation, *read_only),
            Transaction::Commit => "COMMIT".to_string(),
            Transaction::Rollback => "ROLLBACK".to_string(),
        }
    }

    fn serialize_transaction_start(
        &self,
        isolation: Option<IsolationLevel>,
        read_only: bool,
    ) -> String {
        match self.dialect() {
            Dialect::Mysql => {
                let mut sql = String::new();
                if let Some(level) = isolation {
                    sql.push_str("SET TRANSACTION ISOLATION LEVEL ");
                    sql.push_str(level.sql_name());
                    sql.push_str("; ");
                }
                sql.push_str("START TRANSACTION");
                if read_only {
                    sql.push_str(" READ ONLY");
                }
                sql
            }
            Dialect::Postgresql => {
                let mut sql = String::from("BEGIN");
                if let Some(level) = isolation {
                    sql.push_str(" ISOLATION LEVEL ");
                    sql.push_str(level.sql_name());
                }
                if read_only {
                    sql.push_str(" READ ONLY");
                }
                sql
            }
            Dialect::Sqlite => {
                // SQLite doesn't support per-transaction isolation levels or read-only mode
                "BEGIN".to_string()
            }
        }
    }

    /// Converts a value to the representation bound for this flavor.
    pub fn bind(&self, value: &Value) -> Value {
        match value {
            Value::Bool(v) if !self.capability.native_bool => Value::I64(*v as i64),
            value => value.clone(),
        }
    }

    pub fn capability(&self) -> &'static Capability {
        self.capability
    }

    pub fn dialect(&self) -> Dialect {
        self.capability.dialect
    }

    fn is_sqlite(&self) -> bool {
        self.dialect() == Dialect::Sqlite
    }

    fn is_postgresql(&self) -> bool {
        self.dialect() == Dialect::Postgresql
    }

    fn is_mysql(&self) -> bool {
        self.dialect() == Dialect::Mysql
    }
}

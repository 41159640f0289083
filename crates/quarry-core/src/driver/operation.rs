use crate::stmt::Value;

/// Work sent to a [`Connection`](super::Connection).
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    /// A statement that does not return rows. Answered with
    /// [`Rows::Count`](super::Rows::Count).
    Execute(Sql),

    /// A statement that returns rows. Answered with
    /// [`Rows::Values`](super::Rows::Values).
    Query(Sql),

    Transaction(Transaction),
}

/// Rendered SQL with its ordered parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Sql {
    pub sql: String,
    pub params: Vec<Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transaction {
    Start {
        isolation: Option<IsolationLevel>,
        read_only: bool,
    },
    Commit,
    Rollback,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IsolationLevel {
    ReadUncommitted,
    ReadCommitted,
    RepeatableRead,
    Serializable,
}

impl IsolationLevel {
    /// Returns the ANSI SQL name, usable in PostgreSQL and MySQL.
    pub fn sql_name(&self) -> &'static str {
        match self {
            IsolationLevel::ReadUncommitted => "READ UNCOMMITTED",
            IsolationLevel::ReadCommitted => "READ COMMITTED",
            IsolationLevel::RepeatableRead => "REPEATABLE READ",
            IsolationLevel::Serializable => "SERIALIZABLE",
        }
    }
}

impl Sql {
    pub fn new(sql: impl Into<String>, params: Vec<Value>) -> Sql {
        Sql {
            sql: sql.into(),
            params,
        }
    }
}

mod column_def;
pub use column_def::{ColumnDef, ColumnType, DEFAULT_VARCHAR_SIZE};

mod create_index;
pub use create_index::CreateIndex;

mod create_table;
pub use create_table::CreateTable;

pub use quarry_core::stmt::*;

use quarry_core::{driver::Capability, schema::Model};

/// Statements the serializer can render: the core DML statements plus
/// schema definition.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    CreateIndex(CreateIndex),
    CreateTable(CreateTable),
    Delete(Delete),
    Insert(Insert),
    Select(Select),
    Update(Update),
}

impl Statement {
    /// Statements creating the table of `model` and its indexes.
    ///
    /// MySQL has no `CREATE INDEX IF NOT EXISTS`, so its indexes are declared
    /// inside `CREATE TABLE`.
    pub fn create_schema(model: &Model, capability: &Capability) -> Vec<Statement> {
        let mut table = CreateTable::from_model(model, capability);
        let indices = CreateIndex::from_model(model);

        if capability.dialect == quarry_core::driver::Dialect::Mysql {
            table.indices = indices;
            vec![table.into()]
        } else {
            std::iter::once(table.into())
                .chain(indices.into_iter().map(Statement::from))
                .collect()
        }
    }

    /// Returns `true` when executing the statement yields rows.
    pub fn returns_rows(&self) -> bool {
        match self {
            Statement::Select(_) => true,
            Statement::Insert(insert) => insert.returning.is_some(),
            _ => false,
        }
    }
}

impl From<quarry_core::stmt::Statement> for Statement {
    fn from(value: quarry_core::stmt::Statement) -> Self {
        match value {
            quarry_core::stmt::Statement::Delete(stmt) => Statement::Delete(stmt),
            quarry_core::stmt::Statement::Insert(stmt) => Statement::Insert(stmt),
            quarry_core::stmt::Statement::Select(stmt) => Statement::Select(stmt),
            quarry_core::stmt::Statement::Update(stmt) => Statement::Update(stmt),
        }
    }
}

impl From<Select> for Statement {
    fn from(value: Select) -> Self {
        Statement::Select(value)
    }
}

impl From<Insert> for Statement {
    fn from(value: Insert) -> Self {
        Statement::Insert(value)
    }
}

impl From<Update> for Statement {
    fn from(value: Update) -> Self {
        Statement::Update(value)
    }
}

impl From<Delete> for Statement {
    fn from(value: Delete) -> Self {
        Statement::Delete(value)
    }
}

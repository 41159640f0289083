use super::{ColumnDef, CreateIndex, Statement};

use quarry_core::{driver::Capability, schema::Model};

#[derive(Debug, Clone, PartialEq)]
pub struct CreateTable {
    /// Name of the table
    pub name: String,

    /// Column definitions
    pub columns: Vec<ColumnDef>,

    /// Indexes declared inline (MySQL only)
    pub indices: Vec<CreateIndex>,
}

impl CreateTable {
    pub fn from_model(model: &Model, capability: &Capability) -> CreateTable {
        CreateTable {
            name: model.table_name.clone(),
            columns: model
                .fields
                .iter()
                .filter_map(|field| ColumnDef::from_field(field, capability))
                .collect(),
            indices: vec![],
        }
    }
}

impl From<CreateTable> for Statement {
    fn from(value: CreateTable) -> Self {
        Self::CreateTable(value)
    }
}

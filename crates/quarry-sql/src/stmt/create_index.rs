use super::Statement;

use quarry_core::schema::Model;

#[derive(Debug, Clone, PartialEq)]
pub struct CreateIndex {
    pub name: String,
    pub table: String,
    pub columns: Vec<String>,
    pub unique: bool,
}

impl CreateIndex {
    /// Indexes of `model`: one per field flagged `index`, then the composite
    /// ones.
    pub fn from_model(model: &Model) -> Vec<CreateIndex> {
        let single = model
            .columns()
            .filter(|field| field.index && !field.unique && !field.primary_key)
            .map(|field| CreateIndex {
                name: format!("{}_{}", model.table_name, field.column),
                table: model.table_name.clone(),
                columns: vec![field.column.clone()],
                unique: false,
            });

        let composite = model.indices.iter().map(|index| CreateIndex {
            name: index.name.clone(),
            table: model.table_name.clone(),
            columns: index.columns.clone(),
            unique: index.unique,
        });

        single.chain(composite).collect()
    }
}

impl From<CreateIndex> for Statement {
    fn from(value: CreateIndex) -> Self {
        Self::CreateIndex(value)
    }
}

use super::{Field, FieldId};

/// Identifies a model in the [`Registry`](super::Registry).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModelId(pub usize);

/// Immutable per-type metadata, built once by the registry.
#[derive(Debug, Clone, PartialEq)]
pub struct Model {
    pub id: ModelId,
    /// Fully-qualified name, unique within the registry.
    pub name: String,
    pub table_name: String,
    pub fields: Vec<Field>,
    /// Index of the primary key in `fields`.
    pub primary_key: usize,
    /// Set for generated many-to-many join models.
    pub is_through: bool,
    pub indices: Vec<Index>,
}

/// A composite index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Index {
    pub name: String,
    /// Column names, in declaration order.
    pub columns: Vec<String>,
    pub unique: bool,
}

impl Model {
    pub fn field(&self, index: usize) -> &Field {
        &self.fields[index]
    }

    pub fn field_id(&self, index: usize) -> FieldId {
        FieldId {
            model: self.id,
            index,
        }
    }

    /// Finds a field by name, falling back to its column name.
    pub fn field_by_name(&self, name: &str) -> Option<&Field> {
        self.fields
            .iter()
            .find(|field| field.name == name)
            .or_else(|| {
                self.fields
                    .iter()
                    .find(|field| field.has_column() && field.column == name)
            })
    }

    pub fn primary_key(&self) -> &Field {
        &self.fields[self.primary_key]
    }

    /// Fields stored as columns, in declaration order.
    pub fn columns(&self) -> impl Iterator<Item = &Field> + '_ {
        self.fields.iter().filter(|field| field.has_column())
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns().map(|field| field.column.clone()).collect()
    }

    /// Short name used in messages: the last path segment of the model name.
    pub fn short_name(&self) -> &str {
        short_name(&self.name)
    }
}

pub(crate) fn short_name(name: &str) -> &str {
    let base = name.split('<').next().unwrap_or(name);
    base.rsplit("::").next().unwrap_or(base)
}

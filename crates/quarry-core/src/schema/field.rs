use super::{ModelId, Relation};
use crate::stmt::{Type, Value};

/// Identifies a field by model and position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldId {
    pub model: ModelId,
    pub index: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub id: FieldId,
    pub name: String,
    /// Column name. Relations without a column (reverse and many-to-many)
    /// keep their field name here.
    pub column: String,
    pub ty: FieldTy,
    pub nullable: bool,
    pub primary_key: bool,
    pub auto: bool,
    pub size: Option<u32>,
    pub precision: Option<Precision>,
    pub default: Option<Value>,
    pub unique: bool,
    pub index: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldTy {
    Primitive(Type),
    /// `key` is the storage type of the column for forward relations: the
    /// target's primary key type.
    Relation { relation: Relation, key: Type },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Precision {
    pub digits: u8,
    pub decimals: u8,
}

impl Field {
    /// Returns `true` when the field is stored in a column of its model.
    pub fn has_column(&self) -> bool {
        match &self.ty {
            FieldTy::Primitive(_) => true,
            FieldTy::Relation { relation, .. } => relation.kind.is_forward(),
        }
    }

    /// Type of the value stored in the column, `None` for fields without a
    /// column.
    pub fn storage_ty(&self) -> Option<Type> {
        match &self.ty {
            FieldTy::Primitive(ty) => Some(*ty),
            FieldTy::Relation { relation, key } => relation.kind.is_forward().then_some(*key),
        }
    }

    pub fn relation(&self) -> Option<&Relation> {
        match &self.ty {
            FieldTy::Relation { relation, .. } => Some(relation),
            FieldTy::Primitive(_) => None,
        }
    }

    pub fn is_relation(&self) -> bool {
        self.relation().is_some()
    }
}

use quarry_core::{
    driver::Capability,
    schema::{Field, Precision},
    stmt::{Type, Value},
};

/// Default length of a string column declared without `size`.
pub const DEFAULT_VARCHAR_SIZE: u32 = 255;

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDef {
    pub name: String,
    pub ty: ColumnType,
    pub nullable: bool,
    pub primary_key: bool,
    pub auto_increment: bool,
    pub unique: bool,
    pub default: Option<Value>,
}

/// Storage type of a column, before it is spelled out for a flavor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Scalar(Type),
    VarChar(u32),
    Decimal(Precision),
}

impl ColumnDef {
    pub(crate) fn from_field(field: &Field, capability: &Capability) -> Option<ColumnDef> {
        let ty = field.storage_ty()?;

        let ty = match (ty, field.precision) {
            (_, Some(precision)) => ColumnType::Decimal(precision),
            (Type::String, _) => {
                let size = field.size.unwrap_or(DEFAULT_VARCHAR_SIZE);
                if u64::from(size) > capability.storage_types.varchar {
                    ColumnType::Scalar(Type::Text)
                } else {
                    ColumnType::VarChar(size)
                }
            }
            (ty, None) => ColumnType::Scalar(ty),
        };

        Some(ColumnDef {
            name: field.column.clone(),
            ty,
            nullable: field.nullable,
            primary_key: field.primary_key,
            auto_increment: field.auto,
            unique: field.unique && !field.primary_key,
            default: field.default.clone(),
        })
    }
}

use crate::stmt::{Type, Value};

use super::RelationKind;

/// Registration-time description of a model, returned by `Model::schema()`.
///
/// ```
/// use quarry_core::schema::{FieldDef, ModelDef};
/// use quarry_core::stmt::Type;
///
/// struct User;
///
/// let def = ModelDef::new::<User>()
///     .field(FieldDef::new("id", Type::I64).auto())
///     .field(FieldDef::new("name", Type::String).size(100).index())
///     .field(FieldDef::new("email", Type::String).unique());
/// assert_eq!(def.name(), std::any::type_name::<User>());
/// ```
#[derive(Debug, Clone)]
pub struct ModelDef {
    pub(crate) name: String,
    pub(crate) table: Option<String>,
    pub(crate) fields: Vec<FieldDef>,
    pub(crate) indices: Vec<IndexDef>,
}

/// A composite index declared on the model.
#[derive(Debug, Clone)]
pub(crate) struct IndexDef {
    pub(crate) fields: Vec<String>,
    pub(crate) unique: bool,
}

#[derive(Debug, Clone)]
pub struct FieldDef {
    pub(crate) name: String,
    pub(crate) column: Option<String>,
    pub(crate) kind: FieldDefKind,
    pub(crate) nullable: bool,
    pub(crate) primary_key: bool,
    pub(crate) auto: bool,
    pub(crate) size: Option<u32>,
    pub(crate) digits: Option<u8>,
    pub(crate) decimals: Option<u8>,
    pub(crate) default: Option<Value>,
    pub(crate) unique: bool,
    pub(crate) index: bool,
    pub(crate) via: Option<String>,
    pub(crate) through_table: Option<String>,
}

#[derive(Debug, Clone)]
pub(crate) enum FieldDefKind {
    Primitive(Type),
    Relation(RelationDef),
}

#[derive(Debug, Clone)]
pub(crate) struct RelationDef {
    /// One of `ForeignKey`, `OneToOne`, `ReverseOne`, `ReverseMany` or
    /// `ManyToMany`. `ReverseManyToMany` is inferred when resolving.
    pub(crate) kind: RelationKind,
    pub(crate) target: String,
}

impl ModelDef {
    /// Starts a declaration for `T`, keyed by its fully-qualified type name.
    pub fn new<T: ?Sized + 'static>() -> ModelDef {
        ModelDef::named(std::any::type_name::<T>())
    }

    /// Starts a declaration under an explicit model name.
    pub fn named(name: impl Into<String>) -> ModelDef {
        ModelDef {
            name: name.into(),
            table: None,
            fields: vec![],
            indices: vec![],
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Overrides the table name. Prefix and suffix are not applied to an
    /// explicit table name.
    pub fn table(mut self, table: impl Into<String>) -> ModelDef {
        self.table = Some(table.into());
        self
    }

    pub fn field(mut self, field: FieldDef) -> ModelDef {
        self.fields.push(field);
        self
    }

    /// Declares a composite index over the named fields.
    pub fn index(mut self, fields: &[&str]) -> ModelDef {
        self.indices.push(IndexDef {
            fields: fields.iter().map(|f| f.to_string()).collect(),
            unique: false,
        });
        self
    }

    /// Declares a composite unique constraint over the named fields.
    pub fn unique_together(mut self, fields: &[&str]) -> ModelDef {
        self.indices.push(IndexDef {
            fields: fields.iter().map(|f| f.to_string()).collect(),
            unique: true,
        });
        self
    }

    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }
}

impl FieldDef {
    pub fn new(name: impl Into<String>, ty: Type) -> FieldDef {
        FieldDef::with_kind(name, FieldDefKind::Primitive(ty))
    }

    /// Many-to-one relation to `T`. Owns a column holding `T`'s primary key.
    pub fn foreign_key<T: ?Sized + 'static>(name: impl Into<String>) -> FieldDef {
        FieldDef::relation::<T>(name, RelationKind::ForeignKey)
    }

    /// One-to-one relation to `T`. Owns a unique column holding `T`'s
    /// primary key.
    pub fn one_to_one<T: ?Sized + 'static>(name: impl Into<String>) -> FieldDef {
        FieldDef::relation::<T>(name, RelationKind::OneToOne)
    }

    /// Reverse side of a `one_to_one` declared on `T`.
    pub fn reverse_one<T: ?Sized + 'static>(name: impl Into<String>) -> FieldDef {
        FieldDef::relation::<T>(name, RelationKind::ReverseOne)
    }

    /// Reverse side of a `foreign_key` or `many_to_many` declared on `T`.
    pub fn reverse_many<T: ?Sized + 'static>(name: impl Into<String>) -> FieldDef {
        FieldDef::relation::<T>(name, RelationKind::ReverseMany)
    }

    /// Many-to-many relation to `T` through a generated join table.
    pub fn many_to_many<T: ?Sized + 'static>(name: impl Into<String>) -> FieldDef {
        FieldDef::relation::<T>(name, RelationKind::ManyToMany)
    }

    fn relation<T: ?Sized + 'static>(name: impl Into<String>, kind: RelationKind) -> FieldDef {
        FieldDef::with_kind(
            name,
            FieldDefKind::Relation(RelationDef {
                kind,
                target: std::any::type_name::<T>().to_string(),
            }),
        )
    }

    fn with_kind(name: impl Into<String>, kind: FieldDefKind) -> FieldDef {
        FieldDef {
            name: name.into(),
            column: None,
            kind,
            nullable: false,
            primary_key: false,
            auto: false,
            size: None,
            digits: None,
            decimals: None,
            default: None,
            unique: false,
            index: false,
            via: None,
            through_table: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Overrides the column name (default: the field name).
    pub fn column(mut self, column: impl Into<String>) -> FieldDef {
        self.column = Some(column.into());
        self
    }

    pub fn pk(mut self) -> FieldDef {
        self.primary_key = true;
        self
    }

    /// Auto-increment identity. Implies primary key.
    pub fn auto(mut self) -> FieldDef {
        self.auto = true;
        self.primary_key = true;
        self
    }

    pub fn null(mut self) -> FieldDef {
        self.nullable = true;
        self
    }

    /// Maximum length of a string column.
    pub fn size(mut self, size: u32) -> FieldDef {
        self.size = Some(size);
        self
    }

    /// Total number of digits of a float column.
    pub fn digits(mut self, digits: u8) -> FieldDef {
        self.digits = Some(digits);
        self
    }

    /// Digits after the decimal point of a float column.
    pub fn decimals(mut self, decimals: u8) -> FieldDef {
        self.decimals = Some(decimals);
        self
    }

    pub fn default(mut self, value: impl Into<Value>) -> FieldDef {
        self.default = Some(value.into());
        self
    }

    pub fn unique(mut self) -> FieldDef {
        self.unique = true;
        self
    }

    pub fn index(mut self) -> FieldDef {
        self.index = true;
        self
    }

    /// Names the reciprocal field on the target model. Needed when the
    /// target has more than one relation back to this model.
    pub fn via(mut self, field: impl Into<String>) -> FieldDef {
        self.via = Some(field.into());
        self
    }

    /// Overrides the generated join table name of a many-to-many relation.
    pub fn through_table(mut self, table: impl Into<String>) -> FieldDef {
        self.through_table = Some(table.into());
        self
    }
}

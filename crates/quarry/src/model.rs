use quarry_core::{schema::ModelDef, stmt::Value, Result};

/// A record type persisted by Quarry.
///
/// Implementations describe their fields once in [`Model::schema`] and give
/// indexed access to them. Indices follow the declaration order of the
/// fields in the returned [`ModelDef`].
///
/// ```
/// use quarry::{FieldDef, Model, ModelDef, Result, Type, Value};
///
/// #[derive(Debug, Default)]
/// struct User {
///     id: i64,
///     name: String,
/// }
///
/// impl Model for User {
///     fn schema() -> ModelDef {
///         ModelDef::new::<User>()
///             .field(FieldDef::new("id", Type::I64).auto())
///             .field(FieldDef::new("name", Type::String).size(100))
///     }
///
///     fn value(&self, index: usize) -> Value {
///         match index {
///             0 => self.id.into(),
///             1 => (&self.name).into(),
///             _ => Value::Null,
///         }
///     }
///
///     fn set_value(&mut self, index: usize, value: Value) -> Result<()> {
///         match index {
///             0 => self.id = value.to()?,
///             1 => self.name = value.to()?,
///             _ => {}
///         }
///         Ok(())
///     }
/// }
/// ```
pub trait Model: Default + Send + Sized + 'static {
    /// Declares the table, fields and relations of the model.
    fn schema() -> ModelDef;

    /// Returns the value of the field at `index`.
    ///
    /// For a foreign key or one-to-one field this is the key of the related
    /// row. Fields without a column return `Value::Null`.
    fn value(&self, index: usize) -> Value;

    /// Sets the field at `index` from a value already converted to the
    /// field's type.
    fn set_value(&mut self, index: usize, value: Value) -> Result<()>;

    /// Installs related rows loaded for the relation field at `index`.
    fn set_related(&mut self, index: usize, rows: Vec<Record>) -> Result<()> {
        let _ = (index, rows);
        Ok(())
    }

    /// Builds an instance from a mapped row.
    fn load(record: Record) -> Result<Self> {
        let mut model = Self::default();
        record.apply(&mut model)?;
        Ok(model)
    }
}

/// A row mapped onto the fields of a model.
///
/// Values are indexed like the model's fields and already converted to the
/// field types. Related rows preloaded for relation fields travel along.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    pub(crate) values: Vec<Option<Value>>,
    pub(crate) related: Vec<(usize, Vec<Record>)>,
}

impl Record {
    pub(crate) fn new(width: usize) -> Record {
        Record {
            values: vec![None; width],
            related: vec![],
        }
    }

    /// Value of the field at `index`, if it was selected.
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index).and_then(Option::as_ref)
    }

    pub(crate) fn set(&mut self, index: usize, value: Value) {
        self.values[index] = Some(value);
    }

    /// Related rows preloaded for the relation field at `index`.
    pub fn related(&self, index: usize) -> Option<&[Record]> {
        self.related
            .iter()
            .find(|(field, _)| *field == index)
            .map(|(_, rows)| &rows[..])
    }

    /// Writes every selected value and preloaded relation into `model`.
    pub fn apply<M: Model>(self, model: &mut M) -> Result<()> {
        for (index, value) in self.values.into_iter().enumerate() {
            if let Some(value) = value {
                model.set_value(index, value)?;
            }
        }

        for (index, rows) in self.related {
            model.set_related(index, rows)?;
        }

        Ok(())
    }
}

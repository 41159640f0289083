use quarry_core::stmt::Value as CoreValue;
use rusqlite::{
    types::{ToSql, ToSqlOutput, Value as SqlValue, ValueRef},
    Row,
};

/// Bridges a core value to and from SQLite's storage classes.
#[derive(Debug)]
pub struct Value(CoreValue);

impl From<CoreValue> for Value {
    fn from(value: CoreValue) -> Self {
        Self(value)
    }
}

impl Value {
    pub fn into_inner(self) -> CoreValue {
        self.0
    }

    /// Reads column `index` of `row`. Values come back in their storage
    /// class; narrowing to the field type happens when the row is mapped.
    pub fn from_sql(row: &Row<'_>, index: usize) -> rusqlite::Result<Self> {
        let core_value = match row.get_ref(index)? {
            ValueRef::Null => CoreValue::Null,
            ValueRef::Integer(value) => CoreValue::I64(value),
            ValueRef::Real(value) => CoreValue::F64(value),
            // Text that is not UTF-8 is handed back as bytes.
            ValueRef::Text(value) => match std::str::from_utf8(value) {
                Ok(text) => CoreValue::String(text.to_string()),
                Err(_) => CoreValue::Bytes(value.to_vec()),
            },
            ValueRef::Blob(value) => CoreValue::Bytes(value.to_vec()),
        };

        Ok(Value(core_value))
    }
}

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        match &self.0 {
            CoreValue::Null => Ok(ToSqlOutput::Owned(SqlValue::Null)),
            CoreValue::Bool(v) => Ok(ToSqlOutput::Owned(SqlValue::Integer(*v as i64))),
            CoreValue::I64(v) => Ok(ToSqlOutput::Owned(SqlValue::Integer(*v))),
            CoreValue::U64(v) => i64::try_from(*v)
                .map(|v| ToSqlOutput::Owned(SqlValue::Integer(v)))
                .map_err(|err| rusqlite::Error::ToSqlConversionFailure(Box::new(err))),
            CoreValue::F64(v) => Ok(ToSqlOutput::Owned(SqlValue::Real(*v))),
            CoreValue::String(v) => Ok(ToSqlOutput::Borrowed(ValueRef::Text(v.as_bytes()))),
            CoreValue::Bytes(v) => Ok(ToSqlOutput::Borrowed(ValueRef::Blob(&v[..]))),
            value @ (CoreValue::DateTime(_) | CoreValue::Date(_)) => Ok(ToSqlOutput::Owned(
                SqlValue::Text(value.to_text().unwrap_or_default()),
            )),
            CoreValue::List(_) => Err(rusqlite::Error::ToSqlConversionFailure(
                "a list cannot be bound as a single parameter".into(),
            )),
        }
    }
}

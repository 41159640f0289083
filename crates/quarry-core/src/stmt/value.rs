use crate::{Error, Result};

use chrono::{DateTime, NaiveDate, Utc};

/// A loosely typed value passed between models, statements and drivers.
///
/// Integers are widened to `I64`/`U64`; the field's [`Type`](super::Type)
/// says how wide the column really is.
#[derive(Debug, Default, Clone, PartialEq)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    I64(i64),
    U64(u64),
    F64(f64),
    String(String),
    Bytes(Vec<u8>),
    DateTime(DateTime<Utc>),
    Date(NaiveDate),
    List(Vec<Value>),
}

impl Value {
    pub fn null() -> Value {
        Value::Null
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns `true` when the value does not identify a row: null, integer
    /// zero or an empty string. Used to decide whether a primary key is set.
    pub fn is_unset(&self) -> bool {
        match self {
            Value::Null => true,
            Value::I64(v) => *v == 0,
            Value::U64(v) => *v == 0,
            Value::String(v) => v.is_empty(),
            _ => false,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(v) => Some(v),
            _ => None,
        }
    }

    /// Integer view of the value, if it is an integer that fits in `i64`.
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Value::I64(v) => Some(v),
            Value::U64(v) => i64::try_from(v).ok(),
            _ => None,
        }
    }

    /// Converts the value into `T`.
    pub fn to<T: FromValue>(self) -> Result<T> {
        T::from_value(self)
    }

    /// Builds a list value.
    pub fn list<T: Into<Value>>(items: impl IntoIterator<Item = T>) -> Value {
        Value::List(items.into_iter().map(Into::into).collect())
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(v) => Some(v),
            _ => None,
        }
    }

    /// Short name of the variant, used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::I64(_) => "i64",
            Value::U64(_) => "u64",
            Value::F64(_) => "f64",
            Value::String(_) => "string",
            Value::Bytes(_) => "bytes",
            Value::DateTime(_) => "datetime",
            Value::Date(_) => "date",
            Value::List(_) => "list",
        }
    }

    /// Renders a scalar value as text. Used when a value is matched against
    /// a `LIKE` pattern.
    pub fn to_text(&self) -> Option<String> {
        Some(match self {
            Value::Bool(v) => v.to_string(),
            Value::I64(v) => v.to_string(),
            Value::U64(v) => v.to_string(),
            Value::F64(v) => v.to_string(),
            Value::String(v) => v.clone(),
            Value::DateTime(v) => v.naive_utc().to_string(),
            Value::Date(v) => v.to_string(),
            Value::Null | Value::Bytes(_) | Value::List(_) => return None,
        })
    }
}

impl core::fmt::Display for Value {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Value::Null => f.write_str("NULL"),
            Value::Bytes(v) => write!(f, "<{} bytes>", v.len()),
            Value::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            other => match other.to_text() {
                Some(text) => f.write_str(&text),
                None => Ok(()),
            },
        }
    }
}

/// Conversion out of a [`Value`] into a Rust field type.
///
/// Implemented for every type a model field can hold. `Option<T>` maps
/// `Value::Null` to `None`.
pub trait FromValue: Sized {
    fn from_value(value: Value) -> Result<Self>;
}

macro_rules! impl_signed {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Value {
                    Value::I64(value as i64)
                }
            }

            impl FromValue for $ty {
                fn from_value(value: Value) -> Result<$ty> {
                    let converted = match &value {
                        Value::I64(v) => <$ty>::try_from(*v).ok(),
                        Value::U64(v) => <$ty>::try_from(*v).ok(),
                        Value::Bool(v) => Some(*v as $ty),
                        _ => None,
                    };
                    converted.ok_or_else(|| Error::type_conversion(value, stringify!($ty)))
                }
            }
        )*
    };
}

macro_rules! impl_unsigned {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Value {
                    Value::U64(value as u64)
                }
            }

            impl FromValue for $ty {
                fn from_value(value: Value) -> Result<$ty> {
                    let converted = match &value {
                        Value::I64(v) => <$ty>::try_from(*v).ok(),
                        Value::U64(v) => <$ty>::try_from(*v).ok(),
                        Value::Bool(v) => Some(*v as $ty),
                        _ => None,
                    };
                    converted.ok_or_else(|| Error::type_conversion(value, stringify!($ty)))
                }
            }
        )*
    };
}

impl_signed!(i8, i16, i32, i64);
impl_unsigned!(u8, u16, u32, u64);

impl From<f64> for Value {
    fn from(value: f64) -> Value {
        Value::F64(value)
    }
}

impl From<f32> for Value {
    fn from(value: f32) -> Value {
        Value::F64(value as f64)
    }
}

impl FromValue for f64 {
    fn from_value(value: Value) -> Result<f64> {
        match value {
            Value::F64(v) => Ok(v),
            Value::I64(v) => Ok(v as f64),
            Value::U64(v) => Ok(v as f64),
            value => Err(Error::type_conversion(value, "f64")),
        }
    }
}

impl FromValue for f32 {
    fn from_value(value: Value) -> Result<f32> {
        f64::from_value(value).map(|v| v as f32)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Value {
        Value::Bool(value)
    }
}

impl FromValue for bool {
    fn from_value(value: Value) -> Result<bool> {
        match value {
            Value::Bool(v) => Ok(v),
            Value::I64(v) => Ok(v != 0),
            Value::U64(v) => Ok(v != 0),
            value => Err(Error::type_conversion(value, "bool")),
        }
    }
}

impl From<String> for Value {
    fn from(value: String) -> Value {
        Value::String(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Value {
        Value::String(value.to_string())
    }
}

impl From<&String> for Value {
    fn from(value: &String) -> Value {
        Value::String(value.clone())
    }
}

impl FromValue for String {
    fn from_value(value: Value) -> Result<String> {
        match value {
            Value::String(v) => Ok(v),
            value => Err(Error::type_conversion(value, "String")),
        }
    }
}

impl From<Vec<u8>> for Value {
    fn from(value: Vec<u8>) -> Value {
        Value::Bytes(value)
    }
}

impl FromValue for Vec<u8> {
    fn from_value(value: Value) -> Result<Vec<u8>> {
        match value {
            Value::Bytes(v) => Ok(v),
            Value::String(v) => Ok(v.into_bytes()),
            value => Err(Error::type_conversion(value, "Vec<u8>")),
        }
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(value: DateTime<Utc>) -> Value {
        Value::DateTime(value)
    }
}

impl FromValue for DateTime<Utc> {
    fn from_value(value: Value) -> Result<DateTime<Utc>> {
        match value {
            Value::DateTime(v) => Ok(v),
            value => Err(Error::type_conversion(value, "DateTime<Utc>")),
        }
    }
}

impl From<NaiveDate> for Value {
    fn from(value: NaiveDate) -> Value {
        Value::Date(value)
    }
}

impl FromValue for NaiveDate {
    fn from_value(value: Value) -> Result<NaiveDate> {
        match value {
            Value::Date(v) => Ok(v),
            Value::DateTime(v) => Ok(v.date_naive()),
            value => Err(Error::type_conversion(value, "NaiveDate")),
        }
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Value {
        match value {
            Some(value) => value.into(),
            None => Value::Null,
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: Value) -> Result<Option<T>> {
        match value {
            Value::Null => Ok(None),
            value => T::from_value(value).map(Some),
        }
    }
}

impl FromValue for Value {
    fn from_value(value: Value) -> Result<Value> {
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_narrowing_checks_range() {
        assert_eq!(Value::I64(127).to::<i8>().unwrap(), 127);
        assert!(Value::I64(128).to::<i8>()
            .unwrap_err()
            .is_type_conversion());
        assert!(Value::I64(-1).to::<u32>().is_err());
        assert_eq!(Value::I64(42).to::<u64>().unwrap(), 42);
    }

    #[test]
    fn integer_to_bool() {
        assert!(Value::I64(1).to::<bool>().unwrap());
        assert!(!Value::I64(0).to::<bool>().unwrap());
    }

    #[test]
    fn option_maps_null() {
        assert_eq!(Value::Null.to::<Option<i32>>().unwrap(), None);
        assert_eq!(Value::I64(3).to::<Option<i32>>().unwrap(), Some(3));
        assert_eq!(Value::from(None::<String>), Value::Null);
    }

    #[test]
    fn unset_values() {
        assert!(Value::Null.is_unset());
        assert!(Value::I64(0).is_unset());
        assert!(Value::from("").is_unset());
        assert!(!Value::I64(7).is_unset());
        assert!(!Value::Bool(false).is_unset());
    }

    #[test]
    fn conversion_error_names_both_types() {
        let err = Value::from("abc").to::<i32>().unwrap_err();
        assert_eq!(err.to_string(), "cannot convert string to i32");
    }
}

//! Conversion between driver values and field values.
//!
//! Drivers hand back whatever their storage class holds: integers, reals,
//! text, blobs or null. Mapping narrows each value to the field's declared
//! type. Date-times are stored as naive text in the alias time zone.

use crate::Record;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};
use indexmap::IndexMap;
use quarry_core::{
    schema::{Field, Model},
    stmt::{Type, Value},
    Error, Result,
};

/// Ordered column name to value map, used for untyped rows and updates.
pub type Params = IndexMap<String, Value>;

const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Converts a bound parameter to its stored form.
pub(crate) fn to_db(value: Value, tz: &FixedOffset) -> Value {
    match value {
        Value::DateTime(v) => Value::String(
            v.with_timezone(tz)
                .naive_local()
                .format(DATETIME_FORMAT)
                .to_string(),
        ),
        Value::Date(v) => Value::String(v.format(DATE_FORMAT).to_string()),
        value => value,
    }
}

/// Converts a driver value read from the column of `field`.
pub(crate) fn from_db(field: &Field, value: Value, tz: &FixedOffset) -> Result<Value> {
    match field.storage_ty() {
        Some(ty) => convert(ty, value, tz),
        None => Ok(value),
    }
}

pub(crate) fn convert(ty: Type, value: Value, tz: &FixedOffset) -> Result<Value> {
    if value.is_null() {
        return Ok(Value::Null);
    }

    Ok(match ty {
        Type::Bool => match value.as_str().map(parse_bool) {
            Some(Some(v)) => Value::Bool(v),
            Some(None) => return Err(Error::type_conversion(value, "bool")),
            None => Value::Bool(value.to()?),
        },
        Type::I8 => integer::<i8>(value)?,
        Type::I16 => integer::<i16>(value)?,
        Type::I32 => integer::<i32>(value)?,
        Type::I64 => integer::<i64>(value)?,
        Type::U8 => integer::<u8>(value)?,
        Type::U16 => integer::<u16>(value)?,
        Type::U32 => integer::<u32>(value)?,
        Type::U64 => integer::<u64>(value)?,
        Type::F32 | Type::F64 => match value.as_str().map(|v| v.trim().parse::<f64>()) {
            Some(Ok(v)) => Value::F64(v),
            Some(Err(_)) => return Err(Error::type_conversion(value, "f64")),
            None => Value::F64(value.to()?),
        },
        Type::String | Type::Text => match value {
            Value::String(_) => value,
            Value::Bytes(v) => match String::from_utf8(v) {
                Ok(v) => Value::String(v),
                Err(err) => {
                    return Err(Error::type_conversion(
                        Value::Bytes(err.into_bytes()),
                        "String",
                    ))
                }
            },
            value => match value.to_text() {
                Some(text) => Value::String(text),
                None => return Err(Error::type_conversion(value, "String")),
            },
        },
        Type::Bytes => Value::Bytes(value.to()?),
        Type::DateTime => Value::DateTime(parse_datetime(value, tz)?),
        Type::Date => match value.as_str().map(parse_date) {
            Some(Some(date)) => Value::Date(date),
            Some(None) => return Err(Error::type_conversion(value, "NaiveDate")),
            None => Value::Date(value.to()?),
        },
    })
}

/// Integers may come back as text from drivers that return every column as
/// a string.
fn integer<T>(value: Value) -> Result<Value>
where
    T: quarry_core::stmt::FromValue + std::str::FromStr + Into<Value>,
{
    match value.as_str().map(|v| v.trim().parse::<T>()) {
        Some(Ok(v)) => Ok(v.into()),
        Some(Err(_)) => Err(Error::type_conversion(value, std::any::type_name::<T>())),
        None => value.to::<T>().map(Into::into),
    }
}

fn parse_datetime(value: Value, tz: &FixedOffset) -> Result<DateTime<Utc>> {
    let naive = match &value {
        Value::DateTime(v) => return Ok(*v),
        Value::Date(v) => v.and_hms_opt(0, 0, 0),
        Value::String(v) => parse_naive_datetime(v),
        Value::I64(v) => {
            return DateTime::from_timestamp(*v, 0)
                .ok_or_else(|| Error::type_conversion(value.clone(), "DateTime<Utc>"))
        }
        _ => None,
    };

    naive
        .and_then(|naive| tz.from_local_datetime(&naive).single())
        .map(|local| local.with_timezone(&Utc))
        .ok_or_else(|| Error::type_conversion(value, "DateTime<Utc>"))
}

fn parse_naive_datetime(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();

    NaiveDateTime::parse_from_str(text, DATETIME_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f"))
        .ok()
        .or_else(|| parse_date(text).and_then(|date| date.and_hms_opt(0, 0, 0)))
}

fn parse_bool(text: &str) -> Option<bool> {
    match text {
        "1" | "t" | "true" | "TRUE" => Some(true),
        "0" | "f" | "false" | "FALSE" => Some(false),
        _ => None,
    }
}

fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    // Accept a date-time and keep the date part.
    let date = text.get(..10).unwrap_or(text);
    NaiveDate::parse_from_str(date, DATE_FORMAT).ok()
}

/// Maps a row selected with `columns` onto the fields of `model`.
///
/// A column binds to the field stored in it, or else to the field of the
/// same name. Columns that match no field are ignored.
pub(crate) fn record(
    model: &Model,
    columns: &[String],
    row: Vec<Value>,
    tz: &FixedOffset,
) -> Result<Record> {
    let mut record = Record::new(model.fields.len());

    for (column, value) in columns.iter().zip(row) {
        let Some(field) = model
            .columns()
            .find(|field| field.column == *column)
            .or_else(|| model.columns().find(|field| field.name == *column))
        else {
            continue;
        };

        let value = from_db(field, value, tz)
            .map_err(|err| err.context(format!("{}.{}", model.short_name(), field.name)))?;
        record.set(field.id.index, value);
    }

    Ok(record)
}

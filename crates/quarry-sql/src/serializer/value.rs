use super::{Formatter, Params, ToSql};

use quarry_core::stmt::Value;

/// A value bound as a parameter.
pub(super) struct Bind<'a>(pub(super) &'a Value);

impl ToSql for Bind<'_> {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        let value = f.serializer.bind(self.0);
        let placeholder = f.params.push(&value);
        fmt!(f, placeholder);
    }
}

/// A value written inline as a SQL literal. Used for column defaults,
/// which cannot be bound.
pub(super) struct Literal<'a>(pub(super) &'a Value);

impl ToSql for Literal<'_> {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        use std::fmt::Write;

        match self.0 {
            Value::Null => f.dst.push_str("NULL"),
            Value::Bool(v) if f.serializer.is_postgresql() => {
                f.dst.push_str(if *v { "TRUE" } else { "FALSE" })
            }
            Value::Bool(v) => f.dst.push_str(if *v { "1" } else { "0" }),
            Value::I64(v) => {
                let _ = write!(f.dst, "{v}");
            }
            Value::U64(v) => {
                let _ = write!(f.dst, "{v}");
            }
            Value::F64(v) => {
                let _ = write!(f.dst, "{v}");
            }
            Value::String(v) => quote_str(v, f.dst),
            Value::DateTime(v) => quote_str(&v.naive_utc().to_string(), f.dst),
            Value::Date(v) => quote_str(&v.to_string(), f.dst),
            Value::Bytes(_) | Value::List(_) => f.dst.push_str("NULL"),
        }
    }
}

fn quote_str(value: &str, dst: &mut String) {
    dst.push('\'');
    for ch in value.chars() {
        if ch == '\'' {
            dst.push('\'');
        }
        dst.push(ch);
    }
    dst.push('\'');
}

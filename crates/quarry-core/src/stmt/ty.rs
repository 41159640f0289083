/// Semantic type of a model field.
///
/// This is the type the application sees. How it is stored depends on the
/// database flavor, see `quarry_sql` for the per-flavor column types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Type {
    Bool,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
    /// Bounded string, stored as `VARCHAR(size)`.
    String,
    /// Unbounded text.
    Text,
    Bytes,
    /// Timestamp, exposed as `chrono::DateTime<Utc>`.
    DateTime,
    Date,
}

impl Type {
    pub fn is_bool(&self) -> bool {
        matches!(self, Type::Bool)
    }

    pub fn is_integer(&self) -> bool {
        self.is_signed() || self.is_unsigned()
    }

    pub fn is_signed(&self) -> bool {
        matches!(self, Type::I8 | Type::I16 | Type::I32 | Type::I64)
    }

    pub fn is_unsigned(&self) -> bool {
        matches!(self, Type::U8 | Type::U16 | Type::U32 | Type::U64)
    }

    pub fn is_float(&self) -> bool {
        matches!(self, Type::F32 | Type::F64)
    }

    pub fn is_string(&self) -> bool {
        matches!(self, Type::String | Type::Text)
    }

    pub fn is_time(&self) -> bool {
        matches!(self, Type::DateTime | Type::Date)
    }

    /// Inclusive bounds of an integer type, as `i128` so both signed and
    /// unsigned ranges fit.
    pub(crate) fn integer_range(&self) -> Option<(i128, i128)> {
        Some(match self {
            Type::I8 => (i8::MIN as i128, i8::MAX as i128),
            Type::I16 => (i16::MIN as i128, i16::MAX as i128),
            Type::I32 => (i32::MIN as i128, i32::MAX as i128),
            Type::I64 => (i64::MIN as i128, i64::MAX as i128),
            Type::U8 => (0, u8::MAX as i128),
            Type::U16 => (0, u16::MAX as i128),
            Type::U32 => (0, u32::MAX as i128),
            Type::U64 => (0, u64::MAX as i128),
            _ => return None,
        })
    }

    pub fn name(&self) -> &'static str {
        match self {
            Type::Bool => "bool",
            Type::I8 => "i8",
            Type::I16 => "i16",
            Type::I32 => "i32",
            Type::I64 => "i64",
            Type::U8 => "u8",
            Type::U16 => "u16",
            Type::U32 => "u32",
            Type::U64 => "u64",
            Type::F32 => "f32",
            Type::F64 => "f64",
            Type::String => "string",
            Type::Text => "text",
            Type::Bytes => "bytes",
            Type::DateTime => "datetime",
            Type::Date => "date",
        }
    }
}

impl core::fmt::Display for Type {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

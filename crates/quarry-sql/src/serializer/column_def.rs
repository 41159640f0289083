use super::{value::Literal, Formatter, Ident, Params, ToSql};

use crate::stmt::{ColumnDef, ColumnType};
use quarry_core::{driver::Dialect, stmt::Type};

impl ToSql for &ColumnDef {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        let name = Ident(&self.name);
        let dialect = f.serializer.dialect();

        if self.auto_increment {
            let identity = match dialect {
                // SQLite only aliases the rowid for exactly `INTEGER PRIMARY KEY`.
                Dialect::Sqlite => "INTEGER NOT NULL PRIMARY KEY AUTOINCREMENT",
                Dialect::Postgresql => match self.ty {
                    ColumnType::Scalar(Type::I8 | Type::I16 | Type::I32 | Type::U8 | Type::U16) => {
                        "SERIAL NOT NULL PRIMARY KEY"
                    }
                    _ => "BIGSERIAL NOT NULL PRIMARY KEY",
                },
                Dialect::Mysql => match self.ty {
                    ColumnType::Scalar(ty) if ty.is_unsigned() => {
                        "BIGINT UNSIGNED NOT NULL AUTO_INCREMENT PRIMARY KEY"
                    }
                    _ => "BIGINT NOT NULL AUTO_INCREMENT PRIMARY KEY",
                },
            };
            fmt!(f, name " " identity);
            return;
        }

        let null = if self.nullable { " NULL" } else { " NOT NULL" };
        fmt!(f, name " " ColumnTypeSql(self.ty) null);

        if self.primary_key {
            fmt!(f, " PRIMARY KEY");
        } else if self.unique {
            fmt!(f, " UNIQUE");
        }

        if let Some(default) = &self.default {
            fmt!(f, " DEFAULT " Literal(default));
        }
    }
}

struct ColumnTypeSql(ColumnType);

impl ToSql for ColumnTypeSql {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        use std::fmt::Write;

        let dialect = f.serializer.dialect();

        let name = match self.0 {
            ColumnType::VarChar(size) => {
                let _ = write!(f.dst, "VARCHAR({size})");
                return;
            }
            ColumnType::Decimal(precision) => {
                let keyword = if dialect == Dialect::Postgresql {
                    "NUMERIC"
                } else {
                    "DECIMAL"
                };
                let _ = write!(
                    f.dst,
                    "{keyword}({}, {})",
                    precision.digits, precision.decimals
                );
                return;
            }
            ColumnType::Scalar(ty) => match dialect {
                Dialect::Sqlite => sqlite_type(ty),
                Dialect::Postgresql => postgresql_type(ty),
                Dialect::Mysql => mysql_type(ty),
            },
        };

        f.dst.push_str(name);
    }
}

fn sqlite_type(ty: Type) -> &'static str {
    match ty {
        Type::Bool => "BOOLEAN",
        ty if ty.is_integer() => "INTEGER",
        Type::F32 | Type::F64 => "REAL",
        Type::String | Type::Text => "TEXT",
        Type::Bytes => "BLOB",
        Type::DateTime => "DATETIME",
        Type::Date => "DATE",
        _ => "TEXT",
    }
}

fn postgresql_type(ty: Type) -> &'static str {
    match ty {
        Type::Bool => "BOOLEAN",
        Type::I8 | Type::I16 | Type::U8 => "SMALLINT",
        Type::I32 | Type::U16 => "INTEGER",
        Type::I64 | Type::U32 | Type::U64 => "BIGINT",
        Type::F32 => "REAL",
        Type::F64 => "DOUBLE PRECISION",
        Type::String | Type::Text => "TEXT",
        Type::Bytes => "BYTEA",
        Type::DateTime => "TIMESTAMP",
        Type::Date => "DATE",
    }
}

fn mysql_type(ty: Type) -> &'static str {
    match ty {
        Type::Bool => "BOOL",
        Type::I8 => "TINYINT",
        Type::I16 => "SMALLINT",
        Type::I32 => "INT",
        Type::I64 => "BIGINT",
        Type::U8 => "TINYINT UNSIGNED",
        Type::U16 => "SMALLINT UNSIGNED",
        Type::U32 => "INT UNSIGNED",
        Type::U64 => "BIGINT UNSIGNED",
        Type::F32 => "FLOAT",
        Type::F64 => "DOUBLE",
        Type::String | Type::Text => "LONGTEXT",
        Type::Bytes => "LONGBLOB",
        Type::DateTime => "DATETIME(6)",
        Type::Date => "DATE",
    }
}

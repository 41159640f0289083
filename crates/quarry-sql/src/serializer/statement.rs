use super::{value::Bind, Comma, Formatter, Ident, Params, ToSql};

use crate::stmt::{self, Statement};

impl ToSql for &Statement {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        match self {
            Statement::CreateIndex(stmt) => stmt.to_sql(f),
            Statement::CreateTable(stmt) => stmt.to_sql(f),
            Statement::Delete(stmt) => stmt.to_sql(f),
            Statement::Insert(stmt) => stmt.to_sql(f),
            Statement::Select(stmt) => stmt.to_sql(f),
            Statement::Update(stmt) => stmt.to_sql(f),
        }
    }
}

impl ToSql for &stmt::Select {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        let distinct = if self.distinct { "DISTINCT " } else { "" };

        fmt!(f, "SELECT " distinct);

        match &self.projection {
            stmt::Projection::Columns(columns) => fmt!(f, Comma(columns.iter().map(Ident))),
            stmt::Projection::Count => fmt!(f, "COUNT(*)"),
        }

        let filter = self.filter.as_ref().map(|expr| (" WHERE ", expr));
        fmt!(f, " FROM " Ident(&self.table) filter);

        if !self.order_by.is_empty() {
            fmt!(f, " ORDER BY " Comma(&self.order_by));
        }

        LimitOffset {
            limit: self.limit,
            offset: self.offset,
        }
        .to_sql(f);

        if self.for_update && f.serializer.capability.select_for_update {
            fmt!(f, " FOR UPDATE");
        }
    }
}

impl ToSql for &stmt::OrderBy {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        let direction = if self.descending { " DESC" } else { " ASC" };
        fmt!(f, Ident(&self.column) direction);
    }
}

struct LimitOffset {
    limit: Option<u64>,
    offset: Option<u64>,
}

impl ToSql for LimitOffset {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        match (self.limit, self.offset) {
            (None, None) => {}
            (Some(limit), None) => fmt!(f, " LIMIT " limit),
            (Some(limit), Some(offset)) => fmt!(f, " LIMIT " limit " OFFSET " offset),
            // An offset needs a limit everywhere but PostgreSQL.
            (None, Some(offset)) => {
                if f.serializer.is_sqlite() {
                    fmt!(f, " LIMIT -1 OFFSET " offset);
                } else if f.serializer.is_mysql() {
                    fmt!(f, " LIMIT " u64::MAX " OFFSET " offset);
                } else {
                    fmt!(f, " OFFSET " offset);
                }
            }
        }
    }
}

impl ToSql for &stmt::Insert {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        fmt!(f, "INSERT INTO " Ident(&self.table));

        if self.columns.is_empty() {
            if f.serializer.is_mysql() {
                fmt!(f, " () VALUES ()");
            } else {
                fmt!(f, " DEFAULT VALUES");
            }
        } else {
            let columns = Comma(self.columns.iter().map(Ident));
            let rows = Comma(self.rows.iter().map(Row));
            fmt!(f, " (" columns ") VALUES " rows);
        }

        if let Some(on_conflict) = &self.on_conflict {
            on_conflict.to_sql(f);
        }

        if let Some(returning) = &self.returning {
            fmt!(f, " RETURNING " Ident(returning));
        }
    }
}

struct Row<'a>(&'a Vec<stmt::Value>);

impl ToSql for Row<'_> {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        fmt!(f, "(" Comma(self.0.iter().map(Bind)) ")");
    }
}

impl ToSql for &stmt::OnConflict {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        if f.serializer.is_mysql() {
            fmt!(f, " ON DUPLICATE KEY UPDATE ");

            if self.update.is_empty() {
                // Keep the existing row untouched.
                if let Some(column) = self.target.first() {
                    fmt!(f, Ident(column) " = " Ident(column));
                }
            } else {
                fmt!(f, Comma(self.update.iter().map(MysqlValues)));
            }
            return;
        }

        fmt!(f, " ON CONFLICT (" Comma(self.target.iter().map(Ident)) ")");

        if self.update.is_empty() {
            fmt!(f, " DO NOTHING");
        } else {
            fmt!(f, " DO UPDATE SET " Comma(self.update.iter().map(Excluded)));
        }
    }
}

/// `"col" = excluded."col"`
struct Excluded<'a>(&'a String);

impl ToSql for Excluded<'_> {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        fmt!(f, Ident(self.0) " = excluded." Ident(self.0));
    }
}

/// `` `col` = VALUES(`col`) ``
struct MysqlValues<'a>(&'a String);

impl ToSql for MysqlValues<'_> {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        fmt!(f, Ident(self.0) " = VALUES(" Ident(self.0) ")");
    }
}

impl ToSql for &stmt::Update {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        let filter = self.filter.as_ref().map(|expr| (" WHERE ", expr));

        fmt!(
            f,
            "UPDATE " Ident(&self.table) " SET " Comma(&self.assignments) filter
        );
    }
}

impl ToSql for &stmt::Assignment {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        fmt!(f, Ident(&self.column) " = " Bind(&self.value));
    }
}

impl ToSql for &stmt::Delete {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        let filter = self.filter.as_ref().map(|expr| (" WHERE ", expr));

        fmt!(f, "DELETE FROM " Ident(&self.table) filter);
    }
}

impl ToSql for &stmt::CreateTable {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        fmt!(f, "CREATE TABLE IF NOT EXISTS " Ident(&self.name) " (");

        for (index, column) in self.columns.iter().enumerate() {
            fmt!(f, "\n    " column);
            if index < self.columns.len() - 1 || !self.indices.is_empty() {
                fmt!(f, ",");
            }
        }

        for (index, inline) in self.indices.iter().enumerate() {
            let unique = if inline.unique { "UNIQUE " } else { "" };
            let columns = Comma(inline.columns.iter().map(Ident));
            fmt!(f, "\n    " unique "KEY " Ident(&inline.name) " (" columns ")");
            if index < self.indices.len() - 1 {
                fmt!(f, ",");
            }
        }

        fmt!(f, "\n)");
    }
}

impl ToSql for &stmt::CreateIndex {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        let index_name = Ident(&self.name);
        let table_name = Ident(&self.table);
        let columns = Comma(self.columns.iter().map(Ident));
        let unique = if self.unique { "UNIQUE " } else { "" };

        fmt!(
            f, "CREATE " unique "INDEX IF NOT EXISTS " index_name " ON " table_name " (" columns ")"
        );
    }
}

impl<A: ToSql, B: ToSql> ToSql for (A, B) {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        fmt!(f, self.0 self.1);
    }
}

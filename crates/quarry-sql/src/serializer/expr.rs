use super::{value::Bind, Comma, Formatter, Ident, Params, ToSql};

use quarry_core::stmt::{self, Expr, Value};

impl ToSql for &Expr {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        match self {
            Expr::And(operands) => BoolGroup("AND", operands).to_sql(f),
            Expr::Or(operands) => BoolGroup("OR", operands).to_sql(f),
            Expr::Not(expr) => {
                let inner: &Expr = expr;
                fmt!(f, "NOT (" inner ")");
            }
            Expr::BinaryOp(expr) => {
                let op = expr.op.as_str();
                fmt!(f, Ident(&expr.column) " " op " " Bind(&expr.value));
            }
            Expr::InList(expr) => {
                if expr.list.is_empty() {
                    fmt!(f, "1 = 0");
                } else {
                    let list = Comma(expr.list.iter().map(Bind));
                    fmt!(f, Ident(&expr.column) " IN (" list ")");
                }
            }
            Expr::InSubquery(expr) => {
                let query: &stmt::Select = &expr.query;
                fmt!(f, Ident(&expr.column) " IN (" query ")");
            }
            Expr::Between(expr) => {
                let column = Ident(&expr.column);
                fmt!(f, column " BETWEEN " Bind(&expr.low) " AND " Bind(&expr.high));
            }
            Expr::IsNull(expr) => {
                let is = if expr.negate { " IS NOT NULL" } else { " IS NULL" };
                fmt!(f, Ident(&expr.column) is);
            }
            Expr::Like(expr) => expr.to_sql(f),
        }
    }
}

/// Parenthesized `AND` / `OR` group.
struct BoolGroup<'a>(&'static str, &'a [Expr]);

impl ToSql for BoolGroup<'_> {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        let BoolGroup(keyword, operands) = self;

        match operands {
            [] if keyword == "AND" => fmt!(f, "1 = 1"),
            [] => fmt!(f, "1 = 0"),
            [operand] => operand.to_sql(f),
            operands => {
                fmt!(f, "(");
                let mut s = "";
                for operand in operands {
                    fmt!(f, s operand);
                    s = if keyword == "AND" { " AND " } else { " OR " };
                }
                fmt!(f, ")");
            }
        }
    }
}

impl ToSql for &stmt::ExprLike {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        let column = Ident(&self.column);
        let pattern = Value::String(self.pattern.clone());

        if f.serializer.is_postgresql() {
            let like = if self.case_insensitive { " ILIKE " } else { " LIKE " };
            fmt!(f, column like Bind(&pattern));
            return;
        }

        if self.case_insensitive {
            fmt!(f, "LOWER(" column ") LIKE LOWER(" Bind(&pattern) ")");
        } else if f.serializer.is_mysql() {
            fmt!(f, column " LIKE BINARY " Bind(&pattern));
        } else {
            fmt!(f, column " LIKE " Bind(&pattern));
        }

        // MySQL already treats `\` as the escape character.
        if f.serializer.is_sqlite() {
            fmt!(f, " ESCAPE '\\'");
        }
    }
}

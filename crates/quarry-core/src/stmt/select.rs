use super::Expr;

/// A `SELECT` against a single table.
#[derive(Debug, Clone, PartialEq)]
pub struct Select {
    pub table: String,
    pub projection: Projection,
    pub distinct: bool,
    pub filter: Option<Expr>,
    pub order_by: Vec<OrderBy>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
    /// Emit `FOR UPDATE` where the flavor supports it.
    pub for_update: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Projection {
    Columns(Vec<String>),
    /// `COUNT(*)`
    Count,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub column: String,
    pub descending: bool,
}

impl Select {
    pub fn new(table: impl Into<String>, columns: Vec<String>) -> Select {
        Select {
            table: table.into(),
            projection: Projection::Columns(columns),
            distinct: false,
            filter: None,
            order_by: vec![],
            limit: None,
            offset: None,
            for_update: false,
        }
    }

    pub fn count(table: impl Into<String>) -> Select {
        Select {
            projection: Projection::Count,
            ..Select::new(table, vec![])
        }
    }

    pub fn filter(mut self, expr: Expr) -> Select {
        self.filter = Some(match self.filter.take() {
            Some(existing) => Expr::and([existing, expr]),
            None => expr,
        });
        self
    }
}

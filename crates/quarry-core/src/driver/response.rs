use crate::stmt::Value;

#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub rows: Rows,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Rows {
    /// Number of rows impacted by the operation
    Count {
        affected: u64,
        /// Identity generated by the last insert, when the backend reports
        /// one.
        last_insert_id: Option<i64>,
    },

    /// Operation result, fully materialized
    Values {
        columns: Vec<String>,
        rows: Vec<Vec<Value>>,
    },
}

impl Response {
    pub fn count(affected: u64) -> Self {
        Self {
            rows: Rows::Count {
                affected,
                last_insert_id: None,
            },
        }
    }

    pub fn inserted(affected: u64, last_insert_id: i64) -> Self {
        Self {
            rows: Rows::Count {
                affected,
                last_insert_id: Some(last_insert_id),
            },
        }
    }

    pub fn values(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        Self {
            rows: Rows::Values { columns, rows },
        }
    }
}

impl Rows {
    pub fn is_count(&self) -> bool {
        matches!(self, Self::Count { .. })
    }

    pub fn is_values(&self) -> bool {
        matches!(self, Self::Values { .. })
    }

    /// Number of rows affected or returned.
    pub fn len(&self) -> u64 {
        match self {
            Rows::Count { affected, .. } => *affected,
            Rows::Values { rows, .. } => rows.len() as u64,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

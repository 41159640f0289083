use super::Value;

/// A multi-row `INSERT`.
#[derive(Debug, Clone, PartialEq)]
pub struct Insert {
    pub table: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
    pub on_conflict: Option<OnConflict>,
    /// Column to return when the flavor supports `RETURNING`.
    pub returning: Option<String>,
}

/// Upsert clause: on a conflict over `target`, overwrite `update` columns
/// with the incoming values.
#[derive(Debug, Clone, PartialEq)]
pub struct OnConflict {
    pub target: Vec<String>,
    pub update: Vec<String>,
}

impl Insert {
    pub fn new(table: impl Into<String>, columns: Vec<String>) -> Insert {
        Insert {
            table: table.into(),
            columns,
            rows: vec![],
            on_conflict: None,
            returning: None,
        }
    }

    pub fn row(mut self, values: Vec<Value>) -> Insert {
        debug_assert_eq!(values.len(), self.columns.len());
        self.rows.push(values);
        self
    }
}

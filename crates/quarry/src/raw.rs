use crate::{mapper, session::rows, Model, Params, Record, Session};

use quarry_core::{driver::Rows, stmt::Value, Context, Error, Result};

/// A hand-written SQL statement.
///
/// Placeholders are written as `?` whatever the database; they are
/// rewritten to the flavor's syntax before execution. The number of
/// arguments must match the number of placeholders.
#[derive(Debug)]
pub struct RawSet<'a> {
    session: &'a mut Session,
    cx: Context,
    sql: String,
    args: Vec<Value>,
}

/// Outcome of [`RawSet::exec`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawResult {
    pub affected: u64,
    /// Identity generated by an insert, when the driver reports one.
    pub last_insert_id: Option<i64>,
}

impl<'a> RawSet<'a> {
    pub(crate) fn new(session: &'a mut Session, cx: Context, sql: String, args: Vec<Value>) -> Self {
        RawSet {
            session,
            cx,
            sql,
            args,
        }
    }

    /// Replaces the arguments.
    pub fn set_args(mut self, args: Vec<Value>) -> Self {
        self.args = args;
        self
    }

    /// Runs a statement that returns no rows.
    pub async fn exec(self) -> Result<RawResult> {
        let response = self
            .session
            .exec_raw(&self.cx, &self.sql, &self.args, false)
            .await?;

        Ok(match response.rows {
            Rows::Count {
                affected,
                last_insert_id,
            } => RawResult {
                affected,
                last_insert_id,
            },
            Rows::Values { rows, .. } => RawResult {
                affected: rows.len() as u64,
                last_insert_id: None,
            },
        })
    }

    /// Maps the first row onto `M`. Columns matching no field are ignored.
    pub async fn query_row<M: Model>(self) -> Result<M> {
        let records = self.records::<M>().await?;

        match records.into_iter().next() {
            Some(record) => M::load(record),
            None => Err(Error::record_not_found("raw query returned no rows")),
        }
    }

    /// Maps every row onto `M`.
    pub async fn query_rows<M: Model>(self) -> Result<Vec<M>> {
        self.records::<M>()
            .await?
            .into_iter()
            .map(M::load)
            .collect()
    }

    /// Returns every row as a column name to value map. Values are what the
    /// driver returned, without conversion to field types.
    pub async fn values(self) -> Result<Vec<Params>> {
        let (columns, rows) = self.query().await?;

        Ok(rows
            .into_iter()
            .map(|row| columns.iter().cloned().zip(row).collect())
            .collect())
    }

    pub async fn values_list(self) -> Result<Vec<Vec<Value>>> {
        Ok(self.query().await?.1)
    }

    /// Returns the first column of every row.
    pub async fn values_flat(self) -> Result<Vec<Value>> {
        let (_, rows) = self.query().await?;
        Ok(rows.into_iter().filter_map(|row| row.into_iter().next()).collect())
    }

    async fn query(self) -> Result<(Vec<String>, Vec<Vec<Value>>)> {
        let response = self
            .session
            .exec_raw(&self.cx, &self.sql, &self.args, true)
            .await?;
        rows(response)
    }

    async fn records<M: Model>(self) -> Result<Vec<Record>> {
        let registry = self.session.registry().clone();
        let schema = registry.resolve_type::<M>()?;
        let tz = self.session.time_zone();

        let (columns, rows) = self.query().await?;

        rows.into_iter()
            .map(|row| mapper::record(schema, &columns, row, &tz))
            .collect()
    }
}

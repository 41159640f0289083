mod config;
pub use config::{SessionConfig, TxOptions};

mod crud;
pub(crate) use crud::column_field;

mod transaction;
pub use transaction::Transaction;

use crate::{
    db::{Alias, PoolConnection},
    mapper, PoolStats, QuerySet, RawSet,
};

use quarry_core::{
    driver::{Capability, Operation, Response, Rows, Sql},
    schema::{Model as ModelSchema, Registry},
    stmt::Value,
    Context, Error, Result,
};
use quarry_sql::Statement;

use std::{sync::Arc, time::Instant};

/// A unit of work against one database alias.
///
/// A plain session takes a pooled connection for every statement. The
/// session inside a [`Transaction`] runs every statement on the connection
/// pinned when the transaction started.
#[derive(Debug)]
pub struct Session {
    registry: Arc<Registry>,
    alias: Arc<Alias>,
    config: SessionConfig,
    connection: ConnectionType,
}

#[derive(Debug)]
enum ConnectionType {
    Pool,
    /// `None` once the transaction was committed or rolled back.
    Transaction(Option<PoolConnection>),
}

impl Session {
    pub(crate) fn new(registry: Arc<Registry>, alias: Arc<Alias>, config: SessionConfig) -> Session {
        Session {
            registry,
            alias,
            config,
            connection: ConnectionType::Pool,
        }
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut SessionConfig {
        &mut self.config
    }

    /// Name of the database alias the session runs against.
    pub fn alias(&self) -> &str {
        &self.alias.name
    }

    /// Name of the driver serving the alias, e.g. `"sqlite"`.
    pub fn driver_name(&self) -> &'static str {
        self.alias.pool.driver_name()
    }

    pub fn capability(&self) -> &'static Capability {
        self.alias.pool.capability()
    }

    /// Snapshot of the alias' connection pool.
    pub fn stats(&self) -> PoolStats {
        self.alias.pool.stats()
    }

    pub fn is_transaction(&self) -> bool {
        matches!(self.connection, ConnectionType::Transaction(_))
    }

    /// Starts a query over the table of `M`.
    pub fn query_table<M: crate::Model>(&mut self) -> Result<QuerySet<'_>> {
        self.query_table_with_ctx::<M>(&Context::background())
    }

    pub fn query_table_with_ctx<M: crate::Model>(&mut self, cx: &Context) -> Result<QuerySet<'_>> {
        let model = self.registry.resolve_type::<M>()?.id;
        Ok(QuerySet::new(self, cx.clone(), model))
    }

    /// Starts a query over a table given by name, either the table name or
    /// the model name.
    pub fn query_table_name(&mut self, name: &str) -> Result<QuerySet<'_>> {
        self.query_table_name_with_ctx(&Context::background(), name)
    }

    pub fn query_table_name_with_ctx(&mut self, cx: &Context, name: &str) -> Result<QuerySet<'_>> {
        let model = self
            .registry
            .resolve_table(name)
            .or_else(|| self.registry.resolve(name))
            .or_else(|| {
                self.registry
                    .models()
                    .find(|model| model.short_name() == name)
            })
            .ok_or_else(|| Error::model_not_registered(name))?
            .id;

        Ok(QuerySet::new(self, cx.clone(), model))
    }

    /// Starts a hand-written query. `?` placeholders are rewritten for the
    /// database flavor.
    pub fn raw(&mut self, sql: impl Into<String>, args: Vec<Value>) -> RawSet<'_> {
        self.raw_with_ctx(&Context::background(), sql, args)
    }

    pub fn raw_with_ctx(
        &mut self,
        cx: &Context,
        sql: impl Into<String>,
        args: Vec<Value>,
    ) -> RawSet<'_> {
        RawSet::new(self, cx.clone(), sql.into(), args)
    }

    /// Creates the table and indexes of every registered model, join tables
    /// included. Existing tables are left untouched.
    pub async fn sync_schema(&mut self) -> Result<()> {
        self.sync_schema_with_ctx(&Context::background()).await
    }

    #[tracing::instrument(level = "debug", skip_all, fields(alias = %self.alias.name))]
    pub async fn sync_schema_with_ctx(&mut self, cx: &Context) -> Result<()> {
        let registry = self.registry.clone();
        let capability = self.capability();

        for model in registry.models() {
            for stmt in Statement::create_schema(model, capability) {
                self.exec(cx, stmt)
                    .await
                    .map_err(|err| err.context(format!("creating table `{}`", model.table_name)))?;
            }
            tracing::debug!(table = %model.table_name, "table synced");
        }

        Ok(())
    }

    pub(crate) fn time_zone(&self) -> chrono::FixedOffset {
        *self.alias.time_zone()
    }

    /// Serializes and runs a statement.
    pub(crate) async fn exec(
        &mut self,
        cx: &Context,
        stmt: impl Into<Statement>,
    ) -> Result<Response> {
        let stmt = stmt.into();
        cx.check()?;

        let mut params = Vec::<Value>::new();
        let sql = self.alias.serializer.serialize(&stmt, &mut params);

        let tz = self.time_zone();
        let params = params
            .into_iter()
            .map(|value| mapper::to_db(value, &tz))
            .collect();

        let sql = Sql::new(sql, params);
        let op = if stmt.returns_rows() {
            Operation::Query(sql)
        } else {
            Operation::Execute(sql)
        };

        self.exec_op(cx, op).await
    }

    /// Runs hand-written SQL with `?` placeholders.
    pub(crate) async fn exec_raw(
        &mut self,
        cx: &Context,
        sql: &str,
        args: &[Value],
        returns_rows: bool,
    ) -> Result<Response> {
        let serializer = self.alias.serializer;

        let expected = serializer.count_placeholders(sql);
        if expected != args.len() {
            return Err(Error::args(format!(
                "raw query has {expected} placeholders but {} arguments",
                args.len()
            )));
        }

        if args.iter().any(|arg| matches!(arg, Value::List(_))) {
            return Err(Error::args("raw query arguments must be scalar values"));
        }

        let tz = self.time_zone();
        let params = args
            .iter()
            .map(|arg| mapper::to_db(serializer.bind(arg), &tz))
            .collect();

        let sql = Sql::new(serializer.rewrite_placeholders(sql), params);
        let op = if returns_rows {
            Operation::Query(sql)
        } else {
            Operation::Execute(sql)
        };

        cx.check()?;
        self.exec_op(cx, op).await
    }

    /// Runs an operation on the session's executor under `cx`.
    pub(crate) async fn exec_op(&mut self, cx: &Context, op: Operation) -> Result<Response> {
        let (sql, args) = match &op {
            Operation::Execute(sql) | Operation::Query(sql) => (sql.sql.clone(), sql.params.len()),
            Operation::Transaction(tx) => (format!("{tx:?}"), 0),
        };

        let started = Instant::now();

        let res = match &mut self.connection {
            ConnectionType::Pool => {
                let pool = &self.alias.pool;
                cx.run(async move {
                    let mut connection = pool.get().await?;
                    connection.exec(op).await
                })
                .await
            }
            ConnectionType::Transaction(Some(connection)) => cx.run(connection.exec(op)).await,
            ConnectionType::Transaction(None) => Err(Error::transaction_already_done()),
        };

        let elapsed = started.elapsed();
        let error = res.as_ref().err().map(tracing::field::display);

        if self.config.debug {
            tracing::debug!(alias = %self.alias.name, %sql, args, ?elapsed, error, "query");
        } else {
            tracing::trace!(alias = %self.alias.name, %sql, args, ?elapsed, error, "query");
        }

        res
    }

    /// Runs a select and maps every row onto `model`.
    pub(crate) async fn query_records(
        &mut self,
        cx: &Context,
        model: &ModelSchema,
        stmt: quarry_core::stmt::Select,
    ) -> Result<Vec<crate::Record>> {
        let response = self.exec(cx, stmt).await?;
        let (columns, rows) = rows(response)?;
        let tz = self.time_zone();

        rows.into_iter()
            .map(|row| mapper::record(model, &columns, row, &tz))
            .collect()
    }
}

/// Unpacks a row response.
pub(crate) fn rows(response: Response) -> Result<(Vec<String>, Vec<Vec<Value>>)> {
    match response.rows {
        Rows::Values { columns, rows } => Ok((columns, rows)),
        Rows::Count { .. } => Err(quarry_core::err!("expected rows, driver returned a count")),
    }
}

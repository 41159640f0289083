mod lower;
pub(crate) use lower::Lower;

mod preload;
pub(crate) use preload::forward as preload;

use crate::{mapper, session::rows, Model, Params, Session};

use quarry_core::{
    schema::{Model as ModelSchema, ModelId, Registry},
    stmt::{
        Arg, Assignment, Condition, Delete, Expr, OrderBy, Projection, Select, Update, Value,
        SEPARATOR,
    },
    Context, Error, Result,
};

use std::sync::Arc;

/// A lazily built query over one model's table.
///
/// Chain methods only record state. Errors found while chaining, such as an
/// unknown `order_by` field, are kept and returned by the terminal call
/// before any SQL is generated.
///
/// ```no_run
/// # async fn run(session: &mut quarry::Session) -> quarry::Result<()> {
/// # #[derive(Default)] struct User;
/// # impl quarry::Model for User {
/// #     fn schema() -> quarry::ModelDef { unimplemented!() }
/// #     fn value(&self, _: usize) -> quarry::Value { unimplemented!() }
/// #     fn set_value(&mut self, _: usize, _: quarry::Value) -> quarry::Result<()> { Ok(()) }
/// # }
/// let adults = session
///     .query_table::<User>()?
///     .filter("age__gte", 18)
///     .exclude("name__istartswith", "test")
///     .order_by(&["-age", "name"])
///     .limit(10)
///     .all::<User>()
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct QuerySet<'a> {
    session: &'a mut Session,
    registry: Arc<Registry>,
    model: ModelId,
    cx: Context,
    cond: Condition,
    /// Fixed restriction set by the creator, e.g. the rows related to an
    /// instance. Always applied on top of `cond`.
    scope: Option<Expr>,
    order: Vec<OrderBy>,
    limit: Option<u64>,
    offset: Option<u64>,
    depth: Option<usize>,
    distinct: bool,
    for_update: bool,
    allow_full_table: bool,
    error: Option<Error>,
}

impl<'a> QuerySet<'a> {
    pub(crate) fn new(session: &'a mut Session, cx: Context, model: ModelId) -> QuerySet<'a> {
        QuerySet {
            registry: session.registry().clone(),
            session,
            model,
            cx,
            cond: Condition::new(),
            scope: None,
            order: vec![],
            limit: None,
            offset: None,
            depth: None,
            distinct: false,
            for_update: false,
            allow_full_table: false,
            error: None,
        }
    }

    pub(crate) fn scoped(mut self, scope: Expr) -> QuerySet<'a> {
        self.scope = Some(scope);
        self
    }

    /// Adds a predicate, joined with `AND`.
    pub fn filter(mut self, expr: impl Into<String>, arg: impl Into<Arg>) -> QuerySet<'a> {
        self.cond = std::mem::take(&mut self.cond).and(expr, arg);
        self
    }

    /// Adds a negated predicate, joined with `AND`.
    pub fn exclude(mut self, expr: impl Into<String>, arg: impl Into<Arg>) -> QuerySet<'a> {
        self.cond = std::mem::take(&mut self.cond).and_not(expr, arg);
        self
    }

    /// Replaces the accumulated predicates with `cond`.
    pub fn set_cond(mut self, cond: Condition) -> QuerySet<'a> {
        self.cond = cond;
        self
    }

    /// Orders by the given fields; a leading `-` sorts descending.
    pub fn order_by(mut self, fields: &[&str]) -> QuerySet<'a> {
        for name in fields {
            let (field, descending) = match name.strip_prefix('-') {
                Some(field) => (field, true),
                None => (*name, false),
            };

            match self.resolve_column(field) {
                Ok(column) => self.order.push(OrderBy { column, descending }),
                Err(err) => {
                    self.error.get_or_insert(err);
                }
            }
        }
        self
    }

    /// Caps the rows returned. Zero falls back to the session's default
    /// row cap, as if no limit had been set.
    pub fn limit(mut self, limit: u64) -> QuerySet<'a> {
        self.limit = (limit > 0).then_some(limit);
        self
    }

    pub fn offset(mut self, offset: u64) -> QuerySet<'a> {
        self.offset = Some(offset);
        self
    }

    /// Preloads foreign key and one-to-one relations `depth` levels deep in
    /// [`all`](Self::all) and [`one`](Self::one).
    pub fn related_depth(mut self, depth: usize) -> QuerySet<'a> {
        self.depth = Some(depth);
        self
    }

    pub fn distinct(mut self) -> QuerySet<'a> {
        self.distinct = true;
        self
    }

    /// Locks the selected rows where the database supports it.
    pub fn for_update(mut self) -> QuerySet<'a> {
        self.for_update = true;
        self
    }

    /// Allows [`update`](Self::update) and [`delete`](Self::delete) without
    /// any filter.
    pub fn allow_full_table(mut self) -> QuerySet<'a> {
        self.allow_full_table = true;
        self
    }

    /// Counts the matching rows, ignoring order, limit and offset.
    pub async fn count(self) -> Result<u64> {
        let (session, cx, mut select) = self.into_select(vec![])?;
        select.projection = Projection::Count;
        select.order_by.clear();
        select.limit = None;
        select.offset = None;
        select.distinct = false;
        select.for_update = false;

        let (_, rows) = rows(session.exec(&cx, select).await?)?;
        let count = rows
            .into_iter()
            .next()
            .and_then(|row| row.into_iter().next())
            .unwrap_or(Value::I64(0));

        count.to()
    }

    /// Returns `true` when at least one row matches.
    pub async fn exist(self) -> Result<bool> {
        Ok(self.count().await? > 0)
    }

    /// Returns the single matching row.
    ///
    /// Fails with a record-not-found error when nothing matches and with an
    /// invalid-record-count error when more than one row does.
    pub async fn one<M: Model>(mut self) -> Result<M> {
        self.limit = Some(2);
        let name = self.schema().short_name().to_string();

        let mut records = self.records::<M>().await?;

        match records.len() {
            0 => Err(Error::record_not_found(name)),
            1 => M::load(records.remove(0)),
            _ => Err(Error::invalid_record_count(format!(
                "expected one `{name}`, query matched several"
            ))),
        }
    }

    /// Returns the matching rows.
    ///
    /// Without an explicit limit, at most
    /// [`SessionConfig::default_rows_limit`](crate::SessionConfig) rows are
    /// returned.
    pub async fn all<M: Model>(self) -> Result<Vec<M>> {
        self.records::<M>()
            .await?
            .into_iter()
            .map(M::load)
            .collect()
    }

    /// Returns the matching rows as field name to value maps. Empty
    /// `fields` selects every column.
    pub async fn values(self, fields: &[&str]) -> Result<Vec<Params>> {
        let (names, rows) = self.projection(fields).await?;

        Ok(rows
            .into_iter()
            .map(|row| names.iter().cloned().zip(row).collect())
            .collect())
    }

    /// Returns the matching rows as value lists ordered like `fields`.
    pub async fn values_list(self, fields: &[&str]) -> Result<Vec<Vec<Value>>> {
        Ok(self.projection(fields).await?.1)
    }

    /// Returns one field of every matching row.
    pub async fn values_flat(self, field: &str) -> Result<Vec<Value>> {
        let (_, rows) = self.projection(&[field]).await?;
        Ok(rows.into_iter().filter_map(|row| row.into_iter().next()).collect())
    }

    /// Updates the matching rows with `values`, keyed by field name.
    pub async fn update(self, values: Params) -> Result<u64> {
        if values.is_empty() {
            return Err(Error::args("update needs at least one value"));
        }

        let assignments = values
            .into_iter()
            .map(|(name, value)| {
                Ok(Assignment {
                    column: self.resolve_column(&name)?,
                    value,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let (session, cx, table, filter) = self.into_mutation()?;

        let update = Update {
            table,
            assignments,
            filter,
        };

        Ok(session.exec(&cx, update).await?.rows.len())
    }

    /// Deletes the matching rows.
    pub async fn delete(self) -> Result<u64> {
        let (session, cx, table, filter) = self.into_mutation()?;
        Ok(session.exec(&cx, Delete { table, filter }).await?.rows.len())
    }

    fn schema(&self) -> &ModelSchema {
        self.registry.model(self.model)
    }

    /// Column of a field of the queried model. Relation paths are not
    /// resolvable here.
    fn resolve_column(&self, name: &str) -> Result<String> {
        let schema = self.schema();

        if name.contains(SEPARATOR) {
            return Err(Error::unknown_field(schema.short_name(), name));
        }

        crate::session::column_field(schema, name).map(|field| field.column.clone())
    }

    fn filter_expr(&self) -> Result<Option<Expr>> {
        if let Some(err) = &self.error {
            return Err(err.clone());
        }

        let cond = Lower::new(&self.registry).condition(self.schema(), &self.cond)?;

        Ok(match (cond, self.scope.clone()) {
            (Some(cond), Some(scope)) => Some(Expr::and([scope, cond])),
            (cond, scope) => cond.or(scope),
        })
    }

    fn into_select(self, columns: Vec<String>) -> Result<(&'a mut Session, Context, Select)> {
        let filter = self.filter_expr()?;

        let mut select = Select::new(&self.schema().table_name, columns);
        select.filter = filter;
        select.order_by = self.order;
        select.limit = self.limit.or(self.session.config().default_rows_limit);
        select.offset = self.offset;
        select.distinct = self.distinct;
        select.for_update = self.for_update;

        Ok((self.session, self.cx, select))
    }

    fn into_mutation(self) -> Result<(&'a mut Session, Context, String, Option<Expr>)> {
        let filter = self.filter_expr()?;
        let table = self.schema().table_name.clone();

        if filter.is_none() && !self.allow_full_table {
            return Err(Error::empty_condition_forbidden(table));
        }

        Ok((self.session, self.cx, table, filter))
    }

    async fn records<M: Model>(self) -> Result<Vec<crate::Record>> {
        let registry = self.registry.clone();
        let schema = registry.model(self.model);
        let expected = registry.resolve_type::<M>()?;

        if expected.id != schema.id {
            return Err(Error::args(format!(
                "query over `{}` cannot load `{}`",
                schema.short_name(),
                expected.short_name()
            )));
        }

        let depth = self.depth;
        let (session, cx, select) = self.into_select(schema.column_names())?;

        let mut records = session.query_records(&cx, schema, select).await?;

        if let Some(depth) = depth.filter(|depth| *depth > 0) {
            preload(session, &cx, &registry, schema, &mut records, depth).await?;
        }

        Ok(records)
    }

    async fn projection(self, fields: &[&str]) -> Result<(Vec<String>, Vec<Vec<Value>>)> {
        let registry = self.registry.clone();
        let schema = registry.model(self.model);

        let selected = if fields.is_empty() {
            schema.columns().collect::<Vec<_>>()
        } else {
            fields
                .iter()
                .map(|name| {
                    if name.contains(SEPARATOR) {
                        return Err(Error::unknown_field(schema.short_name(), *name));
                    }
                    crate::session::column_field(schema, name)
                })
                .collect::<Result<_>>()?
        };

        let names: Vec<String> = if fields.is_empty() {
            selected.iter().map(|field| field.name.clone()).collect()
        } else {
            fields.iter().map(|name| name.to_string()).collect()
        };

        let columns = selected.iter().map(|field| field.column.clone()).collect();
        let (session, cx, select) = self.into_select(columns)?;
        let tz = session.time_zone();

        let (_, rows) = rows(session.exec(&cx, select).await?)?;

        let rows = rows
            .into_iter()
            .map(|row| {
                selected
                    .iter()
                    .zip(row)
                    .map(|(field, value)| mapper::from_db(field, value, &tz))
                    .collect::<Result<Vec<_>>>()
            })
            .collect::<Result<_>>()?;

        Ok((names, rows))
    }
}

use crate::{session::rows, Model, Session};

use quarry_core::{
    stmt::{Delete, Expr, Insert, Select, Value},
    Context, Error, Result,
};

/// Edits the join table of a many-to-many relation for one instance.
///
/// Keys passed in are primary keys of the related model.
#[derive(Debug)]
pub struct QueryM2M<'a> {
    session: &'a mut Session,
    cx: Context,
    table: String,
    /// Join column holding the instance's key.
    this: String,
    /// Join column holding the related key.
    other: String,
    key: Value,
}

impl Session {
    /// Starts editing the many-to-many relation `field` of `model`.
    pub fn query_m2m<M: Model>(&mut self, model: &M, field: &str) -> Result<QueryM2M<'_>> {
        self.query_m2m_with_ctx(&Context::background(), model, field)
    }

    pub fn query_m2m_with_ctx<M: Model>(
        &mut self,
        cx: &Context,
        model: &M,
        field: &str,
    ) -> Result<QueryM2M<'_>> {
        let registry = self.registry().clone();
        let schema = registry.resolve_type::<M>()?;
        let field = schema
            .field_by_name(field)
            .ok_or_else(|| Error::unknown_field(schema.short_name(), field))?;

        let join = registry
            .join_columns(field)
            .ok_or_else(|| Error::not_relation(schema.short_name(), &field.name, "many-to-many"))?;

        let key = model.value(schema.primary_key);
        if key.is_unset() {
            return Err(Error::missing_primary_key(schema.short_name()));
        }

        Ok(QueryM2M {
            session: self,
            cx: cx.clone(),
            table: join.through.table_name.clone(),
            this: join.this.to_string(),
            other: join.other.to_string(),
            key,
        })
    }
}

impl QueryM2M<'_> {
    /// Links the related keys. Returns the number of links inserted.
    pub async fn add<V: Into<Value>>(&mut self, keys: impl IntoIterator<Item = V>) -> Result<u64> {
        let mut insert = Insert::new(&self.table, vec![self.this.clone(), self.other.clone()]);
        for key in keys {
            insert = insert.row(vec![self.key.clone(), key.into()]);
        }

        if insert.rows.is_empty() {
            return Err(Error::args("add needs at least one key"));
        }

        Ok(self.session.exec(&self.cx, insert).await?.rows.len())
    }

    /// Unlinks the related keys. Returns the number of links removed.
    pub async fn remove<V: Into<Value>>(
        &mut self,
        keys: impl IntoIterator<Item = V>,
    ) -> Result<u64> {
        let keys: Vec<Value> = keys.into_iter().map(Into::into).collect();
        if keys.is_empty() {
            return Err(Error::args("remove needs at least one key"));
        }

        let delete = Delete {
            table: self.table.clone(),
            filter: Some(Expr::and([
                Expr::eq(&self.this, self.key.clone()),
                Expr::in_list(&self.other, keys),
            ])),
        };

        Ok(self.session.exec(&self.cx, delete).await?.rows.len())
    }

    /// Returns `true` when the related key is linked.
    pub async fn exist(&mut self, key: impl Into<Value>) -> Result<bool> {
        let filter = Expr::and([
            Expr::eq(&self.this, self.key.clone()),
            Expr::eq(&self.other, key.into()),
        ]);
        Ok(self.count_where(filter).await? > 0)
    }

    /// Removes every link of the instance.
    pub async fn clear(&mut self) -> Result<u64> {
        let delete = Delete {
            table: self.table.clone(),
            filter: Some(Expr::eq(&self.this, self.key.clone())),
        };

        Ok(self.session.exec(&self.cx, delete).await?.rows.len())
    }

    /// Number of related keys linked to the instance.
    pub async fn count(&mut self) -> Result<u64> {
        let filter = Expr::eq(&self.this, self.key.clone());
        self.count_where(filter).await
    }

    async fn count_where(&mut self, filter: Expr) -> Result<u64> {
        let select = Select::count(&self.table).filter(filter);
        let (_, rows) = rows(self.session.exec(&self.cx, select).await?)?;

        rows.into_iter()
            .next()
            .and_then(|row| row.into_iter().next())
            .unwrap_or(Value::I64(0))
            .to()
    }
}

//! Single-instance operations: insert, read, update, delete and upsert.

use super::{rows, Session};
use crate::{mapper, Model};

use quarry_core::{
    driver::{Response, Rows},
    schema::{Field, Model as ModelSchema},
    stmt::{Assignment, Delete, Expr, Insert, OnConflict, Select, Type, Update, Value},
    Context, Error, Result,
};

impl Session {
    /// Inserts `model` and returns its identity.
    ///
    /// An unset auto-increment key is left to the database and the
    /// generated identity is written back into `model`.
    pub async fn insert<M: Model>(&mut self, model: &mut M) -> Result<i64> {
        self.insert_with_ctx(&Context::background(), model).await
    }

    pub async fn insert_with_ctx<M: Model>(&mut self, cx: &Context, model: &mut M) -> Result<i64> {
        let registry = self.registry.clone();
        let schema = registry.resolve_type::<M>()?;
        let pk = schema.primary_key();

        let include_pk = !(pk.auto && model.value(pk.id.index).is_unset());
        let fields = insert_fields(schema, include_pk);

        let mut insert = Insert::new(&schema.table_name, columns_of(&fields))
            .row(fields.iter().map(|field| model.value(field.id.index)).collect());

        if !include_pk && self.capability().returning_identity {
            insert.returning = Some(pk.column.clone());
        }

        let response = self.exec(cx, insert).await?;

        if include_pk {
            return Ok(identity(&model.value(pk.id.index)));
        }

        let id = generated_identity(response).ok_or_else(|| {
            quarry_core::err!("driver did not report the identity of the inserted row")
        })?;
        self.write_identity(schema, model, id)?;
        Ok(id)
    }

    /// Inserts `models` and returns the number of rows inserted.
    ///
    /// With `bulk <= 1` every model is inserted on its own and gets its
    /// identity written back. Larger values send multi-row inserts of up to
    /// `bulk` rows; identities are not written back then. Within a chunk,
    /// rows with an explicit key are sent in a separate statement from rows
    /// whose key is generated.
    pub async fn insert_multi<M: Model>(&mut self, bulk: usize, models: &mut [M]) -> Result<u64> {
        self.insert_multi_with_ctx(&Context::background(), bulk, models)
            .await
    }

    #[tracing::instrument(level = "debug", skip(self, cx, models), fields(rows = models.len()))]
    pub async fn insert_multi_with_ctx<M: Model>(
        &mut self,
        cx: &Context,
        bulk: usize,
        models: &mut [M],
    ) -> Result<u64> {
        if models.is_empty() {
            return Err(Error::args("insert_multi needs at least one model"));
        }

        let registry = self.registry.clone();
        let schema = registry.resolve_type::<M>()?;
        let pk = schema.primary_key();

        let generated_fields = insert_fields(schema, false);

        if bulk <= 1 || generated_fields.is_empty() {
            for model in models.iter_mut() {
                self.insert_with_ctx(cx, model).await?;
            }
            return Ok(models.len() as u64);
        }

        let keyed_fields = insert_fields(schema, true);
        let mut inserted = 0;

        for chunk in models.chunks(bulk) {
            // Rows carrying their own key are inserted apart from rows whose
            // key the database generates.
            let (keyed, generated): (Vec<&M>, Vec<&M>) = chunk
                .iter()
                .partition(|model| !pk.auto || !model.value(pk.id.index).is_unset());

            for (rows, fields) in [(keyed, &keyed_fields), (generated, &generated_fields)] {
                if rows.is_empty() {
                    continue;
                }

                let mut insert = Insert::new(&schema.table_name, columns_of(fields));
                for model in rows {
                    insert =
                        insert.row(fields.iter().map(|field| model.value(field.id.index)).collect());
                }

                inserted += self.exec(cx, insert).await?.rows.len();
            }
        }

        Ok(inserted)
    }

    /// Updates the row of `model`, matched by primary key.
    ///
    /// `columns` names the fields to write; empty means every non-key
    /// column.
    pub async fn update<M: Model>(&mut self, model: &M, columns: &[&str]) -> Result<u64> {
        self.update_with_ctx(&Context::background(), model, columns)
            .await
    }

    pub async fn update_with_ctx<M: Model>(
        &mut self,
        cx: &Context,
        model: &M,
        columns: &[&str],
    ) -> Result<u64> {
        let registry = self.registry.clone();
        let schema = registry.resolve_type::<M>()?;
        let filter = key_filter(schema, model, &[])?;

        let fields = if columns.is_empty() {
            schema.columns().filter(|field| !field.primary_key).collect()
        } else {
            columns
                .iter()
                .map(|name| column_field(schema, name))
                .collect::<Result<Vec<_>>>()?
        };

        if fields.is_empty() {
            return Err(Error::args(format!(
                "`{}` has no columns to update",
                schema.short_name()
            )));
        }

        let update = Update {
            table: schema.table_name.clone(),
            assignments: fields
                .iter()
                .map(|field| Assignment {
                    column: field.column.clone(),
                    value: model.value(field.id.index),
                })
                .collect(),
            filter: Some(filter),
        };

        Ok(self.exec(cx, update).await?.rows.len())
    }

    /// Deletes the rows matching `model` on `columns` (default: the primary
    /// key). Resets an integer key to zero when a row was removed.
    pub async fn delete<M: Model>(&mut self, model: &mut M, columns: &[&str]) -> Result<u64> {
        self.delete_with_ctx(&Context::background(), model, columns)
            .await
    }

    pub async fn delete_with_ctx<M: Model>(
        &mut self,
        cx: &Context,
        model: &mut M,
        columns: &[&str],
    ) -> Result<u64> {
        let registry = self.registry.clone();
        let schema = registry.resolve_type::<M>()?;

        let delete = Delete {
            table: schema.table_name.clone(),
            filter: Some(key_filter(schema, model, columns)?),
        };

        let affected = self.exec(cx, delete).await?.rows.len();

        let pk = schema.primary_key();
        if affected > 0 && pk.storage_ty().is_some_and(|ty| ty.is_integer()) {
            self.write_identity(schema, model, 0)?;
        }

        Ok(affected)
    }

    /// Loads the row matching `model` on `columns` (default: the primary
    /// key) into `model`.
    pub async fn read<M: Model>(&mut self, model: &mut M, columns: &[&str]) -> Result<()> {
        self.read_with_ctx(&Context::background(), model, columns)
            .await
    }

    pub async fn read_with_ctx<M: Model>(
        &mut self,
        cx: &Context,
        model: &mut M,
        columns: &[&str],
    ) -> Result<()> {
        self.read_impl(cx, model, columns, false).await
    }

    /// Like [`read`](Self::read), locking the row with `FOR UPDATE` where
    /// the database supports it.
    pub async fn read_for_update<M: Model>(
        &mut self,
        model: &mut M,
        columns: &[&str],
    ) -> Result<()> {
        self.read_for_update_with_ctx(&Context::background(), model, columns)
            .await
    }

    pub async fn read_for_update_with_ctx<M: Model>(
        &mut self,
        cx: &Context,
        model: &mut M,
        columns: &[&str],
    ) -> Result<()> {
        self.read_impl(cx, model, columns, true).await
    }

    async fn read_impl<M: Model>(
        &mut self,
        cx: &Context,
        model: &mut M,
        columns: &[&str],
        for_update: bool,
    ) -> Result<()> {
        let registry = self.registry.clone();
        let schema = registry.resolve_type::<M>()?;

        let mut select = Select::new(&schema.table_name, schema.column_names())
            .filter(key_filter(schema, model, columns)?);
        select.limit = Some(1);
        select.for_update = for_update;

        let record = self
            .query_records(cx, schema, select)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| Error::record_not_found(schema.short_name()))?;

        record.apply(model)
    }

    /// Reads the row matching `model` on `column` and `columns`, inserting
    /// `model` when there is none. Returns whether a row was created and
    /// the identity.
    ///
    /// The read and the insert are separate statements; a concurrent insert
    /// of the same row surfaces as the driver's constraint error.
    pub async fn read_or_create<M: Model>(
        &mut self,
        model: &mut M,
        column: &str,
        columns: &[&str],
    ) -> Result<(bool, i64)> {
        self.read_or_create_with_ctx(&Context::background(), model, column, columns)
            .await
    }

    pub async fn read_or_create_with_ctx<M: Model>(
        &mut self,
        cx: &Context,
        model: &mut M,
        column: &str,
        columns: &[&str],
    ) -> Result<(bool, i64)> {
        let mut lookup = vec![column];
        lookup.extend_from_slice(columns);

        match self.read_with_ctx(cx, model, &lookup).await {
            Ok(()) => {
                let registry = self.registry.clone();
                let schema = registry.resolve_type::<M>()?;
                Ok((false, identity(&model.value(schema.primary_key))))
            }
            Err(err) if err.is_record_not_found() => {
                let id = self.insert_with_ctx(cx, model).await?;
                Ok((true, id))
            }
            Err(err) => Err(err),
        }
    }

    /// Inserts `model`, or updates the existing row when the insert
    /// conflicts on `conflict` columns (default: the primary key). Returns
    /// the identity of the row.
    ///
    /// Databases without a native upsert get a read followed by an insert
    /// or an update.
    pub async fn insert_or_update<M: Model>(
        &mut self,
        model: &mut M,
        conflict: &[&str],
    ) -> Result<i64> {
        self.insert_or_update_with_ctx(&Context::background(), model, conflict)
            .await
    }

    pub async fn insert_or_update_with_ctx<M: Model>(
        &mut self,
        cx: &Context,
        model: &mut M,
        conflict: &[&str],
    ) -> Result<i64> {
        let registry = self.registry.clone();
        let schema = registry.resolve_type::<M>()?;
        let pk = schema.primary_key();

        let target: Vec<&Field> = if conflict.is_empty() {
            vec![pk]
        } else {
            conflict
                .iter()
                .map(|name| column_field(schema, name))
                .collect::<Result<_>>()?
        };

        if !self.capability().native_upsert {
            return self.emulated_upsert(cx, schema, model, &target).await;
        }

        let pk_unset = model.value(pk.id.index).is_unset();
        let fields = insert_fields(schema, !(pk.auto && pk_unset));

        let mut insert = Insert::new(&schema.table_name, columns_of(&fields))
            .row(fields.iter().map(|field| model.value(field.id.index)).collect());

        insert.on_conflict = Some(OnConflict {
            target: target.iter().map(|field| field.column.clone()).collect(),
            update: fields
                .iter()
                .filter(|field| !field.primary_key && !target.contains(*field))
                .map(|field| field.column.clone())
                .collect(),
        });

        if pk_unset && self.capability().returning_identity {
            insert.returning = Some(pk.column.clone());
        }

        let response = self.exec(cx, insert).await?;

        if !pk_unset {
            return Ok(identity(&model.value(pk.id.index)));
        }

        // An update through the conflict clause reports no usable insert
        // id, so the key is read back by the conflict columns.
        let targets_pk = target.len() == 1 && target[0].primary_key;

        let id = match generated_identity(response) {
            Some(id) if targets_pk || self.capability().returning_identity => id,
            _ => {
                let filter = Expr::and(
                    target
                        .iter()
                        .map(|field| Expr::eq(&field.column, model.value(field.id.index))),
                );
                self.select_identity(cx, schema, filter)
                    .await?
                    .ok_or_else(|| Error::record_not_found(schema.short_name()))?
            }
        };

        self.write_identity(schema, model, id)?;
        Ok(id)
    }

    async fn emulated_upsert<M: Model>(
        &mut self,
        cx: &Context,
        schema: &ModelSchema,
        model: &mut M,
        target: &[&Field],
    ) -> Result<i64> {
        let filter = Expr::and(
            target
                .iter()
                .map(|field| Expr::eq(&field.column, model.value(field.id.index))),
        );

        match self.select_identity(cx, schema, filter).await? {
            Some(id) => {
                self.write_identity(schema, model, id)?;
                self.update_with_ctx(cx, model, &[]).await?;
                Ok(id)
            }
            None => self.insert_with_ctx(cx, model).await,
        }
    }

    async fn select_identity(
        &mut self,
        cx: &Context,
        schema: &ModelSchema,
        filter: Expr,
    ) -> Result<Option<i64>> {
        let mut select =
            Select::new(&schema.table_name, vec![schema.primary_key().column.clone()]).filter(filter);
        select.limit = Some(1);

        let (_, rows) = rows(self.exec(cx, select).await?)?;
        let tz = self.time_zone();

        match rows.into_iter().next().and_then(|row| row.into_iter().next()) {
            Some(value) => {
                let value = mapper::convert(Type::I64, value, &tz)?;
                Ok(value.as_i64())
            }
            None => Ok(None),
        }
    }

    fn write_identity<M: Model>(&self, schema: &ModelSchema, model: &mut M, id: i64) -> Result<()> {
        let pk = schema.primary_key();
        let ty = pk.storage_ty().unwrap_or(Type::I64);
        model.set_value(pk.id.index, mapper::convert(ty, Value::I64(id), &self.time_zone())?)
    }
}

/// Column fields written by an insert, optionally without the
/// auto-increment key.
fn insert_fields(schema: &ModelSchema, include_pk: bool) -> Vec<&Field> {
    schema
        .columns()
        .filter(|field| include_pk || !field.auto)
        .collect()
}

fn columns_of(fields: &[&Field]) -> Vec<String> {
    fields.iter().map(|field| field.column.clone()).collect()
}

/// Resolves a field name to a field stored in a column.
pub(crate) fn column_field<'a>(schema: &'a ModelSchema, name: &str) -> Result<&'a Field> {
    schema
        .field_by_name(name)
        .filter(|field| field.has_column())
        .ok_or_else(|| Error::unknown_field(schema.short_name(), name))
}

/// Filter matching `model` on `columns`, or on its primary key when no
/// columns are given.
fn key_filter<M: Model>(schema: &ModelSchema, model: &M, columns: &[&str]) -> Result<Expr> {
    if columns.is_empty() {
        let pk = schema.primary_key();
        let value = model.value(pk.id.index);

        if value.is_unset() {
            return Err(Error::missing_primary_key(schema.short_name()));
        }

        return Ok(Expr::eq(&pk.column, value));
    }

    let exprs = columns
        .iter()
        .map(|name| {
            let field = column_field(schema, name)?;
            Ok(match model.value(field.id.index) {
                Value::Null => Expr::is_null(&field.column, false),
                value => Expr::eq(&field.column, value),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Expr::and(exprs))
}

fn generated_identity(response: Response) -> Option<i64> {
    match response.rows {
        Rows::Count { last_insert_id, .. } => last_insert_id,
        Rows::Values { rows, .. } => rows
            .into_iter()
            .next()
            .and_then(|row| row.into_iter().next())
            .and_then(|value| value.as_i64()),
    }
}

/// Identity reported for a key value; zero for non-integer keys.
fn identity(value: &Value) -> i64 {
    value.as_i64().unwrap_or(0)
}

use crate::{query, Model, QuerySet, Session};

use quarry_core::{
    stmt::{OrderBy, Select},
    Context, Error, Result,
};

/// Options for [`Session::load_related`].
#[derive(Debug, Clone, Default)]
pub struct LoadRelatedOptions {
    depth: Depth,
    limit: Option<u64>,
    offset: Option<u64>,
    order: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default)]
enum Depth {
    /// Only the relation itself.
    #[default]
    None,
    /// The session's `default_related_depth`.
    Default,
    Levels(usize),
}

impl LoadRelatedOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Also preloads the relations of the loaded rows, using the session's
    /// default depth.
    pub fn with_default_depth(mut self) -> Self {
        self.depth = Depth::Default;
        self
    }

    /// Levels to load. The relation itself is the first level; deeper
    /// levels follow foreign keys of the loaded rows.
    pub fn depth(mut self, depth: usize) -> Self {
        self.depth = Depth::Levels(depth);
        self
    }

    /// Ignored for single-valued relations, which load at most one row.
    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Orders the loaded rows; a leading `-` sorts descending.
    pub fn order_by(mut self, fields: &[&str]) -> Self {
        self.order = fields.iter().map(|field| field.to_string()).collect();
        self
    }
}

impl Session {
    /// Starts a query over the rows related to `model` through `field`.
    pub fn query_related<M: Model>(&mut self, model: &M, field: &str) -> Result<QuerySet<'_>> {
        self.query_related_with_ctx(&Context::background(), model, field)
    }

    pub fn query_related_with_ctx<M: Model>(
        &mut self,
        cx: &Context,
        model: &M,
        field: &str,
    ) -> Result<QuerySet<'_>> {
        let registry = self.registry().clone();
        let schema = registry.resolve_type::<M>()?;
        let field = schema
            .field_by_name(field)
            .ok_or_else(|| Error::unknown_field(schema.short_name(), field))?;

        let scope = super::scope(&registry, schema, field, model)?;
        let target = field
            .relation()
            .map(|relation| relation.target)
            .ok_or_else(|| Error::not_relation(schema.short_name(), &field.name, "relation"))?;

        Ok(QuerySet::new(self, cx.clone(), target).scoped(scope))
    }

    /// Loads the rows related to `model` through `field` and hands them to
    /// [`Model::set_related`]. Returns the number of rows loaded.
    pub async fn load_related<M: Model>(
        &mut self,
        model: &mut M,
        field: &str,
        options: LoadRelatedOptions,
    ) -> Result<u64> {
        self.load_related_with_ctx(&Context::background(), model, field, options)
            .await
    }

    #[tracing::instrument(level = "debug", skip(self, cx, model, options))]
    pub async fn load_related_with_ctx<M: Model>(
        &mut self,
        cx: &Context,
        model: &mut M,
        field: &str,
        options: LoadRelatedOptions,
    ) -> Result<u64> {
        let registry = self.registry().clone();
        let schema = registry.resolve_type::<M>()?;
        let field = schema
            .field_by_name(field)
            .ok_or_else(|| Error::unknown_field(schema.short_name(), field))?;

        let scope = super::scope(&registry, schema, field, model)?;
        let Some(relation) = field.relation() else {
            return Err(Error::not_relation(schema.short_name(), &field.name, "relation"));
        };
        let target = registry.model(relation.target);

        let order = options
            .order
            .iter()
            .map(|name| {
                let (name, descending) = match name.strip_prefix('-') {
                    Some(name) => (name, true),
                    None => (name.as_str(), false),
                };
                let column = crate::session::column_field(target, name)?.column.clone();
                Ok(OrderBy { column, descending })
            })
            .collect::<Result<Vec<_>>>()?;

        let mut select = Select::new(&target.table_name, target.column_names()).filter(scope);
        select.order_by = order;
        select.offset = options.offset;
        select.limit = if relation.kind.is_single() {
            Some(1)
        } else {
            options.limit
        };

        let mut records = self.query_records(cx, target, select).await?;

        let depth = match options.depth {
            Depth::None => 0,
            Depth::Default => self.config().default_related_depth,
            Depth::Levels(levels) => levels,
        };

        if depth > 1 {
            query::preload(self, cx, &registry, target, &mut records, depth - 1).await?;
        }

        let loaded = records.len() as u64;
        model.set_related(field.id.index, records)?;
        Ok(loaded)
    }
}

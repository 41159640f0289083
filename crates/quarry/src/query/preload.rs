use crate::{Record, Session};

use indexmap::IndexMap;
use quarry_core::{
    schema::{Model, Registry},
    stmt::{Expr, Select},
    Context, Result,
};

/// Preloads the foreign key and one-to-one relations of `records`.
///
/// Each relation field costs one `IN` query per level. Loaded rows get
/// their own relations preloaded with `depth - 1`.
pub(crate) async fn forward(
    session: &mut Session,
    cx: &Context,
    registry: &Registry,
    model: &Model,
    records: &mut [Record],
    depth: usize,
) -> Result<()> {
    if depth == 0 || records.is_empty() {
        return Ok(());
    }

    for field in &model.fields {
        let Some(relation) = field.relation().filter(|relation| relation.kind.is_forward()) else {
            continue;
        };

        let target = registry.model(relation.target);
        let pk = target.primary_key();

        let mut keys = IndexMap::new();
        for record in records.iter() {
            if let Some(key) = record.get(field.id.index).filter(|key| !key.is_null()) {
                keys.entry(key.to_string()).or_insert_with(|| key.clone());
            }
        }

        if keys.is_empty() {
            continue;
        }

        let select = Select::new(&target.table_name, target.column_names())
            .filter(Expr::in_list(&pk.column, keys.into_values().collect()));

        let mut related = session.query_records(cx, target, select).await?;
        Box::pin(forward(session, cx, registry, target, &mut related, depth - 1)).await?;

        let by_key: IndexMap<String, Record> = related
            .into_iter()
            .filter_map(|record| Some((record.get(pk.id.index)?.to_string(), record)))
            .collect();

        for record in records.iter_mut() {
            let found = record
                .get(field.id.index)
                .and_then(|key| by_key.get(&key.to_string()))
                .cloned();

            if let Some(found) = found {
                record.related.push((field.id.index, vec![found]));
            }
        }

        tracing::trace!(
            model = model.short_name(),
            field = %field.name,
            loaded = by_key.len(),
            depth,
            "preloaded relation"
        );
    }

    Ok(())
}

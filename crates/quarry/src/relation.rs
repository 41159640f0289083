mod belongs_to;
pub use belongs_to::BelongsTo;

mod has_many;
pub use has_many::HasMany;

mod has_one;
pub use has_one::HasOne;

mod load;
pub use load::LoadRelatedOptions;

mod m2m;
pub use m2m::QueryM2M;

use crate::Model;

use quarry_core::{
    schema::{Field, Model as ModelSchema, Registry, RelationKind},
    stmt::{Expr, Select},
    Error, Result,
};

/// Restriction selecting the rows of `field`'s target that are related to
/// `model`.
fn scope<M: Model>(
    registry: &Registry,
    schema: &ModelSchema,
    field: &Field,
    model: &M,
) -> Result<Expr> {
    let relation = field
        .relation()
        .ok_or_else(|| Error::not_relation(schema.short_name(), &field.name, "relation"))?;
    let target = registry.model(relation.target);

    if relation.kind.is_forward() {
        let key = model.value(field.id.index);
        return Ok(if key.is_null() {
            Expr::Or(vec![])
        } else {
            Expr::eq(&target.primary_key().column, key)
        });
    }

    let pk = model.value(schema.primary_key);
    if pk.is_unset() {
        return Err(Error::missing_primary_key(schema.short_name()));
    }

    match relation.kind {
        RelationKind::ReverseOne | RelationKind::ReverseMany => {
            let pair = relation
                .pair
                .map(|pair| registry.field(pair))
                .ok_or_else(|| {
                    Error::dangling_relation(schema.short_name(), &field.name, &target.name)
                })?;
            Ok(Expr::eq(&pair.column, pk))
        }
        _ => {
            let join = registry
                .join_columns(field)
                .ok_or_else(|| Error::not_relation(schema.short_name(), &field.name, "relation"))?;

            Ok(Expr::in_subquery(
                &target.primary_key().column,
                Select::new(&join.through.table_name, vec![join.other.to_string()])
                    .filter(Expr::eq(join.this, pk)),
            ))
        }
    }
}

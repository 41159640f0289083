use super::{Builder, Field, FieldId, FieldTy, Model, ModelId, RelationKind};
use crate::{Error, Result};

use indexmap::IndexMap;

/// Resolved metadata of every registered model.
///
/// Read-only once built; share it behind an `Arc`.
#[derive(Debug, Default)]
pub struct Registry {
    pub(super) models: Vec<Model>,
    pub(super) by_name: IndexMap<String, ModelId>,
    pub(super) by_table: IndexMap<String, ModelId>,
}

/// Join table columns of a many-to-many relation, as seen from one side.
#[derive(Debug, Clone, Copy)]
pub struct JoinColumns<'a> {
    pub through: &'a Model,
    /// Column holding the key of the model that declares the field.
    pub this: &'a str,
    /// Column holding the key of the related model.
    pub other: &'a str,
}

impl Registry {
    pub fn builder() -> Builder {
        Builder::new()
    }

    pub fn model(&self, id: ModelId) -> &Model {
        &self.models[id.0]
    }

    pub fn field(&self, id: FieldId) -> &Field {
        &self.models[id.model.0].fields[id.index]
    }

    pub fn models(&self) -> impl Iterator<Item = &Model> + '_ {
        self.models.iter()
    }

    /// Looks a model up by its fully-qualified name.
    pub fn resolve(&self, name: &str) -> Option<&Model> {
        self.by_name.get(name).map(|id| self.model(*id))
    }

    /// Looks up the model registered for `T`.
    pub fn resolve_type<T: ?Sized + 'static>(&self) -> Result<&Model> {
        let name = std::any::type_name::<T>();
        self.resolve(name)
            .ok_or_else(|| Error::model_not_registered(name))
    }

    pub fn resolve_table(&self, table: &str) -> Option<&Model> {
        self.by_table.get(table).map(|id| self.model(*id))
    }

    /// Join columns for a `ManyToMany` or `ReverseManyToMany` field.
    pub fn join_columns(&self, field: &Field) -> Option<JoinColumns<'_>> {
        let relation = field.relation()?;
        let through = self.model(relation.through?);

        // Join models are laid out as `id`, source key, target key.
        let (source, target) = (&through.fields[1].column, &through.fields[2].column);

        match relation.kind {
            RelationKind::ManyToMany => Some(JoinColumns {
                through,
                this: source,
                other: target,
            }),
            RelationKind::ReverseManyToMany => Some(JoinColumns {
                through,
                this: target,
                other: source,
            }),
            _ => None,
        }
    }

    pub(super) fn verify(&self) -> Result<()> {
        for model in &self.models {
            if !matches!(model.primary_key().ty, FieldTy::Primitive(_)) {
                return Err(Error::invalid_model(
                    model.short_name(),
                    "primary key must be a primitive field",
                ));
            }

            for field in &model.fields {
                let Some(relation) = field.relation() else {
                    continue;
                };

                debug_assert!(relation.target.0 < self.models.len());

                if relation.kind.is_reverse() && relation.pair.is_none() {
                    return Err(Error::dangling_relation(
                        model.short_name(),
                        &field.name,
                        &self.model(relation.target).name,
                    ));
                }

                if relation.kind.is_many_to_many() && relation.through.is_none() {
                    return Err(Error::invalid_tag(
                        model.short_name(),
                        &field.name,
                        "many-to-many relation has no join table",
                    ));
                }
            }
        }

        Ok(())
    }
}

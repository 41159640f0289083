use super::{
    def::{FieldDefKind, RelationDef},
    model::short_name,
    Field, FieldDef, FieldId, FieldTy, Index, Model, ModelDef, ModelId, Precision, Registry,
    Relation, RelationKind,
};
use crate::{stmt::Type, Error, Result};

use heck::ToSnakeCase;
use indexmap::IndexMap;

/// Collects model declarations and resolves them into a [`Registry`].
///
/// Registration validates each declaration on its own. Relations are bound
/// in [`Builder::build`], once every model is known, so models may be
/// registered in any order.
#[derive(Debug, Default)]
pub struct Builder {
    models: Vec<Model>,

    /// Relation declarations, resolved in `build`.
    relations: Vec<PendingRelation>,

    /// Requested join table names of many-to-many fields.
    through_tables: IndexMap<FieldId, String>,

    by_name: IndexMap<String, ModelId>,
    by_table: IndexMap<String, ModelId>,
}

#[derive(Debug)]
struct PendingRelation {
    field: FieldId,
    def: RelationDef,
    via: Option<String>,
}

/// Placeholder until relations are resolved.
const UNRESOLVED: ModelId = ModelId(usize::MAX);

impl Builder {
    pub fn new() -> Builder {
        Builder::default()
    }

    /// Registers a model with the default table name.
    pub fn register(&mut self, def: ModelDef) -> Result<ModelId> {
        self.register_with(def, "", "")
    }

    /// Registers a model whose table name gets `prefix` prepended.
    pub fn register_with_prefix(&mut self, def: ModelDef, prefix: &str) -> Result<ModelId> {
        self.register_with(def, prefix, "")
    }

    /// Registers a model whose table name gets `suffix` appended.
    pub fn register_with_suffix(&mut self, def: ModelDef, suffix: &str) -> Result<ModelId> {
        self.register_with(def, "", suffix)
    }

    pub fn register_with(&mut self, def: ModelDef, prefix: &str, suffix: &str) -> Result<ModelId> {
        if self.by_name.contains_key(&def.name) {
            return Err(Error::duplicate_model(&def.name));
        }

        let id = ModelId(self.models.len());
        let short = short_name(&def.name).to_string();

        let table_name = match &def.table {
            Some(table) => table.clone(),
            None => format!("{prefix}{}{suffix}", short.to_snake_case()),
        };

        if self.by_table.contains_key(&table_name) {
            return Err(Error::duplicate_model(format!(
                "{} (table `{table_name}`)",
                def.name
            )));
        }

        let mut fields = Vec::with_capacity(def.fields.len());
        let mut relations = vec![];
        let mut through_tables = vec![];

        for (index, field_def) in def.fields.iter().enumerate() {
            let field_id = FieldId { model: id, index };

            if def.fields[..index].iter().any(|f| f.name == field_def.name) {
                return Err(Error::invalid_tag(
                    &short,
                    &field_def.name,
                    "duplicate field name",
                ));
            }

            let field = verify_field(&short, field_id, field_def)?;

            if let FieldDefKind::Relation(relation) = &field_def.kind {
                relations.push(PendingRelation {
                    field: field_id,
                    def: relation.clone(),
                    via: field_def.via.clone(),
                });

                if let Some(table) = &field_def.through_table {
                    through_tables.push((field_id, table.clone()));
                }
            }

            fields.push(field);
        }

        for (index, field) in fields.iter().enumerate() {
            if field.has_column()
                && fields[..index]
                    .iter()
                    .any(|other| other.has_column() && other.column == field.column)
            {
                return Err(Error::invalid_tag(
                    &short,
                    &field.name,
                    format!("column `{}` is used twice", field.column),
                ));
            }
        }

        let primary_key = find_primary_key(&short, &mut fields)?;

        let mut indices = vec![];
        for index in &def.indices {
            let mut columns = vec![];
            for name in &index.fields {
                let field = fields
                    .iter()
                    .find(|field| &field.name == name && field.has_column())
                    .ok_or_else(|| {
                        Error::invalid_model(
                            &short,
                            format!("index names unknown field `{name}`"),
                        )
                    })?;
                columns.push(field.column.clone());
            }

            indices.push(Index {
                name: format!("{}_{}", table_name, columns.join("_")),
                columns,
                unique: index.unique,
            });
        }

        self.models.push(Model {
            id,
            name: def.name.clone(),
            table_name: table_name.clone(),
            fields,
            primary_key,
            is_through: false,
            indices,
        });
        self.relations.extend(relations);
        self.through_tables.extend(through_tables);
        self.by_name.insert(def.name, id);
        self.by_table.insert(table_name, id);

        Ok(id)
    }

    /// Resolves every relation and generates join models.
    pub fn build(mut self) -> Result<Registry> {
        let relations = std::mem::take(&mut self.relations);

        // Bind targets and forward key types.
        for pending in &relations {
            let target = match self.by_name.get(&pending.def.target) {
                Some(target) => *target,
                None => {
                    let model = &self.models[pending.field.model.0];
                    return Err(Error::invalid_tag(
                        model.short_name(),
                        &model.fields[pending.field.index].name,
                        format!(
                            "relation target `{}` is not registered",
                            pending.def.target
                        ),
                    ));
                }
            };

            let key = self.models[target.0].primary_key().storage_ty();
            let field = self.field_mut(pending.field);
            if let FieldTy::Relation {
                relation,
                key: key_ty,
            } = &mut field.ty
            {
                relation.target = target;
                if let Some(key) = key {
                    *key_ty = key;
                }
            }
        }

        // Reverse relations must find their forward reciprocal.
        for pending in relations.iter().filter(|p| p.def.kind.is_reverse()) {
            let pair = self.find_reciprocal(pending)?;
            let pair_kind = self.relation(pair).kind;

            let field = self.field_mut(pending.field);
            if let FieldTy::Relation { relation, .. } = &mut field.ty {
                relation.pair = Some(pair);
                if pair_kind == RelationKind::ManyToMany {
                    relation.kind = RelationKind::ReverseManyToMany;
                }
            }

            let forward = self.field_mut(pair);
            if let FieldTy::Relation { relation, .. } = &mut forward.ty {
                relation.pair.get_or_insert(pending.field);
            }
        }

        // Forward relations naming their reciprocal explicitly.
        for pending in relations.iter().filter(|p| !p.def.kind.is_reverse()) {
            let Some(via) = &pending.via else { continue };
            let target = self.relation(pending.field).target;
            let target_model = &self.models[target.0];

            let pair = target_model
                .fields
                .iter()
                .find(|field| &field.name == via && field.is_relation())
                .map(|field| field.id)
                .ok_or_else(|| {
                    let model = &self.models[pending.field.model.0];
                    Error::invalid_tag(
                        model.short_name(),
                        &model.fields[pending.field.index].name,
                        format!("`via` names unknown relation `{via}` on `{}`", target_model.name),
                    )
                })?;

            if let FieldTy::Relation { relation, .. } = &mut self.field_mut(pending.field).ty {
                relation.pair = Some(pair);
            }
        }

        for pending in relations
            .iter()
            .filter(|p| p.def.kind == RelationKind::ManyToMany)
        {
            let through = self.build_through_model(pending.field)?;

            if let FieldTy::Relation { relation, .. } = &mut self.field_mut(pending.field).ty {
                relation.through = Some(through);
            }

            // The reverse side shares the join model.
            let reverse = self
                .models
                .iter()
                .flat_map(|model| model.fields.iter())
                .find(|field| {
                    field.relation().is_some_and(|relation| {
                        relation.kind == RelationKind::ReverseManyToMany
                            && relation.pair == Some(pending.field)
                    })
                })
                .map(|field| field.id);

            if let Some(reverse) = reverse {
                if let FieldTy::Relation { relation, .. } = &mut self.field_mut(reverse).ty {
                    relation.through = Some(through);
                }
            }
        }

        let registry = Registry {
            models: self.models,
            by_name: self.by_name,
            by_table: self.by_table,
        };

        registry.verify()?;

        Ok(registry)
    }

    fn field_mut(&mut self, id: FieldId) -> &mut Field {
        &mut self.models[id.model.0].fields[id.index]
    }

    fn relation(&self, id: FieldId) -> &Relation {
        match &self.models[id.model.0].fields[id.index].ty {
            FieldTy::Relation { relation, .. } => relation,
            FieldTy::Primitive(_) => unreachable!("field {id:?} is not a relation"),
        }
    }

    fn find_reciprocal(&self, pending: &PendingRelation) -> Result<FieldId> {
        let model = &self.models[pending.field.model.0];
        let field = &model.fields[pending.field.index];
        let target = &self.models[self.relation(pending.field).target.0];

        let accepts = |kind: RelationKind| match pending.def.kind {
            RelationKind::ReverseOne => kind == RelationKind::OneToOne,
            _ => matches!(kind, RelationKind::ForeignKey | RelationKind::ManyToMany),
        };

        let candidates: Vec<_> = target
            .fields
            .iter()
            .filter(|candidate| {
                candidate.relation().is_some_and(|relation| {
                    relation.target == model.id && accepts(relation.kind)
                })
            })
            .filter(|candidate| match &pending.via {
                Some(via) => &candidate.name == via,
                None => true,
            })
            .collect();

        match candidates.as_slice() {
            [] => Err(Error::dangling_relation(
                model.short_name(),
                &field.name,
                &target.name,
            )),
            [pair] => Ok(pair.id),
            _ => Err(Error::invalid_tag(
                model.short_name(),
                &field.name,
                format!(
                    "`{}` has several matching relations; name one with `via`",
                    target.name
                ),
            )),
        }
    }

    fn build_through_model(&mut self, field_id: FieldId) -> Result<ModelId> {
        let owner = &self.models[field_id.model.0];
        let field = &owner.fields[field_id.index];
        let target = &self.models[self.relation(field_id).target.0];

        let owner_table = owner.table_name.clone();
        let target_table = target.table_name.clone();

        let table_name = match self.through_tables.get(&field_id) {
            Some(table) => table.clone(),
            None => format!("{owner_table}_{target_table}s"),
        };

        let (src, dst) = if owner_table == target_table {
            (format!("from_{owner_table}"), format!("to_{target_table}"))
        } else {
            (owner_table.clone(), target_table.clone())
        };

        let name = format!("{}::{}", owner.name, field.name);
        let owner_key = owner.primary_key().storage_ty().unwrap_or(Type::I64);
        let target_key = target.primary_key().storage_ty().unwrap_or(Type::I64);
        let (owner_id, target_id) = (owner.id, target.id);

        if self.by_table.contains_key(&table_name) {
            return Err(Error::duplicate_model(format!(
                "{name} (table `{table_name}`)"
            )));
        }

        let id = ModelId(self.models.len());

        let join_key = |index: usize, name: &str, target: ModelId, key: Type| Field {
            id: FieldId { model: id, index },
            name: name.to_string(),
            column: format!("{name}_id"),
            ty: FieldTy::Relation {
                relation: Relation {
                    kind: RelationKind::ForeignKey,
                    target,
                    pair: None,
                    through: None,
                },
                key,
            },
            nullable: false,
            primary_key: false,
            auto: false,
            size: None,
            precision: None,
            default: None,
            unique: false,
            index: false,
        };

        let fields = vec![
            Field {
                id: FieldId { model: id, index: 0 },
                name: "id".to_string(),
                column: "id".to_string(),
                ty: FieldTy::Primitive(Type::I64),
                nullable: false,
                primary_key: true,
                auto: true,
                size: None,
                precision: None,
                default: None,
                unique: false,
                index: false,
            },
            join_key(1, &src, owner_id, owner_key),
            join_key(2, &dst, target_id, target_key),
        ];

        let columns = vec![format!("{src}_id"), format!("{dst}_id")];

        self.models.push(Model {
            id,
            name: name.clone(),
            table_name: table_name.clone(),
            fields,
            primary_key: 0,
            is_through: true,
            indices: vec![Index {
                name: format!("{table_name}_{}", columns.join("_")),
                columns,
                unique: true,
            }],
        });
        self.by_name.insert(name, id);
        self.by_table.insert(table_name, id);

        Ok(id)
    }
}

fn verify_field(model: &str, id: FieldId, def: &FieldDef) -> Result<Field> {
    let invalid = |reason: &str| Error::invalid_tag(model, &def.name, reason);

    if def.primary_key && def.nullable {
        return Err(invalid("primary key cannot be nullable"));
    }

    if def.size.is_some() && (def.digits.is_some() || def.decimals.is_some()) {
        return Err(invalid("`size` and `digits`/`decimals` cannot be combined"));
    }

    let precision = match (def.digits, def.decimals) {
        (None, None) => None,
        (None, Some(_)) => return Err(invalid("`decimals` requires `digits`")),
        (Some(digits), decimals) => {
            let decimals = decimals.unwrap_or(0);
            if decimals > digits {
                return Err(invalid("`decimals` cannot exceed `digits`"));
            }
            Some(Precision { digits, decimals })
        }
    };

    let ty = match &def.kind {
        FieldDefKind::Primitive(ty) => {
            if def.size.is_some() && *ty != Type::String {
                return Err(invalid("`size` requires a string field"));
            }
            if precision.is_some() && !ty.is_float() {
                return Err(invalid("`digits`/`decimals` require a float field"));
            }
            if def.auto && !ty.is_integer() {
                return Err(invalid("`auto` requires an integer field"));
            }
            if def.via.is_some() || def.through_table.is_some() {
                return Err(invalid("`via`/`through_table` require a relation field"));
            }
            FieldTy::Primitive(*ty)
        }
        FieldDefKind::Relation(relation) => {
            if def.primary_key {
                return Err(invalid("a relation cannot be the primary key"));
            }
            if def.size.is_some() || precision.is_some() {
                return Err(invalid("`size`/`digits` are not valid on a relation"));
            }
            if def.through_table.is_some() && relation.kind != RelationKind::ManyToMany {
                return Err(invalid("`through_table` requires a many-to-many relation"));
            }
            if !relation.kind.is_forward() && def.column.is_some() {
                return Err(invalid("`column` requires a relation that owns a column"));
            }
            FieldTy::Relation {
                relation: Relation {
                    kind: relation.kind,
                    target: UNRESOLVED,
                    pair: None,
                    through: None,
                },
                key: Type::I64,
            }
        }
    };

    let column = match (&def.column, &def.kind) {
        (Some(column), _) => column.clone(),
        (None, FieldDefKind::Relation(relation)) if relation.kind.is_forward() => {
            format!("{}_id", def.name)
        }
        (None, _) => def.name.clone(),
    };

    let unique = def.unique
        || matches!(&def.kind, FieldDefKind::Relation(relation) if relation.kind == RelationKind::OneToOne);

    Ok(Field {
        id,
        name: def.name.clone(),
        column,
        ty,
        nullable: def.nullable,
        primary_key: def.primary_key,
        auto: def.auto,
        size: def.size,
        precision,
        default: def.default.clone(),
        unique,
        index: def.index,
    })
}

fn find_primary_key(model: &str, fields: &mut [Field]) -> Result<usize> {
    let mut primary_key = None;

    for (index, field) in fields.iter().enumerate() {
        if field.primary_key {
            if primary_key.is_some() {
                return Err(Error::invalid_tag(
                    model,
                    &field.name,
                    "more than one primary key",
                ));
            }
            primary_key = Some(index);
        }
    }

    if let Some(index) = primary_key {
        return Ok(index);
    }

    // An integer `id` field becomes the auto-increment primary key.
    let index = fields
        .iter()
        .position(|field| {
            field.name == "id" && matches!(field.ty, FieldTy::Primitive(ty) if ty.is_integer())
        })
        .ok_or_else(|| Error::invalid_model(model, "no primary key declared"))?;

    let field = &mut fields[index];
    if field.nullable {
        return Err(Error::invalid_tag(
            model,
            &field.name,
            "primary key cannot be nullable",
        ));
    }
    field.primary_key = true;
    field.auto = true;

    Ok(index)
}

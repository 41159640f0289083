//! Lowers filter conditions into expressions over a single table.
//!
//! Relation paths become uncorrelated `IN (SELECT ...)` subqueries, one per
//! hop, so every expression only ever names columns of its own table.

use quarry_core::{
    schema::{Field, Model, Registry, RelationKind},
    stmt::{
        escape_like, Arg, BinaryOp, Condition, ConditionNode, Expr, ExprBetween, ExprLike,
        Lookup, Op, Predicate, Select, Value,
    },
    Error, Result,
};

pub(crate) struct Lower<'a> {
    registry: &'a Registry,
}

impl<'a> Lower<'a> {
    pub(crate) fn new(registry: &'a Registry) -> Lower<'a> {
        Lower { registry }
    }

    /// Lowers `cond` against `model`. Items fold left to right: each one is
    /// joined to everything before it with its own `AND` or `OR`.
    pub(crate) fn condition(&self, model: &Model, cond: &Condition) -> Result<Option<Expr>> {
        let mut acc: Option<Expr> = None;

        for item in &cond.items {
            let mut expr = match &item.node {
                ConditionNode::Predicate(predicate) => self.predicate(model, predicate)?,
                ConditionNode::Group(group) => match self.condition(model, group)? {
                    Some(expr) => expr,
                    None => continue,
                },
            };

            if item.negated {
                expr = Expr::not(expr);
            }

            acc = Some(match acc {
                None => expr,
                Some(prev) if item.or => Expr::or([prev, expr]),
                Some(prev) => Expr::and([prev, expr]),
            });
        }

        Ok(acc)
    }

    fn predicate(&self, model: &Model, predicate: &Predicate) -> Result<Expr> {
        let lookup = Lookup::parse(&predicate.expr)?;
        let filter = Filter {
            expr: &predicate.expr,
            op: lookup.op,
            arg: &predicate.arg,
        };
        self.path(model, &lookup.path, &filter)
    }

    fn path(&self, model: &Model, path: &[String], filter: &Filter<'_>) -> Result<Expr> {
        let Some((name, rest)) = path.split_first() else {
            return Err(Error::malformed_filter(filter.expr, "empty path"));
        };

        let field = model
            .field_by_name(name)
            .ok_or_else(|| Error::unknown_field(model.short_name(), name.as_str()))?;

        let Some(relation) = field.relation() else {
            return match rest {
                [] => filter.leaf(&field.column),
                [op] => Err(Error::malformed_filter(
                    filter.expr,
                    format!("unknown operator `{op}`"),
                )),
                [next, ..] => Err(Error::unknown_field(
                    model.short_name(),
                    format!("{name}__{next}"),
                )),
            };
        };

        let target = self.registry.model(relation.target);
        let target_pk = target.primary_key();

        match relation.kind {
            RelationKind::ForeignKey | RelationKind::OneToOne => {
                if names_key(rest, target_pk) {
                    return filter.leaf(&field.column);
                }

                let inner = self.path(target, rest, filter)?;
                Ok(Expr::in_subquery(
                    &field.column,
                    Select::new(&target.table_name, vec![target_pk.column.clone()]).filter(inner),
                ))
            }
            RelationKind::ReverseOne | RelationKind::ReverseMany => {
                let pair = relation
                    .pair
                    .map(|pair| self.registry.field(pair))
                    .ok_or_else(|| {
                        Error::dangling_relation(model.short_name(), &field.name, &target.name)
                    })?;

                self.reverse(
                    model,
                    &target.table_name,
                    &pair.column,
                    rest,
                    filter,
                    |lower| {
                        if names_key(rest, target_pk) {
                            filter.leaf(&target_pk.column)
                        } else {
                            lower.path(target, rest, filter)
                        }
                    },
                )
            }
            RelationKind::ManyToMany | RelationKind::ReverseManyToMany => {
                let join = self.registry.join_columns(field).ok_or_else(|| {
                    Error::invalid_tag(
                        model.short_name(),
                        &field.name,
                        "many-to-many relation has no join table",
                    )
                })?;

                self.reverse(
                    model,
                    &join.through.table_name,
                    join.this,
                    rest,
                    filter,
                    |lower| {
                        if names_key(rest, target_pk) {
                            return filter.leaf(join.other);
                        }

                        let inner = lower.path(target, rest, filter)?;
                        Ok(Expr::in_subquery(
                            join.other,
                            Select::new(&target.table_name, vec![target_pk.column.clone()])
                                .filter(inner),
                        ))
                    },
                )
            }
        }
    }

    /// `pk IN (SELECT key FROM table WHERE ...)` for relations whose key
    /// lives on another table.
    ///
    /// `field__isnull` with no further path asks whether any related row
    /// exists at all.
    fn reverse(
        &self,
        model: &Model,
        table: &str,
        key: &str,
        rest: &[String],
        filter: &Filter<'_>,
        inner: impl FnOnce(&Self) -> Result<Expr>,
    ) -> Result<Expr> {
        let pk = &model.primary_key().column;

        if rest.is_empty() && filter.op == Op::IsNull {
            let none = filter.isnull()?;
            let related = Expr::in_subquery(
                pk,
                Select::new(table, vec![key.to_string()]).filter(Expr::is_null(key, true)),
            );
            return Ok(if none { Expr::not(related) } else { related });
        }

        Ok(Expr::in_subquery(
            pk,
            Select::new(table, vec![key.to_string()]).filter(inner(self)?),
        ))
    }
}

/// Returns `true` when the remaining path is empty or names the target's
/// primary key, so the filter applies to the key directly.
fn names_key(rest: &[String], target_pk: &Field) -> bool {
    match rest {
        [] => true,
        [name] => *name == target_pk.name || *name == target_pk.column,
        _ => false,
    }
}

struct Filter<'a> {
    expr: &'a str,
    op: Op,
    arg: &'a Arg,
}

impl Filter<'_> {
    fn leaf(&self, column: &str) -> Result<Expr> {
        Ok(match self.op {
            Op::Exact => match self.single()? {
                Value::Null => Expr::is_null(column, false),
                value => Expr::eq(column, value.clone()),
            },
            Op::Gt => self.compare(column, BinaryOp::Gt)?,
            Op::Gte => self.compare(column, BinaryOp::Ge)?,
            Op::Lt => self.compare(column, BinaryOp::Lt)?,
            Op::Lte => self.compare(column, BinaryOp::Le)?,
            Op::In => match self.arg {
                Arg::List(items) if items.is_empty() => {
                    return Err(self.malformed("`in` needs at least one value"))
                }
                Arg::List(items) => Expr::in_list(column, items.clone()),
                Arg::Value(value) => Expr::in_list(column, vec![value.clone()]),
                Arg::Range(..) => return Err(self.malformed("`in` takes a list")),
            },
            Op::Between => {
                let (low, high) = match self.arg {
                    Arg::Range(low, high) => (low, high),
                    Arg::List(items) if items.len() == 2 => (&items[0], &items[1]),
                    _ => return Err(self.malformed("`between` takes a range of two values")),
                };
                Expr::Between(ExprBetween {
                    column: column.to_string(),
                    low: low.clone(),
                    high: high.clone(),
                })
            }
            Op::IsNull => Expr::is_null(column, !self.isnull()?),
            op => {
                let text = self
                    .single()?
                    .to_text()
                    .ok_or_else(|| self.malformed("pattern needs a text value"))?;
                let text = escape_like(&text);

                let pattern = match op {
                    Op::Contains | Op::IContains => format!("%{text}%"),
                    Op::StartsWith | Op::IStartsWith => format!("{text}%"),
                    Op::EndsWith | Op::IEndsWith => format!("%{text}"),
                    _ => text,
                };

                Expr::Like(ExprLike {
                    column: column.to_string(),
                    pattern,
                    case_insensitive: op.is_case_insensitive(),
                })
            }
        })
    }

    fn compare(&self, column: &str, op: BinaryOp) -> Result<Expr> {
        match self.single()? {
            Value::Null => Err(self.malformed("cannot compare with null")),
            value => Ok(Expr::binary_op(column, op, value.clone())),
        }
    }

    fn single(&self) -> Result<&Value> {
        match self.arg {
            Arg::Value(value) => Ok(value),
            _ => Err(self.malformed(format!("`{}` takes a single value", self.op.name()))),
        }
    }

    fn isnull(&self) -> Result<bool> {
        match self.single()? {
            Value::Bool(v) => Ok(*v),
            Value::I64(v) => Ok(*v != 0),
            _ => Err(self.malformed("`isnull` takes a bool")),
        }
    }

    fn malformed(&self, reason: impl Into<String>) -> Error {
        Error::malformed_filter(self.expr, reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quarry_core::schema::{FieldDef, ModelDef};
    use quarry_core::stmt::Type;

    struct User;
    struct Post;
    struct Tag;

    fn registry() -> Registry {
        let mut builder = Registry::builder();
        builder
            .register(
                ModelDef::new::<User>()
                    .field(FieldDef::new("id", Type::I64).auto())
                    .field(FieldDef::new("name", Type::String))
                    .field(FieldDef::reverse_many::<Post>("posts")),
            )
            .unwrap();
        builder
            .register(
                ModelDef::new::<Post>()
                    .field(FieldDef::new("id", Type::I64).auto())
                    .field(FieldDef::new("title", Type::String))
                    .field(FieldDef::foreign_key::<User>("user"))
                    .field(FieldDef::many_to_many::<Tag>("tags")),
            )
            .unwrap();
        builder
            .register(
                ModelDef::new::<Tag>()
                    .field(FieldDef::new("id", Type::I64).auto())
                    .field(FieldDef::new("name", Type::String)),
            )
            .unwrap();
        builder.build().unwrap()
    }

    fn lower<T: 'static>(registry: &Registry, cond: Condition) -> Result<Option<Expr>> {
        let model = registry.resolve_type::<T>().unwrap();
        Lower::new(registry).condition(model, &cond)
    }

    #[test]
    fn items_fold_left_to_right() {
        let registry = registry();
        let expr = lower::<User>(
            &registry,
            Condition::new().and("id", 1).or("id", 2).and("name", "a"),
        )
        .unwrap()
        .unwrap();

        assert_eq!(
            expr,
            Expr::and([
                Expr::or([Expr::eq("id", 1), Expr::eq("id", 2)]),
                Expr::eq("name", "a"),
            ])
        );
    }

    #[test]
    fn empty_condition_lowers_to_nothing() {
        let registry = registry();
        assert_eq!(lower::<User>(&registry, Condition::new()).unwrap(), None);
    }

    #[test]
    fn exact_null_is_null_check() {
        let registry = registry();
        let expr = lower::<User>(&registry, Condition::new().and("name", Value::Null))
            .unwrap()
            .unwrap();
        assert_eq!(expr, Expr::is_null("name", false));
    }

    #[test]
    fn forward_relation_on_key_uses_column() {
        let registry = registry();
        let expr = lower::<Post>(&registry, Condition::new().and("user", 3))
            .unwrap()
            .unwrap();
        assert_eq!(expr, Expr::eq("user_id", 3));

        let expr = lower::<Post>(&registry, Condition::new().and("user__id__in", Arg::list([1, 2])))
            .unwrap()
            .unwrap();
        assert_eq!(expr, Expr::in_list("user_id", vec![Value::I64(1), Value::I64(2)]));
    }

    #[test]
    fn forward_relation_path_is_subquery() {
        let registry = registry();
        let expr = lower::<Post>(&registry, Condition::new().and("user__name", "ann"))
            .unwrap()
            .unwrap();

        assert_eq!(
            expr,
            Expr::in_subquery(
                "user_id",
                Select::new("user", vec!["id".to_string()]).filter(Expr::eq("name", "ann")),
            )
        );
    }

    #[test]
    fn reverse_relation_selects_pair_key() {
        let registry = registry();
        let expr = lower::<User>(&registry, Condition::new().and("posts__title", "hi"))
            .unwrap()
            .unwrap();

        assert_eq!(
            expr,
            Expr::in_subquery(
                "id",
                Select::new("post", vec!["user_id".to_string()]).filter(Expr::eq("title", "hi")),
            )
        );
    }

    #[test]
    fn reverse_isnull_checks_existence() {
        let registry = registry();
        let expr = lower::<User>(&registry, Condition::new().and("posts__isnull", true))
            .unwrap()
            .unwrap();

        assert_eq!(
            expr,
            Expr::not(Expr::in_subquery(
                "id",
                Select::new("post", vec!["user_id".to_string()])
                    .filter(Expr::is_null("user_id", true)),
            ))
        );
    }

    #[test]
    fn many_to_many_goes_through_join_table() {
        let registry = registry();
        let expr = lower::<Post>(&registry, Condition::new().and("tags__name", "rust"))
            .unwrap()
            .unwrap();

        let Expr::InSubquery(outer) = expr else {
            panic!("expected subquery, got {expr:?}");
        };
        assert_eq!(outer.column, "id");
        assert_eq!(outer.query.table, "post_tags");
        assert_eq!(
            outer.query.filter,
            Some(Expr::in_subquery(
                "tag_id",
                Select::new("tag", vec!["id".to_string()]).filter(Expr::eq("name", "rust")),
            ))
        );
    }

    #[test]
    fn pattern_operators_escape_input() {
        let registry = registry();
        let expr = lower::<User>(&registry, Condition::new().and("name__icontains", "50%"))
            .unwrap()
            .unwrap();

        assert_eq!(
            expr,
            Expr::Like(ExprLike {
                column: "name".to_string(),
                pattern: r"%50\%%".to_string(),
                case_insensitive: true,
            })
        );
    }

    #[test]
    fn malformed_filters() {
        let registry = registry();

        for cond in [
            Condition::new().and("name__bogus", 1),
            Condition::new().and("id__between", 1),
            Condition::new().and("id__in", Arg::List(vec![])),
            Condition::new().and("id__gt", Arg::list([1, 2])),
            Condition::new().and("name__", 1),
        ] {
            let err = lower::<User>(&registry, cond).unwrap_err();
            assert!(err.is_malformed_filter(), "{err}");
        }
    }

    #[test]
    fn unknown_fields() {
        let registry = registry();

        for expr in ["nope", "name__first__last", "posts__nope"] {
            let err = lower::<User>(&registry, Condition::new().and(expr, 1)).unwrap_err();
            assert!(err.is_unknown_field(), "{expr}: {err}");
        }
    }
}

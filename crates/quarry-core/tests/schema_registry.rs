use pretty_assertions::assert_eq;
use quarry_core::{
    schema::{FieldDef, FieldTy, ModelDef, Registry, RelationKind},
    stmt::Type,
};

mod app {
    pub struct User;
    pub struct Profile;
    pub struct Post;
    pub struct Tag;
    pub struct Comment;
}

use app::*;

fn user() -> ModelDef {
    ModelDef::new::<User>()
        .field(FieldDef::new("id", Type::I64))
        .field(FieldDef::new("name", Type::String).size(100))
        .field(FieldDef::one_to_one::<Profile>("profile").null())
        .field(FieldDef::reverse_many::<Post>("posts"))
}

fn profile() -> ModelDef {
    ModelDef::new::<Profile>()
        .field(FieldDef::new("id", Type::I64).auto())
        .field(FieldDef::new("age", Type::I16))
        .field(FieldDef::reverse_one::<User>("user"))
}

fn post() -> ModelDef {
    ModelDef::new::<Post>()
        .field(FieldDef::new("id", Type::I64).auto())
        .field(FieldDef::new("title", Type::String).size(200))
        .field(FieldDef::foreign_key::<User>("author"))
        .field(FieldDef::many_to_many::<Tag>("tags"))
}

fn tag() -> ModelDef {
    ModelDef::new::<Tag>()
        .field(FieldDef::new("id", Type::I64).auto())
        .field(FieldDef::new("name", Type::String).unique())
        .field(FieldDef::reverse_many::<Post>("posts"))
}

fn registry() -> Registry {
    let mut builder = Registry::builder();
    // Registration order does not matter.
    builder.register(post()).unwrap();
    builder.register(tag()).unwrap();
    builder.register(user()).unwrap();
    builder.register(profile()).unwrap();
    builder.build().unwrap()
}

#[test]
fn resolve_by_type_name_and_table() {
    let registry = registry();

    let user = registry.resolve_type::<User>().unwrap();
    assert_eq!(user.table_name, "user");
    assert_eq!(registry.resolve(std::any::type_name::<User>()), Some(user));
    assert_eq!(registry.resolve_table("post").unwrap().short_name(), "Post");

    let err = registry.resolve_type::<Comment>().unwrap_err();
    assert!(err.is_model_not_registered());
}

#[test]
fn integer_id_is_promoted_to_auto_primary_key() {
    let registry = registry();
    let user = registry.resolve_type::<User>().unwrap();

    let pk = user.primary_key();
    assert_eq!(pk.name, "id");
    assert!(pk.auto);
}

#[test]
fn duplicate_registration_fails() {
    let mut builder = Registry::builder();
    builder.register(user()).unwrap();
    let err = builder.register(user()).unwrap_err();
    assert!(err.is_duplicate_model());
}

#[test]
fn relations_are_bound_to_targets_and_reciprocals() {
    let registry = registry();
    let user = registry.resolve_type::<User>().unwrap();
    let post = registry.resolve_type::<Post>().unwrap();

    let author = post.field_by_name("author").unwrap();
    assert_eq!(author.column, "author_id");
    assert!(matches!(author.ty, FieldTy::Relation { key: Type::I64, .. }));

    let author_rel = author.relation().unwrap();
    assert_eq!(author_rel.kind, RelationKind::ForeignKey);
    assert_eq!(author_rel.target, user.id);

    let posts = user.field_by_name("posts").unwrap();
    let posts_rel = posts.relation().unwrap();
    assert_eq!(posts_rel.kind, RelationKind::ReverseMany);
    assert_eq!(posts_rel.pair, Some(author.id));
    assert_eq!(author_rel.pair, Some(posts.id));
    assert!(!posts.has_column());
}

#[test]
fn one_to_one_column_is_unique() {
    let registry = registry();
    let user = registry.resolve_type::<User>().unwrap();
    let profile = user.field_by_name("profile").unwrap();
    assert!(profile.unique);
    assert!(profile.nullable);
    assert_eq!(profile.column, "profile_id");
}

#[test]
fn many_to_many_generates_join_model() {
    let registry = registry();
    let post = registry.resolve_type::<Post>().unwrap();
    let tag = registry.resolve_type::<Tag>().unwrap();

    let tags = post.field_by_name("tags").unwrap();
    let join = registry.join_columns(tags).unwrap();
    assert!(join.through.is_through);
    assert_eq!(join.through.table_name, "post_tags");
    assert_eq!(join.this, "post_id");
    assert_eq!(join.other, "tag_id");

    let posts = tag.field_by_name("posts").unwrap();
    assert_eq!(
        posts.relation().unwrap().kind,
        RelationKind::ReverseManyToMany
    );
    let reverse = registry.join_columns(posts).unwrap();
    assert_eq!(reverse.through.id, join.through.id);
    assert_eq!(reverse.this, "tag_id");
    assert_eq!(reverse.other, "post_id");
}

#[test]
fn failed_registration_leaves_no_join_table_behind() {
    let mut builder = Registry::builder();
    builder.register(tag()).unwrap();

    let err = builder
        .register(
            ModelDef::new::<Comment>()
                .field(FieldDef::new("id", Type::I64))
                .field(FieldDef::many_to_many::<Tag>("tags").through_table("comment_labels"))
                .field(FieldDef::new("a", Type::I32).column("x"))
                .field(FieldDef::new("b", Type::I32).column("x")),
        )
        .unwrap_err();
    assert!(err.is_invalid_tag(), "{err}");

    // The next model takes the slot the failed one would have used.
    builder
        .register(
            ModelDef::new::<Post>()
                .field(FieldDef::new("id", Type::I64))
                .field(FieldDef::many_to_many::<Tag>("tags")),
        )
        .unwrap();
    let registry = builder.build().unwrap();

    let post = registry.resolve_type::<Post>().unwrap();
    let join = registry
        .join_columns(post.field_by_name("tags").unwrap())
        .unwrap();
    assert_eq!(join.through.table_name, "post_tags");
    assert!(registry.resolve_table("comment_labels").is_none());
}

#[test]
fn reverse_relation_without_reciprocal_is_dangling() {
    let mut builder = Registry::builder();
    builder.register(tag()).unwrap();
    builder
        .register(
            ModelDef::new::<Post>()
                .field(FieldDef::new("id", Type::I64))
                .field(FieldDef::new("title", Type::Text)),
        )
        .unwrap();

    let err = builder.build().unwrap_err();
    assert!(err.is_dangling_relation(), "{err}");
}

#[test]
fn unregistered_relation_target_is_invalid() {
    let mut builder = Registry::builder();
    builder.register(post()).unwrap();
    builder.register(user()).unwrap();
    builder.register(profile()).unwrap();

    let err = builder.build().unwrap_err();
    assert!(err.is_invalid_tag(), "{err}");
}

#[test]
fn table_prefix_and_suffix() {
    let mut builder = Registry::builder();
    builder
        .register_with_prefix(
            ModelDef::new::<Comment>().field(FieldDef::new("id", Type::I32)),
            "blog_",
        )
        .unwrap();
    builder
        .register_with_suffix(
            ModelDef::new::<Tag>()
                .field(FieldDef::new("id", Type::I32))
                .field(FieldDef::new("name", Type::String)),
            "_v2",
        )
        .unwrap();
    let registry = builder.build().unwrap();

    assert!(registry.resolve_table("blog_comment").is_some());
    assert!(registry.resolve_table("tag_v2").is_some());
}

#[test]
fn malformed_declarations_are_rejected() {
    let cases = [
        FieldDef::new("age", Type::I32).size(10),
        FieldDef::new("name", Type::String).digits(10).decimals(2),
        FieldDef::new("price", Type::F64).digits(4).decimals(6),
        FieldDef::new("price", Type::F64).size(10).digits(4),
        FieldDef::new("name", Type::String).auto(),
        FieldDef::new("code", Type::String).pk().null(),
        FieldDef::foreign_key::<User>("owner").pk(),
    ];

    for field in cases {
        let name = field.name().to_string();
        let mut builder = Registry::builder();
        let err = builder
            .register(
                ModelDef::new::<Comment>()
                    .field(FieldDef::new("id", Type::I64))
                    .field(field),
            )
            .unwrap_err();
        assert!(err.is_invalid_tag(), "{name}: {err}");
    }
}

#[test]
fn two_primary_keys_are_rejected() {
    let mut builder = Registry::builder();
    let err = builder
        .register(
            ModelDef::new::<Comment>()
                .field(FieldDef::new("id", Type::I64).pk())
                .field(FieldDef::new("code", Type::String).pk()),
        )
        .unwrap_err();
    assert!(err.is_invalid_tag());
}

#[test]
fn model_without_primary_key_is_rejected() {
    let mut builder = Registry::builder();
    let err = builder
        .register(ModelDef::new::<Comment>().field(FieldDef::new("body", Type::Text)))
        .unwrap_err();
    assert!(err.is_invalid_tag());
    assert!(err.is_configuration());
}

#[test]
fn composite_index_columns() {
    let mut builder = Registry::builder();
    builder
        .register(
            ModelDef::new::<Comment>()
                .field(FieldDef::new("id", Type::I64))
                .field(FieldDef::new("post", Type::I64).column("post_ref"))
                .field(FieldDef::new("slot", Type::I32))
                .unique_together(&["post", "slot"]),
        )
        .unwrap();
    let registry = builder.build().unwrap();
    let comment = registry.resolve_type::<Comment>().unwrap();

    assert_eq!(comment.indices.len(), 1);
    assert_eq!(comment.indices[0].columns, vec!["post_ref", "slot"]);
    assert!(comment.indices[0].unique);
}

mod common;
use common::*;

use quarry::{Arg, Condition, Params, SessionConfig, Value};

fn names(users: &[User]) -> Vec<&str> {
    users.iter().map(|user| user.name.as_str()).collect()
}

#[tokio::test]
async fn one_distinguishes_zero_one_and_many() {
    let db = setup().await;
    let mut session = db.session().unwrap();
    seed_users(&mut session).await;

    let err = session
        .query_table::<User>()
        .unwrap()
        .filter("name", "nobody")
        .one::<User>()
        .await
        .unwrap_err();
    assert!(err.is_record_not_found(), "{err}");

    let user = session
        .query_table::<User>()
        .unwrap()
        .filter("name", "b")
        .one::<User>()
        .await
        .unwrap();
    assert_eq!(user.age, 20);

    let err = session
        .query_table::<User>()
        .unwrap()
        .filter("age__gt", 15)
        .one::<User>()
        .await
        .unwrap_err();
    assert!(err.is_invalid_record_count(), "{err}");
}

#[tokio::test]
async fn order_limit_offset() {
    let db = setup().await;
    let mut session = db.session().unwrap();
    seed_users(&mut session).await;

    let users = session
        .query_table::<User>()
        .unwrap()
        .order_by(&["-age"])
        .all::<User>()
        .await
        .unwrap();
    assert_eq!(names(&users), ["c", "b", "a"]);

    let users = session
        .query_table::<User>()
        .unwrap()
        .order_by(&["age"])
        .offset(1)
        .all::<User>()
        .await
        .unwrap();
    assert_eq!(names(&users), ["b", "c"]);

    let users = session
        .query_table::<User>()
        .unwrap()
        .order_by(&["age"])
        .limit(1)
        .offset(1)
        .all::<User>()
        .await
        .unwrap();
    assert_eq!(names(&users), ["b"]);
}

#[tokio::test]
async fn default_rows_limit_caps_all() {
    let db = setup().await;
    let mut session = db
        .session_with("default", SessionConfig::default().default_rows_limit(Some(2)))
        .unwrap();
    seed_users(&mut session).await;

    let users = session.query_table::<User>().unwrap().all::<User>().await.unwrap();
    assert_eq!(users.len(), 2);

    let users = session
        .query_table::<User>()
        .unwrap()
        .limit(10)
        .all::<User>()
        .await
        .unwrap();
    assert_eq!(users.len(), 3);

    let users = session
        .query_table::<User>()
        .unwrap()
        .limit(0)
        .all::<User>()
        .await
        .unwrap();
    assert_eq!(users.len(), 2);

    // Counting ignores the cap.
    assert_eq!(session.query_table::<User>().unwrap().count().await.unwrap(), 3);
}

#[tokio::test]
async fn comparison_and_pattern_operators() {
    let db = setup().await;
    let mut session = db.session().unwrap();
    seed_users(&mut session).await;

    let mut ann = User::new("Ann_Lee", 40);
    session.insert(&mut ann).await.unwrap();

    let cases: Vec<(&str, Arg, u64)> = vec![
        ("age__gte", 20.into(), 3),
        ("age__lt", 20.into(), 1),
        ("age__lte", 20.into(), 2),
        ("age__in", Arg::list([10, 30, 50]), 2),
        ("age__between", Arg::range(15, 30), 2),
        ("name__exact", "a".into(), 1),
        ("name__iexact", "ann_lee".into(), 1),
        ("name__contains", "n_L".into(), 1),
        ("name__contains", "n_l".into(), 0),
        ("name__icontains", "N_L".into(), 1),
        // `_` is matched literally
        ("name__contains", "_".into(), 1),
        ("name__startswith", "Ann".into(), 1),
        ("name__istartswith", "ann".into(), 1),
        ("name__endswith", "Lee".into(), 1),
        ("name__iendswith", "LEE".into(), 1),
        ("email__isnull", true.into(), 4),
        ("email__isnull", false.into(), 0),
        ("email", Value::Null.into(), 4),
    ];

    for (expr, arg, expected) in cases {
        let count = session
            .query_table::<User>()
            .unwrap()
            .filter(expr, arg.clone())
            .count()
            .await
            .unwrap();
        assert_eq!(count, expected, "{expr} {arg:?}");
    }
}

#[tokio::test]
async fn exclude_and_condition_groups() {
    let db = setup().await;
    let mut session = db.session().unwrap();
    seed_users(&mut session).await;

    let users = session
        .query_table::<User>()
        .unwrap()
        .exclude("name", "b")
        .order_by(&["name"])
        .all::<User>()
        .await
        .unwrap();
    assert_eq!(names(&users), ["a", "c"]);

    // (name = a OR name = c) AND age > 15
    let cond = Condition::new()
        .and_cond(Condition::new().and("name", "a").or("name", "c"))
        .and("age__gt", 15);
    let users = session
        .query_table::<User>()
        .unwrap()
        .set_cond(cond)
        .all::<User>()
        .await
        .unwrap();
    assert_eq!(names(&users), ["c"]);

    // Items fold left to right: (name = a AND age > 15) OR name = c
    let cond = Condition::new()
        .and("name", "a")
        .and("age__gt", 15)
        .or("name", "c");
    assert_eq!(
        session
            .query_table::<User>()
            .unwrap()
            .set_cond(cond)
            .count()
            .await
            .unwrap(),
        1
    );

    let cond = Condition::new().and_not_cond(Condition::new().and("age__lt", 25));
    assert_eq!(
        session
            .query_table::<User>()
            .unwrap()
            .set_cond(cond)
            .count()
            .await
            .unwrap(),
        1
    );
}

#[tokio::test]
async fn relation_filters() {
    let db = setup().await;
    let mut session = db.session().unwrap();
    let users = seed_users(&mut session).await;

    for (title, author) in [("first", 0), ("second", 0), ("third", 2)] {
        let mut post = Post::new(title, 1.0, &users[author]);
        session.insert(&mut post).await.unwrap();
    }

    // Forward: posts whose author is named `a`
    let count = session
        .query_table::<Post>()
        .unwrap()
        .filter("user__name", "a")
        .count()
        .await
        .unwrap();
    assert_eq!(count, 2);

    // Reverse: users with a post titled `third`
    let found = session
        .query_table::<User>()
        .unwrap()
        .filter("posts__title", "third")
        .all::<User>()
        .await
        .unwrap();
    assert_eq!(names(&found), ["c"]);

    // Users without posts
    let found = session
        .query_table::<User>()
        .unwrap()
        .filter("posts__isnull", true)
        .all::<User>()
        .await
        .unwrap();
    assert_eq!(names(&found), ["b"]);

    // Two hops: posts of users who wrote `third`
    let count = session
        .query_table::<Post>()
        .unwrap()
        .filter("user__posts__title", "third")
        .count()
        .await
        .unwrap();
    assert_eq!(count, 1);

    let err = session
        .query_table::<Post>()
        .unwrap()
        .filter("user__nickname", "a")
        .count()
        .await
        .unwrap_err();
    assert!(err.is_unknown_field(), "{err}");
}

#[tokio::test]
async fn many_to_many_filter() {
    let db = setup().await;
    let mut session = db.session().unwrap();
    let users = seed_users(&mut session).await;

    let mut rust = Tag::new("rust");
    let mut go = Tag::new("go");
    session.insert(&mut rust).await.unwrap();
    session.insert(&mut go).await.unwrap();

    let mut post = Post::new("ownership", 2.0, &users[0]);
    session.insert(&mut post).await.unwrap();
    let mut other = Post::new("channels", 2.0, &users[0]);
    session.insert(&mut other).await.unwrap();

    session.query_m2m(&post, "tags").unwrap().add([rust.id]).await.unwrap();
    session.query_m2m(&other, "tags").unwrap().add([go.id]).await.unwrap();

    let found = session
        .query_table::<Post>()
        .unwrap()
        .filter("tags__name", "rust")
        .all::<Post>()
        .await
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].title, "ownership");

    let count = session
        .query_table::<Post>()
        .unwrap()
        .filter("tags", go.id)
        .count()
        .await
        .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn unfiltered_update_and_delete_are_rejected() {
    let db = setup().await;
    let mut session = db.session().unwrap();
    seed_users(&mut session).await;

    let values: Params = [("age".to_string(), Value::from(1))].into_iter().collect();

    let err = session
        .query_table::<User>()
        .unwrap()
        .update(values.clone())
        .await
        .unwrap_err();
    assert!(err.is_empty_condition_forbidden(), "{err}");

    let err = session
        .query_table::<User>()
        .unwrap()
        .delete()
        .await
        .unwrap_err();
    assert!(err.is_empty_condition_forbidden(), "{err}");

    let count = session
        .query_table::<User>()
        .unwrap()
        .filter("age", 1)
        .count()
        .await
        .unwrap();
    assert_eq!(count, 0);
    assert_eq!(session.query_table::<User>().unwrap().count().await.unwrap(), 3);

    let updated = session
        .query_table::<User>()
        .unwrap()
        .filter("age__gte", 20)
        .update(values.clone())
        .await
        .unwrap();
    assert_eq!(updated, 2);

    let updated = session
        .query_table::<User>()
        .unwrap()
        .allow_full_table()
        .update(values)
        .await
        .unwrap();
    assert_eq!(updated, 3);

    let deleted = session
        .query_table::<User>()
        .unwrap()
        .allow_full_table()
        .delete()
        .await
        .unwrap();
    assert_eq!(deleted, 3);
}

#[tokio::test]
async fn untyped_projections() {
    let db = setup().await;
    let mut session = db.session().unwrap();
    seed_users(&mut session).await;

    let rows = session
        .query_table::<User>()
        .unwrap()
        .order_by(&["age"])
        .values(&["name", "age"])
        .await
        .unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0]["name"], Value::from("a"));
    assert_eq!(rows[0]["age"], Value::I64(10));
    assert_eq!(rows[0].keys().collect::<Vec<_>>(), ["name", "age"]);

    let rows = session
        .query_table::<User>()
        .unwrap()
        .filter("name", "c")
        .values_list(&["age", "name"])
        .await
        .unwrap();
    assert_eq!(rows, vec![vec![Value::I64(30), Value::from("c")]]);

    let ages = session
        .query_table::<User>()
        .unwrap()
        .order_by(&["-age"])
        .values_flat("age")
        .await
        .unwrap();
    assert_eq!(ages, vec![Value::I64(30), Value::I64(20), Value::I64(10)]);

    let everything = session
        .query_table_name("user")
        .unwrap()
        .filter("name", "a")
        .values(&[])
        .await
        .unwrap();
    assert_eq!(
        everything[0].keys().collect::<Vec<_>>(),
        ["id", "name", "age", "email", "profile"]
    );
}

#[tokio::test]
async fn distinct_and_exist() {
    let db = setup().await;
    let mut session = db.session().unwrap();
    let users = seed_users(&mut session).await;

    for title in ["x", "y"] {
        let mut post = Post::new(title, 1.0, &users[0]);
        session.insert(&mut post).await.unwrap();
    }

    let authors = session
        .query_table::<Post>()
        .unwrap()
        .distinct()
        .values_flat("user")
        .await
        .unwrap();
    assert_eq!(authors, vec![Value::I64(users[0].id)]);

    assert!(session
        .query_table::<Post>()
        .unwrap()
        .filter("title", "x")
        .exist()
        .await
        .unwrap());
    assert!(!session
        .query_table::<Post>()
        .unwrap()
        .filter("title", "z")
        .exist()
        .await
        .unwrap());
}

#[tokio::test]
async fn builder_errors_surface_at_terminal() {
    let db = setup().await;
    let mut session = db.session().unwrap();

    let err = session
        .query_table::<User>()
        .unwrap()
        .order_by(&["-nickname"])
        .all::<User>()
        .await
        .unwrap_err();
    assert!(err.is_unknown_field(), "{err}");

    let err = session
        .query_table::<User>()
        .unwrap()
        .order_by(&["profile__bio"])
        .count()
        .await
        .unwrap_err();
    assert!(err.is_unknown_field(), "{err}");

    let err = session
        .query_table::<User>()
        .unwrap()
        .filter("age__between", 5)
        .all::<User>()
        .await
        .unwrap_err();
    assert!(err.is_malformed_filter(), "{err}");

    let err = session
        .query_table::<User>()
        .unwrap()
        .all::<Tag>()
        .await
        .unwrap_err();
    assert!(err.is_args(), "{err}");

    let err = session.query_table_name("nothing").unwrap_err();
    assert!(err.is_model_not_registered(), "{err}");
}

#[tokio::test]
async fn related_depth_preloads_foreign_keys() {
    let db = setup().await;
    let mut session = db.session().unwrap();
    let users = seed_users(&mut session).await;

    let mut post = Post::new("deep", 3.0, &users[1]);
    session.insert(&mut post).await.unwrap();

    let posts = session
        .query_table::<Post>()
        .unwrap()
        .related_depth(1)
        .all::<Post>()
        .await
        .unwrap();
    let author = posts[0].user.get().expect("author preloaded");
    assert_eq!(author.name, "b");

    let posts = session.query_table::<Post>().unwrap().all::<Post>().await.unwrap();
    assert!(!posts[0].user.is_loaded());
}

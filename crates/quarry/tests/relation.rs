mod common;
use common::*;

use quarry::{BelongsTo, LoadRelatedOptions, Session};

async fn author_with_posts(session: &mut Session) -> User {
    let mut user = User::new("writer", 40);
    session.insert(&mut user).await.unwrap();

    for (title, score) in [("one", 1.0), ("two", 2.0), ("three", 3.0)] {
        let mut post = Post::new(title, score, &user);
        session.insert(&mut post).await.unwrap();
    }

    user
}

fn titles(user: &User) -> Vec<&str> {
    user.posts
        .get()
        .expect("posts loaded")
        .iter()
        .map(|post| post.title.as_str())
        .collect()
}

#[tokio::test]
async fn load_reverse_many_with_order_and_window() {
    let db = setup().await;
    let mut session = db.session().unwrap();
    let mut user = author_with_posts(&mut session).await;

    let loaded = session
        .load_related(&mut user, "posts", LoadRelatedOptions::new().order_by(&["-score"]))
        .await
        .unwrap();
    assert_eq!(loaded, 3);
    assert_eq!(titles(&user), ["three", "two", "one"]);

    let loaded = session
        .load_related(
            &mut user,
            "posts",
            LoadRelatedOptions::new()
                .order_by(&["score"])
                .limit(1)
                .offset(1),
        )
        .await
        .unwrap();
    assert_eq!(loaded, 1);
    assert_eq!(titles(&user), ["two"]);
}

#[tokio::test]
async fn load_related_depth_preloads_nested_keys() {
    let db = setup().await;
    let mut session = db.session().unwrap();
    let mut user = author_with_posts(&mut session).await;

    session
        .load_related(&mut user, "posts", LoadRelatedOptions::new())
        .await
        .unwrap();
    let posts = user.posts.get().unwrap();
    assert!(posts.iter().all(|post| !post.user.is_loaded()));

    session
        .load_related(&mut user, "posts", LoadRelatedOptions::new().depth(2))
        .await
        .unwrap();
    let posts = user.posts.get().unwrap();
    assert!(posts
        .iter()
        .all(|post| post.user.get().map(|author| author.id) == Some(user.id)));

    session
        .load_related(
            &mut user,
            "posts",
            LoadRelatedOptions::new().with_default_depth(),
        )
        .await
        .unwrap();
    assert!(user.posts.get().unwrap()[0].user.is_loaded());
}

#[tokio::test]
async fn load_forward_and_reverse_one() {
    let db = setup().await;
    let mut session = db.session().unwrap();

    let mut profile = Profile {
        bio: "likes rust".to_string(),
        ..Profile::default()
    };
    session.insert(&mut profile).await.unwrap();

    let mut user = User::new("a", 1);
    user.profile = BelongsTo::new(profile.id);
    session.insert(&mut user).await.unwrap();

    assert_eq!(
        session
            .load_related(&mut user, "profile", LoadRelatedOptions::new())
            .await
            .unwrap(),
        1
    );
    assert_eq!(user.profile.get().unwrap().bio, "likes rust");

    assert_eq!(
        session
            .load_related(&mut profile, "user", LoadRelatedOptions::new())
            .await
            .unwrap(),
        1
    );
    assert_eq!(profile.user.get().unwrap().name, "a");

    // A null key loads nothing.
    let mut loner = User::new("b", 2);
    session.insert(&mut loner).await.unwrap();
    assert_eq!(
        session
            .load_related(&mut loner, "profile", LoadRelatedOptions::new())
            .await
            .unwrap(),
        0
    );
    assert!(!loner.profile.is_loaded());
}

#[tokio::test]
async fn load_related_errors() {
    let db = setup().await;
    let mut session = db.session().unwrap();

    let err = session
        .load_related(&mut User::new("a", 1), "posts", LoadRelatedOptions::new())
        .await
        .unwrap_err();
    assert!(err.is_missing_primary_key(), "{err}");

    let mut user = author_with_posts(&mut session).await;

    let err = session
        .load_related(&mut user, "name", LoadRelatedOptions::new())
        .await
        .unwrap_err();
    assert!(err.is_not_relation(), "{err}");

    let err = session
        .load_related(&mut user, "followers", LoadRelatedOptions::new())
        .await
        .unwrap_err();
    assert!(err.is_unknown_field(), "{err}");

    let err = session
        .load_related(
            &mut user,
            "posts",
            LoadRelatedOptions::new().order_by(&["rating"]),
        )
        .await
        .unwrap_err();
    assert!(err.is_unknown_field(), "{err}");
}

#[tokio::test]
async fn query_related_is_scoped() {
    let db = setup().await;
    let mut session = db.session().unwrap();
    let user = author_with_posts(&mut session).await;

    let mut other = User::new("other", 1);
    session.insert(&mut other).await.unwrap();
    session
        .insert(&mut Post::new("elsewhere", 9.0, &other))
        .await
        .unwrap();

    let count = session
        .query_related(&user, "posts")
        .unwrap()
        .filter("score__gte", 2.0)
        .count()
        .await
        .unwrap();
    assert_eq!(count, 2);

    let posts = session
        .query_related(&user, "posts")
        .unwrap()
        .order_by(&["-score"])
        .all::<Post>()
        .await
        .unwrap();
    assert_eq!(posts.len(), 3);
    assert_eq!(posts[0].title, "three");

    // The scope also bounds bulk writes.
    let deleted = session
        .query_related(&other, "posts")
        .unwrap()
        .delete()
        .await
        .unwrap();
    assert_eq!(deleted, 1);
    assert_eq!(session.query_table::<Post>().unwrap().count().await.unwrap(), 3);
}

#[tokio::test]
async fn many_to_many_links() {
    let db = setup().await;
    let mut session = db.session().unwrap();
    let user = author_with_posts(&mut session).await;

    let mut post = session
        .query_table::<Post>()
        .unwrap()
        .filter("title", "one")
        .one::<Post>()
        .await
        .unwrap();

    let mut tags = vec![Tag::new("a"), Tag::new("b"), Tag::new("c")];
    for tag in &mut tags {
        session.insert(tag).await.unwrap();
    }
    let ids: Vec<i64> = tags.iter().map(|tag| tag.id).collect();

    let mut m2m = session.query_m2m(&post, "tags").unwrap();
    assert_eq!(m2m.add(ids.clone()).await.unwrap(), 3);
    assert_eq!(m2m.count().await.unwrap(), 3);
    assert!(m2m.exist(ids[1]).await.unwrap());

    assert_eq!(m2m.remove([ids[1]]).await.unwrap(), 1);
    assert!(!m2m.exist(ids[1]).await.unwrap());
    assert_eq!(m2m.count().await.unwrap(), 2);

    assert!(m2m.add(Vec::<i64>::new()).await.unwrap_err().is_args());
    assert!(m2m.remove(Vec::<i64>::new()).await.unwrap_err().is_args());

    let loaded = session
        .load_related(&mut post, "tags", LoadRelatedOptions::new().order_by(&["name"]))
        .await
        .unwrap();
    assert_eq!(loaded, 2);
    let names: Vec<&str> = post
        .tags
        .get()
        .unwrap()
        .iter()
        .map(|tag| tag.name.as_str())
        .collect();
    assert_eq!(names, ["a", "c"]);

    let mut m2m = session.query_m2m(&post, "tags").unwrap();
    assert_eq!(m2m.clear().await.unwrap(), 2);
    assert_eq!(m2m.count().await.unwrap(), 0);

    let err = session.query_m2m(&user, "posts").unwrap_err();
    assert!(err.is_not_relation(), "{err}");

    let err = session.query_m2m(&Post::default(), "tags").unwrap_err();
    assert!(err.is_missing_primary_key(), "{err}");
}

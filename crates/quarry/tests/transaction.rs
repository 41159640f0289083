mod common;
use common::*;

use futures::FutureExt;
use quarry::{Error, IsolationLevel, Transaction, TxOptions};
use std::panic::AssertUnwindSafe;

async fn user_count(db: &quarry::Db) -> u64 {
    let mut session = db.session().unwrap();
    session.query_table::<User>().unwrap().count().await.unwrap()
}

#[tokio::test]
async fn commit_persists() {
    let db = setup().await;
    let session = db.session().unwrap();

    let mut tx = session.begin().await.unwrap();
    assert!(tx.is_transaction());

    let mut user = User::new("a", 1);
    tx.insert(&mut user).await.unwrap();
    tx.commit().await.unwrap();
    assert!(tx.is_done());
    drop(tx);

    assert_eq!(user_count(&db).await, 1);
}

#[tokio::test]
async fn rollback_discards() {
    let db = setup().await;
    let session = db.session().unwrap();

    let mut tx = session
        .begin_with(TxOptions::default().isolation(IsolationLevel::Serializable))
        .await
        .unwrap();
    tx.insert(&mut User::new("a", 1)).await.unwrap();
    assert_eq!(tx.query_table::<User>().unwrap().count().await.unwrap(), 1);
    tx.rollback().await.unwrap();
    drop(tx);

    assert_eq!(user_count(&db).await, 0);
}

#[tokio::test]
async fn finished_transaction_rejects_work() {
    let db = setup().await;
    let session = db.session().unwrap();

    let mut tx = session.begin().await.unwrap();
    tx.commit().await.unwrap();

    assert!(tx.commit().await.unwrap_err().is_transaction_already_done());
    assert!(tx.rollback().await.unwrap_err().is_transaction_already_done());

    let err = tx.insert(&mut User::new("late", 1)).await.unwrap_err();
    assert!(err.is_transaction_already_done(), "{err}");
}

#[tokio::test]
async fn nested_begin_is_unsupported() {
    let db = setup().await;
    let session = db.session().unwrap();

    let tx = session.begin().await.unwrap();
    let err = tx.begin().await.unwrap_err();
    assert!(err.is_unsupported_feature(), "{err}");
}

#[tokio::test]
async fn dropped_transaction_rolls_back() {
    let db = setup().await;
    let session = db.session().unwrap();

    {
        let mut tx = session.begin().await.unwrap();
        tx.insert(&mut User::new("a", 1)).await.unwrap();
    }

    // The rollback runs on a spawned task; the next checkout waits for the
    // connection to come back.
    assert_eq!(user_count(&db).await, 0);
}

#[tokio::test]
async fn closure_commits_on_success() {
    let db = setup().await;
    let session = db.session().unwrap();

    let id = session
        .run_in_transaction(async |tx: &mut Transaction| {
            let mut user = User::new("a", 1);
            tx.insert(&mut user).await?;
            Ok(user.id)
        })
        .await
        .unwrap();
    assert!(id > 0);

    assert_eq!(user_count(&db).await, 1);
}

#[tokio::test]
async fn closure_may_commit_itself() {
    let db = setup().await;
    let session = db.session().unwrap();

    session
        .run_in_transaction(async |tx: &mut Transaction| {
            tx.insert(&mut User::new("a", 1)).await?;
            tx.commit().await
        })
        .await
        .unwrap();

    assert_eq!(user_count(&db).await, 1);
}

#[tokio::test]
async fn closure_error_rolls_back() {
    let db = setup().await;
    let session = db.session().unwrap();

    let err = session
        .run_in_transaction(async |tx: &mut Transaction| {
            tx.insert(&mut User::new("a", 1)).await?;
            // Unique violation on the second insert.
            let mut tag = Tag::new("dup");
            tx.insert(&mut tag).await?;
            tx.insert(&mut Tag::new("dup")).await?;
            Ok(())
        })
        .await
        .unwrap_err();
    assert!(err.is_driver_operation_failed(), "{err}");

    let err = session
        .run_in_transaction(async |tx: &mut Transaction| -> quarry::Result<()> {
            tx.insert(&mut User::new("b", 2)).await?;
            Err(Error::transaction_rollback())
        })
        .await
        .unwrap_err();
    assert!(err.is_transaction_rollback());

    assert_eq!(user_count(&db).await, 0);
}

#[tokio::test]
async fn closure_panic_rolls_back_and_propagates() {
    let db = setup().await;
    let session = db.session().unwrap();

    let res = AssertUnwindSafe(session.run_in_transaction(
        async |tx: &mut Transaction| -> quarry::Result<()> {
            tx.insert(&mut User::new("a", 1)).await?;
            panic!("boom");
        },
    ))
    .catch_unwind()
    .await;
    assert!(res.is_err());

    assert_eq!(user_count(&db).await, 0);
}

#[tokio::test]
async fn unsupported_options_fail_to_begin() {
    let db = setup().await;
    let session = db.session().unwrap();

    let err = session
        .begin_with(TxOptions::default().read_only(true))
        .await
        .unwrap_err();
    assert!(err.is_unsupported_feature(), "{err}");

    // The connection went back to the pool.
    assert_eq!(user_count(&db).await, 0);
}

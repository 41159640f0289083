mod common;
use common::*;

use chrono::{Duration, FixedOffset, NaiveDate, TimeZone, Utc};
use pretty_assertions::assert_eq;
use quarry::{DatabaseConfig, Value};

fn sample() -> Sample {
    Sample {
        id: 0,
        flag: true,
        small: -5,
        big: 1 << 40,
        ratio: 0.5,
        text: "héllo".to_string(),
        blob: vec![0, 1, 2, 255],
        at: Some(Utc.with_ymd_and_hms(2024, 3, 1, 23, 30, 0).unwrap() + Duration::milliseconds(250)),
        day: NaiveDate::from_ymd_opt(2024, 2, 29),
        maybe: None,
    }
}

fn east_8() -> DatabaseConfig {
    DatabaseConfig {
        time_zone: FixedOffset::east_opt(8 * 3600).unwrap(),
        ..DatabaseConfig::default()
    }
}

#[tokio::test]
async fn every_field_type_round_trips() {
    let db = setup_with(east_8()).await;
    let mut session = db.session().unwrap();

    let mut written = sample();
    session.insert(&mut written).await.unwrap();

    let mut read = Sample {
        id: written.id,
        ..Sample::default()
    };
    session.read(&mut read, &[]).await.unwrap();
    assert_eq!(read, written);

    let all = session.query_table::<Sample>().unwrap().all::<Sample>().await.unwrap();
    assert_eq!(all, vec![written]);
}

#[tokio::test]
async fn date_times_are_stored_in_the_alias_time_zone() {
    let db = setup_with(east_8()).await;
    let mut session = db.session().unwrap();

    let mut written = sample();
    session.insert(&mut written).await.unwrap();

    let stored = session
        .raw(r#"SELECT "at", "day", "flag" FROM "sample""#, vec![])
        .values_list()
        .await
        .unwrap();
    assert_eq!(
        stored,
        vec![vec![
            Value::from("2024-03-02 07:30:00.250"),
            Value::from("2024-02-29"),
            Value::I64(1),
        ]]
    );

    // Filter arguments go through the same conversion.
    let at = written.at.unwrap();
    let count = session
        .query_table::<Sample>()
        .unwrap()
        .filter("at__gt", at - Duration::seconds(1))
        .filter("at__lte", at)
        .count()
        .await
        .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn nulls_and_values() {
    let db = setup().await;
    let mut session = db.session().unwrap();

    let mut written = Sample {
        maybe: Some(-1),
        ..sample()
    };
    written.at = None;
    session.insert(&mut written).await.unwrap();

    let row = session
        .query_table::<Sample>()
        .unwrap()
        .values(&["flag", "big", "ratio", "at", "maybe"])
        .await
        .unwrap()
        .remove(0);
    assert_eq!(row["flag"], Value::Bool(true));
    assert_eq!(row["big"], Value::U64(1 << 40));
    assert_eq!(row["ratio"], Value::F64(0.5));
    assert_eq!(row["at"], Value::Null);
    assert_eq!(row["maybe"], Value::I64(-1));

    assert_eq!(
        session
            .query_table::<Sample>()
            .unwrap()
            .filter("at__isnull", true)
            .filter("flag", true)
            .count()
            .await
            .unwrap(),
        1
    );
}

#[tokio::test]
async fn out_of_range_columns_fail_to_map() {
    let db = setup().await;
    let mut session = db.session().unwrap();

    let mut written = sample();
    session.insert(&mut written).await.unwrap();

    session
        .raw(r#"UPDATE "sample" SET "small" = ?"#, vec![300.into()])
        .exec()
        .await
        .unwrap();

    let err = session
        .query_table::<Sample>()
        .unwrap()
        .one::<Sample>()
        .await
        .unwrap_err();
    assert!(err.is_type_conversion(), "{err}");
}

#[tokio::test]
async fn invalid_utf8_text_fails_to_map() {
    let db = setup().await;
    let mut session = db.session().unwrap();

    let mut tag = Tag::new("rust");
    session.insert(&mut tag).await.unwrap();

    session
        .raw(r#"UPDATE "tag" SET "name" = CAST(X'FFFE' AS TEXT)"#, vec![])
        .exec()
        .await
        .unwrap();

    let mut read = Tag {
        id: tag.id,
        ..Tag::default()
    };
    let err = session.read(&mut read, &[]).await.unwrap_err();
    assert!(err.is_type_conversion(), "{err}");
}

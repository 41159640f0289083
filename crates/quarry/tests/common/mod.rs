#![allow(dead_code)]

use chrono::{DateTime, NaiveDate, Utc};
use quarry::{
    BelongsTo, DatabaseConfig, Db, FieldDef, HasMany, HasOne, Model, ModelDef, Record, Result,
    Type, Value,
};
use quarry_driver_sqlite::Sqlite;

#[derive(Debug, Default)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub age: i32,
    pub email: Option<String>,
    pub profile: BelongsTo<Profile>,
    pub posts: HasMany<Post>,
}

impl User {
    pub fn new(name: &str, age: i32) -> User {
        User {
            name: name.to_string(),
            age,
            ..User::default()
        }
    }
}

impl Model for User {
    fn schema() -> ModelDef {
        ModelDef::new::<User>()
            .field(FieldDef::new("id", Type::I64).auto())
            .field(FieldDef::new("name", Type::String).size(100).index())
            .field(FieldDef::new("age", Type::I32).default(0))
            .field(FieldDef::new("email", Type::String).null().unique())
            .field(FieldDef::one_to_one::<Profile>("profile").null())
            .field(FieldDef::reverse_many::<Post>("posts"))
    }

    fn value(&self, index: usize) -> Value {
        match index {
            0 => self.id.into(),
            1 => (&self.name).into(),
            2 => self.age.into(),
            3 => self.email.clone().into(),
            4 => self.profile.key().clone(),
            _ => Value::Null,
        }
    }

    fn set_value(&mut self, index: usize, value: Value) -> Result<()> {
        match index {
            0 => self.id = value.to()?,
            1 => self.name = value.to()?,
            2 => self.age = value.to()?,
            3 => self.email = value.to()?,
            4 => self.profile.set_key(value),
            _ => {}
        }
        Ok(())
    }

    fn set_related(&mut self, index: usize, rows: Vec<Record>) -> Result<()> {
        match index {
            4 => self.profile.load(rows),
            5 => self.posts.load(rows),
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Default)]
pub struct Profile {
    pub id: i64,
    pub bio: String,
    pub user: HasOne<User>,
}

impl Model for Profile {
    fn schema() -> ModelDef {
        ModelDef::new::<Profile>()
            .field(FieldDef::new("id", Type::I64).auto())
            .field(FieldDef::new("bio", Type::Text))
            .field(FieldDef::reverse_one::<User>("user"))
    }

    fn value(&self, index: usize) -> Value {
        match index {
            0 => self.id.into(),
            1 => (&self.bio).into(),
            _ => Value::Null,
        }
    }

    fn set_value(&mut self, index: usize, value: Value) -> Result<()> {
        match index {
            0 => self.id = value.to()?,
            1 => self.bio = value.to()?,
            _ => {}
        }
        Ok(())
    }

    fn set_related(&mut self, index: usize, rows: Vec<Record>) -> Result<()> {
        match index {
            2 => self.user.load(rows),
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Default)]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub score: f64,
    pub user: BelongsTo<User>,
    pub tags: HasMany<Tag>,
}

impl Post {
    pub fn new(title: &str, score: f64, user: &User) -> Post {
        Post {
            title: title.to_string(),
            score,
            user: BelongsTo::new(user.id),
            ..Post::default()
        }
    }
}

impl Model for Post {
    fn schema() -> ModelDef {
        ModelDef::new::<Post>()
            .field(FieldDef::new("id", Type::I64).auto())
            .field(FieldDef::new("title", Type::String).size(200))
            .field(FieldDef::new("score", Type::F64))
            .field(FieldDef::foreign_key::<User>("user"))
            .field(FieldDef::many_to_many::<Tag>("tags"))
    }

    fn value(&self, index: usize) -> Value {
        match index {
            0 => self.id.into(),
            1 => (&self.title).into(),
            2 => self.score.into(),
            3 => self.user.key().clone(),
            _ => Value::Null,
        }
    }

    fn set_value(&mut self, index: usize, value: Value) -> Result<()> {
        match index {
            0 => self.id = value.to()?,
            1 => self.title = value.to()?,
            2 => self.score = value.to()?,
            3 => self.user.set_key(value),
            _ => {}
        }
        Ok(())
    }

    fn set_related(&mut self, index: usize, rows: Vec<Record>) -> Result<()> {
        match index {
            3 => self.user.load(rows),
            4 => self.tags.load(rows),
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Default)]
pub struct Tag {
    pub id: i64,
    pub name: String,
}

impl Tag {
    pub fn new(name: &str) -> Tag {
        Tag {
            name: name.to_string(),
            ..Tag::default()
        }
    }
}

impl Model for Tag {
    fn schema() -> ModelDef {
        ModelDef::new::<Tag>()
            .field(FieldDef::new("id", Type::I64).auto())
            .field(FieldDef::new("name", Type::String).size(50).unique())
    }

    fn value(&self, index: usize) -> Value {
        match index {
            0 => self.id.into(),
            1 => (&self.name).into(),
            _ => Value::Null,
        }
    }

    fn set_value(&mut self, index: usize, value: Value) -> Result<()> {
        match index {
            0 => self.id = value.to()?,
            1 => self.name = value.to()?,
            _ => {}
        }
        Ok(())
    }
}

/// One field of every supported type.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Sample {
    pub id: i64,
    pub flag: bool,
    pub small: i8,
    pub big: u64,
    pub ratio: f32,
    pub text: String,
    pub blob: Vec<u8>,
    pub at: Option<DateTime<Utc>>,
    pub day: Option<NaiveDate>,
    pub maybe: Option<i64>,
}

impl Model for Sample {
    fn schema() -> ModelDef {
        ModelDef::new::<Sample>()
            .field(FieldDef::new("id", Type::I64).auto())
            .field(FieldDef::new("flag", Type::Bool))
            .field(FieldDef::new("small", Type::I8))
            .field(FieldDef::new("big", Type::U64))
            .field(FieldDef::new("ratio", Type::F32))
            .field(FieldDef::new("text", Type::Text))
            .field(FieldDef::new("blob", Type::Bytes))
            .field(FieldDef::new("at", Type::DateTime).null())
            .field(FieldDef::new("day", Type::Date).null())
            .field(FieldDef::new("maybe", Type::I64).null())
    }

    fn value(&self, index: usize) -> Value {
        match index {
            0 => self.id.into(),
            1 => self.flag.into(),
            2 => self.small.into(),
            3 => self.big.into(),
            4 => self.ratio.into(),
            5 => (&self.text).into(),
            6 => self.blob.clone().into(),
            7 => self.at.into(),
            8 => self.day.into(),
            9 => self.maybe.into(),
            _ => Value::Null,
        }
    }

    fn set_value(&mut self, index: usize, value: Value) -> Result<()> {
        match index {
            0 => self.id = value.to()?,
            1 => self.flag = value.to()?,
            2 => self.small = value.to()?,
            3 => self.big = value.to()?,
            4 => self.ratio = value.to()?,
            5 => self.text = value.to()?,
            6 => self.blob = value.to()?,
            7 => self.at = value.to()?,
            8 => self.day = value.to()?,
            9 => self.maybe = value.to()?,
            _ => {}
        }
        Ok(())
    }
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn builder() -> quarry::db::Builder {
    let mut builder = Db::builder();
    builder
        .register::<User>()
        .unwrap()
        .register::<Profile>()
        .unwrap()
        .register::<Post>()
        .unwrap()
        .register::<Tag>()
        .unwrap()
        .register::<Sample>()
        .unwrap();
    builder
}

/// An in-memory database with every test model's table created.
pub async fn setup() -> Db {
    setup_with(DatabaseConfig::default()).await
}

pub async fn setup_with(config: DatabaseConfig) -> Db {
    init_tracing();

    let mut builder = builder();
    builder
        .register_database("default", Sqlite::in_memory(), config)
        .unwrap();

    let db = builder.build().await.unwrap();
    db.session().unwrap().sync_schema().await.unwrap();
    db
}

/// Inserts users named `a`, `b`, `c` aged 10, 20, 30.
pub async fn seed_users(session: &mut quarry::Session) -> Vec<User> {
    let mut users = vec![User::new("a", 10), User::new("b", 20), User::new("c", 30)];
    for user in &mut users {
        session.insert(user).await.unwrap();
    }
    users
}

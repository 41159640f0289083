//! Object-relational mapping over SQL databases.
//!
//! A [`Db`] owns the model [`Registry`] and one connection pool per database
//! alias. Work happens through a [`Session`]: CRUD on model instances,
//! [`QuerySet`] for filtered queries, [`RawSet`] for hand-written SQL and
//! [`Transaction`] for atomic units of work.

pub mod db;
pub use db::{DatabaseConfig, Db, PoolStats};

mod mapper;
pub use mapper::Params;

mod model;
pub use model::{Model, Record};

pub mod query;
pub use query::QuerySet;

mod raw;
pub use raw::{RawResult, RawSet};

pub mod relation;
pub use relation::{BelongsTo, HasMany, HasOne, LoadRelatedOptions, QueryM2M};

pub mod session;
pub use session::{Session, SessionConfig, Transaction, TxOptions};

pub use quarry_core::{
    async_trait, bail,
    driver::{self, IsolationLevel},
    err,
    schema::{self, FieldDef, ModelDef, Registry},
    stmt::{self, Arg, Condition, Type, Value},
    CancelHandle, Context, Error, Result,
};

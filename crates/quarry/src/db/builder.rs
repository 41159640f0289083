use super::{connect::driver_for_url, Alias, Db, Pool, Shared};
use crate::{Model, SessionConfig};

use chrono::{FixedOffset, Offset, Utc};
use indexmap::IndexMap;
use quarry_core::{driver::Driver, schema, Error, Result};
use quarry_sql::Serializer;

use std::sync::Arc;

/// Per-database settings.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Upper bound on pooled connections. Drivers may impose a lower one.
    pub max_connections: Option<usize>,

    /// Idle connections to keep. Recorded for callers; the pool keeps every
    /// returned connection.
    pub max_idle: Option<usize>,

    /// Zone in which date-times are stored.
    pub time_zone: FixedOffset,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            max_connections: None,
            max_idle: None,
            time_zone: Utc.fix(),
        }
    }
}

/// Collects models and databases, then connects in [`Builder::build`].
#[derive(Debug, Default)]
pub struct Builder {
    registry: schema::Builder,
    databases: Vec<PendingDatabase>,
    config: SessionConfig,
}

#[derive(Debug)]
struct PendingDatabase {
    name: String,
    driver: Box<dyn Driver>,
    config: DatabaseConfig,
}

impl Builder {
    pub fn register<M: Model>(&mut self) -> Result<&mut Self> {
        self.registry.register(M::schema())?;
        Ok(self)
    }

    /// Registers `M` with `prefix` prepended to its table name.
    pub fn register_with_prefix<M: Model>(&mut self, prefix: &str) -> Result<&mut Self> {
        self.registry.register_with_prefix(M::schema(), prefix)?;
        Ok(self)
    }

    /// Registers `M` with `suffix` appended to its table name.
    pub fn register_with_suffix<M: Model>(&mut self, suffix: &str) -> Result<&mut Self> {
        self.registry.register_with_suffix(M::schema(), suffix)?;
        Ok(self)
    }

    /// Adds a database under `name`, served by `driver`.
    pub fn register_database(
        &mut self,
        name: &str,
        driver: impl Driver,
        config: DatabaseConfig,
    ) -> Result<&mut Self> {
        self.push_database(name, Box::new(driver), config)
    }

    /// Adds a database under `name`, choosing the driver from the URL
    /// scheme.
    pub fn connect(&mut self, name: &str, url: &str) -> Result<&mut Self> {
        self.connect_with(name, url, DatabaseConfig::default())
    }

    pub fn connect_with(
        &mut self,
        name: &str,
        url: &str,
        config: DatabaseConfig,
    ) -> Result<&mut Self> {
        let driver = driver_for_url(url)?;
        self.push_database(name, driver, config)
    }

    /// Sets the configuration sessions start with.
    pub fn config(&mut self, config: SessionConfig) -> &mut Self {
        self.config = config;
        self
    }

    fn push_database(
        &mut self,
        name: &str,
        driver: Box<dyn Driver>,
        config: DatabaseConfig,
    ) -> Result<&mut Self> {
        if self.databases.iter().any(|db| db.name == name) {
            return Err(Error::duplicate_alias(name));
        }

        self.databases.push(PendingDatabase {
            name: name.to_string(),
            driver,
            config,
        });
        Ok(self)
    }

    /// Resolves the registered models and opens a pool per database.
    ///
    /// Each pool opens one connection up front, so an unreachable database
    /// fails here rather than on first use.
    pub async fn build(&mut self) -> Result<Db> {
        let registry = std::mem::take(&mut self.registry).build()?;

        let mut aliases = IndexMap::new();

        for database in std::mem::take(&mut self.databases) {
            let pool = Pool::new(database.driver, database.config.max_connections)
                .await
                .map_err(|err| err.context(format!("database `{}`", database.name)))?;

            tracing::debug!(
                alias = %database.name,
                driver = pool.driver_name(),
                "database registered"
            );

            let serializer = Serializer::for_capability(pool.capability());

            aliases.insert(
                database.name.clone(),
                Arc::new(Alias {
                    name: database.name,
                    pool,
                    serializer,
                    config: database.config,
                }),
            );
        }

        Ok(Db {
            shared: Arc::new(Shared {
                registry: Arc::new(registry),
                aliases,
                config: self.config.clone(),
            }),
        })
    }
}

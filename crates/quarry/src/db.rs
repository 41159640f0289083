mod builder;
pub use builder::{Builder, DatabaseConfig};

mod connect;

mod pool;
pub(crate) use pool::{Pool, PoolConnection};
pub use pool::PoolStats;

use crate::{Session, SessionConfig};

use chrono::FixedOffset;
use indexmap::IndexMap;
use quarry_core::{Error, Registry, Result};
use quarry_sql::Serializer;

use std::sync::Arc;

/// Name of the alias used by [`Db::session`].
pub const DEFAULT_ALIAS: &str = "default";

/// Shared state between all `Db` clones.
#[derive(Debug)]
struct Shared {
    registry: Arc<Registry>,
    aliases: IndexMap<String, Arc<Alias>>,
    config: SessionConfig,
}

/// A named database: its pool and the settings sessions inherit.
#[derive(Debug)]
pub(crate) struct Alias {
    pub(crate) name: String,
    pub(crate) pool: Pool,
    pub(crate) serializer: Serializer,
    pub(crate) config: DatabaseConfig,
}

impl Alias {
    pub(crate) fn time_zone(&self) -> &FixedOffset {
        &self.config.time_zone
    }
}

/// Handle to the registered models and databases.
///
/// Cheap to clone; clones share the registry and the connection pools.
#[derive(Debug, Clone)]
pub struct Db {
    shared: Arc<Shared>,
}

impl Db {
    pub fn builder() -> Builder {
        Builder::default()
    }

    /// Opens a session on the `default` alias.
    pub fn session(&self) -> Result<Session> {
        self.session_for(DEFAULT_ALIAS)
    }

    /// Opens a session on the named alias.
    pub fn session_for(&self, alias: &str) -> Result<Session> {
        self.session_with(alias, self.shared.config.clone())
    }

    /// Opens a session on the named alias with its own configuration.
    pub fn session_with(&self, alias: &str, config: SessionConfig) -> Result<Session> {
        let alias = self
            .shared
            .aliases
            .get(alias)
            .ok_or_else(|| Error::alias_not_registered(alias))?;

        Ok(Session::new(
            self.shared.registry.clone(),
            alias.clone(),
            config,
        ))
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.shared.registry
    }

    /// Names of the registered aliases, in registration order.
    pub fn aliases(&self) -> impl Iterator<Item = &str> + '_ {
        self.shared.aliases.keys().map(String::as_str)
    }

    pub fn database_config(&self, alias: &str) -> Option<&DatabaseConfig> {
        self.shared.aliases.get(alias).map(|alias| &alias.config)
    }

    pub fn config(&self) -> &SessionConfig {
        &self.shared.config
    }
}

//! Connection pooling for database connections.

use std::ops::{Deref, DerefMut};

use quarry_core::{
    driver::{Capability, Connection, Driver},
    Error, Result,
};

/// A connection pool that manages database connections.
#[derive(Debug, Clone)]
pub(crate) struct Pool {
    inner: deadpool::managed::Pool<Manager>,
    capability: &'static Capability,
    driver_name: &'static str,
}

/// Snapshot of a pool's occupancy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStats {
    /// Upper bound on open connections.
    pub max_size: usize,
    /// Connections currently open.
    pub size: usize,
    /// Open connections not in use.
    pub available: usize,
    /// Tasks waiting for a connection.
    pub waiting: usize,
}

impl Pool {
    /// Creates a new connection pool from the given driver and opens a first
    /// connection to check that the database is reachable.
    pub(crate) async fn new(driver: Box<dyn Driver>, max_size: Option<usize>) -> Result<Self> {
        let capability = driver.capability();
        let driver_name = driver.name();

        let max_size = match (driver.max_connections(), max_size) {
            (Some(limit), Some(requested)) => Some(limit.min(requested)),
            (limit, requested) => limit.or(requested),
        };

        let mut builder = deadpool::managed::Pool::builder(Manager { driver })
            .runtime(deadpool::Runtime::Tokio1);

        if let Some(max_size) = max_size {
            builder = builder.max_size(max_size.max(1));
        }

        let inner = builder.build().map_err(Error::connection_pool)?;

        let pool = Self {
            inner,
            capability,
            driver_name,
        };

        pool.get().await?;
        Ok(pool)
    }

    /// Retrieves a connection from the pool.
    pub(crate) async fn get(&self) -> Result<PoolConnection> {
        let connection = self.inner.get().await.map_err(|err| match err {
            deadpool::managed::PoolError::Backend(err) => err,
            err => Error::connection_pool(err),
        })?;
        Ok(PoolConnection { inner: connection })
    }

    pub(crate) fn capability(&self) -> &'static Capability {
        self.capability
    }

    pub(crate) fn driver_name(&self) -> &'static str {
        self.driver_name
    }

    pub(crate) fn stats(&self) -> PoolStats {
        let status = self.inner.status();
        PoolStats {
            max_size: status.max_size,
            size: status.size,
            available: status.available,
            waiting: status.waiting,
        }
    }
}

#[derive(Debug)]
struct Manager {
    driver: Box<dyn Driver>,
}

impl deadpool::managed::Manager for Manager {
    type Type = Box<dyn Connection>;
    type Error = Error;

    async fn create(&self) -> Result<Self::Type> {
        self.driver.connect().await
    }

    async fn recycle(
        &self,
        _obj: &mut Self::Type,
        _metrics: &deadpool::managed::Metrics,
    ) -> deadpool::managed::RecycleResult<Self::Error> {
        Ok(())
    }
}

/// A connection retrieved from a pool.
///
/// When dropped, the connection is returned to the pool for reuse.
#[derive(Debug)]
pub(crate) struct PoolConnection {
    inner: deadpool::managed::Object<Manager>,
}

impl PoolConnection {
    /// Removes the connection from the pool. Used when its state is unknown,
    /// e.g. a transaction that could not be rolled back.
    pub(crate) fn detach(self) {
        drop(deadpool::managed::Object::take(self.inner));
    }
}

impl Deref for PoolConnection {
    type Target = Box<dyn Connection>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl DerefMut for PoolConnection {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.inner
    }
}

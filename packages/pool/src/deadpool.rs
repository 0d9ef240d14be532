//! `deadpool` pool backend.
//!
//! Wraps a `deadpool` managed pool. Idle and expiry eviction map onto
//! `Pool::retain` over the per-object metrics; terminal shutdown maps onto
//! `Pool::close`. All maintenance calls operate on idle objects only, so
//! leased connections are never touched.

use std::time::Duration;

use async_trait::async_trait;
use deadpool::managed::{Manager, Metrics, Object, PoolError, RecycleResult};

use crate::{CloseMode, Error, GenericConnectionPool, PoolConfig, PoolStatus};

fn map_pool_error<E: std::fmt::Display>(err: PoolError<E>) -> Error {
    match err {
        PoolError::Timeout(_) => Error::Timeout,
        PoolError::Closed => Error::Closed,
        err => Error::Backend(err.to_string()),
    }
}

/// Managed connection pool over an arbitrary `deadpool` [`Manager`].
pub struct ConnectionPool<M: Manager> {
    pool: deadpool::managed::Pool<M>,
    time_to_live: Option<Duration>,
}

impl<M: Manager> ConnectionPool<M> {
    /// Builds the pool eagerly from `config`.
    ///
    /// # Errors
    ///
    /// * If the pool backend rejects the configuration
    pub fn from_config(manager: M, config: &PoolConfig) -> Result<Self, Error> {
        let mut builder = deadpool::managed::Pool::builder(manager)
            .max_size(config.max_connections)
            .runtime(deadpool::Runtime::Tokio1);
        if let Some(acquire_timeout) = config.acquire_timeout {
            builder = builder.wait_timeout(Some(acquire_timeout));
        }
        let pool = builder
            .build()
            .map_err(|err| Error::Backend(err.to_string()))?;
        Ok(Self {
            pool,
            time_to_live: config.time_to_live,
        })
    }
}

#[async_trait]
impl<M> GenericConnectionPool for ConnectionPool<M>
where
    M: Manager + Send + Sync,
    M::Type: Send,
    M::Error: std::fmt::Display,
{
    type Connection = Object<M>;

    async fn acquire(&self) -> Result<Object<M>, Error> {
        self.pool.get().await.map_err(map_pool_error)
    }

    fn close_idle(&self, grace: Duration) -> Result<usize, Error> {
        let removed = self
            .pool
            .retain(|_, metrics: Metrics| metrics.last_used() < grace)
            .removed
            .len();
        log::debug!("closed {removed} idle connection(s)");
        Ok(removed)
    }

    fn close_expired(&self) -> Result<usize, Error> {
        let Some(ttl) = self.time_to_live else {
            return Ok(0);
        };
        let removed = self
            .pool
            .retain(|_, metrics: Metrics| metrics.age() < ttl)
            .removed
            .len();
        log::debug!("closed {removed} expired connection(s)");
        Ok(removed)
    }

    fn close(&self, mode: CloseMode) -> Result<(), Error> {
        if mode == CloseMode::Immediate {
            self.pool.retain(|_, _| false);
        }
        self.pool.close();
        Ok(())
    }

    fn status(&self) -> PoolStatus {
        let status = self.pool.status();
        PoolStatus {
            idle: status.available,
            in_use: status.size.saturating_sub(status.available),
            max: status.max_size,
        }
    }
}

/// Establishes plain TCP connections to a fixed authority.
pub struct TcpConnectionManager {
    authority: String,
    connect_timeout: Option<Duration>,
}

impl TcpConnectionManager {
    #[must_use]
    pub fn new(authority: impl Into<String>) -> Self {
        Self {
            authority: authority.into(),
            connect_timeout: None,
        }
    }

    #[must_use]
    pub const fn connect_timeout(mut self, connect_timeout: Duration) -> Self {
        self.connect_timeout = Some(connect_timeout);
        self
    }

    #[must_use]
    pub fn authority(&self) -> &str {
        &self.authority
    }
}

impl Manager for TcpConnectionManager {
    type Type = tokio::net::TcpStream;
    type Error = std::io::Error;

    async fn create(&self) -> Result<Self::Type, Self::Error> {
        log::trace!(target: "roost_pool::wire", "connecting to {}", self.authority);
        let connect = tokio::net::TcpStream::connect(&self.authority);
        let stream = match self.connect_timeout {
            Some(connect_timeout) => tokio::time::timeout(connect_timeout, connect)
                .await
                .map_err(|_| {
                    std::io::Error::new(std::io::ErrorKind::TimedOut, "connect timed out")
                })??,
            None => connect.await?,
        };
        stream.set_nodelay(true)?;
        log::trace!(target: "roost_pool::wire", "connected to {}", self.authority);
        Ok(stream)
    }

    async fn recycle(
        &self,
        _conn: &mut Self::Type,
        _metrics: &Metrics,
    ) -> RecycleResult<Self::Error> {
        Ok(())
    }
}

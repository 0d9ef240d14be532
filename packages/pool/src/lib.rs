#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Pooled connection management behind a backend-switchable contract.
//!
//! [`GenericConnectionPool`] is the contract consumed by lifecycle-aware
//! collaborators: maintenance operations (`close_idle`, `close_expired`,
//! `close`) are synchronous, never touch the network, and are safe to call
//! from any thread while other threads lease connections with `acquire`.
//!
//! Backends: [`deadpool`](mod@deadpool) wraps a `deadpool` managed pool;
//! [`simulator`] is an in-memory accounting pool for tests.

use std::time::Duration;

use async_trait::async_trait;
use strum::{AsRefStr, EnumString};
use thiserror::Error;

#[cfg(feature = "deadpool")]
pub mod deadpool;

#[cfg(feature = "simulator")]
pub mod simulator;

#[cfg(feature = "tls")]
pub mod tls;

#[derive(Debug, Error)]
pub enum Error {
    /// The pool has been shut down.
    #[error("Pool closed")]
    Closed,

    /// No connection became available within the configured acquire timeout.
    #[error("Timed out waiting for a pooled connection")]
    Timeout,

    #[error(transparent)]
    IO(#[from] std::io::Error),

    #[cfg(feature = "deadpool")]
    #[error("Pool backend: {0}")]
    Backend(String),
}

/// Shutdown mode for [`GenericConnectionPool::close`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, AsRefStr)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum CloseMode {
    /// In-flight leases finish and are released on return.
    Graceful,
    /// Idle connections are dropped up front as well.
    Immediate,
}

impl std::fmt::Display for CloseMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_ref())
    }
}

/// Point-in-time pool accounting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStatus {
    pub idle: usize,
    pub in_use: usize,
    pub max: usize,
}

/// Static pool configuration.
///
/// `time_to_live` is the expiry horizon applied by
/// [`GenericConnectionPool::close_expired`]; `None` means connections never
/// expire.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PoolConfig {
    pub max_connections: usize,
    pub time_to_live: Option<Duration>,
    pub acquire_timeout: Option<Duration>,
    pub connect_timeout: Option<Duration>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: 25,
            time_to_live: None,
            acquire_timeout: None,
            connect_timeout: None,
        }
    }
}

/// Chainable builder for pool backends.
#[derive(Debug, Clone, Default)]
pub struct ConnectionPoolBuilder {
    config: PoolConfig,
}

impl ConnectionPoolBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Assigns the maximum total connection count.
    #[must_use]
    pub const fn max_connections(mut self, max_connections: usize) -> Self {
        self.config.max_connections = max_connections;
        self
    }

    /// Assigns the maximum time to live for pooled connections.
    #[must_use]
    pub const fn time_to_live(mut self, time_to_live: Duration) -> Self {
        self.config.time_to_live = Some(time_to_live);
        self
    }

    /// Assigns the maximum time to wait for a free connection on acquire.
    #[must_use]
    pub const fn acquire_timeout(mut self, acquire_timeout: Duration) -> Self {
        self.config.acquire_timeout = Some(acquire_timeout);
        self
    }

    /// Assigns the maximum time to wait while establishing a connection.
    #[must_use]
    pub const fn connect_timeout(mut self, connect_timeout: Duration) -> Self {
        self.config.connect_timeout = Some(connect_timeout);
        self
    }

    #[must_use]
    pub const fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// Builds an in-memory simulator pool.
    #[cfg(feature = "simulator")]
    #[must_use]
    pub fn build_simulator(self) -> simulator::Pool {
        simulator::Pool::new(self.config)
    }

    /// Builds a TCP-backed managed pool connecting to `authority`
    /// (`host:port`).
    ///
    /// # Errors
    ///
    /// * If the pool backend rejects the configuration
    #[cfg(feature = "deadpool")]
    pub fn build_tcp(self, authority: impl Into<String>) -> Result<TcpPool, Error> {
        let mut manager = deadpool::TcpConnectionManager::new(authority);
        if let Some(connect_timeout) = self.config.connect_timeout {
            manager = manager.connect_timeout(connect_timeout);
        }
        deadpool::ConnectionPool::from_config(manager, &self.config)
    }
}

/// The pooled-connection collaborator contract.
///
/// Maintenance operations act on already-established connections only and
/// are non-blocking relative to network I/O. Locking discipline is the
/// backend's responsibility; callers add none.
#[async_trait]
pub trait GenericConnectionPool: Send + Sync {
    type Connection: Send;

    /// Leases a connection for request execution.
    ///
    /// # Errors
    ///
    /// * `Error::Closed` - if the pool has been shut down
    /// * `Error::Timeout` - if no connection became available in time
    /// * `Error::IO` - if establishing a new connection failed
    async fn acquire(&self) -> Result<Self::Connection, Error>;

    /// Force-closes connections that have been idle for at least `grace`.
    /// A zero grace period closes every idle connection. Leased connections
    /// are untouched and return to the pool normally.
    ///
    /// Returns the number of connections closed.
    ///
    /// # Errors
    ///
    /// * If the underlying pool fails to release the closed connections
    fn close_idle(&self, grace: Duration) -> Result<usize, Error>;

    /// Closes idle connections older than the configured time to live,
    /// preserving idle-but-unexpired connections for reuse.
    ///
    /// Returns the number of connections closed.
    ///
    /// # Errors
    ///
    /// * If the underlying pool fails to release the closed connections
    fn close_expired(&self) -> Result<usize, Error>;

    /// Shuts the pool down. Closing an already-closed pool is a no-op.
    ///
    /// # Errors
    ///
    /// * If the underlying pool fails to release its resources
    fn close(&self, mode: CloseMode) -> Result<(), Error>;

    fn status(&self) -> PoolStatus;
}

/// TCP-backed managed pool.
#[cfg(feature = "deadpool")]
pub type TcpPool = deadpool::ConnectionPool<deadpool::TcpConnectionManager>;

#[cfg(feature = "simulator")]
pub type Pool = simulator::Pool;

#[cfg(all(not(feature = "simulator"), feature = "deadpool"))]
pub type Pool = TcpPool;

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test_log::test]
    fn builder_accumulates_configuration() {
        let builder = ConnectionPoolBuilder::new()
            .max_connections(4)
            .time_to_live(Duration::from_secs(30))
            .acquire_timeout(Duration::from_secs(5))
            .connect_timeout(Duration::from_secs(1));
        assert_eq!(
            builder.config(),
            &PoolConfig {
                max_connections: 4,
                time_to_live: Some(Duration::from_secs(30)),
                acquire_timeout: Some(Duration::from_secs(5)),
                connect_timeout: Some(Duration::from_secs(1)),
            }
        );
    }

    #[test_log::test]
    fn default_config_never_expires_connections() {
        let config = PoolConfig::default();
        assert_eq!(config.time_to_live, None);
        assert_eq!(config.max_connections, 25);
    }

    #[test_log::test]
    fn close_mode_round_trips_through_strings() {
        assert_eq!(CloseMode::Graceful.to_string(), "GRACEFUL");
        assert_eq!("IMMEDIATE".parse::<CloseMode>().unwrap(), CloseMode::Immediate);
    }
}

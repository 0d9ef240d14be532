#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Lifecycle-aware connection pooling toolkit.
//!
//! Re-exports the Roost packages behind feature gates: [`pool`] owns the
//! pooled-connection contract and backends, [`lifecycle`] binds a pool to
//! host lifecycle transitions, [`logging`] routes the stack's log output
//! into a bounded-tag platform sink, and [`exec`] runs request sequences in
//! the background with progress updates.

#[cfg(feature = "exec")]
pub use roost_exec as exec;

#[cfg(feature = "lifecycle")]
pub use roost_lifecycle as lifecycle;

#[cfg(feature = "logging")]
pub use roost_logging as logging;

#[cfg(feature = "pool")]
pub use roost_pool as pool;

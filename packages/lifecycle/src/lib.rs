#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Lifecycle-bound ownership of a pooled connection resource.
//!
//! A [`PoolController`] owns exactly one connection pool and applies an
//! eviction policy at host lifecycle transition points: backgrounding
//! force-closes idle sockets immediately, foregrounding sweeps only expired
//! ones so warm sockets survive for reuse, and the terminal teardown closes
//! the whole pool gracefully exactly once. The host framework drives the
//! controller through the [`AppLifecycle`] hooks.

use std::{sync::Mutex, time::Duration};

use roost_pool::{CloseMode, GenericConnectionPool};
use strum::{AsRefStr, EnumString};
use thiserror::Error;

/// Visibility states of the hosting component, in the order they progress.
///
/// `Destroyed` is terminal; a destroyed controller never issues another pool
/// operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, AsRefStr)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum LifecycleState {
    Active,
    Paused,
    Stopped,
    Destroyed,
}

impl LifecycleState {
    #[must_use]
    pub const fn is_destroyed(self) -> bool {
        matches!(self, Self::Destroyed)
    }
}

impl std::fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_ref())
    }
}

#[derive(Debug, Error)]
pub enum ControllerError {
    #[error(transparent)]
    Pool(#[from] roost_pool::Error),
}

/// Host-framework lifecycle hooks.
///
/// Each hook is idempotent and becomes a no-op once the controller is
/// destroyed. Errors are surfaced to the caller synchronously and never
/// retried; lifecycle callbacks are one-shot and time-boxed by the host.
pub trait AppLifecycle {
    /// The hosting component left the foreground.
    ///
    /// # Errors
    ///
    /// * If the pool fails to close its idle connections
    fn on_pause(&self) -> Result<(), ControllerError>;

    /// The hosting component returned to the foreground.
    ///
    /// # Errors
    ///
    /// * If the pool fails to close its expired connections
    fn on_resume(&self) -> Result<(), ControllerError>;

    /// The hosting component became fully invisible.
    ///
    /// # Errors
    ///
    /// * If the pool fails to close its idle connections
    fn on_stop(&self) -> Result<(), ControllerError>;

    /// The hosting component is being torn down permanently.
    ///
    /// # Errors
    ///
    /// * If the pool fails to shut down
    fn on_destroy(&self) -> Result<(), ControllerError>;
}

/// Owns a connection pool for the lifetime of a hosting component.
///
/// Ownership is exclusive; the pool is built eagerly when the component is
/// constructed and released exactly once on destroy. Transition actions are
/// fast, operate on already-established connections only, and are safe to
/// run concurrently with `acquire` traffic from other threads. The
/// controller takes no lock beyond its own state mutex.
pub struct PoolController<P: GenericConnectionPool> {
    pool: P,
    state: Mutex<LifecycleState>,
}

impl<P: GenericConnectionPool> PoolController<P> {
    /// Takes ownership of `pool` with the controller starting out `Active`.
    #[must_use]
    pub fn new(pool: P) -> Self {
        Self {
            pool,
            state: Mutex::new(LifecycleState::Active),
        }
    }

    /// The owned pool, for collaborators executing requests through it.
    #[must_use]
    pub const fn pool(&self) -> &P {
        &self.pool
    }

    /// # Panics
    ///
    /// * If the state lock is poisoned
    #[must_use]
    pub fn state(&self) -> LifecycleState {
        *self.state.lock().unwrap()
    }
}

impl<P: GenericConnectionPool> AppLifecycle for PoolController<P> {
    fn on_pause(&self) -> Result<(), ControllerError> {
        let mut state = self.state.lock().unwrap();
        if state.is_destroyed() {
            log::debug!("pause after destroy ignored");
            return Ok(());
        }
        // idle sockets are stale by the time the app resumes; in-flight
        // requests are left alone
        let closed = self.pool.close_idle(Duration::ZERO)?;
        log::debug!("paused, closed {closed} idle connection(s)");
        *state = LifecycleState::Paused;
        Ok(())
    }

    fn on_resume(&self) -> Result<(), ControllerError> {
        let mut state = self.state.lock().unwrap();
        if state.is_destroyed() {
            log::debug!("resume after destroy ignored");
            return Ok(());
        }
        // only expired connections go; warm sockets are kept for reuse
        let closed = self.pool.close_expired()?;
        log::debug!("resumed, closed {closed} expired connection(s)");
        *state = LifecycleState::Active;
        Ok(())
    }

    fn on_stop(&self) -> Result<(), ControllerError> {
        let mut state = self.state.lock().unwrap();
        if state.is_destroyed() {
            log::debug!("stop after destroy ignored");
            return Ok(());
        }
        // stop can arrive without a preceding pause; re-apply the idle close
        // regardless of the current state
        let closed = self.pool.close_idle(Duration::ZERO)?;
        log::debug!("stopped, closed {closed} idle connection(s)");
        *state = LifecycleState::Stopped;
        Ok(())
    }

    fn on_destroy(&self) -> Result<(), ControllerError> {
        let mut state = self.state.lock().unwrap();
        if state.is_destroyed() {
            log::debug!("destroy after destroy ignored");
            return Ok(());
        }
        *state = LifecycleState::Destroyed;
        self.pool.close(CloseMode::Graceful)?;
        log::debug!("destroyed, pool closed gracefully");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use roost_pool::{ConnectionPoolBuilder, simulator};

    use super::*;

    fn controller(pool: simulator::Pool) -> PoolController<simulator::Pool> {
        PoolController::new(pool)
    }

    #[test_log::test]
    fn controller_starts_active() {
        let controller = controller(ConnectionPoolBuilder::new().build_simulator());
        assert_eq!(controller.state(), LifecycleState::Active);
    }

    #[test_log::test(tokio::test)]
    async fn pause_closes_idle_and_spares_in_flight() {
        let pool = ConnectionPoolBuilder::new().build_simulator();
        pool.add_idle();
        pool.add_idle();
        pool.add_idle();
        let held_a = pool.acquire().await.unwrap();
        let held_b = pool.acquire().await.unwrap();

        let controller = controller(pool);
        controller.on_pause().unwrap();

        assert_eq!(controller.state(), LifecycleState::Paused);
        let status = controller.pool().status();
        assert_eq!(status.idle, 0);
        assert_eq!(status.in_use, 2);
        drop(held_a);
        drop(held_b);
        assert_eq!(controller.pool().status().idle, 2);
    }

    #[test_log::test]
    fn repeated_pause_is_a_no_op() {
        let pool = ConnectionPoolBuilder::new().build_simulator();
        pool.add_idle();
        let controller = controller(pool);
        controller.on_pause().unwrap();
        controller.on_pause().unwrap();
        assert_eq!(controller.state(), LifecycleState::Paused);
        assert_eq!(controller.pool().status().idle, 0);
    }

    #[test_log::test]
    fn resume_preserves_unexpired_idle_connections() {
        let pool = ConnectionPoolBuilder::new()
            .time_to_live(Duration::from_secs(30))
            .build_simulator();
        pool.add_idle_aged(Duration::from_secs(10), Duration::from_secs(10));
        pool.add_idle_aged(Duration::from_secs(31), Duration::from_secs(10));

        let controller = controller(pool);
        controller.on_resume().unwrap();

        assert_eq!(controller.state(), LifecycleState::Active);
        assert_eq!(controller.pool().status().idle, 1);
    }

    #[test_log::test]
    fn stop_without_preceding_pause_closes_idle() {
        let pool = ConnectionPoolBuilder::new().build_simulator();
        pool.add_idle();
        let controller = controller(pool);
        controller.on_stop().unwrap();
        assert_eq!(controller.state(), LifecycleState::Stopped);
        assert_eq!(controller.pool().status().idle, 0);
    }

    #[test_log::test]
    fn stop_directly_after_pause_finds_nothing_to_close() {
        let pool = ConnectionPoolBuilder::new().build_simulator();
        pool.add_idle();
        pool.add_idle();
        pool.add_idle();
        let controller = controller(pool);
        controller.on_pause().unwrap();
        controller.on_stop().unwrap();
        assert_eq!(controller.state(), LifecycleState::Stopped);
        assert_eq!(controller.pool().status().idle, 0);
    }

    #[test_log::test]
    fn destroy_closes_gracefully_exactly_once() {
        let pool = ConnectionPoolBuilder::new().build_simulator();
        let controller = controller(pool);
        controller.on_destroy().unwrap();
        controller.on_destroy().unwrap();
        assert_eq!(controller.state(), LifecycleState::Destroyed);
        assert_eq!(controller.pool().close_calls(), 1);
        assert!(controller.pool().is_closed());
    }

    #[test_log::test]
    fn transitions_after_destroy_are_no_ops() {
        let pool = ConnectionPoolBuilder::new().build_simulator();
        let controller = controller(pool);
        controller.on_destroy().unwrap();
        controller.on_pause().unwrap();
        controller.on_resume().unwrap();
        controller.on_stop().unwrap();
        assert_eq!(controller.state(), LifecycleState::Destroyed);
        assert!(controller.pool().is_closed());
        assert_eq!(controller.pool().close_calls(), 1);
    }

    #[test_log::test]
    fn maintenance_errors_are_surfaced_without_advancing_state() {
        let pool = ConnectionPoolBuilder::new().build_simulator();
        pool.fail_maintenance(true);
        let controller = controller(pool);
        assert!(controller.on_pause().is_err());
        assert_eq!(controller.state(), LifecycleState::Active);
        controller.pool().fail_maintenance(false);
        controller.on_pause().unwrap();
        assert_eq!(controller.state(), LifecycleState::Paused);
    }

    #[test_log::test]
    fn full_lifecycle_sequence_progresses_forward() {
        let pool = ConnectionPoolBuilder::new()
            .time_to_live(Duration::from_secs(30))
            .build_simulator();
        let controller = controller(pool);
        controller.on_pause().unwrap();
        controller.on_resume().unwrap();
        controller.on_pause().unwrap();
        controller.on_stop().unwrap();
        controller.on_destroy().unwrap();
        assert_eq!(controller.state(), LifecycleState::Destroyed);
    }
}

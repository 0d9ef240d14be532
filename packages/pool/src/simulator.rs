//! Simulator pool backend.
//!
//! An in-memory accounting pool with no real sockets behind it. Connection
//! ages are plain numbers that tests inject and advance explicitly, which
//! makes eviction behavior deterministic.

use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;

use crate::{CloseMode, Error, GenericConnectionPool, PoolConfig, PoolStatus};

#[derive(Debug, Clone, Copy)]
struct IdleEntry {
    id: usize,
    /// Time since the connection was established.
    age: Duration,
    /// Time since the connection was last leased.
    idle_for: Duration,
}

#[derive(Default)]
struct State {
    idle: Vec<IdleEntry>,
    leased: usize,
    closed: bool,
    close_calls: usize,
    fail_maintenance: bool,
    next_id: usize,
}

struct Inner {
    config: PoolConfig,
    state: Mutex<State>,
}

/// A leased simulator connection. Dropping it returns it to the pool (or
/// discards it if the pool has been closed in the meantime).
pub struct Connection {
    id: usize,
    age: Duration,
    inner: Arc<Inner>,
}

impl Connection {
    #[must_use]
    pub const fn id(&self) -> usize {
        self.id
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        // the lock may be poisoned while unwinding
        if let Ok(mut state) = self.inner.state.lock() {
            state.leased -= 1;
            if !state.closed {
                state.idle.push(IdleEntry {
                    id: self.id,
                    age: self.age,
                    idle_for: Duration::ZERO,
                });
            }
        }
    }
}

pub struct Pool {
    inner: Arc<Inner>,
}

impl Pool {
    #[must_use]
    pub fn new(config: PoolConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                state: Mutex::new(State::default()),
            }),
        }
    }

    /// Seeds one idle connection with zero age.
    ///
    /// # Panics
    ///
    /// * If the state lock is poisoned
    pub fn add_idle(&self) {
        self.add_idle_aged(Duration::ZERO, Duration::ZERO);
    }

    /// Seeds one idle connection with the given age and idle time.
    ///
    /// # Panics
    ///
    /// * If the state lock is poisoned
    pub fn add_idle_aged(&self, age: Duration, idle_for: Duration) {
        let mut state = self.inner.state.lock().unwrap();
        let id = state.next_id;
        state.next_id += 1;
        state.idle.push(IdleEntry { id, age, idle_for });
    }

    /// Advances every pooled connection's age and idle time by `elapsed`.
    ///
    /// # Panics
    ///
    /// * If the state lock is poisoned
    pub fn advance(&self, elapsed: Duration) {
        let mut state = self.inner.state.lock().unwrap();
        for entry in &mut state.idle {
            entry.age += elapsed;
            entry.idle_for += elapsed;
        }
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.inner.state.lock().unwrap().closed
    }

    /// Number of times [`GenericConnectionPool::close`] has been invoked.
    ///
    /// # Panics
    ///
    /// * If the state lock is poisoned
    #[must_use]
    pub fn close_calls(&self) -> usize {
        self.inner.state.lock().unwrap().close_calls
    }

    /// Makes every subsequent maintenance operation fail, for exercising
    /// caller error paths.
    ///
    /// # Panics
    ///
    /// * If the state lock is poisoned
    pub fn fail_maintenance(&self, fail: bool) {
        self.inner.state.lock().unwrap().fail_maintenance = fail;
    }
}

fn injected_failure() -> Error {
    Error::IO(std::io::Error::other("injected maintenance failure"))
}

#[async_trait]
impl GenericConnectionPool for Pool {
    type Connection = Connection;

    async fn acquire(&self) -> Result<Connection, Error> {
        let mut state = self.inner.state.lock().unwrap();
        if state.closed {
            return Err(Error::Closed);
        }
        let (id, age) = if let Some(entry) = state.idle.pop() {
            (entry.id, entry.age)
        } else if state.leased < self.inner.config.max_connections {
            let id = state.next_id;
            state.next_id += 1;
            (id, Duration::ZERO)
        } else {
            return Err(Error::Timeout);
        };
        state.leased += 1;
        Ok(Connection {
            id,
            age,
            inner: self.inner.clone(),
        })
    }

    fn close_idle(&self, grace: Duration) -> Result<usize, Error> {
        let mut state = self.inner.state.lock().unwrap();
        if state.fail_maintenance {
            return Err(injected_failure());
        }
        let before = state.idle.len();
        state.idle.retain(|entry| entry.idle_for < grace);
        Ok(before - state.idle.len())
    }

    fn close_expired(&self) -> Result<usize, Error> {
        let mut state = self.inner.state.lock().unwrap();
        if state.fail_maintenance {
            return Err(injected_failure());
        }
        let Some(ttl) = self.inner.config.time_to_live else {
            return Ok(0);
        };
        let before = state.idle.len();
        state.idle.retain(|entry| entry.age < ttl);
        Ok(before - state.idle.len())
    }

    fn close(&self, _mode: CloseMode) -> Result<(), Error> {
        let mut state = self.inner.state.lock().unwrap();
        if state.fail_maintenance {
            return Err(injected_failure());
        }
        state.close_calls += 1;
        state.closed = true;
        state.idle.clear();
        Ok(())
    }

    fn status(&self) -> PoolStatus {
        let state = self.inner.state.lock().unwrap();
        PoolStatus {
            idle: state.idle.len(),
            in_use: state.leased,
            max: self.inner.config.max_connections,
        }
    }
}

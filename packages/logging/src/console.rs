//! Console logging sink.
//!
//! Writes `D/Tag: message` lines to stderr. The global threshold defaults to
//! `Info` and can be seeded from the `ROOST_LOG` environment variable or
//! changed at runtime; per-tag overrides take precedence. Enablement is read
//! on every call, so runtime changes take effect immediately.

use std::{
    collections::HashMap,
    io::Write as _,
    sync::RwLock,
};

use crate::{LogLevel, LogSink};

const fn level_letter(level: LogLevel) -> char {
    match level {
        LogLevel::Trace => 'V',
        LogLevel::Debug => 'D',
        LogLevel::Info => 'I',
        LogLevel::Warn => 'W',
        LogLevel::Error => 'E',
    }
}

pub struct Sink {
    threshold: RwLock<LogLevel>,
    tag_levels: RwLock<HashMap<String, LogLevel>>,
}

impl Sink {
    /// Creates a sink with the threshold taken from `ROOST_LOG`, falling
    /// back to `Info` when unset or unparsable.
    #[must_use]
    pub fn new() -> Self {
        let threshold = std::env::var("ROOST_LOG")
            .ok()
            .and_then(|value| value.to_uppercase().parse().ok())
            .unwrap_or(LogLevel::Info);
        Self::with_threshold(threshold)
    }

    #[must_use]
    pub fn with_threshold(threshold: LogLevel) -> Self {
        Self {
            threshold: RwLock::new(threshold),
            tag_levels: RwLock::new(HashMap::new()),
        }
    }

    /// # Panics
    ///
    /// * If the threshold lock is poisoned
    pub fn set_threshold(&self, level: LogLevel) {
        *self.threshold.write().unwrap() = level;
    }

    /// # Panics
    ///
    /// * If the tag-level lock is poisoned
    pub fn set_tag_level(&self, tag: &str, level: LogLevel) {
        self.tag_levels
            .write()
            .unwrap()
            .insert(tag.to_string(), level);
    }
}

impl Default for Sink {
    fn default() -> Self {
        Self::new()
    }
}

impl LogSink for Sink {
    fn enabled(&self, tag: &str, level: LogLevel) -> bool {
        let min = self
            .tag_levels
            .read()
            .unwrap()
            .get(tag)
            .copied()
            .unwrap_or_else(|| *self.threshold.read().unwrap());
        level >= min
    }

    fn write(&self, level: LogLevel, tag: &str, message: &str) {
        // a failed stderr write must not reach the caller
        let mut stderr = std::io::stderr().lock();
        let _ = writeln!(stderr, "{}/{tag}: {message}", level_letter(level));
    }
}

//! Simulator logging sink.
//!
//! Captures records in memory instead of writing to the platform. Enablement
//! is controlled the same way as the real sink (global threshold plus per-tag
//! overrides, mutable at runtime), which makes call-time gating observable in
//! tests.

use std::{
    collections::HashMap,
    sync::{Mutex, RwLock},
};

use crate::{LogLevel, LogSink};

/// A captured log record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub level: LogLevel,
    pub tag: String,
    pub message: String,
}

pub struct Sink {
    records: Mutex<Vec<Record>>,
    threshold: RwLock<LogLevel>,
    tag_levels: RwLock<HashMap<String, LogLevel>>,
}

impl Sink {
    #[must_use]
    pub fn new() -> Self {
        Self {
            records: Mutex::new(Vec::new()),
            threshold: RwLock::new(LogLevel::Trace),
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

    /// Returns a copy of every captured record, in write order.
    ///
    /// # Panics
    ///
    /// * If the record lock is poisoned
    #[must_use]
    pub fn records(&self) -> Vec<Record> {
        self.records.lock().unwrap().clone()
    }

    /// # Panics
    ///
    /// * If the record lock is poisoned
    pub fn clear(&self) {
        self.records.lock().unwrap().clear();
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
        self.records.lock().unwrap().push(Record {
            level,
            tag: tag.to_string(),
            message: message.to_string(),
        });
    }
}

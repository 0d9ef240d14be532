#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Bridges the `log` facade and the pooled-transport stack's log channels
//! into a platform logging sink with bounded, human-readable tags.
//!
//! A [`LoggerFactory`] hands out [`Logger`] handles bound to a derived tag
//! (see [`tag`]). Every write is gated by a call-time enablement query
//! against the [`LogSink`], so runtime log-level changes take effect
//! immediately. [`bridge::init`] installs the factory as the process-wide
//! `log` backend.

use std::{
    collections::HashMap,
    fmt::Display,
    sync::{Arc, RwLock},
};

use strum::{AsRefStr, EnumString};

pub mod bridge;
pub mod format;
pub mod tag;

#[cfg(feature = "console")]
pub mod console;

#[cfg(feature = "simulator")]
pub mod simulator;

pub use log;

/// Log severities accepted by the platform sink, in ascending order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, EnumString, AsRefStr,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<log::Level> for LogLevel {
    fn from(value: log::Level) -> Self {
        match value {
            log::Level::Trace => Self::Trace,
            log::Level::Debug => Self::Debug,
            log::Level::Info => Self::Info,
            log::Level::Warn => Self::Warn,
            log::Level::Error => Self::Error,
        }
    }
}

impl From<LogLevel> for log::Level {
    fn from(value: LogLevel) -> Self {
        match value {
            LogLevel::Trace => Self::Trace,
            LogLevel::Debug => Self::Debug,
            LogLevel::Info => Self::Info,
            LogLevel::Warn => Self::Warn,
            LogLevel::Error => Self::Error,
        }
    }
}

/// The platform logging facility.
///
/// One entry point writes a formatted record, the other answers whether a
/// tag/severity pair is currently enabled. Callers must query enablement at
/// call time rather than cache it.
pub trait LogSink: Send + Sync {
    fn enabled(&self, tag: &str, level: LogLevel) -> bool;
    fn write(&self, level: LogLevel, tag: &str, message: &str);
}

fn render_cause(cause: &dyn std::error::Error) -> String {
    let mut rendered = cause.to_string();
    let mut source = cause.source();
    while let Some(err) = source {
        rendered.push_str("\nCaused by: ");
        rendered.push_str(&err.to_string());
        source = err.source();
    }
    rendered
}

/// A tag-bound logger handle.
///
/// Handles are created by [`LoggerFactory::logger`] and shared process-wide.
/// All writes go through the owning factory's [`LogSink`].
pub struct Logger {
    tag: String,
    sink: Arc<dyn LogSink>,
}

impl Logger {
    /// The derived platform tag this handle writes under.
    #[must_use]
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Queries the sink for whether `level` is currently enabled for this
    /// handle's tag. Never cached.
    #[must_use]
    pub fn is_enabled(&self, level: LogLevel) -> bool {
        self.sink.enabled(&self.tag, level)
    }

    /// Writes `message` at `level`, if enabled.
    pub fn log(&self, level: LogLevel, message: &str) {
        self.log_message(level, message, None);
    }

    pub(crate) fn log_message(
        &self,
        level: LogLevel,
        message: &str,
        cause: Option<&dyn std::error::Error>,
    ) {
        if !self.is_enabled(level) {
            return;
        }
        match cause {
            Some(cause) => self.sink.write(
                level,
                &self.tag,
                &format!("{message}\n{}", render_cause(cause)),
            ),
            None => self.sink.write(level, &self.tag, message),
        }
    }

    pub(crate) fn log_formatted(&self, level: LogLevel, format: &str, args: &[&dyn Display]) {
        if self.is_enabled(level) {
            self.sink
                .write(level, &self.tag, &format::format_message(format, args));
        }
    }
}

macro_rules! impl_level_methods {
    ($($level:ident),* $(,)?) => {
        $(
            paste::paste! {
                impl Logger {
                    #[must_use]
                    pub fn [< is_ $level _enabled >](&self) -> bool {
                        self.is_enabled(LogLevel::[< $level:camel >])
                    }

                    pub fn $level(&self, message: &str) {
                        self.log_message(LogLevel::[< $level:camel >], message, None);
                    }

                    /// Formats `format` with `{}` markers replaced by `args`
                    /// in order. Formatting is best-effort and never fails.
                    pub fn [< $level _fmt >](&self, format: &str, args: &[&dyn std::fmt::Display]) {
                        self.log_formatted(LogLevel::[< $level:camel >], format, args);
                    }

                    /// Logs `message` with the cause's rendering appended
                    /// after a newline.
                    pub fn [< $level _err >](&self, message: &str, cause: &dyn std::error::Error) {
                        self.log_message(LogLevel::[< $level:camel >], message, Some(cause));
                    }
                }
            }
        )*
    };
}

impl_level_methods!(trace, debug, info, warn, error);

/// Hands out memoized, tag-bound [`Logger`] handles.
///
/// The registry lives for the lifetime of the factory and entries are never
/// removed. Construct one per process and share it; there is no implicit
/// global instance.
pub struct LoggerFactory {
    sink: Arc<dyn LogSink>,
    registry: RwLock<HashMap<String, Arc<Logger>>>,
}

impl LoggerFactory {
    #[must_use]
    pub fn new(sink: Arc<dyn LogSink>) -> Self {
        Self {
            sink,
            registry: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the canonical handle for `name`, creating it on first lookup.
    ///
    /// Concurrent first lookups for the same name race on the insert; the
    /// first writer wins and the loser's transient instance is discarded, so
    /// every caller observes the same handle.
    ///
    /// # Panics
    ///
    /// * If the registry lock is poisoned
    #[must_use]
    pub fn logger(&self, name: &str) -> Arc<Logger> {
        if let Some(logger) = self.registry.read().unwrap().get(name) {
            return logger.clone();
        }
        let logger = Arc::new(Logger {
            tag: tag::tag_for_name(name),
            sink: self.sink.clone(),
        });
        self.registry
            .write()
            .unwrap()
            .entry(name.to_string())
            .or_insert(logger)
            .clone()
    }

    #[must_use]
    pub fn sink(&self) -> &Arc<dyn LogSink> {
        &self.sink
    }
}

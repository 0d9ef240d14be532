//! Binding of the `log` facade to a platform sink.
//!
//! Everything the wrapped stack emits through `log` macros is routed through
//! a [`LoggerFactory`], so records pick up the same tag derivation and
//! call-time enablement gating as handles obtained directly from the
//! factory.

use std::sync::Arc;

use thiserror::Error;

use crate::{LogSink, LoggerFactory};

/// `log::Log` implementation backed by a [`LoggerFactory`].
pub struct BridgeLogger {
    factory: LoggerFactory,
}

impl BridgeLogger {
    #[must_use]
    pub fn new(sink: Arc<dyn LogSink>) -> Self {
        Self {
            factory: LoggerFactory::new(sink),
        }
    }

    #[must_use]
    pub fn factory(&self) -> &LoggerFactory {
        &self.factory
    }
}

impl log::Log for BridgeLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        self.factory
            .logger(metadata.target())
            .is_enabled(metadata.level().into())
    }

    fn log(&self, record: &log::Record) {
        let logger = self.factory.logger(record.target());
        logger.log(record.level().into(), &record.args().to_string());
    }

    fn flush(&self) {}
}

#[derive(Debug, Error)]
pub enum InitError {
    #[error(transparent)]
    SetLogger(#[from] log::SetLoggerError),
}

/// Installs a [`BridgeLogger`] over `sink` as the process-wide `log`
/// backend.
///
/// Level filtering happens in the sink, so the facade's maximum level is
/// opened up to `Trace`.
///
/// # Errors
///
/// * If a global logger is already installed
pub fn init(sink: Arc<dyn LogSink>) -> Result<(), InitError> {
    log::set_boxed_logger(Box::new(BridgeLogger::new(sink)))?;
    log::set_max_level(log::LevelFilter::Trace);
    Ok(())
}

#[cfg(all(test, feature = "simulator"))]
mod tests {
    use log::Log as _;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{LogLevel, simulator};

    #[test_log::test]
    fn records_are_routed_with_derived_tags() {
        let sink = Arc::new(simulator::Sink::new());
        let bridge = BridgeLogger::new(sink.clone());
        bridge.log(
            &log::Record::builder()
                .args(format_args!("connection established"))
                .level(log::Level::Debug)
                .target("my_app::net::client")
                .build(),
        );
        let records = sink.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].tag, "my_app.net.client");
        assert_eq!(records[0].level, LogLevel::Debug);
        assert_eq!(records[0].message, "connection established");
    }

    #[test_log::test]
    fn pool_dependency_chatter_collapses_into_one_tag() {
        let sink = Arc::new(simulator::Sink::new());
        let bridge = BridgeLogger::new(sink.clone());
        bridge.log(
            &log::Record::builder()
                .args(format_args!("recycling object"))
                .level(log::Level::Trace)
                .target("deadpool::managed::pool")
                .build(),
        );
        assert_eq!(sink.records()[0].tag, crate::tag::POOL_TAG);
    }

    #[test_log::test]
    fn disabled_records_are_not_written() {
        let sink = Arc::new(simulator::Sink::new());
        sink.set_threshold(LogLevel::Error);
        let bridge = BridgeLogger::new(sink.clone());
        assert!(!bridge.enabled(
            &log::Metadata::builder()
                .level(log::Level::Info)
                .target("anything")
                .build()
        ));
        bridge.log(
            &log::Record::builder()
                .args(format_args!("dropped"))
                .level(log::Level::Info)
                .target("anything")
                .build(),
        );
        assert!(sink.records().is_empty());
    }
}

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Routes `log` macro output and direct logger handles through the console
//! sink.
//!
//! ```bash
//! ROOST_LOG=TRACE cargo run --package logging_basic_usage
//! ```

use std::sync::Arc;

use roost_logging::{LogLevel, LoggerFactory, bridge, console};

fn main() {
    let sink = Arc::new(console::Sink::new());

    bridge::init(sink.clone()).expect("no other logger is installed");

    log::info!("facade records pick up a derived tag");
    log::debug!(target: "deadpool::managed", "pool chatter collapses into one tag");

    let factory = LoggerFactory::new(sink.clone());
    let logger = factory.logger("com.example.application.network.Downloader");

    logger.info("direct handle, suffix-derived tag");
    logger.debug_fmt("{} of {} connections idle", &[&3, &5]);

    sink.set_threshold(LogLevel::Trace);
    logger.trace("visible after the runtime threshold change");
}

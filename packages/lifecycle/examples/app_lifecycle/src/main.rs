#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Drives a pool controller through a typical host lifecycle sequence and
//! prints the pool accounting after every transition.
//!
//! ```bash
//! RUST_LOG=debug cargo run --package lifecycle_app_lifecycle
//! ```

use std::time::Duration;

use roost_lifecycle::{AppLifecycle as _, PoolController};
use roost_pool::{ConnectionPoolBuilder, GenericConnectionPool as _};

#[tokio::main]
async fn main() -> Result<(), roost_lifecycle::ControllerError> {
    pretty_env_logger::init();

    let pool = ConnectionPoolBuilder::new()
        .max_connections(8)
        .time_to_live(Duration::from_secs(30))
        .build_simulator();

    // three warm sockets, two requests in flight
    pool.add_idle();
    pool.add_idle();
    pool.add_idle();
    let in_flight_a = pool.acquire().await.expect("pool is open");
    let in_flight_b = pool.acquire().await.expect("pool is open");

    let controller = PoolController::new(pool);
    println!("constructed: {:?}", controller.pool().status());

    controller.on_pause()?;
    println!("paused:      {:?}", controller.pool().status());

    drop(in_flight_a);
    drop(in_flight_b);
    println!("completed:   {:?}", controller.pool().status());

    controller.pool().advance(Duration::from_secs(31));
    controller.on_resume()?;
    println!("resumed:     {:?}", controller.pool().status());

    controller.on_stop()?;
    controller.on_destroy()?;
    // a defensive double-destroy from the host is a no-op
    controller.on_destroy()?;
    println!("destroyed:   {:?}", controller.pool().status());

    Ok(())
}

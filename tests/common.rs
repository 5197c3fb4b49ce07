//!
//! Shared helpers for the integration tests.
//!
#![allow(dead_code)]

use tracing::metadata::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Sends `tracing` output to the test harness once per test binary.
///
/// `RUST_LOG` overrides the default `debug` level.
pub fn init_tracing() {
    static ONCE: std::sync::Once = std::sync::Once::new();

    ONCE.call_once(|| {
        let filter = EnvFilter::builder()
            .with_default_directive(LevelFilter::DEBUG.into())
            .from_env_lossy();
        tracing_subscriber::fmt()
            .with_ansi(false)
            .with_test_writer()
            .with_thread_ids(true)
            .with_env_filter(filter)
            .init();
    });
}

/// Flips one byte of a container in place.
pub fn flip_byte(bytes: &mut [u8], offset: usize, delta: u8) {
    bytes[offset] = bytes[offset].wrapping_add(delta);
}

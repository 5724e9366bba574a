//! Shared test setup.
//!
//! ```rust,ignore
//! mod common;
//!
//! #[test]
//! fn my_test() {
//!     common::init_tracing();
//! }
//! ```
//!
//! Library events are only emitted with the `tracing` feature:
//!
//! ```bash
//! RUST_LOG=radix_prefix=trace cargo test --features tracing -- --nocapture
//! ```

#![allow(dead_code)]

use std::sync::Once;

use tracing::Level;
use tracing_subscriber::EnvFilter;

static INIT: Once = Once::new();

/// Install a console subscriber filtered by `RUST_LOG`. Only the first call takes effect.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(Level::WARN.to_string()));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_thread_names(true)
            .with_test_writer()
            .try_init();
    });
}

/// Decimal keys `0..count` zero-padded to `width`, in insertion order.
pub fn padded_keys(count: usize, width: usize) -> Vec<String> {
    (0..count).map(|i| format!("{i:0width$}")).collect()
}

//! Testing utilities and mock implementations
//!
//! Lets tests drive the worker pool without waiting for real operator
//! durations.

pub mod mocks;

pub use mocks::*;

use std::time::{Duration, Instant};

/// Poll `condition` every 5ms until it holds or `timeout` passes
///
/// Returns whether the condition was met.
pub async fn wait_until<F>(timeout: Duration, mut condition: F) -> bool
where
    F: FnMut() -> bool,
{
    let deadline = Instant::now() + timeout;
    loop {
        if condition() {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

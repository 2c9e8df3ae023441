//! Wall clock seam

use crate::types::EpochMillis;

/// Source of the current time in epoch milliseconds
pub trait Clock {
    fn now_ms(&self) -> EpochMillis;
}

/// Clock backed by the system (or, on wasm, the JS `Date`) time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> EpochMillis {
        chrono::Utc::now().timestamp_millis()
    }
}

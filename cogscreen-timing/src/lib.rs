pub mod jitter;
pub mod queue;
pub mod timer;

pub use jitter::{JitterStats, LoopJitter};
pub use queue::{TaskHandle, TaskQueue};
pub use timer::{HighPrecisionTimer, ManualTimer, Timer};

pub const NANOS_PER_MILLI: u64 = 1_000_000;

pub fn millis_to_nanos(ms: u64) -> u64 {
    ms.saturating_mul(NANOS_PER_MILLI)
}

pub fn nanos_to_millis(ns: u64) -> f64 {
    ns as f64 / NANOS_PER_MILLI as f64
}

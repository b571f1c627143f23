// timefn.rs — portable high-resolution monotonic timer abstraction.
//
// `std::time::Instant` is monotonic and MT-safe on all supported platforms,
// so the tuner's timing needs (probe throughput, trial durations in the
// tests) reduce to a thin wrapper that deals in nanoseconds and seconds.

use std::time::Instant;

/// Nanosecond duration type.
pub type DurationNs = u64;

/// Opaque timestamp container. The absolute value is not meaningful; use it
/// only to compute a duration between two measurements.
#[derive(Clone, Copy)]
pub struct Timestamp {
    t: Instant,
}

impl Timestamp {
    pub fn now() -> Self {
        Timestamp { t: Instant::now() }
    }
}

impl Default for Timestamp {
    fn default() -> Self {
        Timestamp::now()
    }
}

/// Returns the current monotonic timestamp.
pub fn get_time() -> Timestamp {
    Timestamp::now()
}

/// Nanoseconds between `start` and `end`.
pub fn span_ns(start: Timestamp, end: Timestamp) -> DurationNs {
    end.t.duration_since(start.t).as_nanos() as DurationNs
}

/// Nanoseconds elapsed since `start` (captures the current time internally).
pub fn clock_span_ns(start: Timestamp) -> DurationNs {
    start.t.elapsed().as_nanos() as DurationNs
}

/// Seconds elapsed since `start`, as a float suitable for scoring math.
pub fn clock_span_sec(start: Timestamp) -> f64 {
    clock_span_ns(start) as f64 / 1e9
}

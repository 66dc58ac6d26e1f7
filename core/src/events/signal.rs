use std::time::Duration;

/// Signals emitted by the tick scheduler for cross-cutting concerns.
/// These surface the drift bookkeeping at a higher level than the raw
/// tracing output, for tests and field diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerSignal {
    /// One heartbeat processed. `diff` is the counter gap observed on
    /// arrival, before any resync; `delta_ms` is the time error the interval
    /// correction was computed from.
    Heartbeat {
        external_ticks: i64,
        local_ticks: i64,
        diff: i64,
        interval: Duration,
        delta_ms: i64,
    },

    /// Counters diverged past the allowed window and were forced equal.
    /// Self-healing, not an error.
    Resync {
        external_ticks: i64,
        local_ticks: i64,
    },
}

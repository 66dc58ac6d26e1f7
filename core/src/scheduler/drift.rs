//! Drift-corrected interval estimation.
//!
//! Pure bookkeeping behind the tick scheduler: counters for both tick
//! streams, the timestamps of their most recent ticks, and the corrected
//! interval for the next local tick. Every method takes `now` as an
//! argument, so the model is fully deterministic under test.

use std::time::{Duration, Instant};

/// Counters are rebased once the external count reaches this value.
const REBASE_THRESHOLD: i64 = 100;

/// Amount subtracted from both counters on rebase. Less than the threshold,
/// so the local count cannot land on 0 and re-trigger bootstrap.
const REBASE_STEP: i64 = 90;

/// Outcome of ingesting one heartbeat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct HeartbeatReport {
    pub external_ticks: i64,
    pub local_ticks: i64,
    /// Counter gap observed on arrival, before any resync.
    pub diff: i64,
    /// Interval the next local tick will be scheduled with.
    pub interval: Duration,
    /// Time error the correction was computed from, in milliseconds.
    pub delta_ms: i64,
    /// The counters were forced back to equality this heartbeat.
    pub resynced: bool,
    /// This was the first heartbeat ever seen; the owner must arm the loop.
    pub bootstrapped: bool,
}

#[derive(Debug, Clone)]
pub(crate) struct DriftModel {
    base_interval: Duration,
    max_adjustment: Duration,

    // Tick counters
    external_ticks: i64,
    local_ticks: i64,

    // Time tracking
    last_external_tick: Option<Instant>,
    last_local_tick: Option<Instant>,
    current_interval: Duration,
}

impl DriftModel {
    pub(crate) fn new(base_interval: Duration, max_adjustment: Duration) -> Self {
        Self {
            base_interval,
            max_adjustment,
            external_ticks: 0,
            local_ticks: 0,
            last_external_tick: None,
            last_local_tick: None,
            current_interval: base_interval,
        }
    }

    /// Ingest one heartbeat and recompute the interval for the next local
    /// tick. Never touches the timer itself; the caller arms the loop when
    /// the report says the model bootstrapped.
    pub(crate) fn record_heartbeat(&mut self, now: Instant) -> HeartbeatReport {
        // First heartbeat ever: count the arming local tick here so the
        // counters start in lock-step.
        let bootstrapped = self.local_ticks == 0;
        if bootstrapped {
            self.local_ticks += 1;
        }

        self.last_external_tick = Some(now);
        self.external_ticks += 1;

        // Keep the counters from counting up forever.
        if self.external_ticks >= REBASE_THRESHOLD {
            self.external_ticks -= REBASE_STEP;
            self.local_ticks -= REBASE_STEP;
        }

        // The correction branch below is chosen by the relationship observed
        // here, before the resync repairs it.
        let diff = self.external_ticks - self.local_ticks;
        let external_leads = diff > 0;

        // If the ticks get way out of sync, make them equal to each other.
        let resynced = diff > 1 || diff < 0;
        if resynced {
            self.local_ticks = self.external_ticks;
        }

        let delta_ms = self.correct_interval(external_leads);

        HeartbeatReport {
            external_ticks: self.external_ticks,
            local_ticks: self.local_ticks,
            diff,
            interval: self.current_interval,
            delta_ms,
            resynced,
            bootstrapped,
        }
    }

    /// Recompute `current_interval`, returning the time error it was derived
    /// from.
    fn correct_interval(&mut self, external_leads: bool) -> i64 {
        let Some(last_external) = self.last_external_tick else {
            return 0;
        };
        let base = self.base_interval.as_millis() as i64;
        let max_adjustment = self.max_adjustment.as_millis() as i64;
        let last_local = self.last_local_tick.unwrap_or(last_external);

        let (delta_ms, adjusted) = if external_leads {
            // The heartbeat landed before the local tick it belongs with.
            // Compare against where the local timer is predicted to fire and
            // shrink toward the external pace.
            let predicted_next_local = last_local + self.current_interval;
            let delta = signed_ms(last_external, predicted_next_local);
            let adjusted = if delta.abs() < max_adjustment {
                base - delta.abs()
            } else {
                base - max_adjustment
            };
            (delta, adjusted)
        } else {
            // The heartbeat landed at or after its local tick. Stretch by the
            // observed gap (a negative gap shrinks instead).
            let delta = signed_ms(last_external, last_local);
            let adjusted = if delta < max_adjustment {
                base + delta
            } else {
                base + max_adjustment
            };
            (delta, adjusted)
        };

        // Hard invariant: the interval never leaves the adjustment band,
        // whatever the deltas were.
        let bounded = adjusted.clamp(base - max_adjustment, base + max_adjustment);
        self.current_interval = Duration::from_millis(bounded as u64);
        delta_ms
    }

    /// Record one firing of the local timer.
    pub(crate) fn record_local_tick(&mut self, now: Instant) {
        self.last_local_tick = Some(now);
        self.local_ticks += 1;
    }

    /// Anchor the local clock at arm time, before the first fire.
    pub(crate) fn anchor_local(&mut self, now: Instant) {
        self.last_local_tick = Some(now);
    }

    /// Zero the counters and timers and restore the base interval.
    pub(crate) fn reset(&mut self) {
        self.external_ticks = 0;
        self.local_ticks = 0;
        self.last_external_tick = None;
        self.last_local_tick = None;
        self.current_interval = self.base_interval;
    }

    pub(crate) fn current_interval(&self) -> Duration {
        self.current_interval
    }

    pub(crate) fn external_ticks(&self) -> i64 {
        self.external_ticks
    }

    pub(crate) fn local_ticks(&self) -> i64 {
        self.local_ticks
    }

    pub(crate) fn base_interval(&self) -> Duration {
        self.base_interval
    }

    pub(crate) fn max_adjustment(&self) -> Duration {
        self.max_adjustment
    }
}

/// Milliseconds from `b` to `a`, negative when `a` is earlier.
fn signed_ms(a: Instant, b: Instant) -> i64 {
    if a >= b {
        a.duration_since(b).as_millis() as i64
    } else {
        -(b.duration_since(a).as_millis() as i64)
    }
}

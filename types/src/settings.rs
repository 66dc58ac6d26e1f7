//! Timing and measure settings.
//!
//! Both types deserialize leniently (missing fields take defaults) and are
//! normalized before use so downstream invariants hold by construction.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::cue::MAX_TICKS_PER_MEASURE;

/// Parameters of the adaptive tick clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingSettings {
    /// Nominal heartbeat period in milliseconds.
    pub base_tick_interval_ms: u64,

    /// Maximum per-heartbeat interval correction in milliseconds.
    pub max_adjustment_ms: u64,

    /// Route the metronome off the smoothed local clock instead of the raw
    /// heartbeat. More consistent, slightly less accurate.
    pub tick_smoothing: bool,
}

impl Default for TimingSettings {
    fn default() -> Self {
        Self {
            base_tick_interval_ms: 600,
            max_adjustment_ms: 10,
            tick_smoothing: false,
        }
    }
}

impl TimingSettings {
    /// Clamp values into the ranges the scheduler requires:
    /// `0 < max_adjustment < base_interval`.
    pub fn normalized(mut self) -> Self {
        self.base_tick_interval_ms = self.base_tick_interval_ms.max(2);
        self.max_adjustment_ms = self
            .max_adjustment_ms
            .clamp(1, self.base_tick_interval_ms - 1);
        self
    }

    pub fn base_interval(&self) -> Duration {
        Duration::from_millis(self.base_tick_interval_ms)
    }

    pub fn max_adjustment(&self) -> Duration {
        Duration::from_millis(self.max_adjustment_ms)
    }
}

/// How the metronome cycles through a measure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeasureSettings {
    /// Number of ticks in the metronome loop (1 to 8).
    pub ticks_per_measure: u8,

    /// The tick the metronome starts on (0 to 8).
    pub start_tick: u8,

    /// How many beat banks are enabled for rotating through (1 to 2).
    pub enabled_beats: u8,
}

impl Default for MeasureSettings {
    fn default() -> Self {
        Self {
            ticks_per_measure: 4,
            start_tick: 0,
            enabled_beats: 2,
        }
    }
}

impl MeasureSettings {
    /// Clamp values into their configured ranges.
    pub fn normalized(mut self) -> Self {
        let max_ticks = MAX_TICKS_PER_MEASURE as u8;
        self.ticks_per_measure = self.ticks_per_measure.clamp(1, max_ticks);
        self.start_tick = self.start_tick.min(max_ticks);
        self.enabled_beats = self.enabled_beats.clamp(1, 2);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timing_defaults() {
        let timing = TimingSettings::default();
        assert_eq!(timing.base_tick_interval_ms, 600);
        assert_eq!(timing.max_adjustment_ms, 10);
        assert!(!timing.tick_smoothing);
    }

    #[test]
    fn test_timing_normalization_clamps_adjustment() {
        let timing = TimingSettings {
            base_tick_interval_ms: 600,
            max_adjustment_ms: 1000,
            tick_smoothing: false,
        }
        .normalized();
        assert_eq!(timing.max_adjustment_ms, 599);

        let timing = TimingSettings {
            base_tick_interval_ms: 600,
            max_adjustment_ms: 0,
            tick_smoothing: false,
        }
        .normalized();
        assert_eq!(timing.max_adjustment_ms, 1);
    }

    #[test]
    fn test_timing_normalization_floors_base() {
        let timing = TimingSettings {
            base_tick_interval_ms: 0,
            max_adjustment_ms: 10,
            tick_smoothing: false,
        }
        .normalized();
        assert_eq!(timing.base_tick_interval_ms, 2);
        assert_eq!(timing.max_adjustment_ms, 1);
    }

    #[test]
    fn test_timing_partial_toml() {
        let timing: TimingSettings = toml::from_str("tick_smoothing = true").unwrap();
        assert_eq!(timing.base_tick_interval_ms, 600);
        assert!(timing.tick_smoothing);
    }

    #[test]
    fn test_measure_normalization() {
        let measure = MeasureSettings {
            ticks_per_measure: 0,
            start_tick: 20,
            enabled_beats: 5,
        }
        .normalized();
        assert_eq!(measure.ticks_per_measure, 1);
        assert_eq!(measure.start_tick, 8);
        assert_eq!(measure.enabled_beats, 2);
    }

    #[test]
    fn test_measure_round_trip() {
        let measure = MeasureSettings {
            ticks_per_measure: 6,
            start_tick: 2,
            enabled_beats: 1,
        };
        let serialized = toml::to_string(&measure).unwrap();
        let parsed: MeasureSettings = toml::from_str(&serialized).unwrap();
        assert_eq!(parsed, measure);
    }
}

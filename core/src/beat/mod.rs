//! Measure position tracking.
//!
//! The host advances the engine once per tick — from the raw heartbeat or
//! from the smoothed local tick, whichever its `tick_smoothing` setting
//! routes through — and the engine answers with the current measure
//! position. Manual nudges (hotkey handlers, UI buttons) go through the
//! adjust operations; the engine itself knows nothing about input sources.

use cadence_types::MeasureSettings;

/// A position within the metronome cycle: the active beat bank and the
/// 1-based tick within the measure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BeatPosition {
    pub beat: u8,
    pub tick: u8,
}

#[derive(Debug, Clone)]
pub struct BeatEngine {
    settings: MeasureSettings,
    /// Current tick within the measure. 0 only before the first advance when
    /// the configured start tick is 0.
    tick: u8,
    /// Active beat bank, 1-based.
    beat: u8,
    held: bool,
}

impl BeatEngine {
    pub fn new(settings: MeasureSettings) -> Self {
        let settings = settings.normalized();
        Self {
            tick: settings.start_tick,
            beat: 1,
            held: false,
            settings,
        }
    }

    /// Advance one tick, wrapping at the end of the measure. Returns the new
    /// position, or `None` while the hold is engaged.
    pub fn advance(&mut self) -> Option<BeatPosition> {
        if self.held {
            return None;
        }
        self.tick = (self.tick % self.settings.ticks_per_measure) + 1;
        Some(self.position())
    }

    /// Nudge the measure position by `delta` ticks, wrapping in either
    /// direction.
    pub fn adjust_tick(&mut self, delta: i16) {
        let max = i16::from(self.settings.ticks_per_measure);
        let tick = i16::from(self.tick);
        self.tick = ((tick - 1 + delta).rem_euclid(max) + 1) as u8;
    }

    /// Rotate the active beat bank by `delta`, wrapping across the enabled
    /// banks.
    pub fn adjust_beat(&mut self, delta: i16) {
        let max = i16::from(self.settings.enabled_beats);
        let beat = i16::from(self.beat);
        self.beat = ((beat - 1 + delta).rem_euclid(max) + 1) as u8;
    }

    /// Jump back to the configured start tick.
    pub fn reset_to_start(&mut self) {
        self.tick = self.settings.start_tick;
    }

    /// Engage or release the hold. While held, [`advance`](Self::advance)
    /// does nothing; the host typically pairs engaging with
    /// [`reset_to_start`](Self::reset_to_start).
    pub fn set_hold(&mut self, held: bool) {
        self.held = held;
    }

    pub fn is_held(&self) -> bool {
        self.held
    }

    pub fn position(&self) -> BeatPosition {
        BeatPosition {
            beat: self.beat,
            tick: self.tick,
        }
    }

    /// Swap in new measure settings, clamping the current position into the
    /// new ranges.
    pub fn set_settings(&mut self, settings: MeasureSettings) {
        self.settings = settings.normalized();
        self.tick = self.tick.min(self.settings.ticks_per_measure);
        self.beat = self.beat.clamp(1, self.settings.enabled_beats);
    }

    pub fn settings(&self) -> &MeasureSettings {
        &self.settings
    }
}

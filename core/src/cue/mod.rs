//! Cue selection.
//!
//! Decides which cue a measure position maps to. Turning the cue into sound
//! is the host's concern; this layer only answers "what should tick N of
//! beat B play, if anything".

use cadence_types::{CueAssignments, TickCue, MAX_TICKS_PER_MEASURE};

#[derive(Debug, Clone, Default)]
pub struct CueSelector {
    assignments: CueAssignments,
}

impl CueSelector {
    pub fn new(assignments: CueAssignments) -> Self {
        Self { assignments }
    }

    /// Cue configured for the given measure position, if any.
    ///
    /// Beat banks beyond the configured set fall back to the first bank;
    /// out-of-range ticks and `Off` slots select nothing.
    pub fn cue_for(&self, beat: u8, tick: u8) -> Option<TickCue> {
        if tick == 0 || tick as usize > MAX_TICKS_PER_MEASURE {
            return None;
        }
        let cue = self.assignments.bank(beat)[usize::from(tick) - 1];
        (cue != TickCue::Off).then_some(cue)
    }

    pub fn assignments(&self) -> &CueAssignments {
        &self.assignments
    }

    pub fn set_assignments(&mut self, assignments: CueAssignments) {
        self.assignments = assignments;
    }
}

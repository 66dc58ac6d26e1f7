//! Cue palette and per-measure cue assignments.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Upper bound on ticks in a measure; assignment banks are sized to this.
pub const MAX_TICKS_PER_MEASURE: usize = 8;

/// Number of beat banks a configuration can rotate through.
pub const MAX_BEAT_BANKS: usize = 2;

/// A named cue sample, or `Off` to keep a tick silent.
///
/// Each cue maps to a bundled sample file; resolving and playing the file is
/// the host's concern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TickCue {
    #[default]
    Off,
    HihatClosed,
    HihatAnalog,
    HihatDigital,
    Metro,
    Kick,
    KickTight,
    KickThump,
    Snare,
    Clap,
    ClapTape,
    Tambourine,
    Woodblock,
}

impl TickCue {
    /// Sample file the cue maps to. `None` for [`TickCue::Off`].
    pub fn file_name(&self) -> Option<&'static str> {
        match self {
            Self::Off => None,
            Self::HihatClosed => Some("tick-hihat.wav"),
            Self::HihatAnalog => Some("tick-hihat-analog.wav"),
            Self::HihatDigital => Some("tick-hihat-digital.wav"),
            Self::Metro => Some("tick-metro.wav"),
            Self::Kick => Some("kick-tight-classic.wav"),
            Self::KickTight => Some("kick-tight.wav"),
            Self::KickThump => Some("kick-thump.wav"),
            Self::Snare => Some("tick-snare.wav"),
            Self::Clap => Some("clap-high.wav"),
            Self::ClapTape => Some("clap-tape.wav"),
            Self::Tambourine => Some("tick-perc-tambo.wav"),
            Self::Woodblock => Some("tick-can.wav"),
        }
    }
}

impl fmt::Display for TickCue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Off => "off",
            Self::HihatClosed => "hihat closed",
            Self::HihatAnalog => "hihat analog",
            Self::HihatDigital => "hihat digital",
            Self::Metro => "metro",
            Self::Kick => "kick",
            Self::KickTight => "kick tight",
            Self::KickThump => "kick thump",
            Self::Snare => "snare",
            Self::Clap => "clap",
            Self::ClapTape => "clap tape",
            Self::Tambourine => "tambourine",
            Self::Woodblock => "woodblock",
        };
        f.write_str(label)
    }
}

/// Cue slots for every tick of both beat banks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CueAssignments {
    pub beat1: [TickCue; MAX_TICKS_PER_MEASURE],
    pub beat2: [TickCue; MAX_TICKS_PER_MEASURE],
}

impl Default for CueAssignments {
    fn default() -> Self {
        // Accented downbeat, hihats on the rest; second bank swaps the accent.
        let mut beat1 = [TickCue::HihatClosed; MAX_TICKS_PER_MEASURE];
        beat1[0] = TickCue::Metro;
        let mut beat2 = [TickCue::HihatClosed; MAX_TICKS_PER_MEASURE];
        beat2[0] = TickCue::Kick;
        Self { beat1, beat2 }
    }
}

impl CueAssignments {
    /// Slot bank for a beat number (1-based). Unknown banks fall back to the
    /// first one.
    pub fn bank(&self, beat: u8) -> &[TickCue; MAX_TICKS_PER_MEASURE] {
        match beat {
            2 => &self.beat2,
            _ => &self.beat1,
        }
    }
}

//! Application configuration.
//!
//! Stored through `confy` in the platform config directory. Out-of-range
//! values from hand-edited files are normalized on load rather than
//! rejected.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use cadence_types::{CueAssignments, MeasureSettings, TimingSettings};

pub const APP_NAME: &str = "cadence";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Play cues on ticks.
    pub audio_metronome: bool,

    /// Show the tick position in the host's display surface.
    pub visual_metronome: bool,

    pub timing: TimingSettings,
    pub measure: MeasureSettings,
    pub cues: CueAssignments,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            audio_metronome: true,
            visual_metronome: true,
            timing: TimingSettings::default(),
            measure: MeasureSettings::default(),
            cues: CueAssignments::default(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[source] confy::ConfyError),

    #[error("failed to save configuration: {0}")]
    Save(#[source] confy::ConfyError),
}

impl AppConfig {
    /// Load from the platform config directory, falling back to defaults for
    /// a missing file.
    pub fn load() -> Result<Self, ConfigError> {
        let config: Self = confy::load(APP_NAME, None).map_err(ConfigError::Load)?;
        Ok(config.normalized())
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        confy::store(APP_NAME, None, self).map_err(ConfigError::Save)
    }

    /// Clamp nested settings into their valid ranges.
    pub fn normalized(mut self) -> Self {
        self.timing = self.timing.normalized();
        self.measure = self.measure.normalized();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadence_types::TickCue;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert!(config.audio_metronome);
        assert!(config.visual_metronome);
        assert_eq!(config.timing.base_tick_interval_ms, 600);
        assert_eq!(config.measure.ticks_per_measure, 4);
    }

    #[test]
    fn test_toml_round_trip() {
        let mut config = AppConfig::default();
        config.audio_metronome = false;
        config.timing.tick_smoothing = true;
        config.cues.beat1[2] = TickCue::Woodblock;

        let serialized = toml::to_string(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&serialized).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_partial_toml_takes_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
audio_metronome = false

[timing]
base_tick_interval_ms = 500
"#,
        )
        .unwrap();
        assert!(!config.audio_metronome);
        assert!(config.visual_metronome);
        assert_eq!(config.timing.base_tick_interval_ms, 500);
        assert_eq!(config.timing.max_adjustment_ms, 10);
        assert_eq!(config.measure, MeasureSettings::default());
    }

    #[test]
    fn test_normalized_repairs_hand_edited_values() {
        let config: AppConfig = toml::from_str(
            r#"
[timing]
base_tick_interval_ms = 600
max_adjustment_ms = 9999

[measure]
ticks_per_measure = 40
"#,
        )
        .unwrap();
        let config = config.normalized();
        assert_eq!(config.timing.max_adjustment_ms, 599);
        assert_eq!(config.measure.ticks_per_measure, 8);
    }
}

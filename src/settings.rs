//! Game tuning
//!
//! Loaded from JSON; every section falls back to defaults so partial files
//! work.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};
use crate::sim::camera::CameraSettings;
use crate::sim::layout::LayoutSettings;
use crate::sim::obstacle::ObstacleSettings;
use crate::sim::player::PlayerSettings;
use crate::sim::track::TrackSettings;

/// Difficulty presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum DifficultyPreset {
    Easy,
    #[default]
    Normal,
    Hard,
}

impl DifficultyPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            DifficultyPreset::Easy => "Easy",
            DifficultyPreset::Normal => "Normal",
            DifficultyPreset::Hard => "Hard",
        }
    }

    pub fn from_name(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "easy" => Some(DifficultyPreset::Easy),
            "normal" | "norm" => Some(DifficultyPreset::Normal),
            "hard" => Some(DifficultyPreset::Hard),
            _ => None,
        }
    }

    /// Obstacles per segment at score 0
    pub fn base_count(&self) -> u32 {
        match self {
            DifficultyPreset::Easy => 0,
            DifficultyPreset::Normal => 1,
            DifficultyPreset::Hard => 1,
        }
    }

    /// Score per extra obstacle
    pub fn step_seconds(&self) -> f32 {
        match self {
            DifficultyPreset::Easy => 30.0,
            DifficultyPreset::Normal => 20.0,
            DifficultyPreset::Hard => 10.0,
        }
    }

    /// Player descent speed
    pub fn descent_speed(&self) -> f32 {
        match self {
            DifficultyPreset::Easy => 1.5,
            DifficultyPreset::Normal => 2.0,
            DifficultyPreset::Hard => 3.0,
        }
    }
}

/// Score accrual and run end conditions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreSettings {
    /// Points per second while playing
    pub score_rate: f32,
    /// Crossing below this Y clears the run
    pub finish_line_y: Option<f32>,
    /// Leaving the camera view ends the run
    pub offscreen_is_fatal: bool,
}

impl Default for ScoreSettings {
    fn default() -> Self {
        Self {
            score_rate: 1.0,
            finish_line_y: None,
            offscreen_is_fatal: true,
        }
    }
}

/// All simulation tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    /// Label of the preset last applied. Informational only: loading it from
    /// JSON does not retune anything, use `apply_preset` for that.
    pub difficulty: DifficultyPreset,
    pub track: TrackSettings,
    pub layout: LayoutSettings,
    pub obstacles: ObstacleSettings,
    pub player: PlayerSettings,
    pub camera: CameraSettings,
    pub score: ScoreSettings,
}

impl Settings {
    /// Defaults tuned for a difficulty preset
    pub fn from_preset(preset: DifficultyPreset) -> Self {
        let mut settings = Self::default();
        settings.apply_preset(preset);
        settings
    }

    /// Apply a difficulty preset (updates difficulty-dependent values)
    pub fn apply_preset(&mut self, preset: DifficultyPreset) {
        self.difficulty = preset;
        self.layout.base_count = preset.base_count();
        self.layout.step_seconds = preset.step_seconds();
        self.player.descent_speed = preset.descent_speed();
    }

    /// Parse settings from a JSON string and validate them
    pub fn from_json(json: &str) -> SimResult<Self> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a JSON file
    pub fn load(path: impl AsRef<Path>) -> SimResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let settings = Self::from_json(&json)?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    pub fn to_json(&self) -> SimResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject values the simulation cannot run with
    pub fn validate(&self) -> SimResult<()> {
        self.track.validate()?;
        self.layout.validate()?;
        self.obstacles.validate()?;
        self.player.validate()?;
        self.camera.validate()?;
        if !self.score.score_rate.is_finite() || self.score.score_rate < 0.0 {
            return Err(SimError::config(format!(
                "score_rate must be a non-negative number, got {}",
                self.score.score_rate
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        Settings::default().validate().unwrap();
        for preset in [DifficultyPreset::Easy, DifficultyPreset::Normal, DifficultyPreset::Hard] {
            Settings::from_preset(preset).validate().unwrap();
        }
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let settings = Settings::from_json(r#"{ "layout": { "lanes": [-1.5, 1.5] }, "score": { "score_rate": 2.0 } }"#)
            .unwrap();
        assert_eq!(settings.layout.lanes, vec![-1.5, 1.5]);
        assert_eq!(settings.layout.step_seconds, 20.0);
        assert_eq!(settings.score.score_rate, 2.0);
        assert_eq!(settings.track, TrackSettings::default());
    }

    #[test]
    fn test_json_round_trip() {
        let settings = Settings::from_preset(DifficultyPreset::Hard);
        let json = settings.to_json().unwrap();
        assert_eq!(Settings::from_json(&json).unwrap(), settings);
    }

    #[test]
    fn test_invalid_settings_rejected() {
        assert!(matches!(
            Settings::from_json(r#"{ "layout": { "lanes": [] } }"#),
            Err(SimError::InvalidConfiguration(_))
        ));
        assert!(matches!(
            Settings::from_json(r#"{ "obstacles": { "templates": [] } }"#),
            Err(SimError::InvalidConfiguration(_))
        ));
        assert!(matches!(
            Settings::from_json(r#"{ "track": { "segments": [] } }"#),
            Err(SimError::InvalidConfiguration(_))
        ));
        assert!(matches!(Settings::from_json("{ nope"), Err(SimError::Settings(_))));
    }

    #[test]
    fn test_preset_names() {
        assert_eq!(DifficultyPreset::from_name("HARD"), Some(DifficultyPreset::Hard));
        assert_eq!(DifficultyPreset::from_name("med"), None);
        assert_eq!(DifficultyPreset::Easy.as_str(), "Easy");
    }

    #[test]
    fn test_difficulty_label_does_not_retune() {
        let settings = Settings::from_json(r#"{ "difficulty": "Hard" }"#).unwrap();
        assert_eq!(settings.difficulty, DifficultyPreset::Hard);
        assert_eq!(settings.layout.step_seconds, LayoutSettings::default().step_seconds);

        let mut settings = settings;
        settings.apply_preset(settings.difficulty);
        assert_eq!(settings.layout.step_seconds, DifficultyPreset::Hard.step_seconds());
    }
}

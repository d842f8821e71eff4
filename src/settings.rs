//! Game settings and preferences
//!
//! Persisted separately from high scores as a small JSON file.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::sim::state::AUTOPLAY_INTERVAL_MS;
use crate::storage::{self, StorageError};

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Audio ===
    /// Emit sound cues
    pub sound_enabled: bool,

    // === Visual Effects ===
    /// Camera shake on pops and losses
    pub screen_shake: bool,

    // === Accessibility ===
    /// Reduced motion (suppresses shake)
    pub reduced_motion: bool,

    // === Run ===
    /// Fixed run seed; a fresh one is picked per run when unset
    pub seed: Option<u64>,
    /// Demo mode tap cadence
    pub autoplay_tap_interval_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            sound_enabled: true,
            screen_shake: true,
            reduced_motion: false,
            seed: None,
            autoplay_tap_interval_ms: AUTOPLAY_INTERVAL_MS,
        }
    }
}

impl Settings {
    /// Effective screen shake (respects reduced_motion)
    pub fn effective_screen_shake(&self) -> bool {
        self.screen_shake && !self.reduced_motion
    }

    /// Load settings, falling back to defaults if the file is missing or bad
    pub fn load(path: &Path) -> Self {
        match storage::read_json(path) {
            Ok(settings) => {
                log::info!("Loaded settings from {}", path.display());
                settings
            }
            Err(StorageError::Io { .. }) => {
                log::info!("Using default settings");
                Self::default()
            }
            Err(e) => {
                log::warn!("{}; using default settings", e);
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), StorageError> {
        storage::write_json(path, self)?;
        log::info!("Settings saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reduced_motion_disables_shake() {
        let mut settings = Settings::default();
        assert!(settings.effective_screen_shake());
        settings.reduced_motion = true;
        assert!(!settings.effective_screen_shake());
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let settings: Settings = serde_json::from_str(r#"{"sound_enabled": false, "seed": 9}"#).unwrap();
        assert!(!settings.sound_enabled);
        assert_eq!(settings.seed, Some(9));
        assert!(settings.screen_shake);
        assert_eq!(settings.autoplay_tap_interval_ms, AUTOPLAY_INTERVAL_MS);
    }

    #[test]
    fn test_load_missing_or_corrupt_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        assert_eq!(Settings::load(&path), Settings::default());

        std::fs::write(&path, "[1, 2").unwrap();
        assert_eq!(Settings::load(&path), Settings::default());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let settings = Settings {
            reduced_motion: true,
            seed: Some(1234),
            ..Settings::default()
        };
        settings.save(&path).unwrap();
        assert_eq!(Settings::load(&path), settings);
    }
}

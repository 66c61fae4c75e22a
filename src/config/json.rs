use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::timing::Second;

use super::SqueezeSettings;

const MAX_PERCENT: i64 = 100;
const MAX_MS: i64 = 999_999_999;
const MAX_VIDEO_LAG_MS: i64 = 200;
const MIN_VIDEO_LAG_MS: i64 = -200;

/// User settings persisted as `settings.json`. Percentages are integers in
/// [0, 100], the whammy knobs are milliseconds, and out-of-range or missing
/// values fall back to the defaults on load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JsonSettings {
    pub squeeze: i64,
    pub early_whammy: i64,
    pub lazy_whammy: i64,
    pub whammy_delay: i64,
    pub video_lag: i64,
    pub lefty_flip: bool,
}

impl Default for JsonSettings {
    fn default() -> Self {
        Self {
            squeeze: MAX_PERCENT,
            early_whammy: MAX_PERCENT,
            lazy_whammy: 0,
            whammy_delay: 0,
            video_lag: 0,
            lefty_flip: false,
        }
    }
}

impl JsonSettings {
    /// Load settings from `settings.json` under the given application
    /// directory, substituting defaults for anything missing, malformed, or
    /// out of range.
    pub fn load(application_dir: &Path) -> Self {
        let path = settings_path(application_dir);
        let Ok(content) = fs::read_to_string(&path) else {
            return Self::default();
        };
        match serde_json::from_str::<Self>(&content) {
            Ok(settings) => settings.clamped(),
            Err(e) => {
                debug!("ignoring malformed {}: {e}", path.display());
                Self::default()
            }
        }
    }

    /// Save settings under the given application directory.
    pub fn save(&self, application_dir: &Path) -> Result<()> {
        fs::create_dir_all(application_dir)?;
        let content = serde_json::to_string_pretty(self)?;
        fs::write(settings_path(application_dir), content)?;
        Ok(())
    }

    /// The per-user application directory, falling back to the working
    /// directory when the platform offers none.
    pub fn application_dir() -> PathBuf {
        match ProjectDirs::from("com", "chartopt", "chartopt") {
            Some(dirs) => dirs.config_dir().to_path_buf(),
            None => PathBuf::from("."),
        }
    }

    /// Convert to the core's squeeze settings: percentages become
    /// fractions, milliseconds become seconds.
    pub fn to_squeeze_settings(&self) -> SqueezeSettings {
        SqueezeSettings {
            squeeze: self.squeeze as f64 / 100.0,
            early_whammy: self.early_whammy as f64 / 100.0,
            lazy_whammy: Second(self.lazy_whammy as f64 / 1000.0),
            whammy_delay: Second(self.whammy_delay as f64 / 1000.0),
            video_lag: Second(self.video_lag as f64 / 1000.0),
        }
    }

    fn clamped(self) -> Self {
        let defaults = Self::default();
        Self {
            squeeze: in_range(self.squeeze, 0, MAX_PERCENT, defaults.squeeze),
            early_whammy: in_range(self.early_whammy, 0, MAX_PERCENT, defaults.early_whammy),
            lazy_whammy: in_range(self.lazy_whammy, 0, MAX_MS, defaults.lazy_whammy),
            whammy_delay: in_range(self.whammy_delay, 0, MAX_MS, defaults.whammy_delay),
            video_lag: in_range(
                self.video_lag,
                MIN_VIDEO_LAG_MS,
                MAX_VIDEO_LAG_MS,
                defaults.video_lag,
            ),
            lefty_flip: self.lefty_flip,
        }
    }
}

fn settings_path(application_dir: &Path) -> PathBuf {
    application_dir.join("settings.json")
}

fn in_range(value: i64, min: i64, max: i64, default: i64) -> i64 {
    if (min..=max).contains(&value) {
        value
    } else {
        default
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = JsonSettings::load(dir.path());
        assert_eq!(settings, JsonSettings::default());
    }

    #[test]
    fn out_of_range_values_fall_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("settings.json"),
            r#"{"squeeze": 150, "video_lag": -500, "lazy_whammy": 20}"#,
        )
        .unwrap();

        let settings = JsonSettings::load(dir.path());
        assert_eq!(settings.squeeze, 100);
        assert_eq!(settings.video_lag, 0);
        assert_eq!(settings.lazy_whammy, 20);
    }

    #[test]
    fn save_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let settings = JsonSettings {
            squeeze: 55,
            early_whammy: 80,
            lazy_whammy: 120,
            whammy_delay: 10,
            video_lag: -40,
            lefty_flip: true,
        };
        settings.save(dir.path()).unwrap();
        assert_eq!(JsonSettings::load(dir.path()), settings);
    }

    #[test]
    fn converts_to_squeeze_settings() {
        let settings = JsonSettings {
            squeeze: 50,
            early_whammy: 100,
            lazy_whammy: 250,
            whammy_delay: 0,
            video_lag: -40,
            lefty_flip: false,
        };
        let squeeze = settings.to_squeeze_settings();
        assert!((squeeze.squeeze - 0.5).abs() < 1e-9);
        assert!((squeeze.lazy_whammy.value() - 0.25).abs() < 1e-9);
        assert!((squeeze.video_lag.value() + 0.04).abs() < 1e-9);
    }
}

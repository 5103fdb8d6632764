use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::AppError;

/// Prefix for environment overrides, e.g. `GLITCHWATCH_DETECTORS__FREEZE__FRAMES=2`.
pub const ENV_PREFIX: &str = "GLITCHWATCH";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub fps: u32,
    pub frame_queue_size: usize,
    pub event_queue_size: usize,
    pub logging: LoggingSettings,
    pub detectors: DetectorSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            fps: 5,
            frame_queue_size: 64,
            event_queue_size: 64,
            logging: LoggingSettings::default(),
            detectors: DetectorSettings::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Filter directive used when `RUST_LOG` is not set.
    pub level: String,
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// Which detectors run, in what order, and with which thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorSettings {
    pub order: Vec<String>,
    pub blank: BlankSettings,
    pub freeze: FreezeSettings,
    pub flicker: FlickerSettings,
}

impl Default for DetectorSettings {
    fn default() -> Self {
        Self {
            order: vec!["blank".into(), "freeze".into(), "flicker".into()],
            blank: BlankSettings::default(),
            freeze: FreezeSettings::default(),
            flicker: FlickerSettings::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BlankSettings {
    pub luma_thresh: u8,
    pub sat_thresh: u8,
    pub pct: f64,
    pub frames: u32,
}

impl Default for BlankSettings {
    fn default() -> Self {
        Self {
            luma_thresh: 10,
            sat_thresh: 15,
            pct: 0.95,
            frames: 3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FreezeSettings {
    pub mad: f64,
    pub frames: u32,
}

impl Default for FreezeSettings {
    fn default() -> Self {
        Self {
            mad: 1.0,
            frames: 3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FlickerSettings {
    pub window: usize,
    pub ratio_thresh: f64,
}

impl Default for FlickerSettings {
    fn default() -> Self {
        Self {
            window: 8,
            ratio_thresh: 0.6,
        }
    }
}

impl Settings {
    /// Load settings from defaults, an optional file and the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self, AppError> {
        Self::load_with_env(path, environment())
    }

    pub(crate) fn load_with_env(
        path: Option<&Path>,
        env: config::Environment,
    ) -> Result<Self, AppError> {
        let mut builder =
            config::Config::builder().add_source(config::Config::try_from(&Settings::default())?);

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        let settings = builder.add_source(env).build()?.try_deserialize()?;
        Ok(settings)
    }
}

fn environment() -> config::Environment {
    config::Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
        .list_separator(",")
        .with_list_parse_key("detectors.order")
        .try_parsing(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env_from(pairs: &[(&str, &str)]) -> config::Environment {
        let vars = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        environment().source(Some(vars))
    }

    #[test]
    fn defaults_match_documented_thresholds() {
        let settings = Settings::load_with_env(None, env_from(&[])).unwrap();
        assert_eq!(settings.detectors.order, vec!["blank", "freeze", "flicker"]);
        assert_eq!(settings.detectors.blank.luma_thresh, 10);
        assert_eq!(settings.detectors.blank.sat_thresh, 15);
        assert_eq!(settings.detectors.blank.pct, 0.95);
        assert_eq!(settings.detectors.blank.frames, 3);
        assert_eq!(settings.detectors.freeze.mad, 1.0);
        assert_eq!(settings.detectors.freeze.frames, 3);
        assert_eq!(settings.detectors.flicker.window, 8);
        assert_eq!(settings.detectors.flicker.ratio_thresh, 0.6);
        assert_eq!(settings.fps, 5);
    }

    #[test]
    fn yaml_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.yaml");
        std::fs::write(
            &path,
            "fps: 24\ndetectors:\n  order: [flicker, blank]\n  freeze:\n    mad: 2.5\n",
        )
        .unwrap();

        let settings = Settings::load_with_env(Some(&path), env_from(&[])).unwrap();
        assert_eq!(settings.fps, 24);
        assert_eq!(settings.detectors.order, vec!["flicker", "blank"]);
        assert_eq!(settings.detectors.freeze.mad, 2.5);
        assert_eq!(settings.detectors.freeze.frames, 3);
    }

    #[test]
    fn environment_overrides_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.yaml");
        std::fs::write(&path, "detectors:\n  freeze:\n    frames: 5\n").unwrap();

        let settings = Settings::load_with_env(
            Some(&path),
            env_from(&[
                ("GLITCHWATCH_DETECTORS__FREEZE__FRAMES", "2"),
                ("GLITCHWATCH_DETECTORS__BLANK__LUMA_THRESH", "20"),
                ("GLITCHWATCH_DETECTORS__ORDER", "freeze,flicker"),
            ]),
        )
        .unwrap();
        assert_eq!(settings.detectors.freeze.frames, 2);
        assert_eq!(settings.detectors.blank.luma_thresh, 20);
        assert_eq!(settings.detectors.order, vec!["freeze", "flicker"]);
    }

    #[test]
    fn missing_file_is_an_error() {
        let result = Settings::load_with_env(
            Some(Path::new("/nonexistent/glitchwatch.yaml")),
            env_from(&[]),
        );
        assert!(matches!(result, Err(AppError::Config(_))));
    }
}

//! Code for loading program settings.
use crate::input::read_toml;
use crate::log::DEFAULT_LOG_LEVEL;
use anyhow::{Result, ensure};
use serde::Deserialize;
use std::path::Path;

/// The name of the optional settings file in a model directory
pub const SETTINGS_FILE_NAME: &str = "settings.toml";

/// Default log level for program
fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

/// Program settings from config file
#[derive(Debug, Deserialize, PartialEq)]
pub struct Settings {
    /// The default program log level
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Time limit for the solver in seconds
    #[serde(default)]
    pub time_limit: Option<f64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            time_limit: None,
        }
    }
}

impl Settings {
    /// Read the settings file from a model directory.
    ///
    /// If the file is not present, default values for settings will be used
    pub fn load<P: AsRef<Path>>(model_dir: P) -> Result<Settings> {
        Self::load_from_path(&model_dir.as_ref().join(SETTINGS_FILE_NAME))
    }

    fn load_from_path(file_path: &Path) -> Result<Settings> {
        if !file_path.is_file() {
            return Ok(Settings::default());
        }

        let settings: Settings = read_toml(file_path)?;
        if let Some(time_limit) = settings.time_limit {
            ensure!(
                time_limit > 0.0,
                "Solver time limit must be positive, got {time_limit}"
            );
        }

        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::assert_error;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_settings_load_no_file() {
        let dir = tempdir().unwrap();
        assert_eq!(Settings::load(dir.path()).unwrap(), Settings::default());
    }

    #[test]
    fn test_settings_load() {
        let dir = tempdir().unwrap();
        {
            let mut file = File::create(dir.path().join(SETTINGS_FILE_NAME)).unwrap();
            writeln!(file, "log_level = \"warn\"\ntime_limit = 60.0").unwrap();
        }

        assert_eq!(
            Settings::load(dir.path()).unwrap(),
            Settings {
                log_level: "warn".to_string(),
                time_limit: Some(60.0),
            }
        );
    }

    #[test]
    fn test_settings_load_bad_time_limit() {
        let dir = tempdir().unwrap();
        {
            let mut file = File::create(dir.path().join(SETTINGS_FILE_NAME)).unwrap();
            writeln!(file, "time_limit = 0.0").unwrap();
        }

        assert_error!(
            Settings::load(dir.path()),
            "Solver time limit must be positive, got 0"
        );
    }
}

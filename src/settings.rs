use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

pub const DEFAULT_FORMAT: &str = "%d";
pub const DEFAULT_START: f64 = 0.0;
pub const DEFAULT_STEP: f64 = 1.0;

/// Template plus sequence parameters for one insertion pass.
#[derive(Debug, Clone, PartialEq)]
pub struct InsertionSettings {
    pub format_template: String,
    pub start: f64,
    pub step: f64,
}

impl Default for InsertionSettings {
    fn default() -> Self {
        Self {
            format_template: DEFAULT_FORMAT.to_string(),
            start: DEFAULT_START,
            step: DEFAULT_STEP,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Contents of a settings file:
///
/// ```toml
/// [insertnum]
/// formatstr = "%03d"
/// start = 1
/// step = 1
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub insertnum: SequenceConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SequenceConfig {
    pub formatstr: Option<String>,
    pub start: Option<f64>,
    pub step: Option<f64>,
}

impl Config {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Resolve to concrete settings. Only absent keys fall back to the defaults;
    /// `start = 0` or an empty `formatstr` are taken as written.
    pub fn settings(&self) -> InsertionSettings {
        let section = &self.insertnum;
        InsertionSettings {
            format_template: section
                .formatstr
                .clone()
                .unwrap_or_else(|| DEFAULT_FORMAT.to_string()),
            start: section.start.unwrap_or(DEFAULT_START),
            step: section.step.unwrap_or(DEFAULT_STEP),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let cfg = Config::from_toml_str("").unwrap();
        assert_eq!(cfg.settings(), InsertionSettings::default());
    }

    #[test]
    fn explicit_zero_values_are_kept() {
        let cfg = Config::from_toml_str("[insertnum]\nstart = 0\nstep = 0\n").unwrap();
        let s = cfg.settings();
        assert_eq!(s.start, 0.0);
        assert_eq!(s.step, 0.0);
        assert_eq!(s.format_template, "%d");
    }

    #[test]
    fn integer_and_float_values_parse() {
        let cfg = Config::from_toml_str("[insertnum]\nformatstr = \"%.1f\"\nstart = 5\nstep = 0.5\n").unwrap();
        assert_eq!(
            cfg.settings(),
            InsertionSettings {
                format_template: "%.1f".to_string(),
                start: 5.0,
                step: 0.5,
            }
        );
    }

    #[test]
    fn malformed_config_is_an_error() {
        let err = Config::from_toml_str("[insertnum]\nstart = \"one\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = Config::load(Path::new("/nonexistent/insertnum.toml")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/insertnum.toml"));
    }
}

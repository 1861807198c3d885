//! `fragrate.toml`:
//!
//! ```toml
//! [weights]
//! kd = 0.3
//! headshot_pct = 0.2
//! adr = 0.2
//! multikill = 0.1
//! clutch = 0.2
//!
//! [analysis]
//! multikill_window = 192
//! ```
//!
//! Both tables are optional. A `[weights]` table has to name all five weights.

use std::path::Path;

use analysis::rating::RatingConfig;
use analysis::Settings;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Read(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid weights: {0}")]
    Weights(#[from] analysis::rating::ConfigError),
}

#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    #[serde(default)]
    pub weights: Option<RatingConfig>,
    #[serde(default)]
    pub analysis: Settings,
}

impl FileConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    pub fn parse(contents: &str) -> Result<Self, ConfigError> {
        let config: FileConfig = toml::from_str(contents)?;
        if let Some(weights) = config.weights.as_ref() {
            weights.effective_weights()?;
        }
        Ok(config)
    }

    /// Weights from `--weights` win over the file, the file over the defaults.
    pub fn rating(&self, weights: Option<&str>) -> Result<RatingConfig, ConfigError> {
        let config = match weights {
            Some(list) => list.parse::<RatingConfig>()?,
            None => self.weights.clone().unwrap_or_default(),
        };
        config.effective_weights()?;
        Ok(config)
    }
}

/// Reads the file when one was given, the defaults otherwise.
pub fn load(path: Option<&Path>) -> Result<FileConfig, ConfigError> {
    match path {
        Some(path) => FileConfig::from_file(path),
        None => Ok(FileConfig::default()),
    }
}

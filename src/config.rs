use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use super::error::ConfigError;
use super::frequency::Frequency;
use super::gap_filler::FillValue;
use super::loader::SourceConfig;

/// Settings for filling timegaps in the primary series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GapFillConfig {
    pub threshold_seconds: f64,
    pub frequency: Frequency,
    #[serde(default)]
    pub fill_value: FillValue,
    /// Scan position column to continue cyclically across filled gaps
    #[serde(default)]
    pub cyclic_column: Option<String>,
}

impl Default for GapFillConfig {
    fn default() -> Self {
        Self {
            threshold_seconds: 30.0,
            frequency: Frequency::default(),
            fill_value: FillValue::Missing,
            cyclic_column: None,
        }
    }
}

/// A secondary series and the columns to interpolate from it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecondaryConfig {
    pub source: SourceConfig,
    pub columns: Vec<String>,
    #[serde(default)]
    pub floor: Vec<String>,
}

/// Structure representing a merge pipeline. Serializable and deserializable to YAML using
/// serde and serde_yaml
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub primary: SourceConfig,
    #[serde(default)]
    pub gap_fill: Option<GapFillConfig>,
    #[serde(default)]
    pub secondaries: Vec<SecondaryConfig>,
    pub output: PathBuf,
    /// Name of an extra column holding seconds since the first primary timestamp
    #[serde(default)]
    pub elapsed_column: Option<String>,
}

impl Default for Config {
    /// Template configuration; the paths are placeholders
    fn default() -> Self {
        Self {
            primary: SourceConfig {
                timestamp_column: String::from("XRDTimeStamp"),
                ..SourceConfig::default()
            },
            gap_fill: Some(GapFillConfig::default()),
            secondaries: vec![SecondaryConfig {
                source: SourceConfig {
                    timestamp_column: String::from("HistoricalTimeString"),
                    timestamp_format: String::from("%d-%m-%y %H:%M:%S"),
                    ..SourceConfig::default()
                },
                columns: vec![String::from("Temperature")],
                floor: vec![],
            }],
            output: PathBuf::from("None"),
            elapsed_column: None,
        }
    }
}

impl Config {
    /// Read the configuration in a YAML file
    /// Returns a Config if successful
    pub fn read_config_file(config_path: &Path) -> Result<Self, ConfigError> {
        if !config_path.exists() {
            return Err(ConfigError::BadFilePath(config_path.to_path_buf()));
        }

        let yaml_str = std::fs::read_to_string(config_path)?;
        let config = serde_yaml::from_str::<Self>(&yaml_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Write the template configuration to a YAML file
    pub fn write_template(path: &Path) -> Result<(), ConfigError> {
        let yaml_str = serde_yaml::to_string(&Self::default())?;
        std::fs::write(path, yaml_str)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(gap_fill) = &self.gap_fill {
            if !(gap_fill.threshold_seconds.is_finite() && gap_fill.threshold_seconds > 0.0) {
                return Err(ConfigError::Invalid(format!(
                    "gap_fill.threshold_seconds must be positive; got {}",
                    gap_fill.threshold_seconds
                )));
            }
        }

        let sources =
            std::iter::once(&self.primary).chain(self.secondaries.iter().map(|s| &s.source));
        for source in sources {
            if source.every_nth == Some(0) {
                return Err(ConfigError::Invalid(format!(
                    "every_nth for {} must be at least 1",
                    source.path.to_string_lossy()
                )));
            }
        }

        for secondary in &self.secondaries {
            let path = secondary.source.path.to_string_lossy();
            if secondary.columns.is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "secondary {path} has no columns to merge"
                )));
            }
            let columns: HashSet<&String> = secondary.columns.iter().collect();
            if let Some(extra) = secondary.floor.iter().find(|f| !columns.contains(f)) {
                return Err(ConfigError::Invalid(format!(
                    "secondary {path} floors column {extra:?}, which it does not merge"
                )));
            }
        }
        Ok(())
    }
}

//! Dashboard configuration, loaded from a TOML file and overridden by
//! command-line flags.

use crate::error::{DashboardError, Result};
use log::debug;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "dashboard.toml";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Directory scanned for utilization and demand CSV files
    pub data_dir: PathBuf,

    /// Directory overall-view exports are written to
    pub output_dir: PathBuf,

    /// Decimal places used when displaying quantities and percentages
    pub decimals: usize,

    /// Write CSV/JSON exports for overall views
    pub export: bool,

    /// Width in characters of the longest bar in monthly charts
    pub chart_width: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            output_dir: PathBuf::from("reports"),
            decimals: 2,
            export: true,
            chart_width: 40,
        }
    }
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            DashboardError::Config(format!(
                "Could not read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        let config: Config = toml::from_str(&content).map_err(|e| {
            DashboardError::Config(format!(
                "Invalid TOML in config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Explicit path must exist; without one, `dashboard.toml` is used when
    /// present and defaults otherwise.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::load_from_file(path),
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if default_path.is_file() {
                    debug!("Using config file {}", default_path.display());
                    Self::load_from_file(default_path)
                } else {
                    debug!("No config file found, using defaults");
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.decimals > 6 {
            return Err(DashboardError::Config(format!(
                "decimals must be between 0 and 6, got {}",
                self.decimals
            )));
        }
        if self.chart_width == 0 || self.chart_width > 200 {
            return Err(DashboardError::Config(format!(
                "chart_width must be between 1 and 200, got {}",
                self.chart_width
            )));
        }
        Ok(())
    }
}

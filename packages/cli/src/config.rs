//! TOML configuration file and command-line overrides.

use std::path::{Path, PathBuf};

use bike_map_ingest::neighborhoods::NeighborhoodFieldMapping;
use bike_map_station_models::{Orientation, RiderType, Statistic};
use bike_map_summarize::{SummarizeConfig, TripWindow};
use chrono::NaiveDate;
use clap::Args;
use serde::Deserialize;
use thiserror::Error;

/// Errors that can occur while loading the configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("Failed to read config {path}: {source}")]
    Io {
        /// Config path.
        path: String,
        /// Underlying error.
        source: std::io::Error,
    },

    /// The file is not valid TOML for [`ConfigFile`].
    #[error("Invalid config {path}: {source}")]
    Toml {
        /// Config path.
        path: String,
        /// Underlying error.
        source: toml::de::Error,
    },
}

/// Contents of a `bike_map.toml` file. Every key is optional.
///
/// ```toml
/// [summarize]
/// orientation = "start"
/// statistic = "mean"
/// zero_fill_rankings = true
/// window = { start = "2022-09-01", end = "2022-09-30" }
///
/// [neighborhood_fields]
/// code = "nta2020"
/// borough = "boroname"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    /// Run options.
    pub summarize: SummarizeConfig,
    /// Boundary property names.
    pub neighborhood_fields: NeighborhoodFieldMapping,
}

impl ConfigFile {
    /// Loads `path`, or returns defaults when no path is given.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or parsed.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config = toml::from_str(&raw).map_err(|source| ConfigError::Toml {
            path: path.display().to_string(),
            source,
        })?;

        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }
}

/// Run options shared by every command that aggregates trips.
#[derive(Debug, Clone, Default, Args)]
pub struct RunOptions {
    /// TOML configuration file; flags below override its values
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Which end of each trip is profiled
    #[arg(long)]
    pub orientation: Option<Orientation>,

    /// How hourly buckets are collapsed across dates
    #[arg(long)]
    pub statistic: Option<Statistic>,

    /// First trip date included (YYYY-MM-DD)
    #[arg(long, requires = "end_date")]
    pub start_date: Option<NaiveDate>,

    /// Last trip date included (YYYY-MM-DD)
    #[arg(long, requires = "start_date")]
    pub end_date: Option<NaiveDate>,

    /// Only count trips by this rider category
    #[arg(long)]
    pub rider_type: Option<RiderType>,
}

impl RunOptions {
    /// Loads the config file and applies the flags on top of it.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the config file cannot be loaded.
    pub fn resolve(&self) -> Result<ConfigFile, ConfigError> {
        let mut file = ConfigFile::load(self.config.as_deref())?;
        self.apply(&mut file.summarize);
        Ok(file)
    }

    fn apply(&self, config: &mut SummarizeConfig) {
        if let Some(orientation) = self.orientation {
            config.orientation = orientation;
        }
        if let Some(statistic) = self.statistic {
            config.statistic = statistic;
        }
        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            config.window = Some(TripWindow { start, end });
        }
        if let Some(rider_type) = self.rider_type {
            config.rider_type = Some(rider_type);
        }
    }
}

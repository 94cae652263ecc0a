//! Configuration management for `GeoAssist`
//!
//! Handles loading configuration from files, environment variables,
//! and provides validation for all configuration settings.

use crate::GeoAssistError;
use crate::models::region::lookup_state;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure for `GeoAssist`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeoAssistConfig {
    /// Dataset file locations
    #[serde(default)]
    pub datasets: DatasetConfig,
    /// Risk analysis parameters
    #[serde(default)]
    pub risk: RiskConfig,
    /// Region cache configuration
    #[serde(default)]
    pub cache: CacheConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// GeoJSON files backing the static dataset store; unset means empty
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatasetConfig {
    pub states_path: Option<PathBuf>,
    pub counties_path: Option<PathBuf>,
    pub forecast_path: Option<PathBuf>,
    pub power_lines_path: Option<PathBuf>,
    pub oil_wells_path: Option<PathBuf>,
}

/// Risk analysis settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskConfig {
    /// Blow-down buffer around each power line segment in metres
    #[serde(default = "default_corridor_buffer")]
    pub corridor_buffer_m: f64,
    /// Half edge of the square cell drawn around a forecast point, in degrees
    #[serde(default = "default_cell_half_size")]
    pub cell_half_size_deg: f64,
    /// Wind risk horizon when the action does not give one
    #[serde(default = "default_forecast_days")]
    pub default_forecast_days: u32,
    /// Upper bound for the wind risk horizon
    #[serde(default = "default_max_forecast_days")]
    pub max_forecast_days: u32,
    /// Only region with oil well coverage
    #[serde(default = "default_oil_well_region")]
    pub oil_well_region: String,
}

/// Region cache settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Region cache TTL in seconds; 0 keeps entries until cleared
    #[serde(default)]
    pub region_ttl_seconds: u64,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (pretty or json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default value functions
fn default_corridor_buffer() -> f64 {
    500.0
}

fn default_cell_half_size() -> f64 {
    0.125
}

fn default_forecast_days() -> u32 {
    3
}

fn default_max_forecast_days() -> u32 {
    10
}

fn default_oil_well_region() -> String {
    "North Dakota".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            corridor_buffer_m: default_corridor_buffer(),
            cell_half_size_deg: default_cell_half_size(),
            default_forecast_days: default_forecast_days(),
            max_forecast_days: default_max_forecast_days(),
            oil_well_region: default_oil_well_region(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl RiskConfig {
    /// Resolve an action's horizon against the default and the maximum
    #[must_use]
    pub fn forecast_days(&self, requested: Option<u32>) -> u32 {
        requested
            .unwrap_or(self.default_forecast_days)
            .clamp(1, self.max_forecast_days.max(1))
    }
}

impl GeoAssistConfig {
    /// Load configuration from `geoassist.toml` and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path(None)
    }

    /// Load configuration from specified path
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        let config_file = config_path.unwrap_or_else(|| PathBuf::from("geoassist.toml"));

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // Environment overrides, e.g. GEOASSIST__RISK__CORRIDOR_BUFFER_M=250
        builder = builder.add_source(
            Environment::with_prefix("GEOASSIST")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: GeoAssistConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        // Apply defaults for missing values
        config.apply_defaults();

        // Validate configuration
        config.validate()?;

        Ok(config)
    }

    /// Apply default values to missing configuration fields
    pub fn apply_defaults(&mut self) {
        if self.risk.corridor_buffer_m == 0.0 {
            self.risk.corridor_buffer_m = default_corridor_buffer();
        }
        if self.risk.cell_half_size_deg == 0.0 {
            self.risk.cell_half_size_deg = default_cell_half_size();
        }
        if self.risk.default_forecast_days == 0 {
            self.risk.default_forecast_days = default_forecast_days();
        }
        if self.risk.max_forecast_days == 0 {
            self.risk.max_forecast_days = default_max_forecast_days();
        }
        if self.risk.oil_well_region.is_empty() {
            self.risk.oil_well_region = default_oil_well_region();
        }
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.logging.format.is_empty() {
            self.logging.format = default_log_format();
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        Ok(())
    }

    /// Validate numeric configuration ranges
    fn validate_numeric_ranges(&self) -> Result<()> {
        let risk = &self.risk;
        if !(risk.corridor_buffer_m > 0.0 && risk.corridor_buffer_m <= 50_000.0) {
            return Err(GeoAssistError::config(
                "Corridor buffer must be between 0 and 50000 metres",
            )
            .into());
        }

        if !(risk.cell_half_size_deg > 0.0 && risk.cell_half_size_deg <= 5.0) {
            return Err(GeoAssistError::config(
                "Forecast cell half size must be between 0 and 5 degrees",
            )
            .into());
        }

        if risk.max_forecast_days > 16 {
            return Err(GeoAssistError::config("Max forecast days cannot exceed 16").into());
        }

        if risk.default_forecast_days > risk.max_forecast_days {
            return Err(GeoAssistError::config(format!(
                "Default forecast days ({}) cannot exceed max forecast days ({})",
                risk.default_forecast_days, risk.max_forecast_days
            ))
            .into());
        }

        if self.cache.region_ttl_seconds > 7 * 24 * 3600 {
            return Err(GeoAssistError::config(
                "Region cache TTL cannot exceed 604800 seconds (1 week)",
            )
            .into());
        }

        Ok(())
    }

    /// Validate string configuration values
    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(GeoAssistError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(GeoAssistError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        if lookup_state(&self.risk.oil_well_region).is_none() {
            return Err(GeoAssistError::config(format!(
                "Oil well region '{}' is not a US state",
                self.risk.oil_well_region
            ))
            .into());
        }

        Ok(())
    }
}

//! Configuration management for the Fielder prediction service
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (config/development.toml, config/production.toml)
//! 3. Environment variable overrides with FIELDER_ prefix

use std::time::Duration;

use config::{ConfigError, Environment, File};
use fielder_engine::phenology::{ResolverSettings, DEFAULT_GRACE_DAYS, DEFAULT_SEASONAL_GDD};
use serde::Deserialize;

/// Open-Meteo serves at most this many forecast days
pub const MAX_FORECAST_DAYS: u32 = 16;

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    /// Weather provider configuration
    #[serde(default)]
    pub weather: WeatherConfig,

    /// Prediction tuning
    #[serde(default)]
    pub prediction: PredictionConfig,

    /// Research catalog location
    #[serde(default)]
    pub research: ResearchConfig,

    /// Log output
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct WeatherConfig {
    /// Open-Meteo archive endpoint
    pub historical_url: String,

    /// Open-Meteo forecast endpoint
    pub forecast_url: String,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,

    /// Forecast days requested
    pub forecast_days: u32,

    /// Years of archive averaged into climatology
    pub climatology_years: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PredictionConfig {
    /// Days past window end before a season rolls to the next
    pub next_season_grace_days: i64,

    /// Daily GDD assumed when weather is unavailable and no regional rate exists
    pub default_daily_gdd: f64,

    /// Daily GDD used to estimate development spans
    pub default_seasonal_gdd: f64,

    /// Year-to-year variance of harvest timing, when known
    #[serde(default)]
    pub historical_variance: Option<f64>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ResearchConfig {
    /// JSON catalog; absent means crop-level defaults everywhere
    #[serde(default)]
    pub catalog_path: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    /// Fallback filter when RUST_LOG is unset
    pub filter: String,

    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment =
            std::env::var("FIELDER_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let weather = WeatherConfig::default();
        let prediction = PredictionConfig::default();
        let logging = LoggingConfig::default();

        let config = config::Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("weather.historical_url", weather.historical_url)?
            .set_default("weather.forecast_url", weather.forecast_url)?
            .set_default("weather.timeout_secs", weather.timeout_secs as i64)?
            .set_default("weather.forecast_days", i64::from(weather.forecast_days))?
            .set_default(
                "weather.climatology_years",
                i64::from(weather.climatology_years),
            )?
            .set_default(
                "prediction.next_season_grace_days",
                prediction.next_season_grace_days,
            )?
            .set_default("prediction.default_daily_gdd", prediction.default_daily_gdd)?
            .set_default(
                "prediction.default_seasonal_gdd",
                prediction.default_seasonal_gdd,
            )?
            .set_default("logging.filter", logging.filter)?
            .set_default("logging.json", logging.json)?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (FIELDER_ prefix)
            .add_source(
                Environment::with_prefix("FIELDER")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            weather: WeatherConfig::default(),
            prediction: PredictionConfig::default(),
            research: ResearchConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl WeatherConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Requested forecast days, clamped to what the provider serves
    pub fn effective_forecast_days(&self) -> u32 {
        self.forecast_days.min(MAX_FORECAST_DAYS)
    }
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            historical_url: "https://archive-api.open-meteo.com/v1/archive".to_string(),
            forecast_url: "https://api.open-meteo.com/v1/forecast".to_string(),
            timeout_secs: 30,
            forecast_days: 14,
            climatology_years: 5,
        }
    }
}

impl PredictionConfig {
    pub fn resolver_settings(&self) -> ResolverSettings {
        ResolverSettings {
            grace_days: self.next_season_grace_days,
            default_seasonal_gdd: self.default_seasonal_gdd,
        }
    }
}

impl Default for PredictionConfig {
    fn default() -> Self {
        Self {
            next_season_grace_days: DEFAULT_GRACE_DAYS,
            default_daily_gdd: 20.0,
            default_seasonal_gdd: DEFAULT_SEASONAL_GDD,
            historical_variance: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "fielder_service=info,fielder_engine=info".to_string(),
            json: false,
        }
    }
}

//! Weather API client for fetching daily temperatures
//!
//! Integrates with Open-Meteo: the archive API for observed days and the
//! forecast API for the days ahead. Temperatures arrive in °C and are
//! returned in °F. Days with a missing temperature are dropped here, so the
//! accumulator only ever sees complete records.

use std::collections::HashMap;
use std::future::Future;

use chrono::{Datelike, NaiveDate, Utc};
use fielder_engine::climate::{default_for_latitude, CLIMATOLOGY_BASE_TEMP};
use fielder_engine::gdd::cumulative_gdd;
use fielder_engine::{celsius_to_fahrenheit, Climatology, Coordinates, DailyObservation, ForecastDay};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::{WeatherConfig, MAX_FORECAST_DAYS};
use crate::error::{AppError, AppResult};

/// A provider of observed, forecast and normal temperatures for a region
pub trait WeatherSource: Send + Sync {
    /// Provider name used in data-source annotations
    fn name(&self) -> &str;

    /// Observed days in `[start, end]`; gaps are omitted
    fn get_historical(
        &self,
        region_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> impl Future<Output = AppResult<Vec<DailyObservation>>> + Send;

    /// Forecast days starting today, with confidence falling by lead time
    fn get_forecast(
        &self,
        region_id: &str,
        days: u32,
    ) -> impl Future<Output = AppResult<Vec<ForecastDay>>> + Send;

    /// Monthly normals
    fn get_climatology(
        &self,
        region_id: &str,
        month: u32,
    ) -> impl Future<Output = AppResult<Climatology>> + Send;
}

/// Open-Meteo API client
#[derive(Clone)]
pub struct OpenMeteoClient {
    client: Client,
    historical_url: String,
    forecast_url: String,
    climatology_years: u32,
    regions: HashMap<String, Coordinates>,
}

/// Open-Meteo response envelope
#[derive(Debug, Deserialize)]
pub struct OpenMeteoResponse {
    #[serde(default)]
    pub daily: Option<OpenMeteoDaily>,
}

/// Column-oriented daily values; any entry may be null
#[derive(Debug, Deserialize, Default)]
pub struct OpenMeteoDaily {
    #[serde(default)]
    pub time: Vec<String>,
    #[serde(default)]
    pub temperature_2m_max: Vec<Option<f64>>,
    #[serde(default)]
    pub temperature_2m_min: Vec<Option<f64>>,
}

impl OpenMeteoClient {
    /// Create a client from configuration
    pub fn new(config: &WeatherConfig) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| AppError::Configuration(format!("HTTP client: {}", e)))?;

        Ok(Self {
            client,
            historical_url: config.historical_url.clone(),
            forecast_url: config.forecast_url.clone(),
            climatology_years: config.climatology_years,
            regions: HashMap::new(),
        })
    }

    /// Create a client against custom endpoints (for testing)
    pub fn with_base_urls(historical_url: String, forecast_url: String) -> AppResult<Self> {
        Self::new(&WeatherConfig {
            historical_url,
            forecast_url,
            ..WeatherConfig::default()
        })
    }

    pub fn with_region(mut self, region_id: impl Into<String>, coordinates: Coordinates) -> Self {
        self.regions.insert(region_id.into(), coordinates);
        self
    }

    pub fn with_regions<I>(mut self, regions: I) -> Self
    where
        I: IntoIterator<Item = (String, Coordinates)>,
    {
        self.regions.extend(regions);
        self
    }

    fn coordinates(&self, region_id: &str) -> AppResult<Coordinates> {
        self.regions
            .get(region_id)
            .copied()
            .ok_or_else(|| AppError::NotFound(format!("Coordinates for region {}", region_id)))
    }

    async fn fetch_daily(&self, url: &str, query: &[(&str, String)]) -> AppResult<OpenMeteoDaily> {
        let response = self.client.get(url).query(query).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalService(format!(
                "Open-Meteo error: {} - {}",
                status, body
            )));
        }

        let data: OpenMeteoResponse = response.json().await.map_err(|e| {
            AppError::ExternalService(format!("Failed to parse Open-Meteo response: {}", e))
        })?;

        Ok(data.daily.unwrap_or_default())
    }
}

impl WeatherSource for OpenMeteoClient {
    fn name(&self) -> &str {
        "Open-Meteo"
    }

    async fn get_historical(
        &self,
        region_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> AppResult<Vec<DailyObservation>> {
        let coordinates = self.coordinates(region_id)?;
        let query = [
            ("latitude", coordinates.latitude.to_string()),
            ("longitude", coordinates.longitude.to_string()),
            ("start_date", start.to_string()),
            ("end_date", end.to_string()),
            ("daily", "temperature_2m_max,temperature_2m_min".to_string()),
            ("temperature_unit", "celsius".to_string()),
            ("timezone", "auto".to_string()),
        ];

        let daily = self.fetch_daily(&self.historical_url, &query).await?;
        let observations = parse_observations(&daily);
        debug!(
            region_id,
            %start,
            %end,
            days = observations.len(),
            "Fetched historical weather"
        );
        Ok(observations)
    }

    async fn get_forecast(&self, region_id: &str, days: u32) -> AppResult<Vec<ForecastDay>> {
        let coordinates = self.coordinates(region_id)?;
        let query = [
            ("latitude", coordinates.latitude.to_string()),
            ("longitude", coordinates.longitude.to_string()),
            ("daily", "temperature_2m_max,temperature_2m_min".to_string()),
            ("temperature_unit", "celsius".to_string()),
            ("forecast_days", days.min(MAX_FORECAST_DAYS).to_string()),
            ("timezone", "auto".to_string()),
        ];

        let daily = self.fetch_daily(&self.forecast_url, &query).await?;
        Ok(parse_forecast(&daily))
    }

    async fn get_climatology(&self, region_id: &str, month: u32) -> AppResult<Climatology> {
        let coordinates = self.coordinates(region_id)?;
        let current_year = Utc::now().year();
        let first_year = current_year - self.climatology_years as i32;

        let mut observations = Vec::new();
        for year in first_year..current_year {
            let Some((start, end)) = month_bounds(year, month) else {
                continue;
            };
            match self.get_historical(region_id, start, end).await {
                Ok(days) => observations.extend(days),
                Err(e) => {
                    // Skip years with missing data
                    warn!(region_id, year, month, error = %e, "Climatology year unavailable");
                }
            }
        }

        Ok(climatology_from(month, &observations).unwrap_or_else(|| {
            debug!(region_id, month, "No archive data, using latitude defaults");
            default_for_latitude(coordinates.latitude, month)
        }))
    }
}

// ============================================================================
// Response Conversion
// ============================================================================

fn complete_rows(daily: &OpenMeteoDaily) -> impl Iterator<Item = (usize, DailyObservation)> + '_ {
    daily.time.iter().enumerate().filter_map(move |(i, day)| {
        let date = NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()?;
        let high = daily.temperature_2m_max.get(i).copied().flatten();
        let low = daily.temperature_2m_min.get(i).copied().flatten();
        let observation = DailyObservation::from_partial(
            date,
            high.map(celsius_to_fahrenheit),
            low.map(celsius_to_fahrenheit),
        )?;
        Some((i, observation))
    })
}

/// Observed days in °F, skipping nulls and unparseable dates
pub fn parse_observations(daily: &OpenMeteoDaily) -> Vec<DailyObservation> {
    complete_rows(daily).map(|(_, obs)| obs).collect()
}

/// Forecast days in °F; confidence is by lead time, counting skipped days
pub fn parse_forecast(daily: &OpenMeteoDaily) -> Vec<ForecastDay> {
    complete_rows(daily)
        .map(|(i, obs)| ForecastDay {
            date: obs.date,
            temp_high: obs.temp_high,
            temp_low: obs.temp_low,
            confidence: forecast_confidence(i),
        })
        .collect()
}

/// `max(0.5, 0.95 - 0.03 × lead_days)`
pub fn forecast_confidence(lead_days: usize) -> f64 {
    (0.95 - 0.03 * lead_days as f64).max(0.5)
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Average a month of archive days into normals
pub fn climatology_from(month: u32, observations: &[DailyObservation]) -> Option<Climatology> {
    if observations.is_empty() {
        return None;
    }
    let n = observations.len() as f64;
    let avg_high = observations.iter().map(|o| o.temp_high).sum::<f64>() / n;
    let avg_low = observations.iter().map(|o| o.temp_low).sum::<f64>() / n;
    let avg_daily_gdd = cumulative_gdd(observations, CLIMATOLOGY_BASE_TEMP, None) / n;

    Some(Climatology {
        month,
        avg_high: round1(avg_high),
        avg_low: round1(avg_low),
        avg_temp: round1((avg_high + avg_low) / 2.0),
        avg_daily_gdd: round1(avg_daily_gdd),
        observation_count: observations.len(),
        is_default: false,
    })
}

/// First and last day of a month
pub fn month_bounds(year: i32, month: u32) -> Option<(NaiveDate, NaiveDate)> {
    let start = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    Some((start, next.pred_opt()?))
}

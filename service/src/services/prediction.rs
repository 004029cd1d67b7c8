//! Prediction pipeline
//!
//! Runs phenology resolution, weather gathering, window projection, quality
//! assessment and confidence scoring for every reference date of a request.
//! Weather problems lower precision and show up in the data-source
//! annotation; only a malformed request is returned as an error.

use chrono::{Datelike, Local, NaiveDate};
use fielder_engine::confidence::{
    build_brix_range, build_quality_range, build_window_ranges, cap_for_source, completeness_for,
    confidence, MAX_CONFIDENCE,
};
use fielder_engine::gdd::{accumulate, compare_to_normal, is_usable_rate};
use fielder_engine::phenology::{crop_profile, PhenologyResolver};
use fielder_engine::projector::{Projector, RateSource};
use fielder_engine::quality::{
    age_modifier, assess, timing_modifier, BrixModifiers, CropFamily, QualityInputs,
    DEFAULT_BRIX_CEILING,
};
use fielder_engine::validation::validate_id;
use fielder_engine::{
    AccumulationState, ConfidenceLevel, DailyObservation, ForecastDay, GddTarget,
    HarvestDateRanges, HarvestWindowPrediction, PhenologyReference, PredictionRange,
    QualityPrediction, ResearchCatalog, SeasonPace, SeasonSelection,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use validator::{Validate, ValidationError};

use crate::config::{Config, PredictionConfig};
use crate::error::AppResult;
use crate::external::WeatherSource;
use crate::services::weather::{WeatherOutcome, WeatherService};

// ============================================================================
// Request / Response Types
// ============================================================================

fn default_true() -> bool {
    true
}

fn validate_identifier(value: &str) -> Result<(), ValidationError> {
    validate_id(value).map_err(|message| {
        let mut error = ValidationError::new("identifier");
        error.message = Some(message.into());
        error
    })
}

/// Harvest prediction request
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PredictionRequest {
    #[validate(length(min = 1, max = 64), custom = "validate_identifier")]
    pub crop_id: String,

    #[serde(default)]
    #[validate(length(min = 1, max = 64), custom = "validate_identifier")]
    pub cultivar_id: Option<String>,

    #[validate(length(min = 1, max = 64), custom = "validate_identifier")]
    pub region_id: String,

    /// Grower planting dates; empty means bloom statistics are used
    #[serde(default)]
    #[validate(length(max = 24))]
    pub planting_dates: Vec<NaiveDate>,

    #[serde(default)]
    #[validate(length(min = 1, max = 64), custom = "validate_identifier")]
    pub rootstock_id: Option<String>,

    #[serde(default)]
    #[validate(range(max = 200))]
    pub tree_age_years: Option<u32>,

    #[serde(default)]
    #[validate(range(max = 365))]
    pub days_since_harvest: Option<u32>,

    #[serde(default = "default_true")]
    pub cold_chain: bool,

    /// Evaluation date; defaults to the local date
    #[serde(default)]
    pub today: Option<NaiveDate>,
}

impl PredictionRequest {
    pub fn new(crop_id: impl Into<String>, region_id: impl Into<String>) -> Self {
        Self {
            crop_id: crop_id.into(),
            cultivar_id: None,
            region_id: region_id.into(),
            planting_dates: Vec::new(),
            rootstock_id: None,
            tree_age_years: None,
            days_since_harvest: None,
            cold_chain: true,
            today: None,
        }
    }

    pub fn with_cultivar(mut self, cultivar_id: impl Into<String>) -> Self {
        self.cultivar_id = Some(cultivar_id.into());
        self
    }

    pub fn with_planting_dates(mut self, dates: impl IntoIterator<Item = NaiveDate>) -> Self {
        self.planting_dates = dates.into_iter().collect();
        self
    }

    pub fn on(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }
}

/// Which data anchored the reference dates
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PredictionMode {
    CropLevel,
    RegionalAverage,
    GrowerSpecific,
}

/// Prediction for one reference date
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PlantingPrediction {
    pub reference: PhenologyReference,
    pub accumulation: AccumulationState,
    pub window: HarvestWindowPrediction,
    pub headline: String,
    pub quality: QualityPrediction,
    /// Range around the assessed sugar, or oil for nuts
    pub quality_range: PredictionRange,
    /// Cultivar peak Brix expectation; absent for nut crops
    pub brix_range: Option<PredictionRange>,
    /// Likely dates for window start, peak and end
    pub harvest_dates: HarvestDateRanges,
    pub confidence: f64,
    pub confidence_level: ConfidenceLevel,
    pub data_source: String,
    pub pace: Option<SeasonPace>,
}

/// Aggregate over several plantings
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PlantingSummary {
    pub earliest_start: NaiveDate,
    pub latest_end: NaiveDate,
    pub any_harvestable: bool,
    pub any_at_peak: bool,
    pub any_in_optimal: bool,
}

impl PlantingSummary {
    fn from_plantings(plantings: &[PlantingPrediction]) -> Option<Self> {
        if plantings.len() < 2 {
            return None;
        }
        Some(Self {
            earliest_start: plantings.iter().map(|p| p.window.maturity_date).min()?,
            latest_end: plantings.iter().map(|p| p.window.window_end_date).max()?,
            any_harvestable: plantings.iter().any(|p| p.window.flags.harvestable),
            any_at_peak: plantings.iter().any(|p| p.window.flags.at_peak),
            any_in_optimal: plantings.iter().any(|p| p.window.flags.in_optimal_window),
        })
    }
}

/// Full prediction report
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PredictionReport {
    pub crop_id: String,
    pub cultivar_id: Option<String>,
    pub region_id: String,
    pub mode: PredictionMode,
    pub family: CropFamily,
    pub rootstock_modifier: f64,
    pub age_modifier: f64,
    pub plantings: Vec<PlantingPrediction>,
    pub summary: Option<PlantingSummary>,
    /// Fallbacks applied to the whole request
    pub annotations: Vec<String>,
    pub today: NaiveDate,
}

/// Weather gathered for one reference date
struct WeatherInputs {
    observations: Vec<DailyObservation>,
    forecast: Vec<ForecastDay>,
    accumulation: AccumulationState,
    /// Rate beyond the last observed or forecast day; the flat
    /// climatology rate when nothing was observed
    rate: f64,
    note: String,
    pace: Option<SeasonPace>,
}

impl WeatherInputs {
    fn estimated(accumulation: AccumulationState, rate: f64, note: String) -> Self {
        Self {
            observations: Vec::new(),
            forecast: Vec::new(),
            accumulation,
            rate,
            note,
            pace: None,
        }
    }

    /// Heat since `reference_date` when a lapsed season was replaced
    fn next_season(
        &self,
        reference_date: NaiveDate,
        today: NaiveDate,
        target: &GddTarget,
    ) -> AccumulationState {
        let days_elapsed = (today - reference_date).num_days();
        if days_elapsed < 0 {
            return AccumulationState::empty();
        }
        if self.observations.is_empty() {
            return AccumulationState::estimated(days_elapsed, self.rate);
        }
        let season: Vec<DailyObservation> = self
            .observations
            .iter()
            .filter(|obs| obs.date >= reference_date)
            .copied()
            .collect();
        accumulate(&season, target.base_temp, target.max_temp)
    }

    fn rate_source(&self) -> RateSource<'_> {
        if self.observations.is_empty() {
            RateSource::Climatology {
                avg_daily_gdd: self.rate,
            }
        } else {
            RateSource::Observed {
                observations: &self.observations,
                forecast: &self.forecast,
                forward_rate: self.rate,
            }
        }
    }
}

// ============================================================================
// Prediction Service
// ============================================================================

pub struct PredictionService<W, C> {
    weather: WeatherService<W>,
    catalog: C,
    settings: PredictionConfig,
}

impl<W, C> PredictionService<W, C>
where
    W: WeatherSource,
    C: ResearchCatalog,
{
    pub fn new(source: W, catalog: C, config: &Config) -> Self {
        Self::with_weather(
            WeatherService::new(source, &config.weather),
            catalog,
            config.prediction.clone(),
        )
    }

    pub fn with_weather(weather: WeatherService<W>, catalog: C, settings: PredictionConfig) -> Self {
        Self {
            weather,
            catalog,
            settings,
        }
    }

    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    /// Predict harvest timing and quality for a request
    pub async fn predict(&self, request: &PredictionRequest) -> AppResult<PredictionReport> {
        request.validate()?;

        let today = request
            .today
            .unwrap_or_else(|| Local::now().date_naive());
        let mut annotations = Vec::new();

        let resolution = CropFamily::resolve(&request.crop_id);
        if let Some(note) = resolution.annotation() {
            info!(crop_id = %request.crop_id, "Unknown crop family, using citrus model");
            annotations.push(note.to_string());
        }

        if let Some(cultivar_id) = request.cultivar_id.as_deref() {
            if self.catalog.get_cultivar(cultivar_id).is_none() {
                info!(cultivar_id, "Cultivar not in catalog, using crop defaults");
                annotations.push(format!(
                    "cultivar {} not in catalog; crop defaults used",
                    cultivar_id
                ));
            }
        }

        let rootstock_modifier = match request.rootstock_id.as_deref() {
            Some(rootstock_id) => match self.catalog.get_rootstock(rootstock_id) {
                Some(rootstock) => rootstock.brix_modifier,
                None => {
                    warn!(rootstock_id, "Unknown rootstock, modifier ignored");
                    annotations.push(format!("rootstock {} unknown; no modifier", rootstock_id));
                    0.0
                }
            },
            None => 0.0,
        };

        let mode = self.mode_for(request);
        let resolver =
            PhenologyResolver::with_settings(&self.catalog, self.settings.resolver_settings());
        let cultivar_id = request.cultivar_id.as_deref();

        let references: Vec<PhenologyReference> = if request.planting_dates.is_empty() {
            vec![resolver.resolve(&request.crop_id, cultivar_id, &request.region_id, today)]
        } else {
            request
                .planting_dates
                .iter()
                .map(|&planting_date| {
                    resolver.resolve_planting(
                        &request.crop_id,
                        cultivar_id,
                        &request.region_id,
                        planting_date,
                        today,
                    )
                })
                .collect()
        };

        let mut plantings = Vec::with_capacity(references.len());
        for reference in references {
            plantings.push(
                self.predict_reference(request, reference, resolution.family, rootstock_modifier, today)
                    .await,
            );
        }

        info!(
            crop_id = %request.crop_id,
            region_id = %request.region_id,
            mode = ?mode,
            plantings = plantings.len(),
            "Prediction complete"
        );

        Ok(PredictionReport {
            crop_id: request.crop_id.clone(),
            cultivar_id: request.cultivar_id.clone(),
            region_id: request.region_id.clone(),
            mode,
            family: resolution.family,
            rootstock_modifier,
            age_modifier: age_modifier(request.tree_age_years),
            summary: PlantingSummary::from_plantings(&plantings),
            plantings,
            annotations,
            today,
        })
    }

    fn mode_for(&self, request: &PredictionRequest) -> PredictionMode {
        if !request.planting_dates.is_empty() {
            return PredictionMode::GrowerSpecific;
        }
        let has_regional = request
            .cultivar_id
            .as_deref()
            .is_some_and(|id| self.catalog.get_regional_data(id, &request.region_id).is_some());
        if has_regional {
            PredictionMode::RegionalAverage
        } else {
            PredictionMode::CropLevel
        }
    }

    async fn predict_reference(
        &self,
        request: &PredictionRequest,
        reference: PhenologyReference,
        family: CropFamily,
        rootstock_modifier: f64,
        today: NaiveDate,
    ) -> PlantingPrediction {
        let weather = self.gather_weather(&reference, today).await;
        let target = reference.source_gdd_target;

        let window = Projector::for_reference(&reference, self.settings.next_season_grace_days)
            .project_reference(&reference, &weather.rate_source(), today);

        let cultivar = reference
            .cultivar_id
            .as_deref()
            .and_then(|id| self.catalog.get_cultivar(id));
        let regional = reference
            .cultivar_id
            .as_deref()
            .and_then(|id| self.catalog.get_regional_data(id, &reference.region_id));
        let completeness = completeness_for(cultivar, regional);

        // Without a cultivar the source cap is the whole story
        let base = if cultivar.is_some() {
            completeness.base_confidence()
        } else {
            MAX_CONFIDENCE
        };
        let days_to_peak = (window.peak_center_date - today).num_days().max(0);
        let score = confidence(
            cap_for_source(base, reference.source),
            days_to_peak,
            !weather.forecast.is_empty(),
            self.settings.historical_variance,
        );

        let research_brix = cultivar.and_then(|c| c.research_peak_brix);
        let ceiling = research_brix
            .or_else(|| crop_profile(&reference.crop_id).map(|p| p.sugar_ceiling))
            .unwrap_or(DEFAULT_BRIX_CEILING);
        let (accumulation, pace) = if window.showing_next_season {
            let accumulation = weather.next_season(window.reference_date, today, &target);
            debug!(
                reference_date = %window.reference_date,
                cumulative_gdd = accumulation.cumulative_gdd,
                "Quality assessed from the next season"
            );
            (accumulation, None)
        } else {
            (weather.accumulation, weather.pace.clone())
        };
        let current_gdd = accumulation.cumulative_gdd;
        let developing = today >= window.reference_date && today < window.maturity_date;

        let quality = assess(
            family,
            &QualityInputs {
                current_gdd,
                peak_gdd: target.gdd_to_peak,
                ceiling,
                status: window.status,
                developing,
                rootstock_modifier,
                tree_age_years: request.tree_age_years,
                days_since_harvest: request.days_since_harvest,
                cold_chain: request.cold_chain,
                confidence: score,
            },
        );

        let brix_range = (!family.is_nut()).then(|| {
            let modifiers = BrixModifiers {
                rootstock: rootstock_modifier,
                age: age_modifier(request.tree_age_years),
                timing: timing_modifier(current_gdd, target.gdd_to_peak),
            };
            build_brix_range(research_brix, &modifiers, &completeness)
        });
        let quality_range = build_quality_range(&quality, &completeness);
        let harvest_dates = build_window_ranges(&window, score, completeness.data_quality());

        debug!(
            crop_id = %reference.crop_id,
            reference_date = %reference.reference_date,
            current_gdd,
            status = ?window.status,
            confidence = score,
            "Planting evaluated"
        );

        PlantingPrediction {
            headline: window.headline(today),
            data_source: format!("{} {}", reference.source, weather.note),
            accumulation,
            pace,
            reference,
            window,
            quality,
            quality_range,
            brix_range,
            harvest_dates,
            confidence: score,
            confidence_level: ConfidenceLevel::from_score(score),
        }
    }

    /// Observations when the reference has passed, estimates otherwise
    async fn gather_weather(&self, reference: &PhenologyReference, today: NaiveDate) -> WeatherInputs {
        let target = reference.source_gdd_target;
        let region_id = reference.region_id.as_str();
        let days_elapsed = (today - reference.reference_date).num_days();
        let expected_rate = reference
            .regional_daily_gdd
            .unwrap_or(reference.seasonal_daily_gdd);

        if days_elapsed < 0 {
            let note = match reference.season {
                SeasonSelection::Planted => "- awaiting planting",
                _ => "- awaiting bloom",
            };
            return WeatherInputs::estimated(AccumulationState::empty(), expected_rate, note.into());
        }

        let outcome = self
            .weather
            .observations(region_id, reference.reference_date, today)
            .await;
        let note = outcome.annotation(self.weather.provider_name());

        match outcome {
            WeatherOutcome::Observed(observations) => {
                let accumulation = accumulate(&observations, target.base_temp, target.max_temp);
                let forecast = self.weather.forecast(region_id).await;
                // Forecast days are walked one by one; past them the season's
                // observed pace carries on
                let rate = accumulation
                    .avg_daily_gdd()
                    .filter(|rate| is_usable_rate(*rate))
                    .unwrap_or(expected_rate);
                let pace = compare_to_normal(accumulation.cumulative_gdd, days_elapsed, expected_rate);

                WeatherInputs {
                    observations,
                    forecast,
                    accumulation,
                    rate,
                    note,
                    pace: Some(pace),
                }
            }
            WeatherOutcome::Empty => {
                let rate = match reference.regional_daily_gdd {
                    Some(rate) => rate,
                    None => self
                        .weather
                        .climatology(region_id, today.month())
                        .await
                        .map(|c| c.avg_daily_gdd_at(target.base_temp, target.max_temp))
                        .filter(|rate| is_usable_rate(*rate))
                        .unwrap_or(reference.seasonal_daily_gdd),
                };
                WeatherInputs::estimated(AccumulationState::estimated(days_elapsed, rate), rate, note)
            }
            WeatherOutcome::Unavailable(_) => {
                let rate = reference
                    .regional_daily_gdd
                    .unwrap_or(self.settings.default_daily_gdd);
                WeatherInputs::estimated(AccumulationState::estimated(days_elapsed, rate), rate, note)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_defaults_from_json() {
        let request: PredictionRequest =
            serde_json::from_str(r#"{"crop_id": "navel_orange", "region_id": "indian_river"}"#)
                .unwrap();
        assert!(request.cold_chain);
        assert!(request.planting_dates.is_empty());
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_identifier_must_be_snake_case() {
        let request = PredictionRequest::new("Navel Orange", "indian_river");
        assert!(request.validate().is_err());

        let mut request = PredictionRequest::new("navel_orange", "indian_river");
        request.rootstock_id = Some(String::new());
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_tree_age_is_bounded() {
        let mut request = PredictionRequest::new("navel_orange", "indian_river");
        request.tree_age_years = Some(500);
        assert!(request.validate().is_err());
    }
}

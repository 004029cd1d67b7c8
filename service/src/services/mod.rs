//! Business logic services

pub mod prediction;
pub mod weather;

pub use prediction::{
    PlantingPrediction, PlantingSummary, PredictionMode, PredictionReport, PredictionRequest,
    PredictionService,
};
pub use weather::{GddProjection, WeatherOutcome, WeatherService};

//! Validation utilities for research records
//!
//! Used when loading a catalog so that bad data is rejected at the edge
//! instead of reaching the prediction pipeline.

use crate::gdd::MIN_USABLE_DAILY_GDD;
use crate::models::{CultivarResearch, GrowingRegion, RegionalBloomData, RootstockResearch};

// ============================================================================
// Field Validations
// ============================================================================

/// Validate a record identifier (lowercase snake_case)
pub fn validate_id(id: &str) -> Result<(), &'static str> {
    if id.is_empty() {
        return Err("Identifier must not be empty");
    }
    if !id
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
    {
        return Err("Identifier must be lowercase snake_case");
    }
    Ok(())
}

/// Validate a 1-based day of year
pub fn validate_doy(doy: i32) -> Result<(), &'static str> {
    if !(1..=366).contains(&doy) {
        return Err("Day of year must be between 1 and 366");
    }
    Ok(())
}

/// Validate a Brix value (0-35 covers every fruit crop)
pub fn validate_brix(brix: f64) -> Result<(), &'static str> {
    if !brix.is_finite() || !(0.0..=35.0).contains(&brix) {
        return Err("Brix must be between 0 and 35");
    }
    Ok(())
}

/// Validate a Fahrenheit base temperature
pub fn validate_base_temp(temp: f64) -> Result<(), &'static str> {
    if !temp.is_finite() || !(20.0..=80.0).contains(&temp) {
        return Err("Base temperature must be between 20°F and 80°F");
    }
    Ok(())
}

/// Validate latitude and longitude in decimal degrees
pub fn validate_coordinates(latitude: f64, longitude: f64) -> Result<(), &'static str> {
    if !(-90.0..=90.0).contains(&latitude) {
        return Err("Latitude must be between -90 and 90");
    }
    if !(-180.0..=180.0).contains(&longitude) {
        return Err("Longitude must be between -180 and 180");
    }
    Ok(())
}

/// Validate a positive daily GDD rate
pub fn validate_daily_gdd(rate: f64) -> Result<(), &'static str> {
    if !rate.is_finite() || rate < MIN_USABLE_DAILY_GDD || rate > 60.0 {
        return Err("Daily GDD must be between 0.1 and 60");
    }
    Ok(())
}

// ============================================================================
// Record Validations
// ============================================================================

pub fn validate_cultivar(cultivar: &CultivarResearch) -> Result<(), &'static str> {
    validate_id(&cultivar.cultivar_id)?;
    validate_id(&cultivar.crop_type)?;
    validate_base_temp(cultivar.gdd_base_temp)?;
    if let Some(brix) = cultivar.research_peak_brix {
        validate_brix(brix)?;
    }
    if let Some(brix) = cultivar.research_avg_brix {
        validate_brix(brix)?;
    }
    if let (Some(maturity), Some(peak)) = (cultivar.gdd_to_maturity, cultivar.gdd_to_peak) {
        if maturity >= peak {
            return Err("GDD to maturity must be below GDD to peak");
        }
    }
    if cultivar.gdd_to_maturity.is_some_and(|g| g <= 0.0) {
        return Err("GDD to maturity must be positive");
    }
    if let Some(max_temp) = cultivar.gdd_max_temp {
        if max_temp <= cultivar.gdd_base_temp {
            return Err("Upper temperature cap must be above base temperature");
        }
    }
    Ok(())
}

pub fn validate_regional_data(data: &RegionalBloomData) -> Result<(), &'static str> {
    validate_id(&data.cultivar_id)?;
    validate_id(&data.region_id)?;
    let days = [
        data.avg_bloom_start_doy,
        data.avg_bloom_peak_doy,
        data.avg_bloom_end_doy,
        data.historical_harvest_start_doy,
        data.historical_harvest_end_doy,
        data.historical_peak_start_doy,
        data.historical_peak_end_doy,
    ];
    for doy in days.into_iter().flatten() {
        validate_doy(doy)?;
    }
    if data.historical_harvest_start_doy.is_some() != data.historical_harvest_end_doy.is_some() {
        return Err("Historical harvest window needs both start and end");
    }
    if let Some(rate) = data.avg_gdd_per_day_bloom_to_harvest {
        validate_daily_gdd(rate)?;
    }
    Ok(())
}

pub fn validate_rootstock(rootstock: &RootstockResearch) -> Result<(), &'static str> {
    validate_id(&rootstock.rootstock_id)?;
    if !rootstock.brix_modifier.is_finite() || rootstock.brix_modifier.abs() > 3.0 {
        return Err("Rootstock Brix modifier must be within ±3");
    }
    Ok(())
}

pub fn validate_region(region: &GrowingRegion) -> Result<(), &'static str> {
    validate_id(&region.region_id)?;
    if region.state.len() != 2 || !region.state.chars().all(|c| c.is_ascii_uppercase()) {
        return Err("State must be a two-letter uppercase code");
    }
    validate_coordinates(region.coordinates.latitude, region.coordinates.longitude)?;
    if let Some(rate) = region.seasonal_daily_gdd {
        validate_daily_gdd(rate)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Coordinates;

    #[test]
    fn test_validate_id() {
        assert!(validate_id("washington_navel").is_ok());
        assert!(validate_id("").is_err());
        assert!(validate_id("Washington Navel").is_err());
    }

    #[test]
    fn test_validate_doy_bounds() {
        assert!(validate_doy(1).is_ok());
        assert!(validate_doy(366).is_ok());
        assert!(validate_doy(0).is_err());
        assert!(validate_doy(400).is_err());
    }

    #[test]
    fn test_validate_daily_gdd_floor() {
        assert!(validate_daily_gdd(22.0).is_ok());
        assert!(validate_daily_gdd(MIN_USABLE_DAILY_GDD).is_ok());
        assert!(validate_daily_gdd(1e-20).is_err());
        assert!(validate_daily_gdd(0.0).is_err());
        assert!(validate_daily_gdd(61.0).is_err());
    }

    #[test]
    fn test_validate_region() {
        let mut region = GrowingRegion {
            region_id: "indian_river".into(),
            name: "Indian River".into(),
            state: "FL".into(),
            coordinates: Coordinates::new(27.6, -80.4),
            seasonal_daily_gdd: Some(22.0),
        };
        assert!(validate_region(&region).is_ok());

        region.state = "Florida".into();
        assert!(validate_region(&region).is_err());

        region.state = "FL".into();
        region.coordinates.latitude = 120.0;
        assert!(validate_region(&region).is_err());
    }

    #[test]
    fn test_validate_cultivar_thresholds() {
        let cultivar: CultivarResearch = serde_json::from_str(
            r#"{"cultivar_id": "bing", "cultivar_name": "Bing", "crop_type": "sweet_cherry",
                "gdd_to_maturity": 1600, "gdd_to_peak": 1500, "gdd_base_temp": 40}"#,
        )
        .unwrap();
        assert_eq!(
            validate_cultivar(&cultivar),
            Err("GDD to maturity must be below GDD to peak")
        );
    }
}

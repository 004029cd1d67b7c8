//! Latitude-band climate defaults
//!
//! Used when a weather provider has no archive for a region. Values are
//! coarse US growing-region normals, not observations.

use crate::models::Climatology;

/// Base temperature `avg_daily_gdd` is expressed in
pub const CLIMATOLOGY_BASE_TEMP: f64 = 55.0;

/// (winter low, summer high) in °F for a latitude
fn band_extremes(latitude: f64) -> (f64, f64) {
    if latitude < 30.0 {
        (55.0, 95.0)
    } else if latitude < 35.0 {
        (35.0, 95.0)
    } else if latitude < 40.0 {
        (30.0, 90.0)
    } else if latitude < 45.0 {
        (20.0, 85.0)
    } else {
        (10.0, 80.0)
    }
}

/// Default monthly normals for a latitude
pub fn default_for_latitude(latitude: f64, month: u32) -> Climatology {
    let (winter_low, summer_high) = band_extremes(latitude);

    let (avg_high, avg_low) = match month {
        12 | 1 | 2 => (winter_low + 20.0, winter_low),
        6..=8 => (summer_high, summer_high - 20.0),
        _ => {
            let mid = (winter_low + summer_high) / 2.0;
            (mid + 10.0, mid - 10.0)
        }
    };
    let avg_temp = (avg_high + avg_low) / 2.0;

    Climatology {
        month,
        avg_high,
        avg_low,
        avg_temp,
        avg_daily_gdd: (avg_temp - CLIMATOLOGY_BASE_TEMP).max(0.0),
        observation_count: 0,
        is_default: true,
    }
}

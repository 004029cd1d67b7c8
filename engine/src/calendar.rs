//! Day-of-year arithmetic with season wraparound
//!
//! Every conversion from day-of-year statistics to calendar dates goes
//! through this module so that seasons crossing Jan 1 are handled one way.

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

/// Calendar years a season starts and ends in
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct SeasonYears {
    pub start_year: i32,
    pub end_year: i32,
}

/// Date of day `doy` (1-based) in `ref_year`.
///
/// `doy <= 0` counts back into the previous year and values past the end of
/// the year continue into the next one.
pub fn doy_to_date(doy: i32, ref_year: i32) -> Option<NaiveDate> {
    let jan_first = NaiveDate::from_ymd_opt(ref_year, 1, 1)?;
    jan_first.checked_add_signed(Duration::days(i64::from(doy) - 1))
}

/// Pick the season instance that is relevant on `today`.
///
/// For a season crossing Jan 1 (`end_doy < start_doy`) this is the instance
/// containing today, from either side of the new year, or the upcoming one
/// when today falls between seasons. A season that does not wrap and has
/// already ended this year resolves to next year.
pub fn resolve_season_year(start_doy: i32, end_doy: i32, today: NaiveDate) -> SeasonYears {
    let year = today.year();
    let today_doy = today.ordinal() as i32;

    if end_doy < start_doy {
        if today_doy >= start_doy {
            SeasonYears {
                start_year: year,
                end_year: year + 1,
            }
        } else if today_doy <= end_doy {
            SeasonYears {
                start_year: year - 1,
                end_year: year,
            }
        } else {
            SeasonYears {
                start_year: year,
                end_year: year + 1,
            }
        }
    } else if today_doy > end_doy {
        SeasonYears {
            start_year: year + 1,
            end_year: year + 1,
        }
    } else {
        SeasonYears {
            start_year: year,
            end_year: year,
        }
    }
}

/// Start and end dates of the relevant season instance
pub fn season_dates(start_doy: i32, end_doy: i32, today: NaiveDate) -> Option<(NaiveDate, NaiveDate)> {
    let years = resolve_season_year(start_doy, end_doy, today);
    Some((
        doy_to_date(start_doy, years.start_year)?,
        doy_to_date(end_doy, years.end_year)?,
    ))
}

/// Same month and day a year later; Feb 29 maps to Feb 28
pub fn same_day_next_year(date: NaiveDate) -> NaiveDate {
    let next = date.year() + 1;
    date.with_year(next)
        .or_else(|| NaiveDate::from_ymd_opt(next, date.month(), 28))
        .unwrap_or(date)
}

/// Days between the start and end of a harvest season, wrap-aware
pub fn harvest_days(start_doy: i32, end_doy: i32) -> u32 {
    let days = if end_doy >= start_doy {
        end_doy - start_doy
    } else {
        365 - start_doy + end_doy
    };
    days.max(0) as u32
}

/// Add days, saturating at the calendar bounds
pub fn shift(date: NaiveDate, days: i64) -> NaiveDate {
    Duration::try_days(days)
        .and_then(|delta| date.checked_add_signed(delta))
        .unwrap_or(if days < 0 { NaiveDate::MIN } else { NaiveDate::MAX })
}

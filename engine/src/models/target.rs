//! Heat-unit targets for a crop or cultivar

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// GDD thresholds that mark maturity, peak quality and the harvest window
///
/// All thresholds are cumulative GDD counted from the reference date (bloom
/// or planting). `max_temp` is the optional upper developmental cap used by
/// the modified 86/50 method.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GddTarget {
    pub base_temp: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_temp: Option<f64>,
    pub gdd_to_maturity: f64,
    pub gdd_to_peak: f64,
    pub gdd_window: f64,
}

/// Violations of the [`GddTarget`] invariants
#[derive(Debug, Clone, Error, PartialEq)]
pub enum GddTargetError {
    #[error("GDD target contains a non-finite value")]
    NonFinite,

    #[error("GDD to maturity must be positive, got {0}")]
    NonPositiveMaturity(f64),

    #[error("GDD to maturity ({maturity}) must be below GDD to peak ({peak})")]
    MaturityNotBeforePeak { maturity: f64, peak: f64 },

    #[error("GDD window must be positive, got {0}")]
    NonPositiveWindow(f64),

    #[error("Upper temperature cap ({max_temp}) must be above base temperature ({base_temp})")]
    CapBelowBase { base_temp: f64, max_temp: f64 },
}

impl GddTarget {
    /// Generic crop-level target used when nothing better is known
    pub const GENERIC: GddTarget = GddTarget {
        base_temp: 50.0,
        max_temp: None,
        gdd_to_maturity: 1800.0,
        gdd_to_peak: 2100.0,
        gdd_window: 200.0,
    };

    /// Create a validated target without an upper cap
    pub fn new(
        base_temp: f64,
        gdd_to_maturity: f64,
        gdd_to_peak: f64,
        gdd_window: f64,
    ) -> Result<Self, GddTargetError> {
        let target = Self {
            base_temp,
            max_temp: None,
            gdd_to_maturity,
            gdd_to_peak,
            gdd_window,
        };
        target.validate()?;
        Ok(target)
    }

    /// Attach an upper developmental cap (86/50 method)
    pub fn with_max_temp(self, max_temp: Option<f64>) -> Result<Self, GddTargetError> {
        let target = Self { max_temp, ..self };
        target.validate()?;
        Ok(target)
    }

    /// Check `0 < gdd_to_maturity < gdd_to_peak`, `gdd_window > 0` and a sane cap
    pub fn validate(&self) -> Result<(), GddTargetError> {
        let values = [
            self.base_temp,
            self.gdd_to_maturity,
            self.gdd_to_peak,
            self.gdd_window,
        ];
        if values.iter().any(|v| !v.is_finite()) || self.max_temp.is_some_and(|m| !m.is_finite()) {
            return Err(GddTargetError::NonFinite);
        }
        if self.gdd_to_maturity <= 0.0 {
            return Err(GddTargetError::NonPositiveMaturity(self.gdd_to_maturity));
        }
        if self.gdd_to_maturity >= self.gdd_to_peak {
            return Err(GddTargetError::MaturityNotBeforePeak {
                maturity: self.gdd_to_maturity,
                peak: self.gdd_to_peak,
            });
        }
        if self.gdd_window <= 0.0 {
            return Err(GddTargetError::NonPositiveWindow(self.gdd_window));
        }
        if let Some(max_temp) = self.max_temp {
            if max_temp <= self.base_temp {
                return Err(GddTargetError::CapBelowBase {
                    base_temp: self.base_temp,
                    max_temp,
                });
            }
        }
        Ok(())
    }

    /// Start of the optimal (middle 50%) window.
    ///
    /// Never earlier than maturity, so wide windows keep the date ordering.
    pub fn optimal_start_gdd(&self) -> f64 {
        (self.gdd_to_peak - self.gdd_window / 4.0).max(self.gdd_to_maturity)
    }

    /// End of the optimal (middle 50%) window
    pub fn optimal_end_gdd(&self) -> f64 {
        self.gdd_to_peak + self.gdd_window / 4.0
    }

    /// End of the full harvest window
    pub fn window_end_gdd(&self) -> f64 {
        self.gdd_to_peak + self.gdd_window / 2.0
    }

    /// The five thresholds in window order
    pub fn thresholds(&self) -> [f64; 5] {
        [
            self.gdd_to_maturity,
            self.optimal_start_gdd(),
            self.gdd_to_peak,
            self.optimal_end_gdd(),
            self.window_end_gdd(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generic_target_is_valid() {
        assert!(GddTarget::GENERIC.validate().is_ok());
        assert_eq!(GddTarget::GENERIC.base_temp, 50.0);
        assert_eq!(GddTarget::GENERIC.gdd_to_maturity, 1800.0);
        assert_eq!(GddTarget::GENERIC.gdd_to_peak, 2100.0);
        assert_eq!(GddTarget::GENERIC.gdd_window, 200.0);
    }

    #[test]
    fn test_maturity_must_precede_peak() {
        let err = GddTarget::new(50.0, 2100.0, 2100.0, 200.0).unwrap_err();
        assert!(matches!(err, GddTargetError::MaturityNotBeforePeak { .. }));
        assert!(GddTarget::new(50.0, 2200.0, 2100.0, 200.0).is_err());
    }

    #[test]
    fn test_window_and_maturity_must_be_positive() {
        assert_eq!(
            GddTarget::new(50.0, 1000.0, 1200.0, 0.0),
            Err(GddTargetError::NonPositiveWindow(0.0))
        );
        assert_eq!(
            GddTarget::new(50.0, 0.0, 1200.0, 100.0),
            Err(GddTargetError::NonPositiveMaturity(0.0))
        );
        assert_eq!(
            GddTarget::new(f64::NAN, 1000.0, 1200.0, 100.0),
            Err(GddTargetError::NonFinite)
        );
    }

    #[test]
    fn test_cap_must_exceed_base() {
        let target = GddTarget::new(50.0, 2400.0, 2600.0, 2400.0).unwrap();
        assert!(target.with_max_temp(Some(86.0)).is_ok());
        assert!(target.with_max_temp(Some(45.0)).is_err());
    }

    #[test]
    fn test_thresholds_follow_middle_half_rule() {
        let navel = GddTarget::new(55.0, 5100.0, 6100.0, 3500.0).unwrap();
        assert_eq!(navel.thresholds(), [5100.0, 5225.0, 6100.0, 6975.0, 7850.0]);
    }

    #[test]
    fn test_optimal_start_clamped_to_maturity() {
        let strawberry = GddTarget::new(50.0, 700.0, 1300.0, 2800.0).unwrap();
        assert_eq!(strawberry.optimal_start_gdd(), 700.0);
        let thresholds = strawberry.thresholds();
        assert!(thresholds.windows(2).all(|w| w[0] <= w[1]));
    }
}

use crate::core::Fix;
use crate::validation::error::MapError;
use serde::{Deserialize, Serialize};

/// How out-of-range fixes are handled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FixPolicy {
    /// Refuse the fix, the marker keeps its previous state
    #[default]
    Reject,
    /// Pull coordinates back into range and normalize the heading
    Clamp,
}

/// Counters kept by the validator
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FixValidationStats {
    pub accepted: u64,
    pub clamped: u64,
    pub rejected: u64,
}

/// Validates fixes before they reach the marker
#[derive(Debug, Clone)]
pub struct FixValidator {
    policy: FixPolicy,
    last_sequence: Option<u64>,
    stats: FixValidationStats,
}

impl FixValidator {
    pub fn new(policy: FixPolicy) -> Self {
        Self {
            policy,
            last_sequence: None,
            stats: FixValidationStats::default(),
        }
    }

    pub fn policy(&self) -> FixPolicy {
        self.policy
    }

    pub fn stats(&self) -> FixValidationStats {
        self.stats
    }

    /// Validate a fix, returning the (possibly clamped) fix to apply
    pub fn validate(&mut self, fix: &Fix) -> Result<Fix, MapError> {
        match self.check(fix) {
            Ok((validated, clamped)) => {
                self.last_sequence = Some(validated.sequence);
                self.stats.accepted += 1;
                if clamped {
                    self.stats.clamped += 1;
                }
                Ok(validated)
            }
            Err(e) => {
                self.stats.rejected += 1;
                Err(e)
            }
        }
    }

    fn check(&self, fix: &Fix) -> Result<(Fix, bool), MapError> {
        for (field, value) in [("lat", fix.lat), ("lon", fix.lon), ("heading", fix.heading)] {
            if !value.is_finite() {
                return Err(MapError::InvalidFix {
                    field,
                    value,
                    reason: "not a finite number".to_string(),
                });
            }
        }

        if let Some(last) = self.last_sequence {
            if fix.sequence < last {
                return Err(MapError::InvalidFix {
                    field: "sequence",
                    value: fix.sequence as f64,
                    reason: format!("older than last applied fix {}", last),
                });
            }
        }

        let lat_ok = (-90.0..=90.0).contains(&fix.lat);
        let lon_ok = (-180.0..=180.0).contains(&fix.lon);
        let heading_ok = (0.0..360.0).contains(&fix.heading);

        if lat_ok && lon_ok && heading_ok {
            return Ok((*fix, false));
        }

        match self.policy {
            FixPolicy::Reject => {
                let (field, value, reason) = if !lat_ok {
                    ("lat", fix.lat, "outside [-90, 90]")
                } else if !lon_ok {
                    ("lon", fix.lon, "outside [-180, 180]")
                } else {
                    ("heading", fix.heading, "outside [0, 360)")
                };
                Err(MapError::InvalidFix {
                    field,
                    value,
                    reason: reason.to_string(),
                })
            }
            FixPolicy::Clamp => {
                let clamped = Fix {
                    lat: fix.lat.clamp(-90.0, 90.0),
                    lon: fix.lon.clamp(-180.0, 180.0),
                    heading: fix.heading.rem_euclid(360.0),
                    ..*fix
                };
                Ok((clamped, true))
            }
        }
    }
}

impl Default for FixValidator {
    fn default() -> Self {
        Self::new(FixPolicy::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn fix(lat: f64, lon: f64, heading: f64, sequence: u64) -> Fix {
        Fix {
            lat,
            lon,
            heading,
            sequence,
            timestamp_ms: sequence * 1000,
        }
    }

    #[test]
    fn test_valid_fix_passes_unchanged() {
        let mut validator = FixValidator::default();
        let input = fix(43.0, 5.0, 12.5, 0);
        assert_eq!(validator.validate(&input).unwrap(), input);
        assert_eq!(validator.stats().accepted, 1);
    }

    #[test]
    fn test_nan_rejected_under_both_policies() {
        for policy in [FixPolicy::Reject, FixPolicy::Clamp] {
            let mut validator = FixValidator::new(policy);
            let result = validator.validate(&fix(f64::NAN, 5.0, 0.0, 0));
            assert!(matches!(result, Err(MapError::InvalidFix { field: "lat", .. })));
            assert_eq!(validator.stats().rejected, 1);
        }
    }

    #[test]
    fn test_out_of_range_rejected() {
        let mut validator = FixValidator::new(FixPolicy::Reject);
        let result = validator.validate(&fix(43.0, 181.0, 0.0, 0));
        assert!(matches!(result, Err(MapError::InvalidFix { field: "lon", .. })));

        let result = validator.validate(&fix(43.0, 5.0, 360.0, 0));
        assert!(matches!(result, Err(MapError::InvalidFix { field: "heading", .. })));
    }

    #[test]
    fn test_out_of_range_clamped() {
        let mut validator = FixValidator::new(FixPolicy::Clamp);
        let result = validator.validate(&fix(95.0, -200.0, -90.0, 0)).unwrap();
        assert_relative_eq!(result.lat, 90.0);
        assert_relative_eq!(result.lon, -180.0);
        assert_relative_eq!(result.heading, 270.0);
        assert_eq!(validator.stats().clamped, 1);
    }

    #[test]
    fn test_out_of_order_fix_rejected() {
        let mut validator = FixValidator::default();
        validator.validate(&fix(43.0, 5.0, 0.0, 5)).unwrap();
        assert!(validator.validate(&fix(43.0, 5.0, 0.0, 5)).is_ok());

        let result = validator.validate(&fix(43.0, 5.0, 0.0, 4));
        assert!(matches!(result, Err(MapError::InvalidFix { field: "sequence", .. })));
    }
}

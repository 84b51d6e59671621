#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Hotspot observation and patrol recommendation types.
//!
//! Incident counts arrive over the wire as arbitrary JSON ([`HotspotInput`])
//! so that a negative or fractional count can be reported precisely as a
//! [`ScoringInputError`] instead of failing somewhere inside a JSON
//! extractor. [`HotspotInput::into_observation`] performs that check.

use crime_dashboard_crime_models::Priority;
use serde::{Deserialize, Serialize};

/// Patrol window recommended for high-priority hotspots.
pub const EVENING_WINDOW: &str = "18:00-22:00";

/// Patrol window recommended for every other hotspot.
pub const AFTERNOON_WINDOW: &str = "16:00-20:00";

/// A geographic point with its recent incident count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HotspotObservation {
    /// Human-readable place name.
    pub location: String,
    /// Latitude (WGS84).
    pub lat: f64,
    /// Longitude (WGS84).
    pub lng: f64,
    /// Number of incidents observed.
    pub incidents: u32,
}

/// A hotspot as posted by a client, before the incident count is checked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HotspotInput {
    pub location: String,
    pub lat: f64,
    pub lng: f64,
    #[serde(default)]
    pub incidents: serde_json::Value,
}

impl HotspotInput {
    /// Checks the incident count and converts to a [`HotspotObservation`].
    ///
    /// `index` is the position of this hotspot in the request and is
    /// carried into the error.
    ///
    /// # Errors
    ///
    /// Returns [`ScoringInputError`] if the count is missing, negative, not
    /// an integer, or too large.
    pub fn into_observation(self, index: usize) -> Result<HotspotObservation, ScoringInputError> {
        let incidents = match parse_incidents(&self.incidents) {
            Ok(incidents) => incidents,
            Err(reason) => {
                return Err(ScoringInputError {
                    index,
                    location: self.location,
                    reason,
                });
            }
        };

        Ok(HotspotObservation {
            location: self.location,
            lat: self.lat,
            lng: self.lng,
            incidents,
        })
    }
}

impl From<HotspotObservation> for HotspotInput {
    fn from(h: HotspotObservation) -> Self {
        Self {
            location: h.location,
            lat: h.lat,
            lng: h.lng,
            incidents: serde_json::Value::from(h.incidents),
        }
    }
}

/// Why an incident count was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidIncidents {
    /// The field was absent or `null`.
    #[error("incidents is required")]
    Missing,
    /// The count was below zero.
    #[error("incidents must not be negative (got {0})")]
    Negative(String),
    /// The count was fractional or not a number at all.
    #[error("incidents must be a whole number (got {0})")]
    NotAnInteger(String),
    /// The count does not fit in 32 bits.
    #[error("incidents is too large (got {0})")]
    TooLarge(String),
}

/// Reads a whole, non-negative incident count. `12` and `12.0` are the
/// same count.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::float_cmp
)]
fn parse_incidents(value: &serde_json::Value) -> Result<u32, InvalidIncidents> {
    let n = match value {
        serde_json::Value::Null => return Err(InvalidIncidents::Missing),
        serde_json::Value::Number(n) => n,
        other => return Err(InvalidIncidents::NotAnInteger(other.to_string())),
    };

    if let Some(v) = n.as_u64() {
        return u32::try_from(v).map_err(|_| InvalidIncidents::TooLarge(v.to_string()));
    }
    if let Some(v) = n.as_i64() {
        return Err(InvalidIncidents::Negative(v.to_string()));
    }

    match n.as_f64() {
        Some(f) if f.is_finite() && f.fract() == 0.0 => {
            if f < 0.0 {
                Err(InvalidIncidents::Negative(n.to_string()))
            } else if f > f64::from(u32::MAX) {
                Err(InvalidIncidents::TooLarge(n.to_string()))
            } else {
                Ok(f as u32)
            }
        }
        _ => Err(InvalidIncidents::NotAnInteger(n.to_string())),
    }
}

/// A hotspot carried an unusable incident count.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("hotspot {index} ({location}): {reason}")]
pub struct ScoringInputError {
    /// Position of the offending hotspot in the request.
    pub index: usize,
    /// Location label of the offending hotspot.
    pub location: String,
    pub reason: InvalidIncidents,
}

/// Staffing recommendation for one hotspot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatrolRecommendation {
    pub location: String,
    pub lat: f64,
    pub lng: f64,
    /// Officers to deploy, between 2 and 6 inclusive.
    pub recommended_officers: u32,
    /// Patrol window as `HH:MM-HH:MM`.
    pub recommended_time: String,
    pub priority: Priority,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(incidents: serde_json::Value) -> HotspotInput {
        HotspotInput {
            location: "Harbour".to_string(),
            lat: 8.76,
            lng: 78.13,
            incidents,
        }
    }

    #[test]
    fn whole_counts_are_accepted() {
        let obs = input(serde_json::json!(7)).into_observation(0).unwrap();
        assert_eq!(obs.incidents, 7);
        assert_eq!(obs.location, "Harbour");
    }

    #[test]
    fn negative_count_is_rejected_with_index() {
        let err = input(serde_json::json!(-3)).into_observation(4).unwrap_err();
        assert_eq!(err.index, 4);
        assert_eq!(err.reason, InvalidIncidents::Negative("-3".to_string()));
    }

    #[test]
    fn integral_floats_count_as_whole_numbers() {
        let hotspot: HotspotInput =
            serde_json::from_str(r#"{"location":"A","lat":1.0,"lng":2.0,"incidents":12.0}"#)
                .unwrap();
        assert_eq!(hotspot.into_observation(0).unwrap().incidents, 12);

        let obs = input(serde_json::json!(0.0)).into_observation(0).unwrap();
        assert_eq!(obs.incidents, 0);

        let err = input(serde_json::json!(-4.0)).into_observation(1).unwrap_err();
        assert!(matches!(err.reason, InvalidIncidents::Negative(_)));

        let err = input(serde_json::json!(1e12)).into_observation(0).unwrap_err();
        assert!(matches!(err.reason, InvalidIncidents::TooLarge(_)));
    }

    #[test]
    fn fractional_and_textual_counts_are_rejected() {
        let err = input(serde_json::json!(2.5)).into_observation(0).unwrap_err();
        assert!(matches!(err.reason, InvalidIncidents::NotAnInteger(_)));

        let err = input(serde_json::json!("twelve")).into_observation(0).unwrap_err();
        assert!(matches!(err.reason, InvalidIncidents::NotAnInteger(_)));

        let err = input(serde_json::Value::Null).into_observation(0).unwrap_err();
        assert_eq!(err.reason, InvalidIncidents::Missing);
    }

    #[test]
    fn missing_incidents_field_deserializes_to_null() {
        let hotspot: HotspotInput =
            serde_json::from_str(r#"{"location":"A","lat":1.0,"lng":2.0}"#).unwrap();
        assert!(hotspot.into_observation(0).is_err());
    }

    #[test]
    fn recommendation_serializes_camel_case() {
        let rec = PatrolRecommendation {
            location: "A".to_string(),
            lat: 1.0,
            lng: 2.0,
            recommended_officers: 4,
            recommended_time: EVENING_WINDOW.to_string(),
            priority: Priority::High,
        };
        let json = serde_json::to_value(&rec).unwrap();
        assert_eq!(json["recommendedOfficers"], 4);
        assert_eq!(json["recommendedTime"], "18:00-22:00");
        assert_eq!(json["priority"], "High");
    }
}

//! Field-level validation of FIR submissions.

use std::sync::LazyLock;

use chrono::{NaiveDate, NaiveTime};
use crime_dashboard_crime_models::Priority;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{FirDraft, NewFir};

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap_or_else(|_| unreachable!()));

/// Whether `email` looks like an e-mail address.
#[must_use]
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// A single field problem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// Form field name.
    pub field: String,
    /// Human-readable description of the problem.
    pub message: String,
}

/// One or more required fields were missing or malformed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("validation failed: {}", summarize(.fields))]
pub struct ValidationError {
    pub fields: Vec<FieldError>,
}

impl ValidationError {
    /// Creates an error for a single field.
    #[must_use]
    pub fn single(field: &str, message: impl Into<String>) -> Self {
        Self {
            fields: vec![FieldError {
                field: field.to_string(),
                message: message.into(),
            }],
        }
    }

    /// Whether `field` is among the reported problems.
    #[must_use]
    pub fn has_field(&self, field: &str) -> bool {
        self.fields.iter().any(|f| f.field == field)
    }
}

fn summarize(fields: &[FieldError]) -> String {
    fields
        .iter()
        .map(|f| format!("{}: {}", f.field, f.message))
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Default)]
struct Collector {
    fields: Vec<FieldError>,
}

impl Collector {
    fn push(&mut self, field: &str, message: impl Into<String>) {
        self.fields.push(FieldError {
            field: field.to_string(),
            message: message.into(),
        });
    }

    fn required(&mut self, field: &str, value: Option<String>) -> String {
        match clean(value) {
            Some(v) => v,
            None => {
                self.push(field, "is required");
                String::new()
            }
        }
    }
}

/// Trims a value and maps blank strings to `None`.
fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_time(raw: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(raw, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
        .ok()
}

impl FirDraft {
    /// Validates the draft.
    ///
    /// Name, address, date, time, location, incident type, and description
    /// are required. Phone, e-mail, and witnesses are optional; priority
    /// defaults to [`Priority::Medium`].
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] listing every missing or malformed
    /// field.
    pub fn validate(self) -> Result<NewFir, ValidationError> {
        let mut errors = Collector::default();

        let complainant_name = errors.required("complainant_name", self.complainant_name);
        let complainant_address = errors.required("complainant_address", self.complainant_address);
        let location = errors.required("location", self.location);
        let incident_type = errors.required("incident_type", self.incident_type);
        let description = errors.required("description", self.description);

        let incident_date = match clean(self.incident_date) {
            None => {
                errors.push("incident_date", "is required");
                None
            }
            Some(raw) => {
                let parsed = NaiveDate::parse_from_str(&raw, "%Y-%m-%d").ok();
                if parsed.is_none() {
                    errors.push(
                        "incident_date",
                        format!("\"{raw}\" is not a date (expected YYYY-MM-DD)"),
                    );
                }
                parsed
            }
        };

        let incident_time = match clean(self.incident_time) {
            None => {
                errors.push("incident_time", "is required");
                None
            }
            Some(raw) => {
                let parsed = parse_time(&raw);
                if parsed.is_none() {
                    errors.push(
                        "incident_time",
                        format!("\"{raw}\" is not a time of day (expected HH:MM)"),
                    );
                }
                parsed
            }
        };

        let complainant_email = clean(self.complainant_email);
        if let Some(email) = &complainant_email
            && !is_valid_email(email)
        {
            errors.push("complainant_email", format!("\"{email}\" is not an e-mail address"));
        }

        let priority = match clean(self.priority) {
            None => Priority::default(),
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                errors.push(
                    "priority",
                    format!("\"{raw}\" is not one of Low, Medium, High"),
                );
                Priority::default()
            }),
        };

        match (incident_date, incident_time) {
            (Some(incident_date), Some(incident_time)) if errors.fields.is_empty() => Ok(NewFir {
                complainant_name,
                complainant_address,
                complainant_phone: clean(self.complainant_phone),
                complainant_email,
                incident_date,
                incident_time,
                location,
                incident_type,
                description,
                witnesses: clean(self.witnesses),
                priority,
            }),
            _ => Err(ValidationError {
                fields: errors.fields,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete_draft() -> FirDraft {
        FirDraft {
            complainant_name: Some("Meena Raj".to_string()),
            complainant_address: Some("12 Beach Road, Thoothukudi".to_string()),
            complainant_phone: Some("  ".to_string()),
            complainant_email: Some("meena@example.com".to_string()),
            incident_date: Some("2024-03-14".to_string()),
            incident_time: Some("21:45".to_string()),
            location: Some("Fish Market".to_string()),
            incident_type: Some("Theft".to_string()),
            description: Some("Two-wheeler stolen from the parking area".to_string()),
            witnesses: None,
            priority: Some("high".to_string()),
        }
    }

    #[test]
    fn complete_draft_validates() {
        let fir = complete_draft().validate().unwrap();
        assert_eq!(fir.priority, Priority::High);
        assert_eq!(fir.incident_date, NaiveDate::from_ymd_opt(2024, 3, 14).unwrap());
        assert_eq!(fir.incident_time, NaiveTime::from_hms_opt(21, 45, 0).unwrap());
        assert_eq!(fir.complainant_phone, None);
        assert_eq!(fir.witnesses, None);
    }

    #[test]
    fn priority_defaults_to_medium() {
        let mut draft = complete_draft();
        draft.priority = None;
        assert_eq!(draft.validate().unwrap().priority, Priority::Medium);
    }

    #[test]
    fn missing_date_is_reported() {
        let mut draft = complete_draft();
        draft.incident_date = None;
        let err = draft.validate().unwrap_err();
        assert!(err.has_field("incident_date"));
        assert_eq!(err.fields.len(), 1);
    }

    #[test]
    fn malformed_values_are_all_reported() {
        let mut draft = complete_draft();
        draft.incident_date = Some("yesterday".to_string());
        draft.incident_time = Some("25:99".to_string());
        draft.complainant_email = Some("not-an-email".to_string());
        draft.priority = Some("urgent".to_string());
        draft.complainant_name = Some("   ".to_string());

        let err = draft.validate().unwrap_err();
        for field in [
            "incident_date",
            "incident_time",
            "complainant_email",
            "priority",
            "complainant_name",
        ] {
            assert!(err.has_field(field), "expected an error for {field}");
        }
        assert!(err.to_string().contains("incident_date"));
    }

    #[test]
    fn seconds_are_accepted_in_time() {
        let mut draft = complete_draft();
        draft.incident_time = Some("08:05:30".to_string());
        assert_eq!(
            draft.validate().unwrap().incident_time,
            NaiveTime::from_hms_opt(8, 5, 30).unwrap()
        );
    }
}

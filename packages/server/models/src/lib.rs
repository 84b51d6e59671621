#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the crime dashboard server.
//!
//! These types are serialized to JSON for the REST API. They are separate
//! from the record types so the wire contract the dashboard depends on
//! (snake_case FIR fields, a nested `Attachments` array, camelCase patrol
//! fields) can stay fixed while the storage types evolve.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use crime_dashboard_crime_models::{FirStatus, Priority, UserRole};
use crime_dashboard_directory::Officer;
use crime_dashboard_fir_models::{AttachmentRecord, FieldError, FileCategory, FirRecord};
use crime_dashboard_patrol_models::{HotspotInput, PatrolRecommendation};
use serde::{Deserialize, Serialize};

/// Response of `GET /api/health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiHealth {
    /// Always `"ok"` while the process is serving.
    pub status: String,
    pub version: String,
}

/// An evidence file attached to a FIR.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiAttachment {
    pub id: i64,
    pub fir_id: i64,
    /// Relative URL path, e.g. `uploads/1760000000000-3f2a9c1e.jpg`.
    pub file_path: String,
    pub file_type: FileCategory,
    pub original_name: String,
    pub size_bytes: u64,
}

impl From<AttachmentRecord> for ApiAttachment {
    fn from(record: AttachmentRecord) -> Self {
        Self {
            id: record.id,
            fir_id: record.fir_id,
            file_path: record.file_path,
            file_type: record.file_type,
            original_name: record.original_name,
            size_bytes: record.size_bytes,
        }
    }
}

/// A FIR as returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiFir {
    pub id: i64,
    pub complainant_name: String,
    pub complainant_address: String,
    pub complainant_phone: Option<String>,
    pub complainant_email: Option<String>,
    pub incident_date: NaiveDate,
    pub incident_time: NaiveTime,
    pub location: String,
    pub incident_type: String,
    pub description: String,
    pub witnesses: Option<String>,
    pub priority: Priority,
    pub status: FirStatus,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "Attachments")]
    pub attachments: Vec<ApiAttachment>,
}

impl From<FirRecord> for ApiFir {
    fn from(record: FirRecord) -> Self {
        Self {
            id: record.id,
            complainant_name: record.complainant_name,
            complainant_address: record.complainant_address,
            complainant_phone: record.complainant_phone,
            complainant_email: record.complainant_email,
            incident_date: record.incident_date,
            incident_time: record.incident_time,
            location: record.location,
            incident_type: record.incident_type,
            description: record.description,
            witnesses: record.witnesses,
            priority: record.priority,
            status: record.status,
            created_at: record.created_at,
            attachments: record.attachments.into_iter().map(Into::into).collect(),
        }
    }
}

/// Response of `POST /api/firs`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiFirCreated {
    pub fir_id: i64,
    pub message: String,
}

/// Query parameters for `GET /api/firs`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FirListParams {
    /// Case-insensitive search term.
    pub q: Option<String>,
    /// 1-based page number. Without it every match is returned.
    pub page: Option<usize>,
}

/// Body of `PATCH /api/firs/{id}/status`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusUpdateRequest {
    /// Target status, e.g. `"under investigation"`.
    pub status: String,
}

/// Error body returned by every failing endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorBody {
    /// Human-readable message.
    pub error: String,
    /// Machine-readable error kind, e.g. `validation`.
    pub kind: String,
    /// Per-field problems, for validation errors.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldError>,
}

/// Body of `POST /api/allocate-patrol`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocatePatrolRequest {
    pub hotspots: Vec<HotspotInput>,
}

/// Response of `POST /api/allocate-patrol`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocatePatrolResponse {
    pub patrol_plan: Vec<PatrolRecommendation>,
    pub message: String,
}

/// Query parameters for `GET /api/officers`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OfficerQueryParams {
    pub division: Option<String>,
    pub q: Option<String>,
}

/// An officer with derived display flags.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiOfficer {
    #[serde(flatten)]
    pub officer: Officer,
    #[serde(rename = "isIPS")]
    pub is_ips: bool,
    pub is_head_officer: bool,
}

impl From<Officer> for ApiOfficer {
    fn from(officer: Officer) -> Self {
        Self {
            is_ips: officer.is_ips(),
            is_head_officer: officer.is_head_officer(),
            officer,
        }
    }
}

/// Body of `POST /api/auth/login`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// A dashboard account as returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiUser {
    pub id: i64,
    pub name: String,
    pub role: UserRole,
    pub email: String,
}

/// Response of `POST /api/auth/login`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    /// Bearer token for the `Authorization` header.
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user: ApiUser,
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone as _;

    use super::*;

    #[test]
    fn fir_serializes_with_nested_attachments_key() {
        let record = FirRecord {
            id: 7,
            complainant_name: "Devi".to_string(),
            complainant_address: "4 Salt Pan Road".to_string(),
            complainant_phone: None,
            complainant_email: None,
            incident_date: NaiveDate::from_ymd_opt(2024, 4, 2).unwrap(),
            incident_time: NaiveTime::from_hms_opt(18, 45, 0).unwrap(),
            location: "Salt Pans".to_string(),
            incident_type: "Theft".to_string(),
            description: "Pump stolen".to_string(),
            witnesses: None,
            priority: Priority::Medium,
            status: FirStatus::UnderInvestigation,
            created_at: Utc.with_ymd_and_hms(2024, 4, 2, 19, 0, 0).unwrap(),
            attachments: vec![AttachmentRecord {
                id: 1,
                fir_id: 7,
                file_path: "uploads/1-abc.jpg".to_string(),
                file_type: FileCategory::Image,
                original_name: "pump.jpg".to_string(),
                size_bytes: 10,
            }],
        };

        let json = serde_json::to_value(ApiFir::from(record)).unwrap();
        assert_eq!(json["status"], "under investigation");
        assert_eq!(json["priority"], "Medium");
        assert_eq!(json["incident_date"], "2024-04-02");
        assert_eq!(json["Attachments"][0]["file_path"], "uploads/1-abc.jpg");
        assert_eq!(json["Attachments"][0]["file_type"], "image");
    }

    #[test]
    fn officer_flags_are_flattened() {
        let officer = Officer {
            name: "District SP, IPS".to_string(),
            designation: None,
            division: "Head Officers".to_string(),
            station: None,
            landline: None,
            mobile: None,
            email: Some("sp@example.org".to_string()),
        };
        let json = serde_json::to_value(ApiOfficer::from(officer)).unwrap();
        assert_eq!(json["name"], "District SP, IPS");
        assert_eq!(json["isIPS"], true);
        assert_eq!(json["isHeadOfficer"], true);
        assert!(json.get("station").is_none());
    }
}

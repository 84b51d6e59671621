#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! FIR submission, record, and attachment types.
//!
//! A submission arrives as a loosely-typed [`FirDraft`] (every field is an
//! optional string, exactly as a form posts it). [`FirDraft::validate`]
//! turns it into a [`NewFir`] or a [`ValidationError`] listing every
//! problem at once. Persisted reports come back as [`FirRecord`]s with
//! their [`AttachmentRecord`]s nested.

pub mod search;
pub mod stats;
mod validation;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use crime_dashboard_crime_models::{FirStatus, Priority};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

pub use validation::{FieldError, ValidationError, is_valid_email};

/// Raw FIR submission as received from a form or the CLI.
///
/// Blank values are treated as absent during validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FirDraft {
    pub complainant_name: Option<String>,
    pub complainant_address: Option<String>,
    pub complainant_phone: Option<String>,
    pub complainant_email: Option<String>,
    pub incident_date: Option<String>,
    pub incident_time: Option<String>,
    /// Free-text incident location. The filing form posts this as
    /// `incident_location`.
    #[serde(alias = "incident_location")]
    pub location: Option<String>,
    pub incident_type: Option<String>,
    pub description: Option<String>,
    pub witnesses: Option<String>,
    pub priority: Option<String>,
}

impl FirDraft {
    /// Assigns a form field by name.
    ///
    /// `location` and `incident_location` share a slot. A blank value never
    /// replaces one that is already filled.
    ///
    /// Returns `false` if the name is not a FIR field, in which case the
    /// value is ignored.
    pub fn set_field(&mut self, name: &str, value: String) -> bool {
        let slot = match name {
            "complainant_name" => &mut self.complainant_name,
            "complainant_address" => &mut self.complainant_address,
            "complainant_phone" => &mut self.complainant_phone,
            "complainant_email" => &mut self.complainant_email,
            "incident_date" => &mut self.incident_date,
            "incident_time" => &mut self.incident_time,
            "location" | "incident_location" => &mut self.location,
            "incident_type" => &mut self.incident_type,
            "description" => &mut self.description,
            "witnesses" => &mut self.witnesses,
            "priority" => &mut self.priority,
            _ => return false,
        };
        let filled = slot.as_deref().is_some_and(|v| !v.trim().is_empty());
        if !(filled && value.trim().is_empty()) {
            *slot = Some(value);
        }
        true
    }
}

/// A validated FIR ready to be persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewFir {
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
}

/// Coarse category of an uploaded evidence file.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FileCategory {
    Image,
    Video,
    Audio,
    Document,
    Other,
}

impl FileCategory {
    /// Classifies a file by its extension (without the leading dot).
    #[must_use]
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" | "png" | "gif" | "bmp" | "webp" | "heic" | "tif" | "tiff" => {
                Self::Image
            }
            "mp4" | "mov" | "avi" | "mkv" | "webm" | "3gp" => Self::Video,
            "mp3" | "wav" | "m4a" | "ogg" | "aac" | "amr" => Self::Audio,
            "pdf" | "doc" | "docx" | "txt" | "rtf" | "odt" | "xls" | "xlsx" | "csv" => {
                Self::Document
            }
            _ => Self::Other,
        }
    }

    /// Classifies a file by the extension of `filename`.
    #[must_use]
    pub fn from_filename(filename: &str) -> Self {
        std::path::Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .map_or(Self::Other, Self::from_extension)
    }
}

/// An attachment that has been written to storage but not yet linked to a
/// FIR row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAttachment {
    /// Path relative to the server root, e.g. `uploads/1760000000000-3f2a9c1e.jpg`.
    pub file_path: String,
    pub file_type: FileCategory,
    /// Filename as supplied by the uploader.
    pub original_name: String,
    pub size_bytes: u64,
}

/// An attachment row linked to its FIR.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentRecord {
    pub id: i64,
    pub fir_id: i64,
    pub file_path: String,
    pub file_type: FileCategory,
    pub original_name: String,
    pub size_bytes: u64,
}

/// A persisted FIR with its attachments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FirRecord {
    /// System-assigned, monotonically increasing identifier.
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
    pub created_at: DateTime<Utc>,
    pub attachments: Vec<AttachmentRecord>,
}

impl FirRecord {
    /// Builds the record for a freshly created FIR.
    #[must_use]
    pub fn from_new(
        id: i64,
        fir: NewFir,
        created_at: DateTime<Utc>,
        attachments: Vec<AttachmentRecord>,
    ) -> Self {
        Self {
            id,
            complainant_name: fir.complainant_name,
            complainant_address: fir.complainant_address,
            complainant_phone: fir.complainant_phone,
            complainant_email: fir.complainant_email,
            incident_date: fir.incident_date,
            incident_time: fir.incident_time,
            location: fir.location,
            incident_type: fir.incident_type,
            description: fir.description,
            witnesses: fir.witnesses,
            priority: fir.priority,
            status: FirStatus::Pending,
            created_at,
            attachments,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_field_accepts_form_location_alias() {
        let mut draft = FirDraft::default();
        assert!(draft.set_field("incident_location", "Main Bazaar".to_string()));
        assert_eq!(draft.location.as_deref(), Some("Main Bazaar"));
        assert!(!draft.set_field("evidence", "x".to_string()));
    }

    #[test]
    fn blank_alias_keeps_filled_location() {
        let mut draft = FirDraft::default();
        assert!(draft.set_field("location", "Fishing Harbour".to_string()));
        assert!(draft.set_field("incident_location", "  ".to_string()));
        assert_eq!(draft.location.as_deref(), Some("Fishing Harbour"));

        assert!(draft.set_field("incident_location", "Beach Road".to_string()));
        assert_eq!(draft.location.as_deref(), Some("Beach Road"));

        let mut draft = FirDraft::default();
        assert!(draft.set_field("incident_location", String::new()));
        assert!(draft.set_field("location", "Lighthouse".to_string()));
        assert_eq!(draft.location.as_deref(), Some("Lighthouse"));
    }

    #[test]
    fn draft_deserializes_location_alias() {
        let draft: FirDraft =
            serde_json::from_str(r#"{"incident_location":"Harbour Road"}"#).unwrap();
        assert_eq!(draft.location.as_deref(), Some("Harbour Road"));
    }

    #[test]
    fn file_category_from_filename() {
        assert_eq!(FileCategory::from_filename("scene.JPG"), FileCategory::Image);
        assert_eq!(FileCategory::from_filename("statement.pdf"), FileCategory::Document);
        assert_eq!(FileCategory::from_filename("call.m4a"), FileCategory::Audio);
        assert_eq!(FileCategory::from_filename("cctv.mp4"), FileCategory::Video);
        assert_eq!(FileCategory::from_filename("archive.7z"), FileCategory::Other);
        assert_eq!(FileCategory::from_filename("noext"), FileCategory::Other);
    }
}

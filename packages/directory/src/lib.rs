#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Officer contact directory and hotspot catalog.
//!
//! Both are read-only reference data loaded from a TOML fixture. When no
//! fixture is configured the demo one compiled into the binary is used.

use std::path::Path;

use crime_dashboard_patrol_models::HotspotObservation;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Pseudo-division that matches every officer.
pub const ALL_DIVISIONS: &str = "All";

/// Division holding the district's senior officers.
pub const HEAD_OFFICERS: &str = "Head Officers";

/// Fixture embedded at compile time.
const DEMO_TOML: &str = include_str!("../data/demo.toml");

/// Errors loading a directory fixture.
#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid directory fixture: {0}")]
    Parse(#[from] toml::de::Error),

    /// An officer names a division the fixture does not declare.
    #[error("Officer {officer:?} is in unknown division {division:?}")]
    UnknownDivision { officer: String, division: String },
}

/// A contact entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Officer {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub designation: Option<String>,
    pub division: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub station: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub landline: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mobile: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl Officer {
    /// Whether the officer belongs to the Indian Police Service.
    #[must_use]
    pub fn is_ips(&self) -> bool {
        self.name.contains("IPS")
    }

    #[must_use]
    pub fn is_head_officer(&self) -> bool {
        self.division == HEAD_OFFICERS
    }

    /// Case-insensitive match of `term` against name, station, or e-mail.
    #[must_use]
    pub fn matches(&self, term: &str) -> bool {
        let term = term.trim().to_lowercase();
        if term.is_empty() {
            return true;
        }

        self.name.to_lowercase().contains(&term)
            || self
                .station
                .as_ref()
                .is_some_and(|s| s.to_lowercase().contains(&term))
            || self
                .email
                .as_ref()
                .is_some_and(|e| e.to_lowercase().contains(&term))
    }
}

/// Read access to officer contacts.
pub trait OfficerDirectory: Send + Sync {
    fn officers(&self) -> &[Officer];

    /// Division names, starting with [`ALL_DIVISIONS`].
    fn divisions(&self) -> Vec<String>;

    /// Officers in `division` (any division when `None` or
    /// [`ALL_DIVISIONS`]) matching `term`.
    fn search(&self, division: Option<&str>, term: Option<&str>) -> Vec<Officer> {
        let division = division.filter(|d| !d.is_empty() && *d != ALL_DIVISIONS);
        self.officers()
            .iter()
            .filter(|o| division.is_none_or(|d| o.division == d))
            .filter(|o| term.is_none_or(|t| o.matches(t)))
            .cloned()
            .collect()
    }
}

/// Known crime hotspots.
pub trait HotspotCatalog: Send + Sync {
    fn hotspots(&self) -> &[HotspotObservation];
}

#[derive(Debug, Deserialize)]
struct Fixture {
    #[serde(default)]
    divisions: Vec<String>,
    #[serde(default)]
    officers: Vec<Officer>,
    #[serde(default)]
    hotspots: Vec<HotspotObservation>,
}

/// Directory and catalog loaded once from TOML.
#[derive(Debug, Clone)]
pub struct StaticDirectory {
    divisions: Vec<String>,
    officers: Vec<Officer>,
    hotspots: Vec<HotspotObservation>,
}

impl StaticDirectory {
    /// The built-in demo fixture.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError`] if the embedded fixture is invalid.
    pub fn demo() -> Result<Self, DirectoryError> {
        Self::from_toml(DEMO_TOML)
    }

    /// Loads a fixture file.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError`] if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, DirectoryError> {
        let raw = std::fs::read_to_string(path).map_err(|source| DirectoryError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let directory = Self::from_toml(&raw)?;
        log::info!(
            "Loaded {} officer(s) and {} hotspot(s) from {}",
            directory.officers.len(),
            directory.hotspots.len(),
            path.display()
        );
        Ok(directory)
    }

    /// Parses a fixture.
    ///
    /// If `divisions` is omitted it is derived from the officers in order of
    /// first appearance.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError`] if the TOML is invalid or an officer names
    /// an undeclared division.
    pub fn from_toml(raw: &str) -> Result<Self, DirectoryError> {
        let fixture: Fixture = toml::de::from_str(raw)?;

        let divisions = if fixture.divisions.is_empty() {
            let mut seen: Vec<String> = Vec::new();
            for officer in &fixture.officers {
                if !seen.contains(&officer.division) {
                    seen.push(officer.division.clone());
                }
            }
            seen
        } else {
            if let Some(stray) = fixture
                .officers
                .iter()
                .find(|o| !fixture.divisions.contains(&o.division))
            {
                return Err(DirectoryError::UnknownDivision {
                    officer: stray.name.clone(),
                    division: stray.division.clone(),
                });
            }
            fixture.divisions
        };

        Ok(Self {
            divisions,
            officers: fixture.officers,
            hotspots: fixture.hotspots,
        })
    }
}

impl OfficerDirectory for StaticDirectory {
    fn officers(&self) -> &[Officer] {
        &self.officers
    }

    fn divisions(&self) -> Vec<String> {
        std::iter::once(ALL_DIVISIONS.to_string())
            .chain(self.divisions.iter().cloned())
            .collect()
    }
}

impl HotspotCatalog for StaticDirectory {
    fn hotspots(&self) -> &[HotspotObservation] {
        &self.hotspots
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_fixture_loads() {
        let directory = StaticDirectory::demo().unwrap();
        let divisions = directory.divisions();
        assert_eq!(divisions[0], ALL_DIVISIONS);
        assert_eq!(divisions[1], HEAD_OFFICERS);
        assert_eq!(divisions.len(), 12);
        assert_eq!(directory.hotspots().len(), 5);
        assert_eq!(directory.hotspots()[0].location, "Thoothukudi City");
        assert_eq!(directory.hotspots()[0].incidents, 15);
    }

    #[test]
    fn derived_flags() {
        let directory = StaticDirectory::demo().unwrap();
        let sp = &directory.officers()[0];
        assert!(sp.is_ips());
        assert!(sp.is_head_officer());
        assert!(
            directory
                .search(Some("DCB"), None)
                .iter()
                .all(|o| !o.is_head_officer())
        );
    }

    #[test]
    fn search_filters_by_division_and_term() {
        let directory = StaticDirectory::demo().unwrap();

        assert_eq!(
            directory.search(Some(ALL_DIVISIONS), None).len(),
            directory.officers().len()
        );
        assert_eq!(directory.search(None, None).len(), directory.officers().len());

        let harbour = directory.search(Some("Thoothukudi"), Some("HARBOUR"));
        assert_eq!(harbour.len(), 1);
        assert_eq!(harbour[0].station.as_deref(), Some("Harbour PS"));

        let by_email = directory.search(None, Some("dcb@"));
        assert_eq!(by_email.len(), 1);
        assert_eq!(by_email[0].division, "DCB");

        assert!(directory.search(Some("Kovilpatti"), Some("harbour")).is_empty());
    }

    #[test]
    fn divisions_derived_when_omitted() {
        let directory = StaticDirectory::from_toml(
            r#"
            [[officers]]
            name = "A"
            division = "North"

            [[officers]]
            name = "B"
            division = "South"

            [[officers]]
            name = "C"
            division = "North"
            "#,
        )
        .unwrap();
        assert_eq!(directory.divisions(), vec!["All", "North", "South"]);
        assert!(directory.hotspots().is_empty());
    }

    #[test]
    fn rejects_undeclared_division() {
        let err = StaticDirectory::from_toml(
            r#"
            divisions = ["North"]

            [[officers]]
            name = "A"
            division = "East"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, DirectoryError::UnknownDivision { .. }));
    }
}

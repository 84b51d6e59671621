#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Shared taxonomy types for the crime dashboard.
//!
//! This crate defines the vocabulary every other crate agrees on: the
//! three-tier [`Priority`] used by both FIRs and patrol recommendations,
//! the [`FirStatus`] lifecycle with its legal transitions, and the
//! [`UserRole`] that gates investigator actions.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Priority tier shared by FIRs and patrol recommendations.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[strum(ascii_case_insensitive)]
pub enum Priority {
    /// Routine handling.
    Low,
    /// Default tier for newly filed reports.
    #[default]
    Medium,
    /// Needs immediate attention.
    High,
}

impl Priority {
    /// Returns all variants of this enum, lowest first.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Low, Self::Medium, Self::High]
    }
}

/// Lifecycle state of a First Information Report.
///
/// A report starts as [`FirStatus::Pending`] and only ever moves forward:
/// `pending` → `under investigation` → `resolved`.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[strum(ascii_case_insensitive)]
pub enum FirStatus {
    /// Filed but not yet picked up.
    #[default]
    #[serde(rename = "pending")]
    #[strum(serialize = "pending")]
    Pending,
    /// An investigator is working the case.
    #[serde(rename = "under investigation")]
    #[strum(to_string = "under investigation", serialize = "under_investigation")]
    UnderInvestigation,
    /// Terminal state.
    #[serde(rename = "resolved")]
    #[strum(serialize = "resolved")]
    Resolved,
}

impl FirStatus {
    /// Returns all variants in lifecycle order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Pending, Self::UnderInvestigation, Self::Resolved]
    }

    /// Returns the state that follows this one, or `None` if terminal.
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::Pending => Some(Self::UnderInvestigation),
            Self::UnderInvestigation => Some(Self::Resolved),
            Self::Resolved => None,
        }
    }

    /// Whether no further transitions are possible.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Resolved)
    }

    /// Validates a transition from `self` to `target`.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidTransitionError`] unless `target` is the immediate
    /// successor of `self`.
    pub fn transition_to(self, target: Self) -> Result<Self, InvalidTransitionError> {
        if self.next() == Some(target) {
            Ok(target)
        } else {
            Err(InvalidTransitionError {
                from: self,
                to: target,
            })
        }
    }
}

/// Error returned when a status change skips a step, goes backwards, or
/// leaves a terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("cannot move a FIR from \"{from}\" to \"{to}\"")]
pub struct InvalidTransitionError {
    /// Current status.
    pub from: FirStatus,
    /// Requested status.
    pub to: FirStatus,
}

/// Role of a dashboard account.
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
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum UserRole {
    /// Full access, including account management.
    Admin,
    /// May move FIRs through their lifecycle.
    Investigator,
    /// Read-only dashboard access.
    User,
}

impl UserRole {
    /// Whether this role may change the status of a FIR.
    #[must_use]
    pub const fn can_update_status(self) -> bool {
        matches!(self, Self::Admin | Self::Investigator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_walks_forward_only() {
        assert_eq!(
            FirStatus::Pending.transition_to(FirStatus::UnderInvestigation),
            Ok(FirStatus::UnderInvestigation)
        );
        assert_eq!(
            FirStatus::UnderInvestigation.transition_to(FirStatus::Resolved),
            Ok(FirStatus::Resolved)
        );
        assert!(
            FirStatus::Pending
                .transition_to(FirStatus::Resolved)
                .is_err()
        );
        assert!(
            FirStatus::Resolved
                .transition_to(FirStatus::Pending)
                .is_err()
        );
        assert!(
            FirStatus::Pending
                .transition_to(FirStatus::Pending)
                .is_err()
        );
    }

    #[test]
    fn invalid_transition_names_both_states() {
        let err = FirStatus::Pending
            .transition_to(FirStatus::Resolved)
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "cannot move a FIR from \"pending\" to \"resolved\""
        );
        let _: &dyn std::error::Error = &err;
    }

    #[test]
    fn resolved_is_the_only_terminal_state() {
        for status in FirStatus::all() {
            assert_eq!(status.is_terminal(), status.next().is_none());
        }
        assert!(FirStatus::Resolved.is_terminal());
    }

    #[test]
    fn status_string_forms_match_wire_format() {
        assert_eq!(FirStatus::UnderInvestigation.to_string(), "under investigation");
        assert_eq!(
            "Under Investigation".parse::<FirStatus>(),
            Ok(FirStatus::UnderInvestigation)
        );
        assert_eq!(
            serde_json::to_string(&FirStatus::Pending).unwrap(),
            "\"pending\""
        );
    }

    #[test]
    fn priority_parses_case_insensitively() {
        assert_eq!("high".parse::<Priority>(), Ok(Priority::High));
        assert_eq!("MEDIUM".parse::<Priority>(), Ok(Priority::Medium));
        assert!("urgent".parse::<Priority>().is_err());
        assert_eq!(Priority::default(), Priority::Medium);
        assert!(Priority::Low < Priority::High);
    }

    #[test]
    fn only_staff_roles_update_status() {
        assert!(UserRole::Admin.can_update_status());
        assert!(UserRole::Investigator.can_update_status());
        assert!(!UserRole::User.can_update_status());
        assert_eq!("investigator".parse::<UserRole>(), Ok(UserRole::Investigator));
    }
}

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Patrol allocation for crime hotspots.
//!
//! The [`scorer`] is a pure function from hotspot observations to staffing
//! recommendations. Around it sit two optional layers that never influence
//! the numbers it produces:
//!
//! - [`cache::PatrolPlanCache`] keeps the most recent plan until it is
//!   replaced or explicitly invalidated.
//! - [`progress`] replays the step-by-step narration the dashboard shows
//!   while a plan is "being computed", over a channel separate from the
//!   result.

pub mod cache;
pub mod progress;
pub mod scorer;

pub use scorer::{recommend, score, score_inputs};

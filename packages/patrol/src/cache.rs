//! Holds the most recently computed patrol plan.
//!
//! The cache never computes anything itself. A new allocation request
//! always recomputes and then [`PatrolPlanCache::replace`]s the entry;
//! readers see either the latest plan or nothing after
//! [`PatrolPlanCache::invalidate`].

use std::sync::{PoisonError, RwLock};

use chrono::{DateTime, Utc};
use crime_dashboard_patrol_models::PatrolRecommendation;
use serde::{Deserialize, Serialize};

/// A plan together with when it was computed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedPlan {
    pub patrol_plan: Vec<PatrolRecommendation>,
    pub computed_at: DateTime<Utc>,
    /// Number of hotspots the plan was computed from.
    pub hotspot_count: usize,
}

/// Single-entry cache of the latest plan.
#[derive(Debug, Default)]
pub struct PatrolPlanCache {
    entry: RwLock<Option<CachedPlan>>,
}

impl PatrolPlanCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `plan` as the latest plan, discarding any previous one.
    pub fn replace(&self, plan: Vec<PatrolRecommendation>) -> CachedPlan {
        let cached = CachedPlan {
            hotspot_count: plan.len(),
            patrol_plan: plan,
            computed_at: Utc::now(),
        };
        *self.entry.write().unwrap_or_else(PoisonError::into_inner) = Some(cached.clone());
        log::debug!(
            "Cached patrol plan with {} recommendation(s)",
            cached.patrol_plan.len()
        );
        cached
    }

    /// Returns the latest plan, if any.
    #[must_use]
    pub fn latest(&self) -> Option<CachedPlan> {
        self.entry
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Drops the cached plan. Returns whether there was one.
    pub fn invalidate(&self) -> bool {
        self.entry
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .is_some()
    }
}

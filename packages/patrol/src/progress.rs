//! Step-by-step narration of an allocation, sent over a channel.
//!
//! The plan is computed before narration starts and is delivered intact in
//! [`AllocationEvent::Plan`]; the progress steps are purely cosmetic.

use std::time::Duration;

use crime_dashboard_patrol_models::PatrolRecommendation;
use serde::Serialize;
use tokio::sync::mpsc;

/// Messages shown while an allocation is "in progress".
pub const PROGRESS_STEPS: &[&str] = &[
    "Analyzing crime data...",
    "Identifying high-risk areas...",
    "Calculating optimal patrol times...",
    "Allocating officers to locations...",
];

/// Message attached to a finished allocation.
pub const COMPLETION_MESSAGE: &str = "Patrol allocation created successfully.";

/// Events emitted while narrating an allocation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AllocationEvent {
    /// A narration step.
    Progress {
        /// 1-based step number.
        step: usize,
        /// Total number of steps.
        total: usize,
        message: String,
    },
    /// The computed plan.
    Plan {
        #[serde(rename = "patrolPlan")]
        patrol_plan: Vec<PatrolRecommendation>,
    },
    /// Narration finished.
    Done { message: String },
    /// The request could not be scored.
    Error { message: String },
}

impl AllocationEvent {
    /// Server-sent event name for this event.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Progress { .. } => "progress",
            Self::Plan { .. } => "plan",
            Self::Done { .. } => "done",
            Self::Error { .. } => "error",
        }
    }
}

/// Sends the progress steps spaced by `step_delay`, then the plan, then
/// [`AllocationEvent::Done`].
///
/// Stops early without error if the receiver is dropped.
pub async fn narrate(
    plan: Vec<PatrolRecommendation>,
    tx: mpsc::Sender<AllocationEvent>,
    step_delay: Duration,
) {
    let total = PROGRESS_STEPS.len();

    for (i, message) in PROGRESS_STEPS.iter().enumerate() {
        log::debug!("{message}");
        let event = AllocationEvent::Progress {
            step: i + 1,
            total,
            message: (*message).to_string(),
        };
        if tx.send(event).await.is_err() {
            log::debug!("Progress receiver dropped after {i} step(s)");
            return;
        }
        if !step_delay.is_zero() {
            tokio::time::sleep(step_delay).await;
        }
    }

    if tx
        .send(AllocationEvent::Plan { patrol_plan: plan })
        .await
        .is_err()
    {
        return;
    }

    let _ = tx
        .send(AllocationEvent::Done {
            message: COMPLETION_MESSAGE.to_string(),
        })
        .await;
}

#[cfg(test)]
mod tests {
    use crime_dashboard_patrol_models::HotspotObservation;

    use super::*;
    use crate::score;

    #[tokio::test]
    async fn emits_steps_then_plan_then_done() {
        let plan = score(&[HotspotObservation {
            location: "Bus Stand".to_string(),
            lat: 8.8,
            lng: 78.15,
            incidents: 11,
        }]);

        let (tx, mut rx) = mpsc::channel(16);
        narrate(plan.clone(), tx, Duration::ZERO).await;

        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }

        assert_eq!(events.len(), PROGRESS_STEPS.len() + 2);
        for (i, event) in events.iter().take(PROGRESS_STEPS.len()).enumerate() {
            assert_eq!(
                event,
                &AllocationEvent::Progress {
                    step: i + 1,
                    total: PROGRESS_STEPS.len(),
                    message: PROGRESS_STEPS[i].to_string(),
                }
            );
        }
        assert_eq!(
            events[PROGRESS_STEPS.len()],
            AllocationEvent::Plan { patrol_plan: plan }
        );
        assert_eq!(events.last().map(AllocationEvent::name), Some("done"));
    }

    #[tokio::test]
    async fn dropped_receiver_stops_narration() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        narrate(Vec::new(), tx, Duration::from_millis(1)).await;
    }

    #[test]
    fn events_serialize_with_type_tag() {
        let json = serde_json::to_value(AllocationEvent::Progress {
            step: 1,
            total: 4,
            message: "Analyzing crime data...".to_string(),
        })
        .unwrap();
        assert_eq!(json["type"], "progress");
        assert_eq!(json["step"], 1);
    }
}

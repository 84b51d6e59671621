//! Threshold scoring of hotspots.

use crime_dashboard_crime_models::Priority;
use crime_dashboard_patrol_models::{
    AFTERNOON_WINDOW, EVENING_WINDOW, HotspotInput, HotspotObservation, PatrolRecommendation,
    ScoringInputError,
};

/// Incident count at which a hotspot becomes [`Priority::High`].
pub const HIGH_THRESHOLD: u32 = 10;

/// Incident count at which a hotspot becomes [`Priority::Medium`].
pub const MEDIUM_THRESHOLD: u32 = 5;

/// Fewest officers ever recommended.
pub const MIN_OFFICERS: u32 = 2;

/// Most officers ever recommended.
pub const MAX_OFFICERS: u32 = 6;

/// One officer per this many incidents, rounded up, before clamping.
const INCIDENTS_PER_OFFICER: u32 = 3;

/// Priority tier for an incident count.
#[must_use]
pub const fn priority_for(incidents: u32) -> Priority {
    if incidents >= HIGH_THRESHOLD {
        Priority::High
    } else if incidents >= MEDIUM_THRESHOLD {
        Priority::Medium
    } else {
        Priority::Low
    }
}

/// `ceil(incidents / 3)` clamped to `[MIN_OFFICERS, MAX_OFFICERS]`.
#[must_use]
pub fn officers_for(incidents: u32) -> u32 {
    incidents
        .div_ceil(INCIDENTS_PER_OFFICER)
        .clamp(MIN_OFFICERS, MAX_OFFICERS)
}

/// Patrol window for a priority tier.
#[must_use]
pub const fn window_for(priority: Priority) -> &'static str {
    match priority {
        Priority::High => EVENING_WINDOW,
        Priority::Medium | Priority::Low => AFTERNOON_WINDOW,
    }
}

/// Recommendation for a single hotspot.
#[must_use]
pub fn recommend(hotspot: &HotspotObservation) -> PatrolRecommendation {
    let priority = priority_for(hotspot.incidents);

    PatrolRecommendation {
        location: hotspot.location.clone(),
        lat: hotspot.lat,
        lng: hotspot.lng,
        recommended_officers: officers_for(hotspot.incidents),
        recommended_time: window_for(priority).to_string(),
        priority,
    }
}

/// Scores every hotspot, preserving order.
#[must_use]
pub fn score(hotspots: &[HotspotObservation]) -> Vec<PatrolRecommendation> {
    hotspots.iter().map(recommend).collect()
}

/// Validates raw client input and scores it.
///
/// Either every hotspot is valid and the full plan is returned, or the
/// first invalid hotspot is reported and nothing is scored.
///
/// # Errors
///
/// Returns [`ScoringInputError`] for the first hotspot with a missing,
/// negative, or non-integer incident count.
pub fn score_inputs(
    inputs: Vec<HotspotInput>,
) -> Result<Vec<PatrolRecommendation>, ScoringInputError> {
    let observations = inputs
        .into_iter()
        .enumerate()
        .map(|(i, input)| input.into_observation(i))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(score(&observations))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hotspot(location: &str, incidents: u32) -> HotspotObservation {
        HotspotObservation {
            location: location.to_string(),
            lat: 8.7642,
            lng: 78.1348,
            incidents,
        }
    }

    #[test]
    fn priority_thresholds() {
        for n in 0..5 {
            assert_eq!(priority_for(n), Priority::Low, "n = {n}");
        }
        for n in 5..10 {
            assert_eq!(priority_for(n), Priority::Medium, "n = {n}");
        }
        for n in [10, 11, 50, 1_000, u32::MAX] {
            assert_eq!(priority_for(n), Priority::High, "n = {n}");
        }
    }

    #[test]
    fn officers_stay_within_bounds_and_never_decrease() {
        let mut previous = officers_for(0);
        for n in 0..=200 {
            let officers = officers_for(n);
            assert!((MIN_OFFICERS..=MAX_OFFICERS).contains(&officers), "n = {n}");
            assert!(officers >= previous, "officers dropped at n = {n}");
            previous = officers;
        }
        assert_eq!(officers_for(u32::MAX), MAX_OFFICERS);
    }

    #[test]
    fn zero_incidents_gets_the_minimum() {
        let rec = recommend(&hotspot("Quiet Lane", 0));
        assert_eq!(rec.recommended_officers, 2);
        assert_eq!(rec.priority, Priority::Low);
        assert_eq!(rec.recommended_time, AFTERNOON_WINDOW);
    }

    #[test]
    fn worked_example() {
        let plan = score(&[hotspot("A", 12), hotspot("B", 6), hotspot("C", 2)]);

        let summary: Vec<_> = plan
            .iter()
            .map(|r| {
                (
                    r.location.as_str(),
                    r.recommended_officers,
                    r.priority,
                    r.recommended_time.as_str(),
                )
            })
            .collect();

        assert_eq!(
            summary,
            vec![
                ("A", 4, Priority::High, "18:00-22:00"),
                ("B", 2, Priority::Medium, "16:00-20:00"),
                ("C", 2, Priority::Low, "16:00-20:00"),
            ]
        );
    }

    #[test]
    fn output_preserves_length_and_order() {
        assert!(score(&[]).is_empty());

        let input: Vec<_> = (0..25)
            .map(|i| hotspot(&format!("spot-{i}"), (i * 7) % 19))
            .collect();
        let plan = score(&input);
        assert_eq!(plan.len(), input.len());
        for (h, r) in input.iter().zip(&plan) {
            assert_eq!(h.location, r.location);
            assert!((h.lat - r.lat).abs() < f64::EPSILON);
            assert!((h.lng - r.lng).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn invalid_input_rejects_the_whole_request() {
        let inputs = vec![
            HotspotInput::from(hotspot("ok", 3)),
            HotspotInput {
                location: "bad".to_string(),
                lat: 0.0,
                lng: 0.0,
                incidents: serde_json::json!(-1),
            },
        ];
        let err = score_inputs(inputs).unwrap_err();
        assert_eq!(err.index, 1);
        assert_eq!(err.location, "bad");
    }

    #[test]
    fn valid_raw_input_scores() {
        let inputs = vec![HotspotInput::from(hotspot("Thoothukudi City", 15))];
        let plan = score_inputs(inputs).unwrap();
        assert_eq!(plan[0].recommended_officers, 5);
        assert_eq!(plan[0].priority, Priority::High);
    }
}

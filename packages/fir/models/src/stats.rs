//! Aggregate statistics over the FIR store.

use std::collections::BTreeMap;

use crime_dashboard_crime_models::{FirStatus, Priority};
use serde::{Deserialize, Serialize};

use crate::FirRecord;

/// A labelled count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelCount {
    pub label: String,
    pub count: u64,
}

/// Cases filed for one incident month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyCount {
    /// `YYYY-MM`.
    pub month: String,
    pub cases: u64,
    pub resolved: u64,
    pub unresolved: u64,
}

/// Dashboard statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FirStats {
    pub total: u64,
    /// One entry per [`FirStatus`], in lifecycle order.
    pub by_status: Vec<LabelCount>,
    /// One entry per [`Priority`], lowest first.
    pub by_priority: Vec<LabelCount>,
    /// Incident types by descending count, then name.
    pub by_incident_type: Vec<LabelCount>,
    /// Incident months in ascending order.
    pub monthly: Vec<MonthlyCount>,
}

impl FirStats {
    /// Computes statistics directly from records.
    #[must_use]
    pub fn from_records(records: &[FirRecord]) -> Self {
        let mut status: BTreeMap<FirStatus, u64> = BTreeMap::new();
        let mut priority: BTreeMap<Priority, u64> = BTreeMap::new();
        let mut types: BTreeMap<String, u64> = BTreeMap::new();
        let mut months: BTreeMap<String, (u64, u64)> = BTreeMap::new();

        for r in records {
            *status.entry(r.status).or_default() += 1;
            *priority.entry(r.priority).or_default() += 1;
            *types.entry(r.incident_type.clone()).or_default() += 1;

            let month = months
                .entry(r.incident_date.format("%Y-%m").to_string())
                .or_default();
            month.0 += 1;
            if r.status == FirStatus::Resolved {
                month.1 += 1;
            }
        }

        Self::assemble(
            records.len() as u64,
            &status,
            &priority,
            types,
            months,
        )
    }

    /// Builds the statistics from pre-aggregated counts.
    ///
    /// `months` maps `YYYY-MM` to `(cases, resolved)`.
    #[must_use]
    pub fn assemble(
        total: u64,
        status: &BTreeMap<FirStatus, u64>,
        priority: &BTreeMap<Priority, u64>,
        types: BTreeMap<String, u64>,
        months: BTreeMap<String, (u64, u64)>,
    ) -> Self {
        let by_status = FirStatus::all()
            .iter()
            .map(|s| LabelCount {
                label: s.to_string(),
                count: status.get(s).copied().unwrap_or(0),
            })
            .collect();

        let by_priority = Priority::all()
            .iter()
            .map(|p| LabelCount {
                label: p.to_string(),
                count: priority.get(p).copied().unwrap_or(0),
            })
            .collect();

        let mut by_incident_type: Vec<LabelCount> = types
            .into_iter()
            .map(|(label, count)| LabelCount { label, count })
            .collect();
        by_incident_type.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.label.cmp(&b.label)));

        let monthly = months
            .into_iter()
            .map(|(month, (cases, resolved))| MonthlyCount {
                month,
                cases,
                resolved,
                unresolved: cases.saturating_sub(resolved),
            })
            .collect();

        Self {
            total,
            by_status,
            by_priority,
            by_incident_type,
            monthly,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveTime, Utc};

    use super::*;

    fn record(id: i64, kind: &str, date: (i32, u32, u32), status: FirStatus) -> FirRecord {
        FirRecord {
            id,
            complainant_name: "Name".to_string(),
            complainant_address: "Address".to_string(),
            complainant_phone: None,
            complainant_email: None,
            incident_date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
            incident_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            location: "Somewhere".to_string(),
            incident_type: kind.to_string(),
            description: "Description".to_string(),
            witnesses: None,
            priority: Priority::High,
            status,
            created_at: Utc::now(),
            attachments: Vec::new(),
        }
    }

    #[test]
    fn aggregates_by_every_dimension() {
        let records = vec![
            record(1, "Theft", (2024, 1, 5), FirStatus::Resolved),
            record(2, "Theft", (2024, 1, 20), FirStatus::Pending),
            record(3, "Assault", (2024, 2, 2), FirStatus::UnderInvestigation),
        ];
        let stats = FirStats::from_records(&records);

        assert_eq!(stats.total, 3);
        assert_eq!(
            stats
                .by_status
                .iter()
                .map(|c| (c.label.as_str(), c.count))
                .collect::<Vec<_>>(),
            vec![("pending", 1), ("under investigation", 1), ("resolved", 1)]
        );
        assert_eq!(stats.by_priority[2].count, 3);
        assert_eq!(stats.by_incident_type[0].label, "Theft");
        assert_eq!(stats.by_incident_type[0].count, 2);
        assert_eq!(
            stats.monthly[0],
            MonthlyCount {
                month: "2024-01".to_string(),
                cases: 2,
                resolved: 1,
                unresolved: 1,
            }
        );
        assert_eq!(stats.monthly[1].month, "2024-02");
    }

    #[test]
    fn empty_store_has_zeroed_tiers() {
        let stats = FirStats::from_records(&[]);
        assert_eq!(stats.total, 0);
        assert_eq!(stats.by_status.len(), 3);
        assert!(stats.by_status.iter().all(|c| c.count == 0));
        assert!(stats.monthly.is_empty());
    }
}

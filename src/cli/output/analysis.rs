use std::collections::HashMap;

use crate::{
    tracker::storage::entities::Record,
    utils::{
        percentage::{seconds_percentage, Percentage},
        time::format_hours_minutes,
    },
};

/// Time summed over every session of one activity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityUsage {
    pub activity_type: String,
    pub duration: i64,
    pub sessions: usize,
}

impl ActivityUsage {
    fn new(activity_type: String) -> Self {
        Self {
            activity_type,
            duration: 0,
            sessions: 0,
        }
    }
}

/// Everything the dashboard shows above the charts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardSummary {
    pub total_seconds: i64,
    pub total_sessions: usize,
    /// In order of first appearance.
    pub by_activity: Vec<ActivityUsage>,
    pub most_active: Option<String>,
}

impl DashboardSummary {
    pub fn activities_tracked(&self) -> usize {
        self.by_activity.len()
    }

    pub fn total_display(&self) -> String {
        format_hours_minutes(self.total_seconds)
    }

    pub fn most_active_display(&self) -> &str {
        self.most_active.as_deref().unwrap_or("None")
    }

    pub fn share(&self, usage: &ActivityUsage) -> Option<Percentage> {
        seconds_percentage(usage.duration, self.total_seconds)
    }
}

pub fn total_tracked(records: &[Record]) -> i64 {
    records.iter().map(|v| v.duration).sum()
}

/// Sums durations per activity. Activities keep the order in which they were first recorded.
pub fn time_by_activity(records: &[Record]) -> Vec<ActivityUsage> {
    let mut positions = HashMap::<&str, usize>::new();
    let mut usages = Vec::<ActivityUsage>::new();

    for record in records {
        let index = *positions
            .entry(record.activity_type.as_str())
            .or_insert_with(|| {
                usages.push(ActivityUsage::new(record.activity_type.clone()));
                usages.len() - 1
            });
        let usage = &mut usages[index];
        usage.duration += record.duration;
        usage.sessions += 1;
    }

    usages
}

/// Activity with the largest total. On a tie the one recorded first wins.
pub fn most_active(usages: &[ActivityUsage]) -> Option<&ActivityUsage> {
    usages.iter().fold(None, |best, usage| match best {
        Some(best) if best.duration >= usage.duration => Some(best),
        _ => Some(usage),
    })
}

pub fn summarize(records: &[Record]) -> DashboardSummary {
    let by_activity = time_by_activity(records);
    let most_active = most_active(&by_activity).map(|v| v.activity_type.clone());

    DashboardSummary {
        total_seconds: total_tracked(records),
        total_sessions: records.len(),
        by_activity,
        most_active,
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use crate::tracker::storage::entities::Record;

    use super::{most_active, summarize, time_by_activity, total_tracked, ActivityUsage};

    fn records(values: &[(&str, i64)]) -> Vec<Record> {
        let start = Utc.with_ymd_and_hms(2024, 4, 5, 12, 0, 0).unwrap();
        values
            .iter()
            .enumerate()
            .map(|(i, (activity, duration))| Record {
                id: i.to_string(),
                activity_type: activity.to_string(),
                duration: *duration,
                end_time: start + Duration::minutes(i as i64),
            })
            .collect()
    }

    fn usage(activity: &str, duration: i64, sessions: usize) -> ActivityUsage {
        ActivityUsage {
            activity_type: activity.into(),
            duration,
            sessions,
        }
    }

    #[test]
    fn dashboard_scenario() {
        let records = records(&[("A", 1800), ("B", 900), ("A", 300)]);

        let summary = summarize(&records);

        assert_eq!(summary.total_seconds, 3000);
        assert_eq!(summary.total_display(), "0h 50m");
        assert_eq!(
            summary.by_activity,
            vec![usage("A", 2100, 2), usage("B", 900, 1)]
        );
        assert_eq!(summary.most_active_display(), "A");
        assert_eq!(summary.total_sessions, 3);
        assert_eq!(summary.activities_tracked(), 2);
        assert_eq!(summary.share(&summary.by_activity[0]).unwrap().to_string(), "70%");
    }

    #[test]
    fn empty_dashboard() {
        let summary = summarize(&[]);

        assert_eq!(summary.total_display(), "0h 0m");
        assert_eq!(summary.most_active_display(), "None");
        assert_eq!(summary.total_sessions, 0);
        assert!(summary.by_activity.is_empty());
    }

    #[test]
    fn activity_sums_add_up_to_total() {
        let sets = [
            records(&[]),
            records(&[("Gym", 0)]),
            records(&[("MBA", 60), ("Gym", 45), ("Cooking", 3600), ("MBA", 1), ("Gym", 7)]),
            records(&[("A", -30), ("B", 30), ("", 12)]),
        ];

        for set in sets {
            let by_activity: i64 = time_by_activity(&set).iter().map(|v| v.duration).sum();
            assert_eq!(by_activity, total_tracked(&set));
        }
    }

    #[test]
    fn recomputing_gives_same_result() {
        let records = records(&[("MBA", 60), ("Gym", 45), ("MBA", 1)]);
        assert_eq!(summarize(&records), summarize(&records));
    }

    #[test]
    fn tie_goes_to_first_seen() {
        let records = records(&[("Gym", 600), ("MBA", 300), ("MBA", 300)]);
        let usages = time_by_activity(&records);

        assert_eq!(most_active(&usages).unwrap().activity_type, "Gym");
    }

    #[test]
    fn larger_total_wins_regardless_of_order() {
        let records = records(&[("Gym", 600), ("MBA", 300), ("MBA", 301)]);
        let usages = time_by_activity(&records);

        assert_eq!(most_active(&usages).unwrap().activity_type, "MBA");
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Categories offered by the timer. Any other label is still a valid activity.
pub const DEFAULT_ACTIVITIES: [&str; 5] = ["MBA", "Business Idea", "Gym", "Cooking", "Job Search"];

/// A completed tracked session, as stored in the record slot.
#[derive(PartialEq, Eq, Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    pub id: String,
    pub activity_type: String,
    /// Seconds actually tracked. Can be less than the configured countdown if the session was
    /// stopped early.
    pub duration: i64,
    pub end_time: DateTime<Utc>,
}

/// A session that hasn't been given an id yet. This is what producers hand to the
/// [RecordStore](super::record_store::RecordStore).
#[derive(PartialEq, Eq, Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct NewRecord {
    pub activity_type: String,
    pub duration: i64,
    pub end_time: DateTime<Utc>,
}

impl NewRecord {
    pub fn with_id(self, id: String) -> Record {
        Record {
            id,
            activity_type: self.activity_type,
            duration: self.duration,
            end_time: self.end_time,
        }
    }
}

pub fn is_default_activity(activity: &str) -> bool {
    DEFAULT_ACTIVITIES.contains(&activity)
}

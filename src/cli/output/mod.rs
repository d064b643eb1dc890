//! Everything the dashboard derives from the record list. All of it is recomputed from scratch
//! on every call, nothing is cached between reads.

pub mod analysis;
pub mod buckets;

use chrono::{DateTime, TimeZone};

use crate::tracker::storage::entities::Record;

use self::{
    analysis::{summarize, DashboardSummary},
    buckets::{bucket_series, records_in_current_range, BucketSeries, RangeGranularity},
};

pub struct DashboardConfig {
    pub range: RangeGranularity,
    /// Only use records that ended inside the current range instead of all of them.
    pub current_only: bool,
}

#[derive(Debug, PartialEq, Eq)]
pub struct Dashboard {
    pub summary: DashboardSummary,
    pub series: BucketSeries,
}

pub fn build_dashboard<Tz: TimeZone>(
    records: &[Record],
    config: &DashboardConfig,
    now: &DateTime<Tz>,
) -> Dashboard {
    if config.current_only {
        let records = records_in_current_range(records, config.range, now);
        derive(&records, config.range, now)
    } else {
        derive(records, config.range, now)
    }
}

fn derive<Tz: TimeZone>(
    records: &[Record],
    range: RangeGranularity,
    now: &DateTime<Tz>,
) -> Dashboard {
    Dashboard {
        summary: summarize(records),
        series: bucket_series(records, range, now),
    }
}

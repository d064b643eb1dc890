use std::fmt::Display;

use chrono::{DateTime, Datelike, Days, Months, NaiveDate, NaiveTime, TimeZone, Timelike};
use clap::ValueEnum;
use now::DateTimeNow;
use tracing::{instrument, trace};

use crate::tracker::storage::entities::Record;

const WEEKDAYS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

/// Range shown by the stacked chart. Each range has a fixed number of buckets and every record
/// falls into exactly one of them, decided by its end time.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum RangeGranularity {
    /// 24 buckets, one per hour of the day.
    Day,
    /// 7 buckets, Monday to Sunday.
    Week,
    /// 4 buckets by day of month. Days 29 to 31 are counted into the 4th week.
    Month,
    /// 3 buckets by position of the month inside its quarter.
    Quarter,
}

impl Display for RangeGranularity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RangeGranularity::Day => write!(f, "day"),
            RangeGranularity::Week => write!(f, "week"),
            RangeGranularity::Month => write!(f, "month"),
            RangeGranularity::Quarter => write!(f, "quarter"),
        }
    }
}

impl RangeGranularity {
    pub fn bucket_count(self) -> usize {
        match self {
            RangeGranularity::Day => 24,
            RangeGranularity::Week => 7,
            RangeGranularity::Month => 4,
            RangeGranularity::Quarter => 3,
        }
    }

    pub fn bucket_of<Tz: TimeZone>(self, moment: &DateTime<Tz>) -> usize {
        match self {
            RangeGranularity::Day => moment.hour() as usize,
            RangeGranularity::Week => moment.weekday().num_days_from_monday() as usize,
            RangeGranularity::Month => usize::min(moment.day0() as usize / 7, 3),
            RangeGranularity::Quarter => moment.month0() as usize % 3,
        }
    }

    /// Bucket names. They name positions only, records from any period share the buckets.
    pub fn labels(self) -> Vec<String> {
        match self {
            RangeGranularity::Day => (0..24).map(|hour| format!("{hour:02}:00")).collect(),
            RangeGranularity::Week => WEEKDAYS.iter().map(|v| v.to_string()).collect(),
            RangeGranularity::Month => (1..=4).map(|week| format!("Week {week}")).collect(),
            RangeGranularity::Quarter => (1..=3).map(|month| format!("Month {month}")).collect(),
        }
    }

    /// Start of the day/week/month/quarter `now` is in.
    pub fn range_start<Tz: TimeZone>(self, now: &DateTime<Tz>) -> DateTime<Tz> {
        let day_start = now.clone().beginning_of_day();
        let first_day = match self {
            RangeGranularity::Day => return day_start,
            RangeGranularity::Week => return now.clone().beginning_of_week(),
            RangeGranularity::Month => NaiveDate::from_ymd_opt(now.year(), now.month(), 1),
            RangeGranularity::Quarter => {
                NaiveDate::from_ymd_opt(now.year(), now.month0() / 3 * 3 + 1, 1)
            }
        };
        first_day
            .and_then(|date| {
                now.timezone()
                    .from_local_datetime(&date.and_time(NaiveTime::MIN))
                    .earliest()
            })
            .unwrap_or(day_start)
    }

    /// Start of the next day/week/month/quarter. `None` past the end of representable time.
    pub fn range_end<Tz: TimeZone>(self, now: &DateTime<Tz>) -> Option<DateTime<Tz>> {
        let start = self.range_start(now);
        match self {
            RangeGranularity::Day => start.checked_add_days(Days::new(1)),
            RangeGranularity::Week => start.checked_add_days(Days::new(7)),
            RangeGranularity::Month => start.checked_add_months(Months::new(1)),
            RangeGranularity::Quarter => start.checked_add_months(Months::new(3)),
        }
    }
}

/// Dense `bucket x activity` matrix of tracked seconds, the data behind the stacked chart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketSeries {
    pub granularity: RangeGranularity,
    pub labels: Vec<String>,
    /// Column order, by first appearance.
    pub activities: Vec<String>,
    /// `cells[bucket][activity]`. Every bucket has a value for every activity.
    pub cells: Vec<Vec<i64>>,
}

impl BucketSeries {
    pub fn value(&self, bucket: usize, activity: &str) -> Option<i64> {
        let column = self.activities.iter().position(|v| v == activity)?;
        self.cells.get(bucket).map(|row| row[column])
    }

    pub fn bucket_totals(&self) -> Vec<i64> {
        self.cells.iter().map(|row| row.iter().sum()).collect()
    }

    pub fn max_bucket_total(&self) -> i64 {
        self.bucket_totals().into_iter().max().unwrap_or(0)
    }
}

/// Groups `records` into the buckets of `granularity`. End times are read in the timezone of
/// `now`.
#[instrument(skip(records, now))]
pub fn bucket_series<Tz: TimeZone>(
    records: &[Record],
    granularity: RangeGranularity,
    now: &DateTime<Tz>,
) -> BucketSeries {
    let timezone = now.timezone();

    let mut activities: Vec<String> = vec![];
    for record in records {
        if !activities.contains(&record.activity_type) {
            activities.push(record.activity_type.clone());
        }
    }

    let mut cells = vec![vec![0i64; activities.len()]; granularity.bucket_count()];
    for record in records {
        let local = record.end_time.with_timezone(&timezone);
        let bucket = granularity.bucket_of(&local);
        let column = activities
            .iter()
            .position(|v| *v == record.activity_type)
            .unwrap_or_default();
        trace!("{} {:?} -> bucket {bucket}", record.activity_type, local);
        cells[bucket][column] += record.duration;
    }

    BucketSeries {
        granularity,
        labels: granularity.labels(),
        activities,
        cells,
    }
}

/// Records that ended inside the current day/week/month/quarter. Records ending in a later
/// period are left out as well.
pub fn records_in_current_range<Tz: TimeZone>(
    records: &[Record],
    granularity: RangeGranularity,
    now: &DateTime<Tz>,
) -> Vec<Record> {
    let start = granularity.range_start(now);
    let end = granularity.range_end(now);
    records
        .iter()
        .filter(|v| v.end_time >= start && end.as_ref().map_or(true, |end| v.end_time < *end))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Duration, FixedOffset, TimeZone, Utc};

    use crate::tracker::storage::entities::Record;

    use super::{bucket_series, records_in_current_range, BucketSeries, RangeGranularity};

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    fn column(series: &BucketSeries, activity: &str) -> Option<Vec<i64>> {
        let column = series.activities.iter().position(|v| v == activity)?;
        Some(series.cells.iter().map(|row| row[column]).collect())
    }

    fn record(activity: &str, duration: i64, end_time: DateTime<Utc>) -> Record {
        Record {
            id: end_time.timestamp_millis().to_string(),
            activity_type: activity.into(),
            duration,
            end_time,
        }
    }

    #[test]
    fn day_buckets_by_hour() {
        let records = [
            record("A", 600, at(2024, 4, 5, 9, 15)),
            record("A", 300, at(2024, 4, 5, 9, 50)),
            record("B", 900, at(2024, 4, 5, 14, 0)),
        ];

        let series = bucket_series(&records, RangeGranularity::Day, &at(2024, 4, 5, 18, 0));

        assert_eq!(series.cells.len(), 24);
        assert_eq!(series.activities, vec!["A", "B"]);
        assert_eq!(series.cells[9], vec![900, 0]);
        assert_eq!(series.cells[14], vec![0, 900]);
        assert_eq!(series.value(10, "B"), Some(0));
        assert_eq!(series.labels[9], "09:00");
        assert!(series.cells.iter().all(|row| row.len() == 2));
    }

    #[test]
    fn week_buckets_by_weekday() {
        let records = [
            // Friday
            record("Gym", 60, at(2024, 4, 5, 7, 0)),
            // Sunday
            record("Gym", 30, at(2024, 4, 7, 7, 0)),
            // Monday
            record("MBA", 45, at(2024, 4, 8, 20, 0)),
        ];

        let series = bucket_series(&records, RangeGranularity::Week, &at(2024, 4, 8, 21, 0));

        assert_eq!(series.bucket_totals(), vec![45, 0, 0, 0, 60, 0, 30]);
        assert_eq!(series.labels[0], "Mon");
        assert_eq!(series.labels[6], "Sun");
    }

    #[test]
    fn month_buckets_by_week_of_month() {
        let records = [
            record("A", 1, at(2024, 3, 1, 12, 0)),
            record("A", 2, at(2024, 3, 7, 12, 0)),
            record("A", 4, at(2024, 3, 8, 12, 0)),
            record("A", 8, at(2024, 3, 28, 12, 0)),
            record("A", 16, at(2024, 3, 31, 12, 0)),
        ];

        let series = bucket_series(&records, RangeGranularity::Month, &at(2024, 3, 31, 13, 0));

        assert_eq!(series.bucket_totals(), vec![3, 4, 0, 24]);
    }

    #[test]
    fn quarter_buckets_by_month() {
        let records = [
            record("A", 10, at(2024, 4, 2, 12, 0)),
            record("B", 20, at(2024, 6, 30, 12, 0)),
            record("A", 40, at(2024, 12, 1, 12, 0)),
        ];

        let series = bucket_series(&records, RangeGranularity::Quarter, &at(2024, 5, 10, 0, 0));

        assert_eq!(series.labels, vec!["Month 1", "Month 2", "Month 3"]);
        assert_eq!(column(&series, "A"), Some(vec![10, 0, 40]));
        assert_eq!(column(&series, "B"), Some(vec![0, 0, 20]));
        assert_eq!(column(&series, "C"), None);
    }

    #[test]
    fn empty_records_give_zero_buckets() {
        for granularity in [
            RangeGranularity::Day,
            RangeGranularity::Week,
            RangeGranularity::Month,
            RangeGranularity::Quarter,
        ] {
            let series = bucket_series(&[], granularity, &at(2024, 4, 5, 12, 0));

            assert_eq!(series.cells.len(), granularity.bucket_count());
            assert_eq!(series.labels.len(), granularity.bucket_count());
            assert!(series.bucket_totals().iter().all(|v| *v == 0));
            assert_eq!(series.max_bucket_total(), 0);
        }
    }

    #[test]
    fn buckets_follow_timezone() {
        let offset = FixedOffset::east_opt(2 * 3600).unwrap();
        let records = [record("A", 60, at(2024, 4, 5, 23, 30))];
        let now = at(2024, 4, 6, 8, 0).with_timezone(&offset);

        let series = bucket_series(&records, RangeGranularity::Day, &now);

        assert_eq!(series.value(1, "A"), Some(60));
    }

    #[test]
    fn every_record_lands_in_one_bucket() {
        let records = (0..50)
            .map(|i| {
                let activity = if i % 3 == 0 { "A" } else { "B" };
                record(activity, i, at(2024, 1, 1, 0, 0) + Duration::hours(i * 37))
            })
            .collect::<Vec<_>>();
        let total: i64 = records.iter().map(|v| v.duration).sum();

        for granularity in [
            RangeGranularity::Day,
            RangeGranularity::Week,
            RangeGranularity::Month,
            RangeGranularity::Quarter,
        ] {
            let series = bucket_series(&records, granularity, &at(2024, 4, 5, 12, 0));
            assert_eq!(series.bucket_totals().iter().sum::<i64>(), total);
        }
    }

    #[test]
    fn current_range_filter() {
        let now = at(2024, 4, 5, 12, 0);
        let records = [
            record("A", 1, at(2024, 4, 5, 8, 0)),
            record("A", 1, at(2024, 4, 4, 23, 0)),
            // Tuesday of the same week
            record("A", 1, at(2024, 4, 2, 10, 0)),
            // Thursday of the previous week
            record("A", 1, at(2024, 3, 28, 10, 0)),
            record("A", 1, at(2024, 1, 3, 10, 0)),
        ];

        let count = |granularity| records_in_current_range(&records, granularity, &now).len();

        assert_eq!(count(RangeGranularity::Day), 1);
        assert_eq!(count(RangeGranularity::Week), 3);
        assert_eq!(count(RangeGranularity::Month), 3);
        assert_eq!(count(RangeGranularity::Quarter), 3);
    }

    #[test]
    fn current_range_leaves_out_later_records() {
        let now = at(2024, 5, 10, 12, 0);
        let records = [
            record("A", 1, at(2024, 5, 10, 9, 0)),
            // logged with an end time later today
            record("A", 1, at(2024, 5, 10, 20, 0)),
            record("A", 1, at(2024, 5, 11, 9, 0)),
            record("A", 1, at(2024, 7, 1, 0, 0)),
        ];

        let count = |granularity| records_in_current_range(&records, granularity, &now).len();

        assert_eq!(count(RangeGranularity::Day), 2);
        assert_eq!(count(RangeGranularity::Month), 3);
        assert_eq!(count(RangeGranularity::Quarter), 3);
    }

    #[test]
    fn range_end_of_quarter() {
        let end = RangeGranularity::Quarter.range_end(&at(2024, 5, 10, 9, 0));
        assert_eq!(end, Some(at(2024, 7, 1, 0, 0)));
    }

    #[test]
    fn range_start_of_quarter() {
        let start = RangeGranularity::Quarter.range_start(&at(2024, 5, 10, 9, 0));
        assert_eq!(start, at(2024, 4, 1, 0, 0));
    }
}

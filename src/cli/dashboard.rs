use ansi_term::{
    Colour::{self, Blue, Cyan, Purple, Red, Yellow},
    Style,
};
use anyhow::Result;
use chrono::{Duration, Local};
use clap::Parser;

use crate::utils::time::{format_duration, rounded_hours};

use super::{
    output::{
        analysis::DashboardSummary,
        buckets::{BucketSeries, RangeGranularity},
        build_dashboard, DashboardConfig,
    },
    CliStore,
};

const BAR_WIDTH: i64 = 40;

/// Same order as the pie chart colours of the web dashboard.
const PALETTE: [Colour; 5] = [Red, Blue, Yellow, Cyan, Purple];

#[derive(Debug, Parser)]
pub struct DashboardCommand {
    #[arg(
        short,
        long,
        default_value_t = RangeGranularity::Week,
        help = "Range of the breakdown. Day groups sessions by hour, week by weekday, month by week and quarter by month"
    )]
    range: RangeGranularity,
    #[arg(
        short,
        long,
        help = "Only count sessions that ended in the current day, week, month or quarter"
    )]
    current: bool,
}

/// Command to process `dashboard` command. Everything is derived again from the stored sessions.
pub fn process_dashboard_command(
    DashboardCommand { range, current }: DashboardCommand,
    store: &CliStore,
) -> Result<()> {
    let now = Local::now();
    let dashboard = build_dashboard(
        store.list(),
        &DashboardConfig {
            range,
            current_only: current,
        },
        &now,
    );

    print_summary(&dashboard.summary);
    println!();
    print_activities(&dashboard.summary);
    println!();
    print_series(&dashboard.series);
    Ok(())
}

fn print_summary(summary: &DashboardSummary) {
    let title = Style::new().bold();
    println!("{}", title.paint("Dashboard"));
    println!("{:<22}{}", "Total time tracked", summary.total_display());
    println!("{:<22}{}", "Total sessions", summary.total_sessions);
    println!("{:<22}{}", "Activities tracked", summary.activities_tracked());
    println!("{:<22}{}", "Most active", summary.most_active_display());
}

fn print_activities(summary: &DashboardSummary) {
    println!("{}", Style::new().bold().paint("Time spent by activity"));
    if summary.by_activity.is_empty() {
        println!("No sessions yet");
        return;
    }

    let max = summary
        .by_activity
        .iter()
        .map(|v| v.duration)
        .max()
        .unwrap_or(0);
    let name_width = label_width(summary.by_activity.iter().map(|v| v.activity_type.as_str()));

    for (index, usage) in summary.by_activity.iter().enumerate() {
        let share = summary
            .share(usage)
            .map(|v| v.to_string())
            .unwrap_or_else(|| "-".into());
        println!(
            "{:<name_width$}  {:>4}  {:>3}h  {:>10}  {}",
            usage.activity_type,
            share,
            rounded_hours(usage.duration),
            format_duration(Duration::seconds(usage.duration)),
            colour(index).paint(bar(usage.duration, max)),
        );
    }
}

fn print_series(series: &BucketSeries) {
    println!(
        "{}",
        Style::new()
            .bold()
            .paint(format!("Time spent per {}", series.granularity))
    );

    let legend = series
        .activities
        .iter()
        .enumerate()
        .map(|(index, activity)| colour(index).paint(activity.as_str()).to_string())
        .collect::<Vec<_>>()
        .join("  ");
    if !legend.is_empty() {
        println!("{legend}");
    }

    let max = series.max_bucket_total();
    let label_width = label_width(series.labels.iter().map(String::as_str));
    for (label, row) in series.labels.iter().zip(series.cells.iter()) {
        let total: i64 = row.iter().sum();
        let stacked = row
            .iter()
            .enumerate()
            .map(|(index, value)| colour(index).paint(bar(*value, max)).to_string())
            .collect::<String>();
        println!(
            "{:<label_width$}  {:>10}  {}",
            label,
            format_duration(Duration::seconds(total)),
            stacked
        );
    }
}

fn colour(index: usize) -> Colour {
    PALETTE[index % PALETTE.len()]
}

fn label_width<'a>(labels: impl Iterator<Item = &'a str>) -> usize {
    labels.map(|v| v.chars().count()).max().unwrap_or(0)
}

/// Bar scaled against `max`. Negative values don't draw anything.
fn bar(value: i64, max: i64) -> String {
    if max <= 0 || value <= 0 {
        return String::new();
    }
    let length = value * BAR_WIDTH / max;
    "█".repeat(length as usize)
}

#[cfg(test)]
mod tests {
    use super::{bar, label_width, BAR_WIDTH};

    #[test]
    fn bars_scale_to_largest_value() {
        assert_eq!(bar(10, 10).chars().count(), BAR_WIDTH as usize);
        assert_eq!(bar(5, 10).chars().count(), BAR_WIDTH as usize / 2);
        assert_eq!(bar(0, 10), "");
        assert_eq!(bar(-5, 10), "");
        assert_eq!(bar(5, 0), "");
    }

    #[test]
    fn label_width_counts_characters() {
        assert_eq!(label_width(["Gym", "Job Search"].into_iter()), 10);
        assert_eq!(label_width(std::iter::empty()), 0);
    }
}

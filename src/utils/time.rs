use chrono::Duration;

/// Dashboard style total, `"{hours}h {minutes}m"`. Both parts are floored, so leftover seconds
/// are dropped and negative totals round down.
pub fn format_hours_minutes(total_seconds: i64) -> String {
    format!(
        "{}h {}m",
        total_seconds.div_euclid(3600),
        (total_seconds % 3600).div_euclid(60)
    )
}

/// Countdown style display, `HH:MM:SS`.
pub fn format_clock(seconds: u32) -> String {
    format!(
        "{:02}:{:02}:{:02}",
        seconds / 3600,
        (seconds % 3600) / 60,
        seconds % 60
    )
}

/// Compact duration used in listings, e.g. `1h5m3s`, `12m0s`, `40s`.
pub fn format_duration(v: Duration) -> String {
    if v.num_hours() > 0 {
        format!(
            "{}h{}m{}s",
            v.num_hours(),
            v.num_minutes() % 60,
            v.num_seconds() % 60
        )
    } else if v.num_minutes() > 0 {
        format!("{}m{}s", v.num_minutes() % 60, v.num_seconds() % 60)
    } else {
        format!("{}s", v.num_seconds() % 60)
    }
}

/// Hours rounded half away from zero, the unit the activity bars are labelled in.
pub fn rounded_hours(seconds: i64) -> i64 {
    (seconds as f64 / 3600.).round() as i64
}

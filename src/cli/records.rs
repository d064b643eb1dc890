use std::fmt::Display;

use ansi_term::Colour::Green;
use anyhow::Result;
use chrono::{DateTime, Duration, Local, Utc};
use chrono_english::parse_date_string;
use clap::{CommandFactory, Parser, ValueEnum};
use tracing::warn;

use crate::{
    tracker::storage::entities::{is_default_activity, NewRecord},
    utils::time::format_duration,
};

use super::{Args, CliStore};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum DateStyle {
    Uk,
    Us,
}

impl From<DateStyle> for chrono_english::Dialect {
    fn from(value: DateStyle) -> Self {
        match value {
            DateStyle::Uk => Self::Uk,
            DateStyle::Us => Self::Us,
        }
    }
}

impl Display for DateStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DateStyle::Uk => write!(f, "uk"),
            DateStyle::Us => write!(f, "us"),
        }
    }
}

#[derive(Debug, Parser)]
pub struct LogCommand {
    #[arg(short, long, help = "Activity the time was spent on")]
    activity: String,
    #[arg(short, long, help = "Tracked time in minutes")]
    minutes: u32,
    #[arg(
        short,
        long,
        help = "When the session ended, now by default. Examples are \"1 hour ago\", \"yesterday 18:00\", \"15/03/2025\", \"12:00 16/03/2025\""
    )]
    end: Option<String>,
    #[arg(long, default_value_t = DateStyle::Uk, help = "Style of dates used during parsing. For Uk it's day/month/year. For Us it's month/day/year")]
    date_style: DateStyle,
}

#[derive(Debug, Parser)]
pub struct ListCommand {
    #[arg(long, help = "Print the records as stored, a JSON array")]
    json: bool,
}

/// Command to process `log` command. Adds a session the same way a finished timer does.
pub async fn process_log_command(
    LogCommand {
        activity,
        minutes,
        end,
        date_style,
    }: LogCommand,
    store: &mut CliStore,
) -> Result<()> {
    let end_time = parse_end(end, date_style, Local::now())?;

    if !is_default_activity(&activity) {
        warn!("{activity} is not one of the suggested activities");
    }

    let record = store
        .add(NewRecord {
            activity_type: activity,
            duration: i64::from(minutes) * 60,
            end_time,
        })
        .await?;

    println!(
        "{} {} of {} ending {}",
        Green.bold().paint("Saved"),
        format_duration(Duration::seconds(record.duration)),
        record.activity_type,
        record.end_time.with_timezone(&Local).format("%x %H:%M")
    );
    Ok(())
}

/// Command to process `list` command.
pub fn process_list_command(ListCommand { json }: ListCommand, store: &CliStore) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(store.list())?);
        return Ok(());
    }

    for record in store.list() {
        println!(
            "{}\t{}\t{}\t{}",
            record.end_time.with_timezone(&Local).format("%x %H:%M"),
            format_duration(Duration::seconds(record.duration)),
            record.activity_type,
            record.id
        );
    }
    Ok(())
}

fn parse_end(
    end: Option<String>,
    date_style: DateStyle,
    now: DateTime<Local>,
) -> Result<DateTime<Utc>> {
    let Some(end) = end else {
        return Ok(now.to_utc());
    };

    match parse_date_string(&end, now, date_style.into()) {
        Ok(v) => Ok(v.to_utc()),
        Err(e) => Err(Args::command()
            .error(
                clap::error::ErrorKind::ValueValidation,
                format!("Failed to validate end date {e}"),
            )
            .into()),
    }
}

use std::{io::Write, sync::Arc};

use ansi_term::Colour::{Green, Red, Yellow};
use ansi_term::Style;
use anyhow::Result;
use chrono::Duration;
use clap::{CommandFactory, Parser};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_stream::{wrappers::LinesStream, StreamExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::{
    tracker::{
        session::{SessionUpdate, TimerCommand, TimerSession},
        shutdown::detect_shutdown,
        storage::entities::{is_default_activity, DEFAULT_ACTIVITIES},
        timer::{Timer, TimerState, DEFAULT_DURATION_MINUTES, DURATION_CHOICES},
    },
    utils::{
        clock::{Clock, DefaultClock},
        time::format_duration,
    },
};

use super::{Args, CliStore};

#[derive(Debug, Parser)]
pub struct CountdownCommand {
    #[arg(
        short,
        long,
        default_value = DEFAULT_ACTIVITIES[0],
        help = "Activity to track. Suggested ones are MBA, Business Idea, Gym, Cooking and Job Search, but any name works"
    )]
    activity: String,
    #[arg(
        short,
        long,
        default_value_t = DEFAULT_DURATION_MINUTES,
        help = "Countdown length in minutes. Usual choices go from 15 to 120 in steps of 15"
    )]
    minutes: u32,
}

/// Command to process `timer` command. Runs an interactive countdown driven by lines typed into
/// stdin, and saves the finished session into the store.
pub async fn process_timer_command(
    CountdownCommand { activity, minutes }: CountdownCommand,
    store: &mut CliStore,
) -> Result<()> {
    if !is_default_activity(&activity) {
        warn!("{activity} is not one of the suggested activities");
    }
    if !DURATION_CHOICES.contains(&minutes) {
        debug!("Using a custom duration of {minutes} minutes");
    }

    let timer = Timer::new(activity, minutes).map_err(|e| {
        Args::command().error(
            clap::error::ErrorKind::ValueValidation,
            format!("Can't create a timer: {e}"),
        )
    })?;

    let clock: Arc<dyn Clock> = Arc::new(DefaultClock);
    let mut session = TimerSession::new(timer, store, clock);

    let shutdown = CancellationToken::new();
    let signals = tokio::spawn(detect_shutdown(shutdown.clone()));

    let commands = LinesStream::new(BufReader::new(tokio::io::stdin()).lines())
        .filter_map(|line| line.ok())
        .map(|line| line.parse::<TimerCommand>());

    print_help();
    print_status(session.timer());

    let result = session.run(commands, shutdown.clone(), print_update).await;

    shutdown.cancel();
    signals.await?;
    result
}

fn print_update(timer: &Timer, update: &SessionUpdate) {
    match update {
        SessionUpdate::Ticked { .. } => {
            print!("\r{}  {}   ", Style::new().bold().paint(timer.display()), timer.activity_type());
            flush_progress(&mut std::io::stdout());
        }
        SessionUpdate::Finished => {
            println!();
            println!("{}", Yellow.bold().paint("Time is up!"));
            print_save_prompt(timer);
        }
        SessionUpdate::Changed(TimerState::AwaitingSave) => {
            println!();
            print_save_prompt(timer);
        }
        SessionUpdate::Changed(_) => print_status(timer),
        SessionUpdate::Saved(record) => {
            println!(
                "{} {} of {}",
                Green.bold().paint("Saved"),
                format_duration(Duration::seconds(record.duration)),
                record.activity_type
            );
            print_status(timer);
        }
        SessionUpdate::Discarded => {
            println!("Session discarded");
            print_status(timer);
        }
        SessionUpdate::Rejected(e) => println!("{}", Red.paint(e.to_string())),
        SessionUpdate::Unrecognized(e) => {
            println!("{}", Red.paint(e.to_string()));
            print_help();
        }
        SessionUpdate::SaveFailed(e) => {
            println!("{} {e}", Red.bold().paint("Couldn't save the session:"));
            println!("Answer y to retry or n to discard it");
        }
        SessionUpdate::Quit => println!(),
    }
}

fn print_status(timer: &Timer) {
    println!(
        "{}  {}  [{}]",
        Style::new().bold().paint(timer.display()),
        timer.activity_type(),
        timer.state()
    );
}

fn print_save_prompt(timer: &Timer) {
    println!(
        "Save {} of {}? [y/n]",
        format_duration(Duration::seconds(i64::from(timer.elapsed_seconds()))),
        timer.activity_type()
    );
}

fn print_help() {
    println!(
        "Enter toggles start/pause. Other commands: s start, p pause, x stop, r reset, \
         a <activity>, d <minutes>, ? status, q quit"
    );
}

/// The progress line has no newline, so it only shows up after a flush. A failed flush just
/// delays the redraw.
fn flush_progress(out: &mut impl Write) {
    if let Err(e) = out.flush() {
        debug!("Couldn't flush the countdown line {e}");
    }
}

pub mod dashboard;
pub mod output;
pub mod records;
pub mod timer;

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand};
use dashboard::{process_dashboard_command, DashboardCommand};
use records::{process_list_command, process_log_command, ListCommand, LogCommand};
use timer::{process_timer_command, CountdownCommand};
use tracing::{debug, level_filters::LevelFilter};

use crate::{
    tracker::storage::{
        record_store::RecordStore,
        slot::{FileSlot, MemorySlot, SlotStorage},
    },
    utils::{
        clock::DefaultClock,
        dir::{create_application_default_path, ensure_dir},
        logging::{enable_logging, CLI_PREFIX},
    },
};

#[derive(Parser, Debug)]
#[command(name = "Tallytime", version, long_about = None)]
#[command(about = "Countdown timer and dashboard for the time you spend on activities", long_about = None)]
struct Args {
    #[command(subcommand)]
    commands: Commands,
    #[arg(long, help = "Enable logging")]
    log: bool,
    #[arg(
        long,
        help = "Application directory. By default tries to save into $XDG_STATE_HOME or $HOME/.local/state"
    )]
    dir: Option<PathBuf>,
    #[arg(
        long,
        help = "Keep sessions in memory only. Nothing is read from or written to the records file"
    )]
    ephemeral: bool,
}

#[derive(Subcommand, Debug)]
#[command(version, about, long_about = None)]
enum Commands {
    #[command(about = "Run a countdown for an activity and save it as a session")]
    Timer {
        #[command(flatten)]
        command: CountdownCommand,
    },
    #[command(about = "Display totals and a per-range breakdown of saved sessions")]
    Dashboard {
        #[command(flatten)]
        command: DashboardCommand,
    },
    #[command(about = "Record a session without running the timer")]
    Log {
        #[command(flatten)]
        command: LogCommand,
    },
    #[command(about = "Print saved sessions in the order they were recorded")]
    List {
        #[command(flatten)]
        command: ListCommand,
    },
}

/// Store used by every command. The slot is boxed so `--ephemeral` can swap the file for memory.
pub type CliStore = RecordStore<Box<dyn SlotStorage>>;

pub async fn run_cli() -> Result<()> {
    let args = Args::parse();

    let app_dir = match args.dir {
        Some(dir) => ensure_dir(dir)?,
        None => create_application_default_path()?,
    };

    let logging_level = if args.log {
        Some(LevelFilter::TRACE)
    } else {
        None
    };
    enable_logging(CLI_PREFIX, &app_dir, logging_level, args.log)?;

    let mut store = open_store(&app_dir, args.ephemeral).await?;

    match args.commands {
        Commands::Timer { command } => process_timer_command(command, &mut store).await,
        Commands::Dashboard { command } => process_dashboard_command(command, &store),
        Commands::Log { command } => process_log_command(command, &mut store).await,
        Commands::List { command } => process_list_command(command, &store),
    }
}

async fn open_store(app_dir: &Path, ephemeral: bool) -> Result<CliStore> {
    let slot: Box<dyn SlotStorage> = if ephemeral {
        Box::new(MemorySlot::new())
    } else {
        let slot = FileSlot::in_dir(app_dir);
        debug!("Records are kept in {:?}", slot.path());
        Box::new(slot)
    };
    RecordStore::load(slot, Box::new(DefaultClock)).await
}

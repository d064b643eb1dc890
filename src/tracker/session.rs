use std::{str::FromStr, sync::Arc};

use anyhow::Result;
use tokio::sync::mpsc;
use tokio_stream::{Stream, StreamExt};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::utils::clock::Clock;

use super::{
    storage::{entities::Record, record_store::RecordStore, slot::SlotStorage},
    ticker::{Tick, Ticker, TICK_PERIOD},
    timer::{TickOutcome, Timer, TimerError, TimerState},
};

const TICK_BUFFER: usize = 4;

/// Everything the user can ask of a running timer session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimerCommand {
    Toggle,
    Start,
    Pause,
    Stop,
    Reset,
    Save,
    Discard,
    Activity(String),
    Duration(u32),
    Status,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandParseError {
    #[error("unknown command `{0}`")]
    Unknown(String),
    #[error("`{0}` needs an argument")]
    MissingArgument(&'static str),
    #[error("`{0}` is not a number of minutes")]
    InvalidMinutes(String),
}

impl FromStr for TimerCommand {
    type Err = CommandParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (name, argument) = match s.split_once(char::is_whitespace) {
            Some((name, argument)) => (name, argument.trim()),
            None => (s, ""),
        };

        let command = match name.to_lowercase().as_str() {
            "" | "t" | "toggle" => TimerCommand::Toggle,
            "s" | "start" => TimerCommand::Start,
            "p" | "pause" => TimerCommand::Pause,
            "x" | "stop" => TimerCommand::Stop,
            "r" | "reset" => TimerCommand::Reset,
            "y" | "yes" | "save" => TimerCommand::Save,
            "n" | "no" | "discard" => TimerCommand::Discard,
            "?" | "status" => TimerCommand::Status,
            "q" | "quit" | "exit" => TimerCommand::Quit,
            "a" | "activity" => {
                if argument.is_empty() {
                    return Err(CommandParseError::MissingArgument("activity"));
                }
                TimerCommand::Activity(argument.to_string())
            }
            "d" | "duration" => {
                if argument.is_empty() {
                    return Err(CommandParseError::MissingArgument("duration"));
                }
                let minutes = argument
                    .parse::<u32>()
                    .map_err(|_| CommandParseError::InvalidMinutes(argument.to_string()))?;
                TimerCommand::Duration(minutes)
            }
            _ => return Err(CommandParseError::Unknown(s.to_string())),
        };
        Ok(command)
    }
}

/// What happened in response to a command or a tick.
#[derive(Debug)]
pub enum SessionUpdate {
    Changed(TimerState),
    Ticked { remaining: u32 },
    /// Countdown ran out, a save decision is pending.
    Finished,
    Saved(Record),
    Discarded,
    Rejected(TimerError),
    Unrecognized(CommandParseError),
    /// Session was complete but the store couldn't persist it. The timer keeps waiting for a
    /// save decision so it can be retried.
    SaveFailed(String),
    Quit,
}

struct RunningTicks {
    _ticker: Ticker,
    receiver: mpsc::Receiver<Tick>,
}

/// Connects a [Timer] to the tick schedule and to the [RecordStore].
///
/// The only invariant it maintains on top of the timer: a tick schedule exists if and only if the
/// timer is running. Every transition goes through [TimerSession::reconcile_ticks], and every
/// schedule gets its own channel, so ticks from a cancelled schedule can't leak into the next one.
pub struct TimerSession<'a, S> {
    timer: Timer,
    store: &'a mut RecordStore<S>,
    clock: Arc<dyn Clock>,
    ticks: Option<RunningTicks>,
}

impl<'a, S: SlotStorage> TimerSession<'a, S> {
    pub fn new(timer: Timer, store: &'a mut RecordStore<S>, clock: Arc<dyn Clock>) -> Self {
        Self {
            timer,
            store,
            clock,
            ticks: None,
        }
    }

    pub fn timer(&self) -> &Timer {
        &self.timer
    }

    pub fn store(&self) -> &RecordStore<S> {
        &*self.store
    }

    pub fn is_ticking(&self) -> bool {
        self.ticks.is_some()
    }

    /// Applies a single command. Only a failed save returns an error, invalid transitions are
    /// reported as [SessionUpdate::Rejected].
    pub async fn apply(&mut self, command: TimerCommand) -> Result<SessionUpdate> {
        info!("Applying {command:?} while {}", self.timer.state());
        let result = match command {
            TimerCommand::Toggle => self.timer.toggle().map(|_| self.changed()),
            TimerCommand::Start => self.timer.start().map(|_| self.changed()),
            TimerCommand::Pause => self.timer.pause().map(|_| self.changed()),
            TimerCommand::Stop => self.timer.stop().map(|_| self.changed()),
            TimerCommand::Reset => self.timer.reset().map(|_| self.changed()),
            TimerCommand::Discard => self.timer.cancel().map(|_| SessionUpdate::Discarded),
            TimerCommand::Activity(activity) => {
                self.timer.set_activity(activity).map(|_| self.changed())
            }
            TimerCommand::Duration(minutes) => {
                self.timer.set_duration(minutes).map(|_| self.changed())
            }
            TimerCommand::Status => Ok(self.changed()),
            TimerCommand::Quit => {
                if self.timer.elapsed_seconds() > 0 {
                    warn!(
                        "Quitting with {}s of unsaved {}",
                        self.timer.elapsed_seconds(),
                        self.timer.activity_type()
                    );
                }
                self.ticks = None;
                Ok(SessionUpdate::Quit)
            }
            TimerCommand::Save => {
                let pending = self.timer.clone();
                match self.timer.save(self.clock.time()) {
                    Ok(entry) => match self.store.add(entry).await {
                        Ok(record) => Ok(SessionUpdate::Saved(record)),
                        Err(e) => {
                            self.timer = pending;
                            self.reconcile_ticks();
                            return Err(e);
                        }
                    },
                    Err(e) => Err(e),
                }
            }
        };

        if !matches!(result, Ok(SessionUpdate::Quit)) {
            self.reconcile_ticks();
        }
        Ok(result.unwrap_or_else(SessionUpdate::Rejected))
    }

    /// Waits for the next tick and applies it. Never resolves while the timer isn't running.
    pub async fn next_tick(&mut self) -> SessionUpdate {
        let tick = self.recv_tick().await;
        self.on_tick(tick)
    }

    /// Drives the session until [TimerCommand::Quit], the end of `commands`, or `shutdown`.
    /// `output` sees the timer after every update.
    pub async fn run<C>(
        &mut self,
        commands: C,
        shutdown: CancellationToken,
        mut output: impl FnMut(&Timer, &SessionUpdate),
    ) -> Result<()>
    where
        C: Stream<Item = Result<TimerCommand, CommandParseError>>,
    {
        let mut commands = std::pin::pin!(commands);
        loop {
            let update = tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("Shutdown requested");
                    self.apply(TimerCommand::Quit).await?
                }
                tick = self.recv_tick() => self.on_tick(tick),
                command = commands.next() => match command {
                    Some(Ok(command)) => match self.apply(command).await {
                        Ok(update) => update,
                        Err(e) => {
                            error!("Couldn't save session {e:?}");
                            SessionUpdate::SaveFailed(format!("{e:#}"))
                        }
                    },
                    Some(Err(e)) => SessionUpdate::Unrecognized(e),
                    None => self.apply(TimerCommand::Quit).await?,
                },
            };

            output(&self.timer, &update);
            if matches!(update, SessionUpdate::Quit) {
                return Ok(());
            }
        }
    }

    fn changed(&self) -> SessionUpdate {
        SessionUpdate::Changed(self.timer.state())
    }

    async fn recv_tick(&mut self) -> Option<Tick> {
        match self.ticks.as_mut() {
            Some(ticks) => ticks.receiver.recv().await,
            None => std::future::pending().await,
        }
    }

    fn on_tick(&mut self, tick: Option<Tick>) -> SessionUpdate {
        let update = match tick {
            Some(Tick) => match self.timer.tick() {
                TickOutcome::Counting { remaining } => SessionUpdate::Ticked { remaining },
                TickOutcome::Finished => {
                    info!("Countdown for {} finished", self.timer.activity_type());
                    SessionUpdate::Finished
                }
                TickOutcome::Ignored => self.changed(),
            },
            None => {
                warn!("Tick schedule ended unexpectedly, restarting it");
                self.ticks = None;
                self.changed()
            }
        };
        self.reconcile_ticks();
        update
    }

    fn reconcile_ticks(&mut self) {
        match (self.timer.is_running(), self.ticks.is_some()) {
            (true, false) => {
                let (sender, receiver) = mpsc::channel(TICK_BUFFER);
                let ticker = Ticker::spawn(sender, self.clock.clone(), TICK_PERIOD);
                self.ticks = Some(RunningTicks {
                    _ticker: ticker,
                    receiver,
                });
            }
            (false, true) => {
                self.ticks = None;
            }
            (true, true) | (false, false) => {}
        }
    }
}

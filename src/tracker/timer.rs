use std::fmt::Display;

use chrono::{DateTime, Utc};
use tracing::{debug, trace};

use crate::utils::time::format_clock;

use super::storage::entities::NewRecord;

/// Countdown lengths offered by the timer, in minutes.
pub const DURATION_CHOICES: [u32; 8] = [15, 30, 45, 60, 75, 90, 105, 120];

pub const DEFAULT_DURATION_MINUTES: u32 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerState {
    Idle,
    Running,
    Paused,
    /// Stopped by the user or by reaching zero. The session is waiting for a save or discard
    /// decision.
    AwaitingSave,
}

impl Display for TimerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TimerState::Idle => write!(f, "idle"),
            TimerState::Running => write!(f, "running"),
            TimerState::Paused => write!(f, "paused"),
            TimerState::AwaitingSave => write!(f, "awaiting save"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TimerError {
    #[error("can't {action} while the timer is {state}")]
    InvalidTransition {
        action: &'static str,
        state: TimerState,
    },
    #[error("duration must be at least one minute")]
    ZeroDuration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The tick arrived while the timer wasn't running.
    Ignored,
    Counting { remaining: u32 },
    /// Countdown reached zero, the timer now waits for a save decision.
    Finished,
}

/// State machine of a single countdown. It knows nothing about scheduling, every second is
/// delivered to it through [Timer::tick].
#[derive(Debug, Clone)]
pub struct Timer {
    activity_type: String,
    configured_seconds: u32,
    remaining_seconds: u32,
    state: TimerState,
}

impl Timer {
    pub fn new(activity_type: impl Into<String>, minutes: u32) -> Result<Self, TimerError> {
        let configured_seconds = minutes_to_seconds(minutes)?;
        Ok(Self {
            activity_type: activity_type.into(),
            configured_seconds,
            remaining_seconds: configured_seconds,
            state: TimerState::Idle,
        })
    }

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn activity_type(&self) -> &str {
        &self.activity_type
    }

    pub fn configured_seconds(&self) -> u32 {
        self.configured_seconds
    }

    pub fn remaining_seconds(&self) -> u32 {
        self.remaining_seconds
    }

    pub fn elapsed_seconds(&self) -> u32 {
        self.configured_seconds - self.remaining_seconds
    }

    pub fn is_running(&self) -> bool {
        self.state == TimerState::Running
    }

    /// Remaining time as `HH:MM:SS`.
    pub fn display(&self) -> String {
        format_clock(self.remaining_seconds)
    }

    pub fn set_activity(&mut self, activity_type: impl Into<String>) -> Result<(), TimerError> {
        match self.state {
            TimerState::Idle | TimerState::Paused => {
                self.activity_type = activity_type.into();
                debug!("Activity set to {}", self.activity_type);
                Ok(())
            }
            state @ (TimerState::Running | TimerState::AwaitingSave) => {
                Err(invalid("change the activity", state))
            }
        }
    }

    /// Changing the length always starts over: remaining time is reset and a running or paused
    /// countdown is stopped without a save prompt.
    pub fn set_duration(&mut self, minutes: u32) -> Result<(), TimerError> {
        if self.state == TimerState::AwaitingSave {
            return Err(invalid("change the duration", self.state));
        }
        self.configured_seconds = minutes_to_seconds(minutes)?;
        self.remaining_seconds = self.configured_seconds;
        self.state = TimerState::Idle;
        debug!("Duration set to {minutes} minutes");
        Ok(())
    }

    pub fn start(&mut self) -> Result<(), TimerError> {
        match self.state {
            TimerState::Idle | TimerState::Paused => {
                self.state = TimerState::Running;
                Ok(())
            }
            state @ (TimerState::Running | TimerState::AwaitingSave) => {
                Err(invalid("start", state))
            }
        }
    }

    pub fn pause(&mut self) -> Result<(), TimerError> {
        match self.state {
            TimerState::Running => {
                self.state = TimerState::Paused;
                Ok(())
            }
            state => Err(invalid("pause", state)),
        }
    }

    /// Start/pause button.
    pub fn toggle(&mut self) -> Result<(), TimerError> {
        if self.is_running() {
            self.pause()
        } else {
            self.start()
        }
    }

    pub fn tick(&mut self) -> TickOutcome {
        if self.state != TimerState::Running {
            return TickOutcome::Ignored;
        }

        self.remaining_seconds = self.remaining_seconds.saturating_sub(1);
        trace!("Tick, {} left", self.remaining_seconds);

        if self.remaining_seconds == 0 {
            self.state = TimerState::AwaitingSave;
            TickOutcome::Finished
        } else {
            TickOutcome::Counting {
                remaining: self.remaining_seconds,
            }
        }
    }

    /// Ends the countdown early. Remaining time is kept until the save decision so the elapsed
    /// part can be recorded.
    pub fn stop(&mut self) -> Result<(), TimerError> {
        match self.state {
            TimerState::Idle | TimerState::Running | TimerState::Paused => {
                self.state = TimerState::AwaitingSave;
                Ok(())
            }
            TimerState::AwaitingSave => Err(invalid("stop", self.state)),
        }
    }

    /// Produces the record for the finished session and rearms the countdown.
    pub fn save(&mut self, now: DateTime<Utc>) -> Result<NewRecord, TimerError> {
        if self.state != TimerState::AwaitingSave {
            return Err(invalid("save", self.state));
        }

        let record = NewRecord {
            activity_type: self.activity_type.clone(),
            duration: i64::from(self.elapsed_seconds()),
            end_time: now,
        };
        self.rearm();
        Ok(record)
    }

    /// Drops the pending session without recording it.
    pub fn cancel(&mut self) -> Result<(), TimerError> {
        if self.state != TimerState::AwaitingSave {
            return Err(invalid("discard", self.state));
        }
        self.rearm();
        Ok(())
    }

    pub fn reset(&mut self) -> Result<(), TimerError> {
        if self.state == TimerState::AwaitingSave {
            return Err(invalid("reset", self.state));
        }
        self.rearm();
        Ok(())
    }

    fn rearm(&mut self) {
        self.remaining_seconds = self.configured_seconds;
        self.state = TimerState::Idle;
    }
}

fn minutes_to_seconds(minutes: u32) -> Result<u32, TimerError> {
    if minutes == 0 {
        return Err(TimerError::ZeroDuration);
    }
    Ok(minutes.saturating_mul(60))
}

fn invalid(action: &'static str, state: TimerState) -> TimerError {
    TimerError::InvalidTransition { action, state }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::{TickOutcome, Timer, TimerError, TimerState};

    fn timer(minutes: u32) -> Timer {
        Timer::new("MBA", minutes).unwrap()
    }

    #[test]
    fn stopped_after_hundred_ticks_records_elapsed() {
        let mut timer = timer(15);
        timer.start().unwrap();
        for _ in 0..100 {
            assert!(matches!(timer.tick(), TickOutcome::Counting { .. }));
        }
        timer.stop().unwrap();

        let now = Utc.with_ymd_and_hms(2024, 4, 5, 12, 0, 0).unwrap();
        let record = timer.save(now).unwrap();

        assert_eq!(record.duration, 100);
        assert_eq!(record.activity_type, "MBA");
        assert_eq!(record.end_time, now);
        assert_eq!(timer.remaining_seconds(), 900);
        assert_eq!(timer.state(), TimerState::Idle);
    }

    #[test]
    fn countdown_finishes_at_zero() {
        let mut timer = timer(1);
        timer.start().unwrap();
        for _ in 0..59 {
            timer.tick();
        }
        assert_eq!(timer.tick(), TickOutcome::Finished);
        assert_eq!(timer.state(), TimerState::AwaitingSave);
        assert_eq!(timer.tick(), TickOutcome::Ignored);

        let record = timer.save(Utc::now()).unwrap();
        assert_eq!(record.duration, 60);
    }

    #[test]
    fn pause_freezes_remaining_time() {
        let mut timer = timer(15);
        timer.start().unwrap();
        timer.tick();
        timer.pause().unwrap();

        assert_eq!(timer.tick(), TickOutcome::Ignored);
        assert_eq!(timer.remaining_seconds(), 899);

        timer.toggle().unwrap();
        assert!(timer.is_running());
    }

    #[test]
    fn immediate_stop_records_zero() {
        let mut timer = timer(30);
        timer.stop().unwrap();
        assert_eq!(timer.save(Utc::now()).unwrap().duration, 0);
    }

    #[test]
    fn cancel_discards_and_rearms() {
        let mut timer = timer(15);
        timer.start().unwrap();
        timer.tick();
        timer.stop().unwrap();

        timer.cancel().unwrap();

        assert_eq!(timer.remaining_seconds(), 900);
        assert_eq!(timer.state(), TimerState::Idle);
        assert!(timer.save(Utc::now()).is_err());
    }

    #[test]
    fn start_only_from_non_running() {
        let mut timer = timer(15);
        timer.start().unwrap();
        assert_eq!(
            timer.start(),
            Err(TimerError::InvalidTransition {
                action: "start",
                state: TimerState::Running
            })
        );

        timer.stop().unwrap();
        assert!(timer.start().is_err());
        assert!(timer.pause().is_err());
        assert!(timer.stop().is_err());
    }

    #[test]
    fn activity_locked_while_running() {
        let mut timer = timer(15);
        timer.start().unwrap();
        assert!(timer.set_activity("Gym").is_err());

        timer.pause().unwrap();
        timer.set_activity("Gym").unwrap();
        assert_eq!(timer.activity_type(), "Gym");
    }

    #[test]
    fn duration_change_stops_and_resets() {
        let mut timer = timer(15);
        timer.start().unwrap();
        timer.tick();

        timer.set_duration(30).unwrap();

        assert_eq!(timer.state(), TimerState::Idle);
        assert_eq!(timer.remaining_seconds(), 1800);
        assert_eq!(timer.set_duration(0), Err(TimerError::ZeroDuration));
    }

    #[test]
    fn reset_restores_configured_time() {
        let mut timer = timer(45);
        timer.start().unwrap();
        timer.tick();
        timer.tick();

        timer.reset().unwrap();

        assert_eq!(timer.state(), TimerState::Idle);
        assert_eq!(timer.display(), "00:45:00");
    }

    #[test]
    fn error_messages() {
        let mut timer = timer(15);
        timer.stop().unwrap();
        assert_eq!(
            timer.reset().unwrap_err().to_string(),
            "can't reset while the timer is awaiting save"
        );
    }
}

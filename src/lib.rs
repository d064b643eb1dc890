//! Countdown timer and dashboard for keeping track of the time spent on activities.
//! Finished countdowns are saved as sessions into a single JSON file, and the dashboard derives
//! totals and per-range breakdowns from them on every run.

pub mod cli;
pub mod fs;
pub mod tracker;
pub mod utils;

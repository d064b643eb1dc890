use std::{fmt::Display, ops::Deref};

#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Percentage(f64);

impl Display for Percentage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.0}%", self.0)
    }
}

impl Percentage {
    pub fn new_opt(value: f64) -> Option<Percentage> {
        if value.is_nan() || value < 0. {
            None
        } else {
            Some(Percentage(value))
        }
    }
}

impl Deref for Percentage {
    type Target = f64;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Share of `whole` taken by `value`, both in seconds. Returns [None] when the share isn't a
/// meaningful percentage, e.g. nothing was tracked at all or the sums are negative.
pub fn seconds_percentage(value: i64, whole: i64) -> Option<Percentage> {
    if whole <= 0 {
        return None;
    }
    Percentage::new_opt(value as f64 * 100. / whole as f64)
}

//! Vertical placement of appointment blocks in the 08:00-20:00 planner grid.

use chrono::{DateTime, NaiveDateTime, NaiveTime, TimeZone, Timelike};
use serde::Serialize;

pub const DAY_START_MINUTES: i64 = 8 * 60;
pub const DAY_END_MINUTES: i64 = 20 * 60;
pub const VISIBLE_MINUTES: i64 = DAY_END_MINUTES - DAY_START_MINUTES;
pub const MIN_BLOCK_MINUTES: i64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BlockLayout {
    pub top_pct: f64,
    pub height_pct: f64,
}

/// Anything carrying a wall-clock hour and minute.
pub trait MinutesSinceMidnight {
    fn minutes_since_midnight(&self) -> i64;
}

impl MinutesSinceMidnight for NaiveTime {
    fn minutes_since_midnight(&self) -> i64 {
        i64::from(self.hour()) * 60 + i64::from(self.minute())
    }
}

impl MinutesSinceMidnight for NaiveDateTime {
    fn minutes_since_midnight(&self) -> i64 {
        self.time().minutes_since_midnight()
    }
}

impl<Tz: TimeZone> MinutesSinceMidnight for DateTime<Tz> {
    fn minutes_since_midnight(&self) -> i64 {
        i64::from(self.hour()) * 60 + i64::from(self.minute())
    }
}

fn pct(minutes: i64) -> f64 {
    minutes as f64 / VISIBLE_MINUTES as f64 * 100.0
}

/// Blocks starting before 08:00 stick to the top and every block is at
/// least 30 minutes tall. Nothing clamps the bottom edge.
pub fn compute_block<S, E>(start: &S, end: &E) -> BlockLayout
where
    S: MinutesSinceMidnight + ?Sized,
    E: MinutesSinceMidnight + ?Sized,
{
    let start_minutes = start.minutes_since_midnight();
    let end_minutes = end.minutes_since_midnight();

    let offset = (start_minutes - DAY_START_MINUTES).max(0);
    let duration = (end_minutes - start_minutes).max(MIN_BLOCK_MINUTES);

    BlockLayout {
        top_pct: pct(offset),
        height_pct: pct(duration),
    }
}

/// `HH:MM` variant used by the sample week. Returns `None` for malformed
/// input.
pub fn compute_block_clock(start: &str, end: &str) -> Option<BlockLayout> {
    let start = NaiveTime::parse_from_str(start.trim(), "%H:%M").ok()?;
    let end = NaiveTime::parse_from_str(end.trim(), "%H:%M").ok()?;
    Some(compute_block(&start, &end))
}

/// Hour labels drawn along the grid, `08:00` through `20:00`.
pub fn planner_hours() -> Vec<String> {
    (DAY_START_MINUTES / 60..=DAY_END_MINUTES / 60)
        .map(|hour| format!("{hour:02}:00"))
        .collect()
}

//! Egg-turning schedule: turn times derived from turns-per-day and the
//! interval between turns, anchored at 08:00.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::ValidationError;

/// First turn of the day, in minutes after midnight (08:00).
const START_MINUTES: f64 = 8.0 * 60.0;
const MINUTES_PER_DAY: u64 = 24 * 60;

pub const TURNS_PER_DAY_RANGE: std::ops::RangeInclusive<u32> = 1..=24;
pub const INTERVAL_HOURS_RANGE: std::ops::RangeInclusive<f64> = 1.0..=24.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TurningSchedule {
    pub turns_per_day: u32,
    pub interval_hours: f64,
    /// Turn times as `HH:MM`, in turn order (may wrap past midnight).
    pub times: Vec<String>,
}

impl TurningSchedule {
    /// Validate both parameters and derive the turn times.
    pub fn new(turns_per_day: u32, interval_hours: f64) -> Result<Self, ValidationError> {
        if !TURNS_PER_DAY_RANGE.contains(&turns_per_day) {
            return Err(ValidationError::TurnsPerDay(turns_per_day));
        }
        // `contains` is false for NaN.
        if !INTERVAL_HOURS_RANGE.contains(&interval_hours) {
            return Err(ValidationError::IntervalHours(interval_hours));
        }

        Ok(Self {
            turns_per_day,
            interval_hours,
            times: calculate_schedule(turns_per_day, interval_hours),
        })
    }
}

impl Default for TurningSchedule {
    fn default() -> Self {
        Self {
            turns_per_day: 3,
            interval_hours: 8.0,
            times: calculate_schedule(3, 8.0),
        }
    }
}

/// Compute `turns_per_day` turn times starting at 08:00, `interval_hours`
/// apart, wrapping modulo 24h. Fractional minutes round to the nearest minute.
///
/// Duplicate or out-of-order times are expected once the schedule spans more
/// than a day.
pub fn calculate_schedule(turns_per_day: u32, interval_hours: f64) -> Vec<String> {
    (0..turns_per_day)
        .map(|i| {
            let minutes = (START_MINUTES + f64::from(i) * interval_hours * 60.0).round() as u64;
            format_time_of_day(minutes % MINUTES_PER_DAY)
        })
        .collect()
}

fn format_time_of_day(minutes: u64) -> String {
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}

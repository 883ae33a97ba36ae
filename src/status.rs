//! Transitions of the live [`Status`] snapshot.
//!
//! Each function takes the current snapshot and one input and leaves the
//! snapshot in its next state. None of them can push the countdown below zero
//! or a simulated measurement outside its clamp range.

use std::ops::RangeInclusive;

use chrono::{DateTime, Utc};
use rand::Rng;
use tracing::warn;

use crate::{
    device::models::RemoteStatus,
    error::DeviceError,
    models::Status,
};

/// Simulated temperature stays inside this band (°C).
pub const SIM_TEMP_RANGE: RangeInclusive<f64> = 36.0..=40.0;
/// Simulated humidity stays inside this band (%RH).
pub const SIM_HUMIDITY_RANGE: RangeInclusive<f64> = 40.0..=80.0;

const SIM_TEMP_STEP: f64 = 0.1;
const SIM_HUMIDITY_STEP: f64 = 0.5;

/// Round to one decimal place.
pub fn round_tenth(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

/// Random-walk the measurements one step. Always reports connected.
pub fn simulate(status: &mut Status, rng: &mut impl Rng, now: DateTime<Utc>) {
    let temp_delta = rng.gen_range(-SIM_TEMP_STEP..=SIM_TEMP_STEP);
    let humidity_delta = rng.gen_range(-SIM_HUMIDITY_STEP..=SIM_HUMIDITY_STEP);

    status.temperature = clamp(round_tenth(status.temperature + temp_delta), &SIM_TEMP_RANGE);
    status.humidity = clamp(round_tenth(status.humidity + humidity_delta), &SIM_HUMIDITY_RANGE);
    status.last_updated = now;
    status.connected = true;
}

/// Apply the outcome of a device status fetch.
///
/// Success replaces every measured field. Failure only flips `connected`;
/// the last good values stay visible.
pub fn apply_remote(status: &mut Status, result: Result<RemoteStatus, DeviceError>, now: DateTime<Utc>) {
    match result {
        Ok(remote) => {
            status.temperature = remote.temperature;
            status.humidity = remote.humidity;
            status.motor_status = remote.motor_status;
            status.turns_today = remote.turns_today;
            status.next_turn_in = remote.next_turn_in;
            status.last_updated = now;
            status.connected = true;
        }
        Err(e) => {
            warn!(error = %e, timeout = e.is_timeout(), "Device status refresh failed");
            status.connected = false;
        }
    }
}

/// One second elapsed. Floors at zero.
pub fn tick_countdown(status: &mut Status) {
    status.next_turn_in = status.next_turn_in.saturating_sub(1);
}

/// Human-readable countdown: `1h 5m`, `4m 10s`, `9s`.
pub fn format_countdown(seconds: u32) -> String {
    let h = seconds / 3600;
    let m = (seconds % 3600) / 60;
    let s = seconds % 60;

    if h > 0 {
        format!("{h}h {m}m")
    } else if m > 0 {
        format!("{m}m {s}s")
    } else {
        format!("{s}s")
    }
}

fn clamp(v: f64, range: &RangeInclusive<f64>) -> f64 {
    v.clamp(*range.start(), *range.end())
}

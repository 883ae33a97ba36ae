use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    error::DeviceError,
    models::{MotorStatus, Reading},
};

// ---------------------------------------------------------------------------
// Plausibility bounds
//
// A payload outside these ranges is rejected whole, never clamped.
// ---------------------------------------------------------------------------

const TEMP_MIN: f64 = -50.0;
const TEMP_MAX: f64 = 100.0;
const HUMIDITY_MIN: f64 = 0.0;
const HUMIDITY_MAX: f64 = 100.0;

fn check_plausible(temperature: f64, humidity: f64) -> Result<(), DeviceError> {
    if !(TEMP_MIN..=TEMP_MAX).contains(&temperature) {
        return Err(DeviceError::Invalid(format!(
            "temperature {temperature} out of range [{TEMP_MIN}, {TEMP_MAX}]"
        )));
    }
    if !(HUMIDITY_MIN..=HUMIDITY_MAX).contains(&humidity) {
        return Err(DeviceError::Invalid(format!(
            "humidity {humidity} out of range [{HUMIDITY_MIN}, {HUMIDITY_MAX}]"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Status: GET /status
//
//   { "temperature": 37.6, "humidity": 58.2, "motor_status": "idle",
//     "turns_today": 2, "next_turn_in": 4210 }
//
// Every field is required. Negative counters fail deserialization.
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteStatus {
    pub temperature: f64,
    pub humidity: f64,
    pub motor_status: MotorStatus,
    pub turns_today: u32,
    /// Seconds.
    pub next_turn_in: u32,
}

impl RemoteStatus {
    pub fn validate(&self) -> Result<(), DeviceError> {
        check_plausible(self.temperature, self.humidity)
    }
}

// ---------------------------------------------------------------------------
// Logs: GET /logs?limit=N
// ---------------------------------------------------------------------------

/// One entry of the device log as sent on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteReading {
    pub id: String,
    /// ISO-8601 with offset.
    pub timestamp: DateTime<Utc>,
    pub temperature: f64,
    pub humidity: f64,
    pub egg_turning: bool,
    pub motor_status: MotorStatus,
}

impl TryFrom<RemoteReading> for Reading {
    type Error = DeviceError;

    fn try_from(r: RemoteReading) -> Result<Self, DeviceError> {
        check_plausible(r.temperature, r.humidity)
            .map_err(|e| DeviceError::Invalid(format!("log entry {:?}: {e}", r.id)))?;
        Ok(Self {
            id: r.id,
            timestamp: r.timestamp,
            temperature: r.temperature,
            humidity: r.humidity,
            egg_turning: r.egg_turning,
            motor_status: r.motor_status,
        })
    }
}

// ---------------------------------------------------------------------------
// Schedule: POST /schedule
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleRequest {
    pub turns_per_day: u32,
    pub interval_hours: f64,
}

// ---------------------------------------------------------------------------
// Error body on non-2xx responses: `{ "error": "ESP32 returned 500" }`
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    pub error: Option<String>,
}

/// Pull the `error` field out of a failure body, if there is one.
pub fn error_message(body: &[u8]) -> Option<String> {
    serde_json::from_slice::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.error)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

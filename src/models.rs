use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::ValidationError;

/// Turning motor state as reported by the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum MotorStatus {
    Running,
    Idle,
}

impl fmt::Display for MotorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MotorStatus::Running => "running",
            MotorStatus::Idle => "idle",
        };
        f.write_str(s)
    }
}

/// One historical measurement. Never mutated once stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Reading {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    /// Degrees Celsius
    pub temperature: f64,
    /// Relative humidity percentage
    pub humidity: f64,
    /// Set when the reading coincides with a turning event.
    pub egg_turning: bool,
    pub motor_status: MotorStatus,
}

/// The live snapshot of the incubator. Exactly one exists, owned by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Status {
    /// Degrees Celsius
    pub temperature: f64,
    /// Relative humidity percentage
    pub humidity: f64,
    pub motor_status: MotorStatus,
    pub turns_today: u32,
    /// Seconds until the next scheduled turn.
    pub next_turn_in: u32,
    pub last_updated: DateTime<Utc>,
    pub connected: bool,
}

/// Operator-editable alert bounds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AlertConfig {
    pub temp_min: f64,
    pub temp_max: f64,
    pub humidity_min: f64,
    pub humidity_max: f64,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            temp_min: 37.0,
            temp_max: 38.5,
            humidity_min: 55.0,
            humidity_max: 65.0,
        }
    }
}

impl AlertConfig {
    /// Rejects non-finite bounds and inverted ranges. The alert engine assumes
    /// every config it sees has passed through here.
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_range("temperature", self.temp_min, self.temp_max)?;
        check_range("humidity", self.humidity_min, self.humidity_max)
    }
}

fn check_range(field: &'static str, min: f64, max: f64) -> Result<(), ValidationError> {
    if !min.is_finite() || !max.is_finite() {
        return Err(ValidationError::NonFinite { field });
    }
    if min > max {
        return Err(ValidationError::InvertedRange { field, min, max });
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AlertCategory {
    Temperature,
    Humidity,
    Turning,
}

impl fmt::Display for AlertCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AlertCategory::Temperature => "temperature",
            AlertCategory::Humidity => "humidity",
            AlertCategory::Turning => "turning",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Warning,
    Critical,
}

/// A raised alert. Only `acknowledged` changes after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Alert {
    pub id: Uuid,
    pub category: AlertCategory,
    pub severity: Severity,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub acknowledged: bool,
}

/// Where status and log refreshes come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    Mock,
    Device,
}

impl DataSource {
    pub fn from_use_mock(use_mock_data: bool) -> Self {
        if use_mock_data {
            Self::Mock
        } else {
            Self::Device
        }
    }
}

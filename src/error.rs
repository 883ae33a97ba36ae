use thiserror::Error;

/// Failures from the device facade. All of them are recovered by the engine
/// (the status is marked disconnected); none propagate further.
#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("device request timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("device returned HTTP {code}: {}", .message.as_deref().unwrap_or("(no error message)"))]
    Status { code: u16, message: Option<String> },

    #[error("device transport error: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("failed to decode device response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("device payload rejected: {0}")]
    Invalid(String),
}

impl DeviceError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, DeviceError::Timeout(_))
    }
}

/// Rejected operator input. Raised at the configuration boundary so the
/// engine only ever sees well-formed values.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("{field} bounds must be finite numbers")]
    NonFinite { field: &'static str },

    #[error("{field} minimum {min} is greater than maximum {max}")]
    InvertedRange {
        field: &'static str,
        min: f64,
        max: f64,
    },

    #[error("turns_per_day must be between 1 and 24, got {0}")]
    TurnsPerDay(u32),

    #[error("interval_hours must be between 1 and 24, got {0}")]
    IntervalHours(f64),
}

/// Failures submitting an operator command to the monitor engine.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error("monitor engine is not running")]
    EngineStopped,

    #[error("monitor engine did not respond within {0:?}")]
    Timeout(std::time::Duration),
}

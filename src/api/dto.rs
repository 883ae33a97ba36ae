use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::{
    models::{Alert, AlertConfig, DataSource, MotorStatus, Reading, Status},
    reading_store::ReadingStore,
    status::format_countdown,
    threshold::{classify, Level},
};

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Live status with each measurement classified against the current
/// thresholds.
#[derive(Debug, Serialize, ToSchema)]
pub struct StatusDto {
    pub temperature: f64,
    pub humidity: f64,
    pub motor_status: MotorStatus,
    pub turns_today: u32,
    /// Seconds until the next scheduled turn.
    pub next_turn_in: u32,
    /// Countdown for display, e.g. `1h 5m`.
    pub next_turn_display: String,
    pub last_updated: DateTime<Utc>,
    pub connected: bool,
    pub temperature_level: Level,
    pub humidity_level: Level,
}

impl StatusDto {
    pub fn new(status: &Status, config: &AlertConfig) -> Self {
        Self {
            temperature: status.temperature,
            humidity: status.humidity,
            motor_status: status.motor_status,
            turns_today: status.turns_today,
            next_turn_in: status.next_turn_in,
            next_turn_display: format_countdown(status.next_turn_in),
            last_updated: status.last_updated,
            connected: status.connected,
            temperature_level: classify(status.temperature, config.temp_min, config.temp_max),
            humidity_level: classify(status.humidity, config.humidity_min, config.humidity_max),
        }
    }
}

// ---------------------------------------------------------------------------
// Readings
// ---------------------------------------------------------------------------

/// Filters for `GET /readings` and the CSV export. Every bound is inclusive
/// and optional.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ReadingFilter {
    /// RFC3339 instant, or a `YYYY-MM-DD` date meaning the start of that UTC day.
    #[serde(default, deserialize_with = "day_or_instant::start")]
    #[param(value_type = Option<String>)]
    pub from: Option<DateTime<Utc>>,
    /// RFC3339 instant, or a `YYYY-MM-DD` date meaning the end of that UTC day.
    #[serde(default, deserialize_with = "day_or_instant::end")]
    #[param(value_type = Option<String>)]
    pub to: Option<DateTime<Utc>>,
    pub temp_min: Option<f64>,
    pub temp_max: Option<f64>,
    pub humidity_min: Option<f64>,
    pub humidity_max: Option<f64>,
    /// Only readings flagged as turning events.
    pub turning_only: Option<bool>,
    /// Skip this many matching readings.
    pub offset: Option<usize>,
    /// Return at most this many readings, most recent first.
    pub limit: Option<usize>,
}

impl ReadingFilter {
    pub fn matches(&self, r: &Reading) -> bool {
        self.from.map_or(true, |from| r.timestamp >= from)
            && self.to.map_or(true, |to| r.timestamp <= to)
            && self.temp_min.map_or(true, |min| r.temperature >= min)
            && self.temp_max.map_or(true, |max| r.temperature <= max)
            && self.humidity_min.map_or(true, |min| r.humidity >= min)
            && self.humidity_max.map_or(true, |max| r.humidity <= max)
            && (!self.turning_only.unwrap_or(false) || r.egg_turning)
    }

    /// The page of matching readings selected by `offset` and `limit`.
    pub fn select<'a>(
        &'a self,
        store: &'a ReadingStore,
    ) -> impl Iterator<Item = &'a Reading> + 'a {
        store
            .query(move |r| self.matches(r))
            .skip(self.offset.unwrap_or(0))
            .take(self.limit.unwrap_or(usize::MAX))
    }
}

/// Query bounds given either as an RFC3339 instant or as a calendar date.
mod day_or_instant {
    use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
    use serde::{de::Error, Deserialize, Deserializer};

    pub fn start<'de, D: Deserializer<'de>>(d: D) -> Result<Option<DateTime<Utc>>, D::Error> {
        parse(d, NaiveTime::MIN)
    }

    pub fn end<'de, D: Deserializer<'de>>(d: D) -> Result<Option<DateTime<Utc>>, D::Error> {
        let end_of_day = NaiveTime::from_hms_milli_opt(23, 59, 59, 999)
            .ok_or_else(|| D::Error::custom("invalid end-of-day time"))?;
        parse(d, end_of_day)
    }

    fn parse<'de, D: Deserializer<'de>>(
        d: D,
        time_of_day: NaiveTime,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        let Some(raw) = Option::<String>::deserialize(d)? else {
            return Ok(None);
        };
        if let Ok(instant) = DateTime::parse_from_rfc3339(&raw) {
            return Ok(Some(instant.with_timezone(&Utc)));
        }
        NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
            .map(|day| Some(day.and_time(time_of_day).and_utc()))
            .map_err(|_| {
                D::Error::custom(format!(
                    "expected RFC3339 timestamp or YYYY-MM-DD date, got {raw:?}"
                ))
            })
    }
}

// ---------------------------------------------------------------------------
// Alerts
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AlertListDto {
    /// Most recent first.
    pub alerts: Vec<Alert>,
    pub unacknowledged: usize,
}

// ---------------------------------------------------------------------------
// Schedule
// ---------------------------------------------------------------------------

/// Body of `PUT /schedule` and query of `GET /schedule/preview`.
#[derive(Debug, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ScheduleParams {
    /// 1 to 24.
    pub turns_per_day: u32,
    /// Hours between turns, 1 to 24.
    pub interval_hours: f64,
}

// ---------------------------------------------------------------------------
// Data source
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SourceDto {
    pub use_mock_data: bool,
    pub data_source: DataSource,
}

impl From<DataSource> for SourceDto {
    fn from(source: DataSource) -> Self {
        Self {
            use_mock_data: source == DataSource::Mock,
            data_source: source,
        }
    }
}

/// Answer to `POST /readings/refresh`.
#[derive(Debug, Serialize, ToSchema)]
pub struct RefreshDto {
    pub data_source: DataSource,
    /// History size once the request was handled. In device mode the fetch
    /// may still be in flight.
    pub readings: usize,
}

/// Body of `PUT /source`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SourceRequest {
    pub use_mock_data: bool,
}

//! Threshold alerts with a per-category suppression window.
//!
//! An alert is never retracted when its condition clears. While an
//! unacknowledged alert of the same category is younger than
//! [`SUPPRESSION_WINDOW_SECS`], repeat breaches raise nothing; acknowledging it
//! reopens the category immediately.

use std::collections::VecDeque;

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::{
    models::{Alert, AlertCategory, AlertConfig, Severity, Status},
    threshold::{classify, Level},
};

/// Maximum number of alerts retained.
pub const ALERT_RETENTION: usize = 50;

/// Seconds during which an open alert suppresses duplicates of its category.
pub const SUPPRESSION_WINDOW_SECS: i64 = 5 * 60;

/// A measurement outside its configured bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Breach {
    Low,
    High,
}

impl Breach {
    fn of(level: Level) -> Option<Self> {
        match level {
            Level::Low => Some(Breach::Low),
            Level::High => Some(Breach::High),
            Level::Normal => None,
        }
    }

    fn severity(self) -> Severity {
        match self {
            Breach::High => Severity::Critical,
            Breach::Low => Severity::Warning,
        }
    }
}

/// One measured quantity checked against its bounds.
struct Check {
    category: AlertCategory,
    name: &'static str,
    unit: &'static str,
    value: f64,
    min: f64,
    max: f64,
}

impl Check {
    fn message(&self, breach: Breach) -> String {
        let Check { name, unit, value, min, max, .. } = *self;
        match breach {
            Breach::High => format!("{name} too high: {value}{unit} (max: {max}{unit})"),
            Breach::Low => format!("{name} too low: {value}{unit} (min: {min}{unit})"),
        }
    }
}

/// Classify temperature and humidity and return the alerts to raise, in
/// category order (temperature first).
pub fn evaluate<'a>(
    status: &Status,
    config: &AlertConfig,
    existing: impl IntoIterator<Item = &'a Alert> + Clone,
    now: DateTime<Utc>,
) -> Vec<Alert> {
    let checks = [
        Check {
            category: AlertCategory::Temperature,
            name: "Temperature",
            unit: "°C",
            value: status.temperature,
            min: config.temp_min,
            max: config.temp_max,
        },
        Check {
            category: AlertCategory::Humidity,
            name: "Humidity",
            unit: "%",
            value: status.humidity,
            min: config.humidity_min,
            max: config.humidity_max,
        },
    ];

    checks
        .into_iter()
        .filter_map(|check| {
            let breach = Breach::of(classify(check.value, check.min, check.max))?;
            if is_suppressed(existing.clone(), check.category, now) {
                return None;
            }
            Some(Alert {
                id: Uuid::new_v4(),
                category: check.category,
                severity: breach.severity(),
                message: check.message(breach),
                timestamp: now,
                acknowledged: false,
            })
        })
        .collect()
}

fn is_suppressed<'a>(
    existing: impl IntoIterator<Item = &'a Alert>,
    category: AlertCategory,
    now: DateTime<Utc>,
) -> bool {
    let window = Duration::seconds(SUPPRESSION_WINDOW_SECS);
    existing
        .into_iter()
        .any(|a| a.category == category && !a.acknowledged && now - a.timestamp < window)
}

/// Capped, most-recent-first list of alerts.
#[derive(Debug, Clone)]
pub struct AlertLog {
    inner: VecDeque<Alert>,
    capacity: usize,
}

impl Default for AlertLog {
    fn default() -> Self {
        Self {
            inner: VecDeque::with_capacity(ALERT_RETENTION),
            capacity: ALERT_RETENTION,
        }
    }
}

impl AlertLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prepend `alerts` keeping their relative order, then evict past the cap.
    pub fn extend_front(&mut self, alerts: Vec<Alert>) {
        for alert in alerts.into_iter().rev() {
            self.inner.push_front(alert);
        }
        self.inner.truncate(self.capacity);
    }

    /// Mark the alert with `id` acknowledged. Returns `false` when unknown.
    pub fn acknowledge(&mut self, id: Uuid) -> bool {
        match self.inner.iter_mut().find(|a| a.id == id) {
            Some(alert) => {
                alert.acknowledged = true;
                true
            }
            None => false,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Alert> + Clone {
        self.inner.iter()
    }

    pub fn unacknowledged(&self) -> usize {
        self.inner.iter().filter(|a| !a.acknowledged).count()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

//! Data access facade: the only code that leaves the process.
//!
//! [`DeviceClient`] talks to the incubator controller over HTTP; [`mock`]
//! synthesizes the same data when no device is attached. Every call is
//! bounded by the configured timeout and never retried here; the polling
//! timers retry on their next tick.

pub mod mock;
pub mod models;

use std::{sync::Arc, time::Duration};

use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use tokio::time;
use tracing::debug;

use crate::{error::DeviceError, models::Reading, schedule::TurningSchedule};

use self::models::{error_message, RemoteReading, RemoteStatus, ScheduleRequest};

#[derive(Debug, Clone)]
pub struct DeviceClient {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    http: Client,
    base_url: String,
    timeout: Duration,
}

impl DeviceClient {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                http: Client::new(),
                base_url: base_url.trim_end_matches('/').to_owned(),
                timeout,
            }),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    /// Fetch the live status. The payload must be complete and plausible.
    pub async fn fetch_status(&self) -> Result<RemoteStatus, DeviceError> {
        let url = format!("{}/status", self.inner.base_url);
        debug!(url = %url, "Fetching device status");

        let status: RemoteStatus = self.get_json(&url).await?;
        status.validate()?;
        Ok(status)
    }

    /// Fetch up to `limit` log entries, returned most recent first.
    ///
    /// One malformed entry rejects the whole batch.
    pub async fn fetch_logs(&self, limit: u32) -> Result<Vec<Reading>, DeviceError> {
        let url = format!("{}/logs?limit={}", self.inner.base_url, limit);
        debug!(url = %url, "Fetching device logs");

        let raw: Vec<RemoteReading> = self.get_json(&url).await?;
        let mut readings = raw
            .into_iter()
            .map(Reading::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        readings.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(readings)
    }

    /// Push a turning schedule to the device.
    pub async fn post_schedule(&self, schedule: &TurningSchedule) -> Result<(), DeviceError> {
        let url = format!("{}/schedule", self.inner.base_url);
        debug!(
            url = %url,
            turns_per_day = schedule.turns_per_day,
            interval_hours = schedule.interval_hours,
            "Posting turning schedule"
        );

        let body = ScheduleRequest {
            turns_per_day: schedule.turns_per_day,
            interval_hours: schedule.interval_hours,
        };
        self.send(self.inner.http.post(&url).json(&body)).await?;
        Ok(())
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, DeviceError> {
        let bytes = self.send(self.inner.http.get(url)).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Send `request` and read the whole body within the timeout.
    ///
    /// Non-2xx responses become [`DeviceError::Status`] carrying the body's
    /// `error` field when present.
    async fn send(&self, request: RequestBuilder) -> Result<Vec<u8>, DeviceError> {
        let timeout = self.inner.timeout;

        let exchange = async {
            let response = request.send().await.map_err(|e| transport(e, timeout))?;
            let status = response.status();
            let bytes = response.bytes().await.map_err(|e| transport(e, timeout))?;

            if !status.is_success() {
                return Err(DeviceError::Status {
                    code: status.as_u16(),
                    message: error_message(&bytes),
                });
            }
            Ok(bytes.to_vec())
        };

        time::timeout(timeout, exchange)
            .await
            .map_err(|_| DeviceError::Timeout(timeout))?
    }
}

fn transport(e: reqwest::Error, timeout: Duration) -> DeviceError {
    if e.is_timeout() {
        DeviceError::Timeout(timeout)
    } else {
        DeviceError::Transport(e)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

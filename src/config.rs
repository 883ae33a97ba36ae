use std::{str::FromStr, time::Duration};

use anyhow::{bail, Context, Result};

use crate::{models::DataSource, monitor::PollIntervals};

// ---------------------------------------------------------------------------
// DataSource
// ---------------------------------------------------------------------------

impl FromStr for DataSource {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "mock" => Ok(Self::Mock),
            "device" => Ok(Self::Device),
            other => Err(anyhow::anyhow!("unknown data source: {other:?}")),
        }
    }
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Config {
    /// Where status and logs come from at startup. Switchable at runtime.
    pub data_source: DataSource,
    /// Base URL of the incubator controller API, e.g. `http://192.168.1.50/api`.
    pub device_api_url: String,
    pub server_host: String,
    pub server_port: u16,
    /// Status refresh interval in seconds.
    pub status_poll_interval_secs: u64,
    /// Reading history refresh interval in seconds.
    pub log_poll_interval_secs: u64,
    /// Upper bound on every device request, in seconds.
    pub request_timeout_secs: u64,
    /// `limit` passed to the device log endpoint.
    pub log_fetch_limit: u32,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            data_source: optional("DATA_SOURCE", "mock")
                .parse()
                .context("DATA_SOURCE must be 'mock' or 'device'")?,
            device_api_url: optional("DEVICE_API_URL", "http://192.168.1.50/api"),
            server_host: optional("SERVER_HOST", "0.0.0.0"),
            server_port: optional("SERVER_PORT", "8080")
                .parse()
                .context("SERVER_PORT must be a valid port number")?,
            status_poll_interval_secs: positive_secs(
                "STATUS_POLL_INTERVAL_SECS",
                &optional("STATUS_POLL_INTERVAL_SECS", "5"),
            )?,
            log_poll_interval_secs: positive_secs(
                "LOG_POLL_INTERVAL_SECS",
                &optional("LOG_POLL_INTERVAL_SECS", "900"),
            )?,
            request_timeout_secs: positive_secs(
                "REQUEST_TIMEOUT_SECS",
                &optional("REQUEST_TIMEOUT_SECS", "5"),
            )?,
            log_fetch_limit: optional("LOG_FETCH_LIMIT", "20")
                .parse()
                .context("LOG_FETCH_LIMIT must be a non-negative integer")?,
        })
    }

    pub fn poll_intervals(&self) -> PollIntervals {
        PollIntervals {
            status: Duration::from_secs(self.status_poll_interval_secs),
            logs: Duration::from_secs(self.log_poll_interval_secs),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Parse a whole number of seconds that must be greater than zero.
fn positive_secs(key: &str, raw: &str) -> Result<u64> {
    let secs: u64 = raw
        .trim()
        .parse()
        .with_context(|| format!("{key} must be a positive integer, got {raw:?}"))?;
    if secs == 0 {
        bail!("{key} must be greater than zero");
    }
    Ok(secs)
}

fn optional(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_owned())
}

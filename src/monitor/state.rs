use chrono::{DateTime, Utc};
use rand::Rng;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    alerts::{self, AlertLog},
    device::{mock, models::RemoteStatus},
    error::DeviceError,
    models::{AlertConfig, DataSource, Reading, Status},
    reading_store::ReadingStore,
    schedule::TurningSchedule,
    status,
};

/// Number of synthesized readings a mock-mode monitor starts with.
pub const MOCK_HISTORY_LEN: usize = 100;

/// Work the engine must perform outside the state lock.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    FetchStatus { epoch: u64 },
    FetchLogs { epoch: u64 },
    PostSchedule(TurningSchedule),
}

/// Everything the monitor knows. Written only by the engine task.
#[derive(Debug, Clone)]
pub struct MonitorState {
    status: Status,
    readings: ReadingStore,
    alerts: AlertLog,
    alert_config: AlertConfig,
    schedule: TurningSchedule,
    source: DataSource,
    /// Bumped on every source switch. Fetch results issued under an older
    /// epoch are dropped.
    epoch: u64,
}

impl MonitorState {
    pub fn new(source: DataSource, status: Status, readings: ReadingStore) -> Self {
        Self {
            status,
            readings,
            alerts: AlertLog::new(),
            alert_config: AlertConfig::default(),
            schedule: TurningSchedule::default(),
            source,
            epoch: 0,
        }
    }

    /// Seed from the mock generator. Mock mode also starts with a history and
    /// two demo alerts. In device mode the history starts empty and the status
    /// reads disconnected until the first successful fetch.
    pub fn seeded(source: DataSource, rng: &mut impl Rng, now: DateTime<Utc>) -> Self {
        let status = mock::initial_status(rng, now);
        match source {
            DataSource::Mock => {
                let mut readings = ReadingStore::new();
                readings.replace_all(mock::history(rng, MOCK_HISTORY_LEN, now));
                let mut state = Self::new(source, status, readings);
                state.alerts.extend_front(mock::demo_alerts(now));
                state
            }
            DataSource::Device => Self::new(
                source,
                Status {
                    connected: false,
                    ..status
                },
                ReadingStore::new(),
            ),
        }
    }

    pub fn status(&self) -> &Status {
        &self.status
    }

    pub fn readings(&self) -> &ReadingStore {
        &self.readings
    }

    pub fn alerts(&self) -> &AlertLog {
        &self.alerts
    }

    pub fn alert_config(&self) -> &AlertConfig {
        &self.alert_config
    }

    pub fn schedule(&self) -> &TurningSchedule {
        &self.schedule
    }

    pub fn source(&self) -> DataSource {
        self.source
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Effects to run once when the engine starts.
    pub fn on_start(&mut self, now: DateTime<Utc>) -> Vec<Effect> {
        self.evaluate_alerts(now);
        match self.source {
            DataSource::Mock => vec![],
            DataSource::Device => vec![
                Effect::FetchStatus { epoch: self.epoch },
                Effect::FetchLogs { epoch: self.epoch },
            ],
        }
    }

    // -- Timers -------------------------------------------------------------

    pub fn on_countdown_tick(&mut self) {
        status::tick_countdown(&mut self.status);
    }

    pub fn on_status_tick(&mut self, rng: &mut impl Rng, now: DateTime<Utc>) -> Option<Effect> {
        match self.source {
            DataSource::Mock => {
                let before = self.measurements();
                status::simulate(&mut self.status, rng, now);
                self.evaluate_if_changed(before, now);
                None
            }
            DataSource::Device => Some(Effect::FetchStatus { epoch: self.epoch }),
        }
    }

    pub fn on_log_tick(&mut self, now: DateTime<Utc>) -> Option<Effect> {
        match self.source {
            DataSource::Mock => {
                self.readings.append(mock::reading_from_status(&self.status, now));
                None
            }
            DataSource::Device => Some(Effect::FetchLogs { epoch: self.epoch }),
        }
    }

    // -- Fetch completions --------------------------------------------------

    /// Apply a finished status fetch. Overlapping fetches resolve
    /// last-writer-wins within an epoch.
    pub fn on_status_fetched(
        &mut self,
        epoch: u64,
        result: Result<RemoteStatus, DeviceError>,
        now: DateTime<Utc>,
    ) {
        if epoch != self.epoch {
            debug!(epoch, current = self.epoch, "Dropping status from previous data source");
            return;
        }
        let before = self.measurements();
        status::apply_remote(&mut self.status, result, now);
        self.evaluate_if_changed(before, now);
    }

    /// Apply a finished log fetch. Failures keep the current history.
    pub fn on_logs_fetched(&mut self, epoch: u64, result: Result<Vec<Reading>, DeviceError>) {
        if epoch != self.epoch {
            debug!(epoch, current = self.epoch, "Dropping logs from previous data source");
            return;
        }
        match result {
            Ok(readings) => {
                info!(count = readings.len(), "Reading history replaced from device");
                self.readings.replace_all(readings);
            }
            Err(e) => warn!(error = %e, "Device log refresh failed"),
        }
    }

    // -- Operator commands --------------------------------------------------

    pub fn acknowledge(&mut self, id: Uuid) -> bool {
        let found = self.alerts.acknowledge(id);
        if found {
            info!(alert_id = %id, "Alert acknowledged");
        }
        found
    }

    /// `config` must already have passed [`AlertConfig::validate`].
    pub fn set_alert_config(&mut self, config: AlertConfig) {
        info!(?config, "Alert thresholds updated");
        self.alert_config = config;
    }

    /// Store `schedule`; in device mode also push it to the device.
    pub fn save_schedule(&mut self, schedule: TurningSchedule) -> Option<Effect> {
        info!(
            turns_per_day = schedule.turns_per_day,
            interval_hours = schedule.interval_hours,
            "Turning schedule saved"
        );
        self.schedule = schedule;
        match self.source {
            DataSource::Mock => None,
            DataSource::Device => Some(Effect::PostSchedule(self.schedule.clone())),
        }
    }

    /// Switch data source and refresh the status from the new one right away.
    pub fn set_source(
        &mut self,
        source: DataSource,
        rng: &mut impl Rng,
        now: DateTime<Utc>,
    ) -> Option<Effect> {
        if source == self.source {
            return None;
        }
        self.source = source;
        self.epoch += 1;
        info!(?source, epoch = self.epoch, "Data source switched");
        self.on_status_tick(rng, now)
    }

    // -- Alerts -------------------------------------------------------------

    /// Run the alert engine against the current status. Returns how many
    /// alerts were raised.
    pub fn evaluate_alerts(&mut self, now: DateTime<Utc>) -> usize {
        let raised = alerts::evaluate(&self.status, &self.alert_config, self.alerts.iter(), now);
        let count = raised.len();
        for alert in &raised {
            warn!(
                category = %alert.category,
                severity = ?alert.severity,
                detail = %alert.message,
                "Alert raised"
            );
        }
        self.alerts.extend_front(raised);
        count
    }

    fn measurements(&self) -> (f64, f64) {
        (self.status.temperature, self.status.humidity)
    }

    fn evaluate_if_changed(&mut self, before: (f64, f64), now: DateTime<Utc>) {
        if self.measurements() != before {
            self.evaluate_alerts(now);
        }
    }
}

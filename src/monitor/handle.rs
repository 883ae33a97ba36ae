use std::{sync::Arc, time::Duration};

use tokio::{
    sync::{mpsc, oneshot, RwLock, RwLockReadGuard},
    time,
};
use uuid::Uuid;

use super::{
    events::{Command, Event},
    state::MonitorState,
};
use crate::{
    error::CommandError,
    models::{AlertConfig, DataSource},
    schedule::TurningSchedule,
};

/// How long a caller waits for the engine to answer a command.
const COMMAND_TIMEOUT: Duration = Duration::from_secs(5);

/// Cloneable access to a running engine: shared reads of the state and
/// commands through the event queue.
#[derive(Debug, Clone)]
pub struct MonitorHandle {
    state: Arc<RwLock<MonitorState>>,
    events: mpsc::Sender<Event>,
}

impl MonitorHandle {
    pub(super) fn new(state: Arc<RwLock<MonitorState>>, events: mpsc::Sender<Event>) -> Self {
        Self { state, events }
    }

    /// Read access to the current state. Hold the guard briefly; the engine
    /// waits on it to apply the next event.
    pub async fn read(&self) -> RwLockReadGuard<'_, MonitorState> {
        self.state.read().await
    }

    /// Sender for timer tasks.
    pub fn events(&self) -> mpsc::Sender<Event> {
        self.events.clone()
    }

    /// Returns `false` when no alert has this id.
    pub async fn acknowledge_alert(&self, id: Uuid) -> Result<bool, CommandError> {
        self.request(|reply| Command::AcknowledgeAlert { id, reply }).await
    }

    pub async fn set_alert_config(&self, config: AlertConfig) -> Result<(), CommandError> {
        config.validate()?;
        self.request(|reply| Command::SetAlertConfig { config, reply }).await
    }

    /// Validate and store a schedule, returning it with its computed times.
    pub async fn save_schedule(
        &self,
        turns_per_day: u32,
        interval_hours: f64,
    ) -> Result<TurningSchedule, CommandError> {
        let schedule = TurningSchedule::new(turns_per_day, interval_hours)?;
        let stored = schedule.clone();
        self.request(|reply| Command::SaveSchedule { schedule, reply })
            .await?;
        Ok(stored)
    }

    /// Ask for a history refresh. Mock mode appends a reading before this
    /// returns; device mode starts a log fetch.
    pub async fn refresh_logs(&self) -> Result<(), CommandError> {
        self.request(|reply| Command::RefreshLogs { reply }).await
    }

    pub async fn set_data_source(&self, source: DataSource) -> Result<(), CommandError> {
        self.request(|reply| Command::SetDataSource { source, reply }).await
    }

    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Result<T, CommandError> {
        let (tx, rx) = oneshot::channel();
        self.events
            .send(make(tx).into())
            .await
            .map_err(|_| CommandError::EngineStopped)?;

        // Layers: timeout, then engine dropped the reply.
        match time::timeout(COMMAND_TIMEOUT, rx).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(_)) => Err(CommandError::EngineStopped),
            Err(_) => Err(CommandError::Timeout(COMMAND_TIMEOUT)),
        }
    }
}

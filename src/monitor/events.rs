//! Inputs to the monitor engine.
//!
//! Timers and finished device calls arrive as [`Event`]s; operator actions
//! arrive as [`Command`]s carrying a oneshot reply so the caller can await
//! the outcome.

use tokio::sync::oneshot;
use uuid::Uuid;

use crate::{
    device::models::RemoteStatus,
    error::DeviceError,
    models::{AlertConfig, DataSource, Reading},
    schedule::TurningSchedule,
};

#[derive(Debug)]
pub enum Event {
    /// One second elapsed.
    CountdownTick,
    /// Time to refresh the live status.
    StatusTick,
    /// Time to refresh the reading history.
    LogTick,
    StatusFetched {
        epoch: u64,
        result: Result<RemoteStatus, DeviceError>,
    },
    LogsFetched {
        epoch: u64,
        result: Result<Vec<Reading>, DeviceError>,
    },
    Command(Command),
}

#[derive(Debug)]
pub enum Command {
    /// Mark an alert acknowledged. Replies `false` when the id is unknown.
    AcknowledgeAlert {
        id: Uuid,
        reply: oneshot::Sender<bool>,
    },

    /// Replace the alert thresholds. The config is already validated.
    SetAlertConfig {
        config: AlertConfig,
        reply: oneshot::Sender<()>,
    },

    /// Store a turning schedule and push it to the device when live.
    SaveSchedule {
        schedule: TurningSchedule,
        reply: oneshot::Sender<()>,
    },

    /// Refresh the reading history now instead of waiting for the log tick.
    RefreshLogs { reply: oneshot::Sender<()> },

    /// Switch between simulated and device data.
    SetDataSource {
        source: DataSource,
        reply: oneshot::Sender<()>,
    },
}

impl From<Command> for Event {
    fn from(cmd: Command) -> Self {
        Event::Command(cmd)
    }
}

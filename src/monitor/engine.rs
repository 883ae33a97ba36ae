use std::sync::Arc;

use chrono::Utc;
use rand::rngs::StdRng;
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, info, warn};

use super::{
    events::{Command, Event},
    handle::MonitorHandle,
    state::{Effect, MonitorState},
};
use crate::device::DeviceClient;

const EVENT_QUEUE_CAPACITY: usize = 64;

/// The single writer of [`MonitorState`].
///
/// Events are applied one at a time in arrival order. Device calls run on
/// their own tasks and report back as events, so a slow device never blocks
/// countdown ticks or operator commands.
pub struct Engine {
    state: Arc<RwLock<MonitorState>>,
    events: mpsc::Receiver<Event>,
    /// Weak so the engine stops once every handle and timer is gone.
    feedback: mpsc::WeakSender<Event>,
    device: DeviceClient,
    log_fetch_limit: u32,
    rng: StdRng,
}

impl Engine {
    pub fn new(
        state: MonitorState,
        device: DeviceClient,
        log_fetch_limit: u32,
        rng: StdRng,
    ) -> (Self, MonitorHandle) {
        let (tx, rx) = mpsc::channel(EVENT_QUEUE_CAPACITY);
        let state = Arc::new(RwLock::new(state));

        let engine = Self {
            state: state.clone(),
            events: rx,
            feedback: tx.downgrade(),
            device,
            log_fetch_limit,
            rng,
        };
        (engine, MonitorHandle::new(state, tx))
    }

    pub async fn run(mut self) {
        info!(device = self.device.base_url(), "Monitor engine started");

        let effects = self.state.write().await.on_start(Utc::now());
        for effect in effects {
            self.execute(effect);
        }

        while let Some(event) = self.events.recv().await {
            if let Some(effect) = self.apply(event).await {
                self.execute(effect);
            }
        }

        info!("Monitor engine stopped");
    }

    async fn apply(&mut self, event: Event) -> Option<Effect> {
        let now = Utc::now();
        let mut state = self.state.write().await;

        match event {
            Event::CountdownTick => {
                state.on_countdown_tick();
                None
            }
            Event::StatusTick => state.on_status_tick(&mut self.rng, now),
            Event::LogTick => state.on_log_tick(now),
            Event::StatusFetched { epoch, result } => {
                state.on_status_fetched(epoch, result, now);
                None
            }
            Event::LogsFetched { epoch, result } => {
                state.on_logs_fetched(epoch, result);
                None
            }
            Event::Command(cmd) => match cmd {
                Command::AcknowledgeAlert { id, reply } => {
                    let _ = reply.send(state.acknowledge(id));
                    None
                }
                Command::SetAlertConfig { config, reply } => {
                    state.set_alert_config(config);
                    let _ = reply.send(());
                    None
                }
                Command::SaveSchedule { schedule, reply } => {
                    let effect = state.save_schedule(schedule);
                    let _ = reply.send(());
                    effect
                }
                Command::RefreshLogs { reply } => {
                    let effect = state.on_log_tick(now);
                    let _ = reply.send(());
                    effect
                }
                Command::SetDataSource { source, reply } => {
                    let effect = state.set_source(source, &mut self.rng, now);
                    let _ = reply.send(());
                    effect
                }
            },
        }
    }

    fn execute(&self, effect: Effect) {
        let device = self.device.clone();

        match effect {
            Effect::FetchStatus { epoch } => {
                let Some(events) = self.feedback.upgrade() else {
                    return;
                };
                tokio::spawn(async move {
                    let result = device.fetch_status().await;
                    if events.send(Event::StatusFetched { epoch, result }).await.is_err() {
                        debug!("Engine stopped before status fetch completed");
                    }
                });
            }
            Effect::FetchLogs { epoch } => {
                let Some(events) = self.feedback.upgrade() else {
                    return;
                };
                let limit = self.log_fetch_limit;
                tokio::spawn(async move {
                    let result = device.fetch_logs(limit).await;
                    if events.send(Event::LogsFetched { epoch, result }).await.is_err() {
                        debug!("Engine stopped before log fetch completed");
                    }
                });
            }
            Effect::PostSchedule(schedule) => {
                tokio::spawn(async move {
                    match device.post_schedule(&schedule).await {
                        Ok(()) => info!(
                            turns_per_day = schedule.turns_per_day,
                            "Turning schedule pushed to device"
                        ),
                        Err(e) => warn!(error = %e, "Failed to push turning schedule to device"),
                    }
                });
            }
        }
    }
}

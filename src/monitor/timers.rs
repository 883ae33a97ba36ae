use std::time::Duration;

use tokio::{
    sync::mpsc,
    task::JoinHandle,
    time::{self, Instant, MissedTickBehavior},
};
use tracing::debug;

use super::events::Event;

pub const COUNTDOWN_PERIOD: Duration = Duration::from_secs(1);

/// Refresh periods for the polling timers.
#[derive(Debug, Clone, Copy)]
pub struct PollIntervals {
    pub status: Duration,
    pub logs: Duration,
}

/// Spawn the countdown, status and log timers. Each first fires one period
/// after start; the engine handles startup itself.
pub fn spawn_timers(events: mpsc::Sender<Event>, intervals: PollIntervals) -> Vec<JoinHandle<()>> {
    vec![
        tokio::spawn(tick("countdown", events.clone(), COUNTDOWN_PERIOD, || Event::CountdownTick)),
        tokio::spawn(tick("status", events.clone(), intervals.status, || Event::StatusTick)),
        tokio::spawn(tick("logs", events, intervals.logs, || Event::LogTick)),
    ]
}

async fn tick(name: &'static str, events: mpsc::Sender<Event>, period: Duration, make: fn() -> Event) {
    let mut interval = time::interval_at(Instant::now() + period, period);
    // A late tick is not replayed; the next one catches up.
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        interval.tick().await;
        if events.send(make()).await.is_err() {
            debug!(timer = name, "Engine stopped, timer exiting");
            break;
        }
    }
}

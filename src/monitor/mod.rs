//! The monitor engine: one task owns all incubator state and applies timer
//! ticks, device results and operator commands to it in order.

pub mod engine;
pub mod events;
pub mod handle;
pub mod state;
pub mod timers;

pub use engine::Engine;
pub use handle::MonitorHandle;
pub use state::MonitorState;
pub use timers::{spawn_timers, PollIntervals};

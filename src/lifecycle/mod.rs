//! Session lifecycle
//!
//! `Idle -> Creating -> Active -> Closing -> CoolingDown -> Idle`, driven by
//! motion sensor edges and two timers per session:
//! - close timer: ends capture `duration_ms` after publishing starts
//! - rearm timer: reopens the guard `duration_ms + cooldown_buffer_ms` after
//!   publishing starts, regardless of how long teardown takes

mod config;
mod controller;
mod guard;
mod state;
mod timers;

pub use config::SessionConfig;
pub use controller::{Collaborators, SessionController};
pub use guard::SessionGuard;
pub use state::{LifecycleState, LifecycleStatus};
pub use timers::{TimerFired, TimerKind, TimerSet};

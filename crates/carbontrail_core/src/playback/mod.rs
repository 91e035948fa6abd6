//! Timed playback over a project's lifecycle events.

pub mod clock;
pub mod controller;
pub mod timer;

pub use clock::{Clock, ManualClock, SystemClock};
pub use controller::{
    ObserverId, PlaybackController, PlaybackError, PlaybackNotice, PlaybackObserver,
    PlaybackPhase, PlaybackSpeed,
};
pub use timer::{ScheduledTask, TimerId, TimerSlot};

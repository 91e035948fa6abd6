//! Playback state machine.
//!
//! # Responsibility
//! - Step through an ordered event sequence on a timer.
//! - Handle pause/resume, manual stepping and speed changes.
//! - Notify subscribed observers of every state change.
//!
//! # Invariants
//! - At most one timer is pending; every arming goes through `arm_step`,
//!   which replaces the previous task.
//! - `index` is always within `[0, len - 1]` for a non-empty sequence.
//! - No advance fires after `close()` or drop.
//! - An empty sequence never arms a timer.

use super::clock::{Clock, SystemClock};
use super::timer::{ScheduledTask, TimerSlot};
use crate::model::event::LifecycleEvent;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Controller phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackPhase {
    Idle,
    Playing,
    Paused,
    /// The last event has been held for a full interval.
    Finished,
}

/// Supported step intervals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackSpeed {
    /// 0.5x, 5000 ms per event.
    Half,
    /// 1x, 3000 ms per event.
    #[default]
    Normal,
    /// 2x, 1500 ms per event.
    Double,
}

impl PlaybackSpeed {
    pub const ALL: [PlaybackSpeed; 3] = [Self::Half, Self::Normal, Self::Double];

    pub fn millis(self) -> u64 {
        match self {
            Self::Half => 5000,
            Self::Normal => 3000,
            Self::Double => 1500,
        }
    }

    pub fn from_millis(ms: u64) -> Option<Self> {
        Self::ALL.into_iter().find(|speed| speed.millis() == ms)
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Half => "0.5x",
            Self::Normal => "1x",
            Self::Double => "2x",
        }
    }
}

/// Change notification delivered to observers.
#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackNotice {
    Opened { len: usize },
    IndexChanged { index: usize },
    Paused,
    Resumed,
    SpeedChanged(PlaybackSpeed),
    /// The final event's interval elapsed; the owner should close playback.
    Completed,
    Closed,
}

/// Subscriber for playback notices.
pub trait PlaybackObserver {
    fn on_notice(&mut self, notice: &PlaybackNotice);
}

impl<F> PlaybackObserver for F
where
    F: FnMut(&PlaybackNotice),
{
    fn on_notice(&mut self, notice: &PlaybackNotice) {
        self(notice)
    }
}

/// Handle returned by `subscribe`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObserverId(pub(crate) u64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackError {
    UnsupportedSpeed(u64),
}

impl Display for PlaybackError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnsupportedSpeed(ms) => write!(
                f,
                "unsupported playback speed {ms} ms; expected 5000|3000|1500"
            ),
        }
    }
}

impl Error for PlaybackError {}

/// Timed tour over an ordered event sequence.
pub struct PlaybackController<C: Clock = SystemClock> {
    clock: C,
    project_id: String,
    events: Vec<LifecycleEvent>,
    index: usize,
    phase: PlaybackPhase,
    speed: PlaybackSpeed,
    open: bool,
    timer: TimerSlot,
    observers: Vec<(ObserverId, Box<dyn PlaybackObserver>)>,
    next_observer_id: u64,
}

impl PlaybackController<SystemClock> {
    pub fn with_system_clock(speed: PlaybackSpeed) -> Self {
        Self::new(SystemClock::new(), speed)
    }
}

impl<C: Clock> PlaybackController<C> {
    pub fn new(clock: C, speed: PlaybackSpeed) -> Self {
        Self {
            clock,
            project_id: String::new(),
            events: Vec::new(),
            index: 0,
            phase: PlaybackPhase::Idle,
            speed,
            open: false,
            timer: TimerSlot::new(),
            observers: Vec::new(),
            next_observer_id: 0,
        }
    }

    pub fn subscribe(&mut self, observer: impl PlaybackObserver + 'static) -> ObserverId {
        self.next_observer_id += 1;
        let id = ObserverId(self.next_observer_id);
        self.observers.push((id, Box::new(observer)));
        id
    }

    pub fn unsubscribe(&mut self, id: ObserverId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(candidate, _)| *candidate != id);
        self.observers.len() != before
    }

    /// Starts playback at index 0.
    ///
    /// Re-opening replaces the previous sequence. An empty sequence is
    /// accepted as a degenerate state: nothing is armed and every command is
    /// a no-op until `close()`.
    pub fn open(&mut self, project_id: impl Into<String>, events: Vec<LifecycleEvent>) {
        self.timer.cancel();
        self.project_id = project_id.into();
        self.events = events;
        self.index = 0;
        self.open = true;

        if self.events.is_empty() {
            self.phase = PlaybackPhase::Idle;
            info!(
                "event=playback_open module=playback status=empty project_id={}",
                self.project_id
            );
        } else {
            self.phase = PlaybackPhase::Playing;
            self.arm_step();
            info!(
                "event=playback_open module=playback status=ok project_id={} len={} speed_ms={}",
                self.project_id,
                self.events.len(),
                self.speed.millis()
            );
        }
        self.notify(PlaybackNotice::Opened {
            len: self.events.len(),
        });
    }

    /// Tears playback down; pending timers are cancelled.
    pub fn close(&mut self) {
        if !self.open {
            return;
        }
        self.timer.cancel();
        self.events.clear();
        self.index = 0;
        self.phase = PlaybackPhase::Idle;
        self.open = false;
        info!(
            "event=playback_close module=playback status=ok project_id={}",
            self.project_id
        );
        self.notify(PlaybackNotice::Closed);
    }

    pub fn pause(&mut self) {
        if self.phase != PlaybackPhase::Playing {
            return;
        }
        self.timer.cancel();
        self.phase = PlaybackPhase::Paused;
        debug!(
            "event=playback_pause module=playback index={}",
            self.index
        );
        self.notify(PlaybackNotice::Paused);
    }

    /// Resumes with a fresh full interval from the current index.
    pub fn resume(&mut self) {
        if self.phase != PlaybackPhase::Paused {
            return;
        }
        self.phase = PlaybackPhase::Playing;
        self.arm_step();
        debug!(
            "event=playback_resume module=playback index={}",
            self.index
        );
        self.notify(PlaybackNotice::Resumed);
    }

    pub fn toggle_pause(&mut self) {
        if self.phase == PlaybackPhase::Paused {
            self.resume();
        } else {
            self.pause();
        }
    }

    pub fn step_previous(&mut self) {
        self.seek(self.index.saturating_sub(1));
    }

    pub fn step_next(&mut self) {
        self.seek(self.index.saturating_add(1));
    }

    /// Moves to `index`, clamped to the sequence.
    ///
    /// Keeps the playing/paused phase; while playing, the in-flight timer is
    /// replaced by a fresh one at the new index.
    pub fn seek(&mut self, index: usize) {
        if !self.is_active() {
            return;
        }
        let target = index.min(self.events.len() - 1);
        if target == self.index {
            return;
        }
        self.index = target;
        if self.phase == PlaybackPhase::Playing {
            self.arm_step();
        }
        debug!(
            "event=playback_seek module=playback index={} len={}",
            self.index,
            self.events.len()
        );
        self.notify(PlaybackNotice::IndexChanged { index: self.index });
    }

    /// Changes the interval used by future arming only.
    pub fn set_speed(&mut self, speed: PlaybackSpeed) {
        if speed == self.speed {
            return;
        }
        self.speed = speed;
        debug!(
            "event=playback_speed module=playback speed_ms={}",
            speed.millis()
        );
        self.notify(PlaybackNotice::SpeedChanged(speed));
    }

    pub fn set_speed_millis(&mut self, ms: u64) -> Result<(), PlaybackError> {
        let speed = PlaybackSpeed::from_millis(ms).ok_or(PlaybackError::UnsupportedSpeed(ms))?;
        self.set_speed(speed);
        Ok(())
    }

    /// Fires every timer that is due on the clock.
    ///
    /// Returns the number of fires processed. Each follow-up timer is armed
    /// relative to the deadline it replaces, so a late poll catches up.
    pub fn poll(&mut self) -> usize {
        let now = self.clock.now_ms();
        let mut fired = 0;
        while let Some(task) = self.timer.take_due(now) {
            fired += 1;
            self.fire(task);
        }
        fired
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn current_event(&self) -> Option<&LifecycleEvent> {
        self.events.get(self.index)
    }

    pub fn events(&self) -> &[LifecycleEvent] {
        &self.events
    }

    pub fn phase(&self) -> PlaybackPhase {
        self.phase
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn is_paused(&self) -> bool {
        self.phase == PlaybackPhase::Paused
    }

    pub fn is_finished(&self) -> bool {
        self.phase == PlaybackPhase::Finished
    }

    pub fn speed(&self) -> PlaybackSpeed {
        self.speed
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    /// Fraction of the sequence reached, `(index + 1) / len`.
    pub fn progress(&self) -> f64 {
        if self.events.is_empty() {
            return 0.0;
        }
        (self.index + 1) as f64 / self.events.len() as f64
    }

    /// `"{index + 1} / {len}"`.
    pub fn position_label(&self) -> String {
        if self.events.is_empty() {
            return "0 / 0".to_string();
        }
        format!("{} / {}", self.index + 1, self.events.len())
    }

    pub fn pending_timer(&self) -> Option<ScheduledTask> {
        self.timer.pending()
    }

    /// Number of timers ever armed by this controller.
    pub fn timers_armed(&self) -> u64 {
        self.timer.armed_total()
    }

    fn is_active(&self) -> bool {
        self.open && !self.events.is_empty() && self.phase != PlaybackPhase::Idle
    }

    fn arm_step(&mut self) {
        let now = self.clock.now_ms();
        self.timer.arm(now, self.speed.millis());
    }

    fn fire(&mut self, task: ScheduledTask) {
        if self.phase != PlaybackPhase::Playing {
            return;
        }
        if self.index + 1 < self.events.len() {
            self.index += 1;
            self.timer
                .arm_at(task.due_at_ms.saturating_add(self.speed.millis()));
            debug!(
                "event=playback_advance module=playback index={} len={}",
                self.index,
                self.events.len()
            );
            self.notify(PlaybackNotice::IndexChanged { index: self.index });
        } else {
            self.phase = PlaybackPhase::Finished;
            info!(
                "event=playback_complete module=playback status=ok project_id={} len={}",
                self.project_id,
                self.events.len()
            );
            self.notify(PlaybackNotice::Completed);
        }
    }

    fn notify(&mut self, notice: PlaybackNotice) {
        for (_, observer) in &mut self.observers {
            observer.on_notice(&notice);
        }
    }
}

impl<C: Clock> Drop for PlaybackController<C> {
    fn drop(&mut self) {
        self.timer.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::{PlaybackController, PlaybackPhase, PlaybackSpeed};
    use crate::model::coordinate::Coordinate;
    use crate::model::event::{EventCategory, LifecycleEvent};
    use crate::playback::clock::ManualClock;
    use chrono::{TimeZone, Utc};

    fn events(count: usize) -> Vec<LifecycleEvent> {
        (0..count)
            .map(|i| {
                LifecycleEvent::new(
                    format!("e{i}"),
                    EventCategory::Pyrolysis,
                    Coordinate::new(20.0, -156.0),
                    Utc.with_ymd_and_hms(2024, 1, 1 + i as u32, 0, 0, 0).unwrap(),
                )
            })
            .collect()
    }

    #[test]
    fn seek_clamps_into_range() {
        let clock = ManualClock::new();
        let mut controller = PlaybackController::new(clock, PlaybackSpeed::Normal);
        controller.open("p", events(3));
        controller.seek(99);
        assert_eq!(controller.index(), 2);
        controller.step_next();
        assert_eq!(controller.index(), 2);
        controller.seek(0);
        controller.step_previous();
        assert_eq!(controller.index(), 0);
    }

    #[test]
    fn late_poll_catches_up_without_skipping_completion() {
        let clock = ManualClock::new();
        let mut controller = PlaybackController::new(clock.clone(), PlaybackSpeed::Double);
        controller.open("p", events(3));
        clock.advance(10_000);
        assert_eq!(controller.poll(), 3);
        assert_eq!(controller.index(), 2);
        assert_eq!(controller.phase(), PlaybackPhase::Finished);
        assert!(controller.pending_timer().is_none());
    }

    #[test]
    fn drop_cancels_pending_timer() {
        let clock = ManualClock::new();
        let mut controller = PlaybackController::new(clock, PlaybackSpeed::Normal);
        controller.open("p", events(2));
        assert!(controller.pending_timer().is_some());
        drop(controller);
    }

    #[test]
    fn position_label_and_progress() {
        let clock = ManualClock::new();
        let mut controller = PlaybackController::new(clock, PlaybackSpeed::Normal);
        assert_eq!(controller.position_label(), "0 / 0");
        controller.open("p", events(4));
        controller.seek(1);
        assert_eq!(controller.position_label(), "2 / 4");
        assert!((controller.progress() - 0.5).abs() < 1e-12);
    }
}

use carbontrail_core::model::coordinate::Coordinate;
use carbontrail_core::model::event::{EventCategory, LifecycleEvent};
use carbontrail_core::playback::{
    ManualClock, PlaybackController, PlaybackError, PlaybackNotice, PlaybackPhase, PlaybackSpeed,
};
use chrono::{Duration, TimeZone, Utc};
use std::cell::RefCell;
use std::rc::Rc;

fn events(count: usize) -> Vec<LifecycleEvent> {
    let start = Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap();
    (0..count)
        .map(|i| {
            LifecycleEvent::new(
                format!("evt-{i}"),
                EventCategory::SensorReading,
                Coordinate::new(20.9211, -156.3087),
                start + Duration::hours(i as i64),
            )
        })
        .collect()
}

fn controller(clock: &ManualClock) -> PlaybackController<ManualClock> {
    PlaybackController::new(clock.clone(), PlaybackSpeed::Normal)
}

fn recorded(controller: &mut PlaybackController<ManualClock>) -> Rc<RefCell<Vec<PlaybackNotice>>> {
    let log = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&log);
    controller.subscribe(move |notice: &PlaybackNotice| sink.borrow_mut().push(notice.clone()));
    log
}

#[test]
fn three_events_advance_then_complete() {
    let clock = ManualClock::new();
    let mut playback = controller(&clock);
    let notices = recorded(&mut playback);

    playback.open("maui-biochar", events(3));
    assert_eq!(playback.phase(), PlaybackPhase::Playing);
    assert_eq!(playback.index(), 0);

    clock.advance(2999);
    assert_eq!(playback.poll(), 0);
    assert_eq!(playback.index(), 0);

    clock.advance(1);
    assert_eq!(playback.poll(), 1);
    assert_eq!(playback.index(), 1);

    clock.advance(3000);
    assert_eq!(playback.poll(), 1);
    assert_eq!(playback.index(), 2);
    assert!(!playback.is_finished());

    // The last event is held for one full interval before completion.
    clock.advance(3000);
    assert_eq!(playback.poll(), 1);
    assert_eq!(playback.index(), 2);
    assert!(playback.is_finished());
    assert!(playback.pending_timer().is_none());

    assert_eq!(
        notices.borrow().as_slice(),
        &[
            PlaybackNotice::Opened { len: 3 },
            PlaybackNotice::IndexChanged { index: 1 },
            PlaybackNotice::IndexChanged { index: 2 },
            PlaybackNotice::Completed,
        ]
    );
}

#[test]
fn resume_rearms_a_full_interval() {
    let clock = ManualClock::new();
    let mut playback = controller(&clock);
    playback.open("p", events(3));

    clock.advance(2000);
    playback.pause();
    assert!(playback.is_paused());
    assert!(playback.pending_timer().is_none());

    clock.advance(10_000);
    assert_eq!(playback.poll(), 0);
    assert_eq!(playback.index(), 0);

    playback.resume();
    assert_eq!(
        playback.pending_timer().map(|task| task.due_at_ms),
        Some(12_000 + 3000)
    );
    clock.advance(2999);
    playback.poll();
    assert_eq!(playback.index(), 0);
    clock.advance(1);
    playback.poll();
    assert_eq!(playback.index(), 1);
}

#[test]
fn repeated_same_speed_is_a_no_op() {
    let clock = ManualClock::new();
    let mut playback = controller(&clock);
    let notices = recorded(&mut playback);
    playback.open("p", events(3));
    let armed = playback.timers_armed();
    let pending = playback.pending_timer();

    for _ in 0..5 {
        playback.set_speed(PlaybackSpeed::Normal);
        playback.set_speed_millis(3000).unwrap();
    }

    assert_eq!(playback.index(), 0);
    assert!(!playback.is_paused());
    assert_eq!(playback.timers_armed(), armed);
    assert_eq!(playback.pending_timer(), pending);
    assert_eq!(notices.borrow().len(), 1);
}

#[test]
fn speed_change_applies_to_next_arming_only() {
    let clock = ManualClock::new();
    let mut playback = controller(&clock);
    playback.open("p", events(3));

    playback.set_speed(PlaybackSpeed::Double);
    assert_eq!(playback.pending_timer().map(|task| task.due_at_ms), Some(3000));

    clock.advance(3000);
    playback.poll();
    assert_eq!(playback.index(), 1);
    assert_eq!(playback.pending_timer().map(|task| task.due_at_ms), Some(4500));
}

#[test]
fn unsupported_speed_is_rejected() {
    let clock = ManualClock::new();
    let mut playback = controller(&clock);
    assert_eq!(
        playback.set_speed_millis(1000),
        Err(PlaybackError::UnsupportedSpeed(1000))
    );
    assert_eq!(playback.speed(), PlaybackSpeed::Normal);
    playback.set_speed_millis(5000).unwrap();
    assert_eq!(playback.speed(), PlaybackSpeed::Half);
    assert_eq!(playback.speed().label(), "0.5x");
}

#[test]
fn manual_step_supersedes_in_flight_timer() {
    let clock = ManualClock::new();
    let mut playback = controller(&clock);
    playback.open("p", events(4));

    clock.advance(2500);
    playback.step_next();
    assert_eq!(playback.index(), 1);
    assert_eq!(playback.pending_timer().map(|task| task.due_at_ms), Some(5500));

    // The superseded deadline at 3000 must not advance again.
    clock.advance(500);
    assert_eq!(playback.poll(), 0);
    assert_eq!(playback.index(), 1);

    clock.advance(2500);
    assert_eq!(playback.poll(), 1);
    assert_eq!(playback.index(), 2);
}

#[test]
fn manual_step_keeps_pause() {
    let clock = ManualClock::new();
    let mut playback = controller(&clock);
    playback.open("p", events(3));
    playback.pause();

    playback.step_next();
    playback.step_next();
    playback.step_next();
    assert_eq!(playback.index(), 2);
    assert!(playback.is_paused());
    assert!(playback.pending_timer().is_none());

    playback.step_previous();
    assert_eq!(playback.index(), 1);
    assert_eq!(playback.position_label(), "2 / 3");
}

#[test]
fn toggle_pause_flips_between_playing_and_paused() {
    let clock = ManualClock::new();
    let mut playback = controller(&clock);
    playback.open("p", events(2));
    playback.toggle_pause();
    assert_eq!(playback.phase(), PlaybackPhase::Paused);
    playback.toggle_pause();
    assert_eq!(playback.phase(), PlaybackPhase::Playing);
}

#[test]
fn close_cancels_timer_and_blocks_advances() {
    let clock = ManualClock::new();
    let mut playback = controller(&clock);
    let notices = recorded(&mut playback);
    playback.open("p", events(3));
    playback.close();

    assert!(playback.pending_timer().is_none());
    assert!(!playback.is_open());
    clock.advance(60_000);
    assert_eq!(playback.poll(), 0);
    assert!(playback.current_event().is_none());
    assert_eq!(notices.borrow().last(), Some(&PlaybackNotice::Closed));
}

#[test]
fn empty_sequence_never_arms_a_timer() {
    let clock = ManualClock::new();
    let mut playback = controller(&clock);
    playback.open("empty", Vec::new());

    assert!(playback.current_event().is_none());
    assert_eq!(playback.phase(), PlaybackPhase::Idle);
    playback.resume();
    playback.pause();
    playback.step_next();
    playback.step_previous();
    playback.seek(3);
    clock.advance(60_000);
    assert_eq!(playback.poll(), 0);
    playback.close();

    assert!(playback.current_event().is_none());
    assert_eq!(playback.timers_armed(), 0);
    assert_eq!(playback.progress(), 0.0);
}

#[test]
fn unsubscribed_observer_stops_receiving() {
    let clock = ManualClock::new();
    let mut playback = controller(&clock);
    let count = Rc::new(RefCell::new(0usize));
    let sink = Rc::clone(&count);
    let id = playback.subscribe(move |_: &PlaybackNotice| *sink.borrow_mut() += 1);
    playback.open("p", events(2));
    assert!(playback.unsubscribe(id));
    playback.pause();
    assert_eq!(*count.borrow(), 1);
    assert!(!playback.unsubscribe(id));
}

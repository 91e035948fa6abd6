//! Map session use-case service.
//!
//! # Responsibility
//! - Own one project's browsing state: selection and optional playback.
//! - Derive the focused event, highlighted path, viewport and scene.
//! - Fan selection and playback notices out to session observers.
//!
//! # Invariants
//! - While playback is active it owns the selection; user commands are
//!   rejected until playback stops.
//! - The playback controller is never handed out mutably; it always plays
//!   the session project's own events.
//! - Stopping playback (explicitly or on completion) drops the controller,
//!   which cancels its timer.
//! - Observers are attached before playback opens, so they see `Opened`.
//! - Known locations and connector paths are computed once per session.

use crate::config::EngineConfig;
use crate::model::event::LifecycleEvent;
use crate::model::project::{Project, ProjectValidationError};
use crate::playback::{
    Clock, ObserverId, PlaybackController, PlaybackError, PlaybackNotice, PlaybackSpeed,
    SystemClock,
};
use crate::service::selection::{
    SelectionController, SelectionError, SelectionNotice, SelectionState,
};
use crate::spatial::classifier::KnownLocations;
use crate::spatial::path::{connector_paths, resolve_highlighted_path, HighlightedPath};
use crate::view::scene::{build_scene, IconResolver, MapSurface, SceneFrame, SceneInput};
use crate::view::viewport::{compute_viewport, location_bounds, ViewportInput, ViewportTarget};
use log::info;
use std::cell::RefCell;
use std::rc::Rc;

/// Notice forwarded to session observers.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionNotice {
    Selection(SelectionNotice),
    Playback(PlaybackNotice),
}

/// Subscriber for session notices; the rendering layer hooks in here.
pub trait SessionObserver {
    fn on_notice(&mut self, notice: &SessionNotice);
}

impl<F> SessionObserver for F
where
    F: FnMut(&SessionNotice),
{
    fn on_notice(&mut self, notice: &SessionNotice) {
        self(notice)
    }
}

type SharedObservers = Rc<RefCell<Vec<(ObserverId, Box<dyn SessionObserver>)>>>;

/// Interactive map state for one project.
pub struct MapSession<C: Clock + Clone = SystemClock> {
    project: Project,
    config: EngineConfig,
    clock: C,
    selection: SelectionController,
    playback: Option<PlaybackController<C>>,
    speed: PlaybackSpeed,
    known_locations: KnownLocations,
    connector_paths: Vec<HighlightedPath>,
    observers: SharedObservers,
    next_observer_id: u64,
}

impl MapSession<SystemClock> {
    pub fn with_system_clock(
        project: Project,
        config: EngineConfig,
    ) -> Result<Self, ProjectValidationError> {
        Self::new(project, config, SystemClock::new())
    }
}

impl<C: Clock + Clone> MapSession<C> {
    /// Validates `project` and starts with nothing selected.
    pub fn new(
        project: Project,
        config: EngineConfig,
        clock: C,
    ) -> Result<Self, ProjectValidationError> {
        project.validate()?;
        let known_locations = KnownLocations::for_project(&project);
        let connector_paths = connector_paths(&known_locations);
        let observers = SharedObservers::default();
        let mut selection = SelectionController::new(project.events.len());
        let sink = Rc::clone(&observers);
        selection.subscribe(move |notice: &SelectionNotice| {
            broadcast(&sink, &SessionNotice::Selection(*notice));
        });
        let speed = config.playback.speed;
        Ok(Self {
            project,
            config,
            clock,
            selection,
            playback: None,
            speed,
            known_locations,
            connector_paths,
            observers,
            next_observer_id: 0,
        })
    }

    pub fn subscribe(&mut self, observer: impl SessionObserver + 'static) -> ObserverId {
        self.next_observer_id += 1;
        let id = ObserverId(self.next_observer_id);
        self.observers.borrow_mut().push((id, Box::new(observer)));
        id
    }

    pub fn unsubscribe(&mut self, id: ObserverId) -> bool {
        let mut observers = self.observers.borrow_mut();
        let before = observers.len();
        observers.retain(|(candidate, _)| *candidate != id);
        observers.len() != before
    }

    pub fn project(&self) -> &Project {
        &self.project
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn known_locations(&self) -> &KnownLocations {
        &self.known_locations
    }

    pub fn connector_paths(&self) -> &[HighlightedPath] {
        &self.connector_paths
    }

    pub fn selection(&self) -> SelectionState {
        self.selection.state()
    }

    pub fn toggle_selection(&mut self, index: usize) -> Result<SelectionState, SelectionError> {
        self.selection.toggle(index)
    }

    pub fn select(&mut self, index: usize) -> Result<(), SelectionError> {
        self.selection.select(index)
    }

    pub fn clear_selection(&mut self) -> Result<(), SelectionError> {
        self.selection.clear()
    }

    /// Opens playback over the project's events from index 0.
    ///
    /// Returns `false` without opening when the project has no events.
    /// An already active playback is restarted.
    pub fn start_playback(&mut self) -> bool {
        if self.project.events.is_empty() {
            info!(
                "event=playback_start module=service status=skipped reason=no_events project_id={}",
                self.project.id
            );
            return false;
        }
        self.stop_playback();

        let mut controller = PlaybackController::new(self.clock.clone(), self.speed);
        let sink = Rc::clone(&self.observers);
        controller.subscribe(move |notice: &PlaybackNotice| {
            broadcast(&sink, &SessionNotice::Playback(notice.clone()));
        });
        self.selection.transfer_to_playback();
        controller.open(self.project.id.clone(), self.project.events.clone());
        self.playback = Some(controller);
        true
    }

    /// Tears playback down and hands the (cleared) selection back to the user.
    pub fn stop_playback(&mut self) {
        if let Some(mut controller) = self.playback.take() {
            self.speed = controller.speed();
            controller.close();
            self.selection.release_from_playback();
        }
    }

    pub fn playback(&self) -> Option<&PlaybackController<C>> {
        self.playback.as_ref()
    }

    pub fn is_playing(&self) -> bool {
        self.playback.is_some()
    }

    /// Speed used by the active playback, or by the next one.
    pub fn speed(&self) -> PlaybackSpeed {
        self.playback
            .as_ref()
            .map_or(self.speed, |controller| controller.speed())
    }

    pub fn pause(&mut self) {
        if let Some(controller) = self.playback.as_mut() {
            controller.pause();
        }
    }

    pub fn resume(&mut self) {
        if let Some(controller) = self.playback.as_mut() {
            controller.resume();
        }
    }

    pub fn toggle_pause(&mut self) {
        if let Some(controller) = self.playback.as_mut() {
            controller.toggle_pause();
        }
    }

    pub fn step_previous(&mut self) {
        if let Some(controller) = self.playback.as_mut() {
            controller.step_previous();
        }
    }

    pub fn step_next(&mut self) {
        if let Some(controller) = self.playback.as_mut() {
            controller.step_next();
        }
    }

    /// Moves playback to `index`, clamped; ignored when not playing.
    pub fn seek(&mut self, index: usize) {
        if let Some(controller) = self.playback.as_mut() {
            controller.seek(index);
        }
    }

    /// Applies to the active playback and is remembered for the next one.
    pub fn set_speed(&mut self, speed: PlaybackSpeed) {
        self.speed = speed;
        if let Some(controller) = self.playback.as_mut() {
            controller.set_speed(speed);
        }
    }

    pub fn set_speed_millis(&mut self, ms: u64) -> Result<(), PlaybackError> {
        let speed = PlaybackSpeed::from_millis(ms).ok_or(PlaybackError::UnsupportedSpeed(ms))?;
        self.set_speed(speed);
        Ok(())
    }

    /// Drives the playback timer; completed playback is torn down here.
    ///
    /// Returns the number of timer fires processed.
    pub fn poll(&mut self) -> usize {
        let Some(controller) = self.playback.as_mut() else {
            return 0;
        };
        let fired = controller.poll();
        if controller.is_finished() {
            self.stop_playback();
        }
        fired
    }

    /// Index of the focused event: playback's current event, else the selection.
    pub fn focused_index(&self) -> Option<usize> {
        match &self.playback {
            Some(controller) if !controller.is_empty() => Some(controller.index()),
            Some(_) => None,
            None => self.selection.selected(),
        }
    }

    pub fn focused_event(&self) -> Option<&LifecycleEvent> {
        self.focused_index()
            .and_then(|index| self.project.event(index))
    }

    pub fn highlighted_path(&self) -> Option<HighlightedPath> {
        self.focused_event().and_then(|event| {
            resolve_highlighted_path(event, self.project.methodology, &self.known_locations)
        })
    }

    pub fn viewport(&self) -> ViewportTarget {
        let highlighted = self.highlighted_path();
        self.viewport_with(highlighted.as_ref())
    }

    pub fn scene<R: IconResolver + ?Sized>(&self, icons: &R) -> SceneFrame<R::Icon> {
        let highlighted = self.highlighted_path();
        let viewport = self.viewport_with(highlighted.as_ref());
        build_scene(
            &SceneInput {
                project: &self.project,
                config: &self.config,
                known_locations: &self.known_locations,
                connector_paths: &self.connector_paths,
                focused: self.focused_index(),
                highlighted_path: highlighted.as_ref(),
                viewport,
            },
            icons,
        )
    }

    /// Builds the current scene and hands it to `surface`.
    pub fn render<S, R>(&self, surface: &mut S, icons: &R)
    where
        R: IconResolver + ?Sized,
        S: MapSurface<Icon = R::Icon> + ?Sized,
    {
        surface.render(&self.scene(icons));
    }

    fn viewport_with(&self, highlighted: Option<&HighlightedPath>) -> ViewportTarget {
        let policy = &self.config.viewport;
        let playback_event = self
            .playback
            .as_ref()
            .and_then(|controller| controller.current_event());
        let selected = match self.playback {
            Some(_) => None,
            None => self
                .selection
                .selected()
                .and_then(|index| self.project.event(index)),
        };
        let mut input = ViewportInput::home(
            self.project.location,
            &self.known_locations,
            &self.connector_paths,
        );
        input.selected = selected;
        input.playback_event = playback_event;
        input.location_bounds = input
            .focus()
            .and_then(|event| location_bounds(event, policy));
        input.highlighted_path = highlighted;
        compute_viewport(&input, policy)
    }
}

fn broadcast(observers: &SharedObservers, notice: &SessionNotice) {
    for (_, observer) in observers.borrow_mut().iter_mut() {
        observer.on_notice(notice);
    }
}

impl<C: Clock + Clone> Drop for MapSession<C> {
    fn drop(&mut self) {
        self.stop_playback();
    }
}

#[cfg(test)]
mod tests {
    use super::MapSession;
    use crate::config::EngineConfig;
    use crate::model::coordinate::Coordinate;
    use crate::model::project::{Methodology, Project};
    use crate::playback::ManualClock;
    use crate::service::selection::SelectionError;

    #[test]
    fn empty_project_never_starts_playback() {
        let project = Project::new("empty", Methodology::Biochar, Coordinate::new(20.9, -156.3));
        let mut session = MapSession::new(project, EngineConfig::default(), ManualClock::new())
            .unwrap();
        assert!(!session.start_playback());
        assert!(!session.is_playing());
        assert!(session.focused_event().is_none());
        assert_eq!(session.poll(), 0);
    }

    #[test]
    fn selection_rejects_out_of_range_index() {
        let project = Project::new("empty", Methodology::Biochar, Coordinate::new(20.9, -156.3));
        let mut session = MapSession::new(project, EngineConfig::default(), ManualClock::new())
            .unwrap();
        assert_eq!(
            session.select(0),
            Err(SelectionError::OutOfRange { index: 0, len: 0 })
        );
    }
}

//! Selection state for manual event browsing.
//!
//! # Responsibility
//! - Track which event (if any) the user has selected.
//! - Reject user commands while playback owns the selection.
//! - Notify subscribed observers of selection and ownership changes.
//!
//! # Invariants
//! - A selected index is always `< len`.
//! - Only one mode (user or playback) owns the selection at a time.
//! - Observers hear about real changes only; no-op commands stay silent.

use crate::playback::ObserverId;
use log::debug;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Current selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectionState {
    #[default]
    None,
    Event(usize),
}

impl SelectionState {
    pub fn index(self) -> Option<usize> {
        match self {
            Self::None => None,
            Self::Event(index) => Some(index),
        }
    }
}

/// Which mode currently drives the selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectionOwner {
    #[default]
    User,
    Playback,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionError {
    OutOfRange { index: usize, len: usize },
    OwnedByPlayback,
}

impl Display for SelectionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OutOfRange { index, len } => {
                write!(f, "selection index {index} out of range for {len} events")
            }
            Self::OwnedByPlayback => write!(f, "selection is owned by playback"),
        }
    }
}

impl Error for SelectionError {}

/// Change notification delivered to selection observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionNotice {
    Changed(SelectionState),
    OwnerChanged(SelectionOwner),
}

/// Subscriber for selection notices.
pub trait SelectionObserver {
    fn on_notice(&mut self, notice: &SelectionNotice);
}

impl<F> SelectionObserver for F
where
    F: FnMut(&SelectionNotice),
{
    fn on_notice(&mut self, notice: &SelectionNotice) {
        self(notice)
    }
}

/// User-driven selection over a fixed-length event sequence.
pub struct SelectionController {
    len: usize,
    state: SelectionState,
    owner: SelectionOwner,
    observers: Vec<(ObserverId, Box<dyn SelectionObserver>)>,
    next_observer_id: u64,
}

impl SelectionController {
    pub fn new(len: usize) -> Self {
        Self {
            len,
            state: SelectionState::None,
            owner: SelectionOwner::User,
            observers: Vec::new(),
            next_observer_id: 0,
        }
    }

    pub fn subscribe(&mut self, observer: impl SelectionObserver + 'static) -> ObserverId {
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

    pub fn state(&self) -> SelectionState {
        self.state
    }

    pub fn selected(&self) -> Option<usize> {
        self.state.index()
    }

    pub fn owner(&self) -> SelectionOwner {
        self.owner
    }

    /// Selects `index`, or clears when it is already selected.
    pub fn toggle(&mut self, index: usize) -> Result<SelectionState, SelectionError> {
        self.check(index)?;
        let next = if self.state == SelectionState::Event(index) {
            SelectionState::None
        } else {
            SelectionState::Event(index)
        };
        self.set(next);
        Ok(next)
    }

    pub fn select(&mut self, index: usize) -> Result<(), SelectionError> {
        self.check(index)?;
        self.set(SelectionState::Event(index));
        Ok(())
    }

    pub fn clear(&mut self) -> Result<(), SelectionError> {
        self.check_owner()?;
        self.set(SelectionState::None);
        Ok(())
    }

    /// Hands the selection to playback; the user selection is dropped.
    pub(crate) fn transfer_to_playback(&mut self) {
        self.set_owner(SelectionOwner::Playback);
        self.set(SelectionState::None);
    }

    /// Returns the selection to the user with nothing selected.
    pub(crate) fn release_from_playback(&mut self) {
        self.set_owner(SelectionOwner::User);
        self.set(SelectionState::None);
    }

    fn check(&self, index: usize) -> Result<(), SelectionError> {
        self.check_owner()?;
        if index >= self.len {
            return Err(SelectionError::OutOfRange {
                index,
                len: self.len,
            });
        }
        Ok(())
    }

    fn check_owner(&self) -> Result<(), SelectionError> {
        match self.owner {
            SelectionOwner::User => Ok(()),
            SelectionOwner::Playback => Err(SelectionError::OwnedByPlayback),
        }
    }

    fn set(&mut self, next: SelectionState) {
        if next == self.state {
            return;
        }
        self.state = next;
        debug!(
            "event=selection_change module=service status=ok selected={}",
            next.index()
                .map(|index| index.to_string())
                .unwrap_or_else(|| "none".to_string())
        );
        self.notify(SelectionNotice::Changed(next));
    }

    fn set_owner(&mut self, owner: SelectionOwner) {
        if owner == self.owner {
            return;
        }
        self.owner = owner;
        self.notify(SelectionNotice::OwnerChanged(owner));
    }

    fn notify(&mut self, notice: SelectionNotice) {
        for (_, observer) in &mut self.observers {
            observer.on_notice(&notice);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{
        SelectionController, SelectionError, SelectionNotice, SelectionOwner, SelectionState,
    };
    use std::cell::RefCell;
    use std::rc::Rc;

    fn recorded(selection: &mut SelectionController) -> Rc<RefCell<Vec<SelectionNotice>>> {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        selection.subscribe(move |notice: &SelectionNotice| sink.borrow_mut().push(*notice));
        log
    }

    #[test]
    fn toggle_selects_then_deselects() {
        let mut selection = SelectionController::new(3);
        assert_eq!(selection.toggle(1).unwrap(), SelectionState::Event(1));
        assert_eq!(selection.toggle(2).unwrap(), SelectionState::Event(2));
        assert_eq!(selection.toggle(2).unwrap(), SelectionState::None);
    }

    #[test]
    fn rejects_out_of_range_index() {
        let mut selection = SelectionController::new(2);
        let err = selection.select(2).expect_err("index 2 is out of range");
        assert_eq!(err, SelectionError::OutOfRange { index: 2, len: 2 });
        assert_eq!(selection.state(), SelectionState::None);
    }

    #[test]
    fn playback_ownership_blocks_user_commands() {
        let mut selection = SelectionController::new(2);
        selection.select(0).unwrap();
        selection.transfer_to_playback();
        assert_eq!(selection.selected(), None);
        assert_eq!(selection.toggle(1), Err(SelectionError::OwnedByPlayback));
        assert_eq!(selection.clear(), Err(SelectionError::OwnedByPlayback));

        selection.release_from_playback();
        selection.select(1).unwrap();
        assert_eq!(selection.selected(), Some(1));
    }

    #[test]
    fn observers_hear_changes_but_not_noops() {
        let mut selection = SelectionController::new(3);
        let log = recorded(&mut selection);

        selection.select(1).unwrap();
        selection.select(1).unwrap();
        selection.toggle(1).unwrap();
        selection.clear().unwrap();

        assert_eq!(
            *log.borrow(),
            vec![
                SelectionNotice::Changed(SelectionState::Event(1)),
                SelectionNotice::Changed(SelectionState::None),
            ]
        );
    }

    #[test]
    fn ownership_hand_off_is_announced() {
        let mut selection = SelectionController::new(2);
        selection.select(0).unwrap();
        let log = recorded(&mut selection);

        selection.transfer_to_playback();
        selection.release_from_playback();

        assert_eq!(
            *log.borrow(),
            vec![
                SelectionNotice::OwnerChanged(SelectionOwner::Playback),
                SelectionNotice::Changed(SelectionState::None),
                SelectionNotice::OwnerChanged(SelectionOwner::User),
            ]
        );
    }

    #[test]
    fn unsubscribed_observer_stops_receiving() {
        let mut selection = SelectionController::new(2);
        let log = Rc::new(RefCell::new(0usize));
        let sink = Rc::clone(&log);
        let id = selection.subscribe(move |_: &SelectionNotice| *sink.borrow_mut() += 1);

        selection.select(0).unwrap();
        assert!(selection.unsubscribe(id));
        assert!(!selection.unsubscribe(id));
        selection.select(1).unwrap();
        assert_eq!(*log.borrow(), 1);
    }
}

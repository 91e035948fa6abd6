//! Single-slot cancellable timer.
//!
//! # Invariants
//! - At most one task is pending; arming replaces the previous task.
//! - Cancellation is bookkeeping only and always succeeds.

/// Identity of one armed task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(u64);

/// A pending delayed callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduledTask {
    pub id: TimerId,
    pub due_at_ms: u64,
}

#[derive(Debug, Default)]
pub struct TimerSlot {
    pending: Option<ScheduledTask>,
    next_id: u64,
}

impl TimerSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arms a task due `delay_ms` after `now_ms`, cancelling any pending one.
    pub fn arm(&mut self, now_ms: u64, delay_ms: u64) -> TimerId {
        self.arm_at(now_ms.saturating_add(delay_ms))
    }

    /// Arms a task due at an absolute time, cancelling any pending one.
    pub fn arm_at(&mut self, due_at_ms: u64) -> TimerId {
        self.next_id += 1;
        let id = TimerId(self.next_id);
        self.pending = Some(ScheduledTask { id, due_at_ms });
        id
    }

    pub fn cancel(&mut self) -> Option<ScheduledTask> {
        self.pending.take()
    }

    pub fn pending(&self) -> Option<ScheduledTask> {
        self.pending
    }

    /// Takes the pending task when it is due at `now_ms`.
    pub fn take_due(&mut self, now_ms: u64) -> Option<ScheduledTask> {
        match self.pending {
            Some(task) if task.due_at_ms <= now_ms => self.pending.take(),
            _ => None,
        }
    }

    /// Number of tasks ever armed on this slot.
    pub fn armed_total(&self) -> u64 {
        self.next_id
    }
}

#[cfg(test)]
mod tests {
    use super::TimerSlot;

    #[test]
    fn arming_replaces_pending_task() {
        let mut slot = TimerSlot::new();
        let first = slot.arm(0, 3000);
        let second = slot.arm(1000, 3000);
        assert_ne!(first, second);
        assert_eq!(slot.pending().map(|task| task.id), Some(second));
        assert_eq!(slot.pending().map(|task| task.due_at_ms), Some(4000));
        assert_eq!(slot.armed_total(), 2);
    }

    #[test]
    fn take_due_only_fires_at_deadline() {
        let mut slot = TimerSlot::new();
        slot.arm(0, 1500);
        assert!(slot.take_due(1499).is_none());
        assert!(slot.take_due(1500).is_some());
        assert!(slot.pending().is_none());
        assert!(slot.take_due(10_000).is_none());
    }

    #[test]
    fn cancel_is_idempotent() {
        let mut slot = TimerSlot::new();
        slot.arm(0, 10);
        assert!(slot.cancel().is_some());
        assert!(slot.cancel().is_none());
        assert!(slot.take_due(100).is_none());
    }
}

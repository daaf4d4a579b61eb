//! Task definition — static, no-alloc task slots
//!
//! One slot per priority level. Each slot holds a run-to-completion task,
//! its period in ticks, the countdown to its next release and the number
//! of releases still waiting to be serviced.
//!
//! Author: Moroya Sakamoto

/// Default number of task slots (priority levels)
pub const RTCS_NUM_TASKS: usize = 10;

/// Period / countdown unit: one call to `Scheduler::tick`
pub type Ticks = u32;

/// Outstanding release requests for one slot (saturating)
pub type PendingCount = u8;

/// A task body: no arguments, no return value, runs to completion.
///
/// Implemented for every `Fn() + Sync`, so plain functions and closures
/// can be registered directly.
pub trait Runnable: Sync {
    /// Execute the task body once
    fn run(&self);
}

impl<F: Fn() + Sync> Runnable for F {
    fn run(&self) {
        self()
    }
}

/// Task priority (lower number = higher priority)
///
/// Doubles as the slot index in the task table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskPriority(pub u8);

impl TaskPriority {
    /// Highest priority, always scanned first
    pub const HIGHEST: TaskPriority = TaskPriority(0);

    /// Slot index for this priority
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl From<u8> for TaskPriority {
    fn from(value: u8) -> Self {
        TaskPriority(value)
    }
}

/// Observable slot state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    /// No task registered
    Empty,
    /// Registered with period 0 and nothing pending; never released
    Inert,
    /// Counting down to the next release
    Armed,
    /// At least one release waiting for dispatch
    Released,
}

/// Outcome of advancing one slot by a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Release {
    None,
    Released,
    /// Countdown expired but the pending counter was already saturated;
    /// carries the slot's overrun total
    Overrun(u32),
}

/// What a slot actually calls
#[derive(Clone, Copy)]
pub(crate) enum TaskRef<'a> {
    Runnable(&'a dyn Runnable),
    #[cfg_attr(not(feature = "ffi"), allow(dead_code))]
    Foreign(extern "C" fn()),
}

impl TaskRef<'_> {
    pub(crate) fn run(&self) {
        match self {
            TaskRef::Runnable(task) => task.run(),
            TaskRef::Foreign(func) => func(),
        }
    }
}

/// One entry of the task table
#[derive(Clone, Copy)]
pub(crate) struct TaskSlot<'a> {
    pub(crate) task: Option<TaskRef<'a>>,
    pub(crate) period: Ticks,
    pub(crate) ticks_remaining: Ticks,
    pub(crate) pending: PendingCount,
    /// Dispatches since registration
    pub(crate) runs: u32,
    /// Releases dropped because `pending` was saturated
    pub(crate) overruns: u32,
}

impl<'a> TaskSlot<'a> {
    /// Empty task slot
    pub(crate) const EMPTY: Self = Self {
        task: None,
        period: 0,
        ticks_remaining: 0,
        pending: 0,
        runs: 0,
        overruns: 0,
    };

    /// Freshly armed slot: countdown starts at `period`, nothing pending
    pub(crate) const fn new(task: TaskRef<'a>, period: Ticks) -> Self {
        Self {
            task: Some(task),
            period,
            ticks_remaining: period,
            ..Self::EMPTY
        }
    }

    pub(crate) fn is_occupied(&self) -> bool {
        self.task.is_some()
    }

    /// Advance the countdown by one tick.
    ///
    /// A countdown already at 0 (period 0) is left alone.
    pub(crate) fn advance(&mut self) -> Release {
        if self.task.is_none() || self.ticks_remaining == 0 {
            return Release::None;
        }
        self.ticks_remaining -= 1;
        if self.ticks_remaining != 0 {
            return Release::None;
        }
        self.ticks_remaining = self.period;
        match self.pending.checked_add(1) {
            Some(pending) => {
                self.pending = pending;
                Release::Released
            }
            None => {
                self.overruns = self.overruns.saturating_add(1);
                Release::Overrun(self.overruns)
            }
        }
    }

    /// Consume one release request, returning the task to run.
    pub(crate) fn take_request(&mut self) -> Option<TaskRef<'a>> {
        let task = self.task?;
        if self.pending == 0 {
            return None;
        }
        self.pending -= 1;
        self.runs = self.runs.wrapping_add(1);
        Some(task)
    }

    pub(crate) fn state(&self) -> TaskState {
        if self.task.is_none() {
            TaskState::Empty
        } else if self.pending > 0 {
            TaskState::Released
        } else if self.ticks_remaining > 0 {
            TaskState::Armed
        } else {
            TaskState::Inert
        }
    }

    pub(crate) fn snapshot(&self) -> SlotSnapshot {
        SlotSnapshot {
            state: self.state(),
            period: self.period,
            ticks_remaining: self.ticks_remaining,
            pending: self.pending,
            runs: self.runs,
            overruns: self.overruns,
        }
    }
}

/// Copy of one slot's observable state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotSnapshot {
    /// Where the slot is in its release cycle
    pub state: TaskState,
    /// Ticks between releases (0 = never released)
    pub period: Ticks,
    /// Ticks until the next release
    pub ticks_remaining: Ticks,
    /// Releases waiting for dispatch
    pub pending: PendingCount,
    /// Dispatches since registration
    pub runs: u32,
    /// Releases dropped because `pending` was saturated
    pub overruns: u32,
}

impl SlotSnapshot {
    /// Is a task registered in this slot?
    pub fn is_occupied(&self) -> bool {
        self.state != TaskState::Empty
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dummy_task() {}

    fn armed(period: Ticks) -> TaskSlot<'static> {
        TaskSlot::new(TaskRef::Runnable(&dummy_task), period)
    }

    #[test]
    fn test_empty_slot() {
        let mut slot = TaskSlot::EMPTY;
        assert!(!slot.is_occupied());
        assert_eq!(slot.state(), TaskState::Empty);
        assert_eq!(slot.advance(), Release::None);
        assert!(slot.take_request().is_none());
    }

    #[test]
    fn test_new_slot_is_armed() {
        let slot = armed(5);
        assert!(slot.is_occupied());
        assert_eq!(slot.state(), TaskState::Armed);
        assert_eq!(slot.ticks_remaining, 5);
        assert_eq!(slot.pending, 0);
    }

    #[test]
    fn test_release_rearms() {
        let mut slot = armed(3);
        assert_eq!(slot.advance(), Release::None);
        assert_eq!(slot.advance(), Release::None);
        assert_eq!(slot.advance(), Release::Released);
        assert_eq!(slot.ticks_remaining, 3);
        assert_eq!(slot.pending, 1);
        assert_eq!(slot.state(), TaskState::Released);
    }

    #[test]
    fn test_zero_period_is_inert() {
        let mut slot = armed(0);
        assert_eq!(slot.state(), TaskState::Inert);
        for _ in 0..100 {
            assert_eq!(slot.advance(), Release::None);
        }
        assert_eq!(slot.ticks_remaining, 0);
        assert_eq!(slot.pending, 0);
    }

    #[test]
    fn test_pending_saturates() {
        let mut slot = armed(1);
        for _ in 0..PendingCount::MAX {
            assert_eq!(slot.advance(), Release::Released);
        }
        assert_eq!(slot.advance(), Release::Overrun(1));
        assert_eq!(slot.advance(), Release::Overrun(2));
        assert_eq!(slot.pending, PendingCount::MAX);
        assert_eq!(slot.overruns, 2);
    }

    #[test]
    fn test_take_request() {
        let mut slot = armed(1);
        slot.advance();
        slot.advance();
        assert!(slot.take_request().is_some());
        assert!(slot.take_request().is_some());
        assert!(slot.take_request().is_none());
        assert_eq!(slot.runs, 2);
        assert_eq!(slot.state(), TaskState::Armed);
    }

    #[test]
    fn test_priority_ordering() {
        assert!(TaskPriority::HIGHEST < TaskPriority(1));
        assert_eq!(TaskPriority::from(7).index(), 7);
    }
}

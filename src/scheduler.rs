//! Run-to-completion scheduler
//!
//! Fixed-priority cooperative scheduling over a static task table.
//! `tick` (timer interrupt) releases tasks whose countdown expired,
//! `run` (main line) executes the highest-priority released task to
//! completion, then rescans from the top. No preemption between tasks.
//!
//! Author: Moroya Sakamoto

use core::cell::RefCell;

use critical_section::Mutex;
use log::{debug, trace, warn};

use crate::error::RegisterError;
use crate::idle::{Idle, Spin};
use crate::task::{
    Release, Runnable, SlotSnapshot, TaskPriority, TaskRef, TaskSlot, Ticks, RTCS_NUM_TASKS,
};

/// Shared state touched by both the tick source and the dispatch loop
struct Table<'a, const N: usize> {
    slots: [TaskSlot<'a>; N],
    /// Ticks since the last `init` (wrapping)
    ticks: u64,
}

/// What `install` does with an already occupied priority
#[derive(Clone, Copy, PartialEq, Eq)]
enum Occupied {
    Reject,
    Replace,
}

/// Run-to-completion scheduler
///
/// Static task table, no dynamic allocation. Slot index == priority,
/// 0 is scanned first. `N` is the table capacity (1..=256), `I` decides
/// what the dispatch loop does while nothing is pending.
///
/// Every access to the table happens inside a critical section, so `tick`
/// may be called from an interrupt handler while `run` owns the main line.
/// Task bodies run outside the critical section.
pub struct Scheduler<'a, const N: usize = RTCS_NUM_TASKS, I: Idle = Spin> {
    table: Mutex<RefCell<Table<'a, N>>>,
    idle: I,
}

impl<'a, const N: usize> Scheduler<'a, N, Spin> {
    /// Create empty scheduler that busy-polls when idle
    pub const fn new() -> Self {
        Self::with_idle(Spin)
    }
}

impl<'a, const N: usize> Default for Scheduler<'a, N, Spin> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, const N: usize, I: Idle> Scheduler<'a, N, I> {
    const CAPACITY_OK: () = assert!(N > 0 && N <= 256, "task table capacity must be 1..=256");

    /// Create empty scheduler with a specific idle strategy
    pub const fn with_idle(idle: I) -> Self {
        let () = Self::CAPACITY_OK;
        Self {
            table: Mutex::new(RefCell::new(Table {
                slots: [TaskSlot::EMPTY; N],
                ticks: 0,
            })),
            idle,
        }
    }

    /// Number of slots (priority levels)
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Clear every slot, cancelling all countdowns and pending releases
    pub fn init(&self) {
        critical_section::with(|cs| {
            let mut table = self.table.borrow_ref_mut(cs);
            table.slots = [TaskSlot::EMPTY; N];
            table.ticks = 0;
        });
        debug!("rtcs: task table cleared ({} slots)", N);
    }

    /// Register a task at `priority`, released every `period` ticks.
    ///
    /// Period 0 registers the task but it is never released. Fails without
    /// touching the table if `task` is `None`, the priority is out of range,
    /// or the priority is already taken.
    pub fn register(
        &self,
        task: Option<&'a dyn Runnable>,
        priority: TaskPriority,
        period: Ticks,
    ) -> Result<(), RegisterError> {
        self.install(task.map(TaskRef::Runnable), priority, period, Occupied::Reject)
    }

    /// Like `register`, but overwrites an occupied priority.
    ///
    /// The previous occupant's countdown and pending releases are discarded.
    pub fn replace(
        &self,
        task: Option<&'a dyn Runnable>,
        priority: TaskPriority,
        period: Ticks,
    ) -> Result<(), RegisterError> {
        self.install(task.map(TaskRef::Runnable), priority, period, Occupied::Replace)
    }

    #[cfg_attr(not(feature = "ffi"), allow(dead_code))]
    pub(crate) fn register_foreign(
        &self,
        task: Option<extern "C" fn()>,
        priority: TaskPriority,
        period: Ticks,
    ) -> Result<(), RegisterError> {
        self.install(task.map(TaskRef::Foreign), priority, period, Occupied::Reject)
    }

    fn install(
        &self,
        task: Option<TaskRef<'a>>,
        priority: TaskPriority,
        period: Ticks,
        occupied: Occupied,
    ) -> Result<(), RegisterError> {
        let result = self.try_install(task, priority, period, occupied);
        match result {
            Ok(()) => debug!("rtcs: task registered at priority {} (period {})", priority.0, period),
            Err(err) => warn!("rtcs: registration rejected: {}", err),
        }
        result
    }

    fn try_install(
        &self,
        task: Option<TaskRef<'a>>,
        priority: TaskPriority,
        period: Ticks,
        occupied: Occupied,
    ) -> Result<(), RegisterError> {
        let task = task.ok_or(RegisterError::MissingTask)?;
        if priority.index() >= N {
            return Err(RegisterError::PriorityOutOfRange { priority, capacity: N });
        }

        critical_section::with(|cs| {
            let mut table = self.table.borrow_ref_mut(cs);
            let slot = &mut table.slots[priority.index()];
            if slot.is_occupied() && occupied == Occupied::Reject {
                return Err(RegisterError::PriorityOccupied(priority));
            }
            *slot = TaskSlot::new(task, period);
            Ok(())
        })
    }

    /// Advance every countdown by one tick.
    ///
    /// Call from the periodic timer interrupt; the call interval is the
    /// scheduler's time unit. Bounded work: one pass over `N` slots inside
    /// the critical section. Logging happens after it is released.
    pub fn tick(&self) {
        let outcomes = critical_section::with(|cs| {
            let mut table = self.table.borrow_ref_mut(cs);
            table.ticks = table.ticks.wrapping_add(1);

            let mut outcomes = [Release::None; N];
            for (outcome, slot) in outcomes.iter_mut().zip(table.slots.iter_mut()) {
                *outcome = slot.advance();
            }
            outcomes
        });

        let mut released = false;
        for (idx, outcome) in outcomes.iter().enumerate() {
            match *outcome {
                Release::None => {}
                Release::Released => {
                    trace!("rtcs: priority {} released", idx);
                    released = true;
                }
                Release::Overrun(overruns) => {
                    if overruns == 1 {
                        warn!("rtcs: priority {} overrun, pending releases saturated", idx);
                    }
                    released = true;
                }
            }
        }

        if released {
            self.idle.wake();
        }
    }

    /// One dispatch pass: run the highest-priority released task.
    ///
    /// Returns the priority that ran, or `None` if nothing was pending.
    pub fn dispatch(&self) -> Option<TaskPriority> {
        let (priority, task) = critical_section::with(|cs| {
            let mut table = self.table.borrow_ref_mut(cs);
            table
                .slots
                .iter_mut()
                .enumerate()
                .find_map(|(idx, slot)| slot.take_request().map(|task| (idx, task)))
        })
        .map(|(idx, task)| (TaskPriority(idx as u8), task))?;

        trace!("rtcs: dispatch priority {}", priority.0);
        task.run();
        Some(priority)
    }

    /// Run the scheduler forever.
    ///
    /// Place at the end of initialization. Every pass restarts the scan at
    /// priority 0, so a busy high-priority task starves lower ones.
    pub fn run(&self) -> ! {
        debug!("rtcs: dispatch loop started");
        loop {
            if self.dispatch().is_none() {
                self.idle.wait(|| self.has_pending());
            }
        }
    }

    /// Run `iterations` dispatch passes without ever idling.
    ///
    /// Returns how many tasks were executed.
    pub fn run_for(&self, iterations: usize) -> usize {
        (0..iterations).filter(|_| self.dispatch().is_some()).count()
    }

    /// Snapshot of the slot at `priority`, `None` if out of range
    pub fn slot(&self, priority: TaskPriority) -> Option<SlotSnapshot> {
        if priority.index() >= N {
            return None;
        }
        Some(critical_section::with(|cs| {
            self.table.borrow_ref(cs).slots[priority.index()].snapshot()
        }))
    }

    /// Any release waiting for dispatch?
    pub fn has_pending(&self) -> bool {
        critical_section::with(|cs| {
            self.table
                .borrow_ref(cs)
                .slots
                .iter()
                .any(|slot| slot.is_occupied() && slot.pending > 0)
        })
    }

    /// Ticks since the last `init` (wrapping)
    pub fn now(&self) -> u64 {
        critical_section::with(|cs| self.table.borrow_ref(cs).ticks)
    }

    /// Force a slot's pending count, standing in for a tick-driven release
    #[cfg(test)]
    fn set_pending(&self, priority: TaskPriority, pending: crate::task::PendingCount) {
        critical_section::with(|cs| {
            self.table.borrow_ref_mut(cs).slots[priority.index()].pending = pending;
        });
    }
}

//! C-ABI entry points
//!
//! Process-wide scheduler with `RTCS_NUM_TASKS` slots for firmware written
//! in C. Call `rtcs_init`, register tasks, start the tick interrupt, then
//! hand the main line over to `rtcs_run`.
//!
//! ```c
//! void SysTick_Handler(void) { rtcs_tick(); }
//!
//! int main(void) {
//!     rtcs_init();
//!     if (rtcs_add_task(blink, 0, 500) != RTCS_STATUS_SUCCESS) { for (;;) {} }
//!     rtcs_run();
//! }
//! ```
//!
//! Author: Moroya Sakamoto

use crate::scheduler::Scheduler;
use crate::task::{TaskPriority, RTCS_NUM_TASKS};

#[cfg(feature = "std")]
static SCHEDULER: Scheduler<'static, RTCS_NUM_TASKS, crate::idle::Parker> =
    Scheduler::with_idle(crate::idle::Parker::new());

#[cfg(all(not(feature = "std"), feature = "cortex-m"))]
static SCHEDULER: Scheduler<'static, RTCS_NUM_TASKS, crate::idle::Wfi> =
    Scheduler::with_idle(crate::idle::Wfi);

#[cfg(all(not(feature = "std"), not(feature = "cortex-m")))]
static SCHEDULER: Scheduler<'static, RTCS_NUM_TASKS> = Scheduler::new();

/// Registration result
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RtcsStatus {
    Failure = 0,
    Success = 1,
}

/// Clear every task from the scheduler
#[no_mangle]
pub extern "C" fn rtcs_init() {
    SCHEDULER.init();
}

/// Register `task` at `priority` (0 = highest), released every `period` ticks.
///
/// Fails on a null task, a priority `>= RTCS_NUM_TASKS`, or a priority that
/// already holds a task.
#[no_mangle]
pub extern "C" fn rtcs_add_task(
    task: Option<extern "C" fn()>,
    priority: u8,
    period: u32,
) -> RtcsStatus {
    match SCHEDULER.register_foreign(task, TaskPriority(priority), period) {
        Ok(()) => RtcsStatus::Success,
        Err(_) => RtcsStatus::Failure,
    }
}

/// Advance the scheduler by one tick. Call from the timer interrupt.
#[no_mangle]
pub extern "C" fn rtcs_tick() {
    SCHEDULER.tick();
}

/// Run the scheduler. Never returns.
#[no_mangle]
pub extern "C" fn rtcs_run() -> ! {
    SCHEDULER.run()
}

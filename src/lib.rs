//! RTCS — Run-To-Completion Scheduler
//!
//! Cooperative scheduler for small targets:
//! - Static task table, one slot per priority (no heap, no allocation)
//! - Tick-driven periodic release, called from a timer interrupt
//! - Highest-priority released task runs next, always to completion
//! - Table access guarded by `critical-section`, so `tick` is ISR-safe
//!
//! ```no_run
//! use rtcs::{Scheduler, TaskPriority};
//!
//! static SCHEDULER: Scheduler<'static> = Scheduler::new();
//!
//! fn blink() {}
//! fn telemetry() {}
//!
//! // from the timer interrupt: SCHEDULER.tick();
//! SCHEDULER.init();
//! SCHEDULER.register(Some(&blink), TaskPriority(0), 500).unwrap();
//! SCHEDULER.register(Some(&telemetry), TaskPriority(1), 1000).unwrap();
//! SCHEDULER.run();
//! ```
//!
//! Author: Moroya Sakamoto

#![no_std]

#[cfg(any(feature = "std", test))]
extern crate std;

pub mod error;
pub mod idle;
pub mod scheduler;
pub mod task;
#[cfg(feature = "std")]
pub mod timer;
#[cfg(feature = "ffi")]
pub mod ffi;

pub use error::RegisterError;
pub use idle::{Idle, Spin};
#[cfg(feature = "std")]
pub use idle::Parker;
#[cfg(feature = "cortex-m")]
pub use idle::Wfi;
pub use scheduler::Scheduler;
pub use task::{PendingCount, Runnable, SlotSnapshot, TaskPriority, TaskState, Ticks, RTCS_NUM_TASKS};
#[cfg(feature = "std")]
pub use timer::Ticker;

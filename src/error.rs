//! Registration errors
//!
//! Registration is the only fallible scheduler operation.

use core::fmt;

use crate::task::TaskPriority;

/// Why a task could not be registered. The task table is left untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterError {
    /// No task was supplied
    MissingTask,
    /// Priority is not a valid slot index
    PriorityOutOfRange { priority: TaskPriority, capacity: usize },
    /// Another task already holds this priority
    PriorityOccupied(TaskPriority),
}

impl fmt::Display for RegisterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegisterError::MissingTask => write!(f, "no task supplied"),
            RegisterError::PriorityOutOfRange { priority, capacity } => write!(
                f,
                "priority {} out of range (capacity {})",
                priority.0, capacity
            ),
            RegisterError::PriorityOccupied(priority) => {
                write!(f, "priority {} already occupied", priority.0)
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for RegisterError {}

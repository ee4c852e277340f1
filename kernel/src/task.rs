//! Task control blocks.
//!
//! Split the way hubris splits `task.rs`: a `Task` struct owning exactly the
//! fields the rest of the kernel needs, plus free functions
//! (`select_round_robin`, `force_fault`, …) that operate across the whole
//! table rather than hanging every cross-task operation off `&mut self`.

use crate::abi::{name_from_str, Name};
use crate::config::NAME_MAX_LEN;

/// Unique task identifier: a task's own entry-point address, since those are
/// stable and unique for the lifetime of a task. Kept as an opaque `fn()`
/// address rather than re-deriving a separate ID space.
pub type Pid = u32;

/// Lifecycle state of one TCB slot.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum TaskState {
    /// Slot holds no task. Only an `Invalid` slot may be reused by `create`.
    Invalid,
    /// Created, never dispatched. First dispatch synthesizes an initial
    /// exception frame and transitions to `Ready`.
    Unrun,
    /// Runnable now.
    Ready,
    /// Sleeping; `ticks` counts down to zero at each SysTick.
    Delayed,
    /// Waiting in some semaphore's FIFO (`wait`).
    Blocked,
    /// Killed by `kill` or an MPU fault. May return to `Unrun` via `restart`.
    Killed,
}

impl Default for TaskState {
    fn default() -> Self {
        TaskState::Invalid
    }
}

/// A task control block.
#[derive(Copy, Clone, Debug)]
pub struct Task {
    pub state: TaskState,
    /// Entry point address; doubles as this task's pid.
    pub entry: Pid,
    /// Fixed top-of-stack for this task (descending-stack convention).
    pub sp_init: u32,
    /// Saved stack pointer at the most recent preemption.
    pub sp: u32,
    /// Bytes reserved for this task's stack, rounded up to 1 KiB.
    pub stack_size: u32,
    /// 0 (highest) through 7 (lowest). Unused by the round-robin scheduler.
    pub priority: u8,
    /// Remaining 1 ms ticks until a `Delayed` task becomes `Ready`.
    pub ticks: u32,
    /// Subregion-disable mask: which 1 KiB stack subregions this task may
    /// access.
    pub srd: u32,
    /// Microseconds of CPU time accumulated in the current 2 s window.
    pub time: u32,
    /// Display name, used only for `pidof`/`resume`/`ps` lookups.
    pub name: Name,
    /// Index of the semaphore blocking this task, if `state == Blocked`.
    pub blocking_semaphore: Option<usize>,
}

impl Task {
    /// An empty, `Invalid` slot.
    pub const fn invalid() -> Self {
        Task {
            state: TaskState::Invalid,
            entry: 0,
            sp_init: 0,
            sp: 0,
            stack_size: 0,
            priority: 0,
            ticks: 0,
            srd: 0,
            time: 0,
            name: [0; NAME_MAX_LEN],
            blocking_semaphore: None,
        }
    }

    pub fn set_name(&mut self, name: &str) {
        self.name = name_from_str(name);
    }

    pub fn is_runnable(&self) -> bool {
        matches!(self.state, TaskState::Ready | TaskState::Unrun)
    }
}

impl Default for Task {
    fn default() -> Self {
        Task::invalid()
    }
}

/// Entry-point ABI: every task body is a bare, never-returning `extern "C"`
/// function, called directly from the synthesized initial frame. No
/// arguments, no return: a task that falls off the end faults.
pub type EntryFn = extern "C" fn() -> !;

/// Turns a task body into the `Pid` `create_thread` expects: its own address
/// (entry points are stable and unique for the lifetime of a task).
pub fn entry_pid(f: EntryFn) -> Pid {
    f as usize as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_task_is_not_runnable() {
        assert!(!Task::invalid().is_runnable());
    }

    #[test]
    fn unrun_and_ready_are_runnable() {
        let mut t = Task::invalid();
        t.state = TaskState::Unrun;
        assert!(t.is_runnable());
        t.state = TaskState::Ready;
        assert!(t.is_runnable());
        t.state = TaskState::Delayed;
        assert!(!t.is_runnable());
        t.state = TaskState::Blocked;
        assert!(!t.is_runnable());
        t.state = TaskState::Killed;
        assert!(!t.is_runnable());
    }
}

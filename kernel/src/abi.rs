//! ABI-stable types shared with user space.
//!
//! These are the payloads `ipcs`/`ps` copy into a caller-supplied buffer.
//! `repr(C)` keeps field layout predictable across the SVC boundary, the
//! same reasoning hubris's `task::Task` gives for `#[repr(C)]` on its own
//! saved-state struct.

use crate::config::{MAX_QUEUE_SIZE, NAME_MAX_LEN};

/// A fixed-width name, NUL-padded, for use across the syscall ABI.
pub type Name = [u8; NAME_MAX_LEN];

/// Copies `src` into a `Name`, truncating if necessary and NUL-padding the
/// remainder.
pub fn name_from_str(src: &str) -> Name {
    let mut out: Name = [0; NAME_MAX_LEN];
    let bytes = src.as_bytes();
    let n = bytes.len().min(NAME_MAX_LEN);
    out[..n].copy_from_slice(&bytes[..n]);
    out
}

/// Per-semaphore snapshot returned by the `ipcs` syscall.
#[repr(C)]
#[derive(Copy, Clone, Debug)]
pub struct SemaphoreInformation {
    pub name: Name,
    pub count: u16,
    pub waiting_tasks_number: u16,
    pub wait_queue: [u32; MAX_QUEUE_SIZE],
}

impl Default for SemaphoreInformation {
    fn default() -> Self {
        SemaphoreInformation {
            name: [0; NAME_MAX_LEN],
            count: 0,
            waiting_tasks_number: 0,
            wait_queue: [0; MAX_QUEUE_SIZE],
        }
    }
}

/// Per-task snapshot returned by the `ps` syscall.
#[repr(C)]
#[derive(Copy, Clone, Debug)]
pub struct TaskInfo {
    pub state: u8,
    pub pid: u32,
    pub name: Name,
    pub time: u32,
}

impl Default for TaskInfo {
    fn default() -> Self {
        TaskInfo {
            state: 0,
            pid: 0,
            name: [0; NAME_MAX_LEN],
            time: 0,
        }
    }
}

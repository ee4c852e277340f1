//! Architecture abstraction.
//!
//! The rest of the kernel never pokes a register or writes assembly
//! directly; it goes through this trait. `arm_m` backs it with the real
//! Cortex-M4F MPU/NVIC/exception-return machinery, `sim` backs it with
//! plain data so scheduler/semaphore/task logic can run as a host test
//! without silicon, the same split hubris draws between `arch/arm_m.rs`
//! and `arch/fake.rs`.

use crate::mpu::StackAllocation;
use crate::task::Pid;

#[cfg(target_arch = "arm")]
pub mod arm_m;
#[cfg(any(not(target_arch = "arm"), feature = "sim", test))]
pub mod sim;

/// Everything the kernel needs from the target to run tasks under MPU
/// isolation and switch between them.
///
/// Implementors own no kernel state; every method is given exactly the data
/// it needs to act and nothing more, mirroring how hubris's `arm_m`/`fake`
/// modules are free functions rather than methods on `Task`.
pub trait Arch {
    /// Synthesizes the initial exception-return frame for a task that has
    /// never run: writes xPSR/PC/LR/R0-R3/R12 at the top of
    /// the task's stack and returns the resulting stack pointer.
    fn initial_frame(entry: Pid, alloc: &StackAllocation) -> u32;

    /// Programs MPU regions 2..=5's subregion-disable bits to `srd`. Called
    /// on every context switch.
    fn apply_srd_mask(srd: u32);

    /// One-time boot setup: exception priorities (PendSV lowest, SysTick
    /// above it, SVC above that), background/flash MPU regions, and MPU
    /// enable.
    fn init_protection();

    /// Switches the active stack pointer to PSP = `sp` and calls `entry`
    /// directly, never returning. No exception
    /// entry/return is involved: the first task is launched as a plain
    /// subroutine call, the same way the teacher's `scheduler_init` calls
    /// `(entry)()` right after `switch_sp_to_psp()`. The initial exception
    /// frame `initial_frame` would synthesize is only ever popped later, by
    /// `PendSV`, the first time some *other* task is switched into from
    /// `Unrun` — it's never needed for the very first task.
    fn start_first_task(sp: u32, entry: Pid) -> !;

    /// Requests a context switch at the next opportunity (pends PendSV).
    fn request_switch();

    /// Free-running microsecond counter used for per-task CPU-time
    /// accounting. Exposed here only as a read.
    fn micros() -> u32;

    /// Checks the MPU fault-status flags (instruction/data access
    /// violation) and clears whichever are set. Returns `true` if either was
    /// set, meaning the task running when the fault fired must be killed.
    /// Called from `PendSV`, mirroring the original `pendSvIsr`'s own
    /// IERR/DERR check at the top of its body.
    fn take_mpu_fault() -> bool;
}

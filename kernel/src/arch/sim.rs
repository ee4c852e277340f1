//! Host-testable `Arch` backend, for exercising scheduler/task-table logic
//! without silicon.
//!
//! No MMIO, no assembly: `initial_frame` just returns an offset, `micros`
//! is a software counter tests can advance by hand, and `start_first_task`
//! panics instead of diverging (a `cargo test` process has nothing to
//! "start"). Mirrors hubris's `arch/fake.rs`.

use core::sync::atomic::{AtomicU32, Ordering};

use crate::mpu::StackAllocation;
use crate::task::Pid;

use super::Arch;

static MICROS: AtomicU32 = AtomicU32::new(0);
static LAST_SRD: AtomicU32 = AtomicU32::new(0);

/// Advances the simulated clock, for tests exercising tick/preemption logic.
pub fn advance_micros(delta: u32) {
    MICROS.fetch_add(delta, Ordering::Relaxed);
}

/// The most recent `srd` value `apply_srd_mask` was called with.
pub fn last_applied_srd() -> u32 {
    LAST_SRD.load(Ordering::Relaxed)
}

pub struct Sim;

impl Arch for Sim {
    fn initial_frame(_entry: Pid, alloc: &StackAllocation) -> u32 {
        alloc.sp_init
    }

    fn apply_srd_mask(srd: u32) {
        LAST_SRD.store(srd, Ordering::Relaxed);
    }

    fn init_protection() {}

    fn start_first_task(_sp: u32, _entry: Pid) -> ! {
        panic!("Sim::start_first_task has no thread to dispatch into");
    }

    fn request_switch() {}

    fn micros() -> u32 {
        MICROS.load(Ordering::Relaxed)
    }

    fn take_mpu_fault() -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apply_srd_mask_is_observable() {
        Sim::apply_srd_mask(0b1010);
        assert_eq!(last_applied_srd(), 0b1010);
    }

    #[test]
    fn micros_advances() {
        let start = Sim::micros();
        advance_micros(100);
        assert_eq!(Sim::micros(), start + 100);
    }
}

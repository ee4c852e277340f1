//! SysTick: the 1 kHz kernel tick and the free-running
//! microsecond counter `arch::Arch::micros` reads for CPU-usage accounting.
//!
//! Register programming is delegated to `drivers::systick`, the same
//! peripheral driver board bring-up already uses to generate delays;
//! the kernel only owns the periodic-interrupt accounting on top of it.

use core::sync::atomic::{AtomicU32, Ordering};

use crate::config::{CPU_HZ, TICK_PERIOD_MS};

static TICK_COUNT: AtomicU32 = AtomicU32::new(0);

/// Starts the SysTick peripheral at `TICK_PERIOD_MS` and clears the tick
/// counter. Called once at boot after `Arch::init_protection`.
pub fn start(systick: &mut drivers::systick::SysTick) {
    let core_clk_mhz = CPU_HZ / 1_000_000;
    systick.init_systic_interrupt_ms(TICK_PERIOD_MS, core_clk_mhz);
    TICK_COUNT.store(0, Ordering::Relaxed);
}

/// Number of SysTick interrupts observed since boot.
pub fn tick_count() -> u32 {
    TICK_COUNT.load(Ordering::Relaxed)
}

/// Approximate microseconds elapsed since boot, derived from the tick
/// counter (a minimal stand-in for the microsecond timer
/// collaborator; this is the minimal concrete stand-in board bring-up
/// wires through `Arch::micros`).
pub fn micros() -> u32 {
    tick_count().wrapping_mul(TICK_PERIOD_MS * 1_000)
}

/// Advances the tick counter. Called from the SysTick exception handler.
pub fn on_tick() -> u32 {
    TICK_COUNT.fetch_add(1, Ordering::Relaxed) + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn on_tick_increments_and_micros_scales() {
        TICK_COUNT.store(0, Ordering::Relaxed);
        assert_eq!(on_tick(), 1);
        assert_eq!(on_tick(), 2);
        assert_eq!(micros(), 2 * TICK_PERIOD_MS * 1_000);
    }
}

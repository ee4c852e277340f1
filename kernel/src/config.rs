//! Build-time constants for the CORE.
//!
//! Adapted from the teacher's `os_config.rs`, extended with the task/
//! semaphore/stack-arena geometry the original TM4C123 reference hard-codes
//! in `kernel.h`/`kernel.c`.

/// Maximum number of task-control-block slots.
pub const MAX_TASKS: usize = 12;

/// Maximum number of counting semaphores. Slot 0 is reserved ("null").
pub const MAX_SEMAPHORES: usize = 5;

/// Depth of each semaphore's FIFO wait queue.
pub const MAX_QUEUE_SIZE: usize = 5;

/// Maximum length of a task or semaphore name, in bytes (not counting a NUL).
pub const NAME_MAX_LEN: usize = 16;

/// Lowest (least important) priority value accepted by the priority
/// scheduler. Values above this are simply never dispatched ahead of it.
pub const LOWEST_PRIORITY: u8 = 7;

/// Size, in bytes, of one MPU subregion / stack allocation unit.
pub const SUBREGION_BYTES: u32 = 1024;

/// Number of 1 KiB subregions per 8 KiB SRAM MPU region.
pub const SUBREGIONS_PER_REGION: u32 = 8;

/// Number of SRAM MPU regions backing the stack arena (regions 2..=5).
pub const SRAM_REGIONS: u32 = 4;

/// Total bytes available to the stack arena (4 regions * 8 KiB).
pub const ARENA_BYTES: u32 = SRAM_REGIONS * SUBREGIONS_PER_REGION * SUBREGION_BYTES;

/// Offset from `SRAM_BASE` where the task-stack arena begins, reserving the
/// first 5 KiB of SRAM region 0 for `.data`/`.bss` and other kernel state
/// ahead of it, mirroring the original's `heap = (uint32_t*)0x20001400`.
pub const ARENA_BASE_OFFSET: u32 = 5 * SUBREGION_BYTES;

/// SysTick period, in milliseconds. One "tick" as used throughout the CORE.
pub const TICK_PERIOD_MS: u32 = 1;

/// Number of ticks between CPU-usage accumulator snapshots (2 seconds @ 1 kHz).
pub const USAGE_WINDOW_TICKS: u32 = 2_000;

/// Reference CPU frequency, in Hz, the SysTick reload value and the
/// microsecond-timer scaling are both computed against.
pub const CPU_HZ: u32 = 40_000_000;

/// SysTick reload value for a 1 kHz tick at `CPU_HZ`.
pub const SYSTICK_RELOAD: u32 = CPU_HZ / 1_000 - 1;

/// Fixed, build-time semaphore names (original `getIpcsData`). Index 0 is the
/// reserved "null" semaphore.
pub const SEMAPHORE_NAMES: [&str; MAX_SEMAPHORES] =
    ["null", "keyPressed", "keyReleased", "flashReq", "resource"];

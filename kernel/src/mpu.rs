//! MPU stack-isolation layer.
//!
//! The SRD-mask *arithmetic* is architecture-independent and lives here so
//! it can be unit tested; actually writing the bits into the MPU's
//! `MPU_ATTR` register is architecture-specific and lives in
//! `arch::arm_m::apply_srd_mask`, mirroring how hubris keeps
//! `compute_region_extension_data` (arithmetic) separate from
//! `apply_memory_protection` (register pokes) in `arch/arm_m.rs`.

use drivers::tm4c123_registers::SRAM_BASE;

use crate::config::{
    ARENA_BASE_OFFSET, ARENA_BYTES, SRAM_REGIONS, SUBREGIONS_PER_REGION, SUBREGION_BYTES,
};
use crate::error::{KernelError, RecoverableError};

/// Six statically-programmed MPU regions. Region numbers,
/// not sizes: region 0 is lowest priority, region 5 highest.
pub const REGION_BACKGROUND: u8 = 0;
pub const REGION_FLASH: u8 = 1;
pub const REGION_SRAM_FIRST: u8 = 2;
pub const REGION_SRAM_LAST: u8 = 5;

bitflags::bitflags! {
    /// Access attributes for a statically-configured MPU region, mirroring
    /// hubris's `RegionAttributes` bitflags (`descs.rs`).
    #[derive(Copy, Clone, Debug, Eq, PartialEq)]
    pub struct RegionAttributes: u8 {
        const READ    = 1 << 0;
        const WRITE   = 1 << 1;
        const EXECUTE = 1 << 2;
    }
}

/// Tracks sequential allocation of 1 KiB subregions out of the fixed SRAM
/// arena. Stacks are handed out back-to-back in creation
/// order; nothing is ever reclaimed except by `restart`ing the same task
/// into its already-assigned subregions.
pub struct StackAllocator {
    /// Bytes already handed out, from `SRAM_BASE`. Starts at
    /// `ARENA_BASE_OFFSET`, not 0, so the arena never overlaps the kernel's
    /// own `.data`/`.bss`.
    allocated: u32,
}

impl Default for StackAllocator {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of a successful stack allocation: enough to populate a `Task`.
pub struct StackAllocation {
    pub sp_init: u32,
    pub stack_size: u32,
    pub srd: u32,
}

impl StackAllocator {
    pub const fn new() -> Self {
        StackAllocator {
            allocated: ARENA_BASE_OFFSET,
        }
    }

    /// Allocates `stack_bytes` (rounded up to 1 KiB) starting immediately
    /// after the previous allocation.
    ///
    /// Returns `sp_init` as an *absolute address* (descending stack
    /// convention: `sp_init` points at the last usable word of the task's
    /// stack), the rounded stack size, and the task's `srd` mask. `srd` is
    /// still computed from the arena-relative offset, since subregion index
    /// 0 is the first subregion of the arena, not of SRAM.
    pub fn allocate(&mut self, stack_bytes: u32) -> Result<StackAllocation, KernelError> {
        let n = subregions_needed(stack_bytes);
        let size = n * SUBREGION_BYTES;
        if self.allocated + size > ARENA_BASE_OFFSET + ARENA_BYTES {
            return Err(RecoverableError::ArenaExhausted.into());
        }
        let base = self.allocated;
        self.allocated += size;

        let sp_init = SRAM_BASE + base + size - 1;
        let srd = compute_srd_mask(base - ARENA_BASE_OFFSET, n);
        Ok(StackAllocation {
            sp_init,
            stack_size: size,
            srd,
        })
    }
}

/// `n = ceil(stack_bytes / 1024)`.
pub fn subregions_needed(stack_bytes: u32) -> u32 {
    (stack_bytes - 1) / SUBREGION_BYTES + 1
}

/// Builds the 32-bit SRD mask for a task occupying `n` consecutive 1 KiB
/// subregions starting at arena offset `base_offset`. At most one task ever
/// owns a given subregion. Bit `k`, counted across the four SRAM regions,
/// corresponds to the 1 KiB subregion `base_offset/1024 + k`.
pub fn compute_srd_mask(base_offset: u32, n: u32) -> u32 {
    debug_assert!(base_offset % SUBREGION_BYTES == 0);
    let first_subregion = base_offset / SUBREGION_BYTES;
    let bits = if n >= 32 { u32::MAX } else { (1u32 << n) - 1 };
    bits << first_subregion
}

/// Splits a full 32-bit `srd` mask into the four per-region 8-bit masks the
/// MPU's `MPU_ATTR` register wants, one per SRAM region: the SRD update
/// routine writes 8 bits into each of regions 2..=5.
pub fn srd_mask_per_region(srd: u32) -> [u8; SRAM_REGIONS as usize] {
    let mut out = [0u8; SRAM_REGIONS as usize];
    for (i, slot) in out.iter_mut().enumerate() {
        let shift = i as u32 * SUBREGIONS_PER_REGION;
        *slot = ((srd >> shift) & 0xFF) as u8;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subregions_needed_rounds_up() {
        assert_eq!(subregions_needed(1), 1);
        assert_eq!(subregions_needed(1024), 1);
        assert_eq!(subregions_needed(1025), 2);
        assert_eq!(subregions_needed(2048), 2);
    }

    #[test]
    fn srd_mask_has_n_consecutive_bits_at_offset() {
        // exactly ceil(stack_size/1024) consecutive bits.
        let mask = compute_srd_mask(2 * SUBREGION_BYTES, 3);
        assert_eq!(mask, 0b111 << 2);
        assert_eq!(mask.count_ones(), 3);
    }

    #[test]
    fn sequential_allocation_never_overlaps() {
        // at most one task per 1 KiB subregion.
        let mut alloc = StackAllocator::new();
        let a = alloc.allocate(1024).unwrap();
        let b = alloc.allocate(2048).unwrap();
        let c = alloc.allocate(1024).unwrap();

        assert_eq!(a.srd & b.srd, 0);
        assert_eq!(b.srd & c.srd, 0);
        assert_eq!(a.srd & c.srd, 0);
        assert_eq!((a.srd | b.srd | c.srd).count_ones(), 4);
    }

    #[test]
    fn allocation_fails_when_arena_exhausted() {
        let mut alloc = StackAllocator::new();
        assert!(alloc.allocate(ARENA_BYTES - crate::config::ARENA_BASE_OFFSET).is_ok());
        assert_eq!(
            alloc.allocate(SUBREGION_BYTES).unwrap_err(),
            RecoverableError::ArenaExhausted.into()
        );
    }

    #[test]
    fn sp_init_is_an_absolute_address_past_the_reserved_kernel_offset() {
        let mut alloc = StackAllocator::new();
        let a = alloc.allocate(1024).unwrap();
        assert_eq!(
            a.sp_init,
            SRAM_BASE + crate::config::ARENA_BASE_OFFSET + 1024 - 1
        );
    }

    #[test]
    fn per_region_split_matches_eight_bits_each() {
        let srd = 0xFF_00_00_01u32; // bit 0 and all of region index 3
        let regions = srd_mask_per_region(srd);
        assert_eq!(regions[0], 0x01);
        assert_eq!(regions[1], 0x00);
        assert_eq!(regions[2], 0x00);
        assert_eq!(regions[3], 0xFF);
    }
}

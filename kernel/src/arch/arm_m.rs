//! Cortex-M4F backend: MPU programming, context-switch trampolines, and
//! the exception vectors that drive them.
//!
//! Register pokes go through `drivers::read_write`, the same volatile
//! helpers the board-bringup code uses, so there is exactly one unsafe
//! idiom for memory-mapped I/O in this workspace. Context-switch save and
//! the exception trampolines are `naked_asm!`, replacing the separate
//! assembly file the stack-switching code originally lived in (hubris keeps
//! its own PendSV entry as `global_asm!` in `arch/arm_m.rs` for the same
//! reason: it has to run before there's a valid Rust stack frame to return
//! into).

use core::arch::naked_asm;

use drivers::read_write::{read_register, write_register};
use drivers::tm4c123_registers::{
    FLASH_BASE, MPU_CTRL, MPU_RASR, MPU_RBAR, MPU_RNR, MPU_TYPE, SCB_CFSR, SCB_ICSR, SCB_MMFAR,
    SCB_SHCSR, SCB_SHPR2, SCB_SHPR3, SRAM_BASE,
};

use crate::mpu::{srd_mask_per_region, StackAllocation};
use crate::task::Pid;

use super::Arch;

const ICSR_PENDSVSET: u32 = 1 << 28;

const MPU_CTRL_ENABLE: u32 = 1 << 0;
const MPU_CTRL_PRIVDEFENA: u32 = 1 << 2;
const MPU_RBAR_VALID: u32 = 1 << 4;
const MPU_RASR_ENABLE: u32 = 1 << 0;
const MPU_RASR_XN: u32 = 1 << 28;
const MPU_AP_FULL: u32 = 3 << 24;
const MPU_AP_PRIVILEGED: u32 = 1 << 24;

// CFSR (MMFSR in its low byte): instruction/data access violation, and
// whether MMFAR holds a valid faulting address.
const CFSR_IACCVIOL: u32 = 1 << 0;
const CFSR_DACCVIOL: u32 = 1 << 1;
const CFSR_MMARVALID: u32 = 1 << 7;

// SHCSR: enables for the three configurable faults, and the MemManage
// pending bit `mpuFaultIsr`'s TivaWare equivalent clears by hand before
// re-arming PendSV.
const SHCSR_MEMFAULTENA: u32 = 1 << 16;
const SHCSR_BUSFAULTENA: u32 = 1 << 17;
const SHCSR_USGFAULTENA: u32 = 1 << 18;
const SHCSR_MEMFAULTPENDED: u32 = 1 << 13;

fn region_size_field(log2_minus_1: u32) -> u32 {
    log2_minus_1 << 1
}

const REGION_SIZE_4GIB: u32 = 31;
const REGION_SIZE_256KIB: u32 = 17;
const REGION_SIZE_8KIB: u32 = 12;

const EXEC_RETURN_THREAD_MODE: u32 = 0xFFFF_FFFD;
const INITIAL_PSR: u32 = 0x6100_0000;

#[inline(always)]
fn reg(addr: u32) -> *mut u32 {
    addr as *mut u32
}

pub struct ArmM4F;

impl Arch for ArmM4F {
    fn initial_frame(entry: Pid, alloc: &StackAllocation) -> u32 {
        unsafe {
            let mut sp = alloc.sp_init as *mut u32;
            sp = sp.sub(1);
            write_register(sp, INITIAL_PSR); // xPSR
            sp = sp.sub(1);
            write_register(sp, entry); // PC
            sp = sp.sub(1);
            write_register(sp, EXEC_RETURN_THREAD_MODE); // LR
            for _ in 0..5 {
                // R12, R3, R2, R1, R0
                sp = sp.sub(1);
                write_register(sp, 0);
            }
            for _ in 0..8 {
                // R11..R4
                sp = sp.sub(1);
                write_register(sp, 0);
            }
            sp as u32
        }
    }

    fn apply_srd_mask(srd: u32) {
        let per_region = srd_mask_per_region(srd);
        for (i, bits) in per_region.iter().enumerate() {
            let region = crate::mpu::REGION_SRAM_FIRST as u32 + i as u32;
            unsafe {
                write_register(reg(MPU_RNR), region);
                let mut attr = read_register(reg(MPU_RASR));
                attr &= !(0xFFu32 << 8);
                attr |= (*bits as u32) << 8;
                write_register(reg(MPU_RASR), attr);
            }
        }
    }

    fn init_protection() {
        unsafe {
            // PendSV lowest, SysTick above it, SVC above that.
            let mut shpr3 = read_register(reg(SCB_SHPR3));
            shpr3 &= !((0xFFu32 << 16) | (0xFFu32 << 24));
            shpr3 |= (0xFFu32 << 16) | (0xF0u32 << 24);
            write_register(reg(SCB_SHPR3), shpr3);

            let mut shpr2 = read_register(reg(SCB_SHPR2));
            shpr2 &= !(0xFFu32 << 24);
            shpr2 |= 0xE0u32 << 24;
            write_register(reg(SCB_SHPR2), shpr2);

            write_register(reg(MPU_CTRL), 0);

            // Region 0: background, full RWX-minus-execute over 4 GiB.
            write_register(reg(MPU_RNR), crate::mpu::REGION_BACKGROUND as u32);
            write_register(
                reg(MPU_RBAR),
                FLASH_BASE | MPU_RBAR_VALID | crate::mpu::REGION_BACKGROUND as u32,
            );
            write_register(
                reg(MPU_RASR),
                MPU_RASR_XN | MPU_AP_FULL | region_size_field(REGION_SIZE_4GIB) | MPU_RASR_ENABLE,
            );

            // Region 1: flash, read+execute.
            write_register(reg(MPU_RNR), crate::mpu::REGION_FLASH as u32);
            write_register(
                reg(MPU_RBAR),
                FLASH_BASE | MPU_RBAR_VALID | crate::mpu::REGION_FLASH as u32,
            );
            write_register(
                reg(MPU_RASR),
                MPU_AP_FULL | region_size_field(REGION_SIZE_256KIB) | MPU_RASR_ENABLE,
            );

            // Regions 2..=5: the four 8 KiB SRAM stack-arena windows.
            for i in 0..crate::config::SRAM_REGIONS {
                let region = crate::mpu::REGION_SRAM_FIRST as u32 + i;
                let base = SRAM_BASE
                    + i * crate::config::SUBREGIONS_PER_REGION * crate::config::SUBREGION_BYTES;
                write_register(reg(MPU_RNR), region);
                write_register(reg(MPU_RBAR), base | MPU_RBAR_VALID | region);
                write_register(
                    reg(MPU_RASR),
                    MPU_AP_PRIVILEGED | region_size_field(REGION_SIZE_8KIB) | MPU_RASR_ENABLE,
                );
            }

            let _ = read_register(reg(MPU_TYPE));
            write_register(reg(MPU_CTRL), MPU_CTRL_ENABLE | MPU_CTRL_PRIVDEFENA);

            // Let MemManage/BusFault/UsageFault fire as their own exceptions
            // instead of escalating straight to HardFault.
            let mut shcsr = read_register(reg(SCB_SHCSR));
            shcsr |= SHCSR_MEMFAULTENA | SHCSR_BUSFAULTENA | SHCSR_USGFAULTENA;
            write_register(reg(SCB_SHCSR), shcsr);
        }
    }

    fn start_first_task(sp: u32, entry: Pid) -> ! {
        unsafe { start_first_task_asm(sp, entry) }
    }

    fn request_switch() {
        unsafe {
            write_register(reg(SCB_ICSR), ICSR_PENDSVSET);
        }
    }

    fn micros() -> u32 {
        crate::systick::micros()
    }

    fn take_mpu_fault() -> bool {
        unsafe {
            let cfsr = read_register(reg(SCB_CFSR));
            let pending = cfsr & (CFSR_IACCVIOL | CFSR_DACCVIOL);
            if pending != 0 {
                // Write-1-to-clear: writing back just the bits that were set
                // clears them without disturbing any other fault flag.
                write_register(reg(SCB_CFSR), pending);
            }
            pending != 0
        }
    }
}

/// Switches to PSP pointing at `sp` and branches straight into `entry`, never
/// returning. No SVC or exception return: the
/// first task is simply called, the way the teacher's `scheduler_init` calls
/// `(entry)()` right after `switch_sp_to_psp()`.
#[unsafe(naked)]
unsafe extern "C" fn start_first_task_asm(sp: u32, entry: u32) -> ! {
    naked_asm!(
        "msr psp, r0",
        "mov r0, #2",
        "msr control, r0", // SPSEL=1: thread mode now runs on PSP
        "isb",
        "bx r1", // tail-call straight into the first task; it never returns
        options(noreturn)
    );
}

/// PendSV: save R4-R11 of the outgoing task, call into `state::pend_sv_handler`
/// to pick the next task and retrieve its saved PSP, restore R4-R11, and
/// exception-return. Named to match the weak vector-table
/// symbol cortex-m-rt expects, the way hubris's own `PendSV` does.
#[unsafe(naked)]
#[unsafe(no_mangle)]
pub unsafe extern "C" fn PendSV() {
    naked_asm!(
        "mrs r0, psp",
        "stmdb r0!, {{r4-r11}}",
        "bl {save_and_select}",
        "ldmia r0!, {{r4-r11}}",
        "msr psp, r0",
        "bx lr",
        save_and_select = sym crate::state::pend_sv_handler,
    );
}

/// SVCall: reads the SVC number out of the Thumb instruction the stacked PC
/// points just past, along with R0/R1, calls `state::svc_dispatch`, and
/// splices its return value back into the stacked R0 before returning
/// and calls into the kernel's syscall dispatcher.
#[unsafe(naked)]
#[unsafe(no_mangle)]
pub unsafe extern "C" fn SVCall() {
    naked_asm!(
        "tst lr, #4",        // bit 2 of EXC_RETURN selects MSP (0) or PSP (1)
        "ite eq",
        "mrseq r4, msp",
        "mrsne r4, psp",
        "ldr r1, [r4, #24]", // stacked PC
        "ldrb r0, [r1, #-2]", // low byte of the svc #imm halfword: the SVC number
        "ldr r1, [r4, #0]",  // stacked R0: dispatch's first argument
        "ldr r2, [r4, #4]",  // stacked R1: dispatch's second argument
        "push {{r4, lr}}",   // r4 is callee-saved and not hardware-stacked; preserve it
        "bl {dispatch}",
        "pop {{r4, lr}}",
        "str r0, [r4, #0]",  // splice return value back into stacked R0
        "bx lr",
        dispatch = sym crate::state::svc_dispatch,
    );
}

/// `SysTick`: accounts the elapsed tick and requests a context switch if the
/// scheduler has woken a task.
#[cortex_m_rt::exception]
fn SysTick() {
    crate::state::on_systick();
}

/// `MemoryManagement`: an MPU access violation just fired. Dumps it through
/// the diagnostic sink, clears the pending bit so it doesn't retrigger, and
/// pends `PendSV`, mirroring the original `mpuFaultIsr` — which records the
/// fault and re-arms the scheduler but does not itself touch `tcb[]`. The
/// actual kill happens inside `PendSV`/`switch_context`, which checks the
/// same CFSR bits this handler read, the way `pendSvIsr` does.
#[cortex_m_rt::exception]
fn MemoryManagement() {
    unsafe {
        let cfsr = read_register(reg(SCB_CFSR));
        let fault_address = if cfsr & CFSR_MMARVALID != 0 {
            Some(read_register(reg(SCB_MMFAR)))
        } else {
            None
        };
        let frame = crate::diag::FaultFrame {
            fault_status: cfsr & 0xFF,
            fault_address,
            ..Default::default()
        };
        crate::state::report_mpu_fault(&frame);

        let mut shcsr = read_register(reg(SCB_SHCSR));
        shcsr &= !SHCSR_MEMFAULTPENDED;
        write_register(reg(SCB_SHCSR), shcsr);

        write_register(reg(SCB_ICSR), ICSR_PENDSVSET);
    }
}

/// `BusFault`: unrecoverable, matching the original `busFaultIsr` spinning
/// forever after reporting.
#[cortex_m_rt::exception]
fn BusFault() {
    crate::state::halt_on_fault(crate::error::FaultKind::BusFault);
}

/// `UsageFault`: unrecoverable, matching the original `usageFaultIsr`.
#[cortex_m_rt::exception]
fn UsageFault() {
    crate::state::halt_on_fault(crate::error::FaultKind::UsageFault);
}

/// `HardFault`: unrecoverable, matching the original `faultIsr`.
#[cortex_m_rt::exception]
unsafe fn HardFault(_frame: &cortex_m_rt::ExceptionFrame) -> ! {
    crate::state::halt_on_fault(crate::error::FaultKind::HardFault);
}

/// System reset, the `reboot` SVC's implementation (grounded in
/// the original's `NVIC_SystemReset` call). Writes `SCB_AIRCR` with the
/// vendor key and the `SYSRESETREQ` bit; never returns.
pub fn system_reset() -> ! {
    const AIRCR_VECTKEY: u32 = 0x05FA_0000;
    const AIRCR_SYSRESETREQ: u32 = 1 << 2;
    unsafe {
        write_register(
            reg(drivers::tm4c123_registers::SCB_AIRCR_BASE),
            AIRCR_VECTKEY | AIRCR_SYSRESETREQ,
        );
    }
    loop {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn region_size_field_matches_datasheet_encoding() {
        // size in bytes = 2^(SIZE + 1); field is SIZE << 1.
        assert_eq!(region_size_field(REGION_SIZE_8KIB), 24);
    }
}

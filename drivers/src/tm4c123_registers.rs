//! Register base addresses for the TM4C123GH6PM.

// System control
pub const SYSCTL_BASE: u32 = 0x400F_E000;
/// Alias kept for the GPIO/EXTI drivers, which enable a peripheral's clock
/// through a single bit in a system-control register the way the teacher's
/// original `RCC_BASE`-relative offset did.
pub const RCC_BASE: u32 = SYSCTL_BASE;

// Legacy aliases kept for the GPIO-interrupt demo driver (`exti.rs`), which
// models edge-triggered pin interrupts the way an EXTI/SYSCFG peripheral
// would rather than TM4C123's native per-port GPIOIS/IBE/IEV registers;
// out of scope for the kernel CORE, left as board-bringup scaffolding.
pub const SYSCFG_BASE: u32 = 0x400F_E000;
pub const EXTI_BASE: u32 = 0x4002_4000;

// GPIO
pub const GPIO_A_BASE: u32 = 0x4000_4000;
pub const GPIO_B_BASE: u32 = 0x4000_5000;
pub const GPIO_C_BASE: u32 = 0x4000_6000;
pub const GPIO_D_BASE: u32 = 0x4000_7000;
pub const GPIO_E_BASE: u32 = 0x4002_4000;
pub const GPIO_F_BASE: u32 = 0x4002_5000;

// NVIC
pub const NVIC_BASE: u32 = 0xE000_E100;
pub const NVIC_ISER: u32 = NVIC_BASE;
pub const NVIC_ICER: u32 = NVIC_BASE + 0x80;
pub const NVIC_IPR: u32 = 0xE000_E400;

// SCB
pub const SCB_AIRCR_BASE: u32 = 0xE000_ED0C;
pub const SCB_ICSR: u32 = 0xE000_ED04;
pub const SCB_SHPR2: u32 = 0xE000_ED1C;
pub const SCB_SHPR3: u32 = 0xE000_ED20;
/// System Handler Control and State Register: fault-handler enable bits and
/// the pending flags `mpuFaultIsr`'s TivaWare equivalent clears by hand.
pub const SCB_SHCSR: u32 = 0xE000_ED24;
/// Configurable Fault Status Register (MMFSR/BFSR/UFSR packed into one
/// 32-bit word): the register the original calls `NVIC_FAULT_STAT_R`.
pub const SCB_CFSR: u32 = 0xE000_ED28;
/// HardFault Status Register.
pub const SCB_HFSR: u32 = 0xE000_ED2C;
/// MemManage Fault Address Register, valid only when CFSR's MMARVALID bit
/// is set.
pub const SCB_MMFAR: u32 = 0xE000_ED34;
/// BusFault Address Register, valid only when CFSR's BFARVALID bit is set.
pub const SCB_BFAR: u32 = 0xE000_ED38;

// MPU
pub const MPU_TYPE: u32 = 0xE000_ED90;
pub const MPU_CTRL: u32 = 0xE000_ED94;
pub const MPU_RNR: u32 = 0xE000_ED98;
pub const MPU_RBAR: u32 = 0xE000_ED9C;
pub const MPU_RASR: u32 = 0xE000_EDA0;

// SysTick
pub const SYSTICK_BASE: u32 = 0xE000_E010;

// Memory map
pub const FLASH_BASE: u32 = 0x0000_0000;
pub const SRAM_BASE: u32 = 0x2000_0000;

//! A small preemptive, priority-or-round-robin RTOS kernel for a single
//! Cortex-M4F part, MPU-isolating every task's stack.
//!
//! Module layout mirrors hubris's `kern` crate: pure, host-testable policy
//! (`task`, `semaphore`, `scheduler`, `mpu`, `fault`) is kept separate from
//! the architecture-specific backend (`arch`) that actually pokes hardware,
//! so the whole kernel except `arch::arm_m` builds and runs under
//! `cargo test` on the host.

#![no_std]

pub mod abi;
pub mod arch;
pub mod config;
pub mod diag;
pub mod error;
pub mod fault;
pub mod mpu;
pub mod scheduler;
pub mod semaphore;
pub mod state;
pub mod syscall;
pub mod systick;
pub mod task;

pub use error::{FaultKind, KernelError, RecoverableError};
pub use task::Pid;

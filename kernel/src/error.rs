//! Kernel-internal error type.
//!
//! Modeled on hubris's split between recoverable user mistakes
//! (`UserError`/`UsageError`) and fatal conditions (`FaultInfo`): callers
//! inside the kernel get a real `Result` they can match on, but the SVC
//! dispatcher downgrades every `Recoverable` variant to a
//! silent no-op rather than propagating it to user code, and every `Fault`
//! variant either kills the offending task or halts the system.

/// Failure modes that can arise while mutating kernel state.
///
/// `Copy`/`Eq` because these are cheap tags, never owned strings: the
/// diagnostic text (if any) lives on the `DiagSink` side, not here.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum KernelError {
    /// Recoverable: caller-visible only insofar as the requested effect
    /// silently didn't happen. Kernel state is left unchanged.
    Recoverable(RecoverableError),
    /// Not recoverable from the task's point of view: the task is killed
    /// (`MpuViolation`) or the system halts (everything else).
    Fault(FaultKind),
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum RecoverableError {
    /// `create_thread` found no free TCB slot.
    TableFull,
    /// `create_thread` was asked to create an entry point already present
    /// among non-`Invalid` slots.
    DuplicateEntry,
    /// The stack allocator could not satisfy the request within the
    /// remaining arena.
    ArenaExhausted,
    /// A syscall named a semaphore index outside `0..MAX_SEMAPHORES`.
    BadSemaphore,
    /// `wait` found its semaphore's FIFO already at `MAX_QUEUE_SIZE`.
    QueueFull,
    /// `pidof`/`resume` found no task matching the given name.
    UnknownName,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum FaultKind {
    /// MPU instruction- or data-access violation. Kills the faulting task;
    /// the system continues running.
    MpuViolation,
    /// Bus fault. Fatal: halt.
    BusFault,
    /// Usage fault. Fatal: halt.
    UsageFault,
    /// Hard fault (anything not classified as one of the above). Fatal: halt.
    HardFault,
}

impl From<RecoverableError> for KernelError {
    fn from(e: RecoverableError) -> Self {
        KernelError::Recoverable(e)
    }
}

impl From<FaultKind> for KernelError {
    fn from(e: FaultKind) -> Self {
        KernelError::Fault(e)
    }
}

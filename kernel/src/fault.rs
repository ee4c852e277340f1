//! Fault classification.
//!
//! MPU violations kill only the offending task and let the system continue
//! (`mpuFaultIsr` in the original, which always re-arms PendSV after
//! recording the fault); bus/usage/hard faults are unrecoverable and halt
//! (`busFaultIsr`/`usageFaultIsr`/`faultIsr`, which all spin forever). The
//! classification itself is plain data in, data out, so it's exercised
//! directly by host tests; deciding what to do about a `FaultKind::MpuViolation`
//! (kill the current task, request a switch) belongs to `state::Kernel`, not
//! here.

use crate::diag::{DiagSink, FaultFrame};
use crate::error::FaultKind;
use crate::task::Pid;

/// What to do in response to a classified fault.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum FaultAction {
    /// Kill `task` and continue running everything else.
    KillTask(Pid),
    /// Unrecoverable: halt.
    Halt,
}

/// Turns a raw `FaultKind` plus the faulting task's pid into the action the
/// kernel should take, reporting the event on `sink` along the way.
pub fn handle(kind: FaultKind, task: Pid, frame: &FaultFrame, sink: &dyn DiagSink) -> FaultAction {
    match kind {
        FaultKind::MpuViolation => {
            sink.task_faulted(task, frame);
            FaultAction::KillTask(task)
        }
        FaultKind::BusFault => {
            sink.fatal_fault("bus", frame);
            FaultAction::Halt
        }
        FaultKind::UsageFault => {
            sink.fatal_fault("usage", frame);
            FaultAction::Halt
        }
        FaultKind::HardFault => {
            sink.fatal_fault("hard", frame);
            FaultAction::Halt
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diag::RecordingSink;

    #[test]
    fn mpu_violation_kills_only_the_faulting_task() {
        let sink: RecordingSink<4> = RecordingSink::new();
        let action = handle(FaultKind::MpuViolation, 0x8001_2345, &FaultFrame::default(), &sink);
        assert_eq!(action, FaultAction::KillTask(0x8001_2345));
        assert_eq!(sink.len(), 1);
    }

    #[test]
    fn bus_fault_halts() {
        let sink: RecordingSink<4> = RecordingSink::new();
        let action = handle(FaultKind::BusFault, 1, &FaultFrame::default(), &sink);
        assert_eq!(action, FaultAction::Halt);
    }

    #[test]
    fn usage_and_hard_fault_also_halt() {
        let sink: RecordingSink<4> = RecordingSink::new();
        assert_eq!(
            handle(FaultKind::UsageFault, 1, &FaultFrame::default(), &sink),
            FaultAction::Halt
        );
        assert_eq!(
            handle(FaultKind::HardFault, 1, &FaultFrame::default(), &sink),
            FaultAction::Halt
        );
    }
}

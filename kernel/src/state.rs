//! The kernel: task table, semaphore table, and the scheduler/IPC/fault
//! plumbing wired together.
//!
//! `Kernel<A>` is generic over the `Arch` backend the same way hubris keeps
//! its task-table logic architecture-independent: the scheduler, semaphore,
//! and task-table policy here is exercised by `cargo test` against
//! `arch::sim::Sim`, and driven for real by `arch::arm_m::ArmM4F` on
//! silicon, without duplicating a line of policy between the two.

use core::marker::PhantomData;

use crate::abi::{name_from_str, SemaphoreInformation, TaskInfo};
use crate::arch::Arch;
use crate::config::{MAX_QUEUE_SIZE, MAX_SEMAPHORES, MAX_TASKS, SEMAPHORE_NAMES, USAGE_WINDOW_TICKS};
use crate::error::{KernelError, RecoverableError};
use crate::mpu::StackAllocator;
use crate::scheduler::{self, PriorityTable, SchedulerMode};
use crate::semaphore::{Semaphore, WaitOutcome};
use crate::task::{Pid, Task, TaskState};

/// The whole of the kernel's mutable state.
pub struct Kernel<A: Arch> {
    tasks: [Task; MAX_TASKS],
    task_count: usize,
    semaphores: [Semaphore; MAX_SEMAPHORES],
    stack_alloc: StackAllocator,
    mode: SchedulerMode,
    priority_table: PriorityTable,
    priority_cursor: usize,
    round_robin_cursor: usize,
    current: usize,
    preemption_on: bool,
    task_start_micros: u32,
    usage_window_start_tick: u32,
    /// Last completed usage window's per-task CPU time, in microseconds.
    /// `ps` reports this rather than `Task::time`, which is still
    /// accumulating mid-window (the original `kernel.c`
    /// keeps `tcb[i].time` and `cpuUsageTime[]` as two separate arrays for
    /// exactly this reason).
    cpu_usage_time: [u32; MAX_TASKS],
    _arch: PhantomData<A>,
}

impl<A: Arch> Kernel<A> {
    pub const fn new() -> Self {
        Kernel {
            tasks: [Task::invalid(); MAX_TASKS],
            task_count: 0,
            semaphores: [Semaphore::new(0); MAX_SEMAPHORES],
            stack_alloc: StackAllocator::new(),
            mode: SchedulerMode::RoundRobin,
            priority_table: [None; MAX_TASKS],
            priority_cursor: 0,
            round_robin_cursor: 0,
            current: 0,
            preemption_on: true,
            task_start_micros: 0,
            usage_window_start_tick: 0,
            cpu_usage_time: [0; MAX_TASKS],
            _arch: PhantomData,
        }
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn current_pid(&self) -> Pid {
        self.tasks[self.current].entry
    }

    fn find_by_pid(&self, pid: Pid) -> Option<usize> {
        self.tasks[..self.task_count]
            .iter()
            .position(|t| t.state != TaskState::Invalid && t.entry == pid)
    }

    fn find_by_name(&self, name: &str) -> Option<usize> {
        let target = name_from_str(name);
        self.tasks[..self.task_count]
            .iter()
            .position(|t| t.state != TaskState::Invalid && t.name == target)
    }

    /// Registers a new task. Fails if the
    /// table is full, `entry` is already registered, or the stack arena
    /// can't satisfy `stack_bytes`.
    pub fn create_thread(
        &mut self,
        entry: Pid,
        name: &str,
        priority: u8,
        stack_bytes: u32,
    ) -> Result<(), KernelError> {
        if self.task_count >= MAX_TASKS {
            return Err(RecoverableError::TableFull.into());
        }
        if self.find_by_pid(entry).is_some() {
            return Err(RecoverableError::DuplicateEntry.into());
        }
        let slot = self.tasks[..MAX_TASKS]
            .iter()
            .position(|t| t.state == TaskState::Invalid)
            .ok_or(RecoverableError::TableFull)?;

        let alloc = self.stack_alloc.allocate(stack_bytes)?;

        let task = &mut self.tasks[slot];
        *task = Task::invalid();
        task.state = TaskState::Unrun;
        task.entry = entry;
        task.sp_init = alloc.sp_init;
        task.sp = alloc.sp_init;
        task.stack_size = alloc.stack_size;
        task.priority = priority;
        task.srd = alloc.srd;
        task.set_name(name);

        self.task_count += 1;
        self.priority_table = scheduler::build_priority_table(&self.tasks);
        Ok(())
    }

    /// Documented no-op (the original
    /// `setThreadPriority` body is empty; priority is fixed at creation).
    pub fn set_thread_priority(&mut self, _entry: Pid, _priority: u8) {}

    /// Creates/reinitializes semaphore `index` with `count`.
    /// `create_semaphore`).
    pub fn create_semaphore(&mut self, index: usize, count: u16) -> Result<(), KernelError> {
        if index >= MAX_SEMAPHORES {
            return Err(RecoverableError::BadSemaphore.into());
        }
        self.semaphores[index] = Semaphore::new(count);
        Ok(())
    }

    /// Kills `entry`: splices it out of
    /// whatever semaphore queue it may be blocked in and marks it `Killed`.
    /// Its stack subregions remain reserved so `restart` can reuse them.
    pub fn kill(&mut self, entry: Pid) {
        let Some(idx) = self.find_by_pid(entry) else {
            return;
        };
        if self.tasks[idx].state == TaskState::Blocked {
            if let Some(sem) = self.tasks[idx].blocking_semaphore {
                self.semaphores[sem].remove(idx);
            }
        }
        self.tasks[idx].state = TaskState::Killed;
        self.tasks[idx].blocking_semaphore = None;
    }

    /// Restarts a `Killed` task named `name` from a fresh initial frame
    /// No-op if no such killed task exists.
    pub fn resume(&mut self, name: &str) -> Result<(), KernelError> {
        let idx = self
            .tasks
            .iter()
            .position(|t| {
                t.state == TaskState::Killed && t.name == name_from_str(name)
            })
            .ok_or(RecoverableError::UnknownName)?;
        self.tasks[idx].sp = self.tasks[idx].sp_init;
        self.tasks[idx].state = TaskState::Unrun;
        Ok(())
    }

    /// Resolves a task name to its pid.
    pub fn pidof(&self, name: &str) -> Option<Pid> {
        self.find_by_name(name).map(|i| self.tasks[i].entry)
    }

    /// Snapshots every semaphore's count and wait queue.
    /// Names are the fixed, build-time set (the
    /// original copies these names on every call; we do too, since they
    /// never change").
    pub fn ipcs(&self) -> [SemaphoreInformation; MAX_SEMAPHORES] {
        let mut out = [SemaphoreInformation::default(); MAX_SEMAPHORES];
        for (i, sem) in self.semaphores.iter().enumerate() {
            out[i].name = name_from_str(SEMAPHORE_NAMES[i]);
            out[i].count = sem.count;
            out[i].waiting_tasks_number = sem.queue_len() as u16;
            for (j, &t) in sem.queue().iter().enumerate().take(MAX_QUEUE_SIZE) {
                out[i].wait_queue[j] = t as u32;
            }
        }
        out
    }

    /// Snapshots every live task's name, pid, state, and last completed
    /// window's CPU usage. Reports `cpu_usage_time`
    /// rather than the live, still-accumulating `Task::time`. Returns the
    /// snapshot and how many of its entries are valid.
    pub fn ps(&self) -> ([TaskInfo; MAX_TASKS], usize) {
        let mut out = [TaskInfo::default(); MAX_TASKS];
        for (i, task) in self.tasks[..self.task_count].iter().enumerate() {
            out[i].name = task.name;
            out[i].pid = task.entry;
            out[i].state = task.state as u8;
            out[i].time = self.cpu_usage_time[i];
        }
        (out, self.task_count)
    }

    /// `wait` SVC: acquires `semaphore` for the current task
    /// or blocks it in the FIFO.
    pub fn wait(&mut self, semaphore: usize) -> Result<(), KernelError> {
        if semaphore >= MAX_SEMAPHORES {
            return Err(RecoverableError::BadSemaphore.into());
        }
        let current = self.current;
        match self.semaphores[semaphore].wait(current)? {
            WaitOutcome::Acquired => {}
            WaitOutcome::Blocked => {
                self.tasks[current].state = TaskState::Blocked;
                self.tasks[current].blocking_semaphore = Some(semaphore);
                A::request_switch();
            }
        }
        Ok(())
    }

    /// `post` SVC: releases `semaphore`, waking its head
    /// waiter if any.
    pub fn post(&mut self, semaphore: usize) -> Result<(), KernelError> {
        if semaphore >= MAX_SEMAPHORES {
            return Err(RecoverableError::BadSemaphore.into());
        }
        if let Some(woken) = self.semaphores[semaphore].post() {
            self.tasks[woken].state = TaskState::Ready;
            self.tasks[woken].blocking_semaphore = None;
        }
        Ok(())
    }

    /// `sleep` SVC: delays the current task for `ticks`.
    pub fn sleep(&mut self, ticks: u32) {
        let current = self.current;
        self.tasks[current].ticks = ticks;
        self.tasks[current].state = TaskState::Delayed;
        A::request_switch();
    }

    /// `yield` SVC: gives up the remainder of the current time slice.
    pub fn yield_now(&mut self) {
        A::request_switch();
    }

    /// `sched` SVC: `false` selects round-robin, `true`
    /// selects strict priority.
    pub fn sched(&mut self, priority_mode: bool) {
        self.mode = if priority_mode {
            SchedulerMode::Priority
        } else {
            SchedulerMode::RoundRobin
        };
    }

    /// `preempt` SVC: enables or disables SysTick-driven preemption.
    pub fn preempt(&mut self, on: bool) {
        self.preemption_on = on;
    }

    pub fn preemption_enabled(&self) -> bool {
        self.preemption_on
    }

    /// One-time boot sequence: program the MPU, build the priority table,
    /// and pick the first task to run. Returns
    /// its raw top-of-stack pointer and entry point for
    /// `Arch::start_first_task`, which calls the task directly rather than
    /// exception-returning into a synthesized frame — no task has run yet,
    /// so there's nothing to restore.
    pub fn boot(&mut self) -> (u32, Pid) {
        A::init_protection();
        self.priority_table = scheduler::build_priority_table(&self.tasks);
        self.current = self.select_next();
        self.task_start_micros = A::micros();
        let task = &mut self.tasks[self.current];
        task.state = TaskState::Ready;
        A::apply_srd_mask(task.srd);
        (task.sp_init, task.entry)
    }

    fn select_next(&mut self) -> usize {
        match self.mode {
            SchedulerMode::RoundRobin => {
                scheduler::select_round_robin(self.round_robin_cursor, &self.tasks)
            }
            SchedulerMode::Priority => {
                let levels = self.task_count.max(1);
                let (idx, next_cursor) = scheduler::select_priority(
                    self.priority_cursor,
                    &self.priority_table,
                    &self.tasks,
                    levels,
                );
                self.priority_cursor = next_cursor;
                idx
            }
        }
    }

    /// PendSV body: accounts the outgoing task's CPU time, picks the next
    /// runnable task, applies its SRD mask, and returns its saved stack
    /// pointer. `outgoing_sp` is the PSP captured by the
    /// trampoline right after it pushed R4-R11.
    pub fn switch_context(&mut self, outgoing_sp: u32) -> u32 {
        if A::take_mpu_fault() {
            self.tasks[self.current].state = TaskState::Killed;
        }

        let now = A::micros();
        self.tasks[self.current].sp = outgoing_sp;
        self.tasks[self.current].time = self.tasks[self.current]
            .time
            .wrapping_add(now.wrapping_sub(self.task_start_micros));

        if self.tasks[self.current].state == TaskState::Ready {
            self.round_robin_cursor = self.current;
        }

        self.current = self.select_next();
        self.task_start_micros = now;

        let task = &mut self.tasks[self.current];
        if task.state == TaskState::Unrun {
            task.sp = A::initial_frame(
                task.entry,
                &crate::mpu::StackAllocation {
                    sp_init: task.sp_init,
                    stack_size: task.stack_size,
                    srd: task.srd,
                },
            );
        }
        task.state = TaskState::Ready;
        A::apply_srd_mask(task.srd);
        task.sp
    }

    /// SysTick body: counts down every `Delayed` task and
    /// wakes those that reach zero; every `USAGE_WINDOW_TICKS` ticks, resets
    /// the CPU-usage accounting window. Returns whether a context switch
    /// should be requested.
    pub fn on_tick(&mut self, tick_count: u32) -> bool {
        let mut should_switch = false;
        for task in self.tasks[..self.task_count].iter_mut() {
            if task.state == TaskState::Delayed {
                task.ticks = task.ticks.saturating_sub(1);
                if task.ticks == 0 {
                    task.state = TaskState::Ready;
                    should_switch = true;
                }
            }
        }
        if tick_count.wrapping_sub(self.usage_window_start_tick) >= USAGE_WINDOW_TICKS {
            self.usage_window_start_tick = tick_count;
            for (i, task) in self.tasks[..self.task_count].iter_mut().enumerate() {
                self.cpu_usage_time[i] = task.time;
                task.time = 0;
            }
        }
        should_switch && self.preemption_on
    }
}

/// Called from the PendSV trampoline (`arch::arm_m::PendSV`) with the
/// outgoing task's saved PSP; returns the incoming task's PSP.
///
/// # Safety
/// Must only be called from the PendSV exception with interrupts otherwise
/// masked by the processor's exception-priority scheme.
#[cfg(target_arch = "arm")]
#[unsafe(no_mangle)]
pub extern "C" fn pend_sv_handler(outgoing_sp: u32) -> u32 {
    unsafe { kernel_mut().switch_context(outgoing_sp) }
}

/// Called from the SVCall trampoline with the decoded SVC number and the
/// two argument registers (R0, R1) the hardware stacked at the time of the
/// trap. Returns the value to splice back into the stacked R0. Recoverable
/// errors are silently swallowed here, matching the original `svCallIsr`'s
/// default case ("unhandled SVC does nothing").
///
/// # Safety
/// Must only be called from the SVCall exception trampoline.
#[cfg(target_arch = "arm")]
pub unsafe extern "C" fn svc_dispatch(number: u8, r0: u32, r1: u32) -> u32 {
    let k = unsafe { kernel_mut() };
    match crate::syscall::Svc::from_u8(number) {
        Some(crate::syscall::Svc::Yield) => {
            k.yield_now();
            0
        }
        Some(crate::syscall::Svc::Sleep) => {
            k.sleep(r0);
            0
        }
        Some(crate::syscall::Svc::Wait) => {
            let _ = k.wait(r0 as usize);
            0
        }
        Some(crate::syscall::Svc::Post) => {
            let _ = k.post(r0 as usize);
            0
        }
        Some(crate::syscall::Svc::Sched) => {
            k.sched(r0 != 0);
            0
        }
        Some(crate::syscall::Svc::Preempt) => {
            k.preempt(r0 != 0);
            0
        }
        Some(crate::syscall::Svc::Reboot) => crate::arch::arm_m::system_reset(),
        Some(crate::syscall::Svc::Pid) => unsafe {
            let name = str_from_raw(r0 as *const u8, r1);
            k.pidof(name).unwrap_or(0)
        },
        Some(crate::syscall::Svc::Kill) => {
            k.kill(r0);
            0
        }
        Some(crate::syscall::Svc::Resume) => unsafe {
            let name = str_from_raw(r0 as *const u8, r1);
            let _ = k.resume(name);
            0
        },
        Some(crate::syscall::Svc::Ipcs) => unsafe {
            let out = r0 as *mut crate::abi::SemaphoreInformation;
            let snapshot = k.ipcs();
            core::ptr::copy_nonoverlapping(snapshot.as_ptr(), out, MAX_SEMAPHORES);
            0
        },
        Some(crate::syscall::Svc::Ps) => unsafe {
            let out = r0 as *mut crate::abi::TaskInfo;
            let (snapshot, count) = k.ps();
            core::ptr::copy_nonoverlapping(snapshot.as_ptr(), out, count);
            count as u32
        },
        None => 0,
    }
}

/// Interprets `(ptr, len)` as a UTF-8 task/semaphore name. Non-UTF-8 input
/// (which a correct user stub never produces) is treated as empty rather
/// than faulted on, since SVC arguments are trusted privileged-mode data.
#[cfg(target_arch = "arm")]
unsafe fn str_from_raw<'a>(ptr: *const u8, len: u32) -> &'a str {
    let bytes = unsafe { core::slice::from_raw_parts(ptr, len as usize) };
    core::str::from_utf8(bytes).unwrap_or("")
}

/// SysTick body called from `arch::arm_m::SysTick`: advances the tick
/// counter and, if any task woke up or preemption is enabled, requests a
/// context switch.
#[cfg(target_arch = "arm")]
pub fn on_systick() {
    let tick = crate::systick::on_tick();
    let should_switch = unsafe { kernel_mut().on_tick(tick) };
    if should_switch {
        crate::arch::arm_m::ArmM4F::request_switch();
    }
}

/// Reports an MPU access violation on the current task through
/// `fault::handle`, purely for diagnostics. The actual task-kill decision is
/// made separately, inside `Kernel::switch_context`, which checks the same
/// CFSR bits `arch::arm_m::MemoryManagement` already read.
#[cfg(target_arch = "arm")]
pub fn report_mpu_fault(frame: &crate::diag::FaultFrame) {
    let pid = unsafe { kernel_mut().current_pid() };
    let _ = crate::fault::handle(
        crate::error::FaultKind::MpuViolation,
        pid,
        frame,
        &crate::diag::NullSink,
    );
}

/// Reports an unrecoverable fault on the current task and halts forever.
/// Called from the `BusFault`/`UsageFault`/`HardFault` vectors.
#[cfg(target_arch = "arm")]
pub fn halt_on_fault(kind: crate::error::FaultKind) -> ! {
    let pid = unsafe { kernel_mut().current_pid() };
    let _ = crate::fault::handle(kind, pid, &crate::diag::FaultFrame::default(), &crate::diag::NullSink);
    loop {}
}

#[cfg(target_arch = "arm")]
static mut KERNEL: Kernel<crate::arch::arm_m::ArmM4F> = Kernel::new();

#[cfg(target_arch = "arm")]
unsafe fn kernel_mut() -> &'static mut Kernel<crate::arch::arm_m::ArmM4F> {
    unsafe { &mut *core::ptr::addr_of_mut!(KERNEL) }
}

/// Board bring-up entry point: registers `tasks` and `semaphores`, then
/// hands control to the first task and never returns
/// `start_rtos`). Call once, after all `create_thread`/`create_semaphore`
/// calls, from `main`.
///
/// # Safety
/// Must be called exactly once, before any exception that could touch the
/// kernel singleton (SVCall/PendSV/SysTick) is unmasked.
#[cfg(target_arch = "arm")]
pub unsafe fn run() -> ! {
    let (sp, entry) = unsafe { kernel_mut().boot() };
    if let Some(mut st) = drivers::systick::SysTick::take() {
        crate::systick::start(&mut st);
    }
    crate::arch::arm_m::ArmM4F::start_first_task(sp, entry)
}

/// Registers a new task on the singleton kernel.
/// `create_thread`). Thin wrapper so board bring-up code never has to name
/// `Kernel<ArmM4F>` itself.
#[cfg(target_arch = "arm")]
pub fn create_thread(entry: Pid, name: &str, priority: u8, stack_bytes: u32) -> Result<(), KernelError> {
    unsafe { kernel_mut().create_thread(entry, name, priority, stack_bytes) }
}

/// Registers semaphore `index` on the singleton kernel.
/// `create_semaphore`).
#[cfg(target_arch = "arm")]
pub fn create_semaphore(index: usize, count: u16) -> Result<(), KernelError> {
    unsafe { kernel_mut().create_semaphore(index, count) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arch::sim::Sim;

    type TestKernel = Kernel<Sim>;

    fn booted_kernel() -> TestKernel {
        let mut k = TestKernel::new();
        k.create_thread(1, "idle", 7, 1024).unwrap();
        k
    }

    #[test]
    fn create_thread_rejects_duplicate_entry() {
        let mut k = booted_kernel();
        assert_eq!(
            k.create_thread(1, "idle2", 7, 1024).unwrap_err(),
            RecoverableError::DuplicateEntry.into()
        );
    }

    #[test]
    fn create_thread_fills_table_then_fails() {
        let mut k = TestKernel::new();
        for i in 0..MAX_TASKS {
            k.create_thread(i as u32 + 1, "t", 3, 1024).unwrap();
        }
        assert_eq!(
            k.create_thread(999, "overflow", 3, 1024).unwrap_err(),
            RecoverableError::TableFull.into()
        );
    }

    #[test]
    fn kill_splices_blocked_task_out_of_semaphore_queue() {
        let mut k = booted_kernel();
        k.create_thread(2, "waiter", 3, 1024).unwrap();
        k.create_semaphore(1, 0).unwrap();
        k.current = 1; // "waiter"
        k.wait(1).unwrap();
        assert_eq!(k.semaphores[1].queue_len(), 1);

        k.kill(2);
        assert_eq!(k.semaphores[1].queue_len(), 0);
        assert_eq!(k.tasks[1].state, TaskState::Killed);
    }

    #[test]
    fn resume_only_affects_killed_tasks() {
        let mut k = booted_kernel();
        assert_eq!(k.resume("idle"), Err(RecoverableError::UnknownName.into()));
        k.kill(1);
        assert!(k.resume("idle").is_ok());
        assert_eq!(k.tasks[0].state, TaskState::Unrun);
        assert_eq!(k.tasks[0].sp, k.tasks[0].sp_init);
    }

    #[test]
    fn pidof_resolves_registered_name() {
        let k = booted_kernel();
        assert_eq!(k.pidof("idle"), Some(1));
        assert_eq!(k.pidof("nope"), None);
    }

    #[test]
    fn sleep_marks_delayed_and_tick_wakes_it() {
        let mut k = booted_kernel();
        k.sleep(3);
        assert_eq!(k.tasks[0].state, TaskState::Delayed);
        k.on_tick(1);
        k.on_tick(2);
        assert_eq!(k.tasks[0].state, TaskState::Delayed);
        let switched = k.on_tick(3);
        assert_eq!(k.tasks[0].state, TaskState::Ready);
        assert!(switched);
    }

    #[test]
    fn usage_window_snapshots_then_resets_accumulated_time() {
        let mut k = booted_kernel();
        k.tasks[0].time = 500;
        k.on_tick(USAGE_WINDOW_TICKS);
        assert_eq!(k.tasks[0].time, 0);
        assert_eq!(k.cpu_usage_time[0], 500);
        let (snapshot, _) = k.ps();
        assert_eq!(snapshot[0].time, 500);
    }

    #[test]
    fn ipcs_reports_fixed_names_and_queue_state() {
        let mut k = booted_kernel();
        k.create_semaphore(1, 2).unwrap();
        let snapshot = k.ipcs();
        assert_eq!(snapshot[1].count, 2);
        assert_eq!(&snapshot[1].name[..10], b"keyPressed");
    }

    #[test]
    fn ps_reports_only_live_tasks() {
        let mut k = booted_kernel();
        k.create_thread(2, "second", 3, 1024).unwrap();
        let (snapshot, count) = k.ps();
        assert_eq!(count, 2);
        assert_eq!(snapshot[0].pid, 1);
        assert_eq!(snapshot[1].pid, 2);
    }
}

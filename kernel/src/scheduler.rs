//! Scheduler: round-robin and strict-priority variants.
//!
//! Pure functions over `&[Task]`, the same shape as hubris's
//! `task::select`/`priority_scan` — no architecture dependency, so these are
//! exercised directly by host unit tests.

use crate::config::MAX_TASKS;
use crate::task::Task;

/// Selects which scheduler policy `select` uses.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum SchedulerMode {
    RoundRobin,
    Priority,
}

impl Default for SchedulerMode {
    fn default() -> Self {
        SchedulerMode::RoundRobin
    }
}

/// An ordered walk order over task-table indices, built once at boot by
/// `build_priority_table` and then cycled through by the priority scheduler.
/// `-1`-sentineled the way the original `priNextTask` is, represented here
/// as `Option<u8>` so invalid slots can't be mistaken for task 0.
pub type PriorityTable = [Option<u8>; MAX_TASKS];

/// Fills `table` in ascending-priority order, then ascending slot index
/// within a priority band.
pub fn build_priority_table(tasks: &[Task; MAX_TASKS]) -> PriorityTable {
    let mut table: PriorityTable = [None; MAX_TASKS];
    let mut level = 0usize;
    for priority in 0..=crate::config::LOWEST_PRIORITY {
        for (idx, task) in tasks.iter().enumerate() {
            if task.state != crate::task::TaskState::Invalid && task.priority == priority {
                table[level] = Some(idx as u8);
                level += 1;
            }
        }
    }
    table
}

/// Round-robin: advance from `previous` modulo `MAX_TASKS` until a `Ready`
/// or `Unrun` slot is found.
///
/// # Panics
/// If no task in `tasks` is `Ready` or `Unrun` (board bring-up always
/// registers an idle task that never sleeps or blocks, so in practice this
/// never happens).
pub fn select_round_robin(previous: usize, tasks: &[Task; MAX_TASKS]) -> usize {
    for step in 1..=MAX_TASKS {
        let idx = (previous + step) % MAX_TASKS;
        if tasks[idx].is_runnable() {
            return idx;
        }
    }
    panic!("no tasks runnable");
}

/// Strict priority: walk `table` cyclically starting just after `cursor`,
/// returning the first runnable task found and the table position it was
/// found at (so the caller can resume the walk from there next time).
///
/// # Panics
/// If no task named in `table` is runnable.
pub fn select_priority(
    cursor: usize,
    table: &PriorityTable,
    tasks: &[Task; MAX_TASKS],
    levels: usize,
) -> (usize, usize) {
    assert!(levels > 0, "priority table must have at least one entry");
    for step in 0..levels {
        let level = (cursor + step) % levels;
        if let Some(idx) = table[level] {
            let idx = idx as usize;
            if tasks[idx].is_runnable() {
                return (idx, (level + 1) % levels);
            }
        }
    }
    panic!("no tasks runnable");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::TaskState;

    fn make_tasks() -> [Task; MAX_TASKS] {
        core::array::from_fn(|_| Task::invalid())
    }

    #[test]
    fn round_robin_skips_non_runnable_and_wraps() {
        let mut tasks = make_tasks();
        tasks[0].state = TaskState::Ready;
        tasks[2].state = TaskState::Ready;
        tasks[5].state = TaskState::Delayed;

        assert_eq!(select_round_robin(0, &tasks), 2);
        assert_eq!(select_round_robin(2, &tasks), 0); // wraps around
    }

    #[test]
    fn priority_respects_lower_numbers_first() {
        // higher-priority ready tasks always win.
        let mut tasks = make_tasks();
        tasks[0].state = TaskState::Ready;
        tasks[0].priority = 1; // A
        tasks[1].state = TaskState::Ready;
        tasks[1].priority = 3; // B

        let table = build_priority_table(&tasks);
        let levels = tasks.iter().filter(|t| t.state != TaskState::Invalid).count();
        let (chosen, _) = select_priority(0, &table, &tasks, levels);
        assert_eq!(chosen, 0, "A (priority 1) must be chosen over B (priority 3)");
    }

    #[test]
    fn priority_table_orders_by_priority_then_index() {
        let mut tasks = make_tasks();
        tasks[3].state = TaskState::Ready;
        tasks[3].priority = 2;
        tasks[1].state = TaskState::Ready;
        tasks[1].priority = 2;
        tasks[0].state = TaskState::Ready;
        tasks[0].priority = 0;

        let table = build_priority_table(&tasks);
        assert_eq!(table[0], Some(0));
        assert_eq!(table[1], Some(1));
        assert_eq!(table[2], Some(3));
    }
}

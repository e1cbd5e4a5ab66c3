use crate::models::{Task, TaskPriority, TaskStatus};

/// Task Mutation Audit
///
/// Pure computation of the history record a task mutation owes the audit
/// trail. The repository appends the resulting delta in the same database
/// transaction as the task write, so a visible update always has its history
/// entry. Entries are append-only; nothing in this crate amends or removes
/// them.

/// The audited dimensions of a task, captured before and after a mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskSnapshot {
    pub status: TaskStatus,
    pub priority: TaskPriority,
}

impl From<&Task> for TaskSnapshot {
    fn from(task: &Task) -> Self {
        Self {
            status: task.status,
            priority: task.priority,
        }
    }
}

/// One pending history append. An `old_*` of None means that dimension did
/// not change; `new_*` always carries the current value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryDelta {
    pub old_status: Option<TaskStatus>,
    pub new_status: TaskStatus,
    pub old_priority: Option<TaskPriority>,
    pub new_priority: TaskPriority,
}

/// Task creation always yields exactly one entry, with no prior values.
pub fn creation_entry(after: TaskSnapshot) -> HistoryDelta {
    HistoryDelta {
        old_status: None,
        new_status: after.status,
        old_priority: None,
        new_priority: after.priority,
    }
}

/// Returns the entry a mutation must append, or None when neither status nor
/// priority changed. Only the changed dimension records a real delta.
pub fn change_delta(before: TaskSnapshot, after: TaskSnapshot) -> Option<HistoryDelta> {
    if before == after {
        return None;
    }
    Some(HistoryDelta {
        old_status: (before.status != after.status).then_some(before.status),
        new_status: after.status,
        old_priority: (before.priority != after.priority).then_some(before.priority),
        new_priority: after.priority,
    })
}

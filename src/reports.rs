use chrono::{DateTime, Utc};
use std::collections::HashMap;

use crate::models::{DashboardStats, Project, Task, TaskStatus};

/// Aggregation Reporter
///
/// Derives the dashboard counters from record sets that were already narrowed
/// by the caller's scope filters. It never consults the store or the identity
/// itself, which keeps it trivially consistent with the scoping policy: what
/// you can list is exactly what gets counted.
pub fn dashboard_stats(projects: &[Project], tasks: &[Task], now: DateTime<Utc>) -> DashboardStats {
    let total = tasks.len() as i64;
    let completed = tasks
        .iter()
        .filter(|t| t.status == TaskStatus::Done)
        .count() as i64;

    // round(completed / total * 100); zero tasks is a 0% rate, not an error.
    let completion_rate = if total == 0 {
        0
    } else {
        ((completed as f64 / total as f64) * 100.0).round() as i64
    };

    let overdue = tasks
        .iter()
        .filter(|t| t.status != TaskStatus::Done)
        .filter(|t| t.due_date.is_some_and(|due| due < now))
        .count() as i64;

    // Only values that occur are present; zero counts stay omitted.
    let mut status_distribution = HashMap::new();
    let mut priority_distribution = HashMap::new();
    for task in tasks {
        *status_distribution.entry(task.status).or_insert(0) += 1;
        *priority_distribution.entry(task.priority).or_insert(0) += 1;
    }

    DashboardStats {
        total_projects: projects.len() as i64,
        tasks_completed: completed,
        completion_rate,
        pending_tasks: total - completed,
        overdue_tasks: overdue,
        status_distribution,
        priority_distribution,
    }
}

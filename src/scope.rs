use uuid::Uuid;

use crate::{
    auth::Identity,
    error::ApiError,
    models::{Project, Role, Task},
};

/// Resource Scoping Policy
///
/// Computes which records an identity may see or mutate. Each resource kind
/// exposes a list-shaped filter and a single-record check; the single-record
/// check is defined *via* the filter, so the two can never disagree. The
/// Postgres repository translates the same filters into WHERE clauses.

/// Visibility filter for projects, as produced by [`project_scope`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectScope {
    /// Unrestricted (ADMIN).
    All,
    /// Records where the given user is the creator or an assigned member.
    MemberOf(Uuid),
}

impl ProjectScope {
    pub fn matches(&self, project: &Project) -> bool {
        match self {
            ProjectScope::All => true,
            ProjectScope::MemberOf(user_id) => {
                project.created_by == *user_id || project.assigned_user_ids.contains(user_id)
            }
        }
    }
}

/// Visibility filter for tasks, as produced by [`task_scope`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskScope {
    All,
    AssignedTo(Uuid),
}

impl TaskScope {
    pub fn matches(&self, task: &Task) -> bool {
        match self {
            TaskScope::All => true,
            TaskScope::AssignedTo(user_id) => task.assignee_id == *user_id,
        }
    }
}

pub fn project_scope(identity: &Identity) -> ProjectScope {
    match identity.role {
        Role::Admin => ProjectScope::All,
        Role::User => ProjectScope::MemberOf(identity.id),
    }
}

pub fn task_scope(identity: &Identity) -> TaskScope {
    match identity.role {
        Role::Admin => TaskScope::All,
        Role::User => TaskScope::AssignedTo(identity.id),
    }
}

/// Single-record counterpart of the project list filter.
pub fn can_view_project(identity: &Identity, project: &Project) -> bool {
    project_scope(identity).matches(project)
}

/// Single-record counterpart of the task list filter.
pub fn can_view_task(identity: &Identity, task: &Task) -> bool {
    task_scope(identity).matches(task)
}

/// Task mutation mirrors task visibility: ADMIN unconditionally, otherwise
/// only the assignee. Creation and deletion are coarser (ADMIN-only) and
/// declared through RouteAccess instead.
pub fn can_edit_task(identity: &Identity, task: &Task) -> bool {
    identity.role == Role::Admin || task.assignee_id == identity.id
}

// The require_* helpers keep the check order fixed: existence first
// (NotFound), ownership second (Forbidden). A record that genuinely does not
// exist reports NotFound even to a caller who would also have been denied.

pub fn require_project_view(
    identity: &Identity,
    project: Option<Project>,
) -> Result<Project, ApiError> {
    let project = project.ok_or(ApiError::NotFound)?;
    if can_view_project(identity, &project) {
        Ok(project)
    } else {
        Err(ApiError::Forbidden)
    }
}

pub fn require_task_view(identity: &Identity, task: Option<Task>) -> Result<Task, ApiError> {
    let task = task.ok_or(ApiError::NotFound)?;
    if can_view_task(identity, &task) {
        Ok(task)
    } else {
        Err(ApiError::Forbidden)
    }
}

pub fn require_task_edit(identity: &Identity, task: Option<Task>) -> Result<Task, ApiError> {
    let task = task.ok_or(ApiError::NotFound)?;
    if can_edit_task(identity, &task) {
        Ok(task)
    } else {
        Err(ApiError::Forbidden)
    }
}

/// Referential gate for write payloads: callers collect every foreign id that
/// failed to resolve and fail once with the full list.
pub fn ensure_references(missing: Vec<Uuid>) -> Result<(), ApiError> {
    if missing.is_empty() {
        Ok(())
    } else {
        Err(ApiError::DanglingReference(missing))
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::collections::HashMap;
use uuid::Uuid;

// --- Role & task vocabularies ---

/// Role
///
/// The RBAC field carried in token claims and on user records. The wire and
/// database spelling is uppercase ("ADMIN"/"USER").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(type_name = "user_role")]
pub enum Role {
    #[sqlx(rename = "ADMIN")]
    Admin,
    #[sqlx(rename = "USER")]
    User,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "task_status")]
pub enum TaskStatus {
    #[sqlx(rename = "TODO")]
    Todo,
    #[sqlx(rename = "IN_PROGRESS")]
    InProgress,
    #[sqlx(rename = "DONE")]
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(type_name = "task_priority")]
pub enum TaskPriority {
    #[sqlx(rename = "LOW")]
    Low,
    #[sqlx(rename = "MEDIUM")]
    Medium,
    #[sqlx(rename = "HIGH")]
    High,
}

// --- Core Application Schemas (Mapped to Database) ---

/// User
///
/// Canonical identity record from the `users` table. Deliberately has no
/// Serialize derive: the password hash must never reach a response body,
/// outward-facing code goes through [`UserProfile`].
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// Project
///
/// A project record from the `projects` table. The creator and every id in
/// `assigned_user_ids` (a uuid[] column) have visibility; mutation is a
/// separate, ADMIN-only right.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Project {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    // FK to users.id (creator).
    pub created_by: Uuid,
    pub assigned_user_ids: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Task
///
/// A task record from the `tasks` table. Visible to ADMIN unconditionally and
/// otherwise only to its assignee.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub project_id: Uuid,
    pub assignee_id: Uuid,
    pub due_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// TaskHistoryEntry
///
/// Append-only audit record of a task's status/priority change. Never updated
/// or deleted after insertion; the repository exposes no mutation for it.
/// A null `old_*` field means that dimension did not change (or, for the
/// creation entry, had no prior value).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TaskHistoryEntry {
    pub id: Uuid,
    pub task_id: Uuid,
    // The actor who performed the mutation.
    pub updated_by: Uuid,
    pub old_status: Option<TaskStatus>,
    pub new_status: TaskStatus,
    pub old_priority: Option<TaskPriority>,
    pub new_priority: TaskPriority,
    pub created_at: DateTime<Utc>,
}

// --- Request Payloads (Input Schemas) ---

/// Input payload for the public registration endpoint (POST /auth/register).
/// The password only ever reaches the hashing collaborator, never storage or logs.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    // Defaults to USER when absent.
    pub role: Option<Role>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProjectRequest {
    pub name: String,
    pub description: String,
    /// Every id here must resolve to an existing user at write time.
    #[serde(default)]
    pub assigned_user_ids: Vec<Uuid>,
}

/// Partial update payload for PUT /projects/{id}. Only provided fields change;
/// membership is managed through the assign/remove endpoints instead.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateProjectRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTaskRequest {
    pub title: String,
    pub description: String,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub project_id: Uuid,
    pub assignee_id: Uuid,
    pub due_date: Option<DateTime<Utc>>,
}

/// Partial update payload for PUT /tasks/{id}. A status or priority change
/// here is what triggers the audit trail append.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateTaskRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<TaskPriority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
}

/// Accepted query parameters for GET /tasks.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskListFilter {
    pub project_id: Option<Uuid>,
    pub status: Option<TaskStatus>,
}

// --- Output Schemas ---

/// Outward-facing user shape (no password hash).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            role: user.role,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserProfile,
}

/// DashboardStats
///
/// Output schema for GET /dashboard/stats, computed over the caller's visible
/// projects and tasks only. Distribution maps carry only the values that
/// actually occur; zero counts are omitted rather than zero-filled.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DashboardStats {
    pub total_projects: i64,
    pub tasks_completed: i64,
    /// Rounded percentage; 0 when there are no visible tasks at all.
    pub completion_rate: i64,
    pub pending_tasks: i64,
    pub overdue_tasks: i64,
    pub status_distribution: HashMap<TaskStatus, i64>,
    pub priority_distribution: HashMap<TaskPriority, i64>,
}

use crate::{
    AppState,
    audit::{self, TaskSnapshot},
    auth::{ADMIN_ONLY, Identity},
    error::ApiError,
    models::{
        CreateProjectRequest, CreateTaskRequest, DashboardStats, LoginRequest, LoginResponse,
        Project, RegisterRequest, Role, Task, TaskHistoryEntry, TaskListFilter, TaskPriority,
        TaskStatus, UpdateProjectRequest, UpdateTaskRequest, UserProfile,
    },
    reports, scope,
    token::TokenCodec,
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::Utc;
use uuid::Uuid;

/// Wraps a storage failure with full request context (operation, identity,
/// resource) before collapsing it to the generic internal error.
fn storage_err(
    operation: &'static str,
    identity: &Identity,
    resource: Option<Uuid>,
    err: sqlx::Error,
) -> ApiError {
    tracing::error!(operation, user = %identity.id, resource = ?resource, error = ?err,
        "storage failure");
    ApiError::Internal
}

/// Deduplicated ids from `requested` that are not in `existing`, in request order.
fn missing_ids(requested: &[Uuid], existing: &[Uuid]) -> Vec<Uuid> {
    let mut missing = Vec::new();
    for id in requested {
        if !existing.contains(id) && !missing.contains(id) {
            missing.push(*id);
        }
    }
    missing
}

// --- Credential exchange ---

/// [Public Route] POST /auth/register
///
/// Creates a user record with a bcrypt-hashed password. The plaintext password
/// only ever reaches the hashing collaborator.
pub async fn register_user(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Json<UserProfile>, ApiError> {
    let taken = state
        .repo
        .get_user_by_email(&payload.email)
        .await
        .map_err(|e| ApiError::storage("register_user", e))?;
    if taken.is_some() {
        return Err(ApiError::EmailTaken);
    }

    let hash = state
        .hasher
        .hash(&payload.password)
        .map_err(|_| ApiError::Internal)?;
    let role = payload.role.unwrap_or(Role::User);

    let user = state
        .repo
        .create_user(&payload.email, role, &hash)
        .await
        .map_err(|e| ApiError::storage("register_user", e))?;

    tracing::info!(user = %user.id, "user registered");
    Ok(Json(UserProfile::from(&user)))
}

/// [Public Route] POST /auth/login
///
/// Verifies the password against the stored hash and issues a signed bearer
/// token. Unknown email and wrong password are indistinguishable to the caller.
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let user = state
        .repo
        .get_user_by_email(&payload.email)
        .await
        .map_err(|e| ApiError::storage("login", e))?
        .ok_or(ApiError::InvalidLogin)?;

    if !state.hasher.compare(&payload.password, &user.password_hash) {
        return Err(ApiError::InvalidLogin);
    }

    let token = TokenCodec::from_config(&state.config)
        .issue(user.id, &user.email, user.role)
        .map_err(|_| ApiError::Internal)?;

    Ok(Json(LoginResponse {
        token,
        user: UserProfile::from(&user),
    }))
}

/// [Authenticated Route] GET /me
pub async fn get_me(
    identity: Identity,
    State(state): State<AppState>,
) -> Result<Json<UserProfile>, ApiError> {
    let user = state
        .repo
        .get_user(identity.id)
        .await
        .map_err(|e| storage_err("get_me", &identity, None, e))?
        // A valid token for a since-deleted user resolves to nothing.
        .ok_or(ApiError::NotFound)?;
    Ok(Json(UserProfile::from(&user)))
}

// --- Projects ---

/// [Authenticated Route] GET /projects
///
/// The scope filter silently narrows the result set: a USER's list never
/// errors for lack of access, it just returns fewer records.
pub async fn list_projects(
    identity: Identity,
    State(state): State<AppState>,
) -> Result<Json<Vec<Project>>, ApiError> {
    let projects = state
        .repo
        .list_projects(&scope::project_scope(&identity))
        .await
        .map_err(|e| storage_err("list_projects", &identity, None, e))?;
    Ok(Json(projects))
}

/// [Authenticated Route] GET /projects/{id}
///
/// Existence is checked before ownership: a genuinely absent record is 404
/// even for a caller who would also have been denied.
pub async fn get_project(
    identity: Identity,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Project>, ApiError> {
    let project = state
        .repo
        .get_project(id)
        .await
        .map_err(|e| storage_err("get_project", &identity, Some(id), e))?;
    Ok(Json(scope::require_project_view(&identity, project)?))
}

/// [Admin Route] POST /projects
///
/// Membership grants visibility, not mutation rights: creation is ADMIN-only.
/// Every referenced assignee must resolve; all dangling ids are reported together.
pub async fn create_project(
    identity: Identity,
    State(state): State<AppState>,
    Json(payload): Json<CreateProjectRequest>,
) -> Result<Json<Project>, ApiError> {
    ADMIN_ONLY.authorize(&identity)?;

    let existing = state
        .repo
        .existing_users(&payload.assigned_user_ids)
        .await
        .map_err(|e| storage_err("create_project", &identity, None, e))?;
    scope::ensure_references(missing_ids(&payload.assigned_user_ids, &existing))?;

    let project = state
        .repo
        .create_project(&payload, identity.id)
        .await
        .map_err(|e| storage_err("create_project", &identity, None, e))?;

    tracing::info!(project = %project.id, user = %identity.id, "project created");
    Ok(Json(project))
}

/// [Admin Route] PUT /projects/{id}
pub async fn update_project(
    identity: Identity,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateProjectRequest>,
) -> Result<Json<Project>, ApiError> {
    ADMIN_ONLY.authorize(&identity)?;

    state
        .repo
        .update_project(id, &payload)
        .await
        .map_err(|e| storage_err("update_project", &identity, Some(id), e))?
        .map(Json)
        .ok_or(ApiError::NotFound)
}

/// [Admin Route] DELETE /projects/{id}
pub async fn delete_project(
    identity: Identity,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    ADMIN_ONLY.authorize(&identity)?;

    let deleted = state
        .repo
        .delete_project(id)
        .await
        .map_err(|e| storage_err("delete_project", &identity, Some(id), e))?;
    if deleted {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound)
    }
}

/// [Admin Route] POST /projects/{id}/users/{user_id}
///
/// Grants a user visibility of the project. Idempotent at the storage layer.
pub async fn assign_project_user(
    identity: Identity,
    State(state): State<AppState>,
    Path((project_id, user_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<Project>, ApiError> {
    ADMIN_ONLY.authorize(&identity)?;

    let existing = state
        .repo
        .existing_users(&[user_id])
        .await
        .map_err(|e| storage_err("assign_project_user", &identity, Some(project_id), e))?;
    scope::ensure_references(missing_ids(&[user_id], &existing))?;

    state
        .repo
        .assign_project_user(project_id, user_id)
        .await
        .map_err(|e| storage_err("assign_project_user", &identity, Some(project_id), e))?
        .map(Json)
        .ok_or(ApiError::NotFound)
}

/// [Admin Route] DELETE /projects/{id}/users/{user_id}
pub async fn remove_project_user(
    identity: Identity,
    State(state): State<AppState>,
    Path((project_id, user_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<Project>, ApiError> {
    ADMIN_ONLY.authorize(&identity)?;

    state
        .repo
        .remove_project_user(project_id, user_id)
        .await
        .map_err(|e| storage_err("remove_project_user", &identity, Some(project_id), e))?
        .map(Json)
        .ok_or(ApiError::NotFound)
}

// --- Tasks ---

/// [Authenticated Route] GET /tasks?project_id=...&status=...
pub async fn list_tasks(
    identity: Identity,
    State(state): State<AppState>,
    Query(filter): Query<TaskListFilter>,
) -> Result<Json<Vec<Task>>, ApiError> {
    let tasks = state
        .repo
        .list_tasks(&scope::task_scope(&identity), &filter)
        .await
        .map_err(|e| storage_err("list_tasks", &identity, None, e))?;
    Ok(Json(tasks))
}

/// [Authenticated Route] GET /tasks/{id}
pub async fn get_task(
    identity: Identity,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Task>, ApiError> {
    let task = state
        .repo
        .get_task(id)
        .await
        .map_err(|e| storage_err("get_task", &identity, Some(id), e))?;
    Ok(Json(scope::require_task_view(&identity, task)?))
}

/// [Admin Route] POST /tasks
///
/// Validates both foreign references (project, assignee) before writing and
/// reports every missing id at once. The mandatory creation history entry is
/// inserted in the same transaction as the task row.
pub async fn create_task(
    identity: Identity,
    State(state): State<AppState>,
    Json(payload): Json<CreateTaskRequest>,
) -> Result<Json<Task>, ApiError> {
    ADMIN_ONLY.authorize(&identity)?;

    let existing = state
        .repo
        .existing_users(&[payload.assignee_id])
        .await
        .map_err(|e| storage_err("create_task", &identity, None, e))?;
    let mut missing = missing_ids(&[payload.assignee_id], &existing);

    let project = state
        .repo
        .get_project(payload.project_id)
        .await
        .map_err(|e| storage_err("create_task", &identity, None, e))?;
    if project.is_none() {
        missing.push(payload.project_id);
    }
    scope::ensure_references(missing)?;

    // Defaults resolve through the creation entry so the initial history row
    // and the stored task can never disagree.
    let entry = audit::creation_entry(TaskSnapshot {
        status: payload.status.unwrap_or(TaskStatus::Todo),
        priority: payload.priority.unwrap_or(TaskPriority::Medium),
    });

    let task = state
        .repo
        .create_task(&payload, identity.id, &entry)
        .await
        .map_err(|e| storage_err("create_task", &identity, None, e))?;

    tracing::info!(task = %task.id, user = %identity.id, "task created");
    Ok(Json(task))
}

/// [Authenticated Route] PUT /tasks/{id}
///
/// ADMIN or the current assignee may update. A status/priority change appends
/// exactly one history entry, atomically with the row update; an update that
/// changes neither appends nothing.
pub async fn update_task(
    identity: Identity,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateTaskRequest>,
) -> Result<Json<Task>, ApiError> {
    let before = state
        .repo
        .get_task(id)
        .await
        .map_err(|e| storage_err("update_task", &identity, Some(id), e))?;
    let before = scope::require_task_edit(&identity, before)?;

    let mut missing = Vec::new();
    if let Some(assignee_id) = payload.assignee_id {
        let existing = state
            .repo
            .existing_users(&[assignee_id])
            .await
            .map_err(|e| storage_err("update_task", &identity, Some(id), e))?;
        missing.extend(missing_ids(&[assignee_id], &existing));
    }
    if let Some(project_id) = payload.project_id {
        let project = state
            .repo
            .get_project(project_id)
            .await
            .map_err(|e| storage_err("update_task", &identity, Some(id), e))?;
        if project.is_none() {
            missing.push(project_id);
        }
    }
    scope::ensure_references(missing)?;

    let after = TaskSnapshot {
        status: payload.status.unwrap_or(before.status),
        priority: payload.priority.unwrap_or(before.priority),
    };
    let delta = audit::change_delta(TaskSnapshot::from(&before), after);

    state
        .repo
        .update_task(id, &payload, identity.id, delta.as_ref())
        .await
        .map_err(|e| storage_err("update_task", &identity, Some(id), e))?
        .map(Json)
        .ok_or(ApiError::NotFound)
}

/// [Admin Route] DELETE /tasks/{id}
pub async fn delete_task(
    identity: Identity,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    ADMIN_ONLY.authorize(&identity)?;

    let deleted = state
        .repo
        .delete_task(id)
        .await
        .map_err(|e| storage_err("delete_task", &identity, Some(id), e))?;
    if deleted {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound)
    }
}

/// [Authenticated Route] GET /tasks/{id}/history
///
/// Most-recent-first. Readable by whoever can read the task itself.
pub async fn get_task_history(
    identity: Identity,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<TaskHistoryEntry>>, ApiError> {
    let task = state
        .repo
        .get_task(id)
        .await
        .map_err(|e| storage_err("get_task_history", &identity, Some(id), e))?;
    scope::require_task_view(&identity, task)?;

    let history = state
        .repo
        .task_history(id)
        .await
        .map_err(|e| storage_err("get_task_history", &identity, Some(id), e))?;
    Ok(Json(history))
}

// --- Dashboard ---

/// [Authenticated Route] GET /dashboard/stats
///
/// Computed entirely over the caller's scope-filtered projects and tasks, so
/// ADMIN sees system-wide numbers and a USER sees only their own slice.
pub async fn dashboard_stats(
    identity: Identity,
    State(state): State<AppState>,
) -> Result<Json<DashboardStats>, ApiError> {
    let projects = state
        .repo
        .list_projects(&scope::project_scope(&identity))
        .await
        .map_err(|e| storage_err("dashboard_stats", &identity, None, e))?;
    let tasks = state
        .repo
        .list_tasks(&scope::task_scope(&identity), &TaskListFilter::default())
        .await
        .map_err(|e| storage_err("dashboard_stats", &identity, None, e))?;

    Ok(Json(reports::dashboard_stats(&projects, &tasks, Utc::now())))
}

// --- Admin ---

/// [Admin Route] GET /admin/users
pub async fn list_users(
    identity: Identity,
    State(state): State<AppState>,
) -> Result<Json<Vec<UserProfile>>, ApiError> {
    ADMIN_ONLY.authorize(&identity)?;

    let users = state
        .repo
        .list_users()
        .await
        .map_err(|e| storage_err("list_users", &identity, None, e))?;
    Ok(Json(users.iter().map(UserProfile::from).collect()))
}

use crate::{
    audit::HistoryDelta,
    models::{
        CreateProjectRequest, CreateTaskRequest, Project, Role, Task, TaskHistoryEntry,
        TaskListFilter, UpdateProjectRequest, UpdateTaskRequest, User,
    },
    scope::{ProjectScope, TaskScope},
};
use async_trait::async_trait;
use sqlx::{PgPool, query_builder::QueryBuilder};
use std::sync::Arc;
use uuid::Uuid;

pub type StoreResult<T> = Result<T, sqlx::Error>;

/// Repository Trait
///
/// The abstract contract for all persistence operations. The access-control
/// core only ever sees this trait: the store is a black box returning
/// existence + attributes, which is what lets handler tests swap in mocks.
///
/// Scope filters arrive pre-computed by the scoping policy; the repository's
/// only job is to translate them faithfully. Task writes that owe the audit
/// trail an entry receive the pre-computed [`HistoryDelta`] and must persist
/// both rows in a single transaction.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Users ---
    async fn create_user(&self, email: &str, role: Role, password_hash: &str)
    -> StoreResult<User>;
    async fn get_user(&self, id: Uuid) -> StoreResult<Option<User>>;
    async fn get_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;
    async fn list_users(&self) -> StoreResult<Vec<User>>;
    /// Returns the subset of `ids` that actually exist; callers diff against
    /// the request to report every dangling reference at once.
    async fn existing_users(&self, ids: &[Uuid]) -> StoreResult<Vec<Uuid>>;

    // --- Projects ---
    async fn list_projects(&self, scope: &ProjectScope) -> StoreResult<Vec<Project>>;
    async fn get_project(&self, id: Uuid) -> StoreResult<Option<Project>>;
    async fn create_project(
        &self,
        req: &CreateProjectRequest,
        created_by: Uuid,
    ) -> StoreResult<Project>;
    async fn update_project(
        &self,
        id: Uuid,
        req: &UpdateProjectRequest,
    ) -> StoreResult<Option<Project>>;
    async fn delete_project(&self, id: Uuid) -> StoreResult<bool>;
    async fn assign_project_user(
        &self,
        project_id: Uuid,
        user_id: Uuid,
    ) -> StoreResult<Option<Project>>;
    async fn remove_project_user(
        &self,
        project_id: Uuid,
        user_id: Uuid,
    ) -> StoreResult<Option<Project>>;

    // --- Tasks ---
    async fn list_tasks(&self, scope: &TaskScope, filter: &TaskListFilter)
    -> StoreResult<Vec<Task>>;
    async fn get_task(&self, id: Uuid) -> StoreResult<Option<Task>>;
    /// Inserts the task and its mandatory creation history entry atomically.
    async fn create_task(
        &self,
        req: &CreateTaskRequest,
        actor: Uuid,
        entry: &HistoryDelta,
    ) -> StoreResult<Task>;
    /// Applies the partial update and, when `entry` is present, appends the
    /// history row in the same transaction. Returns None when the task is absent.
    async fn update_task(
        &self,
        id: Uuid,
        req: &UpdateTaskRequest,
        actor: Uuid,
        entry: Option<&HistoryDelta>,
    ) -> StoreResult<Option<Task>>;
    async fn delete_task(&self, id: Uuid) -> StoreResult<bool>;
    /// History for one task, most-recent-first. Append-only: there is no
    /// update or delete counterpart anywhere in this trait.
    async fn task_history(&self, task_id: Uuid) -> StoreResult<Vec<TaskHistoryEntry>>;
}

/// The concrete type used to share the persistence layer across the application state.
pub type RepositoryState = Arc<dyn Repository>;

const USER_COLS: &str = "id, email, role, password_hash, created_at";
const PROJECT_COLS: &str = "id, name, description, created_by, assigned_user_ids, \
                            created_at, updated_at";
const TASK_COLS: &str = "id, title, description, status, priority, project_id, \
                         assignee_id, due_date, created_at, updated_at";
const HISTORY_COLS: &str = "id, task_id, updated_by, old_status, new_status, \
                            old_priority, new_priority, created_at";

/// PostgresRepository
///
/// Production implementation of the `Repository` trait, backed by Postgres.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    async fn create_user(
        &self,
        email: &str,
        role: Role,
        password_hash: &str,
    ) -> StoreResult<User> {
        let sql = format!(
            "INSERT INTO users (id, email, role, password_hash, created_at) \
             VALUES ($1, $2, $3, $4, NOW()) RETURNING {USER_COLS}"
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(Uuid::new_v4())
            .bind(email)
            .bind(role)
            .bind(password_hash)
            .fetch_one(&self.pool)
            .await
    }

    async fn get_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        let sql = format!("SELECT {USER_COLS} FROM users WHERE id = $1");
        sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn get_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let sql = format!("SELECT {USER_COLS} FROM users WHERE email = $1");
        sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await
    }

    async fn list_users(&self) -> StoreResult<Vec<User>> {
        let sql = format!("SELECT {USER_COLS} FROM users ORDER BY created_at ASC");
        sqlx::query_as::<_, User>(&sql).fetch_all(&self.pool).await
    }

    async fn existing_users(&self, ids: &[Uuid]) -> StoreResult<Vec<Uuid>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }
        sqlx::query_scalar::<_, Uuid>("SELECT id FROM users WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(&self.pool)
            .await
    }

    /// The scope filter computed by the policy layer becomes the WHERE clause,
    /// so a list call can never return a record `can_view_project` would deny.
    async fn list_projects(&self, scope: &ProjectScope) -> StoreResult<Vec<Project>> {
        match scope {
            ProjectScope::All => {
                let sql =
                    format!("SELECT {PROJECT_COLS} FROM projects ORDER BY created_at DESC");
                sqlx::query_as::<_, Project>(&sql).fetch_all(&self.pool).await
            }
            ProjectScope::MemberOf(user_id) => {
                let sql = format!(
                    "SELECT {PROJECT_COLS} FROM projects \
                     WHERE created_by = $1 OR $1 = ANY(assigned_user_ids) \
                     ORDER BY created_at DESC"
                );
                sqlx::query_as::<_, Project>(&sql)
                    .bind(user_id)
                    .fetch_all(&self.pool)
                    .await
            }
        }
    }

    async fn get_project(&self, id: Uuid) -> StoreResult<Option<Project>> {
        let sql = format!("SELECT {PROJECT_COLS} FROM projects WHERE id = $1");
        sqlx::query_as::<_, Project>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn create_project(
        &self,
        req: &CreateProjectRequest,
        created_by: Uuid,
    ) -> StoreResult<Project> {
        let sql = format!(
            "INSERT INTO projects \
             (id, name, description, created_by, assigned_user_ids, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, NOW(), NOW()) RETURNING {PROJECT_COLS}"
        );
        sqlx::query_as::<_, Project>(&sql)
            .bind(Uuid::new_v4())
            .bind(&req.name)
            .bind(&req.description)
            .bind(created_by)
            .bind(&req.assigned_user_ids)
            .fetch_one(&self.pool)
            .await
    }

    /// COALESCE keeps unset Option fields untouched, matching the partial
    /// update payload shape.
    async fn update_project(
        &self,
        id: Uuid,
        req: &UpdateProjectRequest,
    ) -> StoreResult<Option<Project>> {
        let sql = format!(
            "UPDATE projects SET \
                 name = COALESCE($2, name), \
                 description = COALESCE($3, description), \
                 updated_at = NOW() \
             WHERE id = $1 RETURNING {PROJECT_COLS}"
        );
        sqlx::query_as::<_, Project>(&sql)
            .bind(id)
            .bind(&req.name)
            .bind(&req.description)
            .fetch_optional(&self.pool)
            .await
    }

    async fn delete_project(&self, id: Uuid) -> StoreResult<bool> {
        let res = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    async fn assign_project_user(
        &self,
        project_id: Uuid,
        user_id: Uuid,
    ) -> StoreResult<Option<Project>> {
        // Idempotent: assigning an already-assigned user leaves the row as-is.
        let sql = format!(
            "UPDATE projects SET \
                 assigned_user_ids = CASE \
                     WHEN $2 = ANY(assigned_user_ids) THEN assigned_user_ids \
                     ELSE array_append(assigned_user_ids, $2) END, \
                 updated_at = NOW() \
             WHERE id = $1 RETURNING {PROJECT_COLS}"
        );
        sqlx::query_as::<_, Project>(&sql)
            .bind(project_id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn remove_project_user(
        &self,
        project_id: Uuid,
        user_id: Uuid,
    ) -> StoreResult<Option<Project>> {
        let sql = format!(
            "UPDATE projects SET \
                 assigned_user_ids = array_remove(assigned_user_ids, $2), \
                 updated_at = NOW() \
             WHERE id = $1 RETURNING {PROJECT_COLS}"
        );
        sqlx::query_as::<_, Project>(&sql)
            .bind(project_id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn list_tasks(
        &self,
        scope: &TaskScope,
        filter: &TaskListFilter,
    ) -> StoreResult<Vec<Task>> {
        let mut builder: QueryBuilder<sqlx::Postgres> =
            QueryBuilder::new(format!("SELECT {TASK_COLS} FROM tasks WHERE TRUE"));

        if let TaskScope::AssignedTo(user_id) = scope {
            builder.push(" AND assignee_id = ");
            builder.push_bind(*user_id);
        }
        if let Some(project_id) = filter.project_id {
            builder.push(" AND project_id = ");
            builder.push_bind(project_id);
        }
        if let Some(status) = filter.status {
            builder.push(" AND status = ");
            builder.push_bind(status);
        }

        builder.push(" ORDER BY created_at DESC");
        builder
            .build_query_as::<Task>()
            .fetch_all(&self.pool)
            .await
    }

    async fn get_task(&self, id: Uuid) -> StoreResult<Option<Task>> {
        let sql = format!("SELECT {TASK_COLS} FROM tasks WHERE id = $1");
        sqlx::query_as::<_, Task>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn create_task(
        &self,
        req: &CreateTaskRequest,
        actor: Uuid,
        entry: &HistoryDelta,
    ) -> StoreResult<Task> {
        let mut tx = self.pool.begin().await?;

        let sql = format!(
            "INSERT INTO tasks \
             (id, title, description, status, priority, project_id, assignee_id, \
              due_date, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, NOW(), NOW()) RETURNING {TASK_COLS}"
        );
        let task = sqlx::query_as::<_, Task>(&sql)
            .bind(Uuid::new_v4())
            .bind(&req.title)
            .bind(&req.description)
            .bind(entry.new_status)
            .bind(entry.new_priority)
            .bind(req.project_id)
            .bind(req.assignee_id)
            .bind(req.due_date)
            .fetch_one(&mut *tx)
            .await?;

        append_history(&mut tx, task.id, actor, entry).await?;
        tx.commit().await?;
        Ok(task)
    }

    async fn update_task(
        &self,
        id: Uuid,
        req: &UpdateTaskRequest,
        actor: Uuid,
        entry: Option<&HistoryDelta>,
    ) -> StoreResult<Option<Task>> {
        let mut tx = self.pool.begin().await?;

        let sql = format!(
            "UPDATE tasks SET \
                 title = COALESCE($2, title), \
                 description = COALESCE($3, description), \
                 status = COALESCE($4, status), \
                 priority = COALESCE($5, priority), \
                 project_id = COALESCE($6, project_id), \
                 assignee_id = COALESCE($7, assignee_id), \
                 due_date = COALESCE($8, due_date), \
                 updated_at = NOW() \
             WHERE id = $1 RETURNING {TASK_COLS}"
        );
        let task = sqlx::query_as::<_, Task>(&sql)
            .bind(id)
            .bind(&req.title)
            .bind(&req.description)
            .bind(req.status)
            .bind(req.priority)
            .bind(req.project_id)
            .bind(req.assignee_id)
            .bind(req.due_date)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(task) = task else {
            return Ok(None);
        };

        // The update and its audit entry commit or roll back together.
        if let Some(entry) = entry {
            append_history(&mut tx, task.id, actor, entry).await?;
        }
        tx.commit().await?;
        Ok(Some(task))
    }

    async fn delete_task(&self, id: Uuid) -> StoreResult<bool> {
        // History rows go with the task via ON DELETE CASCADE.
        let res = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    async fn task_history(&self, task_id: Uuid) -> StoreResult<Vec<TaskHistoryEntry>> {
        let sql = format!(
            "SELECT {HISTORY_COLS} FROM task_history \
             WHERE task_id = $1 ORDER BY created_at DESC"
        );
        sqlx::query_as::<_, TaskHistoryEntry>(&sql)
            .bind(task_id)
            .fetch_all(&self.pool)
            .await
    }
}

async fn append_history(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    task_id: Uuid,
    actor: Uuid,
    entry: &HistoryDelta,
) -> StoreResult<()> {
    sqlx::query(
        "INSERT INTO task_history \
         (id, task_id, updated_by, old_status, new_status, old_priority, new_priority, created_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, NOW())",
    )
    .bind(Uuid::new_v4())
    .bind(task_id)
    .bind(actor)
    .bind(entry.old_status)
    .bind(entry.new_status)
    .bind(entry.old_priority)
    .bind(entry.new_priority)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

use chrono::Utc;
use taskboard::{
    auth::Identity,
    error::ApiError,
    models::{Project, Role, Task, TaskPriority, TaskStatus},
    scope,
};
use uuid::Uuid;

fn identity(id: Uuid, role: Role) -> Identity {
    Identity {
        id,
        email: format!("{id}@example.com"),
        role,
    }
}

fn project(created_by: Uuid, assigned: Vec<Uuid>) -> Project {
    let now = Utc::now();
    Project {
        id: Uuid::new_v4(),
        name: "proj".to_string(),
        description: String::new(),
        created_by,
        assigned_user_ids: assigned,
        created_at: now,
        updated_at: now,
    }
}

fn task(assignee_id: Uuid) -> Task {
    let now = Utc::now();
    Task {
        id: Uuid::new_v4(),
        title: "task".to_string(),
        description: String::new(),
        status: TaskStatus::Todo,
        priority: TaskPriority::Medium,
        project_id: Uuid::new_v4(),
        assignee_id,
        due_date: None,
        created_at: now,
        updated_at: now,
    }
}

#[test]
fn admin_scope_is_unrestricted_for_both_kinds() {
    let admin = identity(Uuid::from_u128(1), Role::Admin);
    let stranger = Uuid::from_u128(99);

    assert!(scope::project_scope(&admin).matches(&project(stranger, vec![])));
    assert!(scope::task_scope(&admin).matches(&task(stranger)));
}

#[test]
fn user_sees_projects_created_or_assigned() {
    let u1 = Uuid::from_u128(1);
    let u2 = Uuid::from_u128(2);
    let user = identity(u1, Role::User);

    assert!(scope::can_view_project(&user, &project(u1, vec![])));
    assert!(scope::can_view_project(&user, &project(u2, vec![u1])));
    assert!(!scope::can_view_project(&user, &project(u2, vec![u2])));
}

#[test]
fn user_sees_only_assigned_tasks() {
    let u1 = Uuid::from_u128(1);
    let u2 = Uuid::from_u128(2);
    let user = identity(u1, Role::User);

    assert!(scope::can_view_task(&user, &task(u1)));
    assert!(!scope::can_view_task(&user, &task(u2)));
}

/// canAccess(i, r) must equal (r ∈ listPredicate(i)) for every identity and
/// record: a record reachable singly must appear in the list and vice versa.
#[test]
fn single_record_check_agrees_with_list_filter() {
    let u1 = Uuid::from_u128(1);
    let u2 = Uuid::from_u128(2);
    let identities = [
        identity(Uuid::from_u128(42), Role::Admin),
        identity(u1, Role::User),
        identity(u2, Role::User),
    ];
    let projects = [
        project(u1, vec![]),
        project(u2, vec![u1]),
        project(u2, vec![]),
    ];
    let tasks = [task(u1), task(u2)];

    for id in &identities {
        let p_scope = scope::project_scope(id);
        let listed: Vec<_> = projects.iter().filter(|p| p_scope.matches(p)).collect();
        for p in &projects {
            assert_eq!(scope::can_view_project(id, p), listed.iter().any(|l| l.id == p.id));
        }

        let t_scope = scope::task_scope(id);
        let listed: Vec<_> = tasks.iter().filter(|t| t_scope.matches(t)).collect();
        for t in &tasks {
            assert_eq!(scope::can_view_task(id, t), listed.iter().any(|l| l.id == t.id));
        }
    }
}

#[test]
fn absent_record_is_not_found_before_ownership() {
    let user = identity(Uuid::from_u128(1), Role::User);

    // Nonexistent: NotFound, never Forbidden, even though this caller would
    // also have been denied had the record existed.
    assert_eq!(
        scope::require_task_view(&user, None).unwrap_err(),
        ApiError::NotFound
    );

    // Exists but assigned to someone else: Forbidden.
    let foreign = task(Uuid::from_u128(2));
    assert_eq!(
        scope::require_task_view(&user, Some(foreign)).unwrap_err(),
        ApiError::Forbidden
    );
}

#[test]
fn project_membership_grants_visibility_not_mutation() {
    let u1 = Uuid::from_u128(1);
    let member = identity(u1, Role::User);
    let owned = project(u1, vec![u1]);

    // Even the creator, as a plain USER, can view but the mutation surface is
    // gated elsewhere as ADMIN-only; visibility here must still hold.
    assert!(scope::can_view_project(&member, &owned));
}

#[test]
fn task_edit_allows_admin_and_assignee_only() {
    let u1 = Uuid::from_u128(1);
    let u2 = Uuid::from_u128(2);
    let t = task(u1);

    assert!(scope::can_edit_task(&identity(Uuid::from_u128(9), Role::Admin), &t));
    assert!(scope::can_edit_task(&identity(u1, Role::User), &t));
    assert!(!scope::can_edit_task(&identity(u2, Role::User), &t));

    assert_eq!(
        scope::require_task_edit(&identity(u2, Role::User), Some(t)).unwrap_err(),
        ApiError::Forbidden
    );
}

#[test]
fn dangling_references_report_every_missing_id() {
    assert!(scope::ensure_references(vec![]).is_ok());

    let ghost_a = Uuid::from_u128(100);
    let ghost_b = Uuid::from_u128(101);
    let err = scope::ensure_references(vec![ghost_a, ghost_b]).unwrap_err();
    assert_eq!(err, ApiError::DanglingReference(vec![ghost_a, ghost_b]));
}

/// Authorization helpers
///
/// The store does not enforce who may mutate what. Callers run these checks
/// against the acting user before invoking a mutating store operation.
///
/// # Permission Model
///
/// 1. **Project access**: the owner and every member may read the project and
///    create or update its tasks
/// 2. **Project ownership**: only the owner may update or delete the project
/// 3. **Task deletion**: the project owner or the task's creator
///
/// Comment and attachment edits are restricted to their author by the store
/// itself and are not covered here.

use uuid::Uuid;

use crate::error::{StoreError, StoreResult};
use crate::models::{Project, Task};

/// Requires `user_id` to be the owner or a member of `project`
///
/// # Errors
///
/// Returns `StoreError::Forbidden` otherwise.
///
/// # Example
///
/// ```
/// # use taskflow_shared::auth::require_project_access;
/// # use taskflow_shared::models::{CreateProject, CreateUser};
/// # use taskflow_shared::Database;
/// # use uuid::Uuid;
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let mut db = Database::new();
/// let owner = db.create_user(CreateUser {
///     email: "owner@example.com".into(),
///     username: "owner".into(),
///     first_name: "Olive".into(),
///     last_name: "Owner".into(),
///     avatar: None,
///     role: Default::default(),
///     preferences: Default::default(),
/// })?;
/// let project = db.create_project(CreateProject {
///     name: "Roadmap".into(),
///     description: String::new(),
///     owner_id: owner.id,
///     member_ids: vec![],
///     status: Default::default(),
///     priority: Default::default(),
///     start_date: None,
///     end_date: None,
///     settings: Default::default(),
/// })?;
///
/// assert!(require_project_access(&project, owner.id).is_ok());
/// assert!(require_project_access(&project, Uuid::new_v4()).is_err());
/// # Ok(())
/// # }
/// ```
pub fn require_project_access(project: &Project, user_id: Uuid) -> StoreResult<()> {
    if project.has_access(user_id) {
        Ok(())
    } else {
        Err(StoreError::Forbidden(format!(
            "user {} has no access to project {}",
            user_id, project.id
        )))
    }
}

/// Requires `user_id` to own `project`
///
/// # Errors
///
/// Returns `StoreError::Forbidden` otherwise.
pub fn require_project_owner(project: &Project, user_id: Uuid) -> StoreResult<()> {
    if project.is_owner(user_id) {
        Ok(())
    } else {
        Err(StoreError::Forbidden(format!(
            "only the owner can modify project {}",
            project.id
        )))
    }
}

/// Requires `user_id` to be allowed to delete `task`
///
/// The project owner and the task's creator may delete it.
pub fn require_task_delete_permission(project: &Project, task: &Task, user_id: Uuid) -> StoreResult<()> {
    if project.is_owner(user_id) || task.creator_id == user_id {
        Ok(())
    } else {
        Err(StoreError::Forbidden(format!(
            "user {} cannot delete task {}",
            user_id, task.id
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Priority, ProjectSettings, ProjectStatus, TaskStatus};
    use chrono::Utc;

    fn project(owner_id: Uuid, member_ids: Vec<Uuid>) -> Project {
        let now = Utc::now();
        Project {
            id: Uuid::new_v4(),
            name: "p".to_string(),
            description: String::new(),
            owner_id,
            member_ids,
            status: ProjectStatus::Active,
            priority: Priority::Medium,
            start_date: now,
            end_date: None,
            created_at: now,
            updated_at: now,
            settings: ProjectSettings::default(),
        }
    }

    fn task(project_id: Uuid, creator_id: Uuid) -> Task {
        let now = Utc::now();
        Task {
            id: Uuid::new_v4(),
            title: "t".to_string(),
            description: String::new(),
            project_id,
            assignee_id: None,
            creator_id,
            status: TaskStatus::Todo,
            priority: Priority::Medium,
            tags: vec![],
            depends_on: vec![],
            blocked_by: vec![],
            estimated_hours: None,
            actual_hours: None,
            due_date: None,
            completed_at: None,
            created_at: now,
            updated_at: now,
            position: 1,
            comments: vec![],
            attachments: vec![],
        }
    }

    #[test]
    fn test_require_project_access() {
        let owner = Uuid::new_v4();
        let member = Uuid::new_v4();
        let p = project(owner, vec![member]);

        assert!(require_project_access(&p, owner).is_ok());
        assert!(require_project_access(&p, member).is_ok());
        assert!(matches!(
            require_project_access(&p, Uuid::new_v4()),
            Err(StoreError::Forbidden(_))
        ));
    }

    #[test]
    fn test_require_project_owner() {
        let owner = Uuid::new_v4();
        let member = Uuid::new_v4();
        let p = project(owner, vec![member]);

        assert!(require_project_owner(&p, owner).is_ok());
        assert!(require_project_owner(&p, member).is_err());
    }

    #[test]
    fn test_require_task_delete_permission() {
        let owner = Uuid::new_v4();
        let creator = Uuid::new_v4();
        let other = Uuid::new_v4();
        let p = project(owner, vec![creator, other]);
        let t = task(p.id, creator);

        assert!(require_task_delete_permission(&p, &t, owner).is_ok());
        assert!(require_task_delete_permission(&p, &t, creator).is_ok());
        assert!(require_task_delete_permission(&p, &t, other).is_err());
    }
}

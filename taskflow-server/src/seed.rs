/// Demo data for development
///
/// Three users (an admin, a manager and a developer), one project owned by
/// the manager, and four tasks wired into a small dependency chain:
///
/// ```text
/// Setup Backend Architecture ← Implement REST APIs ← Implement Frontend Components
/// Design User Interface
/// ```

use taskflow_shared::models::{
    CreateProject, CreateTask, CreateUser, Priority, ProjectSettings, ProjectStatus, TaskStatus, Theme,
    UserPreferences, UserRole,
};
use taskflow_shared::{Database, StoreResult};
use uuid::Uuid;

/// What [`seed_demo_data`] created
#[derive(Debug, Clone)]
pub struct SeedSummary {
    pub user_ids: Vec<Uuid>,
    pub project_id: Uuid,
    pub task_ids: Vec<Uuid>,
}

fn user(email: &str, username: &str, first_name: &str, last_name: &str, role: UserRole, theme: Theme) -> CreateUser {
    CreateUser {
        email: email.to_string(),
        username: username.to_string(),
        first_name: first_name.to_string(),
        last_name: last_name.to_string(),
        avatar: None,
        role,
        preferences: UserPreferences {
            theme,
            ..Default::default()
        },
    }
}

struct DemoTask {
    title: &'static str,
    description: &'static str,
    assignee_id: Option<Uuid>,
    status: TaskStatus,
    priority: Priority,
    tags: &'static [&'static str],
    depends_on: Vec<Uuid>,
    estimated_hours: f64,
    actual_hours: Option<f64>,
    position: i64,
}

/// Populates an empty store with the demo workspace
///
/// # Errors
///
/// Fails with `DuplicateKey` if the demo users already exist.
pub fn seed_demo_data(db: &mut Database) -> StoreResult<SeedSummary> {
    let admin = db.create_user(user("admin@taskflow.com", "admin", "Admin", "User", UserRole::Admin, Theme::Dark))?;
    let manager = db.create_user(user(
        "manager@taskflow.com",
        "manager",
        "Project",
        "Manager",
        UserRole::Manager,
        Theme::Light,
    ))?;
    let developer = db.create_user(user(
        "dev@taskflow.com",
        "developer",
        "John",
        "Developer",
        UserRole::Member,
        Theme::Dark,
    ))?;

    let project = db.create_project(CreateProject {
        name: "TaskFlow Development".to_string(),
        description: "Building the next-generation task management system".to_string(),
        owner_id: manager.id,
        member_ids: vec![admin.id, developer.id],
        status: ProjectStatus::Active,
        priority: Priority::High,
        start_date: None,
        end_date: None,
        settings: ProjectSettings::default(),
    })?;

    let mut create = |task: DemoTask| -> StoreResult<Uuid> {
        let created = db.create_task(CreateTask {
            title: task.title.to_string(),
            description: task.description.to_string(),
            project_id: project.id,
            assignee_id: task.assignee_id,
            creator_id: manager.id,
            status: task.status,
            priority: task.priority,
            tags: task.tags.iter().map(|t| t.to_string()).collect(),
            depends_on: task.depends_on,
            blocked_by: Vec::new(),
            estimated_hours: Some(task.estimated_hours),
            actual_hours: task.actual_hours,
            due_date: None,
            position: Some(task.position),
        })?;
        Ok(created.id)
    };

    let backend = create(DemoTask {
        title: "Setup Backend Architecture",
        description: "Design and implement the core backend infrastructure",
        assignee_id: Some(developer.id),
        status: TaskStatus::Completed,
        priority: Priority::High,
        tags: &["backend", "architecture"],
        depends_on: vec![],
        estimated_hours: 16.0,
        actual_hours: Some(14.0),
        position: 1,
    })?;
    let api = create(DemoTask {
        title: "Implement REST APIs",
        description: "Create all necessary API endpoints for the application",
        assignee_id: Some(developer.id),
        status: TaskStatus::InProgress,
        priority: Priority::High,
        tags: &["backend", "api"],
        depends_on: vec![backend],
        estimated_hours: 24.0,
        actual_hours: None,
        position: 2,
    })?;
    let design = create(DemoTask {
        title: "Design User Interface",
        description: "Create mockups and designs for the user interface",
        assignee_id: Some(admin.id),
        status: TaskStatus::Review,
        priority: Priority::Medium,
        tags: &["frontend", "design"],
        depends_on: vec![],
        estimated_hours: 12.0,
        actual_hours: None,
        position: 3,
    })?;
    let frontend = create(DemoTask {
        title: "Implement Frontend Components",
        description: "Build React components based on the designs",
        assignee_id: None,
        status: TaskStatus::Todo,
        priority: Priority::Medium,
        tags: &["frontend", "react"],
        depends_on: vec![api],
        estimated_hours: 32.0,
        actual_hours: None,
        position: 4,
    })?;

    tracing::info!(project_id = %project.id, "Demo data seeded");
    Ok(SeedSummary {
        user_ids: vec![admin.id, manager.id, developer.id],
        project_id: project.id,
        task_ids: vec![backend, api, design, frontend],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskflow_shared::models::TaskFilter;
    use taskflow_shared::StoreError;

    #[test]
    fn test_seed_builds_demo_workspace() {
        let mut db = Database::new();
        let summary = seed_demo_data(&mut db).unwrap();

        assert_eq!(db.list_users().len(), 3);
        let manager = db.get_user_by_username("manager").unwrap();
        let project = db.get_project(summary.project_id).unwrap();
        assert_eq!(project.owner_id, manager.id);
        assert_eq!(project.member_ids.len(), 2);

        let tasks = db.get_tasks_by_project(summary.project_id, &TaskFilter::default());
        let titles: Vec<&str> = tasks.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(
            titles,
            vec![
                "Setup Backend Architecture",
                "Implement REST APIs",
                "Design User Interface",
                "Implement Frontend Components"
            ]
        );
        assert!(tasks[0].completed_at.is_some());
        assert_eq!(tasks[1].depends_on, vec![tasks[0].id]);
        assert_eq!(tasks[3].depends_on, vec![tasks[1].id]);
        assert!(db.verify_integrity().is_empty());
    }

    #[test]
    fn test_seed_twice_is_rejected() {
        let mut db = Database::new();
        seed_demo_data(&mut db).unwrap();
        assert!(matches!(seed_demo_data(&mut db), Err(StoreError::DuplicateKey { .. })));
    }
}

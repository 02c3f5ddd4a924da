#![allow(dead_code)]

/// Common fixtures for store integration tests
///
/// - A fresh `Database` per test
/// - Users created from a username alone
/// - A project with an owner and one member
/// - Task creation with optional dependencies

use taskflow_shared::models::{CreateProject, CreateTask, CreateUser, Task, User};
use taskflow_shared::{Database, StoreResult};
use uuid::Uuid;

/// Test context with a populated project
pub struct TestContext {
    pub db: Database,
    pub owner: User,
    pub member: User,
    pub project_id: Uuid,
}

impl TestContext {
    /// Creates a store holding `owner`, `member` and one project they share
    pub fn new() -> anyhow::Result<Self> {
        let mut db = Database::new();
        let owner = create_user(&mut db, "owner")?;
        let member = create_user(&mut db, "member")?;
        let project_id = create_project(&mut db, owner.id, vec![member.id])?;

        Ok(TestContext {
            db,
            owner,
            member,
            project_id,
        })
    }

    /// Creates a task in the context project, created by the owner
    pub fn task(&mut self, title: &str, depends_on: Vec<Uuid>) -> StoreResult<Task> {
        let input = task_input(self.project_id, self.owner.id, title, depends_on);
        self.db.create_task(input)
    }
}

/// Registers a user whose email, username and first name derive from `username`
pub fn create_user(db: &mut Database, username: &str) -> StoreResult<User> {
    db.create_user(CreateUser {
        email: format!("{}@taskflow.test", username),
        username: username.to_string(),
        first_name: capitalize(username),
        last_name: "Tester".to_string(),
        avatar: None,
        role: Default::default(),
        preferences: Default::default(),
    })
}

pub fn create_project(db: &mut Database, owner_id: Uuid, member_ids: Vec<Uuid>) -> StoreResult<Uuid> {
    let project = db.create_project(CreateProject {
        name: format!("Project {}", Uuid::new_v4().simple()),
        description: "Integration test project".to_string(),
        owner_id,
        member_ids,
        status: Default::default(),
        priority: Default::default(),
        start_date: None,
        end_date: None,
        settings: Default::default(),
    })?;
    Ok(project.id)
}

/// Minimal task input with every optional field unset
pub fn task_input(project_id: Uuid, creator_id: Uuid, title: &str, depends_on: Vec<Uuid>) -> CreateTask {
    CreateTask {
        title: title.to_string(),
        description: String::new(),
        project_id,
        assignee_id: None,
        creator_id,
        status: Default::default(),
        priority: Default::default(),
        tags: Vec::new(),
        depends_on,
        blocked_by: Vec::new(),
        estimated_hours: None,
        actual_hours: None,
        due_date: None,
        position: None,
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

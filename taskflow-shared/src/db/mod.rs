/// In-memory entity store for TaskFlow
///
/// [`Database`] is the sole authority over users, projects, tasks (with their
/// comments and attachments), activity entries and notifications. Every
/// mutation updates the entity, its secondary indexes and any derived
/// activity or notification records in one step, then publishes a live event
/// through the attached [`EventBroadcaster`].
///
/// # Modules
///
/// - `indexes`: Secondary lookup structures kept in step with every mutation
/// - `users`, `projects`, `tasks`, `comments`: Entity operations
/// - `activity`: Audit trail recorder and project feed
/// - `notifications`: Recipient-addressed notifications
///
/// # Consistency
///
/// All operations validate their input completely before touching any state.
/// A failed call leaves the store exactly as it was.
///
/// Mutating operations take `&mut self`; there is no interior locking. A
/// process sharing one store across tasks wraps it in [`SharedDatabase`].
/// Broadcaster callbacks run while the store is still borrowed, so they must
/// not try to lock the store again. Live transports should consume a
/// [`crate::events::SubscriptionStream`] instead.
///
/// # Example
///
/// ```
/// use taskflow_shared::models::{CreateProject, CreateTask, CreateUser, TaskFilter};
/// use taskflow_shared::Database;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let mut db = Database::new();
///
/// let owner = db.create_user(CreateUser {
///     email: "lead@example.com".into(),
///     username: "lead".into(),
///     first_name: "Lee".into(),
///     last_name: "Lead".into(),
///     avatar: None,
///     role: Default::default(),
///     preferences: Default::default(),
/// })?;
///
/// let project = db.create_project(CreateProject {
///     name: "Launch".into(),
///     description: "Ship it".into(),
///     owner_id: owner.id,
///     member_ids: vec![],
///     status: Default::default(),
///     priority: Default::default(),
///     start_date: None,
///     end_date: None,
///     settings: Default::default(),
/// })?;
///
/// let task = db.create_task(CreateTask {
///     title: "Write release notes".into(),
///     description: String::new(),
///     project_id: project.id,
///     assignee_id: None,
///     creator_id: owner.id,
///     status: Default::default(),
///     priority: Default::default(),
///     tags: vec!["docs".into()],
///     depends_on: vec![],
///     blocked_by: vec![],
///     estimated_hours: None,
///     actual_hours: None,
///     due_date: None,
///     position: None,
/// })?;
///
/// assert_eq!(task.position, 1);
/// assert_eq!(db.get_tasks_by_project(project.id, &TaskFilter::default()).len(), 1);
/// # Ok(())
/// # }
/// ```

mod activity;
mod comments;
pub(crate) mod indexes;
mod notifications;
mod projects;
mod tasks;
mod users;

use std::collections::HashMap;
use std::sync::Arc;

use uuid::Uuid;

use crate::config::StoreConfig;
use crate::events::EventBroadcaster;
use crate::models::{Activity, Notification, Project, Task, User};
use indexes::Indexes;

/// Store shared between concurrent request handlers
///
/// A single coarse lock keeps every entity/index pair consistent.
pub type SharedDatabase = Arc<tokio::sync::RwLock<Database>>;

/// In-memory entity store
#[derive(Debug)]
pub struct Database {
    config: StoreConfig,
    users: HashMap<Uuid, User>,
    projects: HashMap<Uuid, Project>,
    tasks: HashMap<Uuid, Task>,
    activities: HashMap<Uuid, Activity>,
    notifications: HashMap<Uuid, Notification>,
    indexes: Indexes,
    broadcaster: Arc<EventBroadcaster>,
}

impl Default for Database {
    fn default() -> Self {
        Self::new()
    }
}

impl Database {
    /// Empty store with default configuration and its own broadcaster
    pub fn new() -> Self {
        Self::with_config(StoreConfig::default())
    }

    pub fn with_config(config: StoreConfig) -> Self {
        Self::with_broadcaster(config, Arc::new(EventBroadcaster::new()))
    }

    /// Empty store publishing through an existing broadcaster
    pub fn with_broadcaster(config: StoreConfig, broadcaster: Arc<EventBroadcaster>) -> Self {
        Database {
            config,
            users: HashMap::new(),
            projects: HashMap::new(),
            tasks: HashMap::new(),
            activities: HashMap::new(),
            notifications: HashMap::new(),
            indexes: Indexes::default(),
            broadcaster,
        }
    }

    /// Wraps the store for sharing across tasks
    pub fn into_shared(self) -> SharedDatabase {
        Arc::new(tokio::sync::RwLock::new(self))
    }

    pub fn broadcaster(&self) -> &Arc<EventBroadcaster> {
        &self.broadcaster
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Checks that every index agrees with the entity maps
    ///
    /// Returns a description of each violation found; empty when consistent.
    pub fn verify_integrity(&self) -> Vec<String> {
        self.indexes.verify(self)
    }

    /// First name of a user for notification text
    fn display_name(&self, user_id: Uuid) -> String {
        self.users
            .get(&user_id)
            .map(|user| user.first_name.clone())
            .unwrap_or_else(|| "Someone".to_string())
    }
}

/// Trims `value` in place
fn trim_in_place(value: &mut String) {
    let trimmed = value.trim();
    if trimmed.len() != value.len() {
        *value = trimmed.to_string();
    }
}

/// Drops repeated ids, keeping the first occurrence
fn dedup_ids(ids: &mut Vec<Uuid>) {
    let mut seen = std::collections::HashSet::with_capacity(ids.len());
    ids.retain(|id| seen.insert(*id));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_store_is_empty_and_consistent() {
        let db = Database::new();
        assert!(db.list_users().is_empty());
        assert!(db.verify_integrity().is_empty());
        assert_eq!(db.config().default_activity_limit, 50);
    }

    #[test]
    fn test_trim_in_place() {
        let mut s = "  padded \n".to_string();
        trim_in_place(&mut s);
        assert_eq!(s, "padded");
    }

    #[test]
    fn test_dedup_ids_keeps_first_occurrence() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let mut ids = vec![a, b, a, b, a];
        dedup_ids(&mut ids);
        assert_eq!(ids, vec![a, b]);
    }

    #[test]
    fn test_shared_broadcaster() {
        let broadcaster = Arc::new(EventBroadcaster::new());
        let db = Database::with_broadcaster(StoreConfig::default(), broadcaster.clone());
        assert!(Arc::ptr_eq(db.broadcaster(), &broadcaster));
    }
}

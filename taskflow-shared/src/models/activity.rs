/// Activity model
///
/// Activities form an append-only audit log. They are never mutated; they are
/// only removed when the project whose feed they belong to is deleted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use uuid::Uuid;

/// Kind of recorded activity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityType {
    TaskCreated,
    TaskUpdated,
    TaskCompleted,
    CommentAdded,
    UserAssigned,
    ProjectCreated,
}

impl ActivityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityType::TaskCreated => "task_created",
            ActivityType::TaskUpdated => "task_updated",
            ActivityType::TaskCompleted => "task_completed",
            ActivityType::CommentAdded => "comment_added",
            ActivityType::UserAssigned => "user_assigned",
            ActivityType::ProjectCreated => "project_created",
        }
    }
}

/// Activity record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    pub id: Uuid,

    /// Actor
    pub user_id: Uuid,

    pub project_id: Option<Uuid>,
    pub task_id: Option<Uuid>,

    #[serde(rename = "type")]
    pub activity_type: ActivityType,

    pub description: String,

    /// Free-form details (changed fields, titles, ids)
    pub metadata: Map<String, JsonValue>,

    pub created_at: DateTime<Utc>,
}

/// Activity about to be recorded
#[derive(Debug, Clone)]
pub(crate) struct NewActivity {
    pub user_id: Uuid,
    pub project_id: Option<Uuid>,
    pub task_id: Option<Uuid>,
    pub activity_type: ActivityType,
    pub description: String,
    pub metadata: Map<String, JsonValue>,
}

impl NewActivity {
    pub fn new(user_id: Uuid, activity_type: ActivityType, description: impl Into<String>) -> Self {
        Self {
            user_id,
            project_id: None,
            task_id: None,
            activity_type,
            description: description.into(),
            metadata: Map::new(),
        }
    }

    pub fn project(mut self, project_id: Uuid) -> Self {
        self.project_id = Some(project_id);
        self
    }

    pub fn task(mut self, task_id: Uuid) -> Self {
        self.task_id = Some(task_id);
        self
    }

    pub fn meta(mut self, key: &str, value: impl Into<JsonValue>) -> Self {
        self.metadata.insert(key.to_string(), value.into());
        self
    }
}

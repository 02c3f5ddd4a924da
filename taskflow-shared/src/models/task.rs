/// Task model
///
/// Tasks belong to exactly one project and carry a dependency list that must
/// stay acyclic across the whole dependency graph (see [`crate::graph`]).
///
/// # Status
///
/// ```text
/// todo ⇄ in-progress ⇄ review ⇄ completed
/// ```
///
/// Any status may move to any other. `completed_at` is set exactly when a task
/// moves into `completed` and cleared when it moves out.
///
/// # Ownership
///
/// A task owns its comments and attachments; they are dropped with it.
/// Deleting a task strips its id from every other task's `depends_on` and
/// `blocked_by` lists.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::{double_option, Comment, Priority};

/// Workflow status of a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    #[default]
    Todo,
    InProgress,
    Review,
    Completed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "todo",
            TaskStatus::InProgress => "in-progress",
            TaskStatus::Review => "review",
            TaskStatus::Completed => "completed",
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, TaskStatus::Completed)
    }
}

/// File attached to a task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub id: Uuid,
    pub task_id: Uuid,

    /// Uploader
    pub user_id: Uuid,

    pub filename: String,
    pub url: String,

    /// Size in bytes
    pub size: u64,

    pub mime_type: String,
    pub created_at: DateTime<Utc>,
}

/// Task record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    pub description: String,

    /// Owning project, fixed at creation
    pub project_id: Uuid,

    pub assignee_id: Option<Uuid>,

    /// Creating user, fixed at creation
    pub creator_id: Uuid,

    pub status: TaskStatus,
    pub priority: Priority,
    pub tags: Vec<String>,

    /// Tasks this task requires
    pub depends_on: Vec<Uuid>,

    /// Tasks that require this task
    pub blocked_by: Vec<Uuid>,

    pub estimated_hours: Option<f64>,
    pub actual_hours: Option<f64>,
    pub due_date: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    /// Manual ordering within the project (ascending)
    pub position: i64,

    pub comments: Vec<Comment>,
    pub attachments: Vec<Attachment>,
}

impl Task {
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Whether `id` appears in either relation list
    pub fn references(&self, id: Uuid) -> bool {
        self.depends_on.contains(&id) || self.blocked_by.contains(&id)
    }
}

/// Input for creating a new task
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateTask {
    #[validate(length(min = 1, max = 200, message = "Task title must be 1-200 characters"))]
    pub title: String,

    #[validate(length(max = 10000, message = "Task description is too long"))]
    #[serde(default)]
    pub description: String,

    pub project_id: Uuid,

    #[serde(default)]
    pub assignee_id: Option<Uuid>,

    /// Acting user
    pub creator_id: Uuid,

    #[serde(default)]
    pub status: TaskStatus,

    #[serde(default)]
    pub priority: Priority,

    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default)]
    pub depends_on: Vec<Uuid>,

    #[serde(default)]
    pub blocked_by: Vec<Uuid>,

    #[serde(default)]
    pub estimated_hours: Option<f64>,

    #[serde(default)]
    pub actual_hours: Option<f64>,

    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,

    /// Unset means "after the last task in the project"
    #[serde(default)]
    pub position: Option<i64>,
}

/// Input for updating a task
///
/// `project_id` and `creator_id` are immutable and therefore absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateTask {
    #[validate(length(min = 1, max = 200, message = "Task title must be 1-200 characters"))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[validate(length(max = 10000, message = "Task description is too long"))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,

    /// New assignee (use Some(None) to unassign)
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub assignee_id: Option<Option<Uuid>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depends_on: Option<Vec<Uuid>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blocked_by: Option<Vec<Uuid>>,

    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub estimated_hours: Option<Option<f64>>,

    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub actual_hours: Option<Option<f64>>,

    /// New due date (use Some(None) to clear)
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub due_date: Option<Option<DateTime<Utc>>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<i64>,
}

/// Filters for listing a project's tasks
///
/// All supplied filters must match. `tags` matches when the task carries at
/// least one of the listed tags; an empty list disables the tag filter.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskFilter {
    #[serde(default)]
    pub status: Option<TaskStatus>,

    #[serde(default)]
    pub assignee_id: Option<Uuid>,

    #[serde(default)]
    pub priority: Option<Priority>,

    #[serde(default)]
    pub tags: Vec<String>,
}

impl TaskFilter {
    pub fn matches(&self, task: &Task) -> bool {
        if let Some(status) = self.status {
            if task.status != status {
                return false;
            }
        }
        if let Some(assignee_id) = self.assignee_id {
            if task.assignee_id != Some(assignee_id) {
                return false;
            }
        }
        if let Some(priority) = self.priority {
            if task.priority != priority {
                return false;
            }
        }
        if !self.tags.is_empty() && !self.tags.iter().any(|tag| task.has_tag(tag)) {
            return false;
        }
        true
    }
}

/// Input for attaching a file to a task
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateAttachment {
    /// Uploader
    pub user_id: Uuid,

    #[validate(length(min = 1, max = 255, message = "Filename must be 1-255 characters"))]
    pub filename: String,

    #[validate(length(min = 1, max = 2048, message = "URL must be 1-2048 characters"))]
    pub url: String,

    pub size: u64,

    #[validate(length(min = 1, max = 255, message = "MIME type must be 1-255 characters"))]
    pub mime_type: String,
}

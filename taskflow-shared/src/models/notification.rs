/// Notification model
///
/// Notifications are addressed to a single recipient. The only mutation is the
/// unread → read transition; notifications are never deleted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Reason a notification was sent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    Mention,
    Assignment,
    DueDate,
    ProjectInvite,
    TaskCompleted,
}

impl NotificationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationType::Mention => "mention",
            NotificationType::Assignment => "assignment",
            NotificationType::DueDate => "due_date",
            NotificationType::ProjectInvite => "project_invite",
            NotificationType::TaskCompleted => "task_completed",
        }
    }
}

/// Notification record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,

    /// Recipient
    pub user_id: Uuid,

    #[serde(rename = "type")]
    pub notification_type: NotificationType,

    pub title: String,
    pub message: String,
    pub is_read: bool,

    /// Deep link into the UI
    pub action_url: Option<String>,

    pub created_at: DateTime<Utc>,
}

/// Input for creating a notification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateNotification {
    pub user_id: Uuid,

    #[serde(rename = "type")]
    pub notification_type: NotificationType,

    pub title: String,
    pub message: String,

    #[serde(default)]
    pub action_url: Option<String>,
}

/// Options for listing a user's notifications
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct NotificationQuery {
    #[serde(default)]
    pub unread_only: bool,

    /// Falls back to the store's configured default
    #[serde(default)]
    pub limit: Option<usize>,
}

/// Deep link to a task
pub fn task_action_url(project_id: Uuid, task_id: Uuid) -> String {
    format!("/projects/{}/tasks/{}", project_id, task_id)
}

/// Deep link to a project
pub fn project_action_url(project_id: Uuid) -> String {
    format!("/projects/{}", project_id)
}

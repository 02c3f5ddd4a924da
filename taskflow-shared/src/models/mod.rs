/// Entity models for TaskFlow
///
/// This module contains the entity records held by the store and the command
/// structs used to create and update them.
///
/// # Models
///
/// - `user`: User accounts, roles and preferences
/// - `project`: Projects with owner, members and settings
/// - `task`: Tasks with dependencies, ordering and attachments
/// - `comment`: Task comments with parsed mentions
/// - `activity`: Append-only audit log entries
/// - `notification`: Recipient-addressed notifications
///
/// # Update commands
///
/// Update structs use `Option<T>` for "leave unchanged / set" and
/// `Option<Option<T>>` for clearable fields, where `Some(None)` clears the
/// value. When deserialized from JSON, an absent key maps to `None` and an
/// explicit `null` maps to `Some(None)`.

pub mod activity;
pub mod comment;
pub mod notification;
pub mod project;
pub mod task;
pub mod user;

pub use activity::*;
pub use comment::*;
pub use notification::*;
pub use project::*;
pub use task::*;
pub use user::*;

use serde::{Deserialize, Deserializer, Serialize};

/// Priority shared by projects and tasks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Critical => "critical",
        }
    }
}

/// Deserializes a clearable field so that `null` becomes `Some(None)`
///
/// Use together with `#[serde(default)]` so that a missing key stays `None`.
pub(crate) fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

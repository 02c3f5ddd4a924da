/// Comment model
///
/// Comments are owned by their task. Only the author may edit or delete a
/// comment; the store reports a non-author attempt as "not applied" rather
/// than as an error.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Maximum comment length in characters
pub const MAX_COMMENT_LENGTH: usize = 2000;

/// Comment record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,

    /// Owning task
    pub task_id: Uuid,

    /// Author, fixed at creation
    pub user_id: Uuid,

    pub content: String,

    /// Users mentioned in `content`, deduplicated, in order of appearance
    pub mentions: Vec<Uuid>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for adding a comment
///
/// Mentions are parsed from `content` by the store.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateComment {
    /// Author
    pub user_id: Uuid,

    #[validate(length(min = 1, max = 2000, message = "Comment must be 1-2000 characters"))]
    pub content: String,
}

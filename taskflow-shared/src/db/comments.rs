/// Comment and attachment operations
///
/// Both are owned by their task and deleted with it. Only the author of a
/// comment (or uploader of an attachment) may change or remove it; any other
/// caller gets a benign "not applied" result rather than an error, so the
/// response does not reveal whether the item exists.
///
/// Adding a comment leaves the task's `updated_at` untouched.

use chrono::Utc;
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use super::{dedup_ids, trim_in_place, Database};
use crate::error::{EntityKind, StoreError, StoreResult};
use crate::events::{Channel, EventKind};
use crate::mentions::extract_mentions;
use crate::models::activity::NewActivity;
use crate::models::{
    task_action_url, ActivityType, Attachment, Comment, CreateAttachment, CreateComment, CreateNotification,
    NotificationType,
};

impl Database {
    /// Appends a comment to a task
    ///
    /// `@username` tokens are resolved to user ids and stored as the
    /// comment's mentions. Every mentioned user except the author is
    /// notified.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the task or the author does not exist
    /// - `ValidationFailed` for empty or oversized content
    pub fn add_comment(&mut self, task_id: Uuid, mut data: CreateComment) -> StoreResult<Comment> {
        trim_in_place(&mut data.content);
        data.validate()?;

        let task = self
            .tasks
            .get(&task_id)
            .ok_or_else(|| StoreError::not_found(EntityKind::Task, task_id))?;
        if !self.users.contains_key(&data.user_id) {
            return Err(StoreError::not_found(EntityKind::User, data.user_id));
        }
        let project_id = task.project_id;
        let task_title = task.title.clone();

        let now = Utc::now();
        let comment = Comment {
            id: Uuid::new_v4(),
            task_id,
            user_id: data.user_id,
            mentions: self.resolve_mentions(&data.content),
            content: data.content,
            created_at: now,
            updated_at: now,
        };

        if let Some(task) = self.tasks.get_mut(&task_id) {
            task.comments.push(comment.clone());
        }

        self.log_activity(
            NewActivity::new(
                comment.user_id,
                ActivityType::CommentAdded,
                format!("Added a comment to \"{}\"", task_title),
            )
            .project(project_id)
            .task(task_id)
            .meta("comment_id", comment.id.to_string()),
        );

        let author = self.display_name(comment.user_id);
        for mentioned in comment.mentions.iter().filter(|id| **id != comment.user_id) {
            self.push_notification(CreateNotification {
                user_id: *mentioned,
                notification_type: NotificationType::Mention,
                title: "You were mentioned".to_string(),
                message: format!("{} mentioned you in a comment on \"{}\"", author, task_title),
                action_url: Some(task_action_url(project_id, task_id)),
            });
        }

        tracing::debug!(
            comment_id = %comment.id,
            task_id = %task_id,
            mentions = comment.mentions.len(),
            "Comment added"
        );
        self.broadcaster.publish(
            Channel::project(project_id, EventKind::CommentAdded),
            &json!({ "task_id": task_id, "comment": comment }),
        );
        Ok(comment)
    }

    /// Comments of a task, oldest first
    pub fn get_comments(&self, task_id: Uuid) -> StoreResult<&[Comment]> {
        self.tasks
            .get(&task_id)
            .map(|task| task.comments.as_slice())
            .ok_or_else(|| StoreError::not_found(EntityKind::Task, task_id))
    }

    /// Replaces a comment's content and re-parses its mentions
    ///
    /// Returns `Ok(None)` when the task or comment does not exist or
    /// `user_id` is not the author.
    ///
    /// # Errors
    ///
    /// Returns `ValidationFailed` for empty or oversized content.
    pub fn update_comment(
        &mut self,
        task_id: Uuid,
        comment_id: Uuid,
        user_id: Uuid,
        content: &str,
    ) -> StoreResult<Option<Comment>> {
        let data = CreateComment {
            user_id,
            content: content.trim().to_string(),
        };
        data.validate()?;

        let mentions = self.resolve_mentions(&data.content);
        let Some(comment) = self
            .tasks
            .get_mut(&task_id)
            .and_then(|task| task.comments.iter_mut().find(|c| c.id == comment_id))
        else {
            return Ok(None);
        };
        if comment.user_id != user_id {
            return Ok(None);
        }

        comment.content = data.content;
        comment.mentions = mentions;
        comment.updated_at = Utc::now();

        tracing::debug!(comment_id = %comment_id, task_id = %task_id, "Comment updated");
        Ok(Some(comment.clone()))
    }

    /// Removes a comment
    ///
    /// Returns `false` when the task or comment does not exist or `user_id`
    /// is not the author.
    pub fn delete_comment(&mut self, task_id: Uuid, comment_id: Uuid, user_id: Uuid) -> bool {
        let Some(task) = self.tasks.get_mut(&task_id) else {
            return false;
        };
        let Some(index) = task
            .comments
            .iter()
            .position(|c| c.id == comment_id && c.user_id == user_id)
        else {
            return false;
        };

        task.comments.remove(index);
        tracing::debug!(comment_id = %comment_id, task_id = %task_id, "Comment deleted");
        true
    }

    /// Attaches a file reference to a task
    ///
    /// # Errors
    ///
    /// - `NotFound` if the task or the uploader does not exist
    /// - `ValidationFailed` for empty or oversized names
    pub fn add_attachment(&mut self, task_id: Uuid, mut data: CreateAttachment) -> StoreResult<Attachment> {
        trim_in_place(&mut data.filename);
        trim_in_place(&mut data.url);
        trim_in_place(&mut data.mime_type);
        data.validate()?;

        if !self.users.contains_key(&data.user_id) {
            return Err(StoreError::not_found(EntityKind::User, data.user_id));
        }
        let task = self
            .tasks
            .get_mut(&task_id)
            .ok_or_else(|| StoreError::not_found(EntityKind::Task, task_id))?;

        let attachment = Attachment {
            id: Uuid::new_v4(),
            task_id,
            user_id: data.user_id,
            filename: data.filename,
            url: data.url,
            size: data.size,
            mime_type: data.mime_type,
            created_at: Utc::now(),
        };
        task.attachments.push(attachment.clone());

        tracing::debug!(attachment_id = %attachment.id, task_id = %task_id, size = attachment.size, "Attachment added");
        Ok(attachment)
    }

    /// Removes an attachment; only its uploader may do so
    pub fn delete_attachment(&mut self, task_id: Uuid, attachment_id: Uuid, user_id: Uuid) -> bool {
        let Some(task) = self.tasks.get_mut(&task_id) else {
            return false;
        };
        let before = task.attachments.len();
        task.attachments
            .retain(|a| !(a.id == attachment_id && a.user_id == user_id));
        before != task.attachments.len()
    }

    /// User ids named by `@username` tokens, in order of first appearance
    fn resolve_mentions(&self, content: &str) -> Vec<Uuid> {
        let mut ids: Vec<Uuid> = extract_mentions(content)
            .into_iter()
            .filter_map(|username| self.get_user_by_username(username))
            .map(|user| user.id)
            .collect();
        dedup_ids(&mut ids);
        ids
    }
}

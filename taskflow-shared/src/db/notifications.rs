/// Notification operations
///
/// Notifications are addressed to one recipient, start unread and are never
/// deleted. Creating one publishes `user:<id>:notification:created`.

use chrono::Utc;
use uuid::Uuid;

use super::Database;
use crate::error::{EntityKind, StoreError, StoreResult};
use crate::events::{Channel, EventKind};
use crate::models::{CreateNotification, Notification, NotificationQuery};

impl Database {
    /// Creates an unread notification for an existing user
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the recipient does not exist.
    pub fn create_notification(&mut self, data: CreateNotification) -> StoreResult<Notification> {
        if !self.users.contains_key(&data.user_id) {
            return Err(StoreError::not_found(EntityKind::User, data.user_id));
        }
        Ok(self.push_notification(data))
    }

    /// Stores a notification for a recipient already known to exist
    pub(crate) fn push_notification(&mut self, data: CreateNotification) -> Notification {
        let notification = Notification {
            id: Uuid::new_v4(),
            user_id: data.user_id,
            notification_type: data.notification_type,
            title: data.title,
            message: data.message,
            is_read: false,
            action_url: data.action_url,
            created_at: Utc::now(),
        };

        self.indexes
            .notifications_by_user
            .entry(notification.user_id)
            .or_default()
            .push_front(notification.id);
        self.notifications.insert(notification.id, notification.clone());

        tracing::debug!(
            notification_id = %notification.id,
            user_id = %notification.user_id,
            notification_type = notification.notification_type.as_str(),
            "Notification created"
        );

        self.broadcaster.publish(
            Channel::user(notification.user_id, EventKind::NotificationCreated),
            &notification,
        );
        notification
    }

    pub fn get_notification(&self, id: Uuid) -> Option<&Notification> {
        self.notifications.get(&id)
    }

    /// Notifications of a user, newest first
    ///
    /// `query.limit` defaults to `StoreConfig::default_notification_limit`.
    pub fn get_notifications_by_user(&self, user_id: Uuid, query: NotificationQuery) -> Vec<&Notification> {
        let limit = query.limit.unwrap_or(self.config.default_notification_limit);
        let Some(ids) = self.indexes.notifications_by_user.get(&user_id) else {
            return Vec::new();
        };

        ids.iter()
            .filter_map(|id| self.notifications.get(id))
            .filter(|n| !query.unread_only || !n.is_read)
            .take(limit)
            .collect()
    }

    /// Marks one notification as read
    ///
    /// Returns `false` if the notification does not exist or belongs to
    /// someone else.
    pub fn mark_notification_as_read(&mut self, id: Uuid, user_id: Uuid) -> bool {
        match self.notifications.get_mut(&id) {
            Some(notification) if notification.user_id == user_id => {
                notification.is_read = true;
                true
            }
            _ => false,
        }
    }

    /// Marks every unread notification of a user as read
    ///
    /// Returns how many changed state.
    pub fn mark_all_notifications_as_read(&mut self, user_id: Uuid) -> usize {
        let Some(ids) = self.indexes.notifications_by_user.get(&user_id) else {
            return 0;
        };

        let mut count = 0;
        for id in ids {
            if let Some(notification) = self.notifications.get_mut(id) {
                if !notification.is_read {
                    notification.is_read = true;
                    count += 1;
                }
            }
        }

        tracing::debug!(user_id = %user_id, count, "Notifications marked read");
        count
    }

    pub fn unread_notification_count(&self, user_id: Uuid) -> usize {
        self.get_notifications_by_user(
            user_id,
            NotificationQuery {
                unread_only: true,
                limit: Some(usize::MAX),
            },
        )
        .len()
    }
}

/// Live event logging
///
/// Consumes a [`SubscriptionStream`] on a background task and writes every
/// event to the log. This is the same consumption pattern a streaming
/// transport would use: the stream owns the registrations and dropping it
/// (task abort or shutdown) deregisters them.

use std::sync::Arc;

use taskflow_shared::events::{Channel, EventBroadcaster, EventKind, SubscriptionStream};
use taskflow_shared::Database;
use tokio::task::JoinHandle;
use tokio_stream::StreamExt;

/// Every project-scoped channel of every project in the store
///
/// This is a snapshot: projects created after the call are not included, so
/// a logger built from it only follows projects that existed when it was
/// spawned. Call again and spawn another logger to follow new projects.
pub fn project_channels(db: &Database) -> Vec<Channel> {
    db.list_users()
        .iter()
        .flat_map(|user| db.get_projects_by_user(user.id))
        .map(|project| project.id)
        .collect::<std::collections::BTreeSet<_>>()
        .into_iter()
        .flat_map(|project_id| EventKind::ALL.into_iter().map(move |kind| Channel::project(project_id, kind)))
        .collect()
}

/// Spawns a task logging every event on `channels`
///
/// The task ends when the broadcaster is dropped or the handle is aborted.
pub fn spawn_event_logger(broadcaster: &Arc<EventBroadcaster>, channels: Vec<Channel>) -> JoinHandle<usize> {
    let count = channels.len();
    let stream = broadcaster.stream(channels);
    tracing::info!(channels = count, "Event logger attached");

    tokio::spawn(log_events(stream))
}

async fn log_events(mut stream: SubscriptionStream) -> usize {
    let mut seen = 0;
    while let Some(event) = stream.next().await {
        seen += 1;
        tracing::info!(
            channel = %event.channel,
            kind = event.kind.as_str(),
            timestamp = %event.timestamp,
            "Event published"
        );
    }
    seen
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed::seed_demo_data;
    use taskflow_shared::models::CreateProject;

    #[test]
    fn test_project_channels_cover_every_kind() {
        let mut db = Database::new();
        let summary = seed_demo_data(&mut db).unwrap();

        let channels = project_channels(&db);
        assert_eq!(channels.len(), EventKind::ALL.len());
        assert!(channels.contains(&Channel::project(summary.project_id, EventKind::TaskCreated)));
    }

    #[test]
    fn test_project_channels_skip_projects_created_later() {
        let mut db = Database::new();
        let summary = seed_demo_data(&mut db).unwrap();
        let channels = project_channels(&db);

        let later = db
            .create_project(CreateProject {
                name: "Later".to_string(),
                description: String::new(),
                owner_id: summary.user_ids[0],
                member_ids: vec![],
                status: Default::default(),
                priority: Default::default(),
                start_date: None,
                end_date: None,
                settings: Default::default(),
            })
            .unwrap();

        let later_channel = Channel::project(later.id, EventKind::TaskCreated);
        assert!(!channels.contains(&later_channel));
        let refreshed = project_channels(&db);
        assert_eq!(refreshed.len(), 2 * EventKind::ALL.len());
        assert!(refreshed.contains(&later_channel));
    }

    #[tokio::test]
    async fn test_event_logger_counts_until_broadcaster_dropped() {
        let broadcaster = Arc::new(EventBroadcaster::new());
        let created = Channel::project(uuid::Uuid::new_v4(), EventKind::TaskCreated);
        let updated = Channel::project(uuid::Uuid::new_v4(), EventKind::TaskUpdated);
        let other = Channel::project(uuid::Uuid::new_v4(), EventKind::TaskDeleted);

        let handle = spawn_event_logger(&broadcaster, vec![created, updated]);
        broadcaster.publish(created, &"one");
        broadcaster.publish(updated, &"two");
        broadcaster.publish(other, &"ignored");
        drop(broadcaster);

        assert_eq!(handle.await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_event_logger_deregisters_on_abort() {
        let broadcaster = Arc::new(EventBroadcaster::new());
        let channel = Channel::project(uuid::Uuid::new_v4(), EventKind::TaskUpdated);

        let handle = spawn_event_logger(&broadcaster, vec![channel]);
        assert_eq!(broadcaster.subscriber_count(&channel), 1);

        handle.abort();
        assert!(handle.await.unwrap_err().is_cancelled());
        assert_eq!(broadcaster.subscriber_count(&channel), 0);
    }
}

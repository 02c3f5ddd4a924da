/// Integration tests for live event delivery
///
/// Covers direct broadcaster use through parsed channel keys, events
/// published by store mutations, and stream cleanup.

mod common;

use std::sync::{Arc, Mutex};

use common::TestContext;
use taskflow_shared::events::{CallbackError, Channel, Event, EventBroadcaster, EventKind};
use taskflow_shared::models::{CreateComment, UpdateTask};
use tokio_stream::StreamExt;
use uuid::Uuid;

type Received = Arc<Mutex<Vec<Event>>>;

fn recorder(events: &Received) -> impl Fn(&Event) -> Result<(), CallbackError> + Send + Sync + 'static {
    let sink = events.clone();
    move |event: &Event| -> Result<(), CallbackError> {
        sink.lock().unwrap().push(event.clone());
        Ok(())
    }
}

#[test]
fn test_subscribe_publish_unsubscribe_by_key() {
    let broadcaster = EventBroadcaster::new();
    let project_id = Uuid::new_v4();
    let channel = Channel::parse(&format!("project:{}:task:created", project_id)).unwrap();
    assert_eq!(channel, Channel::project(project_id, EventKind::TaskCreated));

    let received = Received::default();
    let id = broadcaster.subscribe(channel, recorder(&received));

    assert_eq!(broadcaster.publish(channel, &serde_json::json!({ "n": 1 })), 1);
    assert_eq!(received.lock().unwrap().len(), 1);

    assert!(broadcaster.unsubscribe(&channel, id));
    assert_eq!(broadcaster.publish(channel, &serde_json::json!({ "n": 2 })), 0);
    assert_eq!(received.lock().unwrap().len(), 1);
}

#[test]
fn test_store_mutations_publish_events() {
    let mut ctx = TestContext::new().unwrap();
    let project_id = ctx.project_id;
    let broadcaster = ctx.db.broadcaster().clone();

    let project_events = Received::default();
    for kind in [
        EventKind::TaskCreated,
        EventKind::TaskUpdated,
        EventKind::TaskDeleted,
        EventKind::CommentAdded,
    ] {
        broadcaster.subscribe(Channel::project(project_id, kind), recorder(&project_events));
    }
    let member_events = Received::default();
    for kind in [EventKind::UserAssigned, EventKind::NotificationCreated] {
        broadcaster.subscribe(Channel::user(ctx.member.id, kind), recorder(&member_events));
    }

    let task = ctx.task("observe", vec![]).unwrap();
    ctx.db
        .update_task(task.id, UpdateTask { assignee_id: Some(Some(ctx.member.id)), ..Default::default() }, ctx.owner.id)
        .unwrap();
    ctx.db
        .add_comment(task.id, CreateComment { user_id: ctx.owner.id, content: "thanks @member".into() })
        .unwrap();
    ctx.db.delete_task(task.id);

    let kinds: Vec<EventKind> = project_events.lock().unwrap().iter().map(|e| e.kind).collect();
    assert_eq!(
        kinds,
        vec![
            EventKind::TaskCreated,
            EventKind::TaskUpdated,
            EventKind::CommentAdded,
            EventKind::TaskDeleted
        ]
    );
    assert_eq!(project_events.lock().unwrap()[0].payload["title"], "observe");

    let member_kinds: Vec<EventKind> = member_events.lock().unwrap().iter().map(|e| e.kind).collect();
    assert_eq!(
        member_kinds,
        vec![
            EventKind::NotificationCreated,
            EventKind::UserAssigned,
            EventKind::NotificationCreated
        ]
    );
}

#[test]
fn test_failing_subscriber_does_not_fail_mutation() {
    let mut ctx = TestContext::new().unwrap();
    let broadcaster = ctx.db.broadcaster().clone();
    let channel = Channel::project(ctx.project_id, EventKind::TaskCreated);

    broadcaster.subscribe(channel, |_| Err("subscriber offline".into()));
    let received = Received::default();
    broadcaster.subscribe(channel, recorder(&received));

    assert!(ctx.task("still created", vec![]).is_ok());
    assert_eq!(received.lock().unwrap().len(), 1);
}

#[test]
fn test_panicking_subscriber_does_not_fail_mutation() {
    let mut ctx = TestContext::new().unwrap();
    let broadcaster = ctx.db.broadcaster().clone();
    let created = Channel::project(ctx.project_id, EventKind::TaskCreated);
    let updated = Channel::project(ctx.project_id, EventKind::TaskUpdated);

    broadcaster.subscribe(created, |_| panic!("subscriber bug"));
    broadcaster.subscribe(updated, |_| panic!("subscriber bug"));
    let received = Received::default();
    broadcaster.subscribe(created, recorder(&received));

    let task = ctx.task("still created", vec![]).unwrap();
    assert!(ctx.db.get_task(task.id).is_some());
    assert_eq!(received.lock().unwrap().len(), 1);

    let renamed = ctx
        .db
        .update_task(task.id, UpdateTask { title: Some("renamed".to_string()), ..Default::default() }, ctx.owner.id)
        .unwrap();
    assert_eq!(renamed.title, "renamed");
    assert!(ctx.db.verify_integrity().is_empty());
}

#[tokio::test]
async fn test_stream_follows_project_and_cleans_up_on_drop() {
    let mut ctx = TestContext::new().unwrap();
    let broadcaster = ctx.db.broadcaster().clone();
    let channels: Vec<Channel> = EventKind::ALL
        .into_iter()
        .map(|kind| Channel::project(ctx.project_id, kind))
        .collect();

    let mut stream = broadcaster.stream(channels.clone());
    let task = ctx.task("streamed", vec![]).unwrap();
    ctx.db.delete_task(task.id);

    let created = stream.next().await.unwrap();
    assert_eq!(created.kind, EventKind::TaskCreated);
    assert_eq!(created.payload["id"], task.id.to_string());

    let deleted = stream.next().await.unwrap();
    assert_eq!(deleted.kind, EventKind::TaskDeleted);
    assert!(stream.try_recv().is_none());

    drop(stream);
    for channel in &channels {
        assert_eq!(broadcaster.subscriber_count(channel), 0);
    }
}

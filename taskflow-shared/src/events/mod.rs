/// Live update publish/subscribe
///
/// The store publishes an [`Event`] after every observable mutation. Transport
/// layers (an SSE endpoint, a websocket, a test) subscribe to typed
/// [`Channel`]s, either with a callback or through a [`SubscriptionStream`].
///
/// # Channel keys
///
/// ```text
/// project:{project_id}:{event_kind}   e.g. project:…:task:created
/// user:{user_id}:{event_kind}         e.g. user:…:notification:created
/// ```
///
/// Delivery is in-process, synchronous, at-most-once and best-effort: an event
/// published while nobody is subscribed is dropped.
///
/// # Example
///
/// ```
/// use std::sync::{Arc, Mutex};
/// use taskflow_shared::events::{Channel, EventBroadcaster, EventKind};
/// use uuid::Uuid;
///
/// let broadcaster = EventBroadcaster::new();
/// let channel = Channel::project(Uuid::new_v4(), EventKind::TaskCreated);
///
/// let seen = Arc::new(Mutex::new(Vec::new()));
/// let sink = seen.clone();
/// let id = broadcaster.subscribe(channel, move |event| {
///     sink.lock().unwrap().push(event.payload.clone());
///     Ok(())
/// });
///
/// broadcaster.publish(channel, &serde_json::json!({"title": "Ship it"}));
/// assert!(broadcaster.unsubscribe(&channel, id));
/// broadcaster.publish(channel, &serde_json::json!({"title": "Ignored"}));
///
/// assert_eq!(seen.lock().unwrap().len(), 1);
/// ```

pub mod broadcaster;
pub mod channel;

pub use broadcaster::{CallbackError, EventBroadcaster, SubscriptionId, SubscriptionStream};
pub use channel::{Channel, Event, EventKind};

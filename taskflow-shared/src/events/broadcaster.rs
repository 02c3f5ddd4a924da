/// In-process event broadcaster
///
/// Subscribers register callbacks against a [`Channel`]. Publishing delivers
/// the event to every callback registered on that channel at publish time,
/// synchronously and in registration order. A callback returning an error or
/// panicking is logged and skipped; delivery to the remaining callbacks
/// continues and the publisher never sees the failure.
///
/// The subscriber list is snapshotted before delivery, so callbacks may
/// subscribe or unsubscribe (including themselves) without deadlocking.
///
/// # Streams
///
/// [`EventBroadcaster::stream`] wraps one or more registrations in a
/// [`SubscriptionStream`]. The stream deregisters every one of its callbacks
/// when dropped, which is how a transport cleans up after a disconnect.

use serde::Serialize;
use std::any::Any;
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, Weak};
use std::task::{Context, Poll};
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tokio_stream::Stream;

use super::channel::{Channel, Event};

/// Error a callback may return to report a failed delivery
pub type CallbackError = Box<dyn std::error::Error + Send + Sync>;

type Callback = Arc<dyn Fn(&Event) -> Result<(), CallbackError> + Send + Sync>;

/// Handle identifying one registration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct SubscriptionId(u64);

struct Subscriber {
    id: SubscriptionId,
    callback: Callback,
}

/// Publish/subscribe hub keyed by [`Channel`]
pub struct EventBroadcaster {
    next_id: AtomicU64,
    subscribers: RwLock<HashMap<Channel, Vec<Subscriber>>>,
}

impl Default for EventBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventBroadcaster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let subscribers = self.subscribers.read().unwrap_or_else(PoisonError::into_inner);
        f.debug_struct("EventBroadcaster")
            .field("channels", &subscribers.len())
            .finish()
    }
}

impl EventBroadcaster {
    pub fn new() -> Self {
        EventBroadcaster {
            next_id: AtomicU64::new(1),
            subscribers: RwLock::new(HashMap::new()),
        }
    }

    /// Registers `callback` on `channel`
    ///
    /// Registering the same closure twice yields two independent
    /// registrations, each receiving every event.
    pub fn subscribe<F>(&self, channel: Channel, callback: F) -> SubscriptionId
    where
        F: Fn(&Event) -> Result<(), CallbackError> + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let mut subscribers = self.subscribers.write().unwrap_or_else(PoisonError::into_inner);
        subscribers.entry(channel).or_default().push(Subscriber {
            id,
            callback: Arc::new(callback),
        });

        tracing::debug!(channel = %channel, subscription = id.0, "Subscribed");
        id
    }

    /// Removes exactly one registration
    ///
    /// Returns `false` if `id` is not registered on `channel`.
    pub fn unsubscribe(&self, channel: &Channel, id: SubscriptionId) -> bool {
        let mut subscribers = self.subscribers.write().unwrap_or_else(PoisonError::into_inner);
        let Some(list) = subscribers.get_mut(channel) else {
            return false;
        };

        let Some(index) = list.iter().position(|s| s.id == id) else {
            return false;
        };
        list.remove(index);
        if list.is_empty() {
            subscribers.remove(channel);
        }

        tracing::debug!(channel = %channel, subscription = id.0, "Unsubscribed");
        true
    }

    /// Serializes `payload` and delivers it on `channel`
    ///
    /// Returns the number of callbacks that accepted the event. A payload that
    /// fails to serialize is logged and dropped.
    pub fn publish<T>(&self, channel: Channel, payload: &T) -> usize
    where
        T: Serialize + ?Sized,
    {
        match serde_json::to_value(payload) {
            Ok(payload) => self.publish_event(&Event::new(channel, payload)),
            Err(err) => {
                tracing::warn!(channel = %channel, error = %err, "Dropping unserializable event payload");
                0
            }
        }
    }

    /// Delivers a prepared event on its channel
    pub fn publish_event(&self, event: &Event) -> usize {
        let callbacks: Vec<(SubscriptionId, Callback)> = {
            let subscribers = self.subscribers.read().unwrap_or_else(PoisonError::into_inner);
            match subscribers.get(&event.channel) {
                Some(list) => list.iter().map(|s| (s.id, s.callback.clone())).collect(),
                None => return 0,
            }
        };

        let mut delivered = 0;
        for (id, callback) in callbacks {
            match catch_unwind(AssertUnwindSafe(|| callback(event))) {
                Ok(Ok(())) => delivered += 1,
                Ok(Err(err)) => {
                    tracing::warn!(
                        channel = %event.channel,
                        subscription = id.0,
                        error = %err,
                        "Event callback failed"
                    );
                }
                Err(payload) => {
                    tracing::warn!(
                        channel = %event.channel,
                        subscription = id.0,
                        panic = panic_message(&*payload),
                        "Event callback panicked"
                    );
                }
            }
        }

        delivered
    }

    /// Number of registrations on `channel`
    pub fn subscriber_count(&self, channel: &Channel) -> usize {
        let subscribers = self.subscribers.read().unwrap_or_else(PoisonError::into_inner);
        subscribers.get(channel).map_or(0, Vec::len)
    }

    /// Drops every registration on `channel`, or on all channels when `None`
    pub fn clear(&self, channel: Option<&Channel>) {
        let mut subscribers = self.subscribers.write().unwrap_or_else(PoisonError::into_inner);
        match channel {
            Some(channel) => {
                subscribers.remove(channel);
            }
            None => subscribers.clear(),
        }
    }

    /// Opens a stream receiving events from every channel in `channels`
    ///
    /// # Example
    ///
    /// ```
    /// use std::sync::Arc;
    /// use taskflow_shared::events::{Channel, EventBroadcaster, EventKind};
    /// use tokio_stream::StreamExt;
    /// use uuid::Uuid;
    ///
    /// # #[tokio::main(flavor = "current_thread")]
    /// # async fn main() {
    /// let broadcaster = Arc::new(EventBroadcaster::new());
    /// let channel = Channel::project(Uuid::new_v4(), EventKind::TaskUpdated);
    ///
    /// let mut stream = broadcaster.stream([channel]);
    /// broadcaster.publish(channel, &"payload");
    ///
    /// let event = stream.next().await.unwrap();
    /// assert_eq!(event.kind, EventKind::TaskUpdated);
    ///
    /// drop(stream);
    /// assert_eq!(broadcaster.subscriber_count(&channel), 0);
    /// # }
    /// ```
    pub fn stream<I>(self: &Arc<Self>, channels: I) -> SubscriptionStream
    where
        I: IntoIterator<Item = Channel>,
    {
        let (tx, rx) = mpsc::unbounded_channel::<Event>();

        let registrations = channels
            .into_iter()
            .map(|channel| {
                let tx = tx.clone();
                let id = self.subscribe(channel, move |event| {
                    tx.send(event.clone())
                        .map_err(|_| CallbackError::from("subscription stream closed"))
                });
                (channel, id)
            })
            .collect();

        SubscriptionStream {
            broadcaster: Arc::downgrade(self),
            registrations,
            inner: UnboundedReceiverStream::new(rx),
        }
    }
}

/// Stream of events for a set of channels
///
/// Dropping the stream deregisters all of its callbacks.
pub struct SubscriptionStream {
    broadcaster: Weak<EventBroadcaster>,
    registrations: Vec<(Channel, SubscriptionId)>,
    inner: UnboundedReceiverStream<Event>,
}

impl SubscriptionStream {
    /// Channels this stream listens on
    pub fn channels(&self) -> impl Iterator<Item = &Channel> + '_ {
        self.registrations.iter().map(|(channel, _)| channel)
    }

    /// Takes an already-delivered event without waiting
    pub fn try_recv(&mut self) -> Option<Event> {
        self.inner.as_mut().try_recv().ok()
    }
}

impl Stream for SubscriptionStream {
    type Item = Event;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Event>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}

impl Drop for SubscriptionStream {
    fn drop(&mut self) {
        if let Some(broadcaster) = self.broadcaster.upgrade() {
            for (channel, id) in self.registrations.drain(..) {
                broadcaster.unsubscribe(&channel, id);
            }
        }
    }
}

impl std::fmt::Debug for SubscriptionStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriptionStream")
            .field("registrations", &self.registrations)
            .finish()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "non-string panic payload"
    }
}

/// Typed channel addressing
///
/// Channels replace string keys with a sum type. [`Channel::key`] renders the
/// string form used on the wire and [`Channel::parse`] reads it back, for
/// transports that receive channel names from clients.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value as JsonValue;
use std::fmt;
use uuid::Uuid;

/// Kind of mutation an event reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    #[serde(rename = "task:created")]
    TaskCreated,
    #[serde(rename = "task:updated")]
    TaskUpdated,
    #[serde(rename = "task:deleted")]
    TaskDeleted,
    #[serde(rename = "comment:added")]
    CommentAdded,
    #[serde(rename = "project:updated")]
    ProjectUpdated,
    #[serde(rename = "user:assigned")]
    UserAssigned,
    #[serde(rename = "notification:created")]
    NotificationCreated,
}

impl EventKind {
    pub const ALL: [EventKind; 7] = [
        EventKind::TaskCreated,
        EventKind::TaskUpdated,
        EventKind::TaskDeleted,
        EventKind::CommentAdded,
        EventKind::ProjectUpdated,
        EventKind::UserAssigned,
        EventKind::NotificationCreated,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::TaskCreated => "task:created",
            EventKind::TaskUpdated => "task:updated",
            EventKind::TaskDeleted => "task:deleted",
            EventKind::CommentAdded => "comment:added",
            EventKind::ProjectUpdated => "project:updated",
            EventKind::UserAssigned => "user:assigned",
            EventKind::NotificationCreated => "notification:created",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == s)
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Address of a stream of events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    /// Events scoped to one project
    Project(Uuid, EventKind),

    /// Events addressed to one user
    User(Uuid, EventKind),
}

impl Channel {
    pub fn project(project_id: Uuid, kind: EventKind) -> Self {
        Channel::Project(project_id, kind)
    }

    pub fn user(user_id: Uuid, kind: EventKind) -> Self {
        Channel::User(user_id, kind)
    }

    pub fn kind(&self) -> EventKind {
        match self {
            Channel::Project(_, kind) | Channel::User(_, kind) => *kind,
        }
    }

    /// String key, e.g. `project:{id}:task:created`
    pub fn key(&self) -> String {
        self.to_string()
    }

    /// Parses a string key produced by [`Channel::key`]
    ///
    /// # Example
    ///
    /// ```
    /// use taskflow_shared::events::{Channel, EventKind};
    /// use uuid::Uuid;
    ///
    /// let channel = Channel::user(Uuid::new_v4(), EventKind::NotificationCreated);
    /// assert_eq!(Channel::parse(&channel.key()), Some(channel));
    /// assert_eq!(Channel::parse("team:1:task:created"), None);
    /// ```
    pub fn parse(key: &str) -> Option<Self> {
        let mut parts = key.splitn(3, ':');
        let scope = parts.next()?;
        let id = Uuid::parse_str(parts.next()?).ok()?;
        let kind = EventKind::parse(parts.next()?)?;

        match scope {
            "project" => Some(Channel::Project(id, kind)),
            "user" => Some(Channel::User(id, kind)),
            _ => None,
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Channel::Project(id, kind) => write!(f, "project:{}:{}", id, kind),
            Channel::User(id, kind) => write!(f, "user:{}:{}", id, kind),
        }
    }
}

impl Serialize for Channel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Envelope delivered to subscribers
#[derive(Debug, Clone, Serialize)]
pub struct Event {
    /// Channel the event was published on
    pub channel: Channel,

    #[serde(rename = "type")]
    pub kind: EventKind,

    /// Serialized entity (or id) the event is about
    pub payload: JsonValue,

    pub timestamp: DateTime<Utc>,
}

impl Event {
    pub fn new(channel: Channel, payload: JsonValue) -> Self {
        Event {
            channel,
            kind: channel.kind(),
            payload,
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_key_format() {
        let id = Uuid::nil();
        let channel = Channel::project(id, EventKind::TaskCreated);
        assert_eq!(channel.key(), format!("project:{}:task:created", id));

        let channel = Channel::user(id, EventKind::NotificationCreated);
        assert_eq!(channel.key(), format!("user:{}:notification:created", id));
    }

    #[test]
    fn test_channel_parse_roundtrip_for_every_kind() {
        let id = Uuid::new_v4();
        for kind in EventKind::ALL {
            let project = Channel::project(id, kind);
            assert_eq!(Channel::parse(&project.key()), Some(project));
        }
    }

    #[test]
    fn test_channel_parse_rejects_garbage() {
        assert_eq!(Channel::parse(""), None);
        assert_eq!(Channel::parse("project:not-a-uuid:task:created"), None);
        assert_eq!(
            Channel::parse(&format!("project:{}:task:exploded", Uuid::nil())),
            None
        );
    }

    #[test]
    fn test_event_serialization() {
        let channel = Channel::project(Uuid::nil(), EventKind::CommentAdded);
        let event = Event::new(channel, serde_json::json!({"id": 1}));
        let value = serde_json::to_value(&event).unwrap();

        assert_eq!(value["type"], "comment:added");
        assert_eq!(value["channel"], channel.key());
        assert_eq!(value["payload"]["id"], 1);
    }
}

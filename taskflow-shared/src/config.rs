/// Store configuration
///
/// Tunables for read defaults. Loaded by the composition root (see the
/// `taskflow-server` crate) and handed to [`crate::Database::with_config`].

use serde::{Deserialize, Serialize};

/// Default number of activity entries returned by a feed read
pub const DEFAULT_ACTIVITY_LIMIT: usize = 50;

/// Default number of notifications returned by a notification read
pub const DEFAULT_NOTIFICATION_LIMIT: usize = 50;

/// Store configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Feed size used when `get_activities_by_project` gets no limit
    #[serde(default = "default_activity_limit")]
    pub default_activity_limit: usize,

    /// Page size used when `get_notifications_by_user` gets no limit
    #[serde(default = "default_notification_limit")]
    pub default_notification_limit: usize,
}

fn default_activity_limit() -> usize {
    DEFAULT_ACTIVITY_LIMIT
}

fn default_notification_limit() -> usize {
    DEFAULT_NOTIFICATION_LIMIT
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            default_activity_limit: DEFAULT_ACTIVITY_LIMIT,
            default_notification_limit: DEFAULT_NOTIFICATION_LIMIT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = StoreConfig::default();
        assert_eq!(config.default_activity_limit, 50);
        assert_eq!(config.default_notification_limit, 50);
    }

    #[test]
    fn test_deserialize_fills_missing_fields() {
        let config: StoreConfig =
            serde_json::from_str(r#"{"default_activity_limit": 10}"#).unwrap();
        assert_eq!(config.default_activity_limit, 10);
        assert_eq!(config.default_notification_limit, 50);
    }
}

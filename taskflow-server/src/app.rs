/// Shared application state
///
/// Bundles the store, the session registry and the event broadcaster so a
/// transport layer can clone one handle per connection.
///
/// # Example
///
/// ```no_run
/// use taskflow_server::{app::AppState, config::ServerConfig};
///
/// # async fn example() -> anyhow::Result<()> {
/// let state = AppState::new(ServerConfig::from_env()?);
/// let users = state.db.read().await.list_users().len();
/// println!("{users} users");
/// # Ok(())
/// # }
/// ```

use crate::config::ServerConfig;
use std::sync::Arc;
use taskflow_shared::auth::SessionRegistry;
use taskflow_shared::events::EventBroadcaster;
use taskflow_shared::models::user::User;
use taskflow_shared::{Database, SharedDatabase, StoreResult};
use tokio::sync::Mutex;
use uuid::Uuid;

/// Shared application state
///
/// Cheap to clone; every field is reference counted.
#[derive(Clone)]
pub struct AppState {
    /// Entity store
    pub db: SharedDatabase,

    /// Active login sessions
    pub sessions: Arc<Mutex<SessionRegistry>>,

    /// Broadcaster the store publishes to
    pub broadcaster: Arc<EventBroadcaster>,

    /// Server configuration
    pub config: Arc<ServerConfig>,
}

impl AppState {
    /// Creates a fresh, empty state from configuration
    pub fn new(config: ServerConfig) -> Self {
        let broadcaster = Arc::new(EventBroadcaster::new());
        let db = Database::with_broadcaster(config.store.clone(), broadcaster.clone()).into_shared();

        Self {
            db,
            sessions: Arc::new(Mutex::new(SessionRegistry::new())),
            broadcaster,
            config: Arc::new(config),
        }
    }

    /// Starts a session for an existing user and records the login time
    pub async fn open_session(&self, user_id: Uuid) -> StoreResult<String> {
        self.db.write().await.touch_user(user_id)?;
        let token = self.sessions.lock().await.create_session(user_id);
        tracing::info!(user_id = %user_id, "Session opened");
        Ok(token)
    }

    /// Resolves a session token to its user
    ///
    /// Returns `None` for unknown or expired tokens, and for tokens whose
    /// user no longer exists.
    pub async fn resolve_session(&self, token: &str) -> Option<User> {
        let user_id = self.sessions.lock().await.validate_session(token)?;
        self.db.read().await.get_user(user_id).cloned()
    }

    /// Ends a session
    pub async fn close_session(&self, token: &str) -> bool {
        self.sessions.lock().await.revoke_session(token)
    }
}

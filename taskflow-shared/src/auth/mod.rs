/// Session and authorization utilities
///
/// The store itself trusts the caller-supplied identity. This module provides
/// the two pieces a transport layer needs to establish that identity and to
/// gate mutations on it:
///
/// # Modules
///
/// - [`session`]: Opaque session tokens with a fixed 24 hour lifetime
/// - [`authorization`]: Project access and ownership checks
///
/// # Example
///
/// ```
/// use taskflow_shared::auth::session::SessionRegistry;
/// use uuid::Uuid;
///
/// let mut sessions = SessionRegistry::new();
/// let user_id = Uuid::new_v4();
///
/// let token = sessions.create_session(user_id);
/// assert_eq!(sessions.validate_session(&token), Some(user_id));
///
/// assert!(sessions.revoke_session(&token));
/// assert_eq!(sessions.validate_session(&token), None);
/// ```

pub mod authorization;
pub mod session;

pub use authorization::{require_project_access, require_project_owner, require_task_delete_permission};
pub use session::{SessionRegistry, SESSION_TTL_HOURS};

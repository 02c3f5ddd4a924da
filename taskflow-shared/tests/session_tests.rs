/// Integration tests for session expiry

use chrono::{Duration, Utc};
use taskflow_shared::auth::SessionRegistry;
use uuid::Uuid;

#[test]
fn test_session_valid_before_expiry_and_evicted_after() {
    let mut sessions = SessionRegistry::new();
    let user_id = Uuid::new_v4();
    let t = Utc::now();
    let token = sessions.create_session_at(user_id, t);

    assert_eq!(sessions.validate_session_at(&token, t + Duration::hours(23)), Some(user_id));
    assert_eq!(sessions.len(), 1);

    assert_eq!(sessions.validate_session_at(&token, t + Duration::hours(25)), None);
    assert!(sessions.is_empty());

    // evicted for good, even at a time it would have been valid
    assert_eq!(sessions.validate_session_at(&token, t), None);
}

#[test]
fn test_sessions_are_independent() {
    let mut sessions = SessionRegistry::new();
    let alice = Uuid::new_v4();
    let bob = Uuid::new_v4();

    let a = sessions.create_session(alice);
    let b = sessions.create_session(bob);

    assert!(sessions.revoke_session(&a));
    assert_eq!(sessions.validate_session(&a), None);
    assert_eq!(sessions.validate_session(&b), Some(bob));
}

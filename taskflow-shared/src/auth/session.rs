/// Session registry
///
/// Maps opaque session tokens to user ids. Tokens are handed to the client
/// once; the registry keeps only their SHA-256 digest.
///
/// # Token Format
///
/// `tf_` followed by 32 base62 characters (35 chars total).
///
/// # Expiry
///
/// Every session expires [`SESSION_TTL_HOURS`] after creation. There is no
/// refresh and no background sweep: an expired session is evicted the next
/// time it is looked up.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use uuid::Uuid;

/// Session lifetime
pub const SESSION_TTL_HOURS: i64 = 24;

/// Length of the random part of the token (characters)
const TOKEN_RANDOM_LENGTH: usize = 32;

/// Session token prefix
const TOKEN_PREFIX: &str = "tf_";

/// Total length of a session token (prefix + random)
pub const SESSION_TOKEN_LENGTH: usize = TOKEN_PREFIX.len() + TOKEN_RANDOM_LENGTH;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Session {
    user_id: Uuid,
    expires_at: DateTime<Utc>,
}

/// In-memory session store keyed by token digest
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: HashMap<String, Session>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a session for `user_id` and returns its plaintext token
    pub fn create_session(&mut self, user_id: Uuid) -> String {
        self.create_session_at(user_id, Utc::now())
    }

    /// Creates a session as if the current time were `now`
    pub fn create_session_at(&mut self, user_id: Uuid, now: DateTime<Utc>) -> String {
        let token = format!("{}{}", TOKEN_PREFIX, generate_random_string(TOKEN_RANDOM_LENGTH));
        let expires_at = now + Duration::hours(SESSION_TTL_HOURS);

        self.sessions.insert(hash_token(&token), Session { user_id, expires_at });
        tracing::debug!(user_id = %user_id, expires_at = %expires_at, "Session created");

        token
    }

    /// Resolves `token` to its user id
    ///
    /// Returns `None` for unknown or expired tokens. An expired session is
    /// removed as a side effect.
    pub fn validate_session(&mut self, token: &str) -> Option<Uuid> {
        self.validate_session_at(token, Utc::now())
    }

    /// Resolves `token` as if the current time were `now`
    pub fn validate_session_at(&mut self, token: &str, now: DateTime<Utc>) -> Option<Uuid> {
        let digest = hash_token(token);
        let session = *self.sessions.get(&digest)?;

        if session.expires_at < now {
            self.sessions.remove(&digest);
            tracing::debug!(user_id = %session.user_id, "Expired session evicted");
            return None;
        }

        Some(session.user_id)
    }

    /// Removes the session for `token` (logout)
    ///
    /// Returns `false` if no such session exists.
    pub fn revoke_session(&mut self, token: &str) -> bool {
        self.sessions.remove(&hash_token(token)).is_some()
    }

    /// Number of stored sessions, including expired ones not yet evicted
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

/// Generates a random alphanumeric string
fn generate_random_string(length: usize) -> String {
    const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
    let mut rng = rand::thread_rng();

    (0..length)
        .map(|_| {
            let idx = rng.gen_range(0..CHARSET.len());
            CHARSET[idx] as char
        })
        .collect()
}

/// Hex-encoded SHA-256 digest of a token
fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

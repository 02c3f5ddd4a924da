/// User model
///
/// Users are created once at registration and mutated by profile updates and
/// the `last_active` touch on login. Users are never deleted.
///
/// Emails are unique case-insensitively (stored lowercased); usernames are
/// unique and restricted to `[A-Za-z0-9_]` so that `@username` mentions can
/// resolve them.
///
/// # Example
///
/// ```
/// use taskflow_shared::Database;
/// use taskflow_shared::models::{CreateUser, UserRole};
///
/// let mut db = Database::new();
/// let user = db.create_user(CreateUser {
///     email: "Alice@Example.com".to_string(),
///     username: "alice".to_string(),
///     first_name: "Alice".to_string(),
///     last_name: "Liddell".to_string(),
///     avatar: None,
///     role: UserRole::Member,
///     preferences: Default::default(),
/// })?;
///
/// assert_eq!(user.email, "alice@example.com");
/// assert!(db.get_user_by_username("alice").is_some());
/// # Ok::<(), taskflow_shared::StoreError>(())
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::double_option;

/// Global role of a user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    Manager,
    #[default]
    Member,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Manager => "manager",
            UserRole::Member => "member",
        }
    }
}

/// UI theme preference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

/// Per-user preferences
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPreferences {
    pub theme: Theme,

    /// Whether the user wants notifications at all
    pub notifications: bool,

    /// IANA timezone name
    pub timezone: String,
}

impl Default for UserPreferences {
    fn default() -> Self {
        Self {
            theme: Theme::Light,
            notifications: true,
            timezone: "UTC".to_string(),
        }
    }
}

/// User record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Unique user ID
    pub id: Uuid,

    /// Email address, stored lowercased
    pub email: String,

    /// Unique handle used for mentions
    pub username: String,

    pub first_name: String,
    pub last_name: String,

    /// Optional avatar URL
    pub avatar: Option<String>,

    pub role: UserRole,

    /// When the user registered
    pub created_at: DateTime<Utc>,

    /// Last login (or registration) time
    pub last_active: DateTime<Utc>,

    pub preferences: UserPreferences,
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Input for creating a new user
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateUser {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 1, max = 50, message = "Username must be 1-50 characters"))]
    pub username: String,

    #[validate(length(min = 1, max = 100, message = "First name must be 1-100 characters"))]
    pub first_name: String,

    #[validate(length(max = 100, message = "Last name must be at most 100 characters"))]
    pub last_name: String,

    #[serde(default)]
    pub avatar: Option<String>,

    #[serde(default)]
    pub role: UserRole,

    #[serde(default)]
    pub preferences: UserPreferences,
}

/// Input for updating an existing user
///
/// All fields are optional. Only non-None fields will be updated.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateUser {
    /// New email address
    #[validate(email(message = "Invalid email format"))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// New username
    #[validate(length(min = 1, max = 50, message = "Username must be 1-50 characters"))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[validate(length(min = 1, max = 100, message = "First name must be 1-100 characters"))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,

    #[validate(length(max = 100, message = "Last name must be at most 100 characters"))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,

    /// New avatar URL (use Some(None) to clear)
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub avatar: Option<Option<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<UserRole>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferences: Option<UserPreferences>,
}

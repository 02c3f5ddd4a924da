/// User operations
///
/// Emails are stored lowercased and looked up case-insensitively. Usernames
/// are case-sensitive since mentions resolve them verbatim. Both are unique.

use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use super::{trim_in_place, Database};
use crate::error::{EntityKind, StoreError, StoreResult};
use crate::mentions::is_mentionable_username;
use crate::models::{CreateUser, UpdateUser, User};

const USERNAME_CHARSET_MESSAGE: &str = "Username may only contain letters, digits and underscores";

impl Database {
    /// Registers a new user
    ///
    /// # Errors
    ///
    /// - `ValidationFailed` for malformed fields
    /// - `DuplicateKey` if the email or username is taken
    pub fn create_user(&mut self, mut data: CreateUser) -> StoreResult<User> {
        trim_in_place(&mut data.email);
        trim_in_place(&mut data.username);
        trim_in_place(&mut data.first_name);
        trim_in_place(&mut data.last_name);
        data.email = data.email.to_lowercase();

        data.validate()?;
        if !is_mentionable_username(&data.username) {
            return Err(StoreError::invalid("username", USERNAME_CHARSET_MESSAGE));
        }
        self.ensure_email_free(&data.email, None)?;
        self.ensure_username_free(&data.username, None)?;

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            email: data.email,
            username: data.username,
            first_name: data.first_name,
            last_name: data.last_name,
            avatar: data.avatar,
            role: data.role,
            created_at: now,
            last_active: now,
            preferences: data.preferences,
        };

        self.indexes.users_by_email.insert(user.email.clone(), user.id);
        self.indexes.users_by_username.insert(user.username.clone(), user.id);
        self.users.insert(user.id, user.clone());

        tracing::debug!(user_id = %user.id, username = %user.username, "User created");
        Ok(user)
    }

    pub fn get_user(&self, id: Uuid) -> Option<&User> {
        self.users.get(&id)
    }

    /// Case-insensitive email lookup
    pub fn get_user_by_email(&self, email: &str) -> Option<&User> {
        let id = self.indexes.users_by_email.get(&email.trim().to_lowercase())?;
        self.users.get(id)
    }

    pub fn get_user_by_username(&self, username: &str) -> Option<&User> {
        let id = self.indexes.users_by_username.get(username)?;
        self.users.get(id)
    }

    /// All users, sorted by username
    pub fn list_users(&self) -> Vec<&User> {
        let mut users: Vec<&User> = self.users.values().collect();
        users.sort_by(|a, b| a.username.cmp(&b.username));
        users
    }

    /// Applies a profile update
    ///
    /// Email and username changes are re-indexed.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the user does not exist
    /// - `ValidationFailed` for malformed fields
    /// - `DuplicateKey` if the new email or username belongs to another user
    pub fn update_user(&mut self, id: Uuid, mut changes: UpdateUser) -> StoreResult<User> {
        if !self.users.contains_key(&id) {
            return Err(StoreError::not_found(EntityKind::User, id));
        }

        for field in [
            &mut changes.email,
            &mut changes.username,
            &mut changes.first_name,
            &mut changes.last_name,
        ]
        .into_iter()
        .flatten()
        {
            trim_in_place(field);
        }
        if let Some(email) = changes.email.as_mut() {
            *email = email.to_lowercase();
        }

        changes.validate()?;
        if let Some(username) = &changes.username {
            if !is_mentionable_username(username) {
                return Err(StoreError::invalid("username", USERNAME_CHARSET_MESSAGE));
            }
            self.ensure_username_free(username, Some(id))?;
        }
        if let Some(email) = &changes.email {
            self.ensure_email_free(email, Some(id))?;
        }

        let Some(user) = self.users.get_mut(&id) else {
            return Err(StoreError::not_found(EntityKind::User, id));
        };

        if let Some(email) = changes.email {
            if email != user.email {
                self.indexes.users_by_email.remove(&user.email);
                self.indexes.users_by_email.insert(email.clone(), id);
                user.email = email;
            }
        }
        if let Some(username) = changes.username {
            if username != user.username {
                self.indexes.users_by_username.remove(&user.username);
                self.indexes.users_by_username.insert(username.clone(), id);
                user.username = username;
            }
        }
        if let Some(first_name) = changes.first_name {
            user.first_name = first_name;
        }
        if let Some(last_name) = changes.last_name {
            user.last_name = last_name;
        }
        if let Some(avatar) = changes.avatar {
            user.avatar = avatar;
        }
        if let Some(role) = changes.role {
            user.role = role;
        }
        if let Some(preferences) = changes.preferences {
            user.preferences = preferences;
        }

        tracing::debug!(user_id = %id, "User updated");
        Ok(user.clone())
    }

    /// Records activity for a user, typically on login
    pub fn touch_user(&mut self, id: Uuid) -> StoreResult<()> {
        let user = self
            .users
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found(EntityKind::User, id))?;
        user.last_active = Utc::now();
        Ok(())
    }

    fn ensure_email_free(&self, email: &str, owner: Option<Uuid>) -> StoreResult<()> {
        match self.indexes.users_by_email.get(email) {
            Some(existing) if Some(*existing) != owner => Err(StoreError::DuplicateKey {
                field: "email",
                value: email.to_string(),
            }),
            _ => Ok(()),
        }
    }

    fn ensure_username_free(&self, username: &str, owner: Option<Uuid>) -> StoreResult<()> {
        match self.indexes.users_by_username.get(username) {
            Some(existing) if Some(*existing) != owner => Err(StoreError::DuplicateKey {
                field: "username",
                value: username.to_string(),
            }),
            _ => Ok(()),
        }
    }
}

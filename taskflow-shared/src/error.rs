/// Error taxonomy for store operations
///
/// Every fallible store operation returns [`StoreResult`]. The calling layer is
/// responsible for mapping each variant to a user-facing status:
///
/// | Variant              | Typical HTTP status |
/// |----------------------|---------------------|
/// | `NotFound`           | 404                 |
/// | `CircularDependency` | 400                 |
/// | `Forbidden`          | 403                 |
/// | `ValidationFailed`   | 422                 |
/// | `DuplicateKey`       | 409                 |
///
/// A failed operation leaves the store exactly as it was before the call.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Store result type alias
pub type StoreResult<T> = Result<T, StoreError>;

/// Kind of entity referenced by a `NotFound` error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    User,
    Project,
    Task,
    Comment,
    Attachment,
    Notification,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::User => "user",
            EntityKind::Project => "project",
            EntityKind::Task => "task",
            EntityKind::Comment => "comment",
            EntityKind::Attachment => "attachment",
            EntityKind::Notification => "notification",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validation error detail
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationErrorDetail {
    /// Field that failed validation
    pub field: String,

    /// Error message
    pub message: String,
}

impl ValidationErrorDetail {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Store error type
#[derive(Debug, Error)]
pub enum StoreError {
    /// Referenced entity does not exist
    #[error("{entity} not found: {id}")]
    NotFound { entity: EntityKind, id: Uuid },

    /// The dependency edges would introduce a cycle
    ///
    /// `path` lists the task ids along the cycle, starting and ending at the
    /// same task.
    #[error("Circular dependency detected for task {task_id}")]
    CircularDependency { task_id: Uuid, path: Vec<Uuid> },

    /// Actor lacks rights for the mutation
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Malformed or out-of-range field values
    #[error("Validation failed: {} errors", .0.len())]
    ValidationFailed(Vec<ValidationErrorDetail>),

    /// Unique key collision (email, username)
    #[error("Duplicate {field}: {value}")]
    DuplicateKey { field: &'static str, value: String },
}

impl StoreError {
    pub fn not_found(entity: EntityKind, id: Uuid) -> Self {
        StoreError::NotFound { entity, id }
    }

    /// Single-field validation failure
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        StoreError::ValidationFailed(vec![ValidationErrorDetail::new(field, message)])
    }

    /// Short machine-readable code for the error kind
    pub fn code(&self) -> &'static str {
        match self {
            StoreError::NotFound { .. } => "not_found",
            StoreError::CircularDependency { .. } => "circular_dependency",
            StoreError::Forbidden(_) => "forbidden",
            StoreError::ValidationFailed(_) => "validation_failed",
            StoreError::DuplicateKey { .. } => "duplicate_key",
        }
    }
}

impl From<validator::ValidationErrors> for StoreError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut details: Vec<ValidationErrorDetail> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                let field = field.to_string();
                errs.iter().map(move |err| {
                    let message = err
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| err.code.to_string());
                    ValidationErrorDetail::new(field.clone(), message)
                })
            })
            .collect();

        // field_errors() is backed by a HashMap
        details.sort_by(|a, b| a.field.cmp(&b.field));
        StoreError::ValidationFailed(details)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct Sample {
        #[validate(length(min = 1, max = 5))]
        name: String,
        #[validate(email)]
        email: String,
    }

    #[test]
    fn test_error_display() {
        let id = Uuid::nil();
        let err = StoreError::not_found(EntityKind::Task, id);
        assert_eq!(err.to_string(), format!("task not found: {}", id));

        let err = StoreError::DuplicateKey {
            field: "email",
            value: "a@b.c".to_string(),
        };
        assert_eq!(err.to_string(), "Duplicate email: a@b.c");
    }

    #[test]
    fn test_validation_failed_counts_details() {
        let err = StoreError::ValidationFailed(vec![
            ValidationErrorDetail::new("title", "too long"),
            ValidationErrorDetail::new("email", "invalid"),
        ]);
        assert_eq!(err.to_string(), "Validation failed: 2 errors");
        assert_eq!(err.code(), "validation_failed");
    }

    #[test]
    fn test_from_validation_errors() {
        let sample = Sample {
            name: "much too long".to_string(),
            email: "not-an-email".to_string(),
        };

        let err: StoreError = sample.validate().unwrap_err().into();
        match err {
            StoreError::ValidationFailed(details) => {
                let fields: Vec<_> = details.iter().map(|d| d.field.as_str()).collect();
                assert_eq!(fields, vec!["email", "name"]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}

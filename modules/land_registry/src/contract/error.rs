//! Contract error types for the land registry
//!
//! These errors are transport-agnostic and used for inter-module communication.
//! Assignment conflicts are NOT errors, see `AssignmentOutcome::Conflicts`.

/// Land registry domain errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// Farmer, mayor or parcel not found
    #[error("{resource} not found: {id}")]
    NotFound {
        /// Resource type (farmer, mayor, parcel)
        resource: String,
        /// Resource identifier
        id: String,
    },

    /// Malformed input
    #[error("Validation error: {message}")]
    Validation { message: String },

    /// Desired parcel IDs that do not exist in the farmer's village
    #[error("Invalid parcel IDs for this village: {}", ids.join(", "))]
    InvalidParcelIds { ids: Vec<String> },

    /// Duplicate unique value on create or update
    #[error("{field} '{value}' is already in use")]
    UniquenessViolation { field: String, value: String },

    /// Caller role or village does not permit the operation
    #[error("Forbidden: {reason}")]
    Forbidden { reason: String },

    /// A parcel changed between planning and commit; the call may be retried
    #[error("Parcels changed concurrently: {}", parcel_ids.join(", "))]
    StaleAssignment { parcel_ids: Vec<String> },

    /// Persistence failure
    #[error("Store error")]
    Store,
}

impl RegistryError {
    pub fn not_found(resource: &str, id: impl ToString) -> Self {
        Self::NotFound {
            resource: resource.to_string(),
            id: id.to_string(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn forbidden(reason: impl Into<String>) -> Self {
        Self::Forbidden {
            reason: reason.into(),
        }
    }

    /// Whether retrying the same call can succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Store | Self::StaleAssignment { .. })
    }
}

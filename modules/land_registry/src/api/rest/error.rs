//! HTTP error mapping to RFC-9457 Problem Details

use crate::contract::RegistryError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

/// RFC-9457 Problem Details for HTTP API errors
#[derive(Debug, Serialize, Deserialize)]
pub struct Problem {
    /// A URI reference that identifies the problem type
    #[serde(rename = "type")]
    pub type_uri: String,

    /// A short, human-readable summary of the problem type
    pub title: String,

    /// The HTTP status code
    pub status: u16,

    /// A human-readable explanation specific to this occurrence
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,

    /// Identifiers involved in the problem (parcel IDs for assignment errors)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ids: Vec<String>,
}

impl Problem {
    /// Create a new Problem Details response
    pub fn new(status: StatusCode, title: impl Into<String>) -> Self {
        Self {
            type_uri: format!("https://httpstatuses.io/{}", status.as_u16()),
            title: title.into(),
            status: status.as_u16(),
            detail: None,
            ids: Vec::new(),
        }
    }

    /// Add detail message
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn with_ids(mut self, ids: Vec<String>) -> Self {
        self.ids = ids;
        self
    }
}

impl IntoResponse for Problem {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self)).into_response()
    }
}

/// Map domain errors to HTTP Problem Details
pub fn map_domain_error(error: RegistryError) -> Problem {
    match error {
        RegistryError::NotFound { resource, id } => {
            Problem::new(StatusCode::NOT_FOUND, format!("{} Not Found", resource))
                .with_detail(format!("{} with id '{}' was not found", resource, id))
        }

        RegistryError::Validation { message } => {
            Problem::new(StatusCode::BAD_REQUEST, "Validation Error").with_detail(message)
        }

        RegistryError::InvalidParcelIds { ids } => {
            Problem::new(StatusCode::BAD_REQUEST, "Invalid Parcel IDs")
                .with_detail(format!(
                    "Invalid parcel IDs for this village: {}",
                    ids.join(", ")
                ))
                .with_ids(ids)
        }

        RegistryError::UniquenessViolation { field, value } => {
            Problem::new(StatusCode::CONFLICT, "Already In Use")
                .with_detail(format!("{} '{}' is already in use", field, value))
        }

        RegistryError::Forbidden { reason } => {
            Problem::new(StatusCode::FORBIDDEN, "Forbidden").with_detail(reason)
        }

        RegistryError::StaleAssignment { parcel_ids } => {
            Problem::new(StatusCode::CONFLICT, "Stale Assignment")
                .with_detail("Parcels changed while the assignment was being applied; retry")
                .with_ids(parcel_ids)
        }

        RegistryError::Store => Problem::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Internal Server Error",
        )
        .with_detail("An unexpected error occurred"),
    }
}

// Centralized error handling for the credential service

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use thiserror::Error;
use tracing::error;

use crate::models::auth::ErrorResponse;

/// Unique columns of the user store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniqueField {
    Username,
    Email,
}

impl std::fmt::Display for UniqueField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UniqueField::Username => f.write_str("username"),
            UniqueField::Email => f.write_str("email"),
        }
    }
}

/// Errors returned by a user store
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Duplicate {0}")]
    Duplicate(UniqueField),

    #[error("Store failure: {0:#}")]
    Backend(#[from] anyhow::Error),
}

/// Reasons a bearer token is rejected
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("Missing bearer token")]
    Missing,

    #[error("Token has expired")]
    Expired,

    #[error("Invalid token signature")]
    InvalidSignature,

    #[error("Malformed token: {0}")]
    Malformed(String),
}

/// Errors surfaced by the credential service
#[derive(Error, Debug)]
pub enum CredentialError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Invalid Email")]
    InvalidEmail,

    #[error("Invalid Password")]
    InvalidPassword,

    #[error(transparent)]
    Unauthorized(#[from] TokenError),

    /// Unexpected failure; `context` is the only text the caller sees
    #[error("{context}")]
    Internal {
        context: &'static str,
        #[source]
        source: anyhow::Error,
    },
}

impl CredentialError {
    pub fn internal(context: &'static str, source: impl Into<anyhow::Error>) -> Self {
        CredentialError::Internal {
            context,
            source: source.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            CredentialError::Validation(_) => StatusCode::BAD_REQUEST,
            CredentialError::Conflict(_) => StatusCode::BAD_REQUEST,
            CredentialError::InvalidEmail => StatusCode::UNAUTHORIZED,
            CredentialError::InvalidPassword => StatusCode::UNAUTHORIZED,
            CredentialError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            CredentialError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for CredentialError {
    fn into_response(self) -> Response {
        if let CredentialError::Internal { context, source } = &self {
            error!(error = ?source, "{}", context);
        }

        (
            self.status(),
            Json(ErrorResponse {
                message: self.to_string(),
            }),
        )
            .into_response()
    }
}

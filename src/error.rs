// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::store::StoreError;

/// Errors returned by gateway operations that are not plain verification
/// failures (those are `None` or [`crate::auth::TokenError`]).
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("principal '{0}' already exists")]
    AlreadyExists(String),

    #[error("principal '{0}' not found")]
    NotFound(String),

    #[error("API key is already assigned to another principal")]
    KeyCollision,

    #[error("principal '{0}' already holds an API key")]
    KeyAlreadyAssigned(String),

    #[error("authentication failed")]
    AuthFailure,

    /// Every attempt to mint a unique API key collided. Treated as fatal.
    #[error("API key generation exhausted after {attempts} attempts")]
    KeyGenerationExhausted { attempts: usize },

    #[error("secure random source unavailable")]
    EntropyUnavailable,

    #[error("token signing failed: {0}")]
    TokenSigning(#[from] jsonwebtoken::errors::Error),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    error_code: &'static str,
}

impl GatewayError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            GatewayError::InvalidInput(_) => "invalid_input",
            GatewayError::AlreadyExists(_) => "already_exists",
            GatewayError::NotFound(_) => "not_found",
            GatewayError::KeyCollision => "key_collision",
            GatewayError::KeyAlreadyAssigned(_) => "key_already_assigned",
            GatewayError::AuthFailure => "auth_failure",
            GatewayError::KeyGenerationExhausted { .. } => "key_generation_exhausted",
            GatewayError::EntropyUnavailable => "entropy_unavailable",
            GatewayError::TokenSigning(_) => "token_signing_failed",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            GatewayError::AlreadyExists(_)
            | GatewayError::KeyCollision
            | GatewayError::KeyAlreadyAssigned(_) => StatusCode::CONFLICT,
            GatewayError::NotFound(_) => StatusCode::NOT_FOUND,
            GatewayError::AuthFailure => StatusCode::UNAUTHORIZED,
            GatewayError::KeyGenerationExhausted { .. }
            | GatewayError::EntropyUnavailable
            | GatewayError::TokenSigning(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<StoreError> for GatewayError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::AlreadyExists(id) => GatewayError::AlreadyExists(id),
            StoreError::NotFound(id) => GatewayError::NotFound(id),
            StoreError::KeyCollision => GatewayError::KeyCollision,
            StoreError::KeyAlreadyAssigned(id) => GatewayError::KeyAlreadyAssigned(id),
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        // Internal failure details stay in the logs.
        let error = if status.is_server_error() {
            "internal error".to_string()
        } else {
            self.to_string()
        };
        let body = Json(ErrorBody {
            error,
            error_code: self.error_code(),
        });
        (status, body).into_response()
    }
}

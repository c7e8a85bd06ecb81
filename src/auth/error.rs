// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication errors.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Why a bearer token was rejected.
///
/// The distinction is for logs only; callers see a uniform 401.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TokenError {
    /// Token structure, encoding, algorithm or claims could not be parsed.
    #[error("token is malformed")]
    Malformed,
    /// The MAC does not match the header and payload.
    #[error("token signature is invalid")]
    InvalidSignature,
    /// The token's expiry has passed.
    #[error("token has expired")]
    Expired,
}

/// Authentication failure surfaced to the HTTP layer.
///
/// Bad passwords, unknown principals and unknown API keys all collapse into
/// [`AuthError::InvalidCredentials`] so responses never reveal which part
/// was wrong.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("authentication credentials are required")]
    MissingCredentials,

    #[error("invalid authorization header format")]
    InvalidAuthHeader,

    #[error("credentials scheme is not accepted here")]
    UnsupportedScheme,

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("invalid or expired token")]
    Token(#[source] TokenError),

    #[error("internal authentication error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
struct AuthErrorBody {
    error: String,
    error_code: &'static str,
}

impl AuthError {
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::MissingCredentials => "missing_credentials",
            AuthError::InvalidAuthHeader => "invalid_auth_header",
            AuthError::UnsupportedScheme => "unsupported_scheme",
            AuthError::InvalidCredentials => "invalid_credentials",
            AuthError::Token(_) => "invalid_token",
            AuthError::Internal(_) => "internal_error",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::UNAUTHORIZED,
        }
    }
}

impl From<TokenError> for AuthError {
    fn from(err: TokenError) -> Self {
        AuthError::Token(err)
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error = match &self {
            AuthError::Internal(_) => "internal error".to_string(),
            other => other.to_string(),
        };
        let body = Json(AuthErrorBody {
            error,
            error_code: self.error_code(),
        });
        (status, body).into_response()
    }
}

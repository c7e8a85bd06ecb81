// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractors for authenticated principals.
//!
//! Each extractor reads one credential scheme and rejects the request with
//! [`AuthError`] (401) when it is missing or invalid. Routes that need more
//! than one scheme list several extractors:
//!
//! ```rust,ignore
//! async fn list_users(
//!     BasicAuth(user): BasicAuth,
//!     ApiKeyAuth(_): ApiKeyAuth,
//!     State(state): State<GatewayState>,
//! ) -> Json<Vec<String>> {
//!     Json(state.gateway.principal_ids())
//! }
//! ```

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{
        header::{HeaderMap, AUTHORIZATION},
        request::Parts,
    },
};
use base64ct::{Base64, Encoding};

use super::{AuthError, AuthScheme, Authenticator, Credentials, Principal};
use crate::state::GatewayState;

/// Header carrying opaque API keys.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Principal verified from `Authorization: Basic`.
///
/// Password verification runs on the blocking pool.
pub struct BasicAuth(pub Principal);

/// Principal verified from the `x-api-key` header.
pub struct ApiKeyAuth(pub Principal);

/// Principal verified from `Authorization: Bearer`.
pub struct BearerAuth(pub Principal);

impl<S> FromRequestParts<S> for BasicAuth
where
    GatewayState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(principal) = verified_in_extensions(parts, AuthScheme::Basic) {
            return Ok(BasicAuth(principal));
        }

        let credentials = basic_credentials(&parts.headers)?;
        let authenticator = GatewayState::from_ref(state).basic();

        let principal = tokio::task::spawn_blocking(move || authenticator.authenticate(&credentials))
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Password verification task failed");
                AuthError::Internal(format!("password verification task failed: {e}"))
            })??;

        parts.extensions.insert(principal.clone());
        Ok(BasicAuth(principal))
    }
}

impl<S> FromRequestParts<S> for ApiKeyAuth
where
    GatewayState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(principal) = verified_in_extensions(parts, AuthScheme::ApiKey) {
            return Ok(ApiKeyAuth(principal));
        }

        let credentials = api_key_credentials(&parts.headers)?;
        let principal = GatewayState::from_ref(state)
            .api_key()
            .authenticate(&credentials)?;

        parts.extensions.insert(principal.clone());
        Ok(ApiKeyAuth(principal))
    }
}

impl<S> FromRequestParts<S> for BearerAuth
where
    GatewayState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(principal) = verified_in_extensions(parts, AuthScheme::Bearer) {
            return Ok(BearerAuth(principal));
        }

        let credentials = bearer_credentials(&parts.headers)?;
        let principal = GatewayState::from_ref(state)
            .bearer()
            .authenticate(&credentials)?;

        parts.extensions.insert(principal.clone());
        Ok(BearerAuth(principal))
    }
}

/// A principal already verified for this request under `scheme`.
fn verified_in_extensions(parts: &Parts, scheme: AuthScheme) -> Option<Principal> {
    parts
        .extensions
        .get::<Principal>()
        .filter(|principal| principal.scheme() == scheme)
        .cloned()
}

/// Split `Authorization: <scheme> <value>`, matching the scheme
/// case-insensitively.
fn authorization_value<'a>(headers: &'a HeaderMap, scheme: &str) -> Result<&'a str, AuthError> {
    let header = headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingCredentials)?
        .to_str()
        .map_err(|_| AuthError::InvalidAuthHeader)?;

    let (given, value) = header
        .trim()
        .split_once(' ')
        .ok_or(AuthError::InvalidAuthHeader)?;
    if !given.eq_ignore_ascii_case(scheme) {
        return Err(AuthError::InvalidAuthHeader);
    }

    let value = value.trim();
    if value.is_empty() {
        return Err(AuthError::InvalidAuthHeader);
    }
    Ok(value)
}

/// Parse `Authorization: Basic base64(username:password)`.
pub fn basic_credentials(headers: &HeaderMap) -> Result<Credentials, AuthError> {
    let encoded = authorization_value(headers, "Basic")?;
    let decoded = Base64::decode_vec(encoded).map_err(|_| AuthError::InvalidAuthHeader)?;
    let decoded = String::from_utf8(decoded).map_err(|_| AuthError::InvalidAuthHeader)?;

    let (username, password) = decoded
        .split_once(':')
        .ok_or(AuthError::InvalidAuthHeader)?;
    Ok(Credentials::Basic {
        username: username.to_string(),
        password: password.to_string(),
    })
}

/// Read the `x-api-key` header.
pub fn api_key_credentials(headers: &HeaderMap) -> Result<Credentials, AuthError> {
    let key = headers
        .get(API_KEY_HEADER)
        .ok_or(AuthError::MissingCredentials)?
        .to_str()
        .map_err(|_| AuthError::InvalidAuthHeader)?
        .trim();
    if key.is_empty() {
        return Err(AuthError::MissingCredentials);
    }
    Ok(Credentials::ApiKey(key.to_string()))
}

/// Parse `Authorization: Bearer <token>`.
pub fn bearer_credentials(headers: &HeaderMap) -> Result<Credentials, AuthError> {
    let token = authorization_value(headers, "Bearer")?;
    Ok(Credentials::Bearer(token.to_string()))
}

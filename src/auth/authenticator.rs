// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Per-scheme authenticators.
//!
//! Each route composes the authenticators it needs explicitly. An
//! authenticator accepts exactly one kind of [`Credentials`] and rejects
//! the others with [`AuthError::UnsupportedScheme`].

use std::fmt;
use std::sync::Arc;

use super::claims::{AuthScheme, Principal};
use super::error::AuthError;
use super::gateway::AuthGateway;

/// Credentials pulled from a request by the HTTP layer.
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    Basic { username: String, password: String },
    ApiKey(String),
    Bearer(String),
}

impl Credentials {
    pub fn scheme(&self) -> AuthScheme {
        match self {
            Credentials::Basic { .. } => AuthScheme::Basic,
            Credentials::ApiKey(_) => AuthScheme::ApiKey,
            Credentials::Bearer(_) => AuthScheme::Bearer,
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credentials::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .field("password", &"[REDACTED]")
                .finish(),
            Credentials::ApiKey(_) => f.write_str("ApiKey([REDACTED])"),
            Credentials::Bearer(_) => f.write_str("Bearer([REDACTED])"),
        }
    }
}

/// Verifies one credential scheme.
pub trait Authenticator: Send + Sync {
    fn authenticate(&self, credentials: &Credentials) -> Result<Principal, AuthError>;
}

/// Username and password against stored hashes.
///
/// Runs a full PBKDF2 verification; async callers should move it off the
/// executor (see [`super::extractor::BasicAuth`]).
#[derive(Clone)]
pub struct BasicAuthenticator {
    gateway: Arc<AuthGateway>,
}

impl BasicAuthenticator {
    pub fn new(gateway: Arc<AuthGateway>) -> Self {
        Self { gateway }
    }
}

impl Authenticator for BasicAuthenticator {
    fn authenticate(&self, credentials: &Credentials) -> Result<Principal, AuthError> {
        match credentials {
            Credentials::Basic { username, password } => self
                .gateway
                .verify_basic(username, password)
                .ok_or(AuthError::InvalidCredentials),
            _ => Err(AuthError::UnsupportedScheme),
        }
    }
}

/// Opaque API key lookup.
#[derive(Clone)]
pub struct ApiKeyAuthenticator {
    gateway: Arc<AuthGateway>,
}

impl ApiKeyAuthenticator {
    pub fn new(gateway: Arc<AuthGateway>) -> Self {
        Self { gateway }
    }
}

impl Authenticator for ApiKeyAuthenticator {
    fn authenticate(&self, credentials: &Credentials) -> Result<Principal, AuthError> {
        match credentials {
            Credentials::ApiKey(key) => self
                .gateway
                .verify_api_key(key)
                .ok_or(AuthError::InvalidCredentials),
            _ => Err(AuthError::UnsupportedScheme),
        }
    }
}

/// Signed bearer token verification.
#[derive(Clone)]
pub struct BearerAuthenticator {
    gateway: Arc<AuthGateway>,
}

impl BearerAuthenticator {
    pub fn new(gateway: Arc<AuthGateway>) -> Self {
        Self { gateway }
    }
}

impl Authenticator for BearerAuthenticator {
    fn authenticate(&self, credentials: &Credentials) -> Result<Principal, AuthError> {
        match credentials {
            Credentials::Bearer(token) => Ok(self.gateway.verify_token(token)?),
            _ => Err(AuthError::UnsupportedScheme),
        }
    }
}

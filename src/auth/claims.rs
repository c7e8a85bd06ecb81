// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Token claims and the verified principal representation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Value of the `type` claim on access tokens.
pub const ACCESS_TOKEN_TYPE: &str = "access";

/// Claims carried in a signed access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject (principal identifier)
    pub sub: String,
    /// Issued at, seconds since the Unix epoch
    pub iat: i64,
    /// Expiration, seconds since the Unix epoch
    pub exp: i64,
    /// Unique token identifier (UUIDv4)
    pub jti: String,
    /// Token type, always `access` for tokens this crate issues
    #[serde(rename = "type")]
    pub token_type: String,
}

/// How a principal proved its identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthScheme {
    /// Username and password
    Basic,
    /// Opaque API key
    ApiKey,
    /// Signed bearer token
    Bearer,
}

impl std::fmt::Display for AuthScheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthScheme::Basic => write!(f, "basic"),
            AuthScheme::ApiKey => write!(f, "api_key"),
            AuthScheme::Bearer => write!(f, "bearer"),
        }
    }
}

/// An authenticated identity.
///
/// Only the gateway's verification paths construct this type, so holding a
/// `Principal` means its credentials were checked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Principal {
    id: String,
    scheme: AuthScheme,
    /// Token expiry, for bearer-verified principals
    #[serde(skip_serializing_if = "Option::is_none")]
    expires_at: Option<DateTime<Utc>>,
}

impl Principal {
    pub(crate) fn new(id: impl Into<String>, scheme: AuthScheme) -> Self {
        Self {
            id: id.into(),
            scheme,
            expires_at: None,
        }
    }

    /// Build a bearer principal from verified token claims.
    pub(crate) fn from_claims(claims: TokenClaims) -> Self {
        Self {
            id: claims.sub,
            scheme: AuthScheme::Bearer,
            expires_at: DateTime::from_timestamp(claims.exp, 0),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn into_id(self) -> String {
        self.id
    }

    pub fn scheme(&self) -> AuthScheme {
        self.scheme
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_claims() -> TokenClaims {
        TokenClaims {
            sub: "alice".to_string(),
            iat: 1700000000,
            exp: 1700003600,
            jti: "6f1c1d2e-0000-4000-8000-000000000000".to_string(),
            token_type: ACCESS_TOKEN_TYPE.to_string(),
        }
    }

    #[test]
    fn from_claims_extracts_subject_and_expiry() {
        let principal = Principal::from_claims(sample_claims());
        assert_eq!(principal.id(), "alice");
        assert_eq!(principal.scheme(), AuthScheme::Bearer);
        assert_eq!(
            principal.expires_at().map(|t| t.timestamp()),
            Some(1700003600)
        );
    }

    #[test]
    fn claims_serialize_type_field() {
        let json = serde_json::to_value(sample_claims()).unwrap();
        assert_eq!(json["type"], "access");
        assert_eq!(json["sub"], "alice");
        assert!(json.get("token_type").is_none());
    }

    #[test]
    fn basic_principal_has_no_expiry() {
        let principal = Principal::new("bob", AuthScheme::Basic);
        assert_eq!(principal.expires_at(), None);
        assert_eq!(principal.clone().into_id(), "bob");

        let json = serde_json::to_value(&principal).unwrap();
        assert_eq!(json["scheme"], "basic");
        assert!(json.get("expires_at").is_none());
    }
}

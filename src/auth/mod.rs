// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Credential issuance and verification for HTTP services.
//!
//! ## Auth Flow
//!
//! 1. A client registers a principal with a password and receives an API key
//! 2. The client proves its password with `Authorization: Basic` and
//!    exchanges it for a short-lived access token
//! 3. Later requests present either:
//!    - `x-api-key: <key>` for machine callers
//!    - `Authorization: Bearer <token>` for interactive sessions
//!
//! Each route states which schemes it requires by listing extractors
//! ([`BasicAuth`], [`ApiKeyAuth`], [`BearerAuth`]).
//!
//! ## Security
//!
//! - Passwords are stored as salted PBKDF2 hashes
//! - Unknown principals are checked against a dummy hash
//! - API keys carry 256 bits of entropy and are logged only as fingerprints
//! - Tokens are HS256 signed; expiry is checked against an injected [`Clock`]

pub mod api_key;
pub mod authenticator;
pub mod claims;
pub mod clock;
pub mod error;
pub mod extractor;
pub mod gateway;
pub mod password;
pub mod token;

pub use api_key::{fingerprint, ApiKeyIssuer, ApiKeySource};
pub use authenticator::{
    ApiKeyAuthenticator, Authenticator, BasicAuthenticator, BearerAuthenticator, Credentials,
};
pub use claims::{AuthScheme, Principal, TokenClaims};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{AuthError, TokenError};
pub use extractor::{ApiKeyAuth, BasicAuth, BearerAuth, API_KEY_HEADER};
pub use gateway::{AuthGateway, AuthGatewayBuilder, MAX_KEY_ATTEMPTS};
pub use password::PasswordHasher;
pub use token::{Token, TokenService};

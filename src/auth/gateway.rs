// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! The authentication gateway.
//!
//! Single entry point for the HTTP layer: registration plus one
//! verification method per scheme. Each call is an independent check
//! against the current store and signing secret; no per-request state is
//! kept.

use std::num::NonZeroU32;
use std::sync::Arc;

use chrono::Duration;
use tracing::{debug, error, info, warn};

use super::api_key::{fingerprint, ApiKeyIssuer, ApiKeySource};
use super::claims::{AuthScheme, Principal};
use super::clock::{Clock, SystemClock};
use super::error::TokenError;
use super::password::PasswordHasher;
use super::token::{Token, TokenService};
use crate::config::{
    GatewayConfig, SigningSecret, DEFAULT_ACCESS_TOKEN_TTL_SECS, DEFAULT_HASH_ITERATIONS,
};
use crate::error::GatewayError;
use crate::store::{CredentialRecord, CredentialStore, StoreError};

/// Upper bound on API key minting attempts before giving up.
pub const MAX_KEY_ATTEMPTS: usize = 5;

/// Registers principals and verifies Basic, API key and bearer credentials.
pub struct AuthGateway {
    store: CredentialStore,
    hasher: PasswordHasher,
    /// Compared against when the principal is unknown, so the miss costs a
    /// full hash verification too.
    dummy_hash: String,
    key_source: Box<dyn ApiKeySource>,
    tokens: TokenService,
    access_token_ttl: Duration,
    issue_api_key_on_register: bool,
}

impl AuthGateway {
    pub fn builder(signing_secret: SigningSecret) -> AuthGatewayBuilder {
        AuthGatewayBuilder::new(signing_secret)
    }

    pub fn from_config(config: &GatewayConfig) -> Self {
        Self::builder(config.signing_secret.clone())
            .access_token_ttl(config.access_token_ttl)
            .token_leeway(config.token_leeway)
            .hash_iterations(config.hash_iterations)
            .issue_api_key_on_register(config.issue_api_key_on_register)
            .build()
    }

    /// Register a new principal.
    ///
    /// When API keys are enabled the key is committed together with the
    /// record, so a failed registration leaves nothing behind.
    pub fn register_principal(
        &self,
        principal_id: &str,
        password: &str,
    ) -> Result<CredentialRecord, GatewayError> {
        if principal_id.is_empty() || password.is_empty() {
            return Err(GatewayError::invalid_input(
                "principal identifier and password are required",
            ));
        }
        // Skip the hashing cost for obvious duplicates; the insert below is
        // still the authoritative check.
        if self.store.get(principal_id).is_some() {
            return Err(GatewayError::AlreadyExists(principal_id.to_string()));
        }

        let password_hash = self.hasher.hash(password)?;

        if self.issue_api_key_on_register {
            let api_key = self.commit_unique_key(principal_id, |key| {
                self.store
                    .register_with_api_key(principal_id, password_hash.as_str(), key)
            })?;
            info!(
                principal = %principal_id,
                api_key = %fingerprint(&api_key),
                "Principal registered with API key"
            );
        } else {
            self.store.register(principal_id, password_hash)?;
            info!(principal = %principal_id, "Principal registered");
        }

        self.store
            .get(principal_id)
            .ok_or_else(|| GatewayError::NotFound(principal_id.to_string()))
    }

    /// Mint an API key for a principal registered without one.
    pub fn issue_api_key(&self, principal: &Principal) -> Result<String, GatewayError> {
        require_password_verified(principal)?;
        let principal_id = principal.id();

        let api_key =
            self.commit_unique_key(principal_id, |key| self.store.set_api_key(principal_id, key))?;
        info!(
            principal = %principal_id,
            api_key = %fingerprint(&api_key),
            "API key issued"
        );
        Ok(api_key)
    }

    /// Check a username and password.
    ///
    /// Unknown principals and wrong passwords both return `None` after the
    /// same amount of hashing work.
    pub fn verify_basic(&self, principal_id: &str, password: &str) -> Option<Principal> {
        let record = self.store.get(principal_id);
        let password_matches = self
            .hasher
            .verify(password, self.hash_to_check(record.as_ref()));
        if password_matches && record.is_some() {
            Some(Principal::new(principal_id, AuthScheme::Basic))
        } else {
            debug!(principal = %principal_id, "Basic authentication failed");
            None
        }
    }

    pub fn verify_api_key(&self, api_key: &str) -> Option<Principal> {
        if api_key.is_empty() {
            return None;
        }
        match self.store.find_by_api_key(api_key) {
            Some(principal_id) => Some(Principal::new(principal_id, AuthScheme::ApiKey)),
            None => {
                debug!(api_key = %fingerprint(api_key), "Unknown API key");
                None
            }
        }
    }

    /// Issue an access token with the configured lifetime.
    ///
    /// Only principals that proved their password may obtain tokens.
    pub fn issue_token(&self, principal: &Principal) -> Result<Token, GatewayError> {
        self.issue_token_with_ttl(principal, self.access_token_ttl)
    }

    pub fn issue_token_with_ttl(
        &self,
        principal: &Principal,
        ttl: Duration,
    ) -> Result<Token, GatewayError> {
        require_password_verified(principal)?;

        let token = self.tokens.issue(principal.id(), ttl)?;
        info!(
            principal = %token.subject,
            token_id = %token.token_id,
            expires_at = %token.expires_at,
            "Access token issued"
        );
        Ok(token)
    }

    pub fn verify_token(&self, token: &str) -> Result<Principal, TokenError> {
        self.tokens
            .verify(token)
            .map(Principal::from_claims)
            .inspect_err(|e| debug!(reason = %e, "Access token rejected"))
    }

    /// Registered principal identifiers, sorted.
    pub fn principal_ids(&self) -> Vec<String> {
        self.store.principal_ids()
    }

    pub fn store(&self) -> &CredentialStore {
        &self.store
    }

    /// The principal's stored hash, or the dummy hash when it is unknown.
    fn hash_to_check<'a>(&'a self, record: Option<&'a CredentialRecord>) -> &'a str {
        record.map_or(self.dummy_hash.as_str(), |r| r.password_hash.as_str())
    }

    /// Mint keys until `commit` accepts one or the attempt budget runs out.
    fn commit_unique_key<F>(
        &self,
        principal_id: &str,
        mut commit: F,
    ) -> Result<String, GatewayError>
    where
        F: FnMut(&str) -> Result<(), StoreError>,
    {
        for attempt in 1..=MAX_KEY_ATTEMPTS {
            let api_key = self.key_source.next_key()?;
            match commit(&api_key) {
                Ok(()) => return Ok(api_key),
                Err(StoreError::KeyCollision) => {
                    warn!(
                        principal = %principal_id,
                        attempt,
                        api_key = %fingerprint(&api_key),
                        "API key collision, retrying"
                    );
                }
                Err(other) => return Err(other.into()),
            }
        }

        error!(
            principal = %principal_id,
            attempts = MAX_KEY_ATTEMPTS,
            "API key generation exhausted; entropy source may be broken"
        );
        Err(GatewayError::KeyGenerationExhausted {
            attempts: MAX_KEY_ATTEMPTS,
        })
    }
}

fn require_password_verified(principal: &Principal) -> Result<(), GatewayError> {
    if principal.scheme() == AuthScheme::Basic {
        Ok(())
    } else {
        debug!(
            principal = %principal.id(),
            scheme = %principal.scheme(),
            "Credential issuance requires password authentication"
        );
        Err(GatewayError::AuthFailure)
    }
}

/// Builder for [`AuthGateway`].
pub struct AuthGatewayBuilder {
    signing_secret: SigningSecret,
    clock: Arc<dyn Clock>,
    key_source: Option<Box<dyn ApiKeySource>>,
    hash_iterations: NonZeroU32,
    access_token_ttl: Duration,
    token_leeway: Duration,
    issue_api_key_on_register: bool,
}

impl AuthGatewayBuilder {
    fn new(signing_secret: SigningSecret) -> Self {
        Self {
            signing_secret,
            clock: Arc::new(SystemClock),
            key_source: None,
            hash_iterations: NonZeroU32::new(DEFAULT_HASH_ITERATIONS).unwrap_or(NonZeroU32::MIN),
            access_token_ttl: Duration::seconds(DEFAULT_ACCESS_TOKEN_TTL_SECS),
            token_leeway: Duration::zero(),
            issue_api_key_on_register: true,
        }
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn key_source(mut self, source: impl ApiKeySource + 'static) -> Self {
        self.key_source = Some(Box::new(source));
        self
    }

    pub fn hash_iterations(mut self, iterations: NonZeroU32) -> Self {
        self.hash_iterations = iterations;
        self
    }

    pub fn access_token_ttl(mut self, ttl: Duration) -> Self {
        self.access_token_ttl = ttl;
        self
    }

    pub fn token_leeway(mut self, leeway: Duration) -> Self {
        self.token_leeway = leeway;
        self
    }

    pub fn issue_api_key_on_register(mut self, enabled: bool) -> Self {
        self.issue_api_key_on_register = enabled;
        self
    }

    pub fn build(self) -> AuthGateway {
        let hasher = PasswordHasher::new(self.hash_iterations);
        let dummy_hash = hasher.dummy_hash();
        let tokens = TokenService::with_clock(&self.signing_secret, self.clock)
            .with_leeway(self.token_leeway);

        AuthGateway {
            store: CredentialStore::new(),
            hasher,
            dummy_hash,
            key_source: self
                .key_source
                .unwrap_or_else(|| Box::new(ApiKeyIssuer::new())),
            tokens,
            access_token_ttl: self.access_token_ttl,
            issue_api_key_on_register: self.issue_api_key_on_register,
        }
    }
}

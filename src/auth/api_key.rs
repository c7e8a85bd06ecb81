// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Opaque API key generation.
//!
//! Keys carry no claims: 256 bits from the system CSPRNG, base64url-encoded
//! without padding. Uniqueness is enforced by the credential store, not
//! here; the gateway retries a bounded number of times on collision.

use base64ct::{Base64UrlUnpadded, Encoding};
use ring::rand::{SecureRandom, SystemRandom};
use sha2::{Digest, Sha256};

use crate::error::GatewayError;

/// Random bytes per key.
pub const API_KEY_BYTES: usize = 32;

/// Bytes of the SHA-256 digest shown in log fingerprints.
const FINGERPRINT_BYTES: usize = 8;

/// Something that mints candidate API keys.
pub trait ApiKeySource: Send + Sync {
    fn next_key(&self) -> Result<String, GatewayError>;
}

/// CSPRNG-backed key issuer.
pub struct ApiKeyIssuer {
    rng: SystemRandom,
}

impl ApiKeyIssuer {
    pub fn new() -> Self {
        Self {
            rng: SystemRandom::new(),
        }
    }

    pub fn issue(&self) -> Result<String, GatewayError> {
        let mut bytes = [0u8; API_KEY_BYTES];
        self.rng
            .fill(&mut bytes)
            .map_err(|_| GatewayError::EntropyUnavailable)?;
        Ok(Base64UrlUnpadded::encode_string(&bytes))
    }
}

impl Default for ApiKeyIssuer {
    fn default() -> Self {
        Self::new()
    }
}

impl ApiKeySource for ApiKeyIssuer {
    fn next_key(&self) -> Result<String, GatewayError> {
        self.issue()
    }
}

/// Short, non-reversible identifier for an API key, safe to log.
pub fn fingerprint(api_key: &str) -> String {
    let digest = Sha256::digest(api_key.as_bytes());
    hex::encode(&digest[..FINGERPRINT_BYTES])
}

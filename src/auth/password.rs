// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Password hashing and verification using PBKDF2-HMAC.
//!
//! Hashes are stored as `pbkdf2:<digest>:<iterations>$<salt>$<hex>`, the
//! same layout Werkzeug writes, so credentials migrated from existing
//! deployments verify unchanged.

use std::num::NonZeroU32;

use ring::{
    pbkdf2,
    rand::{SecureRandom, SystemRandom},
};

use crate::config::DEFAULT_HASH_ITERATIONS;
use crate::error::GatewayError;

const METHOD: &str = "pbkdf2";
const SALT_LEN: usize = 16;
const SALT_CHARS: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const SHA256_LEN: usize = 32;

/// Fixed salt for the timing-equalisation hash. It never protects a real
/// password.
const DUMMY_SALT: &str = "uniformtiming000";
const DUMMY_PASSWORD: &str = "not-a-real-password";

/// Salts, hashes and verifies passwords.
pub struct PasswordHasher {
    iterations: NonZeroU32,
    rng: SystemRandom,
}

impl PasswordHasher {
    pub fn new(iterations: NonZeroU32) -> Self {
        Self {
            iterations,
            rng: SystemRandom::new(),
        }
    }

    pub fn iterations(&self) -> NonZeroU32 {
        self.iterations
    }

    /// Hash a password with a fresh random salt.
    pub fn hash(&self, password: &str) -> Result<String, GatewayError> {
        let salt = self.generate_salt()?;
        Ok(self.hash_with_salt(password, &salt))
    }

    /// A hash at the configured cost that no caller-supplied password is
    /// expected to match. Verifying against it costs the same as a real
    /// verification.
    pub fn dummy_hash(&self) -> String {
        self.hash_with_salt(DUMMY_PASSWORD, DUMMY_SALT)
    }

    /// Check a password against a stored hash in constant time.
    ///
    /// Malformed or unsupported hashes verify as `false`.
    pub fn verify(&self, password: &str, stored: &str) -> bool {
        let Some(parsed) = ParsedHash::parse(stored) else {
            return false;
        };
        pbkdf2::verify(
            parsed.algorithm,
            parsed.iterations,
            parsed.salt.as_bytes(),
            password.as_bytes(),
            &parsed.digest,
        )
        .is_ok()
    }

    fn hash_with_salt(&self, password: &str, salt: &str) -> String {
        let mut digest = [0u8; SHA256_LEN];
        pbkdf2::derive(
            pbkdf2::PBKDF2_HMAC_SHA256,
            self.iterations,
            salt.as_bytes(),
            password.as_bytes(),
            &mut digest,
        );
        format!(
            "{METHOD}:sha256:{}${salt}${}",
            self.iterations,
            hex::encode(digest)
        )
    }

    /// Alphanumeric salt drawn from the system CSPRNG.
    fn generate_salt(&self) -> Result<String, GatewayError> {
        // Largest multiple of the alphabet size that fits in a byte; bytes
        // at or above it are rejected to keep the distribution uniform.
        let limit = (u8::MAX as usize + 1) / SALT_CHARS.len() * SALT_CHARS.len();

        let mut salt = String::with_capacity(SALT_LEN);
        let mut buf = [0u8; SALT_LEN * 2];
        while salt.len() < SALT_LEN {
            self.rng
                .fill(&mut buf)
                .map_err(|_| GatewayError::EntropyUnavailable)?;
            for byte in buf {
                if salt.len() == SALT_LEN {
                    break;
                }
                if (byte as usize) < limit {
                    salt.push(SALT_CHARS[byte as usize % SALT_CHARS.len()] as char);
                }
            }
        }
        Ok(salt)
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new(NonZeroU32::new(DEFAULT_HASH_ITERATIONS).unwrap_or(NonZeroU32::MIN))
    }
}

struct ParsedHash<'a> {
    algorithm: pbkdf2::Algorithm,
    iterations: NonZeroU32,
    salt: &'a str,
    digest: Vec<u8>,
}

impl<'a> ParsedHash<'a> {
    fn parse(stored: &'a str) -> Option<Self> {
        let mut sections = stored.splitn(3, '$');
        let method = sections.next()?;
        let salt = sections.next()?;
        let digest = hex::decode(sections.next()?).ok()?;

        let mut params = method.split(':');
        if params.next()? != METHOD {
            return None;
        }
        let algorithm = match params.next()? {
            "sha256" => pbkdf2::PBKDF2_HMAC_SHA256,
            "sha512" => pbkdf2::PBKDF2_HMAC_SHA512,
            _ => return None,
        };
        let iterations = match params.next() {
            Some(raw) => NonZeroU32::new(raw.parse().ok()?)?,
            None => NonZeroU32::new(DEFAULT_HASH_ITERATIONS)?,
        };
        if params.next().is_some() || salt.is_empty() || digest.is_empty() {
            return None;
        }

        Some(Self {
            algorithm,
            iterations,
            salt,
            digest,
        })
    }
}

// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Signed, expiring access tokens.
//!
//! Tokens are compact HS256 JWTs (`header.payload.signature`, base64url
//! segments) so existing JWT clients keep working. Nothing is stored
//! server-side: validity depends only on the token bytes, the signing
//! secret and the current time.
//!
//! ## Verification order
//!
//! 1. Structure and algorithm (`Malformed` on failure)
//! 2. Signature over header and payload (`InvalidSignature`)
//! 3. Claims shape and token type (`Malformed`)
//! 4. Expiry against the injected [`Clock`] (`Expired`), strict unless a
//!    leeway is configured

use std::sync::Arc;

use chrono::{DateTime, Duration, SubsecRound, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::Serialize;
use uuid::Uuid;

use super::claims::{TokenClaims, ACCESS_TOKEN_TYPE};
use super::clock::{Clock, SystemClock};
use super::error::TokenError;
use crate::config::{SigningSecret, MAX_ACCESS_TOKEN_TTL_SECS};
use crate::error::GatewayError;

const ALGORITHM: Algorithm = Algorithm::HS256;

/// An issued access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Token {
    /// Compact JWS string handed to the client
    pub access_token: String,
    pub subject: String,
    /// `jti` claim
    pub token_id: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Token {
    pub fn as_str(&self) -> &str {
        &self.access_token
    }
}

/// Issues and verifies access tokens with a process-wide secret.
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    leeway: Duration,
    clock: Arc<dyn Clock>,
}

impl TokenService {
    pub fn new(secret: &SigningSecret) -> Self {
        Self::with_clock(secret, Arc::new(SystemClock))
    }

    pub fn with_clock(secret: &SigningSecret, clock: Arc<dyn Clock>) -> Self {
        let mut validation = Validation::new(ALGORITHM);
        // Expiry is checked against `clock` after decoding.
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            leeway: Duration::zero(),
            clock,
        }
    }

    /// Grace window added to `exp` when checking expiry.
    pub fn with_leeway(mut self, leeway: Duration) -> Self {
        self.leeway = leeway;
        self
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Issue a token for `subject` valid for `ttl` from now.
    ///
    /// Claims carry whole seconds, so `ttl` is truncated to seconds and must
    /// be between one second and [`MAX_ACCESS_TOKEN_TTL_SECS`].
    pub fn issue(&self, subject: &str, ttl: Duration) -> Result<Token, GatewayError> {
        let ttl_secs = ttl.num_seconds();
        if !(1..=MAX_ACCESS_TOKEN_TTL_SECS).contains(&ttl_secs) {
            return Err(GatewayError::invalid_input(format!(
                "token lifetime must be between 1 and {MAX_ACCESS_TOKEN_TTL_SECS} seconds"
            )));
        }

        let issued_at = self.clock.now().trunc_subsecs(0);
        let expires_at = issued_at
            .checked_add_signed(Duration::seconds(ttl_secs))
            .ok_or_else(|| GatewayError::invalid_input("token expiry is out of range"))?;

        let claims = TokenClaims {
            sub: subject.to_string(),
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
            jti: Uuid::new_v4().to_string(),
            token_type: ACCESS_TOKEN_TYPE.to_string(),
        };
        let access_token = encode(&Header::new(ALGORITHM), &claims, &self.encoding_key)?;

        Ok(Token {
            access_token,
            subject: claims.sub,
            token_id: claims.jti,
            issued_at,
            expires_at,
        })
    }

    /// Verify a token and return its claims.
    pub fn verify(&self, token: &str) -> Result<TokenClaims, TokenError> {
        let claims = decode::<TokenClaims>(token, &self.decoding_key, &self.validation)
            .map_err(classify)?
            .claims;

        if claims.token_type != ACCESS_TOKEN_TYPE || claims.sub.is_empty() {
            return Err(TokenError::Malformed);
        }

        let now = self.clock.now().timestamp();
        if now >= claims.exp.saturating_add(self.leeway.num_seconds()) {
            return Err(TokenError::Expired);
        }

        Ok(claims)
    }
}

fn classify(err: jsonwebtoken::errors::Error) -> TokenError {
    match err.kind() {
        ErrorKind::InvalidSignature => TokenError::InvalidSignature,
        ErrorKind::ExpiredSignature => TokenError::Expired,
        _ => TokenError::Malformed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::clock::ManualClock;
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
    use chrono::TimeZone;

    fn secret(value: &str) -> SigningSecret {
        SigningSecret::new(value).unwrap()
    }

    fn service_with_clock() -> (TokenService, Arc<ManualClock>) {
        let start = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let clock = Arc::new(ManualClock::new(start));
        let service = TokenService::with_clock(
            &secret("0123456789abcdef0123456789abcdef"),
            clock.clone(),
        );
        (service, clock)
    }

    fn flip_signature_byte(token: &str) -> String {
        let (signing_input, signature) = token.rsplit_once('.').unwrap();
        let mut bytes = URL_SAFE_NO_PAD.decode(signature).unwrap();
        bytes[0] ^= 0x01;
        format!("{signing_input}.{}", URL_SAFE_NO_PAD.encode(bytes))
    }

    #[test]
    fn issue_then_verify_returns_subject() {
        let (service, _clock) = service_with_clock();
        let token = service.issue("alice", Duration::seconds(3600)).unwrap();

        assert_eq!(token.subject, "alice");
        assert_eq!(token.expires_at - token.issued_at, Duration::seconds(3600));

        let claims = service.verify(token.as_str()).unwrap();
        assert_eq!(claims.sub, "alice");
        assert_eq!(claims.jti, token.token_id);
        assert_eq!(claims.token_type, "access");
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn wire_format_is_compact_jws() {
        let (service, _clock) = service_with_clock();
        let token = service.issue("alice", Duration::seconds(60)).unwrap();

        let segments: Vec<&str> = token.as_str().split('.').collect();
        assert_eq!(segments.len(), 3);

        let header: serde_json::Value =
            serde_json::from_slice(&URL_SAFE_NO_PAD.decode(segments[0]).unwrap()).unwrap();
        assert_eq!(header["alg"], "HS256");
        assert_eq!(header["typ"], "JWT");
    }

    #[test]
    fn token_ids_are_unique() {
        let (service, _clock) = service_with_clock();
        let a = service.issue("alice", Duration::seconds(60)).unwrap();
        let b = service.issue("alice", Duration::seconds(60)).unwrap();
        assert_ne!(a.token_id, b.token_id);
        assert_ne!(a.access_token, b.access_token);
    }

    #[test]
    fn expiry_is_strict() {
        let (service, clock) = service_with_clock();
        let token = service.issue("alice", Duration::seconds(3600)).unwrap();

        clock.advance(Duration::seconds(3599));
        assert!(service.verify(token.as_str()).is_ok());

        clock.advance(Duration::seconds(1));
        assert_eq!(service.verify(token.as_str()), Err(TokenError::Expired));

        clock.advance(Duration::seconds(1));
        assert_eq!(service.verify(token.as_str()), Err(TokenError::Expired));
    }

    #[test]
    fn lifetime_outside_bounds_is_rejected() {
        let (service, _clock) = service_with_clock();
        for ttl in [
            Duration::zero(),
            Duration::milliseconds(500),
            Duration::seconds(-60),
            Duration::seconds(MAX_ACCESS_TOKEN_TTL_SECS + 1),
            Duration::seconds(9_000_000_000_000),
        ] {
            assert!(
                matches!(
                    service.issue("alice", ttl),
                    Err(GatewayError::InvalidInput(_))
                ),
                "{ttl:?} should be rejected"
            );
        }
    }

    #[test]
    fn longest_lifetime_is_accepted() {
        let (service, _clock) = service_with_clock();
        let ttl = Duration::seconds(MAX_ACCESS_TOKEN_TTL_SECS);
        let token = service.issue("alice", ttl).unwrap();

        assert_eq!(token.expires_at - token.issued_at, ttl);
        assert!(service.verify(token.as_str()).is_ok());
    }

    #[test]
    fn expiry_at_end_of_time_is_an_error() {
        let clock = Arc::new(ManualClock::new(DateTime::<Utc>::MAX_UTC));
        let service = TokenService::with_clock(
            &secret("0123456789abcdef0123456789abcdef"),
            clock,
        );
        assert!(matches!(
            service.issue("alice", Duration::seconds(60)),
            Err(GatewayError::InvalidInput(_))
        ));
    }

    #[test]
    fn fractional_lifetime_matches_signed_expiry() {
        let (service, clock) = service_with_clock();
        clock.advance(Duration::milliseconds(250));
        let token = service.issue("alice", Duration::milliseconds(1_500)).unwrap();

        let claims = service.verify(token.as_str()).unwrap();
        assert_eq!(token.issued_at.timestamp(), claims.iat);
        assert_eq!(token.expires_at.timestamp(), claims.exp);
        assert_eq!(token.expires_at.timestamp_subsec_nanos(), 0);
        assert_eq!(token.expires_at - token.issued_at, Duration::seconds(1));
    }

    #[test]
    fn leeway_extends_expiry() {
        let (service, clock) = service_with_clock();
        let service = service.with_leeway(Duration::seconds(5));
        let token = service.issue("alice", Duration::seconds(10)).unwrap();

        clock.advance(Duration::seconds(14));
        assert!(service.verify(token.as_str()).is_ok());

        clock.advance(Duration::seconds(1));
        assert_eq!(service.verify(token.as_str()), Err(TokenError::Expired));
    }

    #[test]
    fn flipped_signature_byte_is_rejected() {
        let (service, _clock) = service_with_clock();
        let token = service.issue("alice", Duration::seconds(3600)).unwrap();

        let tampered = flip_signature_byte(token.as_str());
        assert_eq!(service.verify(&tampered), Err(TokenError::InvalidSignature));
    }

    #[test]
    fn tampered_expired_token_reports_signature_first() {
        let (service, clock) = service_with_clock();
        let token = service.issue("alice", Duration::seconds(1)).unwrap();
        clock.advance(Duration::seconds(10));

        let tampered = flip_signature_byte(token.as_str());
        assert_eq!(service.verify(&tampered), Err(TokenError::InvalidSignature));
    }

    #[test]
    fn swapped_payload_is_rejected() {
        let (service, _clock) = service_with_clock();
        let token = service.issue("alice", Duration::seconds(3600)).unwrap();
        let segments: Vec<&str> = token.as_str().split('.').collect();

        let mut payload: serde_json::Value =
            serde_json::from_slice(&URL_SAFE_NO_PAD.decode(segments[1]).unwrap()).unwrap();
        payload["sub"] = "mallory".into();
        let forged_payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&payload).unwrap());

        let forged = format!("{}.{}.{}", segments[0], forged_payload, segments[2]);
        assert_eq!(service.verify(&forged), Err(TokenError::InvalidSignature));
    }

    #[test]
    fn other_secret_is_rejected() {
        let (service, clock) = service_with_clock();
        let other = TokenService::with_clock(&secret("a-completely-different-secret!!!"), clock);
        let token = other.issue("alice", Duration::seconds(3600)).unwrap();

        assert_eq!(
            service.verify(token.as_str()),
            Err(TokenError::InvalidSignature)
        );
    }

    #[test]
    fn malformed_tokens_are_rejected_without_panicking() {
        let (service, _clock) = service_with_clock();
        for token in [
            "",
            ".",
            "..",
            "abc",
            "a.b",
            "a.b.c",
            "!!!.###.$$$",
        ] {
            assert_eq!(
                service.verify(token),
                Err(TokenError::Malformed),
                "{token:?} should be malformed"
            );
        }
    }

    #[test]
    fn unsigned_token_is_malformed() {
        let (service, _clock) = service_with_clock();
        let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"none","typ":"JWT"}"#);
        let claims = URL_SAFE_NO_PAD.encode(
            r#"{"sub":"alice","iat":1772366400,"exp":9999999999,"jti":"x","type":"access"}"#,
        );
        let token = format!("{header}.{claims}.");
        assert_eq!(service.verify(&token), Err(TokenError::Malformed));
    }

    #[test]
    fn other_algorithm_is_malformed() {
        let (service, _clock) = service_with_clock();
        let claims = TokenClaims {
            sub: "alice".into(),
            iat: 1772366400,
            exp: 9999999999,
            jti: "x".into(),
            token_type: ACCESS_TOKEN_TYPE.into(),
        };
        let token = encode(
            &Header::new(Algorithm::HS512),
            &claims,
            &EncodingKey::from_secret(b"0123456789abcdef0123456789abcdef"),
        )
        .unwrap();
        assert_eq!(service.verify(&token), Err(TokenError::Malformed));
    }

    #[test]
    fn non_access_token_type_is_malformed() {
        let (service, _clock) = service_with_clock();
        let claims = TokenClaims {
            sub: "alice".into(),
            iat: 1772366400,
            exp: 9999999999,
            jti: "x".into(),
            token_type: "refresh".into(),
        };
        let token = encode(
            &Header::new(ALGORITHM),
            &claims,
            &EncodingKey::from_secret(b"0123456789abcdef0123456789abcdef"),
        )
        .unwrap();
        assert_eq!(service.verify(&token), Err(TokenError::Malformed));
    }

    #[test]
    fn missing_claims_are_malformed() {
        let (service, _clock) = service_with_clock();
        let token = encode(
            &Header::new(ALGORITHM),
            &serde_json::json!({ "sub": "alice", "exp": 9999999999i64 }),
            &EncodingKey::from_secret(b"0123456789abcdef0123456789abcdef"),
        )
        .unwrap();
        assert_eq!(service.verify(&token), Err(TokenError::Malformed));
    }
}

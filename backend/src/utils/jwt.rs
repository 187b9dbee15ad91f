//! JWT token utilities for authentication and authorization.
//!
//! Provides creation and validation of the two token kinds. Access and
//! refresh tokens are signed with distinct secrets so compromise of one does
//! not grant the other's lifetime or capability.

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::errors::{ServiceError, ServiceResult};

/// The two classes of signed, time-bound tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// JWT claims carried by both token kinds.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject: the user id this token authenticates.
    pub sub: String,
    /// Which class of token this is; checked against the expected kind on
    /// verification so an access token can never act as a refresh token.
    pub kind: TokenKind,
    /// Token expiration timestamp
    pub exp: usize,
    /// Token issued at timestamp
    pub iat: usize,
}

impl Claims {
    pub fn user_id(&self) -> &str {
        &self.sub
    }

    /// Issue instant as unix seconds, used for the stale-credential check.
    pub fn issued_at(&self) -> i64 {
        self.iat as i64
    }
}

/// Token issuer/verifier holding one key pair and lifetime per token kind.
#[derive(Clone)]
pub struct JwtKeys {
    access_encoding: EncodingKey,
    access_decoding: DecodingKey,
    refresh_encoding: EncodingKey,
    refresh_decoding: DecodingKey,
    access_lifetime_seconds: u64,
    refresh_lifetime_seconds: u64,
    validation: Validation,
}

impl JwtKeys {
    /// Builds keys from explicit secrets and lifetimes.
    pub fn new(
        access_secret: &[u8],
        refresh_secret: &[u8],
        access_lifetime_seconds: u64,
        refresh_lifetime_seconds: u64,
    ) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        // No clock-skew tolerance: expiry is deterministic.
        validation.leeway = 0;

        JwtKeys {
            access_encoding: EncodingKey::from_secret(access_secret),
            access_decoding: DecodingKey::from_secret(access_secret),
            refresh_encoding: EncodingKey::from_secret(refresh_secret),
            refresh_decoding: DecodingKey::from_secret(refresh_secret),
            access_lifetime_seconds,
            refresh_lifetime_seconds,
            validation,
        }
    }

    /// Builds keys from the loaded application configuration.
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.access_token_secret.as_bytes(),
            config.refresh_token_secret.as_bytes(),
            config.access_token_expires_in_seconds,
            config.refresh_token_expires_in_seconds,
        )
    }

    pub fn access_lifetime_seconds(&self) -> u64 {
        self.access_lifetime_seconds
    }

    pub fn refresh_lifetime_seconds(&self) -> u64 {
        self.refresh_lifetime_seconds
    }

    /// Issues a signed token of the given kind for a subject.
    pub fn issue(&self, subject: &str, kind: TokenKind) -> ServiceResult<String> {
        let lifetime = match kind {
            TokenKind::Access => self.access_lifetime_seconds,
            TokenKind::Refresh => self.refresh_lifetime_seconds,
        };

        let now = Utc::now();
        let exp = now + Duration::seconds(lifetime as i64);

        let claims = Claims {
            sub: subject.to_string(),
            kind,
            exp: exp.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        let encoding_key = match kind {
            TokenKind::Access => &self.access_encoding,
            TokenKind::Refresh => &self.refresh_encoding,
        };

        encode(&Header::default(), &claims, encoding_key)
            .map_err(|e| ServiceError::internal_error(format!("Token generation failed: {}", e)))
    }

    /// Validates a token against the expected kind and returns its claims.
    ///
    /// Fails closed: malformed, expired, mis-signed, and wrong-kind tokens
    /// all collapse into the same opaque failure.
    pub fn verify(&self, token: &str, expected: TokenKind) -> ServiceResult<Claims> {
        let decoding_key = match expected {
            TokenKind::Access => &self.access_decoding,
            TokenKind::Refresh => &self.refresh_decoding,
        };

        let claims = decode::<Claims>(token, decoding_key, &self.validation)
            .map(|token_data| token_data.claims)
            .map_err(|_| ServiceError::unauthenticated("invalid or expired token"))?;

        if claims.kind != expected {
            return Err(ServiceError::unauthenticated("invalid or expired token"));
        }

        Ok(claims)
    }
}

//! JWT token generation and validation
//!
//! Two token classes are issued. Access tokens authorize ordinary API calls,
//! refresh tokens are only good for minting a new pair. Each class has its
//! own HMAC secret and lifetime, so a leaked secret of one class cannot forge
//! tokens of the other.
//!
//! Every verification failure collapses into [`JwtError::InvalidToken`];
//! the underlying reason is only logged.

use super::models::Identity;
use bookshelf_core::AuthConfig;
use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

/// Token class, each bound to its own secret and lifetime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenClass {
    Access,
    Refresh,
}

impl TokenClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenClass::Access => "access",
            TokenClass::Refresh => "refresh",
        }
    }

    /// Authorization header scheme this class is presented under
    pub fn scheme(&self) -> &'static str {
        match self {
            TokenClass::Access => "Bearer",
            TokenClass::Refresh => "Refresh",
        }
    }
}

impl fmt::Display for TokenClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Claims embedded in every issued token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Identity of the bearer
    #[serde(rename = "User")]
    pub user: Identity,
    /// Issued at timestamp (Unix epoch)
    pub iat: i64,
    /// Expiration timestamp (Unix epoch)
    pub exp: i64,
    /// Unique token identifier
    pub jti: String,
    /// Token class the claims were minted for
    #[serde(rename = "tcl")]
    pub class: TokenClass,
}

/// JWT token generation and validation errors
#[derive(Debug, Error)]
pub enum JwtError {
    #[error("Failed to encode JWT: {0}")]
    EncodingError(#[from] jsonwebtoken::errors::Error),

    #[error("No signing secret configured for {0} tokens")]
    MissingSecret(TokenClass),

    #[error("Claims minted for {claims} tokens cannot be signed as {requested}")]
    ClassMismatch {
        claims: TokenClass,
        requested: TokenClass,
    },

    #[error("Invalid token")]
    InvalidToken,
}

/// Access and refresh token pair returned by login and refresh
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    /// Expiry of the access token (Unix epoch seconds)
    pub expires_in: i64,
}

#[derive(Clone)]
struct ClassKey {
    secret: String,
    ttl_secs: i64,
}

/// Issues and verifies signed tokens
///
/// Holds no mutable state: output depends only on the claims, the class
/// secret and the clock.
#[derive(Clone)]
pub struct TokenService {
    access: ClassKey,
    refresh: ClassKey,
}

impl TokenService {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            access: ClassKey {
                secret: config.access_secret.clone(),
                ttl_secs: i64::try_from(config.access_expiration_secs).unwrap_or(i64::MAX),
            },
            refresh: ClassKey {
                secret: config.refresh_secret.clone(),
                ttl_secs: i64::try_from(config.refresh_expiration_secs).unwrap_or(i64::MAX),
            },
        }
    }

    fn key(&self, class: TokenClass) -> &ClassKey {
        match class {
            TokenClass::Access => &self.access,
            TokenClass::Refresh => &self.refresh,
        }
    }

    /// Build fresh claims for `identity` valid from `now`
    pub fn claims_for(&self, identity: &Identity, class: TokenClass, now: DateTime<Utc>) -> Claims {
        let iat = now.timestamp();
        Claims {
            user: identity.clone(),
            iat,
            exp: iat.saturating_add(self.key(class).ttl_secs),
            jti: Uuid::new_v4().to_string(),
            class,
        }
    }

    /// Sign `claims` with the secret bound to `class`
    pub fn issue(&self, claims: &Claims, class: TokenClass) -> Result<String, JwtError> {
        if claims.class != class {
            return Err(JwtError::ClassMismatch {
                claims: claims.class,
                requested: class,
            });
        }

        let key = self.key(class);
        if key.secret.is_empty() {
            return Err(JwtError::MissingSecret(class));
        }

        let token = encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(key.secret.as_bytes()),
        )?;

        Ok(token)
    }

    /// Issue an access/refresh pair from the current clock
    pub fn issue_pair(&self, identity: &Identity) -> Result<TokenPair, JwtError> {
        self.issue_pair_at(identity, Utc::now())
    }

    /// Issue an access/refresh pair as of `now`
    pub fn issue_pair_at(
        &self,
        identity: &Identity,
        now: DateTime<Utc>,
    ) -> Result<TokenPair, JwtError> {
        let access_claims = self.claims_for(identity, TokenClass::Access, now);
        let access_token = self.issue(&access_claims, TokenClass::Access)?;

        let refresh_claims = self.claims_for(identity, TokenClass::Refresh, now);
        let refresh_token = self.issue(&refresh_claims, TokenClass::Refresh)?;

        Ok(TokenPair {
            access_token,
            refresh_token,
            expires_in: access_claims.exp,
        })
    }

    /// Verify a token of the given class against the current clock
    pub fn verify(&self, token: &str, class: TokenClass) -> Result<Claims, JwtError> {
        self.verify_at(token, class, Utc::now())
    }

    /// Verify a token of the given class as of `now`
    ///
    /// Only the HMAC family is accepted, which shuts out `none` and
    /// asymmetric algorithm substitution. A token is expired once
    /// `now > exp`; no leeway is granted.
    pub fn verify_at(
        &self,
        token: &str,
        class: TokenClass,
        now: DateTime<Utc>,
    ) -> Result<Claims, JwtError> {
        let key = self.key(class);
        if key.secret.is_empty() {
            tracing::warn!(class = %class, "No secret configured, rejecting token");
            return Err(JwtError::InvalidToken);
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.algorithms = vec![Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];
        validation.leeway = 0;
        // Expiry is checked below against the supplied clock.
        validation.validate_exp = false;

        let claims = decode::<Claims>(
            token,
            &DecodingKey::from_secret(key.secret.as_bytes()),
            &validation,
        )
        .map_err(|e| {
            tracing::debug!(class = %class, reason = %e, "Token rejected");
            JwtError::InvalidToken
        })?
        .claims;

        if claims.class != class {
            tracing::debug!(class = %class, presented = %claims.class, "Token class mismatch");
            return Err(JwtError::InvalidToken);
        }

        if now.timestamp() > claims.exp {
            tracing::debug!(class = %class, exp = claims.exp, "Token expired");
            return Err(JwtError::InvalidToken);
        }

        Ok(claims)
    }
}

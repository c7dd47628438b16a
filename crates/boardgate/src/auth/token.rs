//! Token issuance and verification.

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use log::{debug, warn};

use super::{AuthConfig, AuthError, Claims, ConfigValidationError, Identity, TokenKind};

/// Issues and verifies HS256 session tokens.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish_non_exhaustive()
    }
}

impl TokenService {
    /// Build the service from config.
    ///
    /// In dev mode without a configured secret a random one is generated, so
    /// tokens stop verifying after a restart.
    pub fn from_config(config: &AuthConfig) -> Result<Self, ConfigValidationError> {
        let secret = match config.resolve_jwt_secret()? {
            Some(secret) => secret,
            None if config.dev_mode => {
                warn!("No JWT secret configured in dev mode, using an ephemeral secret");
                AuthConfig::generate_jwt_secret()
            }
            None => return Err(ConfigValidationError::MissingJwtSecret),
        };

        Ok(Self::new(&secret, config.access_ttl()?, config.refresh_ttl()?))
    }

    pub fn new(secret: &str, access_ttl: Duration, refresh_ttl: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            access_ttl,
            refresh_ttl,
        }
    }

    /// Lifetime of refresh tokens, used for the cookie `Max-Age`.
    pub fn refresh_ttl(&self) -> Duration {
        self.refresh_ttl
    }

    /// Issue an access token for the identity.
    pub fn issue(&self, identity: &Identity) -> Result<String, AuthError> {
        self.issue_kind(identity, TokenKind::Access, self.access_ttl)
    }

    /// Issue a refresh token for the identity.
    pub fn issue_refresh(&self, identity: &Identity) -> Result<String, AuthError> {
        self.issue_kind(identity, TokenKind::Refresh, self.refresh_ttl)
    }

    /// Verify an access token.
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        self.verify_kind(token, TokenKind::Access)
    }

    /// Exchange a refresh token for a new access token with the same identity.
    pub fn refresh(&self, refresh_token: &str) -> Result<String, AuthError> {
        let claims = self.verify_kind(refresh_token, TokenKind::Refresh)?;
        self.issue(&claims.identity())
    }

    /// Verify a token's signature and expiry and check its kind.
    pub fn verify_kind(&self, token: &str, expected: TokenKind) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 0;

        let token_data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
            debug!("JWT validation failed: {:?}", e);
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::InvalidToken(e.to_string()),
            }
        })?;

        if token_data.claims.typ != expected {
            return Err(AuthError::InvalidToken(format!(
                "expected {} token, got {}",
                expected, token_data.claims.typ
            )));
        }

        Ok(token_data.claims)
    }

    fn issue_kind(
        &self,
        identity: &Identity,
        typ: TokenKind,
        ttl: Duration,
    ) -> Result<String, AuthError> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: identity.id,
            email: identity.email.clone(),
            name: identity.name.clone(),
            iat: now,
            exp: now + ttl.num_seconds(),
            typ,
        };
        self.sign(&claims)
    }

    fn sign(&self, claims: &Claims) -> Result<String, AuthError> {
        encode(&Header::default(), claims, &self.encoding_key)
            .map_err(|e| AuthError::Internal(e.to_string()))
    }
}

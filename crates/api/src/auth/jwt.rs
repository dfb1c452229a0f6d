//! JWT access-token generation and validation.
//!
//! Identity is issued elsewhere; this service only verifies HS256 tokens and
//! reads the caller's role, permissions, and standing from the claims.
//! [`generate_access_token`] exists for tooling and tests.

use chrono::{DateTime, Utc};
use folio_core::error::CoreError;
use folio_core::roles::{Actor, Permissions, Role};
use folio_core::types::DbId;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// JWT claims carried by every access token.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject -- the user's id.
    pub sub: DbId,
    pub username: String,
    /// Role name (`viewer`, `editor`, `moderator`, `admin`, `owner`).
    pub role: String,
    /// Explicit permission flags. Absent means "derive from role".
    #[serde(default)]
    pub permissions: Option<Permissions>,
    /// Lifetime edit count, used for autoconfirmation.
    #[serde(default)]
    pub edits: i64,
    /// Account creation time (UTC Unix timestamp).
    #[serde(default)]
    pub created_at: Option<i64>,
    #[serde(default)]
    pub banned: bool,
    /// Expiration time (UTC Unix timestamp).
    pub exp: i64,
    /// Issued-at time (UTC Unix timestamp).
    pub iat: i64,
    /// Unique token identifier (UUID v4).
    pub jti: String,
}

impl Claims {
    /// The engine identity these claims describe.
    pub fn into_actor(self) -> Result<Actor, CoreError> {
        let role: Role = self
            .role
            .parse()
            .map_err(|_| CoreError::Unauthorized("Token carries an unknown role".into()))?;
        Ok(Actor {
            user_id: Some(self.sub),
            username: self.username,
            role,
            permissions: self.permissions.unwrap_or_else(|| Permissions::for_role(role)),
            edits: self.edits,
            created_at: self
                .created_at
                .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0)),
            is_banned: self.banned,
        })
    }
}

/// Configuration for JWT token generation and validation.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// HMAC-SHA256 secret used to sign and verify tokens.
    pub secret: String,
    /// Access token lifetime in minutes (default: 60).
    pub access_token_expiry_mins: i64,
}

/// Default access token expiry in minutes.
const DEFAULT_ACCESS_EXPIRY_MINS: i64 = 60;

impl JwtConfig {
    /// Load JWT configuration from environment variables.
    ///
    /// | Env Var                  | Required | Default |
    /// |--------------------------|----------|---------|
    /// | `JWT_SECRET`             | **yes**  | --      |
    /// | `JWT_ACCESS_EXPIRY_MINS` | no       | `60`    |
    ///
    /// # Panics
    ///
    /// Panics if `JWT_SECRET` is not set or is empty.
    pub fn from_env() -> Self {
        let secret =
            std::env::var("JWT_SECRET").expect("JWT_SECRET must be set in the environment");
        assert!(!secret.is_empty(), "JWT_SECRET must not be empty");

        let access_token_expiry_mins: i64 = std::env::var("JWT_ACCESS_EXPIRY_MINS")
            .unwrap_or_else(|_| DEFAULT_ACCESS_EXPIRY_MINS.to_string())
            .parse()
            .expect("JWT_ACCESS_EXPIRY_MINS must be a valid i64");

        Self {
            secret,
            access_token_expiry_mins,
        }
    }
}

/// Generate an HS256 access token describing `actor`.
///
/// Fails with `InvalidSubject` for anonymous actors.
pub fn generate_access_token(
    actor: &Actor,
    config: &JwtConfig,
) -> Result<String, jsonwebtoken::errors::Error> {
    let user_id = actor.user_id.ok_or(ErrorKind::InvalidSubject)?;
    let now = Utc::now().timestamp();
    let exp = now + config.access_token_expiry_mins * 60;

    let claims = Claims {
        sub: user_id,
        username: actor.username.clone(),
        role: actor.role.to_string(),
        permissions: Some(actor.permissions),
        edits: actor.edits,
        created_at: actor.created_at.map(|t| t.timestamp()),
        banned: actor.is_banned,
        exp,
        iat: now,
        jti: Uuid::new_v4().to_string(),
    };

    encode(
        &Header::default(), // HS256
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
}

/// Validate and decode an access token, returning the embedded [`Claims`].
///
/// Validates the signature and expiration.
pub fn validate_token(
    token: &str,
    config: &JwtConfig,
) -> Result<Claims, jsonwebtoken::errors::Error> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(token_data.claims)
}

// storefront_server/src/services/auth_service.rs

//! Password hashing and bearer-token sessions.

use crate::errors::AppError;
use argon2::{
  password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
  Argon2,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use storefront::{Identity, Role};
use tracing::{debug, error, instrument};
use uuid::Uuid;

#[instrument(name = "auth_service::hash_password", skip(password), err(Display))]
pub fn hash_password(password: &str) -> Result<String, AppError> {
  if password.is_empty() {
    return Err(AppError::Validation("Password cannot be empty.".to_string()));
  }

  let salt = SaltString::generate(&mut OsRng);
  Argon2::default()
    .hash_password(password.as_bytes(), &salt)
    .map(|hash| hash.to_string())
    .map_err(|argon_err| {
      error!(error = %argon_err, "Argon2 password hashing failed.");
      AppError::Internal(format!("Password hashing failed: {argon_err}"))
    })
}

/// `Ok(false)` on a wrong password; `Err` only when the stored hash is unusable.
#[instrument(name = "auth_service::verify_password", skip_all, err(Display))]
pub fn verify_password(hashed_password: &str, provided_password: &str) -> Result<bool, AppError> {
  let parsed_hash = PasswordHash::new(hashed_password).map_err(|parse_err| {
    error!(error = %parse_err, "Failed to parse stored password hash.");
    AppError::Internal(format!("Invalid stored password hash: {parse_err}"))
  })?;

  match Argon2::default().verify_password(provided_password.as_bytes(), &parsed_hash) {
    Ok(()) => Ok(true),
    Err(argon2::password_hash::Error::Password) => {
      debug!("Password verification failed: passwords do not match.");
      Ok(false)
    }
    Err(other) => {
      error!(error = %other, "Argon2 verification error.");
      Err(AppError::Internal(format!("Password verification failed: {other}")))
    }
  }
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
  sub: Uuid,
  email: String,
  role: Role,
  iat: i64,
  exp: i64,
}

/// Signs and checks HS256 session tokens.
#[derive(Clone)]
pub struct TokenKeys {
  encoding: EncodingKey,
  decoding: DecodingKey,
  ttl: Duration,
}

impl TokenKeys {
  pub fn new(secret: &str, ttl_hours: i64) -> Self {
    Self {
      encoding: EncodingKey::from_secret(secret.as_bytes()),
      decoding: DecodingKey::from_secret(secret.as_bytes()),
      ttl: Duration::hours(ttl_hours),
    }
  }

  pub fn issue(&self, identity: &Identity) -> Result<String, AppError> {
    let now = Utc::now();
    let claims = Claims {
      sub: identity.user_id,
      email: identity.email.clone(),
      role: identity.role,
      iat: now.timestamp(),
      exp: (now + self.ttl).timestamp(),
    };
    encode(&Header::default(), &claims, &self.encoding)
      .map_err(|e| AppError::Internal(format!("Failed to sign session token: {e}")))
  }

  pub fn verify(&self, token: &str) -> Result<Identity, AppError> {
    let data = decode::<Claims>(token, &self.decoding, &Validation::default()).map_err(|e| {
      debug!(error = %e, "Rejected session token.");
      AppError::Auth("Invalid or expired token.".to_string())
    })?;
    Ok(Identity {
      user_id: data.claims.sub,
      email: data.claims.email,
      role: data.claims.role,
    })
  }
}

use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("invalid session key: {0}")]
    Key(jsonwebtoken::errors::Error),

    #[error("invalid session token: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    #[error("session token has no subject")]
    MissingSubject,
}

/// Turns a session token into the authenticated principal id.
pub trait SessionVerifier: Send + Sync {
    fn verify(&self, token: &str) -> Result<String, SessionError>;
}

#[derive(Debug, Deserialize)]
struct SessionClaims {
    sub: String,
}

/// Networkless verification of Clerk session JWTs against the instance's
/// PEM public key. The `sub` claim is the Clerk user id.
pub struct ClerkJwtVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl ClerkJwtVerifier {
    pub fn from_pem(pem: &str) -> Result<Self, SessionError> {
        let key = DecodingKey::from_rsa_pem(pem.as_bytes()).map_err(SessionError::Key)?;
        Ok(Self::with_key(key, Algorithm::RS256))
    }

    fn with_key(key: DecodingKey, algorithm: Algorithm) -> Self {
        let mut validation = Validation::new(algorithm);
        // Clerk session tokens carry no audience unless a custom template adds one.
        validation.validate_aud = false;
        Self { key, validation }
    }
}

impl SessionVerifier for ClerkJwtVerifier {
    fn verify(&self, token: &str) -> Result<String, SessionError> {
        let data = decode::<SessionClaims>(token, &self.key, &self.validation)?;
        if data.claims.sub.trim().is_empty() {
            return Err(SessionError::MissingSubject);
        }
        Ok(data.claims.sub)
    }
}

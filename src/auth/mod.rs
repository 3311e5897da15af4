use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Bearer token claims shared with the gateway. `sub` is the user login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    /// Comma-separated authorities, e.g. `ROLE_USER,ROLE_ADMIN`
    #[serde(default)]
    pub auth: String,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn new(login: impl Into<String>, authorities: &[String], expiry_hours: u64) -> Self {
        let now = Utc::now();
        let exp = (now + Duration::hours(expiry_hours as i64)).timestamp();

        Self {
            sub: login.into(),
            auth: authorities.join(","),
            exp,
            iat: now.timestamp(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    #[error("JWT generation error: {0}")]
    TokenGeneration(String),

    #[error("Invalid JWT token: {0}")]
    InvalidToken(String),

    #[error("Invalid JWT secret")]
    InvalidSecret,
}

pub fn generate_jwt(secret: &str, claims: &Claims) -> Result<String, JwtError> {
    if secret.is_empty() {
        return Err(JwtError::InvalidSecret);
    }

    let encoding_key = EncodingKey::from_secret(secret.as_bytes());
    encode(&Header::default(), claims, &encoding_key).map_err(|e| JwtError::TokenGeneration(e.to_string()))
}

/// HS256 verifier installed as a request extension
#[derive(Clone)]
pub struct Authenticator {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl Authenticator {
    pub fn new(secret: &str) -> Result<Self, JwtError> {
        if secret.is_empty() {
            return Err(JwtError::InvalidSecret);
        }

        Ok(Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::default(),
        })
    }

    pub fn verify(&self, token: &str) -> Result<Claims, JwtError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| JwtError::InvalidToken(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_tokens_verify_with_the_same_secret() {
        let claims = Claims::new("alice", &["ROLE_USER".to_string()], 1);
        let token = generate_jwt("secret", &claims).unwrap();

        let decoded = Authenticator::new("secret").unwrap().verify(&token).unwrap();
        assert_eq!(decoded.sub, "alice");
        assert_eq!(decoded.auth, "ROLE_USER");
    }

    #[test]
    fn foreign_secret_is_rejected() {
        let token = generate_jwt("secret", &Claims::new("alice", &[], 1)).unwrap();
        assert!(Authenticator::new("other").unwrap().verify(&token).is_err());
    }

    #[test]
    fn empty_secret_is_refused() {
        assert!(matches!(Authenticator::new(""), Err(JwtError::InvalidSecret)));
        assert!(generate_jwt("", &Claims::new("alice", &[], 1)).is_err());
    }
}

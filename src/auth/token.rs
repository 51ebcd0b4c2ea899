use crate::core::error::TokenError;
use crate::models::user::User;
use crate::utils::time::current_timestamp;
use anyhow::{Context, Result};
use jsonwebtoken::{errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Claims carried by a session token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub id: u64,
    pub username: String,
    pub email: String,
    pub iat: i64,
    pub exp: i64,
}

/// Mints and verifies HS256 session tokens
#[derive(Clone)]
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: i64,
}

impl TokenIssuer {
    pub fn new(secret: &[u8], ttl: i64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            ttl,
        }
    }

    pub fn issue(&self, user: &User) -> Result<String> {
        self.issue_at(user, current_timestamp())
    }

    /// Mint a token as if issued at `issued_at`
    pub fn issue_at(&self, user: &User, issued_at: i64) -> Result<String> {
        let claims = Claims {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            iat: issued_at,
            exp: issued_at + self.ttl,
        };

        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .context("Failed to sign token")
    }

    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                ErrorKind::InvalidSignature => TokenError::InvalidSignature,
                _ => TokenError::Malformed(e.to_string()),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"test-secret-0123456789";

    fn user() -> User {
        User::new(42, "alice".to_string(), "a@b.com".to_string(), "hash".to_string())
    }

    #[test]
    fn test_issue_and_verify() {
        let issuer = TokenIssuer::new(SECRET, 3600);
        let token = issuer.issue(&user()).unwrap();

        let claims = issuer.verify(&token).unwrap();
        assert_eq!(claims.id, 42);
        assert_eq!(claims.username, "alice");
        assert_eq!(claims.email, "a@b.com");
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_token_does_not_carry_password_hash() {
        let issuer = TokenIssuer::new(SECRET, 3600);
        let token = issuer.issue(&user()).unwrap();

        let claims = issuer.verify(&token).unwrap();
        let json = serde_json::to_string(&claims).unwrap();
        assert!(!json.contains("hash"));
    }

    #[test]
    fn test_expired_token_rejected() {
        let issuer = TokenIssuer::new(SECRET, 3600);
        let issued_at = current_timestamp() - 3601;
        let token = issuer.issue_at(&user(), issued_at).unwrap();

        assert_eq!(issuer.verify(&token), Err(TokenError::Expired));
    }

    #[test]
    fn test_token_valid_just_before_expiry() {
        let issuer = TokenIssuer::new(SECRET, 3600);
        let issued_at = current_timestamp() - 3500;
        let token = issuer.issue_at(&user(), issued_at).unwrap();

        assert!(issuer.verify(&token).is_ok());
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let issuer = TokenIssuer::new(SECRET, 3600);
        let other = TokenIssuer::new(b"another-secret-9876543210", 3600);
        let token = other.issue(&user()).unwrap();

        assert_eq!(issuer.verify(&token), Err(TokenError::InvalidSignature));
    }

    #[test]
    fn test_tampered_token_rejected() {
        let issuer = TokenIssuer::new(SECRET, 3600);
        let token = issuer.issue(&user()).unwrap();

        let mut parts: Vec<String> = token.split('.').map(str::to_string).collect();
        let forged = TokenIssuer::new(b"attacker-secret-000000", 3600)
            .issue(&User::new(1, "root".into(), "root@b.com".into(), "x".into()))
            .unwrap();
        parts[1] = forged.split('.').nth(1).unwrap().to_string();

        assert_eq!(issuer.verify(&parts.join(".")), Err(TokenError::InvalidSignature));
    }

    #[test]
    fn test_garbage_token_malformed() {
        let issuer = TokenIssuer::new(SECRET, 3600);
        assert!(matches!(issuer.verify("not.a.jwt"), Err(TokenError::Malformed(_))));
        assert!(matches!(issuer.verify(""), Err(TokenError::Malformed(_))));
    }
}

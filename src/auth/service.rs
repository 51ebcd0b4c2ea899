use crate::auth::password::{hash_password, verify_password};
use crate::auth::token::{Claims, TokenIssuer};
use crate::core::config::AuthConfig;
use crate::core::error::{CredentialError, StoreError, UniqueField};
use crate::models::auth::{LoginRequest, RegisterRequest};
use crate::models::user::{NewUser, User, UserProfile};
use crate::stores::user_store::UserStore;
use std::sync::Arc;
use tracing::{info, warn};

const REGISTER_FAILED: &str = "Server error during registration";
const LOGIN_FAILED: &str = "Server error during login";

/// Result of a successful login
#[derive(Debug)]
pub struct LoginOutcome {
    pub token: String,
    pub user: UserProfile,
}

/// Registration, login and token verification
///
/// Holds no mutable state of its own; everything it needs is passed in at
/// construction, so clones can be shared freely across request handlers.
#[derive(Clone)]
pub struct CredentialService {
    store: Arc<dyn UserStore>,
    tokens: TokenIssuer,
    bcrypt_cost: u32,
}

impl CredentialService {
    pub fn new(store: Arc<dyn UserStore>, config: &AuthConfig) -> Self {
        Self {
            store,
            tokens: TokenIssuer::new(config.jwt_secret.as_bytes(), config.token_ttl),
            bcrypt_cost: config.bcrypt_cost,
        }
    }

    pub async fn register(&self, request: RegisterRequest) -> Result<UserProfile, CredentialError> {
        let registration = request.validate()?;

        let internal = |e: StoreError| CredentialError::internal(REGISTER_FAILED, e);

        if self
            .store
            .find_by_username(&registration.username)
            .map_err(internal)?
            .is_some()
        {
            return Err(conflict(UniqueField::Username));
        }

        if self
            .store
            .find_by_email(&registration.email)
            .map_err(internal)?
            .is_some()
        {
            return Err(conflict(UniqueField::Email));
        }

        let cost = self.bcrypt_cost;
        let password = registration.password;
        let password_hash = tokio::task::spawn_blocking(move || hash_password(&password, cost))
            .await
            .map_err(|e| CredentialError::internal(REGISTER_FAILED, e))?
            .map_err(|e| CredentialError::internal(REGISTER_FAILED, e))?;

        let user = match self.store.create(NewUser {
            username: registration.username,
            email: registration.email,
            password_hash,
        }) {
            Ok(user) => user,
            Err(StoreError::Duplicate(field)) => {
                // Lost the race against a concurrent registration
                warn!(field = %field, "Duplicate detected on user create");
                return Err(conflict(field));
            }
            Err(e) => return Err(internal(e)),
        };

        info!(user_id = user.id, username = %user.username, "User registered");

        Ok(user.profile())
    }

    pub async fn login(&self, request: LoginRequest) -> Result<LoginOutcome, CredentialError> {
        let user: Arc<User> = self
            .store
            .find_by_email(&request.email)
            .map_err(|e| CredentialError::internal(LOGIN_FAILED, e))?
            .ok_or(CredentialError::InvalidEmail)?;

        let password = request.password;
        let stored_hash = user.password_hash.clone();
        let matches = tokio::task::spawn_blocking(move || verify_password(&password, &stored_hash))
            .await
            .map_err(|e| CredentialError::internal(LOGIN_FAILED, e))?
            .map_err(|e| CredentialError::internal(LOGIN_FAILED, e))?;

        if !matches {
            info!(user_id = user.id, "Login rejected: password mismatch");
            return Err(CredentialError::InvalidPassword);
        }

        let token = self
            .tokens
            .issue(&user)
            .map_err(|e| CredentialError::internal(LOGIN_FAILED, e))?;

        info!(user_id = user.id, username = %user.username, "User logged in");

        Ok(LoginOutcome {
            token,
            user: user.profile(),
        })
    }

    pub fn verify_token(&self, token: &str) -> Result<Claims, CredentialError> {
        Ok(self.tokens.verify(token)?)
    }

    pub fn tokens(&self) -> &TokenIssuer {
        &self.tokens
    }
}

fn conflict(field: UniqueField) -> CredentialError {
    match field {
        UniqueField::Username => CredentialError::Conflict("Username already exists".to_string()),
        UniqueField::Email => CredentialError::Conflict("Email already exists".to_string()),
    }
}

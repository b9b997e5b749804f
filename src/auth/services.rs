use std::sync::Arc;

use axum::extract::FromRef;
use tracing::{info, warn};

use crate::auth::dto::RegisterRequest;
use crate::auth::jwt::JwtKeys;
use crate::auth::password;
use crate::error::ApiError;
use crate::state::AppState;
use crate::store::{NewUser, User, UserStore};

/// Registration, login, token-based identity and password change over the
/// credential store. Stateless besides the store and the signing keys.
#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn UserStore>,
    jwt: JwtKeys,
}

impl FromRef<AppState> for AuthService {
    fn from_ref(state: &AppState) -> Self {
        Self::new(state.store.clone(), state.jwt.clone())
    }
}

impl AuthService {
    pub fn new(store: Arc<dyn UserStore>, jwt: JwtKeys) -> Self {
        Self { store, jwt }
    }

    /// Create a user and sign a token for it. The username conflict is
    /// checked before the email conflict; the store's unique constraints
    /// close the race between check and insert.
    pub async fn register(&self, new_user: RegisterRequest) -> Result<(User, String), ApiError> {
        if self
            .store
            .find_by_username(&new_user.username)
            .await?
            .is_some()
        {
            warn!(username = %new_user.username, "registration with taken username");
            return Err(ApiError::DuplicateUsername);
        }
        if self.store.find_by_email(&new_user.email).await?.is_some() {
            warn!(email = %new_user.email, "registration with registered email");
            return Err(ApiError::DuplicateEmail);
        }

        // No store lock is held while hashing.
        let password_hash = password::hash_password(&new_user.password)?;
        let user = self
            .store
            .insert(NewUser {
                username: new_user.username,
                email: new_user.email,
                first_name: new_user.first_name,
                last_name: new_user.last_name,
                password_hash,
            })
            .await?;

        let token = self.jwt.sign(&user.username)?;
        info!(user_id = %user.id, username = %user.username, "user registered");
        Ok((user, token))
    }

    /// Unknown username and wrong password both come back as
    /// `InvalidCredentials`; the caller cannot tell which one happened.
    pub async fn login(&self, username: &str, password: &str) -> Result<(User, String), ApiError> {
        let user = match self.store.find_by_username(username).await? {
            Some(user) => user,
            None => {
                warn!(username = %username, "login with unknown username");
                return Err(ApiError::InvalidCredentials);
            }
        };

        if !password::verify_password(password, &user.password_hash)? {
            warn!(user_id = %user.id, username = %username, "login with wrong password");
            return Err(ApiError::InvalidCredentials);
        }

        let token = self.jwt.sign(&user.username)?;
        info!(user_id = %user.id, username = %user.username, "user logged in");
        Ok((user, token))
    }

    /// Resolve a bearer token to its user. A valid token whose subject no
    /// longer exists is `UserNotFound`.
    pub async fn current_user(&self, token: &str) -> Result<User, ApiError> {
        let claims = self.jwt.verify(token)?;
        self.store
            .find_by_username(&claims.sub)
            .await?
            .ok_or(ApiError::UserNotFound)
    }

    /// Re-hash and store a new password after checking the old one.
    /// Previously issued tokens keep verifying until they expire; nothing
    /// is tracked per token.
    pub async fn change_password(
        &self,
        token: &str,
        old_password: &str,
        new_password: &str,
    ) -> Result<(), ApiError> {
        let mut user = self.current_user(token).await?;

        if !password::verify_password(old_password, &user.password_hash)? {
            warn!(user_id = %user.id, "password change with wrong old password");
            return Err(ApiError::IncorrectPassword);
        }

        user.password_hash = password::hash_password(new_password)?;
        self.store.update(&user).await?;
        info!(user_id = %user.id, username = %user.username, "password changed");
        Ok(())
    }
}

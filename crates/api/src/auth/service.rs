//! Signup, login and token resolution on top of the user repository.

use std::sync::Arc;

use tracing::{info, instrument};

use dispatch_domain::{CreateUser, User, UserRepository};

use crate::auth::{password, AuthConfig, AuthError, JwtService};
use crate::error::{ApiError, ApiResult};

/// A freshly signed access token, ready to serialize into a response.
pub struct IssuedToken {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
}

pub struct AuthService {
    jwt: JwtService,
    users: Arc<dyn UserRepository>,
}

impl AuthService {
    pub fn new(config: &AuthConfig, users: Arc<dyn UserRepository>) -> Self {
        Self {
            jwt: JwtService::new(&config.jwt_secret, config.access_token_expire_minutes),
            users,
        }
    }

    #[instrument(skip(self, password_plain))]
    pub async fn signup(
        &self,
        username: &str,
        email: &str,
        password_plain: &str,
    ) -> ApiResult<(User, IssuedToken)> {
        if username.trim().is_empty() || email.trim().is_empty() || password_plain.is_empty() {
            return Err(ApiError::BadRequest(
                "username, email and password are required".to_string(),
            ));
        }
        if self.users.find_by_email(email).await?.is_some() {
            return Err(ApiError::BadRequest("Email already registered".to_string()));
        }

        let user = self
            .users
            .create(&CreateUser {
                username: username.to_string(),
                email: email.to_string(),
                password_hash: password::hash_password(password_plain)?,
            })
            .await?;

        info!(user_id = user.id, "user registered");
        let token = self.issue_for(&user)?;
        Ok((user, token))
    }

    /// Unknown email, wrong password and a deactivated account all fail
    /// with the same error so callers cannot probe for registered emails.
    #[instrument(skip(self, password_plain))]
    pub async fn login(&self, email: &str, password_plain: &str) -> ApiResult<(User, IssuedToken)> {
        let user = match self.users.find_by_email(email).await? {
            Some(user)
                if user.is_active && password::verify_password(password_plain, &user.password_hash) =>
            {
                user
            }
            _ => return Err(AuthError::InvalidCredentials.into()),
        };

        let token = self.issue_for(&user)?;
        Ok((user, token))
    }

    /// Verifies a bearer token and loads its subject. Tokens for
    /// deleted or deactivated users read as invalid.
    pub async fn resolve_token(&self, token: &str) -> ApiResult<User> {
        let claims = self.jwt.validate_token(token)?;
        let user_id = claims.user_id().ok_or(AuthError::InvalidToken)?;

        match self.users.find_by_id(user_id).await? {
            Some(user) if user.is_active => Ok(user),
            _ => Err(AuthError::InvalidToken.into()),
        }
    }

    /// Issues a fresh token for an already-authenticated caller.
    pub async fn refresh(&self, user_id: i64) -> ApiResult<IssuedToken> {
        match self.users.find_by_id(user_id).await? {
            Some(user) if user.is_active => self.issue_for(&user),
            _ => Err(AuthError::InvalidToken.into()),
        }
    }

    fn issue_for(&self, user: &User) -> ApiResult<IssuedToken> {
        let access_token = self
            .jwt
            .issue_token(user.id)
            .map_err(|e| ApiError::Internal(format!("failed to sign token: {e}")))?;
        Ok(IssuedToken {
            access_token,
            token_type: "Bearer",
            expires_in: self.jwt.expires_in_seconds(),
        })
    }
}

//! Signup, login and token refresh endpoints.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::auth::service::IssuedToken;
use crate::auth::CurrentUser;
use crate::error::ApiResult;
use crate::response::{created, success, ApiResponse};
use crate::routes::AppState;

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

impl From<IssuedToken> for TokenResponse {
    fn from(token: IssuedToken) -> Self {
        Self {
            access_token: token.access_token,
            token_type: token.token_type.to_string(),
            expires_in: token.expires_in,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SignupResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub username: String,
    pub email: String,
}

pub async fn signup(
    State(state): State<AppState>,
    Json(request): Json<SignupRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<SignupResponse>>)> {
    let (user, token) = state
        .auth_service
        .signup(&request.username, &request.email, &request.password)
        .await?;

    Ok(created(SignupResponse {
        access_token: token.access_token,
        token_type: token.token_type.to_string(),
        expires_in: token.expires_in,
        username: user.username,
        email: user.email,
    }))
}

pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<TokenResponse>>)> {
    let (_user, token) = state
        .auth_service
        .login(&request.email, &request.password)
        .await?;
    Ok(success(token.into()))
}

/// Trades a still-valid token for a fresh one.
pub async fn refresh(
    State(state): State<AppState>,
    user: CurrentUser,
) -> ApiResult<(StatusCode, Json<ApiResponse<TokenResponse>>)> {
    let token = state.auth_service.refresh(user.id).await?;
    Ok(success(token.into()))
}

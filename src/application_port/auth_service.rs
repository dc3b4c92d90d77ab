use crate::domain_model::{AccessToken, RefreshToken, UserId};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Externally surfaced failure taxonomy. Deliberately coarse: decode
/// failure, stale rotation and invalidated family all collapse into
/// `InvalidRefreshToken` so the caller cannot tell which sub-case occurred.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("refresh token is not valid")]
    InvalidRefreshToken,
    #[error("unauthorized")]
    Unauthorized,
    #[error("store error: {0}")]
    Store(String),
    #[error("internal error: {0}")]
    InternalError(String),
}

#[derive(Debug, Clone)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct LoginResult {
    pub user_id: UserId,
    pub tokens: TokenPair,
}

#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub access_token: AccessToken,
    pub refresh_token: RefreshToken,
    pub access_token_expires_at: DateTime<Utc>,
    pub refresh_token_expires_at: DateTime<Utc>,
}

/// `Single` terminates the presented token only; `Family` terminates every
/// session descended from the same login.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum LogoutScope {
    Single,
    Family,
}

#[async_trait::async_trait]
pub trait CredentialHasher: Send + Sync {
    async fn hash_password(&self, password: &str) -> Result<String, AuthError>;
    async fn verify_password(&self, password: &str, password_hash: &str)
    -> Result<bool, AuthError>;
}

#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    async fn login(&self, request: LoginInput) -> Result<LoginResult, AuthError>;
    async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AuthError>;
    async fn logout(&self, refresh_token: &str, scope: LogoutScope) -> Result<(), AuthError>;
    async fn verify_access_token(&self, token: &str) -> Result<UserId, AuthError>;
}

use crate::domain_model::{AccessToken, FamilyId, RefreshToken, ResetToken, TokenId, UserId};
use chrono::{DateTime, Utc};

/// Codec-internal failure detail. Mapped to the coarse [`super::AuthError`]
/// surface by the services; never returned to a caller directly.
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("token expired")]
    Expired,
    #[error("invalid signature")]
    InvalidSignature,
    #[error("audience mismatch")]
    AudienceMismatch,
    #[error("malformed token")]
    Malformed,
    #[error("internal error: {0}")]
    InternalError(String),
}

#[derive(Debug, Clone)]
pub struct AccessClaimsView {
    pub user_id: UserId,
    pub jti: TokenId,
}

#[derive(Debug, Clone)]
pub struct RefreshClaimsView {
    pub user_id: UserId,
    pub jti: TokenId,
    pub fid: FamilyId,
}

/// Signed, time-bounded token encode/decode. Pure verification, no side
/// effects, no store access.
#[async_trait::async_trait]
pub trait TokenCodec: Send + Sync {
    async fn issue_access_token(
        &self,
        user: UserId,
        jti: Option<TokenId>,
    ) -> Result<(AccessToken, DateTime<Utc>), TokenError>;

    async fn issue_refresh_token(
        &self,
        user: UserId,
        jti: TokenId,
        fid: FamilyId,
    ) -> Result<(RefreshToken, DateTime<Utc>), TokenError>;

    /// Reset tokens are signed with a caller-supplied secret (derived from
    /// the user's current password hash), not the server secret alone.
    async fn issue_reset_token(
        &self,
        user: UserId,
        secret: &[u8],
    ) -> Result<(ResetToken, DateTime<Utc>), TokenError>;

    async fn verify_access_token(
        &self,
        token: &AccessToken,
    ) -> Result<AccessClaimsView, TokenError>;

    async fn verify_refresh_token(
        &self,
        token: &RefreshToken,
    ) -> Result<RefreshClaimsView, TokenError>;

    /// Reads the subject claim without verifying the signature. Only used to
    /// learn whose current password hash the verification secret must be
    /// re-derived from; the result carries no trust.
    async fn peek_reset_subject(&self, token: &ResetToken) -> Result<UserId, TokenError>;

    async fn verify_reset_token(
        &self,
        token: &ResetToken,
        secret: &[u8],
    ) -> Result<UserId, TokenError>;
}

use super::AuthError;
use crate::domain_model::{ResetToken, UserId};

/// Issues and verifies single-use password-reset tokens.
///
/// `request` returns `None` when the email does not belong to a real user;
/// the caller must not let that distinction leak through response timing or
/// shape. The token itself travels over an external channel (email), never
/// the HTTP response.
#[async_trait::async_trait]
pub trait PasswordResetService: Send + Sync {
    async fn request(&self, email: &str) -> Result<Option<ResetToken>, AuthError>;
    async fn verify(&self, token: &str) -> Result<UserId, AuthError>;
}

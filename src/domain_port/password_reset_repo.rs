use crate::application_port::AuthError;
use crate::domain_model::{ResetToken, UserId};

/// Optional audit/revocation store for reset tokens. Self-invalidation does
/// not depend on it; when configured it additionally enforces single use.
#[async_trait::async_trait]
pub trait PasswordResetTokenRepo: Send + Sync {
    async fn save_password_reset_token(
        &self,
        user_id: UserId,
        token: &ResetToken,
    ) -> Result<(), AuthError>;

    /// Atomically check the token is on record and unused, and mark it used.
    async fn consume(&self, user_id: UserId, token: &ResetToken) -> Result<bool, AuthError>;
}

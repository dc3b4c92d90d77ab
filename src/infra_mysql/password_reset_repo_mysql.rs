use crate::application_port::AuthError;
use crate::domain_model::{ResetToken, UserId};
use crate::domain_port::PasswordResetTokenRepo;
use sha2::{Digest, Sha256};
use sqlx::MySqlPool;

/// Audit/revocation store for reset tokens. Only a SHA-256 digest of the
/// token is persisted, never the token itself.
pub struct MySqlPasswordResetTokenRepo {
    pool: MySqlPool,
}

impl MySqlPasswordResetTokenRepo {
    pub fn new(pool: MySqlPool) -> Self {
        MySqlPasswordResetTokenRepo { pool }
    }

    fn digest(token: &ResetToken) -> String {
        hex::encode(Sha256::digest(token.0.as_bytes()))
    }
}

#[async_trait::async_trait]
impl PasswordResetTokenRepo for MySqlPasswordResetTokenRepo {
    async fn save_password_reset_token(
        &self,
        user_id: UserId,
        token: &ResetToken,
    ) -> Result<(), AuthError> {
        sqlx::query(
            r#"
INSERT INTO password_reset_token (user_id, token_digest)
VALUES (?, ?)
"#,
        )
        .bind(user_id.0.as_bytes() as &[u8])
        .bind(Self::digest(token))
        .execute(&self.pool)
        .await
        .map_err(|e| AuthError::Store(e.to_string()))?;

        Ok(())
    }

    async fn consume(&self, user_id: UserId, token: &ResetToken) -> Result<bool, AuthError> {
        // Single UPDATE doubles as the atomic check-and-mark.
        let result = sqlx::query(
            r#"
UPDATE password_reset_token
SET used_at = NOW()
WHERE user_id = ? AND token_digest = ? AND used_at IS NULL
"#,
        )
        .bind(user_id.0.as_bytes() as &[u8])
        .bind(Self::digest(token))
        .execute(&self.pool)
        .await
        .map_err(|e| AuthError::Store(e.to_string()))?;

        Ok(result.rows_affected() == 1)
    }
}

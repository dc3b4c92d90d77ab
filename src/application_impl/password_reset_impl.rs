use super::ResetSecretDeriver;
use crate::application_port::{AuthError, PasswordResetService, TokenCodec, TokenError};
use crate::domain_model::{ResetToken, UserId};
use crate::domain_port::{PasswordResetTokenRepo, UserRepo};
use nanoid::nanoid;
use std::sync::Arc;
use tracing::debug;

/// Length of an argon2id PHC string, so a synthetic hash keeps the shape of
/// a real one.
const SYNTHETIC_HASH_LEN: usize = 97;

/// Extra length the synthetic stand-in secret carries beyond the server
/// secret, matching the width of a stored credential hash.
const SYNTHETIC_SEED_PAD: usize = 60;

/// Outcome of the subject lookup, resolved up front so issuance runs one
/// shared derive-and-sign path whether or not the email matched a user.
enum ResolvedSubject {
    Real { id: UserId, hash: String },
    Synthetic { id: UserId, hash: String, seed: String },
}

pub struct RealPasswordResetService {
    user_repo: Arc<dyn UserRepo>,
    token_codec: Arc<dyn TokenCodec>,
    reset_repo: Option<Arc<dyn PasswordResetTokenRepo>>,
    deriver: ResetSecretDeriver,
}

impl RealPasswordResetService {
    pub fn new(
        user_repo: Arc<dyn UserRepo>,
        token_codec: Arc<dyn TokenCodec>,
        reset_repo: Option<Arc<dyn PasswordResetTokenRepo>>,
        deriver: ResetSecretDeriver,
    ) -> Self {
        Self {
            user_repo,
            token_codec,
            reset_repo,
            deriver,
        }
    }

    fn synthesize(&self) -> ResolvedSubject {
        ResolvedSubject::Synthetic {
            id: UserId(uuid::Uuid::new_v4()),
            hash: nanoid!(SYNTHETIC_HASH_LEN),
            // Braces keep the expression a single token tree for nanoid!.
            #[allow(unused_braces)]
            seed: nanoid!({ self.deriver.server_secret_len() + SYNTHETIC_SEED_PAD }),
        }
    }
}

fn opaque_reset_err(e: TokenError) -> AuthError {
    debug!(cause = %e, "reset token rejected");
    AuthError::Unauthorized
}

#[async_trait::async_trait]
impl PasswordResetService for RealPasswordResetService {
    async fn request(&self, email: &str) -> Result<Option<ResetToken>, AuthError> {
        let subject = match self.user_repo.get_by_email(email).await? {
            Some(user) if user.is_active => ResolvedSubject::Real {
                id: user.user_id,
                hash: user.password_hash,
            },
            // Unknown and deactivated accounts take the same path as real
            // ones: a fabricated subject with a stand-in secret.
            _ => self.synthesize(),
        };

        let (uid, secret) = match &subject {
            ResolvedSubject::Real { id, hash } => (*id, self.deriver.derive(hash)),
            ResolvedSubject::Synthetic { id, hash, seed } => {
                (*id, ResetSecretDeriver::derive_with(seed.as_bytes(), hash))
            }
        };

        let (token, _expires_at) = self
            .token_codec
            .issue_reset_token(uid, &secret)
            .await
            .map_err(|e| AuthError::InternalError(e.to_string()))?;

        match subject {
            ResolvedSubject::Real { id, .. } => {
                if let Some(repo) = &self.reset_repo {
                    repo.save_password_reset_token(id, &token).await?;
                }
                Ok(Some(token))
            }
            ResolvedSubject::Synthetic { .. } => Ok(None),
        }
    }

    async fn verify(&self, token: &str) -> Result<UserId, AuthError> {
        let token = ResetToken(token.to_string());

        // The unverified subject claim only tells us whose current hash to
        // re-derive the secret from; trust comes from the verification below.
        let claimed = self
            .token_codec
            .peek_reset_subject(&token)
            .await
            .map_err(opaque_reset_err)?;

        let user = self
            .user_repo
            .get_by_id(claimed)
            .await?
            .filter(|u| u.is_active)
            .ok_or(AuthError::Unauthorized)?;

        // A token signed under a previous password hash fails right here,
        // with no revocation record needed.
        let secret = self.deriver.derive(&user.password_hash);
        let uid = self
            .token_codec
            .verify_reset_token(&token, &secret)
            .await
            .map_err(opaque_reset_err)?;

        if let Some(repo) = &self.reset_repo {
            if !repo.consume(uid, &token).await? {
                debug!(user = %uid, "reset token not on record or already used");
                return Err(AuthError::Unauthorized);
            }
        }

        Ok(uid)
    }
}

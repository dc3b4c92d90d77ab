use crate::application_port::{
    AuthError, AuthService, CredentialHasher, LoginInput, LoginResult, LogoutScope, TokenCodec,
    TokenError, TokenPair,
};
use crate::domain_model::{AccessToken, FamilyId, RefreshToken, TokenId, UserId};
use crate::domain_port::{RefreshTokenRepo, UserRepo};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, warn};

/// Refresh-token rotation engine.
///
/// Family state lives in the [`RefreshTokenRepo`]; per family it is either
/// `ACTIVE(current jti)` or invalidated. Login creates a family, every
/// successful refresh advances its current jti via CAS, and any CAS miss is
/// treated as a replay/theft signal that tears down the whole family.
pub struct RealAuthService {
    user_repo: Arc<dyn UserRepo>,
    refresh_repo: Arc<dyn RefreshTokenRepo>,
    credential_hasher: Arc<dyn CredentialHasher>,
    token_codec: Arc<dyn TokenCodec>,
}

impl RealAuthService {
    pub fn new(
        user_repo: Arc<dyn UserRepo>,
        refresh_repo: Arc<dyn RefreshTokenRepo>,
        credential_hasher: Arc<dyn CredentialHasher>,
        token_codec: Arc<dyn TokenCodec>,
    ) -> Self {
        Self {
            user_repo,
            refresh_repo,
            credential_hasher,
            token_codec,
        }
    }

    fn ttl_secs(until: DateTime<Utc>) -> u64 {
        let secs = (until - Utc::now()).num_seconds();
        if secs <= 0 { 1 } else { secs as u64 }
    }

    async fn issue_pair(
        &self,
        user_id: UserId,
        jti: TokenId,
        fid: FamilyId,
    ) -> Result<TokenPair, AuthError> {
        let (access_token, access_exp) = self
            .token_codec
            .issue_access_token(user_id, Some(jti))
            .await
            .map_err(internal)?;
        let (refresh_token, refresh_exp) = self
            .token_codec
            .issue_refresh_token(user_id, jti, fid)
            .await
            .map_err(internal)?;

        Ok(TokenPair {
            access_token,
            refresh_token,
            access_token_expires_at: access_exp,
            refresh_token_expires_at: refresh_exp,
        })
    }
}

/// Decode failures on the refresh path collapse into one opaque error; the
/// cause stays in the logs so the caller gets no expired/forged/replayed
/// oracle.
fn opaque_refresh_err(e: TokenError) -> AuthError {
    debug!(cause = %e, "refresh token rejected at decode");
    AuthError::InvalidRefreshToken
}

fn internal(e: TokenError) -> AuthError {
    AuthError::InternalError(e.to_string())
}

#[async_trait::async_trait]
impl AuthService for RealAuthService {
    async fn login(&self, request: LoginInput) -> Result<LoginResult, AuthError> {
        let LoginInput { email, password } = request;

        let user = self
            .user_repo
            .get_by_email(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !user.is_active {
            return Err(AuthError::InvalidCredentials);
        }

        let ok = self
            .credential_hasher
            .verify_password(&password, &user.password_hash)
            .await?;
        if !ok {
            return Err(AuthError::InvalidCredentials);
        }

        let fid = FamilyId::generate();
        let jti = TokenId::generate();
        let tokens = self.issue_pair(user.user_id, jti, fid).await?;

        self.refresh_repo
            .create_family(fid, jti, Self::ttl_secs(tokens.refresh_token_expires_at))
            .await?;

        debug!(user = %user.user_id, %fid, "login issued new token family");

        Ok(LoginResult {
            user_id: user.user_id,
            tokens,
        })
    }

    async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AuthError> {
        // Decode failure must not touch the store.
        let claims = self
            .token_codec
            .verify_refresh_token(&RefreshToken(refresh_token.to_string()))
            .await
            .map_err(opaque_refresh_err)?;

        if !self.user_repo.id_exists(claims.user_id).await? {
            debug!(user = %claims.user_id, "refresh for unknown user");
            return Err(AuthError::InvalidRefreshToken);
        }

        let next = TokenId::generate();
        let tokens = self.issue_pair(claims.user_id, next, claims.fid).await?;

        let advanced = self
            .refresh_repo
            .cas_advance(
                claims.fid,
                claims.jti,
                next,
                Self::ttl_secs(tokens.refresh_token_expires_at),
            )
            .await?;

        if !advanced {
            // Either the presented jti was already superseded or the family
            // is gone. Both read as replay or theft; tear down the family so
            // even the currently valid token forces a re-login.
            warn!(user = %claims.user_id, fid = %claims.fid, jti = %claims.jti,
                "stale refresh token presented, invalidating family");
            self.refresh_repo.invalidate_family(claims.fid).await?;
            return Err(AuthError::InvalidRefreshToken);
        }

        Ok(tokens)
    }

    async fn logout(&self, refresh_token: &str, scope: LogoutScope) -> Result<(), AuthError> {
        let claims = self
            .token_codec
            .verify_refresh_token(&RefreshToken(refresh_token.to_string()))
            .await
            .map_err(opaque_refresh_err)?;

        match scope {
            LogoutScope::Single => self.refresh_repo.invalidate(claims.jti, claims.fid).await,
            LogoutScope::Family => self.refresh_repo.invalidate_family(claims.fid).await,
        }
    }

    async fn verify_access_token(&self, token: &str) -> Result<UserId, AuthError> {
        let claims = self
            .token_codec
            .verify_access_token(&AccessToken(token.to_string()))
            .await
            .map_err(|e| {
                debug!(cause = %e, "access token rejected");
                AuthError::Unauthorized
            })?;

        if !self.user_repo.id_exists(claims.user_id).await? {
            return Err(AuthError::Unauthorized);
        }

        Ok(claims.user_id)
    }
}

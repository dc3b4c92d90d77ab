use crate::application_port::{
    AuthError, AuthService, LoginInput, LoginResult, LogoutScope, TokenPair,
};
use crate::domain_model::{AccessToken, RefreshToken, UserId};
use chrono::{Duration, Utc};

#[derive(Debug)]
pub struct FakeAuthService;

impl FakeAuthService {
    pub fn new() -> Self {
        Self
    }
}

impl Default for FakeAuthService {
    fn default() -> Self {
        Self::new()
    }
}

// Minimal fake for frontend development against a server without real
// storage. No rotation state: any fake refresh token stays valid.
#[async_trait::async_trait]
impl AuthService for FakeAuthService {
    async fn login(&self, request: LoginInput) -> Result<LoginResult, AuthError> {
        Ok(LoginResult {
            user_id: fake_id(&request.email),
            tokens: fake_pair(&request.email),
        })
    }

    async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AuthError> {
        if let Some(email) = refresh_token.strip_prefix("fake-refresh-token:") {
            Ok(fake_pair(email))
        } else {
            Err(AuthError::InvalidRefreshToken)
        }
    }

    async fn logout(&self, refresh_token: &str, _scope: LogoutScope) -> Result<(), AuthError> {
        if refresh_token.starts_with("fake-refresh-token:") {
            Ok(())
        } else {
            Err(AuthError::InvalidRefreshToken)
        }
    }

    async fn verify_access_token(&self, token: &str) -> Result<UserId, AuthError> {
        if let Some(email) = token.strip_prefix("fake-access-token:") {
            Ok(fake_id(email))
        } else {
            Err(AuthError::Unauthorized)
        }
    }
}

fn fake_id(email: &str) -> UserId {
    UserId(uuid::Uuid::new_v5(
        &uuid::Uuid::NAMESPACE_OID,
        email.as_bytes(),
    ))
}

fn fake_pair(email: &str) -> TokenPair {
    let now = Utc::now();
    TokenPair {
        access_token: AccessToken(format!("fake-access-token:{}", email)),
        access_token_expires_at: now + Duration::days(1),
        refresh_token: RefreshToken(format!("fake-refresh-token:{}", email)),
        refresh_token_expires_at: now + Duration::days(7),
    }
}

#![allow(dead_code)] // each integration test binary uses a different subset

use gatehouse::application_impl::{JwtConfig, JwtHs256Codec, RealAuthService, ResetSecretDeriver};
use gatehouse::application_port::{
    AccessClaimsView, AuthError, CredentialHasher, RefreshClaimsView, TokenCodec, TokenError,
};
use gatehouse::domain_model::{
    AccessToken, FamilyId, RefreshToken, ResetToken, TokenId, UserId,
};
use gatehouse::domain_port::{
    PasswordResetTokenRepo, RefreshTokenRepo, UserRecord, UserRepo,
};
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const SERVER_SECRET: &[u8] = b"test-server-secret";

pub fn test_codec(refresh_ttl: Duration) -> Arc<JwtHs256Codec> {
    Arc::new(JwtHs256Codec::new(JwtConfig {
        issuer: "gatehouse.test".to_string(),
        access_ttl: Duration::from_secs(60),
        refresh_ttl,
        reset_ttl: Duration::from_secs(3600),
        signing_key: SERVER_SECRET.to_vec(),
    }))
}

// region user repo double

pub struct MemoryUserRepo {
    users: Mutex<HashMap<UserId, UserRecord>>,
    pub email_lookups: AtomicUsize,
}

impl MemoryUserRepo {
    pub fn new() -> Self {
        MemoryUserRepo {
            users: Mutex::new(HashMap::new()),
            email_lookups: AtomicUsize::new(0),
        }
    }

    pub fn add(&self, email: &str, password_hash: &str) -> UserId {
        let user_id = UserId(uuid::Uuid::new_v4());
        self.users.lock().unwrap().insert(
            user_id,
            UserRecord {
                user_id,
                email: email.to_string(),
                password_hash: password_hash.to_string(),
                is_active: true,
            },
        );
        user_id
    }

    pub fn set_password_hash(&self, user_id: UserId, password_hash: &str) {
        let mut users = self.users.lock().unwrap();
        let user = users.get_mut(&user_id).expect("unknown test user");
        user.password_hash = password_hash.to_string();
    }
}

#[async_trait::async_trait]
impl UserRepo for MemoryUserRepo {
    async fn get_by_email(&self, email: &str) -> Result<Option<UserRecord>, AuthError> {
        self.email_lookups.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .users
            .lock()
            .unwrap()
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn get_by_id(&self, user_id: UserId) -> Result<Option<UserRecord>, AuthError> {
        Ok(self.users.lock().unwrap().get(&user_id).cloned())
    }

    async fn id_exists(&self, user_id: UserId) -> Result<bool, AuthError> {
        Ok(self.users.lock().unwrap().contains_key(&user_id))
    }
}

// endregion

// region family store double

/// Mirrors the per-family state machine: `Active(current jti)` until the
/// family is torn down.
enum FamilyState {
    Active(TokenId),
    Invalidated,
}

pub struct MemoryFamilyStore {
    families: Mutex<HashMap<FamilyId, FamilyState>>,
    mutations: AtomicUsize,
}

impl MemoryFamilyStore {
    pub fn new() -> Self {
        MemoryFamilyStore {
            families: Mutex::new(HashMap::new()),
            mutations: AtomicUsize::new(0),
        }
    }

    /// Number of state changes the store has seen; lets tests assert that a
    /// rejected token left the store untouched.
    pub fn mutation_count(&self) -> usize {
        self.mutations.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl RefreshTokenRepo for MemoryFamilyStore {
    async fn create_family(
        &self,
        fid: FamilyId,
        jti: TokenId,
        _ttl_secs: u64,
    ) -> Result<(), AuthError> {
        self.families
            .lock()
            .unwrap()
            .insert(fid, FamilyState::Active(jti));
        self.mutations.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn is_valid(&self, jti: TokenId, fid: FamilyId) -> Result<bool, AuthError> {
        Ok(matches!(
            self.families.lock().unwrap().get(&fid),
            Some(FamilyState::Active(current)) if *current == jti
        ))
    }

    async fn cas_advance(
        &self,
        fid: FamilyId,
        expected: TokenId,
        next: TokenId,
        _ttl_secs: u64,
    ) -> Result<bool, AuthError> {
        let mut families = self.families.lock().unwrap();
        match families.get_mut(&fid) {
            Some(FamilyState::Active(current)) if *current == expected => {
                *current = next;
                self.mutations.fetch_add(1, Ordering::SeqCst);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn invalidate(&self, jti: TokenId, fid: FamilyId) -> Result<(), AuthError> {
        let mut families = self.families.lock().unwrap();
        if let Some(FamilyState::Active(current)) = families.get(&fid) {
            if *current == jti {
                families.remove(&fid);
                self.mutations.fetch_add(1, Ordering::SeqCst);
            }
        }
        Ok(())
    }

    async fn invalidate_family(&self, fid: FamilyId) -> Result<(), AuthError> {
        self.families
            .lock()
            .unwrap()
            .insert(fid, FamilyState::Invalidated);
        self.mutations.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

// endregion

// region reset repo double

pub struct MemoryResetRepo {
    saved: Mutex<Vec<(UserId, String)>>,
    used: Mutex<HashSet<String>>,
    pub saves: AtomicUsize,
}

impl MemoryResetRepo {
    pub fn new() -> Self {
        MemoryResetRepo {
            saved: Mutex::new(Vec::new()),
            used: Mutex::new(HashSet::new()),
            saves: AtomicUsize::new(0),
        }
    }
}

#[async_trait::async_trait]
impl PasswordResetTokenRepo for MemoryResetRepo {
    async fn save_password_reset_token(
        &self,
        user_id: UserId,
        token: &ResetToken,
    ) -> Result<(), AuthError> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        self.saved
            .lock()
            .unwrap()
            .push((user_id, token.0.clone()));
        Ok(())
    }

    async fn consume(&self, user_id: UserId, token: &ResetToken) -> Result<bool, AuthError> {
        let on_record = self
            .saved
            .lock()
            .unwrap()
            .iter()
            .any(|(uid, t)| *uid == user_id && *t == token.0);
        if !on_record {
            return Ok(false);
        }
        Ok(self.used.lock().unwrap().insert(token.0.clone()))
    }
}

// endregion

// region codec spy

/// Delegating codec that counts signing calls, so tests can show both
/// password-reset paths do the same amount of work.
pub struct CountingCodec {
    inner: Arc<dyn TokenCodec>,
    pub reset_signs: AtomicUsize,
}

impl CountingCodec {
    pub fn new(inner: Arc<dyn TokenCodec>) -> Self {
        CountingCodec {
            inner,
            reset_signs: AtomicUsize::new(0),
        }
    }
}

#[async_trait::async_trait]
impl TokenCodec for CountingCodec {
    async fn issue_access_token(
        &self,
        user: UserId,
        jti: Option<TokenId>,
    ) -> Result<(AccessToken, DateTime<Utc>), TokenError> {
        self.inner.issue_access_token(user, jti).await
    }

    async fn issue_refresh_token(
        &self,
        user: UserId,
        jti: TokenId,
        fid: FamilyId,
    ) -> Result<(RefreshToken, DateTime<Utc>), TokenError> {
        self.inner.issue_refresh_token(user, jti, fid).await
    }

    async fn issue_reset_token(
        &self,
        user: UserId,
        secret: &[u8],
    ) -> Result<(ResetToken, DateTime<Utc>), TokenError> {
        self.reset_signs.fetch_add(1, Ordering::SeqCst);
        self.inner.issue_reset_token(user, secret).await
    }

    async fn verify_access_token(
        &self,
        token: &AccessToken,
    ) -> Result<AccessClaimsView, TokenError> {
        self.inner.verify_access_token(token).await
    }

    async fn verify_refresh_token(
        &self,
        token: &RefreshToken,
    ) -> Result<RefreshClaimsView, TokenError> {
        self.inner.verify_refresh_token(token).await
    }

    async fn peek_reset_subject(&self, token: &ResetToken) -> Result<UserId, TokenError> {
        self.inner.peek_reset_subject(token).await
    }

    async fn verify_reset_token(
        &self,
        token: &ResetToken,
        secret: &[u8],
    ) -> Result<UserId, TokenError> {
        self.inner.verify_reset_token(token, secret).await
    }
}

// endregion

// region hasher double

/// Transparent stand-in for argon2 so logins in tests stay fast. The hash is
/// still opaque, comparable and mutable as far as the services care.
pub struct PlainTextHasher;

#[async_trait::async_trait]
impl CredentialHasher for PlainTextHasher {
    async fn hash_password(&self, password: &str) -> Result<String, AuthError> {
        Ok(format!("plain:{}", password))
    }

    async fn verify_password(
        &self,
        password: &str,
        password_hash: &str,
    ) -> Result<bool, AuthError> {
        Ok(password_hash == format!("plain:{}", password))
    }
}

pub fn plain_hash(password: &str) -> String {
    format!("plain:{}", password)
}

// endregion

pub struct AuthHarness {
    pub users: Arc<MemoryUserRepo>,
    pub store: Arc<MemoryFamilyStore>,
    pub codec: Arc<JwtHs256Codec>,
    pub service: RealAuthService,
}

pub fn auth_harness() -> AuthHarness {
    auth_harness_with_ttl(Duration::from_secs(3600))
}

pub fn auth_harness_with_ttl(refresh_ttl: Duration) -> AuthHarness {
    let users = Arc::new(MemoryUserRepo::new());
    let store = Arc::new(MemoryFamilyStore::new());
    let codec = test_codec(refresh_ttl);

    let service = RealAuthService::new(
        users.clone(),
        store.clone(),
        Arc::new(PlainTextHasher),
        codec.clone(),
    );

    AuthHarness {
        users,
        store,
        codec,
        service,
    }
}

pub fn test_deriver() -> ResetSecretDeriver {
    ResetSecretDeriver::new(SERVER_SECRET.to_vec())
}

use crate::application_port::AuthError;
use crate::domain_model::{FamilyId, TokenId};

/// Family store contract (replay guard). The store is the transactional
/// boundary: `cas_advance` and the invalidations must be atomic per family,
/// so that of two concurrent rotation attempts exactly one advances the
/// current id and the other observes a stale one.
#[async_trait::async_trait]
pub trait RefreshTokenRepo: Send + Sync {
    /// Register a new family with its first token id. Called once per login.
    async fn create_family(
        &self,
        fid: FamilyId,
        jti: TokenId,
        ttl_secs: u64,
    ) -> Result<(), AuthError>;

    /// True only if `jti` is the current issuance for the family and the
    /// family has not been invalidated. Read-only, never mutates.
    async fn is_valid(&self, jti: TokenId, fid: FamilyId) -> Result<bool, AuthError>;

    /// Atomically supersede `expected` with `next` within the family.
    /// Returns false when `expected` is stale or the family is invalidated;
    /// the store must not change state in that case.
    async fn cas_advance(
        &self,
        fid: FamilyId,
        expected: TokenId,
        next: TokenId,
        ttl_secs: u64,
    ) -> Result<bool, AuthError>;

    /// Mark one id invalid (single-session logout).
    async fn invalidate(&self, jti: TokenId, fid: FamilyId) -> Result<(), AuthError>;

    /// Mark the whole family invalid. Every past and future id under `fid`
    /// must be rejected afterwards.
    async fn invalidate_family(&self, fid: FamilyId) -> Result<(), AuthError>;
}

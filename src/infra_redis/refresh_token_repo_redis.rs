use crate::application_port::AuthError;
use crate::domain_model::{FamilyId, TokenId};
use crate::domain_port::RefreshTokenRepo;
use redis::Script;
use redis::aio::ConnectionManager;

/// Redis-backed family store.
///
/// Layout per family: `{prefix}:family:{fid}` holds the current jti with the
/// refresh TTL, `{prefix}:tomb:{fid}` marks an invalidated family for at
/// least as long as any of its tokens could still be presented. All mutations
/// that must be atomic per family run as Lua scripts, so two concurrent
/// rotations resolve to exactly one winner.
pub struct RedisRefreshTokenRepo {
    conn: ConnectionManager,
    prefix: String,
    tomb_ttl_secs: u64,
    cas_script: Script,
    is_valid_script: Script,
    invalidate_script: Script,
}

const CAS_ADVANCE: &str = r#"
if redis.call('EXISTS', KEYS[2]) == 1 then
  return 0
end
if redis.call('GET', KEYS[1]) == ARGV[1] then
  redis.call('SET', KEYS[1], ARGV[2], 'EX', tonumber(ARGV[3]))
  return 1
end
return 0
"#;

const IS_VALID: &str = r#"
if redis.call('EXISTS', KEYS[2]) == 1 then
  return 0
end
if redis.call('GET', KEYS[1]) == ARGV[1] then
  return 1
end
return 0
"#;

const INVALIDATE_CURRENT: &str = r#"
if redis.call('GET', KEYS[1]) == ARGV[1] then
  redis.call('DEL', KEYS[1])
end
return 1
"#;

impl RedisRefreshTokenRepo {
    pub fn new(conn: ConnectionManager, prefix: impl Into<String>, tomb_ttl_secs: u64) -> Self {
        RedisRefreshTokenRepo {
            conn,
            prefix: prefix.into(),
            tomb_ttl_secs,
            cas_script: Script::new(CAS_ADVANCE),
            is_valid_script: Script::new(IS_VALID),
            invalidate_script: Script::new(INVALIDATE_CURRENT),
        }
    }

    fn family_key(&self, fid: FamilyId) -> String {
        format!("{}:family:{}", self.prefix, fid)
    }

    fn tomb_key(&self, fid: FamilyId) -> String {
        format!("{}:tomb:{}", self.prefix, fid)
    }
}

fn store_err(e: redis::RedisError) -> AuthError {
    AuthError::Store(e.to_string())
}

#[async_trait::async_trait]
impl RefreshTokenRepo for RedisRefreshTokenRepo {
    async fn create_family(
        &self,
        fid: FamilyId,
        jti: TokenId,
        ttl_secs: u64,
    ) -> Result<(), AuthError> {
        let mut conn = self.conn.clone();
        let _: () = redis::cmd("SET")
            .arg(self.family_key(fid))
            .arg(jti.to_string())
            .arg("EX")
            .arg(ttl_secs)
            .query_async(&mut conn)
            .await
            .map_err(store_err)?;
        Ok(())
    }

    async fn is_valid(&self, jti: TokenId, fid: FamilyId) -> Result<bool, AuthError> {
        let mut conn = self.conn.clone();
        let valid: i64 = self
            .is_valid_script
            .key(self.family_key(fid))
            .key(self.tomb_key(fid))
            .arg(jti.to_string())
            .invoke_async(&mut conn)
            .await
            .map_err(store_err)?;
        Ok(valid == 1)
    }

    async fn cas_advance(
        &self,
        fid: FamilyId,
        expected: TokenId,
        next: TokenId,
        ttl_secs: u64,
    ) -> Result<bool, AuthError> {
        let mut conn = self.conn.clone();
        let advanced: i64 = self
            .cas_script
            .key(self.family_key(fid))
            .key(self.tomb_key(fid))
            .arg(expected.to_string())
            .arg(next.to_string())
            .arg(ttl_secs)
            .invoke_async(&mut conn)
            .await
            .map_err(store_err)?;
        Ok(advanced == 1)
    }

    async fn invalidate(&self, jti: TokenId, fid: FamilyId) -> Result<(), AuthError> {
        let mut conn = self.conn.clone();
        let _: i64 = self
            .invalidate_script
            .key(self.family_key(fid))
            .arg(jti.to_string())
            .invoke_async(&mut conn)
            .await
            .map_err(store_err)?;
        Ok(())
    }

    async fn invalidate_family(&self, fid: FamilyId) -> Result<(), AuthError> {
        let mut conn = self.conn.clone();
        let _: () = redis::pipe()
            .atomic()
            .del(self.family_key(fid))
            .ignore()
            .set_ex(self.tomb_key(fid), 1, self.tomb_ttl_secs)
            .ignore()
            .query_async(&mut conn)
            .await
            .map_err(store_err)?;
        Ok(())
    }
}

use crate::application_impl::*;
use crate::application_port::*;
use crate::domain_port::*;
use crate::infra_mysql::*;
use crate::infra_redis::*;
use crate::logger::*;
use crate::settings::Settings;
use sqlx::{MySql, Pool};
use std::sync::Arc;
use std::time::Duration;

pub struct Server {
    pub auth_service: Arc<dyn AuthService>,
    pub password_reset_service: Arc<dyn PasswordResetService>,
    pool: Pool<MySql>,
}

impl Server {
    pub async fn try_new(settings: &Settings) -> anyhow::Result<Self> {
        let redis_client = redis::Client::open(settings.redis.dsn.as_str())?;
        let redis_manager = redis_client.get_connection_manager().await?;

        let pool = Pool::<MySql>::connect(&settings.mysql.dsn).await?;

        let jwt_cfg = JwtConfig {
            issuer: settings.jwt.issuer.clone(),
            access_ttl: Duration::from_secs(settings.jwt.access_exp_secs),
            refresh_ttl: Duration::from_secs(settings.jwt.refresh_exp_secs),
            reset_ttl: Duration::from_secs(settings.jwt.password_reset_exp_secs),
            signing_key: settings.jwt.secret.clone().into_bytes(),
        };
        let token_codec: Arc<dyn TokenCodec> = Arc::new(JwtHs256Codec::new(jwt_cfg));

        let credential_hasher: Arc<dyn CredentialHasher> = Arc::new(Argon2PasswordHasher {});

        let user_repo: Arc<dyn UserRepo> = Arc::new(MySqlUserRepo::new(pool.clone()));
        // Invalidated families stay tombstoned as long as their longest
        // lived token could still show up.
        let refresh_repo: Arc<dyn RefreshTokenRepo> = Arc::new(RedisRefreshTokenRepo::new(
            redis_manager.clone(),
            settings.redis.key_prefix.clone(),
            settings.jwt.refresh_exp_secs,
        ));

        let auth_service: Arc<dyn AuthService> = match settings.auth.backend.as_str() {
            "fake" => Arc::new(FakeAuthService::new()),
            "real" => Arc::new(RealAuthService::new(
                user_repo.clone(),
                refresh_repo,
                credential_hasher,
                token_codec.clone(),
            )),
            other => return Err(anyhow::anyhow!("Unknown auth backend: {}", other)),
        };

        let reset_repo: Option<Arc<dyn PasswordResetTokenRepo>> =
            if settings.auth.reset_token_audit {
                Some(Arc::new(MySqlPasswordResetTokenRepo::new(pool.clone())))
            } else {
                None
            };

        let deriver = ResetSecretDeriver::new(settings.jwt.secret.clone().into_bytes());
        let password_reset_service: Arc<dyn PasswordResetService> =
            Arc::new(RealPasswordResetService::new(
                user_repo,
                token_codec,
                reset_repo,
                deriver,
            ));

        info!("server started");

        Ok(Self {
            auth_service,
            password_reset_service,
            pool,
        })
    }

    pub async fn shutdown(&self) {
        info!("server shutting down...");
        self.pool.close().await;
    }
}

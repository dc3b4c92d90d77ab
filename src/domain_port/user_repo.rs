use crate::application_port::AuthError;
use crate::domain_model::UserId;

/// Minimal user shape the services need: stable id plus an opaque password
/// hash. The core only reads users, never mutates them.
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub user_id: UserId,
    pub email: String,
    pub password_hash: String,
    pub is_active: bool,
}

#[async_trait::async_trait]
pub trait UserRepo: Send + Sync {
    async fn get_by_email(&self, email: &str) -> Result<Option<UserRecord>, AuthError>;

    async fn get_by_id(&self, user_id: UserId) -> Result<Option<UserRecord>, AuthError>;

    async fn id_exists(&self, user_id: UserId) -> Result<bool, AuthError>;
}

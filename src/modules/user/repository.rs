use uuid::Uuid;

use crate::{
    api::error,
    modules::user::{model::InsertUser, schema::UserEntity},
};

#[async_trait::async_trait]
pub trait UserRepository {
    async fn find_by_id(&self, id: &Uuid) -> Result<Option<UserEntity>, error::SystemError>;
    async fn find_by_username(
        &self,
        username: &str,
    ) -> Result<Option<UserEntity>, error::SystemError>;
    async fn create(&self, user: &InsertUser) -> Result<Uuid, error::SystemError>;
}

/// Refresh-token registrations and the access-token blacklist, keyed by jti.
#[async_trait::async_trait]
pub trait TokenStore {
    async fn save_refresh(
        &self,
        jti: &Uuid,
        user_id: &Uuid,
        ttl: u64,
    ) -> Result<(), error::SystemError>;

    /// Returns the owner and unregisters the token, so it is only usable once.
    async fn take_refresh(&self, jti: &Uuid) -> Result<Option<Uuid>, error::SystemError>;

    /// Blacklists an access token for `ttl` seconds.
    async fn revoke(&self, jti: &Uuid, user_id: &Uuid, ttl: u64) -> Result<(), error::SystemError>;

    async fn is_revoked(&self, jti: &Uuid) -> Result<bool, error::SystemError>;
}

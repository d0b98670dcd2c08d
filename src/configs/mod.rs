use deadpool_redis::{redis::AsyncCommands, Runtime};
use sqlx::{postgres::PgPoolOptions, PgPool};
use uuid::Uuid;

use crate::{
    api::error,
    constants::{REFRESH_TOKEN_PREFIX, REVOKED_TOKEN_PREFIX},
    modules::user::repository::TokenStore,
    ENV,
};

pub async fn connect_database() -> Result<PgPool, error::SystemError> {
    let database_url = &ENV.database_url;
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .min_connections(1)
        .acquire_slow_threshold(std::time::Duration::from_secs(3))
        .connect(database_url)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;
    log::info!("Database migrations applied");

    Ok(pool)
}

/// Redis-backed key/value store for token bookkeeping.
#[derive(Clone)]
pub struct RedisCache {
    pool: deadpool_redis::Pool,
}

impl RedisCache {
    pub async fn new() -> Result<Self, error::SystemError> {
        let mut cfg = deadpool_redis::Config::from_url(&ENV.redis_url);
        cfg.pool = Some(deadpool_redis::PoolConfig { max_size: 16, ..Default::default() });
        let pool = cfg.create_pool(Some(Runtime::Tokio1))?;
        Ok(Self { pool })
    }

    pub async fn get<T>(&self, key: &str) -> Result<Option<T>, error::SystemError>
    where
        T: serde::de::DeserializeOwned,
    {
        let mut conn = self.pool.get().await?;

        let value: Option<Vec<u8>> = conn.get(key).await?;

        match value {
            Some(v) => {
                let parsed = serde_json::from_slice(&v)?;
                Ok(Some(parsed))
            }
            None => Ok(None),
        }
    }

    pub async fn set<T>(
        &self,
        key: &str,
        value: &T,
        expiration: u64,
    ) -> Result<(), error::SystemError>
    where
        T: serde::Serialize,
    {
        let mut conn = self.pool.get().await?;

        let serialized = serde_json::to_vec(value)?;

        // SETEX rejects a zero TTL
        conn.set_ex::<_, _, ()>(key, serialized, expiration.max(1)).await?;

        Ok(())
    }

    pub async fn exists(&self, key: &str) -> Result<bool, error::SystemError> {
        let mut conn = self.pool.get().await?;
        let exists: bool = conn.exists(key).await?;
        Ok(exists)
    }

    pub async fn delete(&self, key: &str) -> Result<(), error::SystemError> {
        let mut conn = self.pool.get().await?;
        conn.del::<_, ()>(key).await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl TokenStore for RedisCache {
    async fn save_refresh(
        &self,
        jti: &Uuid,
        user_id: &Uuid,
        ttl: u64,
    ) -> Result<(), error::SystemError> {
        self.set(&format!("{REFRESH_TOKEN_PREFIX}{jti}"), user_id, ttl).await
    }

    async fn take_refresh(&self, jti: &Uuid) -> Result<Option<Uuid>, error::SystemError> {
        let key = format!("{REFRESH_TOKEN_PREFIX}{jti}");
        let owner: Option<Uuid> = self.get(&key).await?;
        if owner.is_some() {
            self.delete(&key).await?;
        }
        Ok(owner)
    }

    async fn revoke(&self, jti: &Uuid, user_id: &Uuid, ttl: u64) -> Result<(), error::SystemError> {
        self.set(&format!("{REVOKED_TOKEN_PREFIX}{jti}"), user_id, ttl).await
    }

    async fn is_revoked(&self, jti: &Uuid) -> Result<bool, error::SystemError> {
        self.exists(&format!("{REVOKED_TOKEN_PREFIX}{jti}")).await
    }
}

//! In-memory user table and token store for service and middleware tests.
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use crate::api::error;
use crate::modules::user::model::{AuthConfig, InsertUser};
use crate::modules::user::repository::{TokenStore, UserRepository};
use crate::modules::user::schema::UserEntity;
use crate::modules::user::service::UserService;
use crate::utils::hash_password;

#[derive(Default)]
pub struct FakeUsers {
    pub users: Mutex<Vec<UserEntity>>,
}

impl FakeUsers {
    pub fn add(&self, username: &str, password: &str, is_active: bool) -> Uuid {
        let id = Uuid::now_v7();
        self.users.lock().unwrap().push(UserEntity {
            id,
            username: username.to_string(),
            email: format!("{username}@example.com"),
            hash_password: hash_password(password).unwrap(),
            is_active,
            created_at: chrono::Utc::now(),
        });
        id
    }
}

#[async_trait::async_trait]
impl UserRepository for FakeUsers {
    async fn find_by_id(&self, id: &Uuid) -> Result<Option<UserEntity>, error::SystemError> {
        Ok(self.users.lock().unwrap().iter().find(|u| u.id == *id).cloned())
    }

    async fn find_by_username(
        &self,
        username: &str,
    ) -> Result<Option<UserEntity>, error::SystemError> {
        Ok(self.users.lock().unwrap().iter().find(|u| u.username == username).cloned())
    }

    async fn create(&self, user: &InsertUser) -> Result<Uuid, error::SystemError> {
        let id = Uuid::now_v7();
        self.users.lock().unwrap().push(UserEntity {
            id,
            username: user.username.clone(),
            email: user.email.clone(),
            hash_password: user.hash_password.clone(),
            is_active: true,
            created_at: chrono::Utc::now(),
        });
        Ok(id)
    }
}

/// Remembers the TTL each entry was written with instead of expiring it.
#[derive(Default)]
pub struct MemoryTokens {
    refresh: Mutex<HashMap<Uuid, (Uuid, u64)>>,
    revoked: Mutex<HashMap<Uuid, (Uuid, u64)>>,
}

impl MemoryTokens {
    pub fn refresh_count(&self) -> usize {
        self.refresh.lock().unwrap().len()
    }

    pub fn revoked_ttl(&self, jti: &Uuid) -> Option<u64> {
        self.revoked.lock().unwrap().get(jti).map(|(_, ttl)| *ttl)
    }
}

#[async_trait::async_trait]
impl TokenStore for MemoryTokens {
    async fn save_refresh(
        &self,
        jti: &Uuid,
        user_id: &Uuid,
        ttl: u64,
    ) -> Result<(), error::SystemError> {
        self.refresh.lock().unwrap().insert(*jti, (*user_id, ttl));
        Ok(())
    }

    async fn take_refresh(&self, jti: &Uuid) -> Result<Option<Uuid>, error::SystemError> {
        Ok(self.refresh.lock().unwrap().remove(jti).map(|(user_id, _)| user_id))
    }

    async fn revoke(&self, jti: &Uuid, user_id: &Uuid, ttl: u64) -> Result<(), error::SystemError> {
        self.revoked.lock().unwrap().insert(*jti, (*user_id, ttl));
        Ok(())
    }

    async fn is_revoked(&self, jti: &Uuid) -> Result<bool, error::SystemError> {
        Ok(self.revoked.lock().unwrap().contains_key(jti))
    }
}

pub fn auth_config() -> AuthConfig {
    AuthConfig {
        jwt_secret: "test-secret".to_string(),
        access_token_expiration: 900,
        refresh_token_expiration: 3600,
        access_token_renew_window: 300,
        cookie_secure: false,
    }
}

pub fn auth_service() -> (UserService, Arc<FakeUsers>, Arc<MemoryTokens>) {
    let users = Arc::new(FakeUsers::default());
    let tokens = Arc::new(MemoryTokens::default());
    let service = UserService::with_dependencies(users.clone(), tokens.clone(), auth_config());
    (service, users, tokens)
}

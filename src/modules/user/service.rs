use log::info;
use std::sync::Arc;
use uuid::Uuid;

use crate::api::error;
use crate::modules::user::model::{
    AuthConfig, InsertUser, LoginModel, RegisterModel, TokenPair, UserResponse, UserSummary,
};
use crate::modules::user::repository::{TokenStore, UserRepository};
use crate::utils::{hash_password, verify_password, Claims, TypeClaims};

#[derive(Clone)]
pub struct UserService {
    repo: Arc<dyn UserRepository + Send + Sync>,
    tokens: Arc<dyn TokenStore + Send + Sync>,
    config: AuthConfig,
}

impl UserService {
    pub fn with_dependencies(
        repo: Arc<dyn UserRepository + Send + Sync>,
        tokens: Arc<dyn TokenStore + Send + Sync>,
        config: AuthConfig,
    ) -> Self {
        info!("UserService initialized with dependencies");
        UserService { repo, tokens, config }
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<UserResponse, error::SystemError> {
        self.repo
            .find_by_id(&id)
            .await?
            .map(UserResponse::from)
            .ok_or_else(|| error::SystemError::not_found("User not found"))
    }

    pub async fn register(&self, user: RegisterModel) -> Result<Uuid, error::SystemError> {
        let hash_password = hash_password(&user.password)?;

        let new_user = InsertUser { username: user.username, email: user.email, hash_password };

        let user_id = self.repo.create(&new_user).await?;
        info!("User {} registered as {}", new_user.username, user_id);
        Ok(user_id)
    }

    pub async fn login(
        &self,
        user: LoginModel,
    ) -> Result<(TokenPair, UserSummary), error::SystemError> {
        let user_entity = self
            .repo
            .find_by_username(&user.username)
            .await?
            .ok_or_else(|| error::SystemError::unauthorized("Invalid username or password"))?;

        let valid = verify_password(&user_entity.hash_password, &user.password)?;
        if !valid {
            return Err(error::SystemError::unauthorized("Invalid username or password"));
        }

        if !user_entity.is_active {
            return Err(error::SystemError::forbidden("Account is disabled"));
        }

        let tokens = self.issue_tokens(&user_entity.id).await?;
        Ok((tokens, UserSummary::from(&user_entity)))
    }

    /// Exchanges a registered refresh token for a new pair. The old refresh
    /// token is unregistered so it cannot be replayed.
    pub async fn refresh(&self, refresh_token: Option<String>) -> Result<TokenPair, error::SystemError> {
        let token =
            refresh_token.ok_or_else(|| error::SystemError::unauthorized("Missing refresh token"))?;

        let claims = self
            .decode(&token)
            .map_err(|_| error::SystemError::unauthorized("Token Invalid or Expired"))?;

        if claims._type != TypeClaims::RefreshToken {
            return Err(error::SystemError::unauthorized("Token Invalid or Expired"));
        }

        let owner = self.tokens.take_refresh(&claims.jti).await?;
        if owner != Some(claims.sub) {
            return Err(error::SystemError::unauthorized("Token Invalid or Expired"));
        }

        let user = self
            .repo
            .find_by_id(&claims.sub)
            .await?
            .ok_or_else(|| error::SystemError::unauthorized("User no longer exists"))?;
        if !user.is_active {
            return Err(error::SystemError::forbidden("Account is disabled"));
        }

        self.issue_tokens(&user.id).await
    }

    /// Revokes the access token for the rest of its lifetime and drops the
    /// refresh token registration.
    pub async fn logout(
        &self,
        access: Option<Claims>,
        refresh_token: Option<String>,
    ) -> Result<(), error::SystemError> {
        if let Some(claims) = access {
            let remaining = claims.remaining();
            if remaining > 0 {
                self.tokens.revoke(&claims.jti, &claims.sub, remaining).await?;
            }
        }

        if let Some(token) = refresh_token {
            if let Ok(claims) = self.decode(&token) {
                self.tokens.take_refresh(&claims.jti).await?;
            }
        }

        Ok(())
    }

    pub async fn is_revoked(&self, jti: &Uuid) -> Result<bool, error::SystemError> {
        self.tokens.is_revoked(jti).await
    }

    /// Signature and expiry only, any token type.
    pub fn decode(&self, token: &str) -> Result<Claims, error::SystemError> {
        Claims::decode(token, self.config.jwt_secret.as_ref())
    }

    /// Accepts a live, unrevoked access token.
    pub async fn authenticate(&self, token: &str) -> Result<Claims, error::SystemError> {
        let claims = self
            .decode(token)
            .map_err(|_| error::SystemError::unauthorized("Token Invalid or Expired"))?;

        if !claims.is_access() {
            return Err(error::SystemError::unauthorized("Token Invalid or Expired"));
        }

        if self.is_revoked(&claims.jti).await? {
            return Err(error::SystemError::unauthorized("Token has been revoked"));
        }

        Ok(claims)
    }

    pub fn issue_access(&self, user_id: &Uuid) -> Result<String, error::SystemError> {
        Claims::access(user_id, self.config.access_token_expiration)
            .encode(self.config.jwt_secret.as_ref())
    }

    async fn issue_tokens(&self, user_id: &Uuid) -> Result<TokenPair, error::SystemError> {
        let access_token = self.issue_access(user_id)?;

        let refresh_claims = Claims::refresh(user_id, self.config.refresh_token_expiration);
        let refresh_token = refresh_claims.encode(self.config.jwt_secret.as_ref())?;

        self.tokens
            .save_refresh(&refresh_claims.jti, user_id, self.config.refresh_token_expiration)
            .await?;

        Ok(TokenPair { access_token, refresh_token })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::user::testing::auth_service;

    fn login(username: &str, password: &str) -> LoginModel {
        LoginModel { username: username.to_string(), password: password.to_string() }
    }

    #[actix_web::test]
    async fn test_login_rejects_bad_credentials_and_inactive_accounts() {
        let (service, users, _) = auth_service();
        users.add("alice", "secret1", true);
        users.add("mallory", "secret1", false);

        let wrong = service.login(login("alice", "nope")).await;
        assert!(matches!(wrong, Err(error::SystemError::Unauthorized(_))));

        let unknown = service.login(login("nobody", "secret1")).await;
        assert!(matches!(unknown, Err(error::SystemError::Unauthorized(_))));

        let disabled = service.login(login("mallory", "secret1")).await;
        assert!(matches!(disabled, Err(error::SystemError::Forbidden(_))));

        let (tokens, user) = service.login(login("alice", "secret1")).await.unwrap();
        assert_eq!(user.username, "alice");
        let claims = service.authenticate(&tokens.access_token).await.unwrap();
        assert_eq!(claims.sub, user.id);
    }

    #[actix_web::test]
    async fn test_refresh_rotates_and_cannot_be_replayed() {
        let (service, users, tokens) = auth_service();
        users.add("alice", "secret1", true);
        let (pair, _) = service.login(login("alice", "secret1")).await.unwrap();
        assert_eq!(tokens.refresh_count(), 1);

        let rotated = service.refresh(Some(pair.refresh_token.clone())).await.unwrap();
        assert_ne!(rotated.refresh_token, pair.refresh_token);
        assert_eq!(tokens.refresh_count(), 1);

        let replay = service.refresh(Some(pair.refresh_token)).await;
        assert!(matches!(replay, Err(error::SystemError::Unauthorized(_))));

        // access tokens are not refresh tokens
        let wrong_type = service.refresh(Some(rotated.access_token)).await;
        assert!(matches!(wrong_type, Err(error::SystemError::Unauthorized(_))));

        assert!(matches!(service.refresh(None).await, Err(error::SystemError::Unauthorized(_))));
    }

    #[actix_web::test]
    async fn test_logout_blacklists_access_for_its_remaining_lifetime() {
        let (service, users, tokens) = auth_service();
        users.add("alice", "secret1", true);
        let (pair, _) = service.login(login("alice", "secret1")).await.unwrap();
        let claims = service.authenticate(&pair.access_token).await.unwrap();

        service.logout(Some(claims.clone()), Some(pair.refresh_token.clone())).await.unwrap();

        let ttl = tokens.revoked_ttl(&claims.jti).unwrap();
        assert!(ttl > 0 && ttl <= service.config().access_token_expiration);
        assert_eq!(tokens.refresh_count(), 0);

        let reuse = service.authenticate(&pair.access_token).await;
        assert!(matches!(reuse, Err(error::SystemError::Unauthorized(_))));
        let refresh = service.refresh(Some(pair.refresh_token)).await;
        assert!(matches!(refresh, Err(error::SystemError::Unauthorized(_))));
    }

    #[actix_web::test]
    async fn test_authenticate_rejects_refresh_tokens_and_foreign_signatures() {
        let (service, users, _) = auth_service();
        let id = users.add("alice", "secret1", true);

        let secret = service.config().jwt_secret.clone();
        let refresh = Claims::refresh(&id, 60).encode(secret.as_ref()).unwrap();
        assert!(service.authenticate(&refresh).await.is_err());

        let forged = Claims::access(&id, 60).encode(b"another-secret").unwrap();
        assert!(service.authenticate(&forged).await.is_err());
    }

    #[actix_web::test]
    async fn test_expired_access_token_is_not_blacklisted() {
        let (service, users, tokens) = auth_service();
        let id = users.add("alice", "secret1", true);
        let mut claims = Claims::access(&id, 60);
        claims.exp = claims.iat.saturating_sub(1);

        service.logout(Some(claims.clone()), None).await.unwrap();
        assert_eq!(tokens.revoked_ttl(&claims.jti), None);
    }
}

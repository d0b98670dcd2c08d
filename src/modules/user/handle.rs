use actix_web::{get, post, web, HttpRequest};

use crate::api::{error, success};
use crate::constants::{ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE};
use crate::middlewares::{auth_cookie, expired_cookie, get_claims, token_from_request};
use crate::modules::user::{model, service::UserService};
use crate::utils::ValidatedJson;

fn token_cookies(
    config: &model::AuthConfig,
    tokens: &model::TokenPair,
) -> Vec<actix_web::cookie::Cookie<'static>> {
    vec![
        auth_cookie(
            ACCESS_TOKEN_COOKIE,
            tokens.access_token.clone(),
            config.access_token_expiration,
            config.cookie_secure,
        ),
        auth_cookie(
            REFRESH_TOKEN_COOKIE,
            tokens.refresh_token.clone(),
            config.refresh_token_expiration,
            config.cookie_secure,
        ),
    ]
}

#[post("/register")]
pub async fn register(
    user_service: web::Data<UserService>,
    user_data: ValidatedJson<model::RegisterModel>,
) -> Result<success::Success<model::RegisterResponse>, error::Error> {
    let user_id = user_service.register(user_data.0).await?;
    Ok(success::Success::created(Some(model::RegisterResponse { id: user_id }))
        .message("Registration successful, you can now log in"))
}

#[post("/login")]
pub async fn login(
    user_service: web::Data<UserService>,
    user_data: ValidatedJson<model::LoginModel>,
) -> Result<success::Success<model::LoginResponse>, error::Error> {
    let (tokens, user) = user_service.login(user_data.0).await?;
    let cookies = token_cookies(user_service.config(), &tokens);
    let response = model::LoginResponse { access_token: tokens.access_token, user };

    Ok(success::Success::ok(Some(response)).message("Login successful").cookies(cookies))
}

#[post("/refresh")]
pub async fn refresh(
    user_service: web::Data<UserService>,
    req: HttpRequest,
) -> Result<success::Success<model::RefreshResponse>, error::Error> {
    let refresh_token = req.cookie(REFRESH_TOKEN_COOKIE).map(|c| c.value().to_string());
    let tokens = user_service.refresh(refresh_token).await?;
    let cookies = token_cookies(user_service.config(), &tokens);
    let response = model::RefreshResponse { access_token: tokens.access_token };

    Ok(success::Success::ok(Some(response)).message("Refresh successful").cookies(cookies))
}

#[post("/logout")]
pub async fn logout(
    user_service: web::Data<UserService>,
    req: HttpRequest,
) -> Result<success::Success<()>, error::Error> {
    let access =
        token_from_request(&req).and_then(|(token, _)| user_service.decode(&token).ok());
    let refresh_token = req.cookie(REFRESH_TOKEN_COOKIE).map(|c| c.value().to_string());

    user_service.logout(access, refresh_token).await?;

    let secure = user_service.config().cookie_secure;
    Ok(success::Success::no_content().cookies(vec![
        expired_cookie(ACCESS_TOKEN_COOKIE, secure),
        expired_cookie(REFRESH_TOKEN_COOKIE, secure),
    ]))
}

#[get("/profile")]
pub async fn get_profile(
    user_service: web::Data<UserService>,
    req: HttpRequest,
) -> Result<success::Success<model::UserResponse>, error::Error> {
    let id = get_claims(&req)?.sub;
    let user = user_service.get_by_id(id).await?;
    Ok(success::Success::ok(Some(user)).message("Profile retrieved successfully"))
}

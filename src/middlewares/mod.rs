use actix_web::{
    body::MessageBody,
    cookie::{time, Cookie, SameSite},
    dev::{ServiceRequest, ServiceResponse},
    http::header,
    middleware::{DefaultHeaders, Next},
    web, Error, HttpMessage, HttpRequest,
};

use crate::{
    api::error,
    constants::ACCESS_TOKEN_COOKIE,
    modules::user::service::UserService,
    utils::Claims,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TokenSource {
    Header,
    Cookie,
}

/// Bearer header wins over the cookie when both are present.
pub fn token_from_request(req: &HttpRequest) -> Option<(String, TokenSource)> {
    let bearer = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());

    if let Some(token) = bearer {
        return Some((token.to_string(), TokenSource::Header));
    }

    req.cookie(ACCESS_TOKEN_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|t| !t.is_empty())
        .map(|t| (t, TokenSource::Cookie))
}

pub fn build_cookie(
    name: &'static str,
    value: String,
    max_age: i64,
    secure: bool,
) -> Cookie<'static> {
    Cookie::build(name, value)
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(time::Duration::seconds(max_age))
        .finish()
}

pub fn auth_cookie(
    name: &'static str,
    value: String,
    max_age: u64,
    secure: bool,
) -> Cookie<'static> {
    build_cookie(name, value, max_age as i64, secure)
}

pub fn expired_cookie(name: &'static str, secure: bool) -> Cookie<'static> {
    let mut cookie = build_cookie(name, String::new(), 0, secure);
    cookie.set_expires(time::OffsetDateTime::UNIX_EPOCH);
    cookie
}

/// Responses carry user data; keep them out of every cache.
pub fn no_cache_headers() -> DefaultHeaders {
    DefaultHeaders::new()
        .add((header::CACHE_CONTROL, "no-store, max-age=0, must-revalidate"))
        .add((header::PRAGMA, "no-cache"))
        .add((header::EXPIRES, "0"))
}

pub async fn authentication<B>(
    req: ServiceRequest,
    next: Next<B>,
) -> Result<ServiceResponse<B>, Error>
where
    B: MessageBody + 'static,
{
    let (token, source) = token_from_request(req.request())
        .ok_or_else(|| error::Error::unauthorized("Token Invalid or Expired"))?;

    let user_service = req
        .app_data::<web::Data<UserService>>()
        .cloned()
        .ok_or(error::Error::InternalServer)?;

    let claims = user_service.authenticate(&token).await.map_err(error::Error::from)?;

    // cookie sessions get a fresh access token shortly before expiry
    let renew_for = (source == TokenSource::Cookie
        && claims.remaining() < user_service.config().access_token_renew_window)
        .then_some(claims.sub);

    req.extensions_mut().insert(claims);

    let mut res = next.call(req).await?;

    if let Some(user_id) = renew_for {
        match user_service.issue_access(&user_id) {
            Ok(token) => {
                let config = user_service.config();
                let cookie = auth_cookie(
                    ACCESS_TOKEN_COOKIE,
                    token,
                    config.access_token_expiration,
                    config.cookie_secure,
                );
                if let Err(e) = res.response_mut().add_cookie(&cookie) {
                    log::warn!("Failed to attach renewed access token: {}", e);
                }
            }
            Err(e) => log::warn!("Failed to renew access token for {}: {:?}", user_id, e),
        }
    }

    Ok(res)
}

pub fn get_claims(req: &HttpRequest) -> Result<Claims, error::Error> {
    let extensions = req.extensions();

    let claims = extensions
        .get::<Claims>()
        .ok_or_else(|| error::Error::unauthorized("Unauthorized"))?
        .clone();

    Ok(claims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;
    use actix_web::middleware::from_fn;
    use actix_web::test::{self, TestRequest};
    use actix_web::{App, HttpResponse};

    use crate::modules::user::repository::TokenStore;
    use crate::modules::user::testing::auth_service;

    async fn whoami(req: HttpRequest) -> Result<HttpResponse, error::Error> {
        let claims = get_claims(&req)?;
        Ok(HttpResponse::Ok().body(claims.sub.to_string()))
    }

    fn status<B>(result: Result<ServiceResponse<B>, Error>) -> StatusCode {
        match result {
            Ok(res) => res.status(),
            Err(e) => e.as_response_error().status_code(),
        }
    }

    fn renewed_cookie<B>(res: &ServiceResponse<B>) -> Option<String> {
        res.response()
            .cookies()
            .find(|c| c.name() == ACCESS_TOKEN_COOKIE)
            .map(|c| c.value().to_string())
    }

    #[test]
    fn test_token_from_bearer_header() {
        let req = TestRequest::default()
            .insert_header((header::AUTHORIZATION, "Bearer abc.def.ghi"))
            .to_http_request();
        assert_eq!(
            token_from_request(&req),
            Some(("abc.def.ghi".to_string(), TokenSource::Header))
        );
    }

    #[test]
    fn test_token_from_cookie() {
        let req = TestRequest::default()
            .cookie(Cookie::new(ACCESS_TOKEN_COOKIE, "cookie.token"))
            .to_http_request();
        assert_eq!(
            token_from_request(&req),
            Some(("cookie.token".to_string(), TokenSource::Cookie))
        );
    }

    #[test]
    fn test_header_preferred_over_cookie() {
        let req = TestRequest::default()
            .insert_header((header::AUTHORIZATION, "Bearer from-header"))
            .cookie(Cookie::new(ACCESS_TOKEN_COOKIE, "from-cookie"))
            .to_http_request();
        assert_eq!(token_from_request(&req).unwrap().1, TokenSource::Header);
    }

    #[test]
    fn test_missing_or_malformed_token() {
        let req = TestRequest::default().to_http_request();
        assert!(token_from_request(&req).is_none());

        let req = TestRequest::default()
            .insert_header((header::AUTHORIZATION, "Basic dXNlcjpwYXNz"))
            .to_http_request();
        assert!(token_from_request(&req).is_none());
    }

    #[test]
    fn test_build_cookie_attributes() {
        let cookie = build_cookie(ACCESS_TOKEN_COOKIE, "t".to_string(), 3600, true);
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.max_age(), Some(time::Duration::seconds(3600)));
    }

    #[test]
    fn test_get_claims_without_authentication() {
        let req = TestRequest::default().to_http_request();
        assert!(get_claims(&req).is_err());
    }

    #[actix_web::test]
    async fn test_authentication_accepts_only_live_access_tokens() {
        let (service, users, tokens) = auth_service();
        let id = users.add("alice", "secret1", true);
        let secret = service.config().jwt_secret.clone();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(service.clone()))
                .service(
                    web::scope("")
                        .wrap(from_fn(authentication))
                        .route("/me", web::get().to(whoami)),
                ),
        )
        .await;

        let access = service.issue_access(&id).unwrap();
        let req = TestRequest::get()
            .uri("/me")
            .insert_header((header::AUTHORIZATION, format!("Bearer {access}")))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(test::read_body(res).await, id.to_string());

        let req = TestRequest::get().uri("/me").to_request();
        assert_eq!(status(test::try_call_service(&app, req).await), StatusCode::UNAUTHORIZED);

        let refresh = Claims::refresh(&id, 3600).encode(secret.as_ref()).unwrap();
        let req = TestRequest::get()
            .uri("/me")
            .insert_header((header::AUTHORIZATION, format!("Bearer {refresh}")))
            .to_request();
        assert_eq!(status(test::try_call_service(&app, req).await), StatusCode::UNAUTHORIZED);

        let revoked = Claims::access(&id, 900);
        tokens.revoke(&revoked.jti, &id, 900).await.unwrap();
        let req = TestRequest::get()
            .uri("/me")
            .cookie(Cookie::new(ACCESS_TOKEN_COOKIE, revoked.encode(secret.as_ref()).unwrap()))
            .to_request();
        assert_eq!(status(test::try_call_service(&app, req).await), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn test_cookie_tokens_are_renewed_inside_the_window_only() {
        let (service, users, _) = auth_service();
        let id = users.add("alice", "secret1", true);
        let secret = service.config().jwt_secret.clone();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(service.clone()))
                .service(
                    web::scope("")
                        .wrap(from_fn(authentication))
                        .route("/me", web::get().to(whoami)),
                ),
        )
        .await;

        let expiring = Claims::access(&id, 60).encode(secret.as_ref()).unwrap();
        let fresh = Claims::access(&id, 900).encode(secret.as_ref()).unwrap();

        let req = TestRequest::get()
            .uri("/me")
            .cookie(Cookie::new(ACCESS_TOKEN_COOKIE, expiring.clone()))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::OK);
        let renewed = renewed_cookie(&res).unwrap();
        assert_ne!(renewed, expiring);
        assert!(Claims::decode(&renewed, secret.as_ref()).unwrap().remaining() > 60);

        let req = TestRequest::get()
            .uri("/me")
            .cookie(Cookie::new(ACCESS_TOKEN_COOKIE, fresh))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert!(renewed_cookie(&res).is_none());

        // bearer clients manage their own tokens
        let req = TestRequest::get()
            .uri("/me")
            .insert_header((header::AUTHORIZATION, format!("Bearer {expiring}")))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::OK);
        assert!(renewed_cookie(&res).is_none());
    }

    #[actix_web::test]
    async fn test_no_cache_headers_on_every_response() {
        let app = test::init_service(
            App::new()
                .wrap(no_cache_headers())
                .route("/", web::get().to(|| async { HttpResponse::Ok().finish() })),
        )
        .await;

        let res = test::call_service(&app, TestRequest::get().uri("/").to_request()).await;
        let headers = res.headers();
        assert_eq!(
            headers.get(header::CACHE_CONTROL).unwrap(),
            "no-store, max-age=0, must-revalidate"
        );
        assert_eq!(headers.get(header::PRAGMA).unwrap(), "no-cache");
        assert_eq!(headers.get(header::EXPIRES).unwrap(), "0");
    }
}

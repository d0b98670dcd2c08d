use actix::Actor;
use actix_cors::Cors;
use actix_web::{
    self, App, HttpServer,
    middleware::{Logger, from_fn},
    web,
};
use std::sync::{Arc, LazyLock};

use crate::{
    configs::{RedisCache, connect_database},
    middlewares::{authentication, no_cache_headers},
    modules::{
        document::{
            model::UploadConfig, repository_pg::DocumentRepositoryPg, service::DocumentService,
        },
        storage::build_store,
        user::{model::AuthConfig, repository_pg::UserRepositoryPg, service::UserService},
        websocket::{handler::websocket_handler, server::WebSocketServer},
    },
};

mod api;
mod configs;
mod constants;
mod middlewares;
mod modules;
mod utils;

pub static ENV: LazyLock<constants::Env> = LazyLock::new(|| {
    dotenvy::dotenv().ok();
    env_logger::init();
    log::info!("Environment variables loaded from .env file");
    constants::Env::default()
});

#[actix_web::get("/")]
async fn health_check(db_pool: web::Data<sqlx::PgPool>) -> &'static str {
    match sqlx::query("SELECT 1").execute(db_pool.get_ref()).await {
        Ok(_) => "Server is running",
        Err(e) => {
            log::error!("Health check failed: {}", e);
            "Database unavailable"
        }
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    LazyLock::force(&ENV);

    // websocket actors log through tracing
    if let Err(e) = tracing::subscriber::set_global_default(
        tracing_subscriber::fmt().with_target(false).finish(),
    ) {
        log::warn!("Tracing subscriber already set: {}", e);
    }

    let db_pool =
        connect_database().await.map_err(|_| std::io::Error::other("Database connection error"))?;

    let redis_pool =
        RedisCache::new().await.map_err(|_| std::io::Error::other("Redis connection error"))?;

    let user_repo = Arc::new(UserRepositoryPg::new(db_pool.clone()));
    let document_repo = Arc::new(DocumentRepositoryPg::new(db_pool.clone()));
    let storage = build_store(&ENV.upload_folder, &ENV.remote);

    let auth_config = AuthConfig {
        jwt_secret: ENV.jwt_secret.clone(),
        access_token_expiration: ENV.access_token_expiration,
        refresh_token_expiration: ENV.refresh_token_expiration,
        access_token_renew_window: ENV.access_token_renew_window,
        cookie_secure: ENV.cookie_secure,
    };
    let user_service = web::Data::new(UserService::with_dependencies(
        user_repo.clone(),
        Arc::new(redis_pool),
        auth_config,
    ));
    let document_service = web::Data::new(DocumentService::with_dependencies(
        document_repo,
        user_repo,
        storage,
        UploadConfig::default().with_max_file_size(ENV.max_content_length),
    ));

    let ws_server = web::Data::new(WebSocketServer::new().start());

    log::info!("Starting server at http://{}:{}", ENV.ip.as_str(), ENV.port);
    HttpServer::new(move || {
        let cors = Cors::default()
            .allowed_origin(&ENV.frontend_url)
            .allow_any_method()
            .allow_any_header()
            .supports_credentials()
            .max_age(3600);

        App::new()
            .wrap(no_cache_headers())
            .wrap(cors)
            .wrap(Logger::default())
            .app_data(web::JsonConfig::default().limit(ENV.max_content_length))
            .app_data(user_service.clone())
            .app_data(document_service.clone())
            .app_data(ws_server.clone())
            .app_data(web::Data::new(db_pool.clone()))
            .service(health_check)
            .route("/ws", web::get().to(websocket_handler))
            .service(
                web::scope("/api").configure(modules::user::route::public_api_configure).service(
                    web::scope("")
                        .wrap(from_fn(authentication))
                        .configure(modules::user::route::configure)
                        .configure(
                            modules::document::route::configure::<
                                DocumentRepositoryPg,
                                UserRepositoryPg,
                            >,
                        ),
                ),
            )
    })
    .bind((ENV.ip.as_str(), ENV.port))?
    .workers(2)
    .run()
    .await
}

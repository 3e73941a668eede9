//! Server mode
//!
//! This module contains the HTTP server startup logic.
//! It configures and starts the HTTP server with all necessary routes.

use actix_cors::Cors;
use actix_web::{
    App, HttpServer,
    middleware::{Compress, DefaultHeaders},
    web,
};
use anyhow::{Context, Result};
use tracing::warn;

use crate::api::constants::SESSION_HEADER;
use crate::api::middleware::IdentityResolver;
use crate::api::services::{
    AppStartTime, api_v1_routes, functions_routes, health_routes, media_routes,
};
use crate::runtime::lifetime;

/// Build CORS middleware from the configured frontend origins
///
/// Empty list means any origin. Credentials (the session cookie) are only
/// allowed with an explicit origin list.
fn build_cors_middleware(origins: &[String]) -> Cors {
    let mut cors = Cors::default()
        .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
        .allowed_headers(vec!["Content-Type", "Authorization", "Accept", SESSION_HEADER])
        .max_age(3600);

    if origins.is_empty() {
        cors = cors.allow_any_origin();
    } else {
        for origin in origins {
            cors = cors.allowed_origin(origin);
        }
        cors = cors.supports_credentials();
    }
    cors
}

/// Run the HTTP server
///
/// This function:
/// 1. Records startup time
/// 2. Prepares storage and services
/// 3. Starts the optional periodic archive task
/// 4. Configures and starts the HTTP server
/// 5. Listens for graceful shutdown signals
///
/// **Note**: Logging system must be initialized before calling this function
pub async fn run_server() -> Result<()> {
    let app_start_time = AppStartTime {
        start_datetime: chrono::Utc::now(),
    };

    let startup = lifetime::startup::prepare_server_startup()
        .await
        .map_err(|e| {
            tracing::error!("Server startup failed: {}", e);
            e
        })?;

    let config = crate::config::get_config();

    let archive_handle = startup
        .archive_task
        .clone()
        .spawn(config.archive.interval_secs);

    let storage = startup.storage.clone();
    let auth_service = startup.auth_service.clone();
    let profile_service = startup.profile_service.clone();
    let deal_service = startup.deal_service.clone();
    let analytics_service = startup.analytics_service.clone();
    let social_service = startup.social_service.clone();
    let bulk_upload_service = startup.bulk_upload_service.clone();
    let media_store = startup.media_store.clone();
    let archive_task = startup.archive_task.clone();

    let cpu_count = config.server.cpu_count.clamp(1, 32);
    warn!("Using {} CPU cores for the server", cpu_count);

    if config.server.cors_origins.is_empty() {
        warn!("CORS: no origins configured, allowing any origin without credentials");
    }
    let cors_origins = config.server.cors_origins.clone();

    let db_for_shutdown = storage.get_db().clone();

    let server = HttpServer::new(move || {
        App::new()
            .wrap(IdentityResolver)
            .wrap(build_cors_middleware(&cors_origins))
            .wrap(Compress::default())
            .app_data(web::Data::new(storage.clone()))
            .app_data(web::Data::new(auth_service.clone()))
            .app_data(web::Data::new(profile_service.clone()))
            .app_data(web::Data::new(deal_service.clone()))
            .app_data(web::Data::new(analytics_service.clone()))
            .app_data(web::Data::new(social_service.clone()))
            .app_data(web::Data::new(bulk_upload_service.clone()))
            .app_data(web::Data::new(media_store.clone()))
            .app_data(web::Data::new(archive_task.clone()))
            .app_data(web::Data::new(app_start_time.clone()))
            .app_data(web::PayloadConfig::new(1024 * 1024))
            .wrap(
                DefaultHeaders::new()
                    .add(("Connection", "keep-alive"))
                    .add(("Keep-Alive", "timeout=30, max=1000")),
            )
            .service(api_v1_routes())
            .service(functions_routes())
            .service(media_routes())
            .service(health_routes())
    })
    .keep_alive(std::time::Duration::from_secs(30))
    .client_request_timeout(std::time::Duration::from_millis(5000))
    .client_disconnect_timeout(std::time::Duration::from_millis(1000))
    .workers(cpu_count);

    let bind_address = format!("{}:{}", config.server.host, config.server.port);
    warn!("Starting server at http://{}", bind_address);
    let server = server
        .bind(&bind_address)
        .with_context(|| format!("Failed to bind {}", bind_address))?
        .run();

    // Wait for server or shutdown signal
    tokio::select! {
        res = server => {
            res?;
        }
        _ = lifetime::shutdown::listen_for_shutdown(db_for_shutdown, archive_handle) => {
            warn!("Graceful shutdown: all tasks completed");
        }
    }

    Ok(())
}

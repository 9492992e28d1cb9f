use actix_web::{web, App, HttpServer};
use std::io;
use std::sync::Arc;
use tokio::signal;

mod api_error;
mod auth;
mod config;
mod db;
mod http;
mod middleware;
mod models;
mod service;
mod store;
mod telemetry;

use crate::auth::{AuthMiddleware, JwtService};
use crate::config::Config;
use crate::db::{create_pool, run_migrations};
use crate::http::proposal_handler::AppState;
use crate::middleware::cors_middleware;
use crate::store::PgEntityStore;
use crate::telemetry::init_telemetry;

#[tokio::main]
async fn main() -> io::Result<()> {
    // Load configuration
    let config = Config::from_env().map_err(|e| io::Error::other(e.to_string()))?;

    init_telemetry(&config.server.rust_log).map_err(io::Error::other)?;

    let db_pool = create_pool(&config).await.map_err(io::Error::other)?;
    run_migrations(&db_pool).await.map_err(io::Error::other)?;

    let store = Arc::new(PgEntityStore::new(db_pool));
    let state = web::Data::new(AppState::from_store(store, config.proposals.refix_policy));

    tracing::info!(
        refix_policy = ?config.proposals.refix_policy,
        "Starting TeamMatch backend server on {}:{}",
        config.server.host,
        config.server.port
    );

    let auth_config = config.auth.clone();
    let cors_origins = config.server.cors_origins.clone();
    let server = HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(cors_middleware(&cors_origins))
            .wrap(actix_web::middleware::Logger::default())
            .route("/api/health", web::get().to(crate::http::health::health_check))
            .service(
                web::scope("/api")
                    .wrap(AuthMiddleware::new(JwtService::new(&auth_config)))
                    .configure(crate::http::proposal_handler::configure_routes),
            )
    })
    .bind((config.server.host.clone(), config.server.port))?
    .run();

    // Graceful shutdown
    let server_handle = server.handle();
    tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            tracing::info!("Shutdown signal received, stopping server...");
            server_handle.stop(true).await;
        }
    });

    server.await
}

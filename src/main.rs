use std::sync::Arc;

use actix_web::middleware::NormalizePath;
use actix_web::web::Data;
use actix_web::{App, HttpServer, Responder, get};
use anyhow::Context;
use dotenvy::dotenv;

mod api;
mod auth;
mod biometric;
mod config;
mod db;
mod docs;
mod model;
mod models;
mod regulation;
mod routes;
mod state;
mod store;
mod utils;

use config::Config;
use db::init_db;

use crate::biometric::CommandEncoder;
use crate::docs::ApiDoc;
use crate::regulation::SystemClock;
use crate::state::AppState;
use crate::store::MySqlStore;
use tracing::{error, info};
use tracing_appender::rolling;
use utoipa::OpenApi; // ← needed for ApiDoc::openapi()
use utoipa_swagger_ui::SwaggerUi;

#[get("/")]
async fn index() -> impl Responder {
    "Staff attendance service"
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let config = Config::from_env()?;

    // Rolling daily log
    let file_appender = rolling::daily(&config.log_dir, "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_target(false) // removes module path
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    info!("Server starting...");

    let pool = init_db(&config.database_url).await?;
    let store = Arc::new(MySqlStore::new(pool));

    let encoder = CommandEncoder::from_command_line(
        &config.face_encoder_cmd,
        config.face_encoder_timeout,
    )
    .context("FACE_ENCODER_CMD must not be empty")?;

    let state = Data::new(AppState::new(
        store.clone(),
        Arc::new(encoder),
        Arc::new(SystemClock),
        &config.regulation,
    ));

    let identity = state.identity.clone();
    let store_for_warmup = store.clone();
    actix_web::rt::spawn(async move {
        if let Err(e) = identity.cache().warmup(store_for_warmup.as_ref(), 250).await {
            error!("Failed to warmup descriptor cache: {:?}", e);
        }
    });

    // Backfill missing days first, then summarize once a day
    let aggregator = state.aggregator.clone();
    let report_hour = config.report_hour;
    actix_web::rt::spawn(async move {
        aggregator.backfill().await;
        aggregator.run_daily(report_hour).await;
    });

    let server_addr = config.server_addr.clone();
    let config_data = Data::new(config);

    HttpServer::new(move || {
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}") // ← important: wildcard {_:.*} to match JS/CSS files
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(config_data.clone())
            .app_data(state.clone())
            .service(index)
            // Protected routes with rate limiting
            .configure(|cfg| routes::configure(cfg, &config_data))
    })
    .bind(&server_addr)
    .with_context(|| format!("Failed to bind {server_addr}"))?
    .run()
    .await?;

    Ok(())
}

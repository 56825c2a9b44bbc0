use actix_web::middleware::NormalizePath;
use actix_web::web::Data;
use actix_web::{App, HttpServer, Responder, get};
use chrono::{Datelike, Utc};
use dotenvy::dotenv;
use std::sync::Arc;

mod api;
mod auth;
mod config;
mod db;
mod docs;
mod engine;
mod error;
mod model;
mod models;
mod out_of_office;
mod routes;
mod utils;

use config::Config;
use db::init_db;

use crate::docs::ApiDoc;
use crate::out_of_office::mailbox::GraphMailboxClient;
use crate::out_of_office::runner::spawn_out_of_office_runner;
use crate::out_of_office::store::MySqlOutOfOfficeStore;
use crate::utils::holiday_cache::HolidayCache;
use tracing::{error, info, warn};
use tracing_appender::rolling;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[get("/")]
async fn index() -> impl Responder {
    "absentify"
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();

    // Rolling daily log
    let file_appender = rolling::daily("logs", "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_target(false)
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    let config = Config::from_env().map_err(|e| {
        error!(error = %e, "Invalid configuration");
        std::io::Error::other(e.to_string())
    })?;

    info!("Server starting...");

    let pool = init_db(&config.database_url).await.map_err(|e| {
        error!(error = %e, "Database connection failed");
        std::io::Error::other(e)
    })?;

    let holidays = HolidayCache::new(config.holiday_cache_ttl);

    let pool_for_warmup = pool.clone();
    let cache_for_warmup = holidays.clone();
    actix_web::rt::spawn(async move {
        let year = Utc::now().year();
        if let Err(e) = cache_for_warmup
            .warmup(&pool_for_warmup, &[year, year + 1], 500)
            .await
        {
            warn!(error = ?e, "Failed to warm up holiday cache");
        }
    });

    match (&config.graph, config.ooo_enabled) {
        (Some(graph), true) => match GraphMailboxClient::new(graph.clone()) {
            Ok(client) => {
                spawn_out_of_office_runner(
                    Arc::new(MySqlOutOfOfficeStore::new(pool.clone())),
                    Arc::new(client),
                    config.ooo_interval,
                );
                info!(interval = ?config.ooo_interval, "Out-of-office runner started");
            }
            Err(e) => error!(error = %e, "Failed to build mailbox client, runner disabled"),
        },
        (None, true) => warn!("Graph credentials missing, out-of-office runner disabled"),
        (_, false) => info!("Out-of-office runner disabled by configuration"),
    }

    let server_addr = config.server_addr.clone();

    HttpServer::new(move || {
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                // wildcard {_:.*} to match JS/CSS files
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(Data::new(pool.clone()))
            .app_data(Data::new(config.clone()))
            .app_data(Data::new(holidays.clone()))
            .service(index)
            .configure(|cfg| routes::configure(cfg, config.clone()))
    })
    .bind(server_addr)?
    .run()
    .await
}

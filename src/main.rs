mod auth;
mod book_handlers;
mod config;
mod db;
mod error;
mod models;
mod state;
mod user_handlers;

use actix_web::{get, middleware, web, App, HttpResponse, HttpServer, Responder};
use anyhow::{Context, Result};
use config::Config;
use error::ApiError;
use log::info;
use models::StatusResponse;
use state::AppState;

#[get("/")]
async fn index() -> impl Responder {
    HttpResponse::Ok().json(StatusResponse {
        status: "running".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Simple health check
#[get("/health")]
async fn health() -> impl Responder {
    HttpResponse::Ok().body("OK")
}

/// Routes plus the extractor settings that turn malformed input into 422s.
fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _req| ApiError::invalid_input("request body", err).into()),
    )
    .app_data(
        web::FormConfig::default()
            .error_handler(|err, _req| ApiError::invalid_input("form data", err).into()),
    )
    .app_data(
        web::PathConfig::default()
            .error_handler(|err, _req| ApiError::invalid_input("path parameter", err).into()),
    )
    .service(index)
    .service(health)
    .service(user_handlers::login)
    .service(user_handlers::protected)
    .service(book_handlers::add_book)
    .service(book_handlers::list_books)
    .service(book_handlers::get_book);
}

#[actix_web::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let log_env = env_logger::Env::default().filter_or("BOOKSTORE_LOG_LEVEL", "info");
    env_logger::Builder::from_env(log_env)
        .format_timestamp_millis()
        .init();

    let cfg = Config::from_env().context("load config")?;
    let state = web::Data::new(AppState::from_config(&cfg)?);
    info!(
        "Loaded {} user(s), tokens expire after {} minutes",
        state.users.len(),
        cfg.token_ttl.num_minutes()
    );

    let addr = cfg.bind_addr();
    info!("Listening on: {addr}");

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(middleware::Logger::default())
            .configure(configure)
    })
    .bind(&addr)
    .with_context(|| format!("bind {addr}"))?
    .run()
    .await
    .context("run server")?;

    info!("Server stopped");
    Ok(())
}

use actix_web::{App, HttpServer, web};
use log::{info, warn};
use std::io;
use std::path::Path;

use replay_store::api;
use replay_store::app_state::AppState;
use replay_store::config::{AppConfig, LoggingConfig};

fn init_logging(logging: &LoggingConfig) -> io::Result<()> {
    if Path::new(&logging.config_file).exists() {
        log4rs::init_file(&logging.config_file, Default::default())
            .map_err(io::Error::other)?;
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
        warn!("Log config {} not found, logging to stderr", logging.config_file);
    }
    Ok(())
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    let config_path = AppConfig::config_path();
    let mut config = AppConfig::from_file(&config_path).map_err(|e| io::Error::other(e.to_string()))?;
    init_logging(&config.logging)?;

    if config_path.exists() {
        info!("Loaded configuration from {}", config_path.display());
    } else {
        warn!("Config file {} not found, using defaults", config_path.display());
    }
    config.apply_env_overrides();

    if config.auth.api_key.is_empty() {
        warn!("No API key configured, every request will be rejected");
    }

    let host = config.server.host.clone();
    let port = config.server.port;
    let workers = config.server.workers;
    let app_state = web::Data::new(AppState::from_config(config)?);

    info!("Starting server on {}:{}", host, port);

    HttpServer::new(move || {
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .app_data(app_state.clone())
            .configure(api::configure)
    })
    .workers(workers)
    .bind((host.as_str(), port))?
    .run()
    .await
}

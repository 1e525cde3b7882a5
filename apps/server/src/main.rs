#![warn(clippy::all, clippy::pedantic)]

use std::path::PathBuf;

use actix_web::{App, HttpServer, web};
use clap::Parser;
use tracing::info;

mod error;
mod routes;

use error::AppError;
use logger::init_tracing_with;
use pulse_service::Orchestrator;
use pulse_service::config::Config;
use pulse_service::pool::open_pool;

/// Pulse check engine and HTTP surface
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[actix_web::main]
async fn main() -> Result<(), AppError> {
    // A missing .env file is fine.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let config = Config::from_config(cli.config.as_ref())?;

    init_tracing_with(&config.logging.level);
    info!("{config}");

    let pool = open_pool(&config.database.path, config.database.max_connections).await?;
    let orchestrator = Orchestrator::new(config, pool).await?;
    orchestrator.start().await?;

    let result = run_server(&orchestrator).await;
    orchestrator.shutdown();
    result
}

async fn run_server(orchestrator: &Orchestrator) -> Result<(), AppError> {
    let server = &orchestrator.config().server;
    let processor = web::Data::from(orchestrator.processor());
    let scheduler = web::Data::from(orchestrator.scheduler());

    info!("Listening on {}:{}", server.bind, server.port);
    HttpServer::new(move || {
        App::new().app_data(processor.clone()).app_data(scheduler.clone()).configure(routes::routes)
    })
    .bind((server.bind.as_str(), server.port))?
    .run()
    .await?;

    Ok(())
}

#![warn(clippy::all, clippy::pedantic)]

use std::sync::Arc;

use actix_web::{App, HttpServer, web};
use clap::Parser;
use logger::init_tracing;
use tracing::{info, warn};

mod auth;
mod config;
mod database;
mod error;
mod models;
mod pool;
mod routes;
mod trigger;

use config::Config;
use database::{Database, DatabaseImpl};
use error::AppError;
use pool::LibsqlManager;
use trigger::{CheckerClient, TriggerService};

/// Shared application state handed to every request handler.
pub struct AppState {
    pub database: Arc<dyn Database>,
    pub trigger: TriggerService,
}

#[derive(Debug, Parser)]
#[command(name = "vigil-server", about = "Synthetic-check trigger API")]
struct Args {
    /// Path to the configuration file
    #[arg(long)]
    config: Option<std::path::PathBuf>,
}

#[actix_web::main]
async fn main() -> Result<(), AppError> {
    init_tracing();

    let args = Args::parse();
    let config = Config::from_config(args.config.as_deref())?;
    info!("{config}");

    let db = libsql::Builder::new_local(config.database.path.as_str()).build().await?;
    let pool: pool::LibsqlPool = deadpool::managed::Pool::builder(LibsqlManager::new(db)).build()?;

    let conn = pool.get().await?;
    database::initialize_database(&conn).await?;
    drop(conn);

    let database: Arc<dyn Database> = Arc::new(DatabaseImpl::new_from_pool(pool));

    let secret = config::cron_secret();
    if secret.is_empty() {
        warn!("VIGIL_CRON_SECRET is not set; checker dispatches go out unauthenticated");
    }

    let checker = CheckerClient::new(config.checker.clone(), secret)?;
    let trigger = TriggerService::new(database.clone(), checker);

    let state = web::Data::new(AppState { database, trigger });

    let bind = (config.server.bind.clone(), config.server.port);
    info!("Listening on {}:{}", config.server.bind, config.server.port);

    HttpServer::new(move || App::new().app_data(state.clone()).configure(routes::routes))
        .bind(bind)?
        .run()
        .await?;

    Ok(())
}

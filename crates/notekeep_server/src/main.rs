//! NoteKeep server entry point.

use actix_web::{middleware::Logger, web, App, HttpServer};
use dotenv::dotenv;
use log::{error, info, warn};
use notekeep_core::db::{open_db, open_db_in_memory};
use notekeep_core::{init_logging, NoteService, SqliteNoteRepository};
use notekeep_server::config::{ServerConfig, UsersFile};
use notekeep_server::{controllers, AppState};
use std::io;

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv().ok();

    let config = ServerConfig::from_env().map_err(startup_error)?;
    init_logging(&config.log_level, config.log_dir.as_deref()).map_err(startup_error)?;

    let registry = UsersFile::load(&config.users_file)
        .and_then(UsersFile::into_registry)
        .map_err(|err| {
            error!("event=startup module=server status=error error_code=users_file error={err}");
            startup_error(err)
        })?;
    if registry.credentials.is_empty() {
        warn!("event=startup module=server status=warn reason=no_users_configured");
    }

    let pool = if config.is_in_memory() {
        open_db_in_memory()
    } else {
        ensure_parent_dir(&config.database_url)?;
        open_db(&config.database_url)
    }
    .map_err(startup_error)?;
    let repo = SqliteNoteRepository::try_new(pool).map_err(startup_error)?;

    let state = AppState::new(NoteService::new(repo, registry.roles), registry.credentials);

    info!(
        "event=startup module=server status=ok bind={} port={} in_memory={}",
        config.bind,
        config.port,
        config.is_in_memory()
    );

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(state.clone()))
            .wrap(Logger::default())
            .configure(controllers::health::config_routes)
            .configure(controllers::notes::config)
    })
    .bind((config.bind.as_str(), config.port))?
    .run()
    .await
}

fn ensure_parent_dir(database_url: &str) -> io::Result<()> {
    match std::path::Path::new(database_url).parent() {
        Some(parent) if !parent.as_os_str().is_empty() => std::fs::create_dir_all(parent),
        _ => Ok(()),
    }
}

fn startup_error(err: impl std::fmt::Display) -> io::Error {
    io::Error::new(io::ErrorKind::Other, err.to_string())
}

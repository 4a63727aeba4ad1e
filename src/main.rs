use actix_web::{web, App, HttpServer};
use anyhow::Context;
use tracing_subscriber::EnvFilter;

use registro_caa::api;
use registro_caa::config::{AppConfig, StoreBackend};
use registro_caa::store::{SheetStore, SqliteStore, Store};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = AppConfig::from_env()?;

    let store = match config.backend {
        StoreBackend::Sqlite => Store::Sqlite(
            SqliteStore::connect(&config.database_path)
                .await
                .context("no se pudo abrir la base de datos")?,
        ),
        StoreBackend::Sheet => Store::Sheet(
            SheetStore::open(config.sheet_path.as_str())
                .context("no se pudo abrir la hoja de registros")?,
        ),
    };

    tracing::info!(
        port = config.port,
        backend = ?config.backend,
        "iniciando registro CAA"
    );

    let port = config.port;
    let store = web::Data::new(store);
    let config = web::Data::new(config);

    HttpServer::new(move || {
        App::new()
            .app_data(store.clone())
            .app_data(config.clone())
            .configure(api::configure)
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await?;

    Ok(())
}

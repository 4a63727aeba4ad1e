use anyhow::Context;

/// Runtime configuration, read once at startup from the environment
/// (a `.env` file is honored via dotenvy).
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub backend: StoreBackend,
    pub database_path: String,
    pub sheet_path: String,
    pub admin_user: String,
    pub admin_password: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Sqlite,
    Sheet,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let port = match std::env::var("PORT") {
            Ok(value) => value.parse().context("PORT debe ser un número")?,
            Err(_) => 3000,
        };

        let backend = match std::env::var("STORE_BACKEND")
            .unwrap_or_else(|_| "sqlite".to_string())
            .as_str()
        {
            "sqlite" => StoreBackend::Sqlite,
            "sheet" => StoreBackend::Sheet,
            other => anyhow::bail!("STORE_BACKEND desconocido: {other} (use sqlite o sheet)"),
        };

        Ok(AppConfig {
            port,
            backend,
            database_path: std::env::var("DATABASE_PATH")
                .unwrap_or_else(|_| "database.db".to_string()),
            sheet_path: std::env::var("SHEET_PATH")
                .unwrap_or_else(|_| "registros.csv".to_string()),
            admin_user: std::env::var("ADMIN_USER").unwrap_or_else(|_| "admin".to_string()),
            admin_password: std::env::var("ADMIN_PASSWORD")
                .context("ADMIN_PASSWORD debe estar definido")?,
        })
    }
}

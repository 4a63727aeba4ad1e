//! The record store: durable, append-only storage of check-in rows behind a
//! two-operation capability (`append`, `list_all`). Two backends satisfy it:
//! an embedded SQLite database and a sheet-shaped CSV file, mirroring the
//! spreadsheet deployments the center ran before the database variant.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

use crate::error::StoreError;
use crate::model::RawRow;

pub enum Store {
    Sqlite(SqliteStore),
    Sheet(SheetStore),
}

impl Store {
    pub async fn append(&self, row: &RawRow) -> Result<(), StoreError> {
        match self {
            Store::Sqlite(store) => store.append(row).await,
            Store::Sheet(store) => store.append(row),
        }
    }

    /// Every row ever appended, oldest first, no pagination.
    pub async fn list_all(&self) -> Result<Vec<RawRow>, StoreError> {
        match self {
            Store::Sqlite(store) => store.list_all().await,
            Store::Sheet(store) => store.list_all(),
        }
    }
}

pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub async fn connect(path: &str) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new().connect_with(options).await?;
        Self::from_pool(pool).await
    }

    /// An in-memory SQLite database lives inside a single connection, so the
    /// pool is capped at one to keep the schema visible across queries.
    pub async fn in_memory() -> Result<Self, StoreError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;
        Self::from_pool(pool).await
    }

    async fn from_pool(pool: SqlitePool) -> Result<Self, StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS registros (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                nombre TEXT NOT NULL,
                matricula TEXT NOT NULL DEFAULT '',
                actividad TEXT NOT NULL,
                sala TEXT NOT NULL,
                fecha TEXT NOT NULL,
                hora TEXT NOT NULL
            )
            "#,
        )
        .execute(&pool)
        .await?;

        Ok(SqliteStore { pool })
    }

    pub async fn append(&self, row: &RawRow) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO registros (nombre, matricula, actividad, sala, fecha, hora)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&row.nombre)
        .bind(&row.matricula)
        .bind(&row.actividad)
        .bind(&row.sala)
        .bind(&row.fecha)
        .bind(&row.hora)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn list_all(&self) -> Result<Vec<RawRow>, StoreError> {
        let rows = sqlx::query_as::<_, RawRow>(
            r#"
            SELECT nombre, matricula, actividad, sala, fecha, hora
            FROM registros
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}

/// A CSV file with the same columns the spreadsheet used. Reads and writes
/// are small and synchronous; the file is the source of truth, nothing is
/// cached between requests.
pub struct SheetStore {
    path: PathBuf,
}

const SHEET_HEADERS: [&str; 6] = ["nombre", "matricula", "actividad", "sala", "fecha", "hora"];

impl SheetStore {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        if !Path::new(&path).exists() {
            let mut writer = csv::Writer::from_path(&path)?;
            writer.write_record(SHEET_HEADERS)?;
            writer.flush()?;
        }
        Ok(SheetStore { path })
    }

    pub fn append(&self, row: &RawRow) -> Result<(), StoreError> {
        let file = OpenOptions::new().append(true).open(&self.path)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        writer.serialize(row)?;
        writer.flush()?;
        Ok(())
    }

    pub fn list_all(&self) -> Result<Vec<RawRow>, StoreError> {
        let mut reader = csv::Reader::from_path(&self.path)?;
        let mut rows = Vec::new();
        for result in reader.deserialize() {
            rows.push(result?);
        }
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fila(nombre: &str) -> RawRow {
        RawRow {
            nombre: nombre.to_string(),
            matricula: "A01".to_string(),
            actividad: "Tarea".to_string(),
            sala: "Ludoteca".to_string(),
            fecha: "2025-01-10".to_string(),
            hora: "09:30".to_string(),
        }
    }

    #[tokio::test]
    async fn sqlite_conserva_el_orden_de_llegada() {
        let store = SqliteStore::in_memory().await.unwrap();
        store.append(&fila("Ana")).await.unwrap();
        store.append(&fila("Luis")).await.unwrap();

        let rows = store.list_all().await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].nombre, "Ana");
        assert_eq!(rows[1].nombre, "Luis");
        assert_eq!(rows[0].hora, "09:30");
    }

    #[tokio::test]
    async fn hoja_escribe_encabezados_y_filas() {
        let path = std::env::temp_dir().join(format!(
            "registro_caa_test_{}.csv",
            std::process::id()
        ));
        let _ = std::fs::remove_file(&path);

        let store = SheetStore::open(&path).unwrap();
        assert!(store.list_all().unwrap().is_empty());

        store.append(&fila("Ana")).unwrap();
        store.append(&fila("Luis")).unwrap();

        let rows = store.list_all().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].nombre, "Luis");

        std::fs::remove_file(&path).unwrap();
    }
}

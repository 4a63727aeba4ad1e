use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;

/// Request-level error taxonomy. Every variant maps to a single JSON error
/// payload; none of them takes the process down.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("Credenciales de administrador inválidas")]
    Unauthorized,

    #[error("almacén de registros no disponible: {0}")]
    Store(#[from] StoreError),

    #[error("no se pudo generar el reporte: {0}")]
    Export(#[from] rust_xlsxwriter::XlsxError),
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Store(_) | ApiError::Export(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let mut builder = HttpResponse::build(self.status_code());
        if matches!(self, ApiError::Unauthorized) {
            builder.insert_header(("WWW-Authenticate", "Basic realm=\"registro-caa\""));
        }
        builder.json(json!({ "error": self.to_string() }))
    }
}

/// Failure of the backing store (SQLite or the sheet file). Aborts the
/// current request only; a later request may succeed if connectivity returns.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("base de datos no disponible: {0}")]
    Database(#[from] sqlx::Error),

    #[error("no se pudo leer la hoja de registros: {0}")]
    Sheet(#[from] csv::Error),

    #[error("no se pudo abrir la hoja de registros: {0}")]
    Io(#[from] std::io::Error),
}

/// A stored row that cannot be turned into an `AttendanceRecord`. The caller
/// skips the row and keeps going; one bad row never aborts a listing.
#[derive(Debug, thiserror::Error)]
#[error("fila no interpretable: {reason}")]
pub struct MalformedRow {
    pub reason: String,
}

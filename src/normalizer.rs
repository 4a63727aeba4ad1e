//! Turns raw stored rows into canonical `AttendanceRecord`s. The sheet
//! variants of the store accumulated inconsistent date separators, mixed
//! day/month ordering and free-text room names over the years; everything
//! downstream assumes this module has already cleaned that up.

use crate::catalog;
use crate::error::MalformedRow;
use crate::model::{AttendanceRecord, RawRow};

/// `Ok(None)` means the row is a blank trailing row (empty name) and is
/// skipped silently; `Err` means the row is present but not interpretable.
pub fn normalize(row: &RawRow) -> Result<Option<AttendanceRecord>, MalformedRow> {
    let name = row.nombre.trim();
    if name.is_empty() {
        return Ok(None);
    }

    let time = row.hora.trim().to_string();
    let hour = parse_hour(&time)?;

    let activity = match catalog::canonical_actividad(&row.actividad) {
        Some(label) => label.to_string(),
        None => row.actividad.trim().to_string(),
    };
    let room = match catalog::canonical_sala(&row.sala) {
        Some(label) => label.to_string(),
        None => row.sala.trim().to_string(),
    };

    Ok(Some(AttendanceRecord {
        name: name.to_string(),
        student_id: row.matricula.trim().to_string(),
        activity,
        room,
        date: normalize_fecha(&row.fecha),
        hour,
        time,
    }))
}

/// Normalizes every row of a listing, skipping blanks silently and malformed
/// rows with a warning. One bad row never aborts the computation.
pub fn normalize_rows(rows: &[RawRow]) -> Vec<AttendanceRecord> {
    let mut records = Vec::with_capacity(rows.len());
    for row in rows {
        match normalize(row) {
            Ok(Some(record)) => records.push(record),
            Ok(None) => {}
            Err(err) => tracing::warn!(nombre = %row.nombre, "{err}"),
        }
    }
    records
}

/// Accepts `/` or `-` as separator. A `DD-MM-YYYY` shaped value is re-ordered
/// to `YYYY-MM-DD`; anything else passes through assumed already ISO-ordered.
pub fn normalize_fecha(raw: &str) -> String {
    let fecha = raw.trim().replace('/', "-");
    let parts: Vec<&str> = fecha.split('-').collect();
    if parts.len() == 3 && parts[0].len() == 2 && parts[1].len() == 2 && parts[2].len() == 4 {
        format!("{}-{}-{}", parts[2], parts[1], parts[0])
    } else {
        fecha
    }
}

/// The hour is the first two characters of the stored time-of-day text; an
/// absent time means midnight. Range checking happens at aggregation time.
fn parse_hour(time: &str) -> Result<u8, MalformedRow> {
    if time.is_empty() {
        return Ok(0);
    }
    let prefix: String = time.chars().take(2).collect();
    prefix.parse::<u8>().map_err(|_| MalformedRow {
        reason: format!("hora no interpretable: {time:?}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(nombre: &str, sala: &str, fecha: &str, hora: &str) -> RawRow {
        RawRow {
            nombre: nombre.to_string(),
            matricula: "A01".to_string(),
            actividad: "tarea".to_string(),
            sala: sala.to_string(),
            fecha: fecha.to_string(),
            hora: hora.to_string(),
        }
    }

    #[test]
    fn reordena_fechas_dia_mes() {
        assert_eq!(normalize_fecha("10/01/2025"), "2025-01-10");
        assert_eq!(normalize_fecha("31-12-2024"), "2024-12-31");
    }

    #[test]
    fn fechas_iso_pasan_sin_cambio() {
        assert_eq!(normalize_fecha("2025-01-10"), "2025-01-10");
        assert_eq!(normalize_fecha("2025/01/10"), "2025-01-10");
    }

    #[test]
    fn canonicaliza_sala_y_actividad() {
        let record = normalize(&raw("Ana", "LUDOTECA", "2025-01-10", "09:30"))
            .unwrap()
            .unwrap();
        assert_eq!(record.room, "Ludoteca");
        assert_eq!(record.activity, "Tarea");
        assert_eq!(record.hour, 9);
        assert_eq!(record.time, "09:30");
    }

    #[test]
    fn texto_desconocido_pasa_verbatim() {
        let mut row = raw("Ana", "Sala nueva", "2025-01-10", "10:00");
        row.actividad = "Club de ajedrez".to_string();
        let record = normalize(&row).unwrap().unwrap();
        assert_eq!(record.room, "Sala nueva");
        assert_eq!(record.activity, "Club de ajedrez");
    }

    #[test]
    fn nombre_vacio_se_omite_en_silencio() {
        assert!(normalize(&raw("   ", "Ludoteca", "2025-01-10", "09:00"))
            .unwrap()
            .is_none());
    }

    #[test]
    fn hora_ausente_es_medianoche() {
        let record = normalize(&raw("Ana", "Ludoteca", "2025-01-10", ""))
            .unwrap()
            .unwrap();
        assert_eq!(record.hour, 0);
    }

    #[test]
    fn hora_no_numerica_es_fila_malformada() {
        assert!(normalize(&raw("Ana", "Ludoteca", "2025-01-10", "mediodía")).is_err());
    }

    #[test]
    fn filas_malas_no_abortan_el_listado() {
        let rows = vec![
            raw("Ana", "Ludoteca", "2025-01-10", "09:00"),
            raw("", "Ludoteca", "2025-01-10", "09:00"),
            raw("Luis", "Ludoteca", "2025-01-10", "sin hora"),
            raw("Eva", "Len 7", "2025-01-11", "10:00"),
        ];
        let records = normalize_rows(&rows);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].name, "Ana");
        assert_eq!(records[1].name, "Eva");
    }
}

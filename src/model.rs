use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A check-in row exactly as the backing store returns it, before any
/// normalization. Field names follow the stored column headers.
#[derive(Debug, Clone, Default, Serialize, Deserialize, sqlx::FromRow)]
pub struct RawRow {
    pub nombre: String,
    pub matricula: String,
    pub actividad: String,
    pub sala: String,
    pub fecha: String,
    pub hora: String,
}

/// One attendance event in canonical form. Immutable once created.
///
/// `date` is the civil date `YYYY-MM-DD` and `hour` the 0-23 hour component,
/// both taken from the check-in instant in America/Mexico_City. `time` keeps
/// the stored time-of-day text for the export's Hora column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttendanceRecord {
    pub name: String,
    pub student_id: String,
    pub activity: String,
    pub room: String,
    pub date: String,
    pub hour: u8,
    pub time: String,
}

/// Filter for statistics and export requests. All fields optional; the
/// dashboard sends empty strings for untouched inputs, `tidy` drops those.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct StatsFilter {
    pub from: Option<String>,
    pub to: Option<String>,
    pub sala: Option<String>,
    pub actividad: Option<String>,
}

impl StatsFilter {
    pub fn tidy(self) -> Self {
        let keep = |value: Option<String>| value.filter(|s| !s.trim().is_empty());
        StatsFilter {
            from: keep(self.from),
            to: keep(self.to),
            sala: keep(self.sala),
            actividad: keep(self.actividad),
        }
    }
}

/// Check-in form payload. Everything defaults to empty so missing fields
/// surface as a ValidationError instead of a deserialization failure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub nombre: String,
    #[serde(default)]
    pub matricula: String,
    #[serde(default)]
    pub actividad: String,
    #[serde(default)]
    pub sala: String,
}

/// The full aggregated result of one statistics request. Built fresh per
/// request and discarded after serialization; never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatisticsBundle {
    pub total: u64,
    #[serde(rename = "por_sala")]
    pub by_room: BTreeMap<String, u64>,
    #[serde(rename = "por_actividad")]
    pub by_activity: BTreeMap<String, u64>,
    #[serde(rename = "por_dia")]
    pub by_day: BTreeMap<String, u64>,
    #[serde(rename = "por_hora")]
    pub by_hour: BTreeMap<u8, u64>,
    #[serde(rename = "mapa_calor")]
    pub heatmap: BTreeMap<String, BTreeMap<u8, u64>>,
    #[serde(rename = "porcentajes")]
    pub percentages: Percentages,
    #[serde(rename = "resumen")]
    pub summary: Summary,
}

/// Share of `total` per key, one decimal place, per dimension.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Percentages {
    pub sala: BTreeMap<String, f64>,
    pub actividad: BTreeMap<String, f64>,
    pub hora: BTreeMap<u8, f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub actividad_mas_frecuente: Option<String>,
    pub actividad_menos_frecuente: Option<String>,
    pub sala_mas_concurrida: Option<String>,
    pub sala_menos_concurrida: Option<String>,
    pub hora_pico: Option<u8>,
    pub promedio_por_dia: f64,
    pub promedio_por_hora: f64,
    #[serde(rename = "textoResumen")]
    pub texto_resumen: String,
}

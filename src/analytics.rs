//! The statistics engine: a pure fold of `(records, filter)` into the
//! aggregated bundle the dashboard renders. No state is kept across requests;
//! calling `compute` twice with the same inputs yields the same bundle.

use std::collections::BTreeMap;

use crate::model::{AttendanceRecord, Percentages, StatisticsBundle, StatsFilter, Summary};

/// The center is open 08:00-20:00. Hours outside this window still count in
/// the totals and the per-day/room/activity tables, but are excluded from the
/// hourly profile and the heat map so closing-time rows don't distort them.
pub const HORA_APERTURA: u8 = 8;
pub const HORA_CIERRE: u8 = 20;

/// Inclusive on both ends. Dates compare lexicographically, which is correct
/// because both sides are `YYYY-MM-DD`.
pub fn matches(record: &AttendanceRecord, filter: &StatsFilter) -> bool {
    if let Some(from) = &filter.from {
        if record.date.as_str() < from.as_str() {
            return false;
        }
    }
    if let Some(to) = &filter.to {
        if record.date.as_str() > to.as_str() {
            return false;
        }
    }
    if let Some(sala) = &filter.sala {
        if &record.room != sala {
            return false;
        }
    }
    if let Some(actividad) = &filter.actividad {
        if &record.activity != actividad {
            return false;
        }
    }
    true
}

pub fn compute(records: &[AttendanceRecord], filter: &StatsFilter) -> StatisticsBundle {
    let mut total: u64 = 0;
    let mut by_room: BTreeMap<String, u64> = BTreeMap::new();
    let mut by_activity: BTreeMap<String, u64> = BTreeMap::new();
    let mut by_day: BTreeMap<String, u64> = BTreeMap::new();
    let mut by_hour: BTreeMap<u8, u64> = BTreeMap::new();
    let mut heatmap: BTreeMap<String, BTreeMap<u8, u64>> = BTreeMap::new();

    for record in records.iter().filter(|r| matches(r, filter)) {
        total += 1;
        *by_room.entry(record.room.clone()).or_insert(0) += 1;
        *by_activity.entry(record.activity.clone()).or_insert(0) += 1;
        *by_day.entry(record.date.clone()).or_insert(0) += 1;

        if (HORA_APERTURA..=HORA_CIERRE).contains(&record.hour) {
            *by_hour.entry(record.hour).or_insert(0) += 1;
            *heatmap
                .entry(record.date.clone())
                .or_default()
                .entry(record.hour)
                .or_insert(0) += 1;
        }
    }

    let percentages = Percentages {
        sala: percentages_of(&by_room, total),
        actividad: percentages_of(&by_activity, total),
        hora: percentages_of(&by_hour, total),
    };
    let summary = build_summary(total, &by_room, &by_activity, &by_day, &by_hour, filter);

    StatisticsBundle {
        total,
        by_room,
        by_activity,
        by_day,
        by_hour,
        heatmap,
        percentages,
        summary,
    }
}

/// Same filter as `compute`, but record-level: the rows the export renders,
/// stable-sorted by (date, hour) so same-slot rows keep their stored order.
pub fn project(records: &[AttendanceRecord], filter: &StatsFilter) -> Vec<AttendanceRecord> {
    let mut rows: Vec<AttendanceRecord> = records
        .iter()
        .filter(|r| matches(r, filter))
        .cloned()
        .collect();
    rows.sort_by(|a, b| a.date.cmp(&b.date).then(a.hour.cmp(&b.hour)));
    rows
}

/// `round(count / total * 100, 1)`. An empty set yields an empty table, never
/// a division error.
fn percentages_of<K: Clone + Ord>(counts: &BTreeMap<K, u64>, total: u64) -> BTreeMap<K, f64> {
    counts
        .iter()
        .map(|(key, &count)| {
            let pct = if total == 0 {
                0.0
            } else {
                (count as f64 * 1000.0 / total as f64).round() / 10.0
            };
            (key.clone(), pct)
        })
        .collect()
}

/// Busiest key is the strictly maximal count; ties resolve to the first key
/// in iteration order, which for these ordered tables is the smallest key.
/// Least busy is symmetric.
fn extremes<K: Clone + Ord>(counts: &BTreeMap<K, u64>) -> (Option<K>, Option<K>) {
    let mut busiest: Option<(&K, u64)> = None;
    let mut quietest: Option<(&K, u64)> = None;
    for (key, &count) in counts {
        if busiest.map_or(true, |(_, best)| count > best) {
            busiest = Some((key, count));
        }
        if quietest.map_or(true, |(_, least)| count < least) {
            quietest = Some((key, count));
        }
    }
    (
        busiest.map(|(key, _)| key.clone()),
        quietest.map(|(key, _)| key.clone()),
    )
}

fn build_summary(
    total: u64,
    by_room: &BTreeMap<String, u64>,
    by_activity: &BTreeMap<String, u64>,
    by_day: &BTreeMap<String, u64>,
    by_hour: &BTreeMap<u8, u64>,
    filter: &StatsFilter,
) -> Summary {
    let (actividad_mas, actividad_menos) = extremes(by_activity);
    let (sala_mas, sala_menos) = extremes(by_room);
    let (hora_pico, _) = extremes(by_hour);

    // Empty dimensions divide by one so the average degrades to the raw total.
    let promedio_por_dia = round2(total as f64 / by_day.len().max(1) as f64);
    let promedio_por_hora = round2(total as f64 / by_hour.len().max(1) as f64);

    let texto_resumen = texto_resumen(
        total,
        filter,
        actividad_mas.as_deref(),
        sala_mas.as_deref(),
        hora_pico,
    );

    Summary {
        actividad_mas_frecuente: actividad_mas,
        actividad_menos_frecuente: actividad_menos,
        sala_mas_concurrida: sala_mas,
        sala_menos_concurrida: sala_menos,
        hora_pico,
        promedio_por_dia,
        promedio_por_hora,
        texto_resumen,
    }
}

fn texto_resumen(
    total: u64,
    filter: &StatsFilter,
    actividad: Option<&str>,
    sala: Option<&str>,
    hora_pico: Option<u8>,
) -> String {
    let ambito_sala = match &filter.sala {
        Some(sala) => format!("en la sala \"{sala}\""),
        None => "en todas las salas".to_string(),
    };
    let ambito_fechas = match (&filter.from, &filter.to) {
        (Some(from), Some(to)) => format!("entre el {from} y el {to}"),
        (Some(from), None) => format!("desde el {from}"),
        (None, Some(to)) => format!("hasta el {to}"),
        (None, None) => "en el periodo completo".to_string(),
    };

    if total == 0 {
        return format!("No hay registros {ambito_sala} {ambito_fechas}.");
    }

    let mut texto = format!("Se registraron {total} asistencias {ambito_sala} {ambito_fechas}.");
    if let Some(actividad) = actividad {
        texto.push_str(&format!(" La actividad más frecuente fue \"{actividad}\"."));
    }
    if filter.sala.is_none() {
        if let Some(sala) = sala {
            texto.push_str(&format!(" La sala más concurrida fue \"{sala}\"."));
        }
    }
    if let Some(hora) = hora_pico {
        texto.push_str(&format!(" La hora pico fue a las {hora}:00."));
    }
    texto
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(name: &str, room: &str, activity: &str, date: &str, hour: u8) -> AttendanceRecord {
        AttendanceRecord {
            name: name.to_string(),
            student_id: String::new(),
            activity: activity.to_string(),
            room: room.to_string(),
            date: date.to_string(),
            hour,
            time: format!("{hour:02}:00"),
        }
    }

    fn tres_registros() -> Vec<AttendanceRecord> {
        vec![
            rec("Ana", "Ludoteca", "Taller", "2025-01-10", 9),
            rec("Luis", "Ludoteca", "Taller", "2025-01-10", 9),
            rec("Eva", "Len 7", "Tarea", "2025-01-11", 22),
        ]
    }

    #[test]
    fn agrupa_y_excluye_horas_fuera_de_ventana() {
        let bundle = compute(&tres_registros(), &StatsFilter::default());
        assert_eq!(bundle.total, 3);
        assert_eq!(bundle.by_room.get("Ludoteca"), Some(&2));
        assert_eq!(bundle.by_room.get("Len 7"), Some(&1));
        assert_eq!(bundle.by_hour.get(&9), Some(&2));
        assert_eq!(bundle.by_hour.len(), 1);
        assert_eq!(bundle.heatmap.len(), 1);
        assert_eq!(bundle.heatmap["2025-01-10"].get(&9), Some(&2));
        // La hora 22 cuenta en el total y por día, pero no en el perfil horario.
        assert_eq!(bundle.by_day.get("2025-01-11"), Some(&1));
    }

    #[test]
    fn filtro_por_sala() {
        let filter = StatsFilter {
            sala: Some("Len 7".to_string()),
            ..StatsFilter::default()
        };
        let bundle = compute(&tres_registros(), &filter);
        assert_eq!(bundle.total, 1);
        assert_eq!(bundle.by_room.get("Len 7"), Some(&1));
        assert!(bundle.by_hour.is_empty());
        assert!(bundle.heatmap.is_empty());
    }

    #[test]
    fn filtro_por_rango_de_fechas() {
        let filter = StatsFilter {
            from: Some("2025-01-11".to_string()),
            to: Some("2025-01-11".to_string()),
            ..StatsFilter::default()
        };
        let bundle = compute(&tres_registros(), &filter);
        assert_eq!(bundle.total, 1);
        assert!(!bundle.by_day.contains_key("2025-01-10"));
    }

    #[test]
    fn filtro_por_actividad() {
        let filter = StatsFilter {
            actividad: Some("Taller".to_string()),
            ..StatsFilter::default()
        };
        let bundle = compute(&tres_registros(), &filter);
        assert_eq!(bundle.total, 2);
    }

    #[test]
    fn conjunto_vacio_no_falla() {
        let bundle = compute(&[], &StatsFilter::default());
        assert_eq!(bundle.total, 0);
        assert!(bundle.by_room.is_empty());
        assert!(bundle.by_hour.is_empty());
        assert!(bundle.percentages.sala.is_empty());
        assert_eq!(bundle.summary.promedio_por_dia, 0.0);
        assert_eq!(bundle.summary.hora_pico, None);
        assert!(bundle.summary.texto_resumen.starts_with("No hay registros"));
    }

    #[test]
    fn sumas_de_dimensiones_cuadran() {
        let bundle = compute(&tres_registros(), &StatsFilter::default());
        let suma_salas: u64 = bundle.by_room.values().sum();
        let suma_actividades: u64 = bundle.by_activity.values().sum();
        let suma_horas: u64 = bundle.by_hour.values().sum();
        assert_eq!(suma_salas, bundle.total);
        assert_eq!(suma_actividades, bundle.total);
        assert!(suma_horas <= bundle.total);
    }

    #[test]
    fn computo_es_idempotente() {
        let records = tres_registros();
        let filter = StatsFilter::default();
        assert_eq!(compute(&records, &filter), compute(&records, &filter));
    }

    #[test]
    fn porcentajes_redondean_a_un_decimal() {
        let bundle = compute(&tres_registros(), &StatsFilter::default());
        assert_eq!(bundle.percentages.sala.get("Ludoteca"), Some(&66.7));
        assert_eq!(bundle.percentages.sala.get("Len 7"), Some(&33.3));
        let suma: f64 = bundle.percentages.sala.values().sum();
        assert!((suma - 100.0).abs() < 0.5);
    }

    #[test]
    fn empates_los_gana_la_primera_clave() {
        let records = vec![
            rec("Ana", "Ludoteca", "Tarea", "2025-01-10", 9),
            rec("Luis", "Diagnósticos", "Investigación", "2025-01-10", 10),
        ];
        let bundle = compute(&records, &StatsFilter::default());
        // Ambas salas tienen 1; gana la primera en orden de iteración.
        assert_eq!(
            bundle.summary.sala_mas_concurrida.as_deref(),
            Some("Diagnósticos")
        );
        assert_eq!(
            bundle.summary.sala_menos_concurrida.as_deref(),
            Some("Diagnósticos")
        );
    }

    #[test]
    fn promedios_por_dia_y_hora() {
        let bundle = compute(&tres_registros(), &StatsFilter::default());
        // 3 registros en 2 días distintos; una sola hora dentro de ventana.
        assert_eq!(bundle.summary.promedio_por_dia, 1.5);
        assert_eq!(bundle.summary.promedio_por_hora, 3.0);
        assert_eq!(bundle.summary.hora_pico, Some(9));
    }

    #[test]
    fn proyeccion_ordena_estable_por_fecha_y_hora() {
        let records = vec![
            rec("Eva", "Len 7", "Tarea", "2025-01-11", 22),
            rec("Ana", "Ludoteca", "Taller", "2025-01-10", 9),
            rec("Luis", "Ludoteca", "Taller", "2025-01-10", 9),
        ];
        let rows = project(&records, &StatsFilter::default());
        let nombres: Vec<&str> = rows.iter().map(|r| r.name.as_str()).collect();
        // Mismo día y hora: se conserva el orden de llegada (Ana antes que Luis).
        assert_eq!(nombres, vec!["Ana", "Luis", "Eva"]);
    }

    #[test]
    fn resumen_narrativo_nombra_actividad_y_hora_pico() {
        let bundle = compute(&tres_registros(), &StatsFilter::default());
        let texto = &bundle.summary.texto_resumen;
        assert!(texto.contains("3 asistencias"));
        assert!(texto.contains("Taller"));
        assert!(texto.contains("9:00"));
    }
}

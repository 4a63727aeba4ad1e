//! The fixed catalogs of known rooms and activities. This is the only copy:
//! the normalizer canonicalizes against it and the web clients read it
//! through `/api/catalog`, so the lists can never drift apart.

use std::collections::BTreeMap;

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

pub const SALAS: [&str; 6] = [
    "Medios digitales",
    "Ludoteca",
    "Diagnósticos",
    "Lecto escritura",
    "Sala de internet",
    "Len 7",
];

pub const ACTIVIDADES: [&str; 9] = [
    "Tarea",
    "Investigación",
    "Clase en línea",
    "Práctica de idioma",
    "Actividad lúdica",
    "Examen diagnóstico",
    "Examen de lengua meta",
    "Examen de CELE",
    "Otro (especifique)",
];

/// Which activities are offered in which room, for the cascading selects on
/// the check-in form and the dashboard filters.
pub fn actividades_por_sala() -> BTreeMap<&'static str, Vec<&'static str>> {
    BTreeMap::from([
        (
            "Medios digitales",
            vec!["Tarea", "Investigación", "Clase en línea", "Otro (especifique)"],
        ),
        (
            "Ludoteca",
            vec!["Actividad lúdica", "Práctica de idioma", "Otro (especifique)"],
        ),
        (
            "Diagnósticos",
            vec!["Examen diagnóstico", "Examen de CELE", "Otro (especifique)"],
        ),
        (
            "Lecto escritura",
            vec!["Tarea", "Práctica de idioma", "Otro (especifique)"],
        ),
        (
            "Sala de internet",
            vec!["Tarea", "Investigación", "Clase en línea", "Otro (especifique)"],
        ),
        (
            "Len 7",
            vec!["Examen de lengua meta", "Práctica de idioma", "Otro (especifique)"],
        ),
    ])
}

/// Folds free text to its lookup key: trimmed, diacritics stripped, lowercased.
pub fn fold_key(text: &str) -> String {
    text.trim()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase()
}

pub fn canonical_sala(text: &str) -> Option<&'static str> {
    lookup(&SALAS, text)
}

pub fn canonical_actividad(text: &str) -> Option<&'static str> {
    lookup(&ACTIVIDADES, text)
}

fn lookup(table: &[&'static str], text: &str) -> Option<&'static str> {
    let key = fold_key(text);
    table.iter().find(|label| fold_key(label) == key).copied()
}

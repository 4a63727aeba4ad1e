//! Renders a filtered, ordered record list into the spreadsheet the admin
//! downloads: one worksheet, bold header, one row per check-in.

use rust_xlsxwriter::{Format, Workbook, XlsxError};

use crate::model::AttendanceRecord;

pub const CONTENT_TYPE_XLSX: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

const COLUMNAS: [&str; 6] = ["Nombre", "Matrícula", "Actividad", "Sala", "Fecha", "Hora"];

/// `reporte_<from|inicio>_<to|fin>.xlsx`
pub fn nombre_reporte(from: Option<&str>, to: Option<&str>) -> String {
    format!(
        "reporte_{}_{}.xlsx",
        from.unwrap_or("inicio"),
        to.unwrap_or("fin")
    )
}

pub fn build_workbook(rows: &[AttendanceRecord]) -> Result<Vec<u8>, XlsxError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name("Registros")?;

    let encabezado = Format::new().set_bold();
    for (col, titulo) in COLUMNAS.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, *titulo, &encabezado)?;
    }

    for (i, record) in rows.iter().enumerate() {
        let row = (i + 1) as u32;
        worksheet.write_string(row, 0, &record.name)?;
        worksheet.write_string(row, 1, &record.student_id)?;
        worksheet.write_string(row, 2, &record.activity)?;
        worksheet.write_string(row, 3, &record.room)?;
        worksheet.write_string(row, 4, &record.date)?;
        worksheet.write_string(row, 5, &record.time)?;
    }

    worksheet.set_column_width(0, 28)?;
    worksheet.set_column_width(1, 14)?;
    worksheet.set_column_width(2, 24)?;
    worksheet.set_column_width(3, 20)?;
    worksheet.set_column_width(4, 12)?;
    worksheet.set_column_width(5, 8)?;

    workbook.save_to_buffer()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nombre_del_archivo_usa_marcadores() {
        assert_eq!(nombre_reporte(None, None), "reporte_inicio_fin.xlsx");
        assert_eq!(
            nombre_reporte(Some("2025-01-01"), None),
            "reporte_2025-01-01_fin.xlsx"
        );
        assert_eq!(
            nombre_reporte(Some("2025-01-01"), Some("2025-01-31")),
            "reporte_2025-01-01_2025-01-31.xlsx"
        );
    }

    #[test]
    fn el_libro_es_un_zip_valido() {
        let rows = vec![AttendanceRecord {
            name: "Ana".to_string(),
            student_id: "A01".to_string(),
            activity: "Tarea".to_string(),
            room: "Ludoteca".to_string(),
            date: "2025-01-10".to_string(),
            hour: 9,
            time: "09:30".to_string(),
        }];
        let buffer = build_workbook(&rows).unwrap();
        assert!(buffer.len() > 4);
        assert_eq!(&buffer[0..2], b"PK");
    }
}

use crate::analyzer::{percentage, ProgramSummaryRow, SurveyStats, YearSummaryRow};
use crate::models::{CleanStudentRecord, LeadershipRecord, MatchedStudent, SurveyGraduate};
use anyhow::{Context, Result};
use rust_xlsxwriter::{Workbook, Worksheet, XlsxError};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Create a report file starting with the UTF-8 BOM. The reports are opened
/// in Excel by the administrative staff, and without the BOM it guesses the
/// wrong encoding for accented characters.
pub fn bom_file(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut file = File::create(path)
        .with_context(|| format!("Failed to create report file: {}", path.display()))?;
    file.write_all(b"\xEF\xBB\xBF")?;
    Ok(file)
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "Sí"
    } else {
        "No"
    }
}

fn fmt_pct(value: f64) -> String {
    format!("{:.2}", value)
}

/// Cleaned student rows, semicolon-separated like the source exports.
pub fn write_clean_records<W: Write>(records: &[CleanStudentRecord], writer: W) -> Result<()> {
    let mut csv_writer = csv::WriterBuilder::new().delimiter(b';').from_writer(writer);

    csv_writer.write_record([
        "Año",
        "Facultad",
        "Codigo_Programa",
        "Nombre_Programa",
        "Nombre_Estudiante",
        "Cedula",
        "Codigo_Estudiante",
        "Grupo",
    ])?;

    for record in records {
        csv_writer.write_record([
            &record.year.to_string(),
            &record.facultad,
            &record.program_code,
            &record.program_name,
            &record.student_name,
            &record.cedula,
            &record.student_code,
            &record.group,
        ])?;
    }

    csv_writer.flush()?;
    Ok(())
}

/// Full student detail with the alumni flag; `include_prior` adds the
/// column of earlier degrees used by the prior-degrees report family.
pub fn write_matched_detail<W: Write>(
    students: &[MatchedStudent],
    include_prior: bool,
    writer: W,
) -> Result<()> {
    let mut csv_writer = csv::WriterBuilder::new().delimiter(b';').from_writer(writer);

    let mut headers = vec![
        "Año",
        "Programa_Codigo",
        "Programa_Nombre",
        "Nombre",
        "Identificacion",
        "Es_Egresado_ULibre",
    ];
    if include_prior {
        headers.push("Programas_Previos");
    }
    csv_writer.write_record(&headers)?;

    for student in students {
        let mut record = vec![
            student.year.to_string(),
            student.program_code.clone(),
            student.program_name.clone(),
            student.student_name.clone(),
            student.cedula.clone(),
            yes_no(student.is_alumnus).to_string(),
        ];
        if include_prior {
            record.push(student.prior_degrees.join(" | "));
        }
        csv_writer.write_record(&record)?;
    }

    csv_writer.flush()?;
    Ok(())
}

/// Per-program summary for one year.
pub fn write_program_summary<W: Write>(
    rows: &[ProgramSummaryRow],
    include_non_alumni: bool,
    writer: W,
) -> Result<()> {
    let mut csv_writer = csv::WriterBuilder::new().delimiter(b';').from_writer(writer);

    let mut headers = vec![
        "Codigo_Programa",
        "Nombre_Programa",
        "Total_Estudiantes",
        "Egresados_ULibre",
    ];
    if include_non_alumni {
        headers.push("No_Egresados");
    }
    headers.push("Porcentaje");
    csv_writer.write_record(&headers)?;

    for row in rows {
        let mut record = vec![
            row.code.clone(),
            row.name.clone(),
            row.total.to_string(),
            row.alumni.to_string(),
        ];
        if include_non_alumni {
            record.push(row.non_alumni().to_string());
        }
        record.push(fmt_pct(row.pct()));
        csv_writer.write_record(&record)?;
    }

    csv_writer.flush()?;
    Ok(())
}

/// All years in one per-program table.
pub fn write_consolidated<W: Write>(
    rows: &[ProgramSummaryRow],
    include_non_alumni: bool,
    writer: W,
) -> Result<()> {
    let mut csv_writer = csv::WriterBuilder::new().delimiter(b';').from_writer(writer);

    let mut headers = vec![
        "Año",
        "Codigo_Programa",
        "Nombre_Programa",
        "Total_Estudiantes",
        "Egresados_ULibre",
    ];
    if include_non_alumni {
        headers.push("Solo_Estudiantes");
    }
    headers.push("Porcentaje");
    csv_writer.write_record(&headers)?;

    for row in rows {
        let mut record = vec![
            row.year.to_string(),
            row.code.clone(),
            row.name.clone(),
            row.total.to_string(),
            row.alumni.to_string(),
        ];
        if include_non_alumni {
            record.push(row.non_alumni().to_string());
        }
        record.push(fmt_pct(row.pct()));
        csv_writer.write_record(&record)?;
    }

    csv_writer.flush()?;
    Ok(())
}

/// Overall totals per year.
pub fn write_year_summary<W: Write>(
    rows: &[YearSummaryRow],
    include_non_alumni: bool,
    writer: W,
) -> Result<()> {
    let mut csv_writer = csv::WriterBuilder::new().delimiter(b';').from_writer(writer);

    let headers: Vec<&str> = if include_non_alumni {
        vec![
            "Año",
            "Total_Estudiantes",
            "Egresados_ULibre",
            "Solo_Estudiantes",
            "Porcentaje_Egresados",
        ]
    } else {
        vec!["Año", "Total_Estudiantes", "Egresados_ULibre", "Porcentaje"]
    };
    csv_writer.write_record(&headers)?;

    for row in rows {
        let mut record = vec![
            row.year.to_string(),
            row.total.to_string(),
            row.alumni.to_string(),
        ];
        if include_non_alumni {
            record.push(row.non_alumni().to_string());
        }
        record.push(fmt_pct(row.pct()));
        csv_writer.write_record(&record)?;
    }

    csv_writer.flush()?;
    Ok(())
}

/// Leadership positions found in the surveys, comma-separated like the
/// original export.
pub fn write_leadership_csv<W: Write>(records: &[LeadershipRecord], writer: W) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    csv_writer.write_record(["Archivo", "Nombre", "Cargo", "Programa", "Empresa"])?;
    for record in records {
        csv_writer.write_record([
            &record.file,
            &record.name,
            &record.role,
            &record.program,
            &record.company,
        ])?;
    }

    csv_writer.flush()?;
    Ok(())
}

/// Which detail columns a survey workbook carries.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SurveyDetail {
    /// Leadership rows broken down by program: job title and company.
    Leadership,
    /// All graduates: document, occupational information and job title.
    Graduates,
}

impl SurveyDetail {
    fn headers(&self) -> &'static [&'static str] {
        match self {
            SurveyDetail::Leadership => &[
                "Archivo",
                "Nombre",
                "Cargo",
                "Programa",
                "Tipo_Programa",
                "Año_Grado",
                "Fecha_Grado",
                "Empresa",
            ],
            SurveyDetail::Graduates => &[
                "Archivo",
                "Documento",
                "Nombre",
                "Programa",
                "Tipo_Programa",
                "Año_Grado",
                "Fecha_Grado",
                "Información_Ocupacional",
                "Cargo",
            ],
        }
    }

    fn values(&self, graduate: &SurveyGraduate) -> Vec<String> {
        match self {
            SurveyDetail::Leadership => vec![
                graduate.file.clone(),
                graduate.name.clone(),
                graduate.role.clone(),
                graduate.program.clone(),
                graduate.kind.label().to_string(),
                graduate.grad_year.to_string(),
                graduate.grad_date.clone(),
                graduate.company.clone(),
            ],
            SurveyDetail::Graduates => vec![
                graduate.file.clone(),
                graduate.documento.clone(),
                graduate.name.clone(),
                graduate.program.clone(),
                graduate.kind.label().to_string(),
                graduate.grad_year.to_string(),
                graduate.grad_date.clone(),
                graduate.occupation.clone(),
                graduate.role.clone(),
            ],
        }
    }
}

/// Graduation detail rows, comma-separated.
pub fn write_graduates_csv<W: Write>(
    graduates: &[SurveyGraduate],
    detail: SurveyDetail,
    writer: W,
) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    csv_writer.write_record(detail.headers())?;
    for graduate in graduates {
        csv_writer.write_record(detail.values(graduate))?;
    }

    csv_writer.flush()?;
    Ok(())
}

fn write_header_row(sheet: &mut Worksheet, headers: &[&str]) -> Result<(), XlsxError> {
    for (col, header) in headers.iter().enumerate() {
        sheet.write_string(0, col as u16, *header)?;
    }
    Ok(())
}

/// Workbook for the alumni / prior-degrees pipelines: a general summary
/// sheet, one sheet per year, and optionally the consolidated table.
pub fn xlsx_matched_workbook(
    path: &Path,
    year_rows: &[YearSummaryRow],
    per_year: &[(u16, Vec<ProgramSummaryRow>)],
    consolidated: Option<&[ProgramSummaryRow]>,
    include_non_alumni: bool,
    year_sheet_prefix: &str,
) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut workbook = Workbook::new();

    let sheet = workbook.add_worksheet();
    sheet.set_name("Resumen General")?;
    let mut headers = vec!["Año", "Total_Estudiantes", "Egresados_ULibre"];
    if include_non_alumni {
        headers.push("Solo_Estudiantes");
    }
    headers.push("Porcentaje");
    write_header_row(sheet, &headers)?;
    for (idx, row) in year_rows.iter().enumerate() {
        let r = idx as u32 + 1;
        sheet.write_number(r, 0, row.year as f64)?;
        sheet.write_number(r, 1, row.total as f64)?;
        sheet.write_number(r, 2, row.alumni as f64)?;
        let mut col = 3;
        if include_non_alumni {
            sheet.write_number(r, col, row.non_alumni() as f64)?;
            col += 1;
        }
        sheet.write_number(r, col, row.pct())?;
    }

    for (year, rows) in per_year {
        let sheet = workbook.add_worksheet();
        sheet.set_name(format!("{}{}", year_sheet_prefix, year))?;
        let mut headers = vec![
            "Codigo_Programa",
            "Nombre_Programa",
            "Total_Estudiantes",
            "Egresados_ULibre",
        ];
        if include_non_alumni {
            headers.push("Solo_Estudiantes");
        }
        headers.push("Porcentaje");
        write_header_row(sheet, &headers)?;
        for (idx, row) in rows.iter().enumerate() {
            let r = idx as u32 + 1;
            sheet.write_string(r, 0, &row.code)?;
            sheet.write_string(r, 1, &row.name)?;
            sheet.write_number(r, 2, row.total as f64)?;
            sheet.write_number(r, 3, row.alumni as f64)?;
            let mut col = 4;
            if include_non_alumni {
                sheet.write_number(r, col, row.non_alumni() as f64)?;
                col += 1;
            }
            sheet.write_number(r, col, row.pct())?;
        }
    }

    if let Some(rows) = consolidated {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Consolidado")?;
        let mut headers = vec![
            "Año",
            "Codigo_Programa",
            "Nombre_Programa",
            "Total_Estudiantes",
            "Egresados_ULibre",
        ];
        if include_non_alumni {
            headers.push("Solo_Estudiantes");
        }
        headers.push("Porcentaje");
        write_header_row(sheet, &headers)?;
        for (idx, row) in rows.iter().enumerate() {
            let r = idx as u32 + 1;
            sheet.write_number(r, 0, row.year as f64)?;
            sheet.write_string(r, 1, &row.code)?;
            sheet.write_string(r, 2, &row.name)?;
            sheet.write_number(r, 3, row.total as f64)?;
            sheet.write_number(r, 4, row.alumni as f64)?;
            let mut col = 5;
            if include_non_alumni {
                sheet.write_number(r, col, row.non_alumni() as f64)?;
                col += 1;
            }
            sheet.write_number(r, col, row.pct())?;
        }
    }

    workbook
        .save(path)
        .with_context(|| format!("Failed to save workbook: {}", path.display()))?;
    Ok(())
}

/// Single-sheet workbook with leadership rows, the XLSX twin of
/// `write_leadership_csv`.
pub fn xlsx_leadership_workbook(path: &Path, records: &[LeadershipRecord]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    write_header_row(sheet, &["Archivo", "Nombre", "Cargo", "Programa", "Empresa"])?;
    for (idx, record) in records.iter().enumerate() {
        let r = idx as u32 + 1;
        sheet.write_string(r, 0, &record.file)?;
        sheet.write_string(r, 1, &record.name)?;
        sheet.write_string(r, 2, &record.role)?;
        sheet.write_string(r, 3, &record.program)?;
        sheet.write_string(r, 4, &record.company)?;
    }

    workbook
        .save(path)
        .with_context(|| format!("Failed to save workbook: {}", path.display()))?;
    Ok(())
}

/// The 4-sheet survey workbook: full detail, per-year, per-program and
/// year-by-program summaries.
pub fn xlsx_survey_workbook(
    path: &Path,
    graduates: &[SurveyGraduate],
    stats: &SurveyStats,
    detail: SurveyDetail,
) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut workbook = Workbook::new();

    let sheet = workbook.add_worksheet();
    sheet.set_name("Datos Completos")?;
    write_sheet_rows(sheet, graduates, detail)?;

    let sheet = workbook.add_worksheet();
    sheet.set_name("Por Año")?;
    write_header_row(sheet, &["Año", "Total_Egresados", "Porcentaje"])?;
    for (idx, (year, count)) in stats.by_year.iter().enumerate() {
        let r = idx as u32 + 1;
        sheet.write_number(r, 0, *year as f64)?;
        sheet.write_number(r, 1, *count as f64)?;
        sheet.write_number(r, 2, percentage(*count, stats.total))?;
    }

    let sheet = workbook.add_worksheet();
    sheet.set_name("Por Programa")?;
    write_header_row(sheet, &["Programa", "Total_Egresados", "Porcentaje"])?;
    for (idx, (program, count)) in stats.by_program.iter().enumerate() {
        let r = idx as u32 + 1;
        sheet.write_string(r, 0, program)?;
        sheet.write_number(r, 1, *count as f64)?;
        sheet.write_number(r, 2, percentage(*count, stats.total))?;
    }

    let sheet = workbook.add_worksheet();
    sheet.set_name("Año x Programa")?;
    write_header_row(sheet, &["Año", "Programa", "Tipo_Programa", "Total_Egresados"])?;
    let mut combos = stats.by_year_program.clone();
    combos.sort_by(|a, b| b.year.cmp(&a.year).then_with(|| b.count.cmp(&a.count)));
    for (idx, combo) in combos.iter().enumerate() {
        let r = idx as u32 + 1;
        sheet.write_number(r, 0, combo.year as f64)?;
        sheet.write_string(r, 1, &combo.program)?;
        sheet.write_string(r, 2, combo.kind.label())?;
        sheet.write_number(r, 3, combo.count as f64)?;
    }

    workbook
        .save(path)
        .with_context(|| format!("Failed to save workbook: {}", path.display()))?;
    Ok(())
}

/// Single-sheet workbook of graduation detail rows, used for the per-year
/// export files.
pub fn xlsx_graduates_workbook(
    path: &Path,
    graduates: &[SurveyGraduate],
    detail: SurveyDetail,
) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    write_sheet_rows(sheet, graduates, detail)?;

    workbook
        .save(path)
        .with_context(|| format!("Failed to save workbook: {}", path.display()))?;
    Ok(())
}

fn write_sheet_rows(
    sheet: &mut Worksheet,
    graduates: &[SurveyGraduate],
    detail: SurveyDetail,
) -> Result<(), XlsxError> {
    write_header_row(sheet, detail.headers())?;
    for (idx, graduate) in graduates.iter().enumerate() {
        for (col, value) in detail.values(graduate).iter().enumerate() {
            sheet.write_string(idx as u32 + 1, col as u16, value)?;
        }
    }
    Ok(())
}

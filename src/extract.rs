use crate::loader::{HeaderTable, RawTable};
use crate::models::{CleanStudentRecord, ProgramEntry};
use chrono::{NaiveDate, NaiveDateTime};
use regex::Regex;

// Markers that disqualify a cell from being a student name
const NAME_STOPWORDS: [&str; 6] = ["Nombre", "Nivel", "Pensum", "Programa", "Periodo", "Facultad"];

// Exact first-column values of administrative rows in the raw exports
const ADMIN_LABELS: [&str; 4] = ["Pensum", "Nivel", "Nombre", ""];

/// Extract the 5-digit program code from a program line like
/// `"32101    ESPECIALIZACION EN DERECHO ADMINISTRATIVO"`.
pub fn extract_program_code(text: &str) -> Option<String> {
    let mut first_numeric = None;
    for token in text.split_whitespace() {
        if token.chars().all(|c| c.is_ascii_digit()) && !token.is_empty() {
            if token.len() == 5 {
                return Some(token.to_string());
            }
            if first_numeric.is_none() {
                first_numeric = Some(token.to_string());
            }
        }
    }
    first_numeric
}

/// Program name with the leading code and any trailing
/// `RESOLUCION ...` / pensum metadata stripped.
pub fn clean_program_name(text: &str) -> String {
    let mut name = text.trim().to_string();

    // Drop the 5-digit code at the front
    if let Some((first, rest)) = name.split_once(char::is_whitespace) {
        if first.len() == 5 && first.chars().all(|c| c.is_ascii_digit()) {
            name = rest.trim_start().to_string();
        }
    }

    // The exports append resolution metadata in mixed casings
    for variant in ["RESOLUCION", "RESOLUCIÓN", "Resolucion", "Resolución"] {
        if let Some(idx) = name.find(variant) {
            if idx > 0 {
                name.truncate(idx);
            }
            break;
        }
    }

    name.trim().to_string()
}

/// Whether a cell reads like a person name: long enough, contains letters
/// and a space, and carries none of the administrative markers.
pub fn looks_like_person_name(cell: &str) -> bool {
    cell.chars().count() > 5
        && cell.chars().any(|c| c.is_alphabetic())
        && cell.contains(' ')
        && !cell.to_uppercase().contains("UNIVERSIDAD")
        && !NAME_STOPWORDS.iter().any(|word| cell.contains(word))
}

/// Academic period codes like `20231` (year + semester digit) look like
/// short IDs but must never be classified as one.
pub fn is_period_code(token: &str) -> bool {
    if token.len() != 5 || !token.chars().all(|c| c.is_ascii_digit()) {
        return false;
    }
    let year: u16 = match token[..4].parse() {
        Ok(y) => y,
        Err(_) => return false,
    };
    let semester = token.as_bytes()[4] - b'0';
    (2000..=2099).contains(&year) && (1..=3).contains(&semester)
}

/// Numeric fields found in a student row: the cédula comes before the
/// student code in the exports, the group is a small standalone number.
#[derive(Debug, Default, PartialEq)]
pub struct NumericFields {
    pub cedula: Option<String>,
    pub student_code: Option<String>,
    pub group: Option<String>,
}

pub fn classify_numeric_tokens(row: &[String]) -> NumericFields {
    let mut fields = NumericFields::default();

    for cell in row {
        let value = cell.trim();
        if !value.chars().all(|c| c.is_ascii_digit()) || value.is_empty() {
            continue;
        }
        if is_period_code(value) {
            continue;
        }
        if (6..=12).contains(&value.len()) {
            if fields.cedula.is_none() {
                fields.cedula = Some(value.to_string());
            } else if fields.student_code.is_none() {
                fields.student_code = Some(value.to_string());
            }
        } else if (1..=3).contains(&value.len()) {
            fields.group = Some(value.to_string());
        }
    }

    fields
}

/// A cell opening a program section: starts with the 5-digit code followed
/// by the program name, or is the bare code itself. Pure long digit runs are
/// cédulas and period codes never open a section.
fn is_program_context(cell: &str) -> bool {
    let chars: Vec<char> = cell.chars().collect();
    if chars.len() < 5 || !chars[..5].iter().all(|c| c.is_ascii_digit()) {
        return false;
    }
    if chars.iter().all(|c| c.is_ascii_digit()) && chars.len() > 5 {
        return false;
    }
    !is_period_code(cell)
}

fn is_inline_program_line(cell: &str) -> bool {
    let upper = cell.to_uppercase();
    cell.chars().count() > 20
        && is_program_context(cell)
        && ["ESPECIALIZACION", "MAESTRIA", "DOCTORADO"]
            .iter()
            .any(|kw| upper.contains(kw))
        && !upper.contains("RESOLUCION")
        && !upper.contains("PENSUM")
}

/// Scan a raw postgraduate export. The files interleave faculty/program
/// section headers with student rows and administrative noise; fields have
/// no fixed column, so every cell is classified heuristically. Handles both
/// layout generations: labelled section rows (`Facultad;...` / `Programa;...`)
/// and inline program lines starting with the 5-digit code.
pub fn scan_posgrado_table(table: &RawTable, year: u16) -> Vec<CleanStudentRecord> {
    let mut facultad = String::new();
    let mut program_code = String::new();
    let mut program_name = String::new();
    let mut records = Vec::new();

    for row in &table.rows {
        let first = row.first().map(|s| s.as_str()).unwrap_or("");
        let second = row.get(1).map(|s| s.as_str()).unwrap_or("");

        // Labelled section rows
        if first == "Facultad" {
            facultad = second.to_string();
            continue;
        }
        if first == "Programa" {
            program_code = extract_program_code(second).unwrap_or_default();
            program_name = clean_program_name(second);
            continue;
        }

        // Inline program lines, code first in column 0 or 1
        if is_program_context(first) {
            program_code = extract_program_code(first).unwrap_or_default();
            program_name = clean_program_name(first);
            continue;
        }
        if is_program_context(second) {
            program_code = extract_program_code(second).unwrap_or_default();
            program_name = clean_program_name(second);
            continue;
        }

        // Program mentions buried mid-row (older exports repeat them there)
        for cell in row {
            if is_inline_program_line(cell) {
                program_code = extract_program_code(cell).unwrap_or_default();
                program_name = clean_program_name(cell);
                break;
            }
        }

        // Header echo rows
        let joined = row.join(" ");
        if joined.contains("Nombre") && joined.contains("Identificaci") {
            continue;
        }

        // Administrative noise
        if ADMIN_LABELS.contains(&first) && !row.iter().any(|c| looks_like_person_name(c)) {
            continue;
        }
        let first_upper = first.to_uppercase();
        if first.contains("Pensum")
            || first_upper.contains("RESOLUCION")
            || first_upper.contains("RESOLUCIÓN")
        {
            continue;
        }

        // Student rows: a name-looking cell plus a cédula-sized number
        let student_name = match row.iter().find(|cell| looks_like_person_name(cell)) {
            Some(name) => name.to_string(),
            None => continue,
        };
        let fields = classify_numeric_tokens(row);
        let cedula = match fields.cedula {
            Some(cedula) => cedula,
            None => continue,
        };

        records.push(CleanStudentRecord {
            year,
            facultad: facultad.clone(),
            program_code: program_code.clone(),
            program_name: program_name.clone(),
            student_name,
            cedula,
            student_code: fields.student_code.unwrap_or_default(),
            group: fields.group.unwrap_or_default(),
        });
    }

    records
}

/// Parse a `PROGRAMA(S)` cell from the survey exports. The format is
/// `PROGRAMA( SECCIONAL )( YYYY-MM-DD ) - PROGRAMA2( SECCIONAL )( YYYY-MM-DD )`;
/// the last parenthesized date of each entry is the graduation date. Only
/// entries graduating within `[first_year, last_year]` are returned.
pub fn parse_program_entries(text: &str, first_year: u16, last_year: u16) -> Vec<ProgramEntry> {
    let date_re = Regex::new(r"\(\s*(\d{4})-(\d{2})-(\d{2})\s*\)").unwrap();
    let mut entries = Vec::new();

    for part in text.split(" - ") {
        let caps = match date_re.captures_iter(part).last() {
            Some(caps) => caps,
            None => continue,
        };
        let year: u16 = match caps[1].parse() {
            Ok(y) => y,
            Err(_) => continue,
        };
        if year < first_year || year > last_year {
            continue;
        }

        let name = match part.find('(') {
            Some(idx) => part[..idx].trim(),
            None => part.trim(),
        };
        if name.is_empty() {
            continue;
        }

        entries.push(ProgramEntry {
            name: name.to_string(),
            year,
            date: format!("{}-{}-{}", &caps[1], &caps[2], &caps[3]),
        });
    }

    entries
}

/// Graduation year from the date formats the historical database mixes:
/// `DD/MM/YYYY` (year last) and `YYYY-MM-DD` (year first).
pub fn extract_grad_year(text: &str) -> Option<u16> {
    let text = text.trim();
    if text.contains('/') {
        let parts: Vec<&str> = text.split('/').collect();
        if parts.len() == 3 {
            return parts[2].trim().parse().ok();
        }
    } else if text.contains('-') {
        let parts: Vec<&str> = text.split('-').collect();
        if parts.len() == 3 {
            return parts[0].trim().parse().ok();
        }
    }
    None
}

/// Survey timestamps show up in several formats depending on the export tool.
pub fn parse_survey_date(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    if text.is_empty() || text.eq_ignore_ascii_case("nan") {
        return None;
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%d/%m/%Y %H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return Some(dt);
        }
    }
    for format in ["%Y-%m-%d", "%d/%m/%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            return date.and_hms_opt(0, 0, 0);
        }
    }
    None
}

pub fn is_leadership_role(role: &str, keywords: &[String]) -> bool {
    let lower = role.to_lowercase();
    keywords.iter().any(|keyword| lower.contains(keyword))
}

/// Column indices resolved from a survey export header.
#[derive(Debug, Default)]
pub struct SurveyColumns {
    pub program: Option<usize>,
    pub names: Option<usize>,
    pub surnames: Option<usize>,
    pub documento: Option<usize>,
    pub occupation: Option<usize>,
    pub role: Option<usize>,
    pub company: Option<usize>,
    pub survey_date: Option<usize>,
}

impl SurveyColumns {
    pub fn resolve(table: &HeaderTable) -> SurveyColumns {
        let mut cols = SurveyColumns::default();

        for (idx, header) in table.headers.iter().enumerate() {
            let upper = header.to_uppercase();
            if cols.program.is_none()
                && (upper == "PROGRAMA(S)"
                    || (upper.starts_with("PROGRAMA") && upper.contains('(') && upper.contains("S)")))
            {
                cols.program = Some(idx);
            } else if cols.names.is_none()
                && upper.contains("NOMBRES")
                && !upper.contains("APELLIDOS")
            {
                cols.names = Some(idx);
            } else if cols.surnames.is_none() && upper.contains("APELLIDOS") {
                cols.surnames = Some(idx);
            } else if cols.documento.is_none() && upper == "DOCUMENTO" {
                cols.documento = Some(idx);
            } else if cols.occupation.is_none()
                && upper.contains("INFORMACI")
                && upper.contains("OCUPACIONAL")
                && !upper.contains('(')
            {
                cols.occupation = Some(idx);
            } else if cols.survey_date.is_none()
                && upper.contains("FECHA")
                && upper.contains("ENCUESTA")
            {
                cols.survey_date = Some(idx);
            } else if cols.company.is_none() && header.to_lowercase().contains("empresa") {
                cols.company = Some(idx);
            }
        }

        // "desempe" instead of "desempeña": the ñ arrives mangled in some
        // exports, the prefix matches every variant
        for variant in [&["cargo", "desempe"][..], &["cargo"][..]] {
            if cols.role.is_some() {
                break;
            }
            cols.role = table.find_column(|header| {
                let lower = header.to_lowercase();
                variant.iter().all(|part| lower.contains(part))
            });
        }

        cols
    }
}

/// Locate the ID column of the historical alumni database.
pub fn find_id_column(table: &HeaderTable) -> Option<usize> {
    table.find_column(|header| {
        let upper = header.to_uppercase();
        upper.contains("IDENTIFICACI") || upper.contains("CEDULA") || upper.contains("DOCUMENTO")
    })
}

/// Locate the degree-title column of the historical alumni database.
pub fn find_title_column(table: &HeaderTable) -> Option<usize> {
    table.find_column(|header| {
        let upper = header.to_uppercase();
        upper.contains("TITULO") || upper.contains("PROGRAMA") || upper.contains("CARRERA")
    })
}

/// Locate the graduation-date column of the historical alumni database.
pub fn find_grad_date_column(table: &HeaderTable) -> Option<usize> {
    table.find_column(|header| {
        let upper = header.to_uppercase();
        upper.contains("FECHA") && upper.contains("GRADO")
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::parse_table;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_extract_program_code() {
        assert_eq!(
            extract_program_code("32101    ESPECIALIZACION EN DERECHO ADMINISTRATIVO"),
            Some("32101".to_string())
        );
        assert_eq!(extract_program_code("SIN CODIGO"), None);
        assert_eq!(extract_program_code(""), None);
    }

    #[test]
    fn test_clean_program_name_strips_code_and_resolution() {
        assert_eq!(
            clean_program_name("32101 ESPECIALIZACION EN DERECHO ADMINISTRATIVO RESOLUCION 1234 DE 2019"),
            "ESPECIALIZACION EN DERECHO ADMINISTRATIVO"
        );
        assert_eq!(
            clean_program_name("MAESTRIA EN EDUCACION Resolución 99"),
            "MAESTRIA EN EDUCACION"
        );
        assert_eq!(clean_program_name("DOCTORADO EN DERECHO"), "DOCTORADO EN DERECHO");
    }

    #[test]
    fn test_looks_like_person_name() {
        assert!(looks_like_person_name("MARIA CAMILA LOPEZ"));
        assert!(!looks_like_person_name("UNIVERSIDAD LIBRE"));
        assert!(!looks_like_person_name("Nombre Estudiante"));
        assert!(!looks_like_person_name("ANA")); // too short
        assert!(!looks_like_person_name("1234567890")); // no letters
    }

    #[test]
    fn test_is_period_code() {
        assert!(is_period_code("20211"));
        assert!(is_period_code("20252"));
        assert!(!is_period_code("32101")); // program code, year 3210 out of range
        assert!(!is_period_code("20219")); // no ninth semester
        assert!(!is_period_code("1088245123"));
    }

    #[test]
    fn test_classify_numeric_tokens() {
        let fields = classify_numeric_tokens(&row(&[
            "",
            "MARIA LOPEZ",
            "1088245123",
            "20231",
            "160123456",
            "2",
        ]));
        assert_eq!(fields.cedula, Some("1088245123".to_string()));
        assert_eq!(fields.student_code, Some("160123456".to_string()));
        assert_eq!(fields.group, Some("2".to_string()));
    }

    #[test]
    fn test_scan_labelled_layout() {
        let text = "\
Facultad;DERECHO\n\
Programa;32101 ESPECIALIZACION EN DERECHO ADMINISTRATIVO RESOLUCION 1234\n\
Pensum;2019\n\
Nombre;Identificación;Código;Grupo\n\
GOMEZ PEREZ JUAN PABLO;1088245123;160123456;1\n\
RIOS CASTAÑO LAURA;42089377;160123457;1\n";
        let records = scan_posgrado_table(&parse_table(text, b';'), 2023);

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].facultad, "DERECHO");
        assert_eq!(records[0].program_code, "32101");
        assert_eq!(records[0].program_name, "ESPECIALIZACION EN DERECHO ADMINISTRATIVO");
        assert_eq!(records[0].student_name, "GOMEZ PEREZ JUAN PABLO");
        assert_eq!(records[0].cedula, "1088245123");
        assert_eq!(records[1].cedula, "42089377");
        assert_eq!(records[1].year, 2023);
    }

    #[test]
    fn test_scan_inline_layout() {
        let text = "\
;34205 MAESTRIA EN EDUCACION CON ENFASIS EN DOCENCIA;;\n\
;PEREZ SALAZAR ANDRES FELIPE;;;1088300400;;160200300;2\n";
        let records = scan_posgrado_table(&parse_table(text, b';'), 2022);

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].program_code, "34205");
        assert_eq!(records[0].student_name, "PEREZ SALAZAR ANDRES FELIPE");
        assert_eq!(records[0].cedula, "1088300400");
        assert_eq!(records[0].group, "2");
    }

    #[test]
    fn test_scan_skips_period_codes_as_ids() {
        let text = ";LOPEZ RUA CARLOS;;20231;1088111222;\n";
        let records = scan_posgrado_table(&parse_table(text, b';'), 2023);
        assert_eq!(records[0].cedula, "1088111222");
    }

    #[test]
    fn test_parse_program_entries() {
        let entries = parse_program_entries(
            "DERECHO( PEREIRA )( 2022-03-18 ) - ESPECIALIZACION EN DERECHO PENAL( PEREIRA )( 2024-09-06 )",
            2021,
            2025,
        );
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].name, "DERECHO");
        assert_eq!(entries[0].year, 2022);
        assert_eq!(entries[0].date, "2022-03-18");
        assert_eq!(entries[1].name, "ESPECIALIZACION EN DERECHO PENAL");
        assert_eq!(entries[1].year, 2024);
    }

    #[test]
    fn test_parse_program_entries_takes_last_date_and_filters_years() {
        // seccional parens before the date, old graduation filtered out
        let entries = parse_program_entries(
            "CONTADURIA( PEREIRA )( 2012-09-14 ) - DERECHO( PEREIRA )( 2023-06-02 )",
            2021,
            2025,
        );
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "DERECHO");
        assert_eq!(entries[0].year, 2023);
    }

    #[test]
    fn test_extract_grad_year() {
        assert_eq!(extract_grad_year("14/11/2025"), Some(2025));
        assert_eq!(extract_grad_year("1998-06-30"), Some(1998));
        assert_eq!(extract_grad_year("sin fecha"), None);
        assert_eq!(extract_grad_year(""), None);
    }

    #[test]
    fn test_parse_survey_date() {
        assert!(parse_survey_date("2023-05-10 14:32:00").is_some());
        assert!(parse_survey_date("10/05/2023").is_some());
        assert!(parse_survey_date("nan").is_none());
        assert!(parse_survey_date("").is_none());

        let newer = parse_survey_date("2024-01-01").unwrap();
        let older = parse_survey_date("2023-12-31").unwrap();
        assert!(newer > older);
    }

    #[test]
    fn test_is_leadership_role() {
        let keywords = vec!["gerente".to_string(), "director".to_string()];
        assert!(is_leadership_role("Gerente General", &keywords));
        assert!(is_leadership_role("SUBDIRECTORA JURIDICA", &keywords));
        assert!(!is_leadership_role("Analista de datos", &keywords));
    }

    #[test]
    fn test_survey_columns_resolve() {
        let table = HeaderTable {
            headers: row(&[
                "No",
                "DOCUMENTO",
                "NOMBRES",
                "APELLIDOS",
                "PROGRAMA(S)",
                "INFORMACIÓN OCUPACIONAL",
                "INFORMACIÓN OCUPACIONAL (Actividad(es))",
                "CARGO QUE DESEMPEÑA",
                "Nombre de la empresa",
                "FECHA ENCUESTA",
            ]),
            rows: vec![],
        };
        let cols = SurveyColumns::resolve(&table);
        assert_eq!(cols.documento, Some(1));
        assert_eq!(cols.names, Some(2));
        assert_eq!(cols.surnames, Some(3));
        assert_eq!(cols.program, Some(4));
        assert_eq!(cols.occupation, Some(5)); // the parenthesized twin is skipped
        assert_eq!(cols.role, Some(7));
        assert_eq!(cols.company, Some(8));
        assert_eq!(cols.survey_date, Some(9));
    }

    #[test]
    fn test_survey_columns_role_fallback_without_desempe() {
        let table = HeaderTable {
            headers: row(&["DOCUMENTO", "NOMBRES", "Cargo actual"]),
            rows: vec![],
        };
        let cols = SurveyColumns::resolve(&table);
        assert_eq!(cols.role, Some(2));
    }

    #[test]
    fn test_alumni_database_columns() {
        let table = HeaderTable {
            headers: row(&[
                "IDENTIFICACIÓN",
                "NOMBRE COMPLETO",
                "TITULO OBTENIDO",
                "FECHA DE GRADO",
            ]),
            rows: vec![],
        };
        assert_eq!(find_id_column(&table), Some(0));
        assert_eq!(find_title_column(&table), Some(2));
        assert_eq!(find_grad_date_column(&table), Some(3));
    }
}

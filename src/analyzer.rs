use crate::extract::{extract_grad_year, find_grad_date_column, find_id_column, find_title_column};
use crate::loader::HeaderTable;
use crate::models::{
    normalize_cedula, AlumniDegree, CleanStudentRecord, LeadershipRecord, MatchedStudent,
    ProgramKind, SurveyGraduate,
};
use anyhow::{Context, Result};
use std::collections::{BTreeMap, HashMap, HashSet};

/// The historical alumni database indexed by normalized cédula. Holds the
/// plain membership set plus, when the export carries them, the degrees of
/// each alumnus with their graduation year.
pub struct AlumniIndex {
    cedulas: HashSet<String>,
    degrees: HashMap<String, Vec<AlumniDegree>>,
}

impl AlumniIndex {
    pub fn from_table(table: &HeaderTable) -> Result<AlumniIndex> {
        let id_col =
            find_id_column(table).context("No identification column found in the alumni database")?;
        let title_col = find_title_column(table);
        let date_col = find_grad_date_column(table);

        let mut cedulas = HashSet::new();
        let mut degrees: HashMap<String, Vec<AlumniDegree>> = HashMap::new();

        for row in &table.rows {
            let cedula = table.value(row, Some(id_col)).trim();
            if cedula.is_empty() || cedula.eq_ignore_ascii_case("nan") {
                continue;
            }
            let key = normalize_cedula(cedula);
            cedulas.insert(key.clone());

            if let Some(title_col) = title_col {
                let title = table.value(row, Some(title_col)).trim().to_uppercase();
                if title.is_empty() || title == "NAN" {
                    continue;
                }
                let grad_year = date_col.and_then(|col| extract_grad_year(table.value(row, Some(col))));
                let degree = AlumniDegree { title, grad_year };
                let list = degrees.entry(key).or_default();
                if !list.contains(&degree) {
                    list.push(degree);
                }
            }
        }

        Ok(AlumniIndex { cedulas, degrees })
    }

    pub fn len(&self) -> usize {
        self.cedulas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cedulas.is_empty()
    }

    pub fn contains(&self, cedula: &str) -> bool {
        self.cedulas.contains(&normalize_cedula(cedula))
    }

    pub fn degree_count(&self) -> usize {
        self.degrees.values().map(|list| list.len()).sum()
    }

    pub fn multi_degree_count(&self) -> usize {
        self.degrees.values().filter(|list| list.len() > 1).count()
    }

    /// Degrees from a *different* program granted strictly before the
    /// enrollment year, formatted as `TITULO (year)`. Same-type degrees with
    /// overlapping names count as the same program; degrees without a
    /// parseable year are excluded, they could postdate the enrollment.
    pub fn prior_degrees(
        &self,
        cedula: &str,
        enrollment_year: u16,
        program_code: &str,
        program_name: &str,
    ) -> Vec<String> {
        let degrees = match self.degrees.get(&normalize_cedula(cedula)) {
            Some(degrees) => degrees,
            None => return Vec::new(),
        };

        let kind = ProgramKind::classify(program_name, program_code);
        let current_upper = program_name.to_uppercase();
        let mut prior = Vec::new();

        for degree in degrees {
            let mut same_program = false;
            if kind != ProgramKind::Pregrado && kind_matches(&degree.title, kind) {
                let title_base = strip_kind_words(&degree.title, kind);
                let current_base = strip_kind_words(&current_upper, kind);
                if title_base.contains(&current_base) || current_base.contains(&title_base) {
                    same_program = true;
                }
            }

            if same_program {
                continue;
            }
            if let Some(year) = degree.grad_year {
                if year < enrollment_year {
                    prior.push(format!("{} ({})", degree.title, year));
                }
            }
        }

        prior
    }
}

fn kind_words(kind: ProgramKind) -> &'static [&'static str] {
    match kind {
        ProgramKind::Especializacion => &["ESPECIALIZACIÓN", "ESPECIALIZACION"],
        ProgramKind::Maestria => &["MAESTRÍA", "MAESTRIA"],
        ProgramKind::Doctorado => &["DOCTORADO"],
        ProgramKind::Pregrado => &[],
    }
}

fn kind_matches(title: &str, kind: ProgramKind) -> bool {
    kind_words(kind).iter().any(|word| title.contains(word))
}

fn strip_kind_words(text: &str, kind: ProgramKind) -> String {
    let mut stripped = text.to_string();
    for word in kind_words(kind) {
        stripped = stripped.replace(word, "");
    }
    stripped.replace("EN", "").trim().to_string()
}

/// Drop repeated (cédula, program) rows, keeping the first occurrence. The
/// raw exports repeat students across group listings within a program.
pub fn dedup_by_cedula_program(records: Vec<CleanStudentRecord>) -> Vec<CleanStudentRecord> {
    let mut seen = HashSet::new();
    records
        .into_iter()
        .filter(|record| {
            seen.insert((
                normalize_cedula(&record.cedula),
                record.program_code.clone(),
                record.program_name.clone(),
            ))
        })
        .collect()
}

pub fn percentage(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        (part as f64 / total as f64 * 100.0 * 100.0).round() / 100.0
    }
}

/// One row of the per-program summary reports.
#[derive(Debug, Clone)]
pub struct ProgramSummaryRow {
    pub year: u16,
    pub code: String,
    pub name: String,
    pub total: usize,
    pub alumni: usize,
}

impl ProgramSummaryRow {
    pub fn non_alumni(&self) -> usize {
        self.total - self.alumni
    }

    pub fn pct(&self) -> f64 {
        percentage(self.alumni, self.total)
    }
}

#[derive(Debug, Clone)]
pub struct YearSummaryRow {
    pub year: u16,
    pub total: usize,
    pub alumni: usize,
}

impl YearSummaryRow {
    pub fn non_alumni(&self) -> usize {
        self.total - self.alumni
    }

    pub fn pct(&self) -> f64 {
        percentage(self.alumni, self.total)
    }
}

/// Group matched students by year and program code, ordered by year then
/// code. Grouping is by code only: the same program shows up with differing
/// resolution suffixes across files, the first cleaned name wins.
pub fn summarize_by_program(students: &[MatchedStudent]) -> Vec<ProgramSummaryRow> {
    let mut groups: BTreeMap<(u16, String), ProgramSummaryRow> = BTreeMap::new();

    for student in students {
        let row = groups
            .entry((student.year, student.program_code.clone()))
            .or_insert_with(|| ProgramSummaryRow {
                year: student.year,
                code: student.program_code.clone(),
                name: student.program_name.clone(),
                total: 0,
                alumni: 0,
            });
        row.total += 1;
        if student.is_alumnus {
            row.alumni += 1;
        }
    }

    groups.into_values().collect()
}

pub fn summarize_by_year(students: &[MatchedStudent]) -> Vec<YearSummaryRow> {
    let mut groups: BTreeMap<u16, YearSummaryRow> = BTreeMap::new();

    for student in students {
        let row = groups.entry(student.year).or_insert_with(|| YearSummaryRow {
            year: student.year,
            total: 0,
            alumni: 0,
        });
        row.total += 1;
        if student.is_alumnus {
            row.alumni += 1;
        }
    }

    groups.into_values().collect()
}

/// Keep one record per (name, program, graduation year). Survey snapshots
/// repeat respondents; the record with the most recent survey date wins,
/// a dated record beats an undated one.
pub fn dedup_graduates_keep_latest(graduates: Vec<SurveyGraduate>) -> Vec<SurveyGraduate> {
    let mut unique: HashMap<(String, String, u16), SurveyGraduate> = HashMap::new();

    for graduate in graduates {
        let key = (
            graduate.name.clone(),
            graduate.program.clone(),
            graduate.grad_year,
        );
        match unique.get(&key) {
            None => {
                unique.insert(key, graduate);
            }
            Some(existing) => {
                let newer = match (graduate.survey_date, existing.survey_date) {
                    (Some(new), Some(old)) => new > old,
                    (Some(_), None) => true,
                    _ => false,
                };
                if newer {
                    unique.insert(key, graduate);
                }
            }
        }
    }

    let mut result: Vec<SurveyGraduate> = unique.into_values().collect();
    result.sort_by(|a, b| {
        a.grad_year
            .cmp(&b.grad_year)
            .then_with(|| a.program.cmp(&b.program))
            .then_with(|| a.name.cmp(&b.name))
    });
    result
}

/// Keep the first record per (name, program, graduation year), preserving
/// input order.
pub fn dedup_graduates_first(graduates: Vec<SurveyGraduate>) -> Vec<SurveyGraduate> {
    let mut seen = HashSet::new();
    graduates
        .into_iter()
        .filter(|graduate| {
            seen.insert((
                graduate.name.clone(),
                graduate.program.clone(),
                graduate.grad_year,
            ))
        })
        .collect()
}

#[derive(Debug, Clone)]
pub struct YearProgramCount {
    pub year: u16,
    pub program: String,
    pub kind: ProgramKind,
    pub count: usize,
}

/// Aggregate counts over graduation records: per year (every configured
/// year present, zeros included), per program (most popular first) and per
/// year-program combination.
pub struct SurveyStats {
    pub total: usize,
    pub by_year: BTreeMap<u16, usize>,
    pub by_program: Vec<(String, usize)>,
    pub by_year_program: Vec<YearProgramCount>,
}

pub fn survey_stats(
    graduates: &[SurveyGraduate],
    years: std::ops::RangeInclusive<u16>,
) -> SurveyStats {
    let mut by_year: BTreeMap<u16, usize> = years.map(|year| (year, 0)).collect();
    let mut by_program: HashMap<String, usize> = HashMap::new();
    let mut combos: HashMap<(u16, String), YearProgramCount> = HashMap::new();

    for graduate in graduates {
        if let Some(count) = by_year.get_mut(&graduate.grad_year) {
            *count += 1;
        }
        *by_program.entry(graduate.program.clone()).or_insert(0) += 1;
        combos
            .entry((graduate.grad_year, graduate.program.clone()))
            .or_insert_with(|| YearProgramCount {
                year: graduate.grad_year,
                program: graduate.program.clone(),
                kind: graduate.kind,
                count: 0,
            })
            .count += 1;
    }

    let mut by_program: Vec<(String, usize)> = by_program.into_iter().collect();
    by_program.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    let mut by_year_program: Vec<YearProgramCount> = combos.into_values().collect();
    by_year_program.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| b.year.cmp(&a.year))
            .then_with(|| a.program.cmp(&b.program))
    });

    SurveyStats {
        total: graduates.len(),
        by_year,
        by_program,
        by_year_program,
    }
}

/// How many leadership records match each keyword, most frequent first.
/// A record counts towards every keyword its title contains.
pub fn leadership_distribution(
    records: &[LeadershipRecord],
    keywords: &[String],
) -> Vec<(String, usize)> {
    let mut counts: HashMap<String, usize> = HashMap::new();

    for record in records {
        let lower = record.role.to_lowercase();
        for keyword in keywords {
            if lower.contains(keyword) {
                *counts.entry(capitalize(keyword)).or_insert(0) += 1;
            }
        }
    }

    let mut counts: Vec<(String, usize)> = counts.into_iter().collect();
    counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    counts
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::parse_survey_date;
    use crate::loader::HeaderTable;

    fn alumni_table() -> HeaderTable {
        let headers = ["IDENTIFICACIÓN", "TITULO", "FECHA DE GRADO"];
        let rows = [
            ["1088245123", "DERECHO", "14/03/2008"],
            ["1088245123", "ESPECIALIZACION EN DERECHO PENAL", "2015-09-18"],
            ["42089377", "CONTADURIA PUBLICA", "10/12/2019"],
            ["", "DERECHO", "01/01/2000"],
            ["nan", "DERECHO", "01/01/2000"],
            ["77000111", "MEDICINA", "sin fecha"],
        ];
        HeaderTable {
            headers: headers.iter().map(|s| s.to_string()).collect(),
            rows: rows
                .iter()
                .map(|r| r.iter().map(|s| s.to_string()).collect())
                .collect(),
        }
    }

    fn student(year: u16, code: &str, cedula: &str, alumnus: bool) -> MatchedStudent {
        MatchedStudent {
            year,
            program_code: code.to_string(),
            program_name: format!("PROGRAMA {}", code),
            student_name: "ESTUDIANTE PRUEBA".to_string(),
            cedula: cedula.to_string(),
            is_alumnus: alumnus,
            prior_degrees: Vec::new(),
        }
    }

    fn graduate(name: &str, program: &str, year: u16, survey_date: Option<&str>) -> SurveyGraduate {
        SurveyGraduate {
            file: "encuesta.csv".to_string(),
            documento: String::new(),
            name: name.to_string(),
            role: String::new(),
            company: String::new(),
            occupation: String::new(),
            program: program.to_string(),
            kind: ProgramKind::classify(program, ""),
            grad_year: year,
            grad_date: format!("{}-06-01", year),
            survey_date: survey_date.and_then(parse_survey_date),
        }
    }

    #[test]
    fn test_index_membership_and_counts() {
        let index = AlumniIndex::from_table(&alumni_table()).unwrap();
        assert_eq!(index.len(), 3);
        assert!(index.contains("1088245123"));
        assert!(index.contains(" 1.088.245.123 ")); // formatting noise
        assert!(!index.contains("99999999"));
        assert_eq!(index.multi_degree_count(), 1);
    }

    #[test]
    fn test_index_rejects_table_without_id_column() {
        let table = HeaderTable {
            headers: vec!["NOMBRE".to_string(), "TITULO".to_string()],
            rows: vec![],
        };
        assert!(AlumniIndex::from_table(&table).is_err());
    }

    #[test]
    fn test_prior_degrees_different_program_earlier_year() {
        let index = AlumniIndex::from_table(&alumni_table()).unwrap();
        // Enrolled in a maestría in 2021: both degrees are different programs
        // and both predate the enrollment.
        let prior = index.prior_degrees("1088245123", 2021, "34205", "MAESTRIA EN EDUCACION");
        assert_eq!(
            prior,
            vec![
                "DERECHO (2008)".to_string(),
                "ESPECIALIZACION EN DERECHO PENAL (2015)".to_string(),
            ]
        );
    }

    #[test]
    fn test_prior_degrees_excludes_same_program() {
        let index = AlumniIndex::from_table(&alumni_table()).unwrap();
        // Enrolled in the same especialización they already hold.
        let prior = index.prior_degrees(
            "1088245123",
            2021,
            "32101",
            "ESPECIALIZACION EN DERECHO PENAL",
        );
        assert_eq!(prior, vec!["DERECHO (2008)".to_string()]);
    }

    #[test]
    fn test_prior_degrees_excludes_later_and_undated() {
        let index = AlumniIndex::from_table(&alumni_table()).unwrap();
        // Degree from 2015 does not predate a 2014 enrollment; undated
        // degrees never count.
        assert!(index
            .prior_degrees("1088245123", 2008, "34205", "MAESTRIA EN EDUCACION")
            .is_empty());
        assert!(index
            .prior_degrees("77000111", 2025, "34205", "MAESTRIA EN EDUCACION")
            .is_empty());
    }

    #[test]
    fn test_dedup_by_cedula_program() {
        let record = |cedula: &str, code: &str| CleanStudentRecord {
            year: 2023,
            facultad: String::new(),
            program_code: code.to_string(),
            program_name: String::new(),
            student_name: "ALGUIEN APELLIDO".to_string(),
            cedula: cedula.to_string(),
            student_code: String::new(),
            group: String::new(),
        };
        let records = vec![
            record("1088245123", "32101"),
            record("1088245123", "32101"),
            record("1088245123", "34205"),
        ];
        let deduped = dedup_by_cedula_program(records);
        assert_eq!(deduped.len(), 2);
    }

    #[test]
    fn test_summaries() {
        let students = vec![
            student(2021, "32101", "1", true),
            student(2021, "32101", "2", false),
            student(2021, "34205", "3", true),
            student(2022, "32101", "4", false),
        ];

        let by_program = summarize_by_program(&students);
        assert_eq!(by_program.len(), 3);
        assert_eq!(by_program[0].year, 2021);
        assert_eq!(by_program[0].code, "32101");
        assert_eq!(by_program[0].total, 2);
        assert_eq!(by_program[0].alumni, 1);
        assert_eq!(by_program[0].pct(), 50.0);
        assert_eq!(by_program[2].year, 2022);

        let by_year = summarize_by_year(&students);
        assert_eq!(by_year.len(), 2);
        assert_eq!(by_year[0].total, 3);
        assert_eq!(by_year[0].alumni, 2);
        assert_eq!(by_year[1].non_alumni(), 1);
    }

    #[test]
    fn test_percentage_rounding() {
        assert_eq!(percentage(1, 3), 33.33);
        assert_eq!(percentage(2, 3), 66.67);
        assert_eq!(percentage(0, 0), 0.0);
        assert_eq!(percentage(5, 5), 100.0);
    }

    #[test]
    fn test_dedup_graduates_keep_latest() {
        let graduates = vec![
            graduate("ANA RUIZ", "DERECHO", 2022, Some("2023-01-10")),
            graduate("ANA RUIZ", "DERECHO", 2022, Some("2024-05-01")),
            graduate("ANA RUIZ", "DERECHO", 2022, None),
            graduate("JOSE MARIN", "DERECHO", 2022, None),
        ];
        let deduped = dedup_graduates_keep_latest(graduates);
        assert_eq!(deduped.len(), 2);
        let ana = deduped.iter().find(|g| g.name == "ANA RUIZ").unwrap();
        assert_eq!(ana.survey_date, parse_survey_date("2024-05-01"));
    }

    #[test]
    fn test_survey_stats_includes_empty_years() {
        let graduates = vec![
            graduate("ANA RUIZ", "DERECHO", 2022, None),
            graduate("JOSE MARIN", "DERECHO", 2022, None),
            graduate("LUZ SOTO", "MAESTRIA EN EDUCACION", 2024, None),
        ];
        let stats = survey_stats(&graduates, 2021..=2025);

        assert_eq!(stats.total, 3);
        assert_eq!(stats.by_year[&2021], 0);
        assert_eq!(stats.by_year[&2022], 2);
        assert_eq!(stats.by_year[&2024], 1);
        assert_eq!(stats.by_program[0], ("DERECHO".to_string(), 2));
        assert_eq!(stats.by_year_program[0].count, 2);
        assert_eq!(stats.by_year_program[0].kind, ProgramKind::Pregrado);
    }

    #[test]
    fn test_leadership_distribution() {
        let keywords = vec!["gerente".to_string(), "director".to_string()];
        let record = |role: &str| LeadershipRecord {
            file: String::new(),
            name: String::new(),
            role: role.to_string(),
            program: String::new(),
            company: String::new(),
        };
        let records = vec![
            record("Gerente General"),
            record("Gerente de Proyectos"),
            record("Directora Administrativa"),
        ];
        let counts = leadership_distribution(&records, &keywords);
        assert_eq!(counts[0], ("Gerente".to_string(), 2));
        assert_eq!(counts[1], ("Director".to_string(), 1));
    }
}

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    // Input locations
    pub data_dir: String,
    pub clean_dir: String,
    pub survey_dir: String,
    pub alumni_database: String,
    pub survey_files: Vec<String>,
    // Output location
    pub output_dir: String,
    // Graduation years covered by the exports
    pub first_year: u16,
    pub last_year: u16,
    // Keywords that mark a job title as a leadership position
    pub leadership_keywords: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: "data/posgrados".to_string(),
            clean_dir: "data/posgrados_limpios".to_string(),
            survey_dir: "data/encuestas".to_string(),
            alumni_database:
                "data/posgrados/BDD. 1974 ACTUALIZADA CON GRADOS DEL 14 DE NOVIEMBRE 2025 (1).csv"
                    .to_string(),
            survey_files: vec![
                "2021-2025(M0).csv".to_string(),
                "2021-2025(VE).csv".to_string(),
            ],
            output_dir: "output".to_string(),
            first_year: 2021,
            last_year: 2025,
            leadership_keywords: vec![
                "gerente".to_string(),
                "director".to_string(),
                "jefe".to_string(),
                "coordinador".to_string(),
                "supervisor".to_string(),
                "presidente".to_string(),
                "vicepresidente".to_string(),
                "subdirector".to_string(),
                "subgerente".to_string(),
                "juez".to_string(),
                "rector".to_string(),
                "juridico".to_string(),
                "lider".to_string(),
                "administrador".to_string(),
                "ejecutivo".to_string(),
                "manager".to_string(),
                "chief".to_string(),
            ],
        }
    }
}

impl Config {
    pub fn load_from_file(file_path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(file_path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save_to_file(&self, file_path: &str) -> anyhow::Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(file_path, content)?;
        Ok(())
    }

    pub fn years(&self) -> std::ops::RangeInclusive<u16> {
        self.first_year..=self.last_year
    }

    /// Raw export for one enrollment year, e.g. `data/posgrados/2023-Posgrados.csv`.
    pub fn posgrado_file(&self, year: u16) -> PathBuf {
        PathBuf::from(&self.data_dir).join(format!("{}-Posgrados.csv", year))
    }

    /// Cleaned export for one enrollment year, produced by the `clean` command.
    pub fn clean_file(&self, year: u16) -> PathBuf {
        PathBuf::from(&self.clean_dir).join(format!("{}-Posgrados-limpio.csv", year))
    }

    pub fn survey_file(&self, name: &str) -> PathBuf {
        PathBuf::from(&self.survey_dir).join(name)
    }
}

/// One student row extracted from a raw postgraduate export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleanStudentRecord {
    pub year: u16,
    pub facultad: String,
    pub program_code: String,
    pub program_name: String,
    pub student_name: String,
    pub cedula: String,
    pub student_code: String,
    pub group: String,
}

/// A postgraduate student checked against the historical alumni database.
#[derive(Debug, Clone)]
pub struct MatchedStudent {
    pub year: u16,
    pub program_code: String,
    pub program_name: String,
    pub student_name: String,
    pub cedula: String,
    pub is_alumnus: bool,
    /// Earlier degrees from other programs, formatted as `TITULO (year)`.
    pub prior_degrees: Vec<String>,
}

/// One degree held by an alumnus in the historical database.
#[derive(Debug, Clone, PartialEq)]
pub struct AlumniDegree {
    pub title: String,
    pub grad_year: Option<u16>,
}

/// A survey respondent classified as holding a leadership position.
#[derive(Debug, Clone)]
pub struct LeadershipRecord {
    pub file: String,
    pub name: String,
    pub role: String,
    pub program: String,
    pub company: String,
}

/// One graduation event reconstructed from a survey row. The same struct
/// backs both the leadership-by-program and the all-graduates pipelines;
/// fields the source file does not carry stay empty.
#[derive(Debug, Clone)]
pub struct SurveyGraduate {
    pub file: String,
    pub documento: String,
    pub name: String,
    pub role: String,
    pub company: String,
    pub occupation: String,
    pub program: String,
    pub kind: ProgramKind,
    pub grad_year: u16,
    pub grad_date: String,
    pub survey_date: Option<chrono::NaiveDateTime>,
}

/// One program mention parsed out of a `PROGRAMA(S)` cell.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgramEntry {
    pub name: String,
    pub year: u16,
    pub date: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProgramKind {
    Pregrado,
    Especializacion,
    Maestria,
    Doctorado,
}

impl ProgramKind {
    /// Classify a program by its name, falling back to the code prefix used
    /// in the enrollment exports (32xxx especializaciones, 34xxx maestrías).
    pub fn classify(name: &str, code: &str) -> ProgramKind {
        let upper = name.to_uppercase();
        if upper.contains("ESPECIALIZACIÓN") || upper.contains("ESPECIALIZACION") {
            ProgramKind::Especializacion
        } else if upper.contains("MAESTRÍA") || upper.contains("MAESTRIA") {
            ProgramKind::Maestria
        } else if upper.contains("DOCTORADO") {
            ProgramKind::Doctorado
        } else if code.starts_with("32") {
            ProgramKind::Especializacion
        } else if code.starts_with("34") {
            ProgramKind::Maestria
        } else {
            ProgramKind::Pregrado
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ProgramKind::Pregrado => "PREGRADO",
            ProgramKind::Especializacion => "ESPECIALIZACIÓN",
            ProgramKind::Maestria => "MAESTRÍA",
            ProgramKind::Doctorado => "DOCTORADO",
        }
    }
}

/// Normalize a cédula by keeping only alphanumeric characters
pub fn normalize_cedula(cedula: &str) -> String {
    cedula
        .chars()
        .filter(|c| c.is_alphanumeric())
        .collect::<String>()
        .to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_cedula() {
        assert_eq!(normalize_cedula(" 1.088.245-123 "), "1088245123");
        assert_eq!(normalize_cedula("42089377"), "42089377");
        assert_eq!(normalize_cedula(""), "");
    }

    #[test]
    fn test_program_kind_by_name() {
        assert_eq!(
            ProgramKind::classify("ESPECIALIZACION EN DERECHO ADMINISTRATIVO", ""),
            ProgramKind::Especializacion
        );
        assert_eq!(
            ProgramKind::classify("Maestría en Educación", ""),
            ProgramKind::Maestria
        );
        assert_eq!(
            ProgramKind::classify("DOCTORADO EN DERECHO", ""),
            ProgramKind::Doctorado
        );
        assert_eq!(ProgramKind::classify("DERECHO", ""), ProgramKind::Pregrado);
    }

    #[test]
    fn test_program_kind_by_code_prefix() {
        assert_eq!(
            ProgramKind::classify("DERECHO PENAL", "32101"),
            ProgramKind::Especializacion
        );
        assert_eq!(
            ProgramKind::classify("EDUCACION", "34205"),
            ProgramKind::Maestria
        );
        assert_eq!(
            ProgramKind::classify("DERECHO", "11001"),
            ProgramKind::Pregrado
        );
    }

    #[test]
    fn test_config_roundtrip() {
        let config = Config::default();
        let text = toml::to_string_pretty(&config).unwrap();
        let back: Config = toml::from_str(&text).unwrap();
        assert_eq!(back.first_year, 2021);
        assert_eq!(back.last_year, 2025);
        assert_eq!(back.survey_files.len(), 2);
        assert!(back.leadership_keywords.contains(&"gerente".to_string()));
    }
}

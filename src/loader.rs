use anyhow::{Context, Result};
use std::path::Path;

/// A CSV file loaded as plain rows of trimmed cells, no schema assumed.
/// The raw exports mix section headers, administrative lines and data rows,
/// so every consumer scans the rows with its own heuristics.
#[derive(Debug, Clone)]
pub struct RawTable {
    pub rows: Vec<Vec<String>>,
}

/// A CSV file with a located header row: `headers` is the first row at or
/// after the detected header line, `rows` is everything below it.
#[derive(Debug, Clone)]
pub struct HeaderTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl HeaderTable {
    /// Index of the first column whose header matches the predicate.
    pub fn find_column<F: Fn(&str) -> bool>(&self, pred: F) -> Option<usize> {
        self.headers.iter().position(|h| pred(h))
    }

    /// Cell value by optional column index, empty when missing.
    pub fn value<'a>(&self, row: &'a [String], idx: Option<usize>) -> &'a str {
        idx.and_then(|i| row.get(i)).map(|s| s.as_str()).unwrap_or("")
    }
}

/// Read a file and decode it to text. Exports from the alumni system arrive
/// either as UTF-8 or as a single-byte Windows codepage, so: strip the BOM,
/// try strict UTF-8, then fall back to Windows-1252 (which also covers
/// latin-1 / iso-8859-1 bytes).
pub fn read_decoded(path: &Path) -> Result<String> {
    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to read file: {}", path.display()))?;

    let bytes = match bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]) {
        Some(rest) => rest,
        None => &bytes[..],
    };

    match std::str::from_utf8(bytes) {
        Ok(text) => Ok(text.to_string()),
        Err(_) => {
            let (text, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
            Ok(text.into_owned())
        }
    }
}

/// Parse CSV text into raw rows, skipping lines the parser cannot handle.
pub fn parse_table(text: &str, delimiter: u8) -> RawTable {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut rows = Vec::new();
    for record in reader.records() {
        match record {
            Ok(record) => {
                rows.push(record.iter().map(|cell| cell.trim().to_string()).collect());
            }
            Err(_) => continue, // bad line, skip
        }
    }

    RawTable { rows }
}

pub fn load_table(path: &Path, delimiter: u8) -> Result<RawTable> {
    let text = read_decoded(path)?;
    Ok(parse_table(&text, delimiter))
}

/// Find the line that carries the column headers: the first line containing
/// every marker. The survey exports open with title and filter banners, so
/// the header row can sit anywhere in the first few dozen lines.
pub fn find_header_line(text: &str, markers: &[&str]) -> Option<usize> {
    text.lines()
        .position(|line| markers.iter().all(|marker| line.contains(marker)))
}

/// Load a CSV whose header row has to be located first. When no line matches
/// the markers the file is read from the top, like the original exports that
/// start directly with the header.
pub fn load_with_headers(path: &Path, delimiter: u8, markers: &[&str]) -> Result<HeaderTable> {
    let text = read_decoded(path)?;
    let header_line = find_header_line(&text, markers).unwrap_or(0);

    let from_header: String = text
        .lines()
        .skip(header_line)
        .collect::<Vec<_>>()
        .join("\n");

    let table = parse_table(&from_header, delimiter);
    let mut rows = table.rows.into_iter();
    let headers = rows.next().unwrap_or_default();

    Ok(HeaderTable {
        headers,
        rows: rows.collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_fixture(bytes: &[u8]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(bytes).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_read_decoded_utf8_with_bom() {
        let file = write_fixture("\u{FEFF}Año;Nombre\n2021;ANA".as_bytes());
        let text = read_decoded(file.path()).unwrap();
        assert!(text.starts_with("Año"));
    }

    #[test]
    fn test_read_decoded_windows_1252_fallback() {
        // "AÑO" in Windows-1252: Ñ = 0xD1
        let file = write_fixture(b"A\xD1O;NOMBRE\n");
        let text = read_decoded(file.path()).unwrap();
        assert!(text.starts_with("AÑO"));
    }

    #[test]
    fn test_parse_table_flexible_rows() {
        let table = parse_table("a;b;c\nx;y\nsolo\n", b';');
        assert_eq!(table.rows.len(), 3);
        assert_eq!(table.rows[0], vec!["a", "b", "c"]);
        assert_eq!(table.rows[1], vec!["x", "y"]);
        assert_eq!(table.rows[2], vec!["solo"]);
    }

    #[test]
    fn test_parse_table_trims_cells() {
        let table = parse_table("  MARIA LOPEZ ; 1088245123 \n", b';');
        assert_eq!(table.rows[0], vec!["MARIA LOPEZ", "1088245123"]);
    }

    #[test]
    fn test_find_header_line() {
        let text = "ENCUESTA EGRESADOS\nSeccional Pereira\nNo;DOCUMENTO;NOMBRES;APELLIDOS\n1;42;ANA;RUIZ\n";
        assert_eq!(find_header_line(text, &["DOCUMENTO", "NOMBRES"]), Some(2));
        assert_eq!(find_header_line(text, &["NO_EXISTE"]), None);
    }

    #[test]
    fn test_load_with_headers() {
        let file = write_fixture(
            b"informe general\nNo;DOCUMENTO;NOMBRES\n1;42089377;ANA MARIA\n2;10882451;JOSE\n",
        );
        let table = load_with_headers(file.path(), b';', &["DOCUMENTO", "NOMBRES"]).unwrap();
        assert_eq!(table.headers, vec!["No", "DOCUMENTO", "NOMBRES"]);
        assert_eq!(table.rows.len(), 2);

        let doc = table.find_column(|h| h.to_uppercase() == "DOCUMENTO");
        assert_eq!(doc, Some(1));
        assert_eq!(table.value(&table.rows[0], doc), "42089377");
        assert_eq!(table.value(&table.rows[0], None), "");
    }
}

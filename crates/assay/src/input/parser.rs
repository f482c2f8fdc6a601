//! File parsers for CSV, JSON and spreadsheet input.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use tracing::debug;

use super::source::{Cell, DataTable, SourceMetadata};
use crate::error::{AssayError, Result};

/// How CSV text is tokenized.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CsvMode {
    /// Split every line on a literal comma, trim each token and strip one
    /// enclosing quote on each side. Quoted commas and newlines are not
    /// understood.
    #[default]
    Legacy,
    /// RFC 4180 aware reader; quoted fields may contain commas and newlines.
    Quoted,
}

/// Parser configuration.
#[derive(Debug, Clone, Default)]
pub struct ParserConfig {
    /// CSV tokenizer to use.
    pub csv_mode: CsvMode,
}

/// Input formats recognized by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Csv,
    Json,
    Spreadsheet,
}

impl InputFormat {
    /// Resolve a format from a file extension (without the dot, any case).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "csv" => Some(InputFormat::Csv),
            "json" => Some(InputFormat::Json),
            "xlsx" | "xlsm" => Some(InputFormat::Spreadsheet),
            _ => None,
        }
    }
}

/// Parses tabular data files into a [`DataTable`].
pub struct Parser {
    config: ParserConfig,
}

impl Parser {
    /// Create a new parser with default configuration.
    pub fn new() -> Self {
        Self {
            config: ParserConfig::default(),
        }
    }

    /// Create a parser with custom configuration.
    pub fn with_config(config: ParserConfig) -> Self {
        Self { config }
    }

    /// Parse a file and return the data table and metadata.
    ///
    /// An empty or header-only file yields an empty table, not an error.
    pub fn parse_file(&self, path: impl AsRef<Path>) -> Result<(DataTable, SourceMetadata)> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(AssayError::FileNotFound(path.to_path_buf()));
        }

        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        let format = InputFormat::from_extension(&ext)
            .ok_or_else(|| AssayError::UnsupportedFormat(format!(".{}", ext)))?;

        let mut file = File::open(path).map_err(|e| AssayError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let mut contents = Vec::new();
        file.read_to_end(&mut contents).map_err(|e| AssayError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        let mut hasher = Sha256::new();
        hasher.update(&contents);
        let hash = format!("sha256:{:x}", hasher.finalize());

        let table = match format {
            InputFormat::Csv => self.parse_csv_bytes(&contents)?,
            InputFormat::Json => parse_json_bytes(&contents)?,
            InputFormat::Spreadsheet => parse_spreadsheet(path)?,
        };

        debug!(
            file = %path.display(),
            extension = %ext,
            rows = table.row_count(),
            columns = table.column_count(),
            "parsed input"
        );

        let metadata = SourceMetadata::new(
            path.to_path_buf(),
            hash,
            contents.len() as u64,
            ext,
            table.row_count(),
            table.column_count(),
        );

        Ok((table, metadata))
    }

    /// Parse CSV bytes with the configured tokenizer.
    pub fn parse_csv_bytes(&self, bytes: &[u8]) -> Result<DataTable> {
        let text = std::str::from_utf8(bytes)
            .map_err(|e| AssayError::MalformedInput(format!("CSV is not valid UTF-8: {}", e)))?;
        self.parse_csv_str(text)
    }

    /// Parse CSV text with the configured tokenizer.
    pub fn parse_csv_str(&self, text: &str) -> Result<DataTable> {
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        match self.config.csv_mode {
            CsvMode::Legacy => Ok(parse_csv_legacy(text)),
            CsvMode::Quoted => parse_csv_quoted(text),
        }
    }
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_csv_legacy(text: &str) -> DataTable {
    if text.is_empty() {
        return DataTable::empty();
    }
    // `\n`, `\r\n` and a bare `\r` all end a line.
    let mut lines = text.split(['\n', '\r']);
    let Some(header_line) = lines.next() else {
        return DataTable::empty();
    };

    let headers: Vec<String> = split_legacy_line(header_line)
        .into_iter()
        .map(String::from)
        .collect();

    let rows = lines
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            split_legacy_line(line)
                .into_iter()
                .map(Cell::from_text)
                .collect()
        })
        .collect();

    DataTable::new(headers, rows)
}

fn split_legacy_line(line: &str) -> Vec<&str> {
    line.trim().split(',').map(strip_token).collect()
}

fn strip_token(token: &str) -> &str {
    let token = token.trim();
    let token = token.strip_prefix('"').unwrap_or(token);
    token.strip_suffix('"').unwrap_or(token)
}

fn parse_csv_quoted(text: &str) -> Result<DataTable> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader.headers()?.iter().map(String::from).collect();
    if headers.is_empty() {
        return Ok(DataTable::empty());
    }

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        rows.push(record.iter().map(Cell::from_text).collect());
    }

    Ok(DataTable::new(headers, rows))
}

/// Parse JSON bytes: an array of records or a single record.
pub fn parse_json_bytes(bytes: &[u8]) -> Result<DataTable> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    let value: Value = serde_json::from_slice(bytes)
        .map_err(|e| AssayError::MalformedInput(format!("invalid JSON: {}", e)))?;
    Ok(table_from_json(&value))
}

fn table_from_json(value: &Value) -> DataTable {
    match value {
        Value::Array(items) if !items.is_empty() => {
            let headers: Vec<String> = match &items[0] {
                Value::Object(first) => first.keys().cloned().collect(),
                _ => Vec::new(),
            };
            let rows = items
                .iter()
                .map(|item| record_cells(item, &headers))
                .collect();
            DataTable::new(headers, rows)
        }
        Value::Object(record) => {
            let headers: Vec<String> = record.keys().cloned().collect();
            let row = record_cells(value, &headers);
            DataTable::new(headers, vec![row])
        }
        _ => DataTable::empty(),
    }
}

fn record_cells(item: &Value, headers: &[String]) -> Vec<Cell> {
    headers
        .iter()
        .map(|key| item.get(key).map(Cell::from_json).unwrap_or(Cell::Missing))
        .collect()
}

#[cfg(feature = "spreadsheet")]
fn parse_spreadsheet(path: &Path) -> Result<DataTable> {
    use calamine::{Data, Reader, open_workbook_auto};

    let mut workbook = open_workbook_auto(path)
        .map_err(|e| AssayError::MalformedInput(format!("unreadable workbook: {}", e)))?;

    let range = match workbook.worksheet_range_at(0) {
        Some(range) => range
            .map_err(|e| AssayError::MalformedInput(format!("unreadable worksheet: {}", e)))?,
        None => return Ok(DataTable::empty()),
    };

    let mut sheet_rows = range.rows();
    let Some(header_row) = sheet_rows.next() else {
        return Ok(DataTable::empty());
    };

    let headers: Vec<String> = header_row
        .iter()
        .enumerate()
        .map(|(i, cell)| match cell {
            Data::Empty => format!("col_{}", i),
            Data::String(s) if s.trim().is_empty() => format!("col_{}", i),
            other => other.to_string(),
        })
        .collect();

    let rows = sheet_rows
        .map(|row| {
            row.iter()
                .map(|cell| match cell {
                    Data::Empty | Data::Error(_) => Cell::Missing,
                    Data::Int(i) => Cell::Number(*i as f64),
                    Data::Float(f) => Cell::Number(*f),
                    Data::Bool(b) => Cell::Bool(*b),
                    Data::String(s) => Cell::from_text(s.as_str()),
                    other => Cell::from_text(other.to_string()),
                })
                .collect()
        })
        .collect();

    Ok(DataTable::new(headers, rows))
}

#[cfg(not(feature = "spreadsheet"))]
fn parse_spreadsheet(_path: &Path) -> Result<DataTable> {
    Err(AssayError::MissingOptionalCapability {
        capability: "Spreadsheet",
        hint: "rebuild with the `spreadsheet` feature enabled",
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn legacy() -> Parser {
        Parser::new()
    }

    fn quoted() -> Parser {
        Parser::with_config(ParserConfig {
            csv_mode: CsvMode::Quoted,
        })
    }

    #[test]
    fn test_parse_csv() {
        let table = legacy()
            .parse_csv_str("name,age,city\nAlice,30,NYC\nBob,25,LA")
            .unwrap();

        assert_eq!(table.headers, vec!["name", "age", "city"]);
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.get(0, 0), Some(&Cell::Text("Alice".into())));
        assert_eq!(table.get(1, 1), Some(&Cell::Text("25".into())));
    }

    #[test]
    fn test_legacy_strips_bom_quotes_and_blank_lines() {
        let text = "\u{feff}\"id\", \"value\"\n\n1 , \"x\"\n   \n2,y\n";
        let table = legacy().parse_csv_str(text).unwrap();

        assert_eq!(table.headers, vec!["id", "value"]);
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.get(0, 1), Some(&Cell::Text("x".into())));
    }

    #[test]
    fn test_legacy_splits_quoted_commas() {
        let table = legacy().parse_csv_str("a,b\n\"x,y\",z\n").unwrap();

        assert_eq!(table.get(0, 0), Some(&Cell::Text("x".into())));
        assert_eq!(table.get(0, 1), Some(&Cell::Text("y".into())));
    }

    #[test]
    fn test_quoted_mode_keeps_embedded_commas() {
        let table = quoted().parse_csv_str("a,b\n\"x,y\",z\n").unwrap();

        assert_eq!(table.get(0, 0), Some(&Cell::Text("x,y".into())));
        assert_eq!(table.get(0, 1), Some(&Cell::Text("z".into())));
    }

    #[test]
    fn test_ragged_and_empty_fields_are_missing() {
        let table = legacy().parse_csv_str("a,b,c\n1,,\n4\n").unwrap();

        assert!(table.get(0, 1).is_some_and(Cell::is_missing));
        assert!(table.get(1, 2).is_some_and(Cell::is_missing));
    }

    #[test]
    fn test_legacy_accepts_any_line_ending() {
        for text in ["ph,n\r5.0,10\r9.0,200\r", "ph,n\r\n5.0,10\r\n9.0,200\r\n"] {
            let table = legacy().parse_csv_str(text).unwrap();
            assert_eq!(table.headers, vec!["ph", "n"]);
            assert_eq!(table.row_count(), 2);
            assert_eq!(table.get(1, 1), Some(&Cell::Text("200".into())));
        }

        let quoted = quoted().parse_csv_str("ph,n\r5.0,10\r9.0,200\r").unwrap();
        assert_eq!(quoted.row_count(), 2);
    }

    #[test]
    fn test_empty_csv_is_empty_table() {
        let table = legacy().parse_csv_str("").unwrap();
        assert!(table.is_empty());
        assert_eq!(table.column_count(), 0);

        let header_only = legacy().parse_csv_str("a,b\n").unwrap();
        assert!(header_only.is_empty());
        assert_eq!(header_only.column_count(), 2);
    }

    #[test]
    fn test_json_array_of_records() {
        let table =
            parse_json_bytes(br#"[{"ph": 6.5, "site": "A"}, {"site": "B", "extra": 1}]"#).unwrap();

        assert_eq!(table.headers, vec!["ph", "site"]);
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.get(0, 0), Some(&Cell::Number(6.5)));
        assert!(table.get(1, 0).is_some_and(Cell::is_missing));
    }

    #[test]
    fn test_json_single_record() {
        let table = parse_json_bytes(br#"{"b": 1, "a": null}"#).unwrap();

        assert_eq!(table.headers, vec!["b", "a"]);
        assert_eq!(table.row_count(), 1);
        assert!(table.get(0, 1).is_some_and(Cell::is_missing));
    }

    #[test]
    fn test_json_other_shapes_are_empty() {
        assert!(parse_json_bytes(b"[]").unwrap().is_empty());
        assert!(parse_json_bytes(b"42").unwrap().is_empty());
        assert!(parse_json_bytes(b"\"text\"").unwrap().is_empty());
    }

    #[test]
    fn test_invalid_json_is_malformed() {
        let err = parse_json_bytes(b"{not json").unwrap_err();
        assert!(matches!(err, AssayError::MalformedInput(_)));
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(InputFormat::from_extension("CSV"), Some(InputFormat::Csv));
        assert_eq!(InputFormat::from_extension("json"), Some(InputFormat::Json));
        assert_eq!(
            InputFormat::from_extension("xlsm"),
            Some(InputFormat::Spreadsheet)
        );
        assert_eq!(InputFormat::from_extension("txt"), None);
    }
}

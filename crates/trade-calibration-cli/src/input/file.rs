use serde::de::DeserializeOwned;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use trade_calibration_core::history::record::{RawTradeRow, DATE_IN_COLUMN};

/// Read a JSON file and deserialise into a typed struct.
pub fn read_json<T: DeserializeOwned>(path: &str) -> Result<T, Box<dyn std::error::Error>> {
    let canonical = resolve_path(path)?;
    let contents = fs::read_to_string(&canonical)
        .map_err(|e| format!("Failed to read '{}': {}", canonical.display(), e))?;
    let value: T = serde_json::from_str(&contents)
        .map_err(|e| format!("Failed to parse '{}': {}", canonical.display(), e))?;
    Ok(value)
}

/// Read a YAML file and deserialise into a typed struct.
pub fn read_yaml<T: DeserializeOwned>(path: &str) -> Result<T, Box<dyn std::error::Error>> {
    let canonical = resolve_path(path)?;
    let contents = fs::read_to_string(&canonical)
        .map_err(|e| format!("Failed to read '{}': {}", canonical.display(), e))?;
    let value: T = serde_yaml::from_str(&contents)
        .map_err(|e| format!("Failed to parse '{}': {}", canonical.display(), e))?;
    Ok(value)
}

/// Read a comma-separated trade log with a header row.
pub fn read_csv_rows(path: &str) -> Result<Vec<RawTradeRow>, Box<dyn std::error::Error>> {
    let canonical = resolve_path(path)?;
    let file = fs::File::open(&canonical)
        .map_err(|e| format!("Failed to read '{}': {}", canonical.display(), e))?;
    parse_csv_rows(file, &canonical.display().to_string())
}

/// Decode CSV rows keyed by the header row. Blank lines are skipped and
/// short rows leave their missing columns absent.
pub fn parse_csv_rows<R: Read>(
    source: R,
    name: &str,
) -> Result<Vec<RawTradeRow>, Box<dyn std::error::Error>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(source);

    let headers = reader
        .headers()
        .map_err(|e| format!("Failed to parse '{}': {}", name, e))?
        .clone();
    if !headers.iter().any(|h| h == DATE_IN_COLUMN) {
        warn!(
            source = name,
            "no '{}' column; every row will be skipped",
            DATE_IN_COLUMN
        );
    }

    let mut rows = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        let record =
            record.map_err(|e| format!("Failed to parse '{}' at row {}: {}", name, idx + 1, e))?;
        rows.push(RawTradeRow::from_fields(headers.iter().zip(record.iter())));
    }
    debug!(rows = rows.len(), source = name, "trade log loaded");
    Ok(rows)
}

/// Resolve and validate the path.
fn resolve_path(path: &str) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let p = Path::new(path);
    let canonical = if p.is_absolute() {
        p.to_path_buf()
    } else {
        std::env::current_dir()?.join(p)
    };

    if !canonical.exists() {
        return Err(format!("File not found: {}", canonical.display()).into());
    }

    if !canonical.is_file() {
        return Err(format!("Not a file: {}", canonical.display()).into());
    }

    Ok(canonical)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_csv_rows_with_ragged_and_blank_lines() {
        let text = "DATE IN ,ASSET,INVESTMENT (EURO),RESULT\n\
                    2024-01-02,DAX,\"€1,000.00\",\"-€50.00\"\n\
                    \n\
                    2024-01-03,DAX\n";
        let rows = parse_csv_rows(text.as_bytes(), "test").unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].date_in.as_deref(), Some("2024-01-02"));
        assert_eq!(rows[0].investment.as_deref(), Some("€1,000.00"));
        assert_eq!(rows[0].result.as_deref(), Some("-€50.00"));
        assert_eq!(rows[1].investment, None);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        assert!(read_csv_rows("definitely/not/here.csv").is_err());
    }
}

// 📂 Ingestion - Turns uploaded activity files into rows for the core
// CSV and JSON readers with tolerant, case-insensitive header matching

use crate::calculator::ActivityRow;
use anyhow::{Context, Result};
use std::path::Path;

// ============================================================================
// FORMAT DETECTION
// ============================================================================

/// Supported upload formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Csv,
    Json,
}

/// Detect the upload format from the file extension.
///
/// Anything other than .csv/.json is a hard error: if a file cannot even be
/// turned into row objects, ingestion fails before rows reach the core.
pub fn detect_format(file_path: &Path) -> Result<InputFormat> {
    let extension = file_path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match extension.as_str() {
        "csv" => Ok(InputFormat::Csv),
        "json" => Ok(InputFormat::Json),
        _ => Err(anyhow::anyhow!(
            "Unsupported file type: {} (expected .csv or .json)",
            file_path.display()
        )),
    }
}

/// Load a file into activity rows, dispatching on the detected format
pub fn load_rows(file_path: &Path) -> Result<Vec<ActivityRow>> {
    match detect_format(file_path)? {
        InputFormat::Csv => load_csv_rows(file_path),
        InputFormat::Json => load_json_rows(file_path),
    }
}

// ============================================================================
// HEADER MATCHING
// ============================================================================

// Accepted header spellings for each field. Spreadsheets exported from
// different tools disagree on casing and abbreviations.
const ACTIVITY_HEADERS: &[&str] = &["activity"];
const QUANTITY_HEADERS: &[&str] = &["quantity", "qty"];
const UNIT_HEADERS: &[&str] = &["unit", "uom"];

fn header_index(headers: &csv::StringRecord, accepted: &[&str]) -> Option<usize> {
    headers
        .iter()
        .position(|h| accepted.contains(&h.trim().to_lowercase().as_str()))
}

// ============================================================================
// CSV READER
// ============================================================================

/// Read activity rows from a headed CSV file.
///
/// Header matching is case-insensitive and accepts the common variants
/// (Activity/activity, Quantity/Qty, Unit/UOM). Missing cells become empty
/// strings, which the calculator then treats leniently (blank activity is
/// skipped, unparseable quantity is zero). A missing activity COLUMN is a
/// structural error, not noisy data.
pub fn load_csv_rows(file_path: &Path) -> Result<Vec<ActivityRow>> {
    use csv::ReaderBuilder;
    use std::fs::File;

    let file = File::open(file_path)
        .with_context(|| format!("Failed to open file: {}", file_path.display()))?;

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(file);

    let headers = reader
        .headers()
        .with_context(|| format!("Failed to read CSV headers from {}", file_path.display()))?
        .clone();

    let activity_idx = header_index(&headers, ACTIVITY_HEADERS).ok_or_else(|| {
        anyhow::anyhow!(
            "No activity column found in {} (headers: {:?})",
            file_path.display(),
            headers
        )
    })?;
    let quantity_idx = header_index(&headers, QUANTITY_HEADERS);
    let unit_idx = header_index(&headers, UNIT_HEADERS);

    let mut rows = Vec::new();
    let filename = file_path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("unknown.csv")
        .to_string();

    for (line_num, result) in reader.records().enumerate() {
        let record = result.with_context(|| {
            format!("Failed to parse CSV line {} in {}", line_num + 2, filename)
        })?;

        let activity = record.get(activity_idx).unwrap_or("").to_string();
        let quantity = quantity_idx
            .and_then(|i| record.get(i))
            .unwrap_or("")
            .to_string();
        let unit = unit_idx
            .and_then(|i| record.get(i))
            .unwrap_or("")
            .to_string();

        rows.push(ActivityRow {
            activity,
            quantity,
            unit,
        });
    }

    Ok(rows)
}

// ============================================================================
// JSON READER
// ============================================================================

/// Read activity rows from a JSON array of objects.
///
/// The same field-name tolerance as the CSV reader, applied per object.
/// This is the wire format the API server accepts for ad hoc reports.
pub fn load_json_rows(file_path: &Path) -> Result<Vec<ActivityRow>> {
    use std::fs::File;
    use std::io::BufReader;

    let file = File::open(file_path)
        .with_context(|| format!("Failed to open file: {}", file_path.display()))?;

    let reader = BufReader::new(file);
    let json: serde_json::Value = serde_json::from_reader(reader)
        .with_context(|| format!("Failed to parse JSON from {}", file_path.display()))?;

    let items = json
        .as_array()
        .ok_or_else(|| anyhow::anyhow!("Expected a JSON array of row objects"))?;

    Ok(items.iter().map(row_from_json).collect())
}

/// Build one row from a JSON object, tolerating field-name variants.
/// Numeric quantities are carried as their textual form; the calculator
/// owns the parse either way.
pub fn row_from_json(item: &serde_json::Value) -> ActivityRow {
    ActivityRow {
        activity: json_field(item, ACTIVITY_HEADERS),
        quantity: json_field(item, QUANTITY_HEADERS),
        unit: json_field(item, UNIT_HEADERS),
    }
}

fn json_field(item: &serde_json::Value, accepted: &[&str]) -> String {
    let object = match item.as_object() {
        Some(object) => object,
        None => return String::new(),
    };

    for (key, value) in object {
        if accepted.contains(&key.trim().to_lowercase().as_str()) {
            return match value {
                serde_json::Value::String(s) => s.clone(),
                serde_json::Value::Number(n) => n.to_string(),
                _ => String::new(),
            };
        }
    }

    String::new()
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn temp_file(name: &str, contents: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("carbon_insight_test_{}", name));
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_detect_format() {
        assert_eq!(detect_format(Path::new("a.csv")).unwrap(), InputFormat::Csv);
        assert_eq!(detect_format(Path::new("a.CSV")).unwrap(), InputFormat::Csv);
        assert_eq!(detect_format(Path::new("a.json")).unwrap(), InputFormat::Json);
        assert!(detect_format(Path::new("a.xlsx")).is_err());
        assert!(detect_format(Path::new("noext")).is_err());
    }

    #[test]
    fn test_csv_with_canonical_headers() {
        let path = temp_file(
            "canonical.csv",
            "Activity,Quantity,Unit\nElectricity,100,kWh\nDiesel,\"1,234\",L\n",
        );
        let rows = load_csv_rows(&path).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], ActivityRow::new("Electricity", "100", "kWh"));
        assert_eq!(rows[1].quantity, "1,234");
    }

    #[test]
    fn test_csv_header_variants() {
        let path = temp_file(
            "variants.csv",
            "activity,Qty,UOM\nCoal,12,kg\n",
        );
        let rows = load_csv_rows(&path).unwrap();

        assert_eq!(rows[0], ActivityRow::new("Coal", "12", "kg"));
    }

    #[test]
    fn test_csv_missing_optional_columns() {
        let path = temp_file("activity_only.csv", "Activity\nElectricity\n");
        let rows = load_csv_rows(&path).unwrap();

        assert_eq!(rows[0], ActivityRow::new("Electricity", "", ""));
    }

    #[test]
    fn test_csv_without_activity_column_fails() {
        let path = temp_file("no_activity.csv", "Name,Quantity\nElectricity,100\n");
        assert!(load_csv_rows(&path).is_err());
    }

    #[test]
    fn test_csv_short_records_become_blank_cells() {
        let path = temp_file(
            "short.csv",
            "Activity,Quantity,Unit\nElectricity\n",
        );
        let rows = load_csv_rows(&path).unwrap();

        assert_eq!(rows[0].quantity, "");
        assert_eq!(rows[0].unit, "");
    }

    #[test]
    fn test_json_rows_with_variants() {
        let path = temp_file(
            "rows.json",
            r#"[
                {"Activity": "Electricity", "Quantity": "100", "Unit": "kWh"},
                {"activity": "Diesel", "Qty": 50, "uom": "L"}
            ]"#,
        );
        let rows = load_json_rows(&path).unwrap();

        assert_eq!(rows[0], ActivityRow::new("Electricity", "100", "kWh"));
        assert_eq!(rows[1], ActivityRow::new("Diesel", "50", "L"));
    }

    #[test]
    fn test_json_non_array_fails() {
        let path = temp_file("object.json", r#"{"Activity": "Electricity"}"#);
        assert!(load_json_rows(&path).is_err());
    }

    #[test]
    fn test_json_missing_fields_become_blank() {
        let row = row_from_json(&serde_json::json!({"Quantity": 12}));
        assert_eq!(row.activity, "");
        assert_eq!(row.quantity, "12");
    }
}

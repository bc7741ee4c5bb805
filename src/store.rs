// 💾 Store - SQLite persistence of uploads and report runs
// Raw uploads are kept verbatim; reports are snapshots of one computation

use crate::aggregator::EmissionReport;
use crate::calculator::ActivityRow;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

// ============================================================================
// RECORD TYPES
// ============================================================================

/// One imported activity file.
///
/// Identity is a UUID; `content_sha256` is for DEDUPLICATION only —
/// re-importing a byte-identical file is skipped, not versioned. Duplicate
/// rows inside a file are legitimate activity data and are never deduped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Upload {
    pub upload_uuid: String,
    pub file_name: String,
    pub content_sha256: String,
    pub row_count: usize,
    pub imported_at: DateTime<Utc>,
}

/// One persisted aggregation run over an upload.
///
/// Aggregates and suggestions are stored as JSON snapshots so a run stays
/// readable even after the compiled-in factor table changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportRun {
    pub run_uuid: String,
    pub upload_uuid: String,
    pub total_emission: f64,
    pub aggregates_json: String,
    pub suggestions_json: String,
    pub created_at: DateTime<Utc>,
}

/// SHA-256 of the raw uploaded bytes, hex-encoded
pub fn content_hash(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    format!("{:x}", hasher.finalize())
}

// ============================================================================
// SCHEMA
// ============================================================================

pub fn setup_database(conn: &Connection) -> Result<()> {
    // Enable WAL mode for crash recovery
    conn.pragma_update(None, "journal_mode", "WAL")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS uploads (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            upload_uuid TEXT UNIQUE NOT NULL,
            file_name TEXT NOT NULL,
            content_sha256 TEXT UNIQUE NOT NULL,
            row_count INTEGER NOT NULL,
            imported_at TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS activity_rows (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            upload_uuid TEXT NOT NULL,
            line_number INTEGER NOT NULL,
            activity TEXT NOT NULL,
            quantity TEXT NOT NULL,
            unit TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS report_runs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            run_uuid TEXT UNIQUE NOT NULL,
            upload_uuid TEXT NOT NULL,
            total_emission REAL NOT NULL,
            aggregates_json TEXT NOT NULL,
            suggestions_json TEXT NOT NULL,
            created_at TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_rows_upload ON activity_rows(upload_uuid)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_runs_upload ON report_runs(upload_uuid)",
        [],
    )?;

    Ok(())
}

// ============================================================================
// UPLOADS
// ============================================================================

/// Persist an upload and its raw rows.
///
/// Returns `Ok(None)` when a byte-identical file was already imported
/// (detected via the content hash); the rows are not re-inserted.
pub fn insert_upload(
    conn: &Connection,
    file_name: &str,
    content: &[u8],
    rows: &[ActivityRow],
) -> Result<Option<Upload>> {
    let upload = Upload {
        upload_uuid: uuid::Uuid::new_v4().to_string(),
        file_name: file_name.to_string(),
        content_sha256: content_hash(content),
        row_count: rows.len(),
        imported_at: Utc::now(),
    };

    let result = conn.execute(
        "INSERT INTO uploads (upload_uuid, file_name, content_sha256, row_count, imported_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            upload.upload_uuid,
            upload.file_name,
            upload.content_sha256,
            upload.row_count as i64,
            upload.imported_at.to_rfc3339(),
        ],
    );

    match result {
        Ok(_) => {}
        Err(rusqlite::Error::SqliteFailure(err, _))
            if err.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            return Ok(None);
        }
        Err(e) => return Err(e.into()),
    }

    for (line_number, row) in rows.iter().enumerate() {
        conn.execute(
            "INSERT INTO activity_rows (upload_uuid, line_number, activity, quantity, unit)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                upload.upload_uuid,
                // +2: 1-indexed plus the header row of the original file
                (line_number + 2) as i64,
                row.activity,
                row.quantity,
                row.unit,
            ],
        )?;
    }

    Ok(Some(upload))
}

pub fn get_uploads(conn: &Connection) -> Result<Vec<Upload>> {
    let mut stmt = conn.prepare(
        "SELECT upload_uuid, file_name, content_sha256, row_count, imported_at
         FROM uploads ORDER BY imported_at DESC",
    )?;

    let uploads = stmt
        .query_map([], |row| {
            let imported_at: String = row.get(4)?;
            let row_count: i64 = row.get(3)?;

            Ok(Upload {
                upload_uuid: row.get(0)?,
                file_name: row.get(1)?,
                content_sha256: row.get(2)?,
                row_count: row_count as usize,
                imported_at: parse_timestamp(&imported_at)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()
        .context("Failed to load uploads")?;

    Ok(uploads)
}

/// Raw rows of one upload, in original line order
pub fn get_rows_for_upload(conn: &Connection, upload_uuid: &str) -> Result<Vec<ActivityRow>> {
    let mut stmt = conn.prepare(
        "SELECT activity, quantity, unit FROM activity_rows
         WHERE upload_uuid = ?1 ORDER BY line_number ASC",
    )?;

    let rows = stmt
        .query_map(params![upload_uuid], |row| {
            Ok(ActivityRow {
                activity: row.get(0)?,
                quantity: row.get(1)?,
                unit: row.get(2)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()
        .context("Failed to load activity rows")?;

    Ok(rows)
}

/// Uploads matching a file name (re-imports under the same name are
/// separate uploads with different content hashes)
pub fn get_uploads_by_file(conn: &Connection, file_name: &str) -> Result<Vec<Upload>> {
    Ok(get_uploads(conn)?
        .into_iter()
        .filter(|u| u.file_name == file_name)
        .collect())
}

// ============================================================================
// REPORT RUNS
// ============================================================================

/// Persist one computed report (plus its suggestions) for an upload
pub fn insert_report_run(
    conn: &Connection,
    upload_uuid: &str,
    report: &EmissionReport,
    suggestions: &[String],
) -> Result<ReportRun> {
    let run = ReportRun {
        run_uuid: uuid::Uuid::new_v4().to_string(),
        upload_uuid: upload_uuid.to_string(),
        total_emission: report.total_emission,
        aggregates_json: serde_json::to_string(&report.aggregates)?,
        suggestions_json: serde_json::to_string(suggestions)?,
        created_at: Utc::now(),
    };

    conn.execute(
        "INSERT INTO report_runs (run_uuid, upload_uuid, total_emission,
                                  aggregates_json, suggestions_json, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            run.run_uuid,
            run.upload_uuid,
            run.total_emission,
            run.aggregates_json,
            run.suggestions_json,
            run.created_at.to_rfc3339(),
        ],
    )?;

    Ok(run)
}

pub fn get_report_runs(conn: &Connection) -> Result<Vec<ReportRun>> {
    let mut stmt = conn.prepare(
        "SELECT run_uuid, upload_uuid, total_emission, aggregates_json,
                suggestions_json, created_at
         FROM report_runs ORDER BY created_at DESC",
    )?;

    let runs = stmt
        .query_map([], |row| {
            let created_at: String = row.get(5)?;

            Ok(ReportRun {
                run_uuid: row.get(0)?,
                upload_uuid: row.get(1)?,
                total_emission: row.get(2)?,
                aggregates_json: row.get(3)?,
                suggestions_json: row.get(4)?,
                created_at: parse_timestamp(&created_at)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()
        .context("Failed to load report runs")?;

    Ok(runs)
}

fn parse_timestamp(text: &str) -> std::result::Result<DateTime<Utc>, rusqlite::Error> {
    DateTime::parse_from_rfc3339(text)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| rusqlite::Error::InvalidQuery)
}

// ============================================================================
// TESTS
// ============================================================================

// Carbon Insight - Core Library
// Exposes the emission pipeline for use in CLI, API server, and tests

pub mod factors;
pub mod calculator;
pub mod aggregator;
pub mod suggestions;
pub mod ingest;
pub mod store;

// Re-export commonly used types
pub use factors::{EmissionFactor, FactorRegistry};
pub use calculator::{parse_quantity, ActivityRow, ComputedRow, EmissionCalculator};
pub use aggregator::{round2, Aggregator, CategoryAggregate, EmissionReport};
pub use suggestions::{suggest, suggest_for_report};
pub use ingest::{
    detect_format, load_csv_rows, load_json_rows, load_rows, row_from_json, InputFormat,
};
pub use store::{
    content_hash, get_report_runs, get_rows_for_upload, get_uploads, get_uploads_by_file,
    insert_report_run, insert_upload, setup_database, ReportRun, Upload,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

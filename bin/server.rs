// Carbon Insight - Web Server
// REST API exposing the emission pipeline over HTTP

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use rusqlite::Connection;
use serde::Serialize;
use std::sync::{Arc, Mutex};
use tower_http::cors::CorsLayer;

use carbon_insight::{
    get_report_runs, get_uploads_by_file, row_from_json, suggest_for_report, Aggregator,
    CategoryAggregate, FactorRegistry, ReportRun, Upload,
};

/// Shared application state
#[derive(Clone)]
struct AppState {
    db: Arc<Mutex<Connection>>,
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
            error: None,
        }
    }
}

/// Report response: the aggregation output plus its suggestions
#[derive(Serialize)]
struct ReportResponse {
    total_emission: f64,
    aggregates: Vec<CategoryAggregate>,
    suggestions: Vec<String>,
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/factors - The compiled-in emission factor table
async fn get_factors() -> impl IntoResponse {
    let registry = FactorRegistry::builtin();
    Json(ApiResponse::ok(registry.factors().to_vec()))
}

/// POST /api/report - Run the pipeline on posted rows (no persistence)
///
/// Body: JSON array of row objects; field-name variants are tolerated the
/// same way file ingestion tolerates them.
async fn compute_report(Json(body): Json<serde_json::Value>) -> impl IntoResponse {
    let items = match body.as_array() {
        Some(items) => items,
        None => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ApiResponse {
                    success: false,
                    data: serde_json::json!(null),
                    error: Some("Expected a JSON array of row objects".to_string()),
                }),
            )
                .into_response();
        }
    };

    let rows: Vec<_> = items.iter().map(row_from_json).collect();
    let report = Aggregator::builtin().aggregate(&rows);
    let suggestions = suggest_for_report(&report);

    let response = ReportResponse {
        total_emission: report.total_emission,
        aggregates: report.aggregates,
        suggestions,
    };

    (StatusCode::OK, Json(ApiResponse::ok(response))).into_response()
}

/// GET /api/runs - All persisted report runs
async fn get_runs(State(state): State<AppState>) -> impl IntoResponse {
    let conn = state.db.lock().unwrap();

    match get_report_runs(&conn) {
        Ok(runs) => (StatusCode::OK, Json(ApiResponse::ok(runs))).into_response(),
        Err(e) => {
            eprintln!("Error getting report runs: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::ok(Vec::<ReportRun>::new())),
            )
                .into_response()
        }
    }
}

/// GET /api/uploads/:filename - Uploads recorded under a file name
async fn get_uploads_for_file(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> impl IntoResponse {
    let conn = state.db.lock().unwrap();

    // Decode URL-encoded filename
    let decoded_filename = urlencoding::decode(&filename)
        .unwrap_or_else(|_| filename.clone().into())
        .into_owned();

    match get_uploads_by_file(&conn, &decoded_filename) {
        Ok(uploads) => (StatusCode::OK, Json(ApiResponse::ok(uploads))).into_response(),
        Err(e) => {
            eprintln!("Error getting uploads for {}: {}", decoded_filename, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::ok(Vec::<Upload>::new())),
            )
                .into_response()
        }
    }
}

// ============================================================================
// Main Server
// ============================================================================

#[tokio::main]
async fn main() {
    println!("🌐 Carbon Insight - Web Server");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let db_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "carbon_insight.db".to_string());

    let conn = Connection::open(&db_path).expect("Failed to open database");
    carbon_insight::setup_database(&conn).expect("Failed to set up database schema");
    println!("✓ Database opened: {}", db_path);

    // Create shared state
    let state = AppState {
        db: Arc::new(Mutex::new(conn)),
    };

    // Build API routes
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/factors", get(get_factors))
        .route("/report", post(compute_report))
        .route("/runs", get(get_runs))
        .route("/uploads/:filename", get(get_uploads_for_file))
        .with_state(state.clone());

    let app = Router::new()
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive());

    // Start server
    let addr = "0.0.0.0:3000";
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    println!("\n🚀 Server running on http://localhost:3000");
    println!("   POST http://localhost:3000/api/report");
    println!("   GET  http://localhost:3000/api/factors");
    println!("\n   Press Ctrl+C to stop\n");

    axum::serve(listener, app)
        .await
        .expect("Failed to start server");
}

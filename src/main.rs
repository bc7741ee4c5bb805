use anyhow::Result;
use rusqlite::Connection;
use std::env;
use std::path::Path;

use carbon_insight::{
    insert_report_run, insert_upload, load_rows, round2, setup_database, suggest_for_report,
    Aggregator,
};

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    match args.get(1).map(|s| s.as_str()) {
        Some("report") => {
            let file = args
                .get(2)
                .ok_or_else(|| anyhow::anyhow!("Usage: carbon-insight report <file.csv|file.json>"))?;
            run_report(Path::new(file))?;
        }
        Some("import") => {
            let file = args
                .get(2)
                .ok_or_else(|| anyhow::anyhow!("Usage: carbon-insight import <file> [db]"))?;
            let db = args.get(3).map(|s| s.as_str()).unwrap_or("carbon_insight.db");
            run_import(Path::new(file), Path::new(db))?;
        }
        _ => {
            println!("Carbon Insight v{}", carbon_insight::VERSION);
            println!();
            println!("Usage:");
            println!("  carbon-insight report <file>        Compute and print an emission report");
            println!("  carbon-insight import <file> [db]   Persist an upload and its report run");
        }
    }

    Ok(())
}

fn run_report(file: &Path) -> Result<()> {
    println!("🌍 Carbon Insight - Emission Report");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    println!("\n📂 Loading {}...", file.display());
    let rows = load_rows(file)?;
    println!("✓ Loaded {} rows", rows.len());

    let aggregator = Aggregator::builtin();
    let report = aggregator.aggregate(&rows);
    let suggestions = suggest_for_report(&report);

    println!("\n📊 Breakdown by activity:");
    for aggregate in report.ranked() {
        println!(
            "   {:<28} {:>12} {:<6} {:>12.2} kg CO2e",
            aggregate.activity,
            aggregate.quantity,
            aggregate.unit,
            round2(aggregate.emission),
        );
    }

    println!("\n   Total: {:.2} kg CO2e", report.total_emission);

    println!("\n💡 Suggestions:");
    for suggestion in &suggestions {
        println!("   • {}", suggestion);
    }

    Ok(())
}

fn run_import(file: &Path, db_path: &Path) -> Result<()> {
    println!("🗄️  Carbon Insight - Import");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    // 1. Load rows
    println!("\n📂 Loading {}...", file.display());
    let rows = load_rows(file)?;
    let content = std::fs::read(file)?;
    println!("✓ Loaded {} rows", rows.len());

    // 2. Setup database
    println!("\n🔧 Setting up database...");
    let conn = Connection::open(db_path)?;
    setup_database(&conn)?;
    println!("✓ Database initialized with WAL mode");

    // 3. Persist upload
    let file_name = file
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("upload");

    println!("\n💾 Storing upload...");
    let upload = match insert_upload(&conn, file_name, &content, &rows)? {
        Some(upload) => upload,
        None => {
            println!("✓ Identical file already imported, nothing to do");
            return Ok(());
        }
    };
    println!("✓ Stored upload {} ({} rows)", upload.upload_uuid, upload.row_count);

    // 4. Compute and persist report run
    println!("\n📊 Computing report...");
    let report = Aggregator::builtin().aggregate(&rows);
    let suggestions = suggest_for_report(&report);
    let run = insert_report_run(&conn, &upload.upload_uuid, &report, &suggestions)?;

    println!("✓ Report run {} stored", run.run_uuid);
    println!("✓ Total: {:.2} kg CO2e across {} categories",
        report.total_emission,
        report.aggregates.len()
    );

    Ok(())
}

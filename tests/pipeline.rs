// End-to-end pipeline tests: file ingestion through report and suggestions

use carbon_insight::{load_csv_rows, round2, suggest_for_report, ActivityRow, Aggregator};
use std::io::Write;
use std::path::PathBuf;

fn temp_csv(name: &str, contents: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("carbon_insight_e2e_{}", name));
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    path
}

#[test]
fn csv_to_report_and_suggestions() {
    let path = temp_csv(
        "factory.csv",
        "Activity,Quantity,Unit\n\
         Electricity (Dyehouse),\"3,400\",kWh\n\
         Diesel Generator,120,L\n\
         ,999,kWh\n\
         Rainwater,500,kL\n",
    );

    let rows = load_csv_rows(&path).unwrap();
    assert_eq!(rows.len(), 4);

    let report = Aggregator::builtin().aggregate(&rows);

    // Blank-activity row dropped; the other three each form a category
    assert_eq!(report.aggregates.len(), 3);
    assert!(report.aggregate_for("Electricity (Dyehouse)").is_some());
    assert!(report.aggregate_for("Rainwater").is_some());

    // 3400 * 0.82 + 120 * 2.68 + 500 * 0 = 2788 + 321.6
    assert_eq!(report.total_emission, 3109.6);

    let dyehouse = report.aggregate_for("Electricity (Dyehouse)").unwrap();
    assert_eq!(round2(dyehouse.emission), 2788.0);
    assert_eq!(dyehouse.unit, "kWh");

    // Rainwater resolves no factor but is tracked normally
    let rainwater = report.aggregate_for("Rainwater").unwrap();
    assert_eq!(rainwater.emission, 0.0);
    assert_eq!(rainwater.quantity, 500.0);

    let suggestions = suggest_for_report(&report);

    // Low tier, top contributor (the dyehouse), electricity follow-up
    assert_eq!(suggestions.len(), 3);
    assert!(suggestions[0].contains("low level"));
    assert!(suggestions[1].contains("Electricity (Dyehouse)"));
    assert!(suggestions[1].contains("2788"));
    assert!(suggestions[2].contains("rooftop solar"));
}

#[test]
fn empty_input_still_produces_guidance() {
    let report = Aggregator::builtin().aggregate(&[]);

    assert_eq!(report.total_emission, 0.0);
    assert!(report.is_empty());

    let suggestions = suggest_for_report(&report);
    assert_eq!(suggestions.len(), 1);
    assert!(suggestions[0].contains("low level"));
}

#[test]
fn report_totals_match_category_sums_for_any_partition() {
    let aggregator = Aggregator::builtin();

    let rows = vec![
        ActivityRow::new("Electricity", "123.45", "kWh"),
        ActivityRow::new("Diesel", "67.8", "L"),
        ActivityRow::new("Electricity", "0.07", "kWh"),
        ActivityRow::new("Coal", "1,000", "kg"),
        ActivityRow::new("LPG", "velocity", "kg"), // quantity parses to 0
    ];

    let report = aggregator.aggregate(&rows);
    let sum: f64 = report.aggregates.iter().map(|a| a.emission).sum();
    assert_eq!(report.total_emission, round2(sum));

    // Same rows, different grouping of the input slice: same report
    let again = aggregator.aggregate(&rows);
    assert_eq!(report, again);
}

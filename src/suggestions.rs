// 💡 Suggestion Engine - Rule-based guidance from the emission breakdown
// Fixed-order rule evaluations over the grand total and ranked categories

use crate::aggregator::{CategoryAggregate, EmissionReport};

// ============================================================================
// THRESHOLDS
// ============================================================================

/// Magnitude tiers in kg CO2e, evaluated high to low; exactly one fires.
const SEVERE_THRESHOLD: f64 = 500_000.0;
const HIGH_THRESHOLD: f64 = 100_000.0;
const MODERATE_THRESHOLD: f64 = 20_000.0;

// ============================================================================
// SUGGESTION ENGINE
// ============================================================================

/// Derive guidance strings from a total and the per-category aggregates.
///
/// Always produces at least one string (the magnitude tier); there is no
/// error path. Rules run in a fixed order:
/// 1. one magnitude-tier message;
/// 2. top-contributor message, when any category exists;
/// 3. independent keyword follow-ups on the top category's name
///    ("electric", "diesel"/"fuel", "waste") - zero or more may fire.
pub fn suggest(total_emission: f64, aggregates: &[CategoryAggregate]) -> Vec<String> {
    let mut suggestions = Vec::new();

    suggestions.push(magnitude_message(total_emission));

    if let Some(top) = top_contributor(aggregates) {
        suggestions.push(format!(
            "Your largest source is {} at about {} kg CO2e. Focus reduction efforts there first.",
            top.activity,
            top.emission.round()
        ));

        let name = top.activity.to_lowercase();

        if name.contains("electric") {
            suggestions.push(
                "Electricity dominates your footprint: consider rooftop solar, \
                 high-efficiency motors, and off-peak scheduling for heavy loads."
                    .to_string(),
            );
        }

        if name.contains("diesel") || name.contains("fuel") {
            suggestions.push(
                "Fuel combustion is a major source: service boilers and generators, \
                 and evaluate switching to biofuel blends or grid power."
                    .to_string(),
            );
        }

        if name.contains("waste") {
            suggestions.push(
                "Waste is a major source: increase segregation and recycling, \
                 and divert organic waste to composting or biogas."
                    .to_string(),
            );
        }
    }

    suggestions
}

/// Convenience wrapper for callers holding a full report
pub fn suggest_for_report(report: &EmissionReport) -> Vec<String> {
    suggest(report.total_emission, &report.aggregates)
}

/// Exactly one tier fires, first matching threshold wins.
fn magnitude_message(total_emission: f64) -> String {
    if total_emission > SEVERE_THRESHOLD {
        "Severe emission levels: an immediate reduction program and an energy \
         audit are strongly recommended."
            .to_string()
    } else if total_emission > HIGH_THRESHOLD {
        "High emission levels: set reduction targets and review your largest \
         energy sources this quarter."
            .to_string()
    } else if total_emission > MODERATE_THRESHOLD {
        "Moderate emission levels: there is clear room for efficiency \
         improvements in day-to-day operations."
            .to_string()
    } else {
        "Emissions are at a low level: maintain current practices and keep \
         monitoring regularly."
            .to_string()
    }
}

/// Top category by emission, stable on exact ties (first seen wins).
fn top_contributor(aggregates: &[CategoryAggregate]) -> Option<&CategoryAggregate> {
    let mut ranked: Vec<&CategoryAggregate> = aggregates.iter().collect();
    ranked.sort_by(|a, b| {
        b.emission
            .partial_cmp(&a.emission)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    ranked.into_iter().next()
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn aggregate(activity: &str, emission: f64) -> CategoryAggregate {
        CategoryAggregate {
            activity: activity.to_string(),
            quantity: 0.0,
            unit: "unit".to_string(),
            emission,
            rows: Vec::new(),
        }
    }

    #[test]
    fn test_empty_aggregates_give_only_low_tier() {
        let suggestions = suggest(0.0, &[]);

        assert_eq!(suggestions.len(), 1);
        assert!(suggestions[0].contains("low level"));
    }

    #[test]
    fn test_magnitude_tiers() {
        assert!(suggest(600_000.0, &[])[0].contains("Severe"));
        assert!(suggest(500_000.0, &[])[0].contains("High")); // boundary is strict
        assert!(suggest(150_000.0, &[])[0].contains("High"));
        assert!(suggest(100_000.0, &[])[0].contains("Moderate"));
        assert!(suggest(50_000.0, &[])[0].contains("Moderate"));
        assert!(suggest(20_000.0, &[])[0].contains("low level"));
        assert!(suggest(100.0, &[])[0].contains("low level"));
    }

    #[test]
    fn test_exactly_one_tier_fires() {
        let suggestions = suggest(600_000.0, &[]);
        assert_eq!(suggestions.len(), 1);
        assert!(!suggestions[0].contains("High"));
    }

    #[test]
    fn test_top_contributor_named_with_rounded_value() {
        let aggregates = vec![
            aggregate("Coal Boiler", 120.4),
            aggregate("Electricity (Office)", 999.6),
        ];
        let suggestions = suggest(1120.0, &aggregates);

        // tier + top contributor + electricity follow-up
        assert_eq!(suggestions.len(), 3);
        assert!(suggestions[1].contains("Electricity (Office)"));
        assert!(suggestions[1].contains("1000"));
    }

    #[test]
    fn test_electricity_follow_up_fires() {
        let aggregates = vec![aggregate("Electricity (Dyehouse)", 500.0)];
        let suggestions = suggest(500.0, &aggregates);

        assert!(suggestions.iter().any(|s| s.contains("rooftop solar")));
    }

    #[test]
    fn test_fuel_follow_up_fires_for_diesel_and_fuel() {
        let diesel = suggest(500.0, &[aggregate("Diesel Generator", 500.0)]);
        assert!(diesel.iter().any(|s| s.contains("biofuel")));

        let fuel = suggest(500.0, &[aggregate("Boiler Fuel", 500.0)]);
        assert!(fuel.iter().any(|s| s.contains("biofuel")));
    }

    #[test]
    fn test_waste_follow_up_fires() {
        let suggestions = suggest(500.0, &[aggregate("Process Waste", 500.0)]);
        assert!(suggestions.iter().any(|s| s.contains("composting")));
    }

    #[test]
    fn test_no_follow_up_for_untriggered_name() {
        let suggestions = suggest(500.0, &[aggregate("Rainwater", 500.0)]);

        // tier + top contributor only
        assert_eq!(suggestions.len(), 2);
        assert!(suggestions[1].contains("Rainwater"));
    }

    #[test]
    fn test_multiple_follow_ups_may_fire() {
        let suggestions = suggest(500.0, &[aggregate("Diesel Electric Hybrid", 500.0)]);

        // tier + top + electricity + fuel
        assert_eq!(suggestions.len(), 4);
    }

    #[test]
    fn test_tie_on_emission_is_stable() {
        let aggregates = vec![
            aggregate("Diesel Generator", 250.0),
            aggregate("Electricity", 250.0),
        ];
        let suggestions = suggest(500.0, &aggregates);

        // first-seen category wins the tie
        assert!(suggestions[1].contains("Diesel Generator"));
        assert!(suggestions.iter().any(|s| s.contains("biofuel")));
        assert!(!suggestions.iter().any(|s| s.contains("rooftop solar")));
    }
}

// 📊 Aggregator - Fold computed rows into per-category totals
// Produces the EmissionReport consumed by CLI, server, and suggestion engine

use crate::calculator::{ActivityRow, ComputedRow, EmissionCalculator};
use serde::{Deserialize, Serialize};

// ============================================================================
// ROUNDING
// ============================================================================

/// Round to 2 decimal places, half away from zero.
///
/// Used for the report total and by consumers building display views
/// (tables, chart series). Per-category sums inside the report stay
/// unrounded so re-derived views don't accumulate double rounding.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

// ============================================================================
// CATEGORY AGGREGATE
// ============================================================================

/// Totals for one distinct activity label.
///
/// Keyed by the trimmed original row text, NOT the matched factor's
/// canonical name: "Electricity (Dyehouse)" and "Electricity (Looms)" stay
/// separate categories even though both resolve to the Electricity factor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryAggregate {
    /// Trimmed activity text this aggregate is keyed by
    pub activity: String,

    /// Sum of row quantities
    pub quantity: f64,

    /// Display unit: first non-empty row unit, else the matched factor's
    /// declared unit, else "unit"
    pub unit: String,

    /// Sum of row emissions, unrounded
    pub emission: f64,

    /// Contributing rows, in input order
    pub rows: Vec<ComputedRow>,
}

// ============================================================================
// EMISSION REPORT
// ============================================================================

/// Top-level output of one aggregation run.
///
/// `aggregates` is kept in first-seen order; that order is what makes the
/// ranked view stable when two categories tie on emission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmissionReport {
    /// Grand total in kg CO2e, rounded to 2 decimal places
    pub total_emission: f64,

    /// One aggregate per distinct activity label, first-seen order
    pub aggregates: Vec<CategoryAggregate>,
}

impl EmissionReport {
    /// Aggregate for an exact activity label, if present
    pub fn aggregate_for(&self, activity: &str) -> Option<&CategoryAggregate> {
        self.aggregates.iter().find(|a| a.activity == activity)
    }

    /// Aggregates ranked by emission descending.
    ///
    /// Stable sort over the first-seen order, so exact ties keep whichever
    /// category appeared first in the input as the higher rank.
    pub fn ranked(&self) -> Vec<&CategoryAggregate> {
        let mut ranked: Vec<&CategoryAggregate> = self.aggregates.iter().collect();
        ranked.sort_by(|a, b| {
            b.emission
                .partial_cmp(&a.emission)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        ranked
    }

    pub fn is_empty(&self) -> bool {
        self.aggregates.is_empty()
    }
}

// ============================================================================
// AGGREGATOR
// ============================================================================

/// Folds a materialized row sequence into an `EmissionReport`.
///
/// Pure function of its input plus the calculator's static registry:
/// calling it twice on the same sequence yields identical reports.
pub struct Aggregator {
    calculator: EmissionCalculator,
}

impl Aggregator {
    pub fn new(calculator: EmissionCalculator) -> Self {
        Aggregator { calculator }
    }

    /// Aggregator over the compiled-in factor table
    pub fn builtin() -> Self {
        Aggregator::new(EmissionCalculator::builtin())
    }

    /// Fold all rows into per-category totals and a rounded grand total.
    ///
    /// Rows the calculator skips (blank activity) affect nothing: no
    /// aggregate, no total, no ordering. Empty input produces a report
    /// with total 0.0 and no aggregates.
    pub fn aggregate(&self, rows: &[ActivityRow]) -> EmissionReport {
        let mut aggregates: Vec<CategoryAggregate> = Vec::new();
        let mut total = 0.0;

        for row in rows {
            let computed = match self.calculator.compute(row) {
                Some(computed) => computed,
                None => continue,
            };

            total += computed.emission;

            match aggregates.iter_mut().find(|a| a.activity == computed.activity) {
                Some(aggregate) => {
                    aggregate.quantity += computed.quantity;
                    aggregate.emission += computed.emission;
                    aggregate.rows.push(computed);
                }
                None => {
                    aggregates.push(CategoryAggregate {
                        activity: computed.activity.clone(),
                        quantity: computed.quantity,
                        unit: self.unit_for(&computed),
                        emission: computed.emission,
                        rows: vec![computed],
                    });
                }
            }
        }

        EmissionReport {
            total_emission: round2(total),
            aggregates,
        }
    }

    /// Unit policy on first creation of an aggregate: the row's own unit if
    /// non-blank, else the matched factor's declared unit, else "unit".
    fn unit_for(&self, computed: &ComputedRow) -> String {
        let row_unit = computed.unit.trim();
        if !row_unit.is_empty() {
            return row_unit.to_string();
        }

        self.calculator
            .registry()
            .lookup(&computed.activity)
            .map(|f| f.unit.clone())
            .unwrap_or_else(|| "unit".to_string())
    }

    pub fn calculator(&self) -> &EmissionCalculator {
        &self.calculator
    }
}

impl Default for Aggregator {
    fn default() -> Self {
        Self::builtin()
    }
}

// ============================================================================
// TESTS
// ============================================================================

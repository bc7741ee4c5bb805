// 🧮 Emission Calculator - Row-level emission computation
// One raw activity row in, one computed record out (or a skip)

use crate::factors::FactorRegistry;
use serde::{Deserialize, Serialize};

// ============================================================================
// ROW TYPES
// ============================================================================

/// A raw activity row as delivered by the ingestion collaborator.
///
/// The quantity stays textual on purpose: spreadsheets deliver values like
/// "1,234.5" and the calculator owns the lenient parse. Field-name case
/// variants (Activity/activity, Qty) are normalized upstream; by the time a
/// row reaches the core it has exactly these three fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityRow {
    pub activity: String,
    pub quantity: String,
    pub unit: String,
}

impl ActivityRow {
    pub fn new(activity: &str, quantity: &str, unit: &str) -> Self {
        ActivityRow {
            activity: activity.to_string(),
            quantity: quantity.to_string(),
            unit: unit.to_string(),
        }
    }
}

/// One retained row after calculation.
///
/// `resolved_factor` is 0.0 for activities the registry does not know:
/// unknown activities contribute zero emission, they are never an error.
/// `emission` is unrounded; rounding happens at report level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComputedRow {
    /// Trimmed activity text (aggregation key)
    pub activity: String,
    pub quantity: f64,
    pub unit: String,
    pub resolved_factor: f64,
    pub emission: f64,
}

// ============================================================================
// QUANTITY PARSING
// ============================================================================

/// Parse a spreadsheet quantity leniently.
///
/// Strips thousands-separator commas ("1,234" → 1234) and trims; anything
/// that still fails to parse as a number contributes 0 rather than aborting
/// the batch. User-supplied spreadsheet data is expected to be noisy.
pub fn parse_quantity(text: &str) -> f64 {
    let cleaned = text.replace(',', "");

    match cleaned.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => value,
        _ => 0.0,
    }
}

// ============================================================================
// EMISSION CALCULATOR
// ============================================================================

/// Turns raw rows into computed records against a fixed factor registry.
///
/// Pure: no I/O, no shared mutable state. The row's recorded unit is NOT
/// validated against the matched factor's declared unit — a row recorded in
/// tonnes is still multiplied by a per-kg factor. Unit consistency is the
/// caller's responsibility.
pub struct EmissionCalculator {
    registry: FactorRegistry,
}

impl EmissionCalculator {
    pub fn new(registry: FactorRegistry) -> Self {
        EmissionCalculator { registry }
    }

    /// Calculator over the compiled-in factor table
    pub fn builtin() -> Self {
        EmissionCalculator::new(FactorRegistry::builtin())
    }

    /// Compute one row.
    ///
    /// Returns `None` for rows with a blank activity name; those rows are
    /// skipped everywhere downstream (not an error). Otherwise the emission
    /// is `quantity * factor`, with factor 0.0 when the registry has no
    /// match.
    pub fn compute(&self, row: &ActivityRow) -> Option<ComputedRow> {
        let activity = row.activity.trim();
        if activity.is_empty() {
            return None;
        }

        let quantity = parse_quantity(&row.quantity);
        let resolved_factor = self
            .registry
            .lookup(activity)
            .map(|f| f.factor_value)
            .unwrap_or(0.0);

        Some(ComputedRow {
            activity: activity.to_string(),
            quantity,
            unit: row.unit.clone(),
            resolved_factor,
            emission: quantity * resolved_factor,
        })
    }

    /// Backing registry (for unit fallback and factor listings)
    pub fn registry(&self) -> &FactorRegistry {
        &self.registry
    }
}

impl Default for EmissionCalculator {
    fn default() -> Self {
        Self::builtin()
    }
}

// ============================================================================
// TESTS
// ============================================================================

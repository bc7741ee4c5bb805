// 🏭 Factor Registry - Emission factors as data
// Ordered table of activity sources with case-insensitive two-pass lookup

use serde::{Deserialize, Serialize};

// ============================================================================
// EMISSION FACTOR
// ============================================================================

/// A single emission factor: how many kg of CO2e one unit of an activity
/// source produces (e.g. 1 kWh of grid electricity → 0.82 kg CO2e).
///
/// Immutable once registered. `factor_value` is always >= 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmissionFactor {
    /// Canonical activity source name (e.g. "Electricity", "Diesel")
    pub source_name: String,

    /// Unit the factor is expressed per (e.g. "kWh", "litre")
    pub unit: String,

    /// kg CO2e per unit
    pub factor_value: f64,
}

impl EmissionFactor {
    pub fn new(source_name: &str, unit: &str, factor_value: f64) -> Self {
        EmissionFactor {
            source_name: source_name.to_string(),
            unit: unit.to_string(),
            factor_value,
        }
    }
}

// ============================================================================
// FACTOR REGISTRY
// ============================================================================

/// Registry of all known emission factors.
///
/// The table is ORDERED and order is significant: substring lookup returns
/// the first entry whose name is contained in the query text, so earlier
/// entries win ties deterministically. Loaded once at startup, never
/// mutated afterwards; safe to share across threads by reference.
pub struct FactorRegistry {
    factors: Vec<EmissionFactor>,
}

impl FactorRegistry {
    /// Create an empty registry (mainly for tests)
    pub fn new() -> Self {
        FactorRegistry { factors: Vec::new() }
    }

    /// Create a registry from an explicit ordered table.
    ///
    /// Source names must be unique case-insensitively; later duplicates
    /// are dropped so the first definition stays authoritative.
    pub fn from_factors(factors: Vec<EmissionFactor>) -> Self {
        let mut seen: Vec<String> = Vec::new();
        let mut table = Vec::new();

        for factor in factors {
            let key = factor.source_name.to_lowercase();
            if seen.contains(&key) {
                continue;
            }
            seen.push(key);
            table.push(factor);
        }

        FactorRegistry { factors: table }
    }

    /// Registry with the compiled-in factor table.
    ///
    /// Values are kg CO2e per unit for the common industrial activity
    /// sources the breakdown reports know about. Table order matters:
    /// see `lookup`.
    pub fn builtin() -> Self {
        FactorRegistry::from_factors(vec![
            EmissionFactor::new("Electricity", "kWh", 0.82),
            EmissionFactor::new("Diesel", "litre", 2.68),
            EmissionFactor::new("Petrol", "litre", 2.31),
            EmissionFactor::new("Natural Gas", "scm", 1.89),
            EmissionFactor::new("LPG", "kg", 2.98),
            EmissionFactor::new("Coal", "kg", 2.42),
            EmissionFactor::new("Furnace Oil", "litre", 3.15),
            EmissionFactor::new("Waste", "kg", 1.90),
            EmissionFactor::new("Water", "kL", 0.34),
        ])
    }

    /// Look up the factor for a recorded activity name.
    ///
    /// Two passes, first match wins:
    /// 1. Exact match on the lowercased source name.
    /// 2. First table entry whose lowercased name is a substring of the
    ///    normalized text ("diesel generator" matches "Diesel").
    ///
    /// Blank text and unknown activities return `None`; the calculator
    /// treats that as a zero factor rather than an error.
    pub fn lookup(&self, activity_text: &str) -> Option<&EmissionFactor> {
        let normalized = activity_text.trim().to_lowercase();

        if normalized.is_empty() {
            return None;
        }

        // Pass 1: exact match
        if let Some(factor) = self
            .factors
            .iter()
            .find(|f| f.source_name.to_lowercase() == normalized)
        {
            return Some(factor);
        }

        // Pass 2: substring match, table order
        self.factors
            .iter()
            .find(|f| normalized.contains(&f.source_name.to_lowercase()))
    }

    /// Full table, in registry order
    pub fn factors(&self) -> &[EmissionFactor] {
        &self.factors
    }

    /// Number of factors loaded
    pub fn factor_count(&self) -> usize {
        self.factors.len()
    }
}

impl Default for FactorRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_lookup_is_case_insensitive() {
        let registry = FactorRegistry::builtin();

        let factor = registry.lookup("electricity").unwrap();
        assert_eq!(factor.source_name, "Electricity");
        assert_eq!(factor.factor_value, 0.82);

        let factor = registry.lookup("  DIESEL  ").unwrap();
        assert_eq!(factor.source_name, "Diesel");
    }

    #[test]
    fn test_substring_lookup() {
        let registry = FactorRegistry::builtin();

        let factor = registry.lookup("Diesel Generator").unwrap();
        assert_eq!(factor.source_name, "Diesel");

        let factor = registry.lookup("Electricity (Dyehouse)").unwrap();
        assert_eq!(factor.source_name, "Electricity");
    }

    #[test]
    fn test_substring_tie_breaks_by_table_order() {
        let registry = FactorRegistry::from_factors(vec![
            EmissionFactor::new("Electricity", "kWh", 0.82),
            EmissionFactor::new("Diesel", "litre", 2.68),
        ]);

        // Both names are contained; the first table entry wins.
        let factor = registry.lookup("electricity diesel blend").unwrap();
        assert_eq!(factor.source_name, "Electricity");
    }

    #[test]
    fn test_blank_and_unknown_return_none() {
        let registry = FactorRegistry::builtin();

        assert!(registry.lookup("").is_none());
        assert!(registry.lookup("   ").is_none());
        assert!(registry.lookup("Rainwater").is_none());
    }

    #[test]
    fn test_duplicate_names_keep_first_definition() {
        let registry = FactorRegistry::from_factors(vec![
            EmissionFactor::new("Diesel", "litre", 2.68),
            EmissionFactor::new("diesel", "litre", 9.99),
        ]);

        assert_eq!(registry.factor_count(), 1);
        assert_eq!(registry.lookup("diesel").unwrap().factor_value, 2.68);
    }
}

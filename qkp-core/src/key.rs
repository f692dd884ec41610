//! Benchmark keys: the join column between generated/parsed instances and
//! scraped reference values.

use std::fmt;

/// Identifies one instance variant across generation, parsing and lookup.
///
/// `variant` is kept as text because some sources label densities with
/// suffixes (e.g. `50(1)`). `budget_level` is set only for suites that fan one
/// matrix out into several capacity levels.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BenchmarkKey {
    pub item_count: u32,
    pub variant: String,
    pub instance_index: u32,
    pub budget_level: Option<u32>,
}

impl BenchmarkKey {
    pub fn new(item_count: u32, variant: impl Into<String>, instance_index: u32) -> Self {
        Self {
            item_count,
            variant: variant.into(),
            instance_index,
            budget_level: None,
        }
    }

    /// Same instance at a specific budget level (per mille).
    pub fn with_budget_level(&self, level: u32) -> Self {
        Self {
            budget_level: Some(level),
            ..self.clone()
        }
    }

    /// Output file name, e.g. `large_qkp_500_5_0_25.txt` for prefix `large_qkp_`.
    pub fn file_name(&self, prefix: &str) -> String {
        match self.budget_level {
            Some(level) => format!(
                "{}{}_{}_{}_{}.txt",
                prefix, self.item_count, self.variant, self.instance_index, level
            ),
            None => format!(
                "{}{}_{}_{}.txt",
                prefix, self.item_count, self.variant, self.instance_index
            ),
        }
    }
}

impl fmt::Display for BenchmarkKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "n={} variant={} index={}",
            self.item_count, self.variant, self.instance_index
        )?;
        if let Some(level) = self.budget_level {
            write!(f, " budget={}", level)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_names() {
        let key = BenchmarkKey::new(100, "25", 3);
        assert_eq!(key.file_name(""), "100_25_3.txt");
        assert_eq!(
            key.with_budget_level(250).file_name("large_qkp_"),
            "large_qkp_100_25_3_250.txt"
        );
    }

    #[test]
    fn test_budget_level_distinguishes_keys() {
        let key = BenchmarkKey::new(500, "5", 0);
        assert_ne!(key.with_budget_level(25), key.with_budget_level(50));
        assert_ne!(key, key.with_budget_level(25));
        assert_eq!(key.with_budget_level(25).to_string(), "n=500 variant=5 index=0 budget=25");
    }
}

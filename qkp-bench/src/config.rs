//! Runner configuration.
//!
//! Loaded from an optional JSON file; any field left out takes its default.
//! Command-line flags are applied on top by `main`.

use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use qkp_core::Region;
use serde::{Deserialize, Serialize};

use crate::suites::SuiteName;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchConfig {
    /// Suite output directories are created under this root
    pub output_root: PathBuf,
    /// Downloads and extracted archives
    pub cache_dir: PathBuf,
    /// Worker threads (0 = available parallelism)
    pub workers: usize,
    /// Attempts per download
    pub retries: u32,
    /// Per-download timeout in seconds
    pub timeout_secs: u64,
    /// Base seed for synthesized suites
    pub synth_seed: u64,
    /// Keep raw payloads after a successful build
    pub keep_raw: bool,
    /// Region-table crop overrides, keyed by suite name
    pub regions: HashMap<String, Region>,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            output_root: PathBuf::from("."),
            cache_dir: default_cache_dir(),
            workers: 0,
            retries: 3,
            timeout_secs: 60,
            synth_seed: 24,
            keep_raw: false,
            regions: HashMap::new(),
        }
    }
}

fn default_cache_dir() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(".cache").join("qkp-bench")
}

impl BenchConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path.as_ref())
            .with_context(|| format!("Failed to open config {}", path.as_ref().display()))?;
        let config: Self = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("Failed to parse config {}", path.as_ref().display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.retries == 0 {
            bail!("retries must be at least 1");
        }
        if self.timeout_secs == 0 {
            bail!("timeout_secs must be positive");
        }
        for (name, region) in &self.regions {
            if region.top >= region.bottom || region.left >= region.right {
                bail!("empty crop region for suite '{}'", name);
            }
        }
        Ok(())
    }

    pub fn region_for(&self, suite: SuiteName, default: Region) -> Region {
        self.regions.get(suite.as_str()).copied().unwrap_or(default)
    }

    pub fn suite_cache(&self, suite: SuiteName) -> PathBuf {
        self.cache_dir.join(suite.as_str())
    }
}

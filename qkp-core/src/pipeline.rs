//! Per-unit conversions used by batch drivers.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::canonical::{canonicalize, write_canonical};
use crate::error::QkpResult;
use crate::extract::ReferenceTable;
use crate::instance::{CanonicalInstance, Instance};
use crate::key::BenchmarkKey;
use crate::raw::RawFormat;
use crate::synth::{fan_out, synthesize_seeded, SynthParams};

/// Where canonical files go and how they are named.
#[derive(Debug, Clone)]
pub struct OutputSpec {
    pub dir: PathBuf,
    pub prefix: String,
}

impl OutputSpec {
    pub fn new(dir: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            prefix: prefix.into(),
        }
    }

    pub fn path_for(&self, key: &BenchmarkKey) -> PathBuf {
        self.dir.join(key.file_name(&self.prefix))
    }
}

/// Parse one raw dump and attach its reference objective.
pub fn convert_raw(
    key: &BenchmarkKey,
    text: &str,
    format: RawFormat,
    references: &ReferenceTable,
) -> QkpResult<CanonicalInstance> {
    let raw = format.parse(text)?;
    let instance = Instance::new(key.clone(), Arc::new(raw.matrix), raw.budget);
    canonicalize(instance, references)
}

pub fn convert_raw_file(
    key: &BenchmarkKey,
    path: &Path,
    format: RawFormat,
    references: &ReferenceTable,
    output: &OutputSpec,
) -> QkpResult<PathBuf> {
    let text = std::fs::read_to_string(path)?;
    let canonical = convert_raw(key, &text, format, references)?;
    write_canonical(&output.dir, &output.prefix, &canonical)
}

/// Synthesize one matrix and emit one file per budget level. Every level's
/// reference is resolved before anything is written.
pub fn synthesize_levels(
    key: &BenchmarkKey,
    params: &SynthParams,
    levels: &[u32],
    references: &ReferenceTable,
    output: &OutputSpec,
) -> QkpResult<Vec<PathBuf>> {
    let matrix = Arc::new(synthesize_seeded(params)?);
    let canonical = fan_out(key, matrix, levels)?
        .into_iter()
        .map(|instance| canonicalize(instance, references))
        .collect::<QkpResult<Vec<_>>>()?;

    canonical
        .iter()
        .map(|c| write_canonical(&output.dir, &output.prefix, c))
        .collect()
}

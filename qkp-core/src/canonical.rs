//! Canonical instance files.
//!
//! ```text
//! <item_count> <edge_count> <value_kind>
//! <i> <j> <utility>              edge_count lines, utility with 6 decimals
//! <w_0> <w_1> ... <w_{n-1}>
//! <budget>
//! <best_known_objective>
//! ```
//!
//! Files are rendered fully in memory and persisted through a temporary file
//! in the destination directory, so a failed instance never leaves a partial
//! file behind.

use std::fmt::Write as _;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::NamedTempFile;

use crate::error::{QkpError, QkpResult};
use crate::extract::ReferenceTable;
use crate::instance::{CanonicalInstance, Edge, Instance, UtilityMatrix, ValueKind};
use crate::key::BenchmarkKey;

/// Attach the reference objective for `instance.key`. Never substitutes a
/// placeholder when the key is missing.
pub fn canonicalize(instance: Instance, references: &ReferenceTable) -> QkpResult<CanonicalInstance> {
    let entry = references.lookup(&instance.key)?;
    Ok(CanonicalInstance {
        best_known_objective: entry.best_known_objective,
        instance,
    })
}

pub fn render(canonical: &CanonicalInstance) -> String {
    let matrix = &canonical.instance.matrix;
    // ~16 bytes per edge line
    let mut out = String::with_capacity(32 + matrix.edges.len() * 16 + matrix.weights.len() * 3);

    let _ = writeln!(out, "{} {} {}", matrix.item_count, matrix.edges.len(), matrix.kind);
    for e in &matrix.edges {
        let _ = writeln!(out, "{} {} {:.6}", e.i, e.j, e.utility);
    }
    let weights: Vec<String> = matrix.weights.iter().map(|w| w.to_string()).collect();
    out.push_str(&weights.join(" "));
    out.push('\n');
    let _ = writeln!(out, "{}", canonical.instance.budget);
    let _ = writeln!(out, "{}", canonical.best_known_objective);
    out
}

/// Atomically write `contents` to `<dir>/<file_name>`.
pub fn write_atomic(dir: &Path, file_name: &str, contents: &[u8]) -> QkpResult<PathBuf> {
    let target = dir.join(file_name);
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(contents)?;
    tmp.flush()?;
    tmp.persist(&target).map_err(|e| QkpError::Io(e.error))?;
    Ok(target)
}

pub fn write_canonical(dir: &Path, prefix: &str, canonical: &CanonicalInstance) -> QkpResult<PathBuf> {
    let name = canonical.key().file_name(prefix);
    write_atomic(dir, &name, render(canonical).as_bytes())
}

/// Contents of a canonical file as read back from disk.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalFile {
    pub matrix: UtilityMatrix,
    pub budget: u32,
    pub best_known_objective: i64,
}

impl CanonicalFile {
    /// Rebind to a key, e.g. to re-render under a different name.
    pub fn into_canonical(self, key: BenchmarkKey) -> CanonicalInstance {
        CanonicalInstance {
            instance: Instance::new(key, Arc::new(self.matrix), self.budget),
            best_known_objective: self.best_known_objective,
        }
    }
}

pub fn parse(text: &str) -> QkpResult<CanonicalFile> {
    let mut lines = text.lines().enumerate();
    let mut next = |what: &str| {
        lines
            .next()
            .map(|(i, l)| (i + 1, l))
            .ok_or_else(|| QkpError::format(0, format!("unexpected end of file, expected {}", what)))
    };

    let (line_no, header) = next("header")?;
    let parts: Vec<&str> = header.split_whitespace().collect();
    if parts.len() != 3 {
        return Err(QkpError::format(line_no, "header should have 3 fields"));
    }
    let item_count: u32 = num(parts[0], line_no)?;
    let edge_count: usize = num(parts[1], line_no)?;
    let kind: ValueKind = parts[2].parse().map_err(|e: String| QkpError::format(line_no, e))?;

    // The header count is untrusted; each edge line takes at least 6 bytes.
    let mut edges = Vec::with_capacity(edge_count.min(text.len() / 6));
    for _ in 0..edge_count {
        let (line_no, line) = next("edge")?;
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() != 3 {
            return Err(QkpError::format(line_no, "edge line should have 3 fields"));
        }
        edges.push(Edge::new(num(parts[0], line_no)?, num(parts[1], line_no)?, num(parts[2], line_no)?));
    }

    let (line_no, line) = next("weights")?;
    let weights = line
        .split_whitespace()
        .map(|t| num(t, line_no))
        .collect::<QkpResult<Vec<u32>>>()?;

    let (line_no, line) = next("budget")?;
    let budget = num(line.trim(), line_no)?;
    let (line_no, line) = next("objective")?;
    let best_known_objective = num(line.trim(), line_no)?;

    Ok(CanonicalFile {
        matrix: UtilityMatrix::new(item_count, edges, weights, kind)?,
        budget,
        best_known_objective,
    })
}

pub fn read_file<P: AsRef<Path>>(path: P) -> QkpResult<CanonicalFile> {
    parse(&std::fs::read_to_string(path.as_ref())?)
}

fn num<T: std::str::FromStr>(token: &str, line_no: usize) -> QkpResult<T> {
    token
        .parse()
        .map_err(|_| QkpError::format(line_no, format!("invalid number '{}'", token)))
}

/// `instance,algorithm,gap,runtime` rows; absent values are empty fields.
pub fn render_comparison_csv(references: &ReferenceTable, prefix: &str) -> String {
    let mut out = String::from("instance,algorithm,gap,runtime\n");
    let cell = |v: Option<f64>| v.map(|x| x.to_string()).unwrap_or_default();
    for (key, entry) in references.iter() {
        let name = key.file_name(prefix);
        for result in &entry.comparison {
            let _ = writeln!(
                out,
                "{},{},{},{}",
                name,
                result.algorithm,
                cell(result.gap),
                cell(result.runtime)
            );
        }
    }
    out
}

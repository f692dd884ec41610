//! In-memory instance model.
//!
//! A [`UtilityMatrix`] holds the sparse utilities and item weights produced by
//! the synthesizer or a raw-format parser. An [`Instance`] pairs a matrix with
//! one capacity, and a [`CanonicalInstance`] adds the externally sourced
//! best-known objective. Each stage is built once and never mutated.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::error::{QkpError, QkpResult};
use crate::key::BenchmarkKey;

/// One sparse utility entry. `i == j` is a linear utility, `i < j` a pairwise one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    pub i: u32,
    pub j: u32,
    pub utility: f64,
}

impl Edge {
    pub fn new(i: u32, j: u32, utility: f64) -> Self {
        Self { i, j, utility }
    }

    pub fn is_linear(&self) -> bool {
        self.i == self.j
    }
}

/// Provenance tag written in the canonical header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Int,
    Float,
}

impl ValueKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueKind::Int => "int",
            ValueKind::Float => "float",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ValueKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "int" => Ok(ValueKind::Int),
            "float" => Ok(ValueKind::Float),
            other => Err(format!("unknown value kind '{}'", other)),
        }
    }
}

/// Sparse utilities plus item weights.
#[derive(Debug, Clone, PartialEq)]
pub struct UtilityMatrix {
    pub item_count: u32,
    pub edges: Vec<Edge>,
    pub weights: Vec<u32>,
    pub kind: ValueKind,
}

impl UtilityMatrix {
    /// Build a matrix and check the sparse-encoding invariants.
    pub fn new(item_count: u32, edges: Vec<Edge>, weights: Vec<u32>, kind: ValueKind) -> QkpResult<Self> {
        let matrix = Self {
            item_count,
            edges,
            weights,
            kind,
        };
        matrix.validate()?;
        Ok(matrix)
    }

    pub fn validate(&self) -> QkpResult<()> {
        if self.weights.len() != self.item_count as usize {
            return Err(QkpError::InvalidInstance(format!(
                "{} weights for {} items",
                self.weights.len(),
                self.item_count
            )));
        }

        let mut seen = HashSet::with_capacity(self.edges.len());
        for edge in &self.edges {
            if edge.i > edge.j || edge.j >= self.item_count {
                return Err(QkpError::InvalidInstance(format!(
                    "edge ({}, {}) outside upper triangle of {} items",
                    edge.i, edge.j, self.item_count
                )));
            }
            if edge.utility == 0.0 {
                return Err(QkpError::InvalidInstance(format!(
                    "edge ({}, {}) has zero utility",
                    edge.i, edge.j
                )));
            }
            if !seen.insert((edge.i, edge.j)) {
                return Err(QkpError::InvalidInstance(format!(
                    "duplicate edge ({}, {})",
                    edge.i, edge.j
                )));
            }
        }
        Ok(())
    }

    pub fn total_weight(&self) -> u64 {
        self.weights.iter().map(|&w| w as u64).sum()
    }

    pub fn linear_count(&self) -> usize {
        self.edges.iter().filter(|e| e.is_linear()).count()
    }
}

/// A matrix with one capacity. Several instances may share one matrix.
#[derive(Debug, Clone)]
pub struct Instance {
    pub key: BenchmarkKey,
    pub matrix: Arc<UtilityMatrix>,
    pub budget: u32,
}

impl Instance {
    pub fn new(key: BenchmarkKey, matrix: Arc<UtilityMatrix>, budget: u32) -> Self {
        Self { key, matrix, budget }
    }
}

/// An instance enriched with its reference objective, ready to serialize.
#[derive(Debug, Clone)]
pub struct CanonicalInstance {
    pub instance: Instance,
    pub best_known_objective: i64,
}

impl CanonicalInstance {
    pub fn key(&self) -> &BenchmarkKey {
        &self.instance.key
    }
}

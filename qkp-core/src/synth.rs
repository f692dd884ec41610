//! Seeded synthesis of random QKP utility matrices.
//!
//! Draw order is part of the output contract:
//!   1. `n * n` utilities in `[1, 100]`, row-major
//!   2. `n * n` mask values in `[0, 1)`, row-major
//!   3. `n` weights in `[1, 50]`
//!
//! The utility matrix is symmetrized from its lower triangle before masking,
//! so entry `(i, j)` with `i <= j` takes the raw value drawn at `(j, i)` and
//! the mask value drawn at `(i, j)`.

use std::sync::Arc;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::error::{QkpError, QkpResult};
use crate::instance::{Edge, Instance, UtilityMatrix, ValueKind};
use crate::key::BenchmarkKey;

pub const UTILITY_RANGE: (u8, u8) = (1, 100);
pub const WEIGHT_RANGE: (u32, u32) = (1, 50);

/// Parameters that fully determine a synthesized matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SynthParams {
    pub item_count: u32,
    pub density_percent: u32,
    pub seed: u64,
}

impl SynthParams {
    pub fn new(item_count: u32, density_percent: u32, seed: u64) -> Self {
        Self {
            item_count,
            density_percent,
            seed,
        }
    }

    fn validate(&self) -> QkpResult<()> {
        if self.item_count == 0 {
            return Err(QkpError::InvalidInstance("item_count must be positive".into()));
        }
        if self.density_percent > 100 {
            return Err(QkpError::InvalidInstance(format!(
                "density {}% exceeds 100%",
                self.density_percent
            )));
        }
        Ok(())
    }
}

/// Synthesize with a generator seeded from `params.seed`.
pub fn synthesize_seeded(params: &SynthParams) -> QkpResult<UtilityMatrix> {
    let mut rng = ChaCha8Rng::seed_from_u64(params.seed);
    synthesize(params, &mut rng)
}

/// Synthesize from a caller-owned stream. `params.seed` is ignored here; the
/// stream is the only source of randomness.
pub fn synthesize<R: Rng + ?Sized>(params: &SynthParams, rng: &mut R) -> QkpResult<UtilityMatrix> {
    params.validate()?;
    let n = params.item_count as usize;

    // Only the lower triangle (i >= j) survives symmetrization.
    let mut lower = vec![0u8; n * (n + 1) / 2];
    for i in 0..n {
        for j in 0..n {
            let v: u8 = rng.gen_range(UTILITY_RANGE.0..=UTILITY_RANGE.1);
            if j <= i {
                lower[tri_index(i, j)] = v;
            }
        }
    }

    let threshold = params.density_percent as f64 / 100.0;
    let mut edges = Vec::new();
    for i in 0..n {
        for j in 0..n {
            let keep = rng.gen::<f64>() < threshold;
            if j >= i && keep {
                let utility = lower[tri_index(j, i)];
                edges.push(Edge::new(i as u32, j as u32, utility as f64));
            }
        }
    }

    let weights: Vec<u32> = (0..n)
        .map(|_| rng.gen_range(WEIGHT_RANGE.0..=WEIGHT_RANGE.1))
        .collect();

    log::debug!(
        "synthesized n={} density={}% edges={}",
        n,
        params.density_percent,
        edges.len()
    );

    UtilityMatrix::new(params.item_count, edges, weights, ValueKind::Float)
}

#[inline]
fn tri_index(row: usize, col: usize) -> usize {
    debug_assert!(col <= row);
    row * (row + 1) / 2 + col
}

/// Capacity for a per-mille budget level: `floor(level * sum(weights) / 1000)`.
pub fn derive_budget(weights: &[u32], level_per_mille: u32) -> QkpResult<u32> {
    let total: u64 = weights.iter().map(|&w| w as u64).sum();
    let budget = level_per_mille as u64 * total / 1000;
    u32::try_from(budget).map_err(|_| {
        QkpError::InvalidInstance(format!(
            "budget {} at level {} overflows u32",
            budget, level_per_mille
        ))
    })
}

/// One instance per budget level, all sharing `matrix`.
pub fn fan_out(
    key: &BenchmarkKey,
    matrix: Arc<UtilityMatrix>,
    levels: &[u32],
) -> QkpResult<Vec<Instance>> {
    levels
        .iter()
        .map(|&level| {
            let budget = derive_budget(&matrix.weights, level)?;
            Ok(Instance::new(key.with_budget_level(level), Arc::clone(&matrix), budget))
        })
        .collect()
}

/// Per-instance seed so every unit owns an independent, order-free stream.
pub fn instance_seed(base_seed: u64, item_count: u32, density_percent: u32, index: u32) -> u64 {
    let mut z = base_seed
        ^ ((item_count as u64) << 32)
        ^ ((density_percent as u64) << 16)
        ^ index as u64;
    // splitmix64 finalizer
    z = z.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

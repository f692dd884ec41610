//! Parallel per-instance driver.
//!
//! Units are independent: each one converts and writes its own files and
//! either succeeds or fails on its own. A failed unit is recorded with its
//! key and the rest of the batch continues.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use rayon::prelude::*;

use crate::error::QkpResult;
use crate::key::BenchmarkKey;

/// Outcome of one failed unit.
#[derive(Debug, Clone)]
pub struct UnitFailure {
    pub key: BenchmarkKey,
    pub message: String,
}

/// Result of running a batch.
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    /// Files written, in unit order
    pub written: Vec<PathBuf>,
    /// Units that failed
    pub failures: Vec<UnitFailure>,
    /// Units never started because the batch was stopped
    pub skipped: usize,
    /// Wall time in milliseconds
    pub elapsed_ms: f64,
}

impl BatchReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty() && self.skipped == 0
    }
}

/// Runs units on a bounded worker pool.
#[derive(Debug, Clone)]
pub struct BatchDriver {
    workers: usize,
    stop: Arc<AtomicBool>,
}

impl Default for BatchDriver {
    fn default() -> Self {
        Self::new(0)
    }
}

enum UnitOutcome {
    Done(Vec<PathBuf>),
    Failed(UnitFailure),
    Skipped,
}

impl BatchDriver {
    /// `workers == 0` uses the available parallelism.
    pub fn new(workers: usize) -> Self {
        Self {
            workers,
            stop: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Handle that stops scheduling new units when set. In-flight units finish.
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    pub fn run<U, F>(&self, units: Vec<(BenchmarkKey, U)>, work: F) -> QkpResult<BatchReport>
    where
        U: Send,
        F: Fn(&BenchmarkKey, U) -> QkpResult<Vec<PathBuf>> + Sync,
    {
        let start = Instant::now();
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .build()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;

        let total = units.len();
        let outcomes: Vec<UnitOutcome> = pool.install(|| {
            units
                .into_par_iter()
                .map(|(key, unit)| {
                    if self.stop.load(Ordering::Relaxed) {
                        return UnitOutcome::Skipped;
                    }
                    match work(&key, unit) {
                        Ok(paths) => {
                            log::debug!("{}: wrote {} file(s)", key, paths.len());
                            UnitOutcome::Done(paths)
                        }
                        Err(e) => {
                            log::warn!("{}: {}", key, e);
                            UnitOutcome::Failed(UnitFailure {
                                key,
                                message: e.to_string(),
                            })
                        }
                    }
                })
                .collect()
        });

        let mut report = BatchReport::default();
        for outcome in outcomes {
            match outcome {
                UnitOutcome::Done(paths) => report.written.extend(paths),
                UnitOutcome::Failed(f) => report.failures.push(f),
                UnitOutcome::Skipped => report.skipped += 1,
            }
        }
        report.elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;

        log::info!(
            "batch: {} units, {} files written, {} failed, {} skipped in {:.1} ms",
            total,
            report.written.len(),
            report.failures.len(),
            report.skipped,
            report.elapsed_ms
        );
        Ok(report)
    }
}

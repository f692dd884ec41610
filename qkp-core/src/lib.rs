//! Canonical quadratic knapsack (QKP) benchmark instances.
//!
//! Turns third-party QKP material into one uniform instance file format:
//!
//! - **Raw dumps** of dense symmetric utility matrices in several
//!   source-specific layouts ([`raw`])
//! - **Synthetic instances** drawn from a seeded stream ([`synth`])
//! - **Reference values** (best-known objectives, competitor gaps and
//!   runtimes) scraped from paged result documents ([`extract`])
//!
//! Each instance is joined with its reference value by [`BenchmarkKey`] and
//! written in the canonical layout described in [`canonical`]. Conversion is
//! pure per instance; [`batch`] runs units in parallel and isolates failures.
//!
//! # Example
//!
//! ```
//! use qkp_core::{canonical, BenchmarkKey, RawFormat, ReferenceEntry, ReferenceTable};
//!
//! let key = BenchmarkKey::new(3, "25", 1);
//! let mut refs = ReferenceTable::new();
//! refs.insert(key.clone(), ReferenceEntry { best_known_objective: 62, comparison: vec![] })?;
//!
//! let raw = "3\n10 20 30\n5 0\n7\n\n\n6\n4 4 4\n";
//! let inst = qkp_core::pipeline::convert_raw(&key, raw, RawFormat::GroupII, &refs)?;
//! assert!(canonical::render(&inst).starts_with("3 5 int\n"));
//! # Ok::<(), qkp_core::QkpError>(())
//! ```

pub mod batch;
pub mod canonical;
pub mod cells;
pub mod error;
pub mod extract;
pub mod instance;
pub mod key;
pub mod page;
pub mod pipeline;
pub mod raw;
pub mod synth;

pub use batch::{BatchDriver, BatchReport, UnitFailure};
pub use error::{QkpError, QkpResult};
pub use extract::{
    AlgorithmResult, LineScanLayout, ReferenceEntry, ReferenceTable, RegionTableLayout, QKP_ALGORITHMS,
};
pub use instance::{CanonicalInstance, Edge, Instance, UtilityMatrix, ValueKind};
pub use key::BenchmarkKey;
pub use page::{LayoutDocument, LayoutPage, Page, PageDocument, Region};
pub use pipeline::OutputSpec;
pub use raw::{RawFormat, RawInstance, RawLayout};
pub use synth::{derive_budget, SynthParams};

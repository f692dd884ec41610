//! Command-line driver for building canonical QKP benchmark suites.
//!
//! ```bash
//! # Full pipeline for one suite
//! qkp-bench build group2 --out data/
//!
//! # Offline, from local copies
//! qkp-bench build standard --results Standard-QKP_detailed_results.pdf --raw-dir raw/
//!
//! # Single files
//! qkp-bench convert --format group3 5000_25_1.txt --objective 123456 -o 5000_25_1.txt
//! qkp-bench synth --items 500 --density 5 --level 250 --objective 4242 -o x.txt
//! qkp-bench inspect data/QKPGroupII/1000_25_1.txt
//! ```

mod archive;
mod config;
mod document;
mod fetch;
mod runner;
mod suites;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use qkp_core::canonical::{self, render_comparison_csv, write_atomic};
use qkp_core::synth::{fan_out, synthesize_seeded};
use qkp_core::{BatchReport, BenchmarkKey, CanonicalInstance, Instance, RawFormat, SynthParams};

use config::BenchConfig;
use runner::BuildOptions;
use suites::{Suite, SuiteName};

#[derive(Parser, Debug)]
#[command(name = "qkp-bench")]
#[command(about = "Build canonical quadratic knapsack benchmark instances")]
#[command(version)]
struct Cli {
    /// JSON configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch, extract and convert a whole suite
    Build {
        #[arg(value_enum)]
        suite: SuiteName,
        /// Local results document instead of downloading it
        #[arg(long)]
        results: Option<PathBuf>,
        /// Directory already holding the raw dumps
        #[arg(long)]
        raw_dir: Option<PathBuf>,
        /// Output root (overrides config)
        #[arg(long)]
        out: Option<PathBuf>,
        /// Worker threads (overrides config)
        #[arg(long)]
        workers: Option<usize>,
        /// Keep downloaded raw payloads
        #[arg(long)]
        keep_raw: bool,
    },
    /// Convert one raw dump
    Convert {
        /// standard, group2 or group3
        #[arg(long)]
        format: RawFormat,
        input: PathBuf,
        /// Best-known objective to attach
        #[arg(long)]
        objective: i64,
        #[arg(long, default_value = "0")]
        variant: String,
        #[arg(long, default_value_t = 0)]
        index: u32,
        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Synthesize one instance
    Synth {
        #[arg(long)]
        items: u32,
        /// Percentage of nonzero utilities
        #[arg(long)]
        density: u32,
        /// Seed (defaults to the configured synth_seed)
        #[arg(long)]
        seed: Option<u64>,
        /// Budget level, per mille of total weight
        #[arg(long)]
        level: u32,
        #[arg(long)]
        objective: i64,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print a summary of a canonical file
    Inspect { path: PathBuf },
    /// Print a suite's reference table as CSV
    Extract {
        #[arg(value_enum)]
        suite: SuiteName,
        #[arg(long)]
        results: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();

    let mut config = match &cli.config {
        Some(path) => BenchConfig::load(path)?,
        None => BenchConfig::default(),
    };

    match cli.command {
        Command::Build {
            suite,
            results,
            raw_dir,
            out,
            workers,
            keep_raw,
        } => {
            if let Some(out) = out {
                config.output_root = out;
            }
            if let Some(workers) = workers {
                config.workers = workers;
            }
            config.keep_raw |= keep_raw;

            let suite = Suite::get(suite);
            let options = BuildOptions { results, raw_dir };
            let report = runner::build_suite(&suite, &config, &options)?;
            print_summary(suite.name, &report);
            if !report.is_success() {
                bail!(
                    "{} instance(s) failed, {} skipped",
                    report.failures.len(),
                    report.skipped
                );
            }
        }
        Command::Convert {
            format,
            input,
            objective,
            variant,
            index,
            output,
        } => {
            let raw = format
                .parse_file(&input)
                .with_context(|| format!("Failed to parse {}", input.display()))?;
            let key = BenchmarkKey::new(raw.matrix.item_count, variant, index);
            let canonical = CanonicalInstance {
                instance: Instance::new(key, Arc::new(raw.matrix), raw.budget),
                best_known_objective: objective,
            };
            emit(&canonical, output.as_deref())?;
        }
        Command::Synth {
            items,
            density,
            seed,
            level,
            objective,
            output,
        } => {
            let params = SynthParams::new(items, density, seed.unwrap_or(config.synth_seed));
            let matrix = Arc::new(synthesize_seeded(&params)?);
            let key = BenchmarkKey::new(items, density.to_string(), 0);
            let instance = fan_out(&key, matrix, &[level])?
                .pop()
                .context("no instance produced")?;
            let canonical = CanonicalInstance {
                instance,
                best_known_objective: objective,
            };
            emit(&canonical, output.as_deref())?;
        }
        Command::Inspect { path } => {
            let file = canonical::read_file(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let m = &file.matrix;
            println!("File:             {}", path.display());
            println!("Items (n):        {}", m.item_count);
            println!("Utilities:        {} ({} linear)", m.edges.len(), m.linear_count());
            println!("Value kind:       {}", m.kind);
            println!("Total weight:     {}", m.total_weight());
            println!("Budget:           {}", file.budget);
            println!("Best objective:   {}", file.best_known_objective);
        }
        Command::Extract { suite, results } => {
            let suite = Suite::get(suite);
            let doc = runner::results_document(&suite, &config, results.as_deref())?;
            let refs = runner::extract_references(&suite, &config, &doc)?;
            println!("instance,best_known_objective");
            for (key, entry) in refs.iter() {
                println!("{},{}", key.file_name(suite.file_prefix), entry.best_known_objective);
            }
            if refs.has_comparisons() {
                println!();
                print!("{}", render_comparison_csv(&refs, suite.file_prefix));
            }
        }
    }
    Ok(())
}

/// Write a canonical instance to `output`, or stdout.
fn emit(instance: &CanonicalInstance, output: Option<&Path>) -> Result<()> {
    let text = canonical::render(instance);
    match output {
        Some(path) => {
            let dir = match path.parent() {
                Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
                _ => PathBuf::from("."),
            };
            let name = path
                .file_name()
                .and_then(|n| n.to_str())
                .with_context(|| format!("invalid output path {}", path.display()))?;
            let written = write_atomic(&dir, name, text.as_bytes())?;
            log::info!("Wrote {}", written.display());
        }
        None => print!("{}", text),
    }
    Ok(())
}

fn print_summary(suite: SuiteName, report: &BatchReport) {
    println!("\n{}", "=".repeat(60));
    println!("Suite {} summary", suite.as_str());
    println!("{}", "=".repeat(60));
    println!("Files written:    {}", report.written.len());
    println!("Failed:           {}", report.failures.len());
    println!("Skipped:          {}", report.skipped);
    println!("Total time:       {:.2}s", report.elapsed_ms / 1000.0);
    println!("{}", "=".repeat(60));

    for failure in &report.failures {
        eprintln!("FAILED {}: {}", failure.key, failure.message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_convert() {
        let cli = Cli::try_parse_from([
            "qkp-bench",
            "convert",
            "--format",
            "group2",
            "raw.dat",
            "--objective",
            "62",
        ])
        .unwrap();
        match cli.command {
            Command::Convert { format, objective, .. } => {
                assert_eq!(format, RawFormat::GroupII);
                assert_eq!(objective, 62);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_emit_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let params = SynthParams::new(4, 50, 7);
        let matrix = Arc::new(synthesize_seeded(&params).unwrap());
        let key = BenchmarkKey::new(4, "50", 0);
        let instance = fan_out(&key, matrix, &[500]).unwrap().pop().unwrap();
        let canonical = CanonicalInstance {
            instance,
            best_known_objective: 10,
        };
        let path = dir.path().join("x.txt");
        emit(&canonical, Some(&path)).unwrap();
        let back = canonical::read_file(&path).unwrap();
        assert_eq!(back.best_known_objective, 10);
        assert_eq!(back.matrix.item_count, 4);
    }
}

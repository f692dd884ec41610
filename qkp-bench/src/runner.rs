//! Suite build: fetch, extract references, convert every instance.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use qkp_core::canonical::{render_comparison_csv, write_atomic};
use qkp_core::pipeline::{convert_raw_file, synthesize_levels};
use qkp_core::synth::instance_seed;
use qkp_core::{
    BatchDriver, BatchReport, BenchmarkKey, LayoutDocument, LineScanLayout, OutputSpec, QkpError,
    ReferenceTable, RegionTableLayout, SynthParams,
};

use crate::archive::{extract_archive, extract_nested, index_files};
use crate::config::BenchConfig;
use crate::document::load_document;
use crate::fetch::{fetch_cached, FetchPolicy};
use crate::suites::{ReferenceKind, Source, Suite, LARGE_BUDGET_LEVELS, LARGE_GRID};

/// Per-run inputs that bypass the download step.
#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    /// Local results document (PDF or layout text)
    pub results: Option<PathBuf>,
    /// Directory already holding the raw dumps
    pub raw_dir: Option<PathBuf>,
}

fn fetch_policy(config: &BenchConfig) -> FetchPolicy {
    FetchPolicy {
        retries: config.retries,
        timeout_secs: config.timeout_secs,
    }
}

/// Load the suite's results document, downloading it if no local copy is given.
pub fn results_document(suite: &Suite, config: &BenchConfig, local: Option<&Path>) -> Result<LayoutDocument> {
    let path = match local {
        Some(p) => p.to_path_buf(),
        None => {
            let dest = config.suite_cache(suite.name).join(suite.results_file);
            fetch_cached(&suite.results_url(), &dest, fetch_policy(config))
                .with_context(|| format!("Failed to fetch results for suite {}", suite.name.as_str()))?
        }
    };
    load_document(&path)
}

/// Extract the suite's reference table. Any structural error aborts the
/// whole suite.
pub fn extract_references(suite: &Suite, config: &BenchConfig, doc: &LayoutDocument) -> Result<ReferenceTable> {
    let refs = match suite.reference {
        ReferenceKind::RegionTable { default_region } => {
            let region = config.region_for(suite.name, default_region);
            RegionTableLayout::qkp_detailed(region).extract(doc, &suite.keys())
        }
        ReferenceKind::LineScan => LineScanLayout::large_qkp().extract(doc),
    }
    .with_context(|| format!("Reference extraction failed for suite {}", suite.name.as_str()))?;
    Ok(refs)
}

/// Every suite key needs a reference entry and every entry needs a suite key.
pub fn check_join(suite: &Suite, refs: &ReferenceTable) -> Result<()> {
    let keys = suite.keys();
    refs.ensure_covers(&keys)
        .and_then(|()| refs.ensure_only(&keys))
        .with_context(|| format!("References do not match suite {}", suite.name.as_str()))
}

/// Build one suite end to end.
pub fn build_suite(suite: &Suite, config: &BenchConfig, options: &BuildOptions) -> Result<BatchReport> {
    let out_dir = config.output_root.join(suite.output_dir);
    fs::create_dir_all(&out_dir)
        .with_context(|| format!("Failed to create output directory {}", out_dir.display()))?;
    let cache = config.suite_cache(suite.name);
    let policy = fetch_policy(config);

    log::info!("Building suite {} into {}", suite.name.as_str(), out_dir.display());
    let doc = results_document(suite, config, options.results.as_deref())?;
    let refs = extract_references(suite, config, &doc)?;
    log::info!("{} reference entries", refs.len());
    check_join(suite, &refs)?;

    let output = OutputSpec::new(&out_dir, suite.file_prefix);
    let driver = BatchDriver::new(config.workers);
    // Downloaded payloads eligible for cleanup.
    let mut raw_paths: Vec<PathBuf> = Vec::new();

    let report = match suite.source {
        Source::PerFile { format } => {
            let raw_dir = match &options.raw_dir {
                Some(dir) => dir.clone(),
                None => {
                    let dir = cache.join("raw");
                    raw_paths.push(dir.clone());
                    dir
                }
            };
            let download = options.raw_dir.is_none();
            let units = suite.keys().into_iter().map(|k| (k, ())).collect();
            driver.run(units, |key, ()| {
                let path = raw_dir.join(suite.raw_file_name(key));
                let path = if download {
                    fetch_cached(&suite.raw_url(key), &path, policy)?
                } else {
                    path
                };
                convert_raw_file(key, &path, format, &refs, &output).map(|p| vec![p])
            })?
        }
        Source::Archive { url, format, .. } => {
            let root = match &options.raw_dir {
                Some(dir) => dir.clone(),
                None => {
                    let name = url.rsplit('/').next().unwrap_or("raw.zip");
                    let archive = fetch_cached(url, &cache.join(name), policy)
                        .with_context(|| format!("Failed to fetch archive {}", url))?;
                    let root = cache.join("raw");
                    extract_archive(&archive, &root)?;
                    let nested = extract_nested(&root)?;
                    log::debug!("extracted {} nested archive(s)", nested);
                    raw_paths.push(archive);
                    raw_paths.push(root.clone());
                    root
                }
            };
            let index = index_files(&root);
            let units = suite
                .keys()
                .into_iter()
                .map(|k| {
                    let name = suite.raw_file_name(&k);
                    let path = index.get(&name).cloned().ok_or(name);
                    (k, path)
                })
                .collect();
            driver.run(units, |key, path: Result<PathBuf, String>| {
                let path = path.map_err(|name| missing_raw(&root, &name))?;
                convert_raw_file(key, &path, format, &refs, &output).map(|p| vec![p])
            })?
        }
        Source::Synthetic => {
            let units = LARGE_GRID
                .iter()
                .flat_map(|&(n, densities)| densities.iter().map(move |&d| (n, d)))
                .map(|(n, d)| {
                    let params = SynthParams::new(n, d, instance_seed(config.synth_seed, n, d, 0));
                    (BenchmarkKey::new(n, d.to_string(), 0), params)
                })
                .collect();
            driver.run(units, |key, params| {
                synthesize_levels(key, &params, LARGE_BUDGET_LEVELS, &refs, &output)
            })?
        }
    };

    if refs.has_comparisons() {
        let csv = render_comparison_csv(&refs, suite.file_prefix);
        let path = write_atomic(&out_dir, "sota.csv", csv.as_bytes())?;
        log::info!("Wrote {}", path.display());
    }

    if report.is_success() && !config.keep_raw {
        remove_raw(&raw_paths);
    }
    Ok(report)
}

fn missing_raw(root: &Path, name: &str) -> QkpError {
    QkpError::Io(std::io::Error::new(
        std::io::ErrorKind::NotFound,
        format!("raw file {} not found under {}", name, root.display()),
    ))
}

fn remove_raw(paths: &[PathBuf]) {
    for path in paths {
        let result = if path.is_dir() {
            fs::remove_dir_all(path)
        } else if path.exists() {
            fs::remove_file(path)
        } else {
            continue;
        };
        match result {
            Ok(()) => log::debug!("removed {}", path.display()),
            Err(e) => log::warn!("could not remove {}: {}", path.display(), e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::suites::SuiteName;
    use qkp_core::PageDocument;

    fn large_page(n: u32, d: u32) -> String {
        let mut text = format!("File qkp new {} {} 0.txt\n", n, d);
        text.push_str("γ   BestOFV\n");
        for (row, gamma) in ["2.5", "5", "10", "25", "50", "75"].iter().enumerate() {
            text.push_str(&format!("{}   {}\n", gamma, 1000 + row));
        }
        text.push('\x0c');
        text
    }

    fn large_results_text() -> String {
        let mut text = String::from("Detailed results\x0c");
        for &(n, densities) in LARGE_GRID {
            for &d in densities {
                text.push_str(&large_page(n, d));
            }
        }
        text
    }

    fn offline_config(dir: &Path) -> BenchConfig {
        BenchConfig {
            output_root: dir.join("out"),
            cache_dir: dir.join("cache"),
            workers: 2,
            ..Default::default()
        }
    }

    #[test]
    fn test_large_references_from_local_document() {
        let dir = tempfile::tempdir().unwrap();
        let results = dir.path().join("large.txt");
        fs::write(&results, large_results_text()).unwrap();

        let config = offline_config(dir.path());
        let suite = Suite::get(SuiteName::Large);
        let doc = results_document(&suite, &config, Some(&results)).unwrap();
        assert_eq!(doc.page_count(), 25);

        let refs = extract_references(&suite, &config, &doc).unwrap();
        assert_eq!(refs.len(), 24 * 6);
        let key = BenchmarkKey::new(500, "5", 0).with_budget_level(250);
        assert_eq!(refs.lookup(&key).unwrap().best_known_objective, 1003);
        assert!(check_join(&suite, &refs).is_ok());
    }

    #[test]
    fn test_extra_reference_page_fails_build() {
        let dir = tempfile::tempdir().unwrap();
        let results = dir.path().join("large.txt");
        // 600 items is not part of the synthesized grid
        fs::write(&results, large_results_text() + &large_page(600, 5)).unwrap();

        let config = offline_config(dir.path());
        let suite = Suite::get(SuiteName::Large);
        let options = BuildOptions {
            results: Some(results),
            raw_dir: None,
        };
        let err = build_suite(&suite, &config, &options).unwrap_err();
        assert!(format!("{:#}", err).contains("n=600"));

        let out = config.output_root.join(suite.output_dir);
        assert_eq!(fs::read_dir(out).unwrap().count(), 0);
    }

    #[test]
    fn test_missing_reference_page_fails_join() {
        let mut text = String::from("Detailed results\x0c");
        for &(n, densities) in LARGE_GRID {
            for &d in densities {
                if (n, d) != (10000, 5) {
                    text.push_str(&large_page(n, d));
                }
            }
        }
        let suite = Suite::get(SuiteName::Large);
        let dir = tempfile::tempdir().unwrap();
        let config = offline_config(dir.path());
        let refs = extract_references(&suite, &config, &LayoutDocument::from_text(&text)).unwrap();
        assert!(check_join(&suite, &refs).is_err());
    }

    #[test]
    fn test_missing_raw_is_not_found() {
        let err = missing_raw(Path::new("/tmp/raw"), "1000_25_1.dat");
        match err {
            QkpError::Io(e) => assert_eq!(e.kind(), std::io::ErrorKind::NotFound),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_remove_raw_skips_missing_paths() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("payload.zip");
        let sub = dir.path().join("raw");
        fs::write(&file, "x").unwrap();
        fs::create_dir_all(sub.join("nested")).unwrap();
        remove_raw(&[file.clone(), sub.clone(), dir.path().join("absent")]);
        assert!(!file.exists());
        assert!(!sub.exists());
    }
}

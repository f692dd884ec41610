//! QKP benchmark suite catalog.
//!
//! Each suite names its raw source, the document holding its reference
//! values, and the order in which that document lists instances.

use clap::ValueEnum;
use qkp_core::{BenchmarkKey, RawFormat, Region};

const RESULTS_BASE_URL: &str =
    "https://raw.githubusercontent.com/phil85/results-for-qkp-benchmark-instances/main/tables";

const STANDARD_BASE_URL: &str = "https://cedric.cnam.fr/~soutif/QKP";

const GROUP2_ZIP_URL: &str = "https://leria-info.univ-angers.fr/~jinkao.hao/QKPDATA/QKPGroupII.zip";
const GROUP3_ZIP_URL: &str = "https://leria-info.univ-angers.fr/%7Ejinkao.hao/QKPDATA/QKPGroupIII.zip";

const QKP_DENSITIES: &[u32] = &[25, 50, 75, 100];
const STANDARD_300_DENSITIES: &[u32] = &[25, 50];

/// Capacity levels (per mille of total weight) of synthesized instances.
pub const LARGE_BUDGET_LEVELS: &[u32] = &[25, 50, 100, 250, 500, 750];

/// (item_count, densities) grid of the synthesized suite.
pub const LARGE_GRID: &[(u32, &[u32])] = &[
    (500, &[5, 10, 15, 20, 25, 50, 75, 100]),
    (1000, &[5, 10, 15, 20, 25, 50]),
    (2000, &[5, 10, 15, 20, 25]),
    (5000, &[5, 10, 15, 20]),
    (10000, &[5]),
];

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SuiteName {
    Standard,
    Group2,
    Group3,
    Large,
}

impl SuiteName {
    pub fn as_str(&self) -> &'static str {
        match self {
            SuiteName::Standard => "standard",
            SuiteName::Group2 => "group2",
            SuiteName::Group3 => "group3",
            SuiteName::Large => "large",
        }
    }
}

/// Where a suite's instances come from.
#[derive(Debug, Clone, Copy)]
pub enum Source {
    /// One download per instance.
    PerFile { format: RawFormat },
    /// One archive holding every raw dump.
    Archive { url: &'static str, format: RawFormat, extension: &'static str },
    /// Generated from a seed, one matrix per (n, density).
    Synthetic,
}

/// How reference values are laid out in the results document.
#[derive(Debug, Clone, Copy)]
pub enum ReferenceKind {
    RegionTable { default_region: Region },
    LineScan,
}

#[derive(Debug, Clone, Copy)]
pub struct Suite {
    pub name: SuiteName,
    pub output_dir: &'static str,
    pub file_prefix: &'static str,
    pub results_file: &'static str,
    pub source: Source,
    pub reference: ReferenceKind,
}

/// Crop of the detailed-results table in `pdftotext -layout` coordinates.
const DETAILED_TABLE_REGION: Region = Region {
    top: 6,
    bottom: 16,
    left: 0,
    right: 200,
};

impl Suite {
    pub fn get(name: SuiteName) -> Suite {
        match name {
            SuiteName::Standard => Suite {
                name,
                output_dir: "Standard_QKP",
                file_prefix: "",
                results_file: "Standard-QKP_detailed_results.pdf",
                source: Source::PerFile {
                    format: RawFormat::Standard,
                },
                reference: ReferenceKind::RegionTable {
                    default_region: DETAILED_TABLE_REGION,
                },
            },
            SuiteName::Group2 => Suite {
                name,
                output_dir: "QKPGroupII",
                file_prefix: "",
                results_file: "QKPGroupII_detailed_results.pdf",
                source: Source::Archive {
                    url: GROUP2_ZIP_URL,
                    format: RawFormat::GroupII,
                    extension: "dat",
                },
                reference: ReferenceKind::RegionTable {
                    default_region: DETAILED_TABLE_REGION,
                },
            },
            SuiteName::Group3 => Suite {
                name,
                output_dir: "QKPGroupIII",
                file_prefix: "",
                results_file: "QKPGroupIII_detailed_results.pdf",
                source: Source::Archive {
                    url: GROUP3_ZIP_URL,
                    format: RawFormat::GroupIII,
                    extension: "txt",
                },
                reference: ReferenceKind::RegionTable {
                    default_region: DETAILED_TABLE_REGION,
                },
            },
            SuiteName::Large => Suite {
                name,
                output_dir: "Large_QKP",
                file_prefix: "large_qkp_",
                results_file: "Large-QKP_detailed_results.pdf",
                source: Source::Synthetic,
                reference: ReferenceKind::LineScan,
            },
        }
    }

    pub fn results_url(&self) -> String {
        format!("{}/{}", RESULTS_BASE_URL, self.results_file)
    }

    /// Keys in the order the results document lists them.
    pub fn keys(&self) -> Vec<BenchmarkKey> {
        match self.name {
            SuiteName::Standard => grid(
                &[100, 200, 300],
                |n| if n == 300 { STANDARD_300_DENSITIES } else { QKP_DENSITIES },
                false,
                10,
                false,
            ),
            SuiteName::Group2 => grid(&[1000, 2000], |_| QKP_DENSITIES, true, 10, true),
            SuiteName::Group3 => grid(&[5000, 6000], |_| QKP_DENSITIES, true, 5, false),
            SuiteName::Large => LARGE_GRID
                .iter()
                .flat_map(|&(n, densities)| {
                    densities.iter().flat_map(move |&d| {
                        LARGE_BUDGET_LEVELS
                            .iter()
                            .map(move |&level| BenchmarkKey::new(n, d.to_string(), 0).with_budget_level(level))
                    })
                })
                .collect(),
        }
    }

    /// Remote URL of one per-file raw dump.
    pub fn raw_url(&self, key: &BenchmarkKey) -> String {
        format!("{}/{}", STANDARD_BASE_URL, self.raw_file_name(key))
    }

    /// File name of one raw dump as published.
    pub fn raw_file_name(&self, key: &BenchmarkKey) -> String {
        match self.source {
            Source::PerFile { .. } => format!("jeu_{}", key.file_name("")),
            Source::Archive { extension, .. } => {
                format!("{}_{}_{}.{}", key.item_count, key.variant, key.instance_index, extension)
            }
            Source::Synthetic => key.file_name(self.file_prefix),
        }
    }
}

/// Enumerate `n x density x index`. The lexicographic flags reproduce
/// documents that order densities or indices as strings ("100" < "25").
fn grid(
    sizes: &[u32],
    densities: impl Fn(u32) -> &'static [u32],
    lexicographic_density: bool,
    instances: u32,
    lexicographic_index: bool,
) -> Vec<BenchmarkKey> {
    let mut keys = Vec::new();
    for &n in sizes {
        for d in ordered(densities(n), lexicographic_density) {
            let indices: Vec<u32> = (1..=instances).collect();
            for i in ordered(&indices, lexicographic_index) {
                keys.push(BenchmarkKey::new(n, d.to_string(), i));
            }
        }
    }
    keys
}

fn ordered(values: &[u32], lexicographic: bool) -> Vec<u32> {
    let mut v = values.to_vec();
    if lexicographic {
        v.sort_by_key(|x| x.to_string());
    }
    v
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suite_sizes() {
        assert_eq!(Suite::get(SuiteName::Standard).keys().len(), 100);
        assert_eq!(Suite::get(SuiteName::Group2).keys().len(), 80);
        assert_eq!(Suite::get(SuiteName::Group3).keys().len(), 40);
        assert_eq!(Suite::get(SuiteName::Large).keys().len(), 24 * 6);
    }

    #[test]
    fn test_group2_page_order_is_lexicographic() {
        let keys = Suite::get(SuiteName::Group2).keys();
        assert_eq!(keys[0], BenchmarkKey::new(1000, "100", 1));
        assert_eq!(keys[1], BenchmarkKey::new(1000, "100", 10));
        assert_eq!(keys[2], BenchmarkKey::new(1000, "100", 2));
        assert_eq!(keys[10], BenchmarkKey::new(1000, "25", 1));
    }

    #[test]
    fn test_group3_index_order_is_numeric() {
        let keys = Suite::get(SuiteName::Group3).keys();
        assert_eq!(keys[0], BenchmarkKey::new(5000, "100", 1));
        assert_eq!(keys[4], BenchmarkKey::new(5000, "100", 5));
        assert_eq!(keys[5], BenchmarkKey::new(5000, "25", 1));
    }

    #[test]
    fn test_raw_names() {
        let key = BenchmarkKey::new(100, "25", 3);
        let standard = Suite::get(SuiteName::Standard);
        assert_eq!(standard.raw_url(&key), "https://cedric.cnam.fr/~soutif/QKP/jeu_100_25_3.txt");
        assert_eq!(Suite::get(SuiteName::Group2).raw_file_name(&key), "100_25_3.dat");
        assert_eq!(Suite::get(SuiteName::Group3).raw_file_name(&key), "100_25_3.txt");
    }
}

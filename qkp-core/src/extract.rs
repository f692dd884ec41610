//! Reference-value extraction from published result documents.
//!
//! Two strategies, chosen per source:
//! - [`LineScanLayout`]: locate an instance descriptor line and a header line
//!   in the page text, then read a fixed number of rows after the header.
//! - [`RegionTableLayout`]: crop a fixed region of each page into a cell grid
//!   whose header must match a fixed schema exactly.
//!
//! Both build a complete [`ReferenceTable`] before any instance is written.
//! Structural mismatches abort the whole document.

use std::collections::{BTreeMap, BTreeSet};

use regex::Regex;

use crate::cells::{parse_metric, parse_objective};
use crate::error::{QkpError, QkpResult};
use crate::key::BenchmarkKey;
use crate::page::{PageDocument, Region};

/// Competitor algorithms reported in the QKP result tables, in column order.
pub const QKP_ALGORITHMS: &[&str] = &["QKBP", "RG", "IHEA", "LDP", "DP", "QK", "Gurobi", "Hexaly"];

/// Gap and runtime of one competitor on one instance. `None` means not
/// measured, which is different from a measured zero.
#[derive(Debug, Clone, PartialEq)]
pub struct AlgorithmResult {
    pub algorithm: String,
    pub gap: Option<f64>,
    pub runtime: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceEntry {
    pub best_known_objective: i64,
    /// Empty when the source reports no comparison.
    pub comparison: Vec<AlgorithmResult>,
}

/// Reference values keyed by benchmark key. Built once, then read-only.
#[derive(Debug, Clone, Default)]
pub struct ReferenceTable {
    entries: BTreeMap<BenchmarkKey, ReferenceEntry>,
}

impl ReferenceTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entry; a key seen twice means the document is inconsistent.
    pub fn insert(&mut self, key: BenchmarkKey, entry: ReferenceEntry) -> QkpResult<()> {
        if self.entries.contains_key(&key) {
            return Err(QkpError::TableStructure(format!("duplicate entry for {}", key)));
        }
        self.entries.insert(key, entry);
        Ok(())
    }

    pub fn lookup(&self, key: &BenchmarkKey) -> QkpResult<&ReferenceEntry> {
        self.entries
            .get(key)
            .ok_or_else(|| QkpError::MissingReference(key.clone()))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&BenchmarkKey, &ReferenceEntry)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn has_comparisons(&self) -> bool {
        self.entries.values().any(|e| !e.comparison.is_empty())
    }

    /// Fail if any of `keys` has no entry.
    pub fn ensure_covers<'a>(&self, keys: impl IntoIterator<Item = &'a BenchmarkKey>) -> QkpResult<()> {
        for key in keys {
            self.lookup(key)?;
        }
        Ok(())
    }

    /// Fail if any entry's key is not among `keys`.
    pub fn ensure_only<'a>(&self, keys: impl IntoIterator<Item = &'a BenchmarkKey>) -> QkpResult<()> {
        let expected: BTreeSet<&BenchmarkKey> = keys.into_iter().collect();
        match self.entries.keys().find(|k| !expected.contains(*k)) {
            Some(key) => Err(QkpError::TableStructure(format!(
                "reference entry {} has no matching instance",
                key
            ))),
            None => Ok(()),
        }
    }
}

/// Reads gap and runtime columns laid out as `gaps[0..k]` then `runtimes[0..k]`.
fn read_comparison(cells: &[&str], algorithms: &[String]) -> QkpResult<Vec<AlgorithmResult>> {
    let k = algorithms.len();
    if cells.len() < 2 * k {
        return Err(QkpError::TableStructure(format!(
            "expected {} comparison cells, found {}",
            2 * k,
            cells.len()
        )));
    }
    algorithms
        .iter()
        .enumerate()
        .map(|(j, algorithm)| {
            Ok(AlgorithmResult {
                algorithm: algorithm.clone(),
                gap: parse_metric(cells[j])?,
                runtime: parse_metric(cells[k + j])?,
            })
        })
        .collect()
}

/// Line-scan layout: one instance per page, several budget rows per instance.
#[derive(Debug, Clone)]
pub struct LineScanLayout {
    /// Leading pages without instance data.
    pub skip_pages: usize,
    /// Matched case-insensitively against each line; must capture `n`,
    /// `variant` and `index`.
    pub descriptor: Regex,
    /// Prefix identifying the header line.
    pub header_marker: String,
    /// Rows read after the header, one per budget level.
    pub rows_per_page: usize,
    /// Multiplier from the first column to a per-mille budget level.
    pub level_scale: f64,
    /// Competitor columns after the objective column; may be empty.
    pub algorithms: Vec<String>,
}

impl LineScanLayout {
    /// Layout of the Large-QKP detailed results.
    pub fn large_qkp() -> Self {
        Self {
            skip_pages: 1,
            descriptor: Regex::new(
                r"(?i)^File\s+qkp\s+new\s+0*(?P<n>\d+)\s+0*(?P<variant>\d+)\s+(?P<index>\d+)\.txt",
            )
            .expect("descriptor pattern is valid"),
            header_marker: "γ ".to_string(),
            rows_per_page: 6,
            level_scale: 10.0,
            algorithms: Vec::new(),
        }
    }

    pub fn extract(&self, doc: &dyn PageDocument) -> QkpResult<ReferenceTable> {
        let mut table = ReferenceTable::new();
        for index in self.skip_pages..doc.page_count() {
            let page = doc
                .page(index)
                .ok_or_else(|| QkpError::TableStructure(format!("page {} unreadable", index)))?;
            let lines = page.text_lines();
            self.extract_page(index, &lines, &mut table)?;
        }
        log::info!("line scan extracted {} reference entries", table.len());
        Ok(table)
    }

    fn extract_page(&self, page: usize, lines: &[String], table: &mut ReferenceTable) -> QkpResult<()> {
        let key = lines
            .iter()
            .find_map(|l| self.descriptor_key(l))
            .transpose()?
            .ok_or_else(|| QkpError::TableStructure(format!("page {}: no instance descriptor", page)))?;

        let header = lines
            .iter()
            .position(|l| l.starts_with(&self.header_marker))
            .ok_or_else(|| {
                QkpError::TableStructure(format!(
                    "page {}: no header line starting with '{}'",
                    page, self.header_marker
                ))
            })?;

        for offset in 1..=self.rows_per_page {
            let line = lines.get(header + offset).ok_or_else(|| {
                QkpError::TableStructure(format!("page {}: missing row {} after header", page, offset))
            })?;
            let cells: Vec<&str> = line.split_whitespace().collect();
            if cells.len() < 2 {
                return Err(QkpError::TableStructure(format!(
                    "page {}: row '{}' has fewer than 2 columns",
                    page, line
                )));
            }

            let level = parse_metric(cells[0])?.ok_or_else(|| {
                QkpError::TableStructure(format!("page {}: missing budget level", page))
            })?;
            let level = (level * self.level_scale).round() as u32;
            let entry = ReferenceEntry {
                best_known_objective: parse_objective(cells[1])?,
                comparison: read_comparison(&cells[2..], &self.algorithms)?,
            };
            table.insert(key.with_budget_level(level), entry)?;
        }
        Ok(())
    }

    fn descriptor_key(&self, line: &str) -> Option<QkpResult<BenchmarkKey>> {
        let caps = self.descriptor.captures(line.trim())?;
        let key = match (caps.name("n"), caps.name("variant"), caps.name("index")) {
            (Some(n), Some(variant), Some(index)) => n
                .as_str()
                .parse::<u32>()
                .ok()
                .zip(index.as_str().parse::<u32>().ok())
                .map(|(n, index)| BenchmarkKey::new(n, variant.as_str(), index)),
            _ => None,
        };
        Some(key.ok_or_else(|| QkpError::TableStructure(format!("bad instance descriptor '{}'", line))))
    }
}

/// Region-table layout: one instance per page, pages in a known key order.
#[derive(Debug, Clone)]
pub struct RegionTableLayout {
    /// Page holding the first key's table.
    pub first_page: usize,
    pub region: Region,
    /// Header cells preceding the competitor columns.
    pub leading_header: Vec<String>,
    pub algorithms: Vec<String>,
    /// Expected first-column labels of every row except `data_row`.
    pub row_labels: Vec<String>,
    pub data_row: usize,
}

impl RegionTableLayout {
    /// Layout of the Standard / Group II / Group III detailed results.
    pub fn qkp_detailed(region: Region) -> Self {
        Self {
            first_page: 1,
            region,
            leading_header: vec!["γ".to_string(), "BestOFV".to_string()],
            algorithms: QKP_ALGORITHMS.iter().map(|s| s.to_string()).collect(),
            row_labels: ["γ", "", "", "Avg", "Min", "Max"].iter().map(|s| s.to_string()).collect(),
            data_row: 2,
        }
    }

    pub fn expected_header(&self) -> Vec<String> {
        let mut header = self.leading_header.clone();
        header.extend(self.algorithms.iter().cloned());
        header.extend(self.algorithms.iter().cloned());
        header
    }

    /// Extract one entry per key; `keys[i]` lives on page `first_page + i`.
    pub fn extract(&self, doc: &dyn PageDocument, keys: &[BenchmarkKey]) -> QkpResult<ReferenceTable> {
        let expected = self.expected_header();
        let mut table = ReferenceTable::new();

        for (i, key) in keys.iter().enumerate() {
            let page_index = self.first_page + i;
            let page = doc.page(page_index).ok_or_else(|| {
                QkpError::TableStructure(format!("no page {} for {}", page_index, key))
            })?;
            let mut grid = page.crop_table(&self.region);
            self.split_merged_header(&mut grid);

            let header: Vec<&str> = grid.first().map(|r| r.iter().map(String::as_str).collect()).unwrap_or_default();
            if header != expected.iter().map(String::as_str).collect::<Vec<_>>() {
                return Err(QkpError::TableStructure(format!(
                    "page {}: header {:?} does not match {:?}",
                    page_index, header, expected
                )));
            }

            let labels: Vec<&str> = grid
                .iter()
                .enumerate()
                .filter(|&(r, _)| r != self.data_row)
                .map(|(_, row)| row.first().map(String::as_str).unwrap_or(""))
                .collect();
            if labels != self.row_labels.iter().map(String::as_str).collect::<Vec<_>>() {
                return Err(QkpError::TableStructure(format!(
                    "page {}: row labels {:?} do not match {:?}",
                    page_index, labels, self.row_labels
                )));
            }

            let row: Vec<&str> = grid[self.data_row].iter().map(String::as_str).collect();
            let lead = self.leading_header.len();
            if row.len() != expected.len() {
                return Err(QkpError::TableStructure(format!(
                    "page {}: data row has {} cells, expected {}",
                    page_index,
                    row.len(),
                    expected.len()
                )));
            }
            let entry = ReferenceEntry {
                best_known_objective: parse_objective(row[lead - 1])?,
                comparison: read_comparison(&row[lead..], &self.algorithms)?,
            };
            log::debug!("page {} -> {} ofv={}", page_index, key, entry.best_known_objective);
            table.insert(key.clone(), entry)?;
        }

        log::info!("region table extracted {} reference entries", table.len());
        Ok(table)
    }

    /// Some layouts merge the two leading header tokens into one cell; split
    /// that cell in the header and data rows.
    fn split_merged_header(&self, grid: &mut [Vec<String>]) {
        let merged = self.leading_header.join(" ");
        if grid.first().and_then(|r| r.first()) != Some(&merged) {
            return;
        }
        for r in [0, self.data_row] {
            if let Some(row) = grid.get_mut(r) {
                if row.is_empty() {
                    continue;
                }
                let first = row.remove(0);
                let parts: Vec<String> = first.split_whitespace().map(str::to_string).collect();
                for (offset, part) in parts.into_iter().enumerate() {
                    row.insert(offset, part);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::{LayoutDocument, LayoutPage};

    fn large_page(n: &str, d: &str) -> String {
        format!(
            "Large-QKP results\nFile qkp new {} {} 0.txt\nγ BestOFV\n2.5 1,234\n5 2,000\n10 3000.0\n25 4000\n50 5000\n75 6000\n",
            n, d
        )
    }

    #[test]
    fn test_line_scan_large() {
        let text = format!("cover page\x0c{}\x0c{}", large_page("00500", "005"), large_page("01000", "010"));
        let doc = LayoutDocument::from_text(&text);
        let table = LineScanLayout::large_qkp().extract(&doc).unwrap();
        assert_eq!(table.len(), 12);

        let key = BenchmarkKey::new(500, "5", 0);
        assert_eq!(table.lookup(&key.with_budget_level(25)).unwrap().best_known_objective, 1234);
        assert_eq!(table.lookup(&key.with_budget_level(100)).unwrap().best_known_objective, 3000);
        assert_eq!(table.lookup(&key.with_budget_level(250)).unwrap().best_known_objective, 4000);
        let key = BenchmarkKey::new(1000, "10", 0);
        assert_eq!(table.lookup(&key.with_budget_level(750)).unwrap().best_known_objective, 6000);
        assert!(!table.has_comparisons());
    }

    #[test]
    fn test_line_scan_requires_descriptor() {
        let doc = LayoutDocument::from_text("cover\x0cγ BestOFV\n1 2\n");
        assert!(matches!(
            LineScanLayout::large_qkp().extract(&doc),
            Err(QkpError::TableStructure(_))
        ));
    }

    #[test]
    fn test_line_scan_with_comparison() {
        let mut layout = LineScanLayout::large_qkp();
        layout.rows_per_page = 1;
        layout.algorithms = vec!["A".into(), "B".into()];
        let doc = LayoutDocument::from_text("x\x0cFile qkp new 100 25 0.txt\nγ OFV A B A B\n2.5 900 0.0 — 1.5 —\n");
        let table = layout.extract(&doc).unwrap();
        let entry = table.lookup(&BenchmarkKey::new(100, "25", 0).with_budget_level(25)).unwrap();
        assert_eq!(entry.comparison[0].gap, Some(0.0));
        assert_eq!(entry.comparison[1].gap, None);
        assert_eq!(entry.comparison[0].runtime, Some(1.5));
        assert_eq!(entry.comparison[1].runtime, None);
    }

    fn region_layout() -> RegionTableLayout {
        let mut layout = RegionTableLayout::qkp_detailed(Region::new(0, 20, 0, 200));
        layout.algorithms = vec!["QK".into(), "DP".into()];
        layout
    }

    fn region_page(header: &[&str], data: &[&str]) -> LayoutPage {
        let fmt = |cells: &[&str]| cells.iter().map(|c| format!("{:<12}", c)).collect::<String>();
        let width = header.len();
        let filler = |label: &'static str, fill: &'static str| {
            let mut cells = vec![label];
            cells.extend(std::iter::repeat(fill).take(width - 1));
            cells
        };
        let rows = [
            fmt(header),
            fmt(&filler("", "(%)")),
            fmt(data),
            fmt(&filler("", "avg")),
            fmt(&filler("Avg", "1")),
            fmt(&filler("Min", "0")),
            fmt(&filler("Max", "2")),
        ];
        LayoutPage::new(&rows.join("\n"))
    }

    #[test]
    fn test_region_table() {
        let doc = LayoutDocument::from_pages(vec![
            LayoutPage::default(),
            region_page(
                &["γ", "BestOFV", "QK", "DP", "QK", "DP"],
                &["5", "18,558", "0.0", "—", "1.25", "—"],
            ),
        ]);
        let key = BenchmarkKey::new(100, "25", 1);
        let table = region_layout().extract(&doc, &[key.clone()]).unwrap();
        let entry = table.lookup(&key).unwrap();
        assert_eq!(entry.best_known_objective, 18558);
        assert_eq!(entry.comparison.len(), 2);
        assert_eq!(entry.comparison[0].gap, Some(0.0));
        assert_eq!(entry.comparison[1].gap, None);
        assert_eq!(entry.comparison[0].runtime, Some(1.25));
        assert_eq!(entry.comparison[1].runtime, None);
    }

    #[test]
    fn test_region_table_merged_header() {
        let doc = LayoutDocument::from_pages(vec![
            LayoutPage::default(),
            region_page(
                &["γ BestOFV", "QK", "DP", "QK", "DP"],
                &["5 18,558.0", "0.1", "0.2", "1.25", "3"],
            ),
        ]);
        let key = BenchmarkKey::new(100, "25", 1);
        let table = region_layout().extract(&doc, &[key.clone()]).unwrap();
        let entry = table.lookup(&key).unwrap();
        assert_eq!(entry.best_known_objective, 18558);
        assert_eq!(entry.comparison[1].runtime, Some(3.0));
    }

    #[test]
    fn test_region_table_merged_header_wide_data_gap() {
        let doc = LayoutDocument::from_pages(vec![
            LayoutPage::default(),
            region_page(
                &["γ BestOFV", "QK", "DP", "QK", "DP"],
                &["5  18,558", "0.1", "0.2", "1.25", "3"],
            ),
        ]);
        let key = BenchmarkKey::new(100, "25", 1);
        let table = region_layout().extract(&doc, &[key.clone()]).unwrap();
        let entry = table.lookup(&key).unwrap();
        assert_eq!(entry.best_known_objective, 18558);
        assert_eq!(entry.comparison[0].gap, Some(0.1));
        assert_eq!(entry.comparison[1].runtime, Some(3.0));
    }

    #[test]
    fn test_region_table_header_mismatch() {
        let doc = LayoutDocument::from_pages(vec![
            LayoutPage::default(),
            region_page(
                &["γ", "BestOFV", "QK", "QK", "DP"],
                &["5", "18,558", "0.0", "1.25", "2"],
            ),
        ]);
        let err = region_layout()
            .extract(&doc, &[BenchmarkKey::new(100, "25", 1)])
            .unwrap_err();
        assert!(err.is_batch_fatal());
    }

    #[test]
    fn test_region_table_missing_page() {
        let doc = LayoutDocument::from_pages(vec![LayoutPage::default()]);
        assert!(region_layout()
            .extract(&doc, &[BenchmarkKey::new(100, "25", 1)])
            .is_err());
    }

    #[test]
    fn test_missing_reference() {
        let table = ReferenceTable::new();
        let key = BenchmarkKey::new(1, "1", 1);
        assert!(matches!(table.lookup(&key), Err(QkpError::MissingReference(_))));
        assert!(table.ensure_covers([&key]).is_err());
    }

    #[test]
    fn test_ensure_only_rejects_extra_entry() {
        let mut table = ReferenceTable::new();
        let known = BenchmarkKey::new(500, "5", 0);
        let extra = BenchmarkKey::new(600, "5", 0);
        for key in [&known, &extra] {
            let entry = ReferenceEntry {
                best_known_objective: 1,
                comparison: vec![],
            };
            table.insert(key.clone(), entry).unwrap();
        }
        assert!(table.ensure_only([&known, &extra]).is_ok());
        assert!(matches!(
            table.ensure_only([&known]),
            Err(QkpError::TableStructure(_))
        ));
    }

    #[test]
    fn test_duplicate_entry_rejected() {
        let mut table = ReferenceTable::new();
        let key = BenchmarkKey::new(1, "1", 1);
        let entry = ReferenceEntry {
            best_known_objective: 1,
            comparison: vec![],
        };
        table.insert(key.clone(), entry.clone()).unwrap();
        assert!(table.insert(key, entry).is_err());
    }
}

//! Page-structured documents.
//!
//! Result tables are published as paged documents. The extractor only needs
//! two capabilities per page: its text as lines, and a rectangular crop read
//! back as a grid of cells. [`LayoutDocument`] provides both over text-layout
//! output (one page per form feed, character columns preserved).

use serde::{Deserialize, Serialize};

/// Rectangular crop in text coordinates: lines `[top, bottom)`, character
/// columns `[left, right)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub top: usize,
    pub bottom: usize,
    pub left: usize,
    pub right: usize,
}

impl Region {
    pub fn new(top: usize, bottom: usize, left: usize, right: usize) -> Self {
        Self {
            top,
            bottom,
            left,
            right,
        }
    }
}

pub trait Page {
    fn text_lines(&self) -> Vec<String>;

    /// Cells of the cropped region, one row per non-blank line.
    fn crop_table(&self, region: &Region) -> Vec<Vec<String>>;
}

pub trait PageDocument {
    fn page_count(&self) -> usize;

    fn page(&self, index: usize) -> Option<&dyn Page>;
}

/// One page of text-layout output.
#[derive(Debug, Clone, Default)]
pub struct LayoutPage {
    lines: Vec<String>,
}

impl LayoutPage {
    pub fn new(text: &str) -> Self {
        Self {
            lines: text.lines().map(|l| l.trim_end().to_string()).collect(),
        }
    }
}

impl Page for LayoutPage {
    fn text_lines(&self) -> Vec<String> {
        self.lines
            .iter()
            .map(|l| l.trim_start().to_string())
            .filter(|l| !l.is_empty())
            .collect()
    }

    fn crop_table(&self, region: &Region) -> Vec<Vec<String>> {
        let bottom = region.bottom.min(self.lines.len());
        let width = region.right.saturating_sub(region.left);
        if region.top >= bottom || width == 0 {
            return Vec::new();
        }

        let rows: Vec<Vec<char>> = self.lines[region.top..bottom]
            .iter()
            .map(|line| {
                let mut chars: Vec<char> = line.chars().skip(region.left).take(width).collect();
                chars.resize(width, ' ');
                chars
            })
            .filter(|chars| chars.iter().any(|c| !c.is_whitespace()))
            .collect();

        let spans = column_spans(&rows, width);
        rows.iter()
            .map(|chars| {
                spans
                    .iter()
                    .map(|&(start, end)| chars[start..end].iter().collect::<String>().trim().to_string())
                    .collect()
            })
            .collect()
    }
}

/// Column boundaries: runs of character positions occupied in any row.
/// Single-space gaps do not separate columns.
fn column_spans(rows: &[Vec<char>], width: usize) -> Vec<(usize, usize)> {
    let occupied: Vec<bool> = (0..width)
        .map(|c| rows.iter().any(|r| !r[c].is_whitespace()))
        .collect();

    let mut spans: Vec<(usize, usize)> = Vec::new();
    let mut c = 0;
    while c < width {
        if !occupied[c] {
            c += 1;
            continue;
        }
        let start = c;
        while c < width && occupied[c] {
            c += 1;
        }
        match spans.last_mut() {
            Some(last) if start - last.1 < 2 => last.1 = c,
            _ => spans.push((start, c)),
        }
    }
    spans
}

/// Text-layout document, pages separated by form feeds.
#[derive(Debug, Clone, Default)]
pub struct LayoutDocument {
    pages: Vec<LayoutPage>,
}

impl LayoutDocument {
    pub fn from_text(text: &str) -> Self {
        let mut pages: Vec<LayoutPage> = text.split('\x0c').map(LayoutPage::new).collect();
        // Layout dumps end with a form feed.
        if pages.len() > 1 && pages.last().map_or(false, |p| p.lines.iter().all(|l| l.is_empty())) {
            pages.pop();
        }
        Self { pages }
    }

    pub fn from_pages(pages: Vec<LayoutPage>) -> Self {
        Self { pages }
    }
}

impl PageDocument for LayoutDocument {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page(&self, index: usize) -> Option<&dyn Page> {
        self.pages.get(index).map(|p| p as &dyn Page)
    }
}

//! Raw QKP dump parsers.
//!
//! Every supported source stores the same content (item count, one linear
//! utility row, `n` upper-triangular quadratic rows, a capacity line and a
//! weight line) at different fixed line offsets. Each source is a
//! [`RawFormat`] variant whose [`RawLayout`] carries only those offsets; the
//! offsets are constants, never inferred from the input.
//!
//! Quadratic row `i` holds the `n - i - 1` values for columns `i+1..n`.

use std::path::Path;

use crate::error::{QkpError, QkpResult};
use crate::instance::{Edge, UtilityMatrix, ValueKind};

/// Known raw dump layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RawFormat {
    /// `jeu_<n>_<d>_<i>.txt`: name line, count, linear row, triangle,
    /// constraint-type line, capacity, weights.
    Standard,
    /// Group II `.dat`: count, linear row, triangle, blank, capacity, weights.
    GroupII,
    /// Group III `.txt`: name, count, padding, linear row, triangle, two
    /// padding lines, capacity, weights.
    GroupIII,
}

impl RawFormat {
    pub const ALL: [RawFormat; 3] = [RawFormat::Standard, RawFormat::GroupII, RawFormat::GroupIII];

    pub fn layout(&self) -> RawLayout {
        match self {
            RawFormat::Standard => RawLayout {
                count_line: 1,
                linear_line: 2,
                quadratic_line: 3,
                budget_gap: 1,
                weights_gap: 2,
            },
            RawFormat::GroupII => RawLayout {
                count_line: 0,
                linear_line: 1,
                quadratic_line: 2,
                budget_gap: 1,
                weights_gap: 2,
            },
            RawFormat::GroupIII => RawLayout {
                count_line: 1,
                linear_line: 3,
                quadratic_line: 4,
                budget_gap: 2,
                weights_gap: 3,
            },
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            RawFormat::Standard => "standard",
            RawFormat::GroupII => "group2",
            RawFormat::GroupIII => "group3",
        }
    }

    pub fn parse(&self, text: &str) -> QkpResult<RawInstance> {
        self.layout().parse(text)
    }

    pub fn parse_file<P: AsRef<Path>>(&self, path: P) -> QkpResult<RawInstance> {
        let text = std::fs::read_to_string(path.as_ref())?;
        self.parse(&text)
    }
}

impl std::str::FromStr for RawFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RawFormat::ALL
            .iter()
            .copied()
            .find(|f| f.name() == s)
            .ok_or_else(|| format!("unknown raw format '{}'", s))
    }
}

/// Line offsets of one raw layout (0-based). The capacity sits at
/// `quadratic_line + n + budget_gap`, the weights at
/// `quadratic_line + n + weights_gap`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawLayout {
    pub count_line: usize,
    pub linear_line: usize,
    pub quadratic_line: usize,
    pub budget_gap: usize,
    pub weights_gap: usize,
}

/// Decoded raw dump: the matrix plus the capacity stored in the file.
#[derive(Debug, Clone, PartialEq)]
pub struct RawInstance {
    pub matrix: UtilityMatrix,
    pub budget: u32,
}

impl RawLayout {
    pub fn parse(&self, text: &str) -> QkpResult<RawInstance> {
        let lines: Vec<&str> = text.lines().collect();

        let n = self.item_count(&lines)?;
        let mut edges = self.linear_row(&lines, n)?;
        edges.extend(self.quadratic_rows(&lines, n)?);
        let budget = self.budget(&lines, n)?;
        let weights = self.weights(&lines, n)?;

        let matrix = UtilityMatrix::new(n as u32, edges, weights, ValueKind::Int)?;
        Ok(RawInstance { matrix, budget })
    }

    pub fn item_count(&self, lines: &[&str]) -> QkpResult<usize> {
        let line = line_at(lines, self.count_line, "item count")?;
        let n: usize = parse_token(line.trim(), self.count_line, "item count")?;
        if n == 0 {
            return Err(QkpError::format(self.count_line + 1, "item count must be positive"));
        }
        Ok(n)
    }

    /// Diagonal edges; zero utilities are dropped.
    pub fn linear_row(&self, lines: &[&str], n: usize) -> QkpResult<Vec<Edge>> {
        let values: Vec<i64> = parse_row(lines, self.linear_line, n, "linear row")?;
        Ok(values
            .into_iter()
            .enumerate()
            .filter(|&(_, v)| v != 0)
            .map(|(i, v)| Edge::new(i as u32, i as u32, v as f64))
            .collect())
    }

    /// Off-diagonal edges from the `n` triangular rows; zeros are dropped.
    pub fn quadratic_rows(&self, lines: &[&str], n: usize) -> QkpResult<Vec<Edge>> {
        let mut edges = Vec::new();
        // The last row carries no values; its line is never read.
        for i in 0..n.saturating_sub(1) {
            let idx = self.quadratic_line + i;
            let expected = n - i - 1;
            let values: Vec<i64> = parse_row(lines, idx, expected, "quadratic row")?;
            for (offset, v) in values.into_iter().enumerate() {
                if v != 0 {
                    edges.push(Edge::new(i as u32, (i + 1 + offset) as u32, v as f64));
                }
            }
        }
        Ok(edges)
    }

    pub fn budget(&self, lines: &[&str], n: usize) -> QkpResult<u32> {
        let idx = self.quadratic_line + n + self.budget_gap;
        let line = line_at(lines, idx, "capacity")?;
        parse_token(line.trim(), idx, "capacity")
    }

    pub fn weights(&self, lines: &[&str], n: usize) -> QkpResult<Vec<u32>> {
        parse_row(lines, self.quadratic_line + n + self.weights_gap, n, "weight row")
    }
}

fn line_at<'a>(lines: &[&'a str], idx: usize, what: &str) -> QkpResult<&'a str> {
    lines
        .get(idx)
        .copied()
        .ok_or_else(|| QkpError::format(idx + 1, format!("missing {} line", what)))
}

fn parse_token<T: std::str::FromStr>(token: &str, idx: usize, what: &str) -> QkpResult<T> {
    token
        .parse()
        .map_err(|_| QkpError::format(idx + 1, format!("invalid {} '{}'", what, token)))
}

fn parse_row<T: std::str::FromStr>(
    lines: &[&str],
    idx: usize,
    expected: usize,
    what: &str,
) -> QkpResult<Vec<T>> {
    let line = line_at(lines, idx, what)?;
    let values = line
        .split_whitespace()
        .map(|tok| parse_token(tok, idx, what))
        .collect::<QkpResult<Vec<T>>>()?;
    if values.len() != expected {
        return Err(QkpError::format(
            idx + 1,
            format!("{} has {} values, expected {}", what, values.len(), expected),
        ));
    }
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edge_set(m: &UtilityMatrix) -> Vec<(u32, u32, f64)> {
        let mut v: Vec<_> = m.edges.iter().map(|e| (e.i, e.j, e.utility)).collect();
        v.sort_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)));
        v
    }

    const GROUP2_SAMPLE: &str = "3\n10 20 30\n5 0\n7\n\n\n6\n4 4 4\n";

    #[test]
    fn test_group2_example() {
        let raw = RawFormat::GroupII.parse(GROUP2_SAMPLE).unwrap();
        assert_eq!(raw.matrix.item_count, 3);
        assert_eq!(raw.budget, 6);
        assert_eq!(raw.matrix.weights, vec![4, 4, 4]);
        assert_eq!(
            edge_set(&raw.matrix),
            vec![
                (0, 0, 10.0),
                (0, 1, 5.0),
                (1, 1, 20.0),
                (1, 2, 7.0),
                (2, 2, 30.0)
            ]
        );
    }

    #[test]
    fn test_standard_layout() {
        let text = "jeu_3_50_1\n3\n10 0 30\n5 0\n7\n\n0\n6\n4 4 4\n";
        let raw = RawFormat::Standard.parse(text).unwrap();
        assert_eq!(raw.budget, 6);
        // zero linear utility on item 1 is not materialized
        assert_eq!(raw.matrix.linear_count(), 2);
        assert_eq!(raw.matrix.edges.len(), 4);
    }

    #[test]
    fn test_group3_layout() {
        let text = "name\n3\n\n10 20 30\n5 0\n7\n\n\n\n6\n4 4 4\n";
        let raw = RawFormat::GroupIII.parse(text).unwrap();
        assert_eq!(raw.budget, 6);
        assert_eq!(raw.matrix.weights, vec![4, 4, 4]);
        assert_eq!(raw.matrix.edges.len(), 5);
    }

    #[test]
    fn test_offsets_do_not_generalize() {
        // A Group II dump read with Standard offsets must not silently succeed.
        assert!(RawFormat::Standard.parse(GROUP2_SAMPLE).is_err());
    }

    #[test]
    fn test_short_quadratic_row() {
        let text = "3\n10 20 30\n5\n7\n\n\n6\n4 4 4\n";
        match RawFormat::GroupII.parse(text) {
            Err(QkpError::Format { line, .. }) => assert_eq!(line, 3),
            other => panic!("expected format error, got {:?}", other),
        }
    }

    #[test]
    fn test_bad_token() {
        let text = "3\n10 x 30\n5 0\n7\n\n\n6\n4 4 4\n";
        match RawFormat::GroupII.parse(text) {
            Err(QkpError::Format { line, message }) => {
                assert_eq!(line, 2);
                assert!(message.contains("'x'"));
            }
            other => panic!("expected format error, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_weight_line() {
        let text = "3\n10 20 30\n5 0\n7\n\n\n6\n";
        assert!(matches!(
            RawFormat::GroupII.parse(text),
            Err(QkpError::Format { line: 8, .. })
        ));
    }

    #[test]
    fn test_format_names() {
        for f in RawFormat::ALL {
            assert_eq!(f.name().parse::<RawFormat>().unwrap(), f);
        }
        assert!("group4".parse::<RawFormat>().is_err());
    }
}

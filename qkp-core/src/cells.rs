//! Numeric cell parsing shared by both result-table strategies.

use crate::error::{QkpError, QkpResult};

/// Tokens meaning "not measured". Distinct from a measured zero.
pub const NO_DATA_MARKERS: &[&str] = &["—", "–", "-", "--", "n/a", "N/A"];

pub fn is_no_data(cell: &str) -> bool {
    NO_DATA_MARKERS.contains(&cell.trim())
}

/// Parse an optional metric cell: no-data marker -> `None`, otherwise a float
/// with thousands separators removed.
pub fn parse_metric(cell: &str) -> QkpResult<Option<f64>> {
    let cell = cell.trim();
    if is_no_data(cell) {
        return Ok(None);
    }
    parse_number(cell).map(Some)
}

/// Parse an objective value. Decimal renderings are truncated toward zero.
pub fn parse_objective(cell: &str) -> QkpResult<i64> {
    let value = parse_number(cell.trim())?;
    if !value.is_finite() {
        return Err(QkpError::TableStructure(format!(
            "objective '{}' is not finite",
            cell
        )));
    }
    Ok(value.trunc() as i64)
}

fn parse_number(cell: &str) -> QkpResult<f64> {
    let cleaned: String = cell.chars().filter(|&c| c != ',').collect();
    cleaned
        .parse::<f64>()
        .map_err(|_| QkpError::TableStructure(format!("unparsable numeric cell '{}'", cell)))
}

//! Loading result documents as page layouts.

use std::path::Path;
use std::process::Command;

use anyhow::{bail, Context, Result};
use qkp_core::LayoutDocument;

/// PDFs go through `pdftotext -layout`; anything else is read as a text
/// layout dump with form-feed page breaks.
pub fn load_document(path: &Path) -> Result<LayoutDocument> {
    let is_pdf = path
        .extension()
        .and_then(|e| e.to_str())
        .map_or(false, |e| e.eq_ignore_ascii_case("pdf"));

    let text = if is_pdf {
        pdf_to_layout_text(path)?
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read results document {}", path.display()))?
    };
    Ok(LayoutDocument::from_text(&text))
}

fn pdf_to_layout_text(path: &Path) -> Result<String> {
    let output = Command::new("pdftotext")
        .arg("-layout")
        .arg(path)
        .arg("-")
        .output()
        .context("Failed to run pdftotext")?;
    if !output.status.success() {
        bail!(
            "pdftotext failed on {}: {}",
            path.display(),
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }
    String::from_utf8(output.stdout).context("pdftotext produced invalid UTF-8")
}

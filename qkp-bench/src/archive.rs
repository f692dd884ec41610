//! Archive extraction via `unzip` / `unrar`, and lookup of extracted files.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{bail, Context, Result};
use walkdir::WalkDir;

/// Extract a `.zip` or `.rar` archive into `dest`.
pub fn extract_archive(archive: &Path, dest: &Path) -> Result<()> {
    fs::create_dir_all(dest)?;
    let ext = archive
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    let mut cmd = match ext.as_str() {
        "zip" => {
            let mut c = Command::new("unzip");
            c.args(["-o", "-q"]).arg(archive).arg("-d").arg(dest);
            c
        }
        "rar" => {
            let mut c = Command::new("unrar");
            c.args(["x", "-o+", "-inul"]).arg(archive).arg(dest);
            c
        }
        other => bail!("unsupported archive type '{}': {}", other, archive.display()),
    };

    log::info!("Extracting {}...", archive.display());
    let output = cmd
        .output()
        .with_context(|| format!("Failed to run extractor for {}", archive.display()))?;
    if !output.status.success() {
        bail!(
            "extracting {} failed: {}",
            archive.display(),
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }
    Ok(())
}

/// Extract every archive found below `root` into its own directory.
/// Nested payloads (zip of rars) need one pass per level.
pub fn extract_nested(root: &Path) -> Result<usize> {
    let archives: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .map(|e| e.into_path())
        .filter(|p| is_archive(p))
        .collect();

    for archive in &archives {
        let dest = archive.with_extension("");
        extract_archive(archive, &dest)?;
    }
    Ok(archives.len())
}

fn is_archive(path: &Path) -> bool {
    path.is_file()
        && matches!(
            path.extension().and_then(|e| e.to_str()).map(|e| e.to_ascii_lowercase()).as_deref(),
            Some("zip") | Some("rar")
        )
}

/// Map file name -> path for every regular file below `root`.
/// The first occurrence of a name wins.
pub fn index_files(root: &Path) -> HashMap<String, PathBuf> {
    let mut index = HashMap::new();
    for entry in WalkDir::new(root).sort_by_file_name().into_iter().filter_map(|e| e.ok()) {
        if !entry.file_type().is_file() {
            continue;
        }
        if let Some(name) = entry.file_name().to_str() {
            index
                .entry(name.to_string())
                .or_insert_with(|| entry.path().to_path_buf());
        }
    }
    index
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_files_recurses() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("1000_25")).unwrap();
        fs::write(dir.path().join("1000_25").join("1000_25_1.dat"), "x").unwrap();
        fs::write(dir.path().join("readme.txt"), "y").unwrap();

        let index = index_files(dir.path());
        assert_eq!(index.len(), 2);
        assert!(index["1000_25_1.dat"].ends_with("1000_25/1000_25_1.dat"));
    }

    #[test]
    fn test_unsupported_archive() {
        let dir = tempfile::tempdir().unwrap();
        assert!(extract_archive(Path::new("data.7z"), dir.path()).is_err());
    }
}

//! Downloads through `curl`, cached on disk.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

use qkp_core::{QkpError, QkpResult};

#[derive(Debug, Clone, Copy)]
pub struct FetchPolicy {
    pub retries: u32,
    pub timeout_secs: u64,
}

/// Download `url` to `dest` unless a non-empty copy is already there.
/// Retries with a linear backoff.
pub fn fetch_cached(url: &str, dest: &Path, policy: FetchPolicy) -> QkpResult<PathBuf> {
    if fs::metadata(dest).map(|m| m.len() > 0).unwrap_or(false) {
        log::debug!("cached {}", dest.display());
        return Ok(dest.to_path_buf());
    }
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut last_error = String::new();
    for attempt in 0..policy.retries.max(1) {
        if attempt > 0 {
            log::warn!("retrying {} ({}/{})", url, attempt + 1, policy.retries);
            std::thread::sleep(Duration::from_secs(2 * attempt as u64));
        }
        match download(url, dest, policy.timeout_secs) {
            Ok(()) => return Ok(dest.to_path_buf()),
            Err(e) => last_error = e,
        }
    }
    let _ = fs::remove_file(dest);
    Err(QkpError::Transport(format!("{}: {}", url, last_error)))
}

fn download(url: &str, dest: &Path, timeout_secs: u64) -> Result<(), String> {
    log::info!("Downloading {}...", url);
    let partial = dest.with_extension("part");
    let output = Command::new("curl")
        .args(["-sSfL", "--max-time", &timeout_secs.to_string(), "-o"])
        .arg(&partial)
        .arg(url)
        .output()
        .map_err(|e| format!("failed to run curl: {}", e))?;

    if !output.status.success() {
        let _ = fs::remove_file(&partial);
        return Err(format!(
            "curl failed: {}",
            String::from_utf8_lossy(&output.stderr).trim()
        ));
    }
    match fs::metadata(&partial) {
        Ok(m) if m.len() > 0 => fs::rename(&partial, dest).map_err(|e| e.to_string()),
        _ => {
            let _ = fs::remove_file(&partial);
            Err("empty response".to_string())
        }
    }
}

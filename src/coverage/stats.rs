//! Stats file persistence: versioned JSON, atomic write-to-temp + rename,
//! and a content fingerprint so a foreign/corrupt file is never blindly
//! merged (§4.6, SPEC_FULL.md ambient additions).

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::FirmoError;
use crate::model::CoverageDatum;

const STATS_VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
struct StatsFile {
    version: u32,
    fingerprint: String,
    files: HashMap<PathBuf, CoverageDatum>,
}

fn fingerprint(files: &HashMap<PathBuf, CoverageDatum>) -> String {
    let mut hasher = Sha256::new();
    let mut paths: Vec<&PathBuf> = files.keys().collect();
    paths.sort();
    for p in paths {
        hasher.update(p.to_string_lossy().as_bytes());
    }
    hex::encode(hasher.finalize())
}

/// Writes `files` to `path` atomically: write to a sibling temp file, then
/// rename over the target.
pub fn save_stats(path: &Path, files: &HashMap<PathBuf, CoverageDatum>) -> Result<(), FirmoError> {
    let payload = StatsFile {
        version: STATS_VERSION,
        fingerprint: fingerprint(files),
        files: files.clone(),
    };
    let json = serde_json::to_string_pretty(&payload)?;
    let tmp_path = path.with_extension("tmp");
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(&tmp_path, json)?;
    std::fs::rename(&tmp_path, path)?;
    Ok(())
}

/// Reads and validates the stats file at `path`. Returns `Ok(None)` if it
/// does not exist; a version/fingerprint mismatch is a VALIDATION error
/// rather than a silent merge of possibly-foreign data.
pub fn load_stats(path: &Path) -> Result<Option<HashMap<PathBuf, CoverageDatum>>, FirmoError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(path)?;
    let parsed: StatsFile = serde_json::from_str(&content)?;
    if parsed.version != STATS_VERSION {
        return Err(FirmoError::validation(format!(
            "coverage stats file {path:?} has unsupported version {}",
            parsed.version
        )));
    }
    if parsed.fingerprint != fingerprint(&parsed.files) {
        return Err(FirmoError::validation(format!(
            "coverage stats file {path:?} failed fingerprint check"
        )));
    }
    Ok(Some(parsed.files))
}

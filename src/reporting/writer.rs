//! Path-template rendering and atomic report writing (§4.8).

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::error::FirmoError;

use super::normalize::{NormalizedReport, ReportType};
use super::registry::FormatterRegistry;

/// Renders `{report_dir}/{type}-report{suffix}.{format}` and friends.
/// Recognized placeholders: `{report_dir}`, `{type}`, `{format}`, `{date}`,
/// `{datetime}`, `{suffix}`, `{test_file_slug}`.
pub fn render_template(template: &str, report_dir: &Path, report_type: ReportType, format: &str, now: DateTime<Utc>, suffix: &str, test_file_slug: &str) -> PathBuf {
    let rendered = template
        .replace("{report_dir}", &report_dir.display().to_string())
        .replace("{type}", report_type.as_str())
        .replace("{format}", format)
        .replace("{date}", &now.format("%Y-%m-%d").to_string())
        .replace("{datetime}", &now.format("%Y-%m-%dT%H-%M-%S").to_string())
        .replace("{suffix}", suffix)
        .replace("{test_file_slug}", test_file_slug);
    PathBuf::from(rendered)
}

pub fn default_template() -> &'static str {
    "{report_dir}/{type}-report{suffix}.{format}"
}

/// Writes `contents` to `path` without ever leaving a partially-written
/// file: written to a sibling temp file first, then renamed into place.
/// The pre-existing file (if any) is unchanged on failure.
pub fn write_atomic(path: &Path, contents: &str) -> Result<(), FirmoError> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir).map_err(|e| FirmoError::io(format!("creating report directory {}: {e}", dir.display())))?;
    let tmp_path = dir.join(format!(".{}.tmp", path.file_name().and_then(|n| n.to_str()).unwrap_or("report")));
    fs::write(&tmp_path, contents).map_err(|e| FirmoError::io(format!("writing {}: {e}", tmp_path.display())))?;
    fs::rename(&tmp_path, path).map_err(|e| FirmoError::io(format!("renaming {} to {}: {e}", tmp_path.display(), path.display())))?;
    Ok(())
}

/// One (report_type, format_name, report) triple to render and write.
pub struct AutoSaveEntry<'a> {
    pub report_type: ReportType,
    pub report: &'a NormalizedReport,
}

/// Generates one file per requested format for every entry, using
/// `template` (or the default). A single formatter failure aborts the
/// whole auto-save and marks the run as failed (§4.8 "Report generation
/// failure marks the run as failed"), but never leaves a partial write at
/// any individual target path.
pub fn auto_save(registry: &FormatterRegistry, entries: &[AutoSaveEntry], formats: &[String], report_dir: &Path, template: Option<&str>, now: DateTime<Utc>, suffix: &str) -> Result<Vec<PathBuf>, FirmoError> {
    let template = template.unwrap_or_else(|| default_template());
    let mut written = Vec::new();
    for entry in entries {
        for format in formats {
            let (contents, extension) = registry.format(entry.report_type, format, entry.report)?;
            let path = render_template(template, report_dir, entry.report_type, &extension, now, suffix, "");
            write_atomic(&path, &contents)?;
            written.push(path);
        }
    }
    Ok(written)
}

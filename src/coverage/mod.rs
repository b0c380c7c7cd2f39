//! Debug-hook-based line coverage: hit counts, include/exclude filtering,
//! and stats persistence (C7).

mod report;
mod stats;

pub use report::{CoverageReportData, FileCoverageSummary, OverallCoverageSummary};
pub use stats::{load_stats, save_stats};

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use globset::{Glob, GlobSet, GlobSetBuilder};

use crate::error::FirmoError;
use crate::model::CoverageDatum;

#[derive(Clone)]
pub struct CoverageConfig {
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    pub codefromstrings: bool,
    pub statsfile: PathBuf,
    pub tick: bool,
    pub savestepsize: u64,
    pub threshold: Option<f64>,
}

impl Default for CoverageConfig {
    fn default() -> Self {
        CoverageConfig {
            include: vec!["**/*".to_string()],
            exclude: vec!["**/vendor/**".to_string()],
            codefromstrings: false,
            statsfile: PathBuf::from(".firmo-coverage.stats"),
            tick: false,
            savestepsize: 100,
            threshold: None,
        }
    }
}

fn build_set(patterns: &[String]) -> Result<GlobSet, FirmoError> {
    let mut builder = GlobSetBuilder::new();
    for p in patterns {
        builder.add(Glob::new(p).map_err(|e| FirmoError::validation(e.to_string()))?);
    }
    builder.build().map_err(|e| FirmoError::validation(e.to_string()))
}

/// Owns per-file hit maps. A single writer by construction: only ever
/// mutated from the thread that called [`install`], mirroring §5's "single
/// writer" requirement for the coverage hit map.
pub struct CoverageCollector {
    config: CoverageConfig,
    data: HashMap<PathBuf, CoverageDatum>,
    tracked_cache: HashMap<PathBuf, bool>,
    include_set: GlobSet,
    exclude_set: GlobSet,
    lines_since_flush: u64,
}

impl CoverageCollector {
    pub fn new(config: CoverageConfig) -> Result<Self, FirmoError> {
        let include_set = build_set(&config.include)?;
        let exclude_set = build_set(&config.exclude)?;
        Ok(CoverageCollector {
            config,
            data: HashMap::new(),
            tracked_cache: HashMap::new(),
            include_set,
            exclude_set,
            lines_since_flush: 0,
        })
    }

    fn is_tracked(&mut self, file: &Path, from_string: bool) -> bool {
        if from_string && !self.config.codefromstrings {
            return false;
        }
        if let Some(v) = self.tracked_cache.get(file) {
            return *v;
        }
        let included = self.include_set.is_match(file);
        let excluded = self.exclude_set.is_match(file);
        let tracked = included && !excluded;
        self.tracked_cache.insert(file.to_path_buf(), tracked);
        tracked
    }

    /// Records one `(file, line)` execution event.
    pub fn record_hit(&mut self, file: &Path, line: u64, from_string: bool) {
        if !self.is_tracked(file, from_string) {
            return;
        }
        let datum = self.data.entry(file.to_path_buf()).or_default();
        *datum.hits.entry(line).or_insert(0) += 1;
        datum.max_line = datum.max_line.max(line);
        self.lines_since_flush += 1;
        if self.config.tick && self.lines_since_flush >= self.config.savestepsize {
            self.lines_since_flush = 0;
            let _ = self.save();
        }
    }

    /// Declares `line` executable without recording a hit yet, so files with
    /// untouched lines still contribute to the executable-line denominator.
    pub fn declare_executable(&mut self, file: &Path, line: u64) {
        if !self.is_tracked(file, false) {
            return;
        }
        let datum = self.data.entry(file.to_path_buf()).or_default();
        datum.hits.entry(line).or_insert(0);
        datum.max_line = datum.max_line.max(line);
    }

    pub fn save(&self) -> Result<(), FirmoError> {
        stats::save_stats(&self.config.statsfile, &self.data)
    }

    /// Loads the stats file (if present) and merges additively into the
    /// current in-memory map.
    pub fn load_and_merge(&mut self) -> Result<(), FirmoError> {
        if let Some(loaded) = stats::load_stats(&self.config.statsfile)? {
            for (path, datum) in loaded {
                let entry = self.data.entry(path).or_default();
                for (line, count) in datum.hits {
                    *entry.hits.entry(line).or_insert(0) += count;
                }
                entry.max_line = entry.max_line.max(datum.max_line);
            }
        }
        Ok(())
    }

    pub fn report_data(&self) -> CoverageReportData {
        report::build_report(&self.data)
    }

    pub fn threshold(&self) -> Option<f64> {
        self.config.threshold
    }
}

thread_local! {
    static CURRENT: RefCell<Option<CoverageCollector>> = const { RefCell::new(None) };
}

/// Installs `collector` as the process-wide (thread-local) active coverage
/// collector. Safe to call after a prior [`uninstall`] — reinstalling is a
/// no-op on any state beyond replacing the collector.
pub fn install(collector: CoverageCollector) {
    CURRENT.with(|c| *c.borrow_mut() = Some(collector));
}

pub fn uninstall() -> Option<CoverageCollector> {
    CURRENT.with(|c| c.borrow_mut().take())
}

pub fn is_installed() -> bool {
    CURRENT.with(|c| c.borrow().is_some())
}

/// The coverage hook: records that `file:line` executed. A no-op when no
/// collector is installed, so instrumented code need not check first.
pub fn hit(file: &Path, line: u64) {
    CURRENT.with(|c| {
        if let Some(collector) = c.borrow_mut().as_mut() {
            collector.record_hit(file, line, false);
        }
    });
}

pub fn with_current<T>(f: impl FnOnce(&mut CoverageCollector) -> T) -> Option<T> {
    CURRENT.with(|c| c.borrow_mut().as_mut().map(f))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn include_exclude_filters_files() {
        let config = CoverageConfig {
            include: vec!["src/**".to_string()],
            exclude: vec!["src/vendor/**".to_string()],
            ..Default::default()
        };
        let mut c = CoverageCollector::new(config).unwrap();
        c.record_hit(Path::new("src/main.rs"), 1, false);
        c.record_hit(Path::new("src/vendor/x.rs"), 2, false);
        c.record_hit(Path::new("other/y.rs"), 3, false);
        let report = c.report_data();
        assert_eq!(report.files.len(), 1);
        assert!(report.files.contains_key(Path::new("src/main.rs")));
    }

    #[test]
    fn zero_executable_lines_report_full_percent() {
        let c = CoverageCollector::new(CoverageConfig::default()).unwrap();
        let report = c.report_data();
        assert_eq!(report.summary.coverage_percent, 100.0);
    }
}

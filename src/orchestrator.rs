//! Wires options to modules and back to an exit code (C12, §4.10).
//!
//! This crate has no parser/interpreter for the host scripting language —
//! only the execution engine it runs inside. Discovering and evaluating a
//! test file into a [`Registry`] is therefore delegated to a [`FileLoader`]
//! the embedder provides, the same boundary `Runner::run_file`'s `build`
//! closure already draws.

use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use console::{Key, Term};

use crate::config::{self, Config};
use crate::coverage::{CoverageCollector, CoverageConfig};
use crate::error::FirmoError;
use crate::model::{FileResult, QualityReport};
use crate::parallel::WorkerPool;
use crate::quality::{self, QualityConfig};
use crate::registry::{Registry, RunFilter};
use crate::reporting::{self, normalize, AutoSaveEntry, FormatterRegistry, ReportType};
use crate::runner::{Runner, RunnerConfig};
use crate::watcher::{Watcher, WatcherConfig};

/// Evaluates one test file into a freshly built [`Registry`]. Implemented
/// by the host embedding; this crate ships no scripting-language front end.
pub trait FileLoader: Send + Sync {
    fn load(&self, path: &Path, registry: &mut Registry) -> Result<(), FirmoError>;
}

/// The typed CLI/API surface (§6), already parsed; `overrides` carries
/// arbitrary `--key=value` pairs destined for [`Config::set_path`].
#[derive(Debug, Clone, Default)]
pub struct Options {
    pub paths: Vec<PathBuf>,
    pub pattern: Option<String>,
    pub filter: Option<String>,
    pub config_path: Option<PathBuf>,
    pub coverage: bool,
    pub quality: bool,
    pub quality_level: Option<u8>,
    pub threshold: Option<f64>,
    pub watch: bool,
    pub interactive: bool,
    pub parallel: bool,
    pub jobs: Option<usize>,
    pub report: bool,
    pub report_dir: Option<PathBuf>,
    pub report_formats: Vec<String>,
    pub overrides: Vec<(String, String)>,
}

pub struct RunOutcome {
    pub success: bool,
    pub file_results: Vec<FileResult>,
    pub quality: Option<QualityReport>,
    pub report_paths: Vec<PathBuf>,
}

/// Watch-mode keyboard commands (§6): `r` re-run all, `f` re-run failed,
/// `q` quit. INT relies on the process's default SIGINT disposition rather
/// than a dedicated handler, since the desired behavior is simply to stop.
enum WatchCommand {
    RerunAll,
    RerunFailed,
    Quit,
}

fn failed_paths(outcome: &RunOutcome) -> Vec<PathBuf> {
    outcome.file_results.iter().filter(|r| !r.success).map(|r| r.file_path.clone()).collect()
}

pub struct Orchestrator<L: FileLoader> {
    loader: Arc<L>,
    exe: PathBuf,
}

impl<L: FileLoader + 'static> Orchestrator<L> {
    pub fn new(loader: L) -> Self {
        Orchestrator {
            loader: Arc::new(loader),
            exe: std::env::current_exe().unwrap_or_else(|_| PathBuf::from("firmo")),
        }
    }

    /// Runs once (discovery through reporting); if `options.watch` is set,
    /// keeps re-running on file changes (and, on a TTY with
    /// `options.interactive`, on `r`/`f` keypresses) until `q` or the
    /// watcher's own termination condition is reached (§6 "Watch keyboard
    /// interface").
    pub fn run(&self, options: &Options) -> Result<RunOutcome, FirmoError> {
        let work_dir = std::env::current_dir().map_err(FirmoError::from)?;
        let config = self.effective_config(&work_dir, options)?;

        let mut outcome = self.run_once(options, &config)?;

        if options.watch {
            let base_dir = options.paths.first().cloned().unwrap_or(work_dir);
            let watcher_config = WatcherConfig {
                tick_s: config.watcher.tick_s.unwrap_or(1.0),
                debounce_s: config.watcher.debounce_s.unwrap_or(0.5),
                exclude: config.watcher.exclude.clone(),
            };
            let tick = Duration::from_secs_f64(watcher_config.tick_s);
            let debounce = Duration::from_secs_f64(watcher_config.debounce_s);
            let mut watcher = Watcher::new(&base_dir, watcher_config)?;

            let (key_tx, key_rx) = mpsc::channel::<WatchCommand>();
            // Held for the loop's whole lifetime so the channel never looks
            // disconnected when no reader thread is spawned below.
            let _key_tx_keepalive = key_tx.clone();
            if options.interactive && std::io::stdin().is_terminal() {
                std::thread::spawn(move || {
                    let term = Term::stdout();
                    loop {
                        let command = match term.read_key() {
                            Ok(Key::Char('r')) => WatchCommand::RerunAll,
                            Ok(Key::Char('f')) => WatchCommand::RerunFailed,
                            Ok(Key::Char('q')) => WatchCommand::Quit,
                            Ok(_) => continue,
                            Err(_) => break,
                        };
                        let quit = matches!(command, WatchCommand::Quit);
                        if key_tx.send(command).is_err() || quit {
                            break;
                        }
                    }
                });
            }

            let mut last_failed: Vec<PathBuf> = failed_paths(&outcome);
            'watch: loop {
                match key_rx.recv_timeout(tick) {
                    Ok(WatchCommand::Quit) => break 'watch,
                    Ok(WatchCommand::RerunAll) => {
                        outcome = self.rerun(options.clone(), &config, &mut last_failed);
                    }
                    Ok(WatchCommand::RerunFailed) => {
                        if !last_failed.is_empty() {
                            let rerun_options = Options { paths: last_failed.clone(), ..options.clone() };
                            outcome = self.rerun(rerun_options, &config, &mut last_failed);
                        }
                    }
                    Err(_) => {
                        let mut changed = watcher.poll_once();
                        if changed.is_empty() {
                            continue;
                        }
                        std::thread::sleep(debounce);
                        changed.extend(watcher.poll_once());
                        changed.sort();
                        changed.dedup();
                        let rerun_options = if changed.len() == 1 {
                            Options { paths: vec![changed[0].clone()], ..options.clone() }
                        } else {
                            options.clone()
                        };
                        outcome = self.rerun(rerun_options, &config, &mut last_failed);
                    }
                }
            }
        }

        Ok(outcome)
    }

    fn rerun(&self, options: Options, config: &Config, last_failed: &mut Vec<PathBuf>) -> RunOutcome {
        match self.run_once(&options, config) {
            Ok(outcome) => {
                *last_failed = failed_paths(&outcome);
                outcome
            }
            Err(e) => {
                tracing::error!("watch re-run failed: {e}");
                RunOutcome { success: false, file_results: Vec::new(), quality: None, report_paths: Vec::new() }
            }
        }
    }

    fn effective_config(&self, work_dir: &Path, options: &Options) -> Result<Config, FirmoError> {
        let mut config = config::load(work_dir, options.config_path.as_deref())?;
        for (key, value) in &options.overrides {
            config.set_path(key, value)?;
        }
        if options.coverage {
            config.coverage.enabled = true;
        }
        if options.quality {
            config.quality.enabled = true;
        }
        if let Some(level) = options.quality_level {
            config.quality.level = level;
        }
        if let Some(threshold) = options.threshold {
            config.coverage.threshold = Some(threshold);
        }
        if let Some(dir) = &options.report_dir {
            config.reporting.dir = Some(dir.display().to_string());
        }
        if !options.report_formats.is_empty() {
            config.reporting.formats = options.report_formats.clone();
        }
        if let Some(jobs) = options.jobs {
            config.parallel.jobs = Some(jobs);
        }
        Ok(config)
    }

    fn run_once(&self, options: &Options, config: &Config) -> Result<RunOutcome, FirmoError> {
        let files = discover_files(&options.paths, options.pattern.as_deref(), &config.coverage.exclude)?;

        let coverage_collector = if config.coverage.enabled {
            match CoverageCollector::new(coverage_config_from(config)) {
                Ok(mut c) => {
                    let _ = c.load_and_merge();
                    Some(c)
                }
                Err(e) => {
                    tracing::warn!("coverage initialization failed, continuing without it: {e}");
                    None
                }
            }
        } else {
            None
        };
        let coverage_init_success = !config.coverage.enabled || coverage_collector.is_some();
        if let Some(collector) = coverage_collector {
            crate::coverage::install(collector);
        }

        let filter = RunFilter { tags: Vec::new(), name_pattern: options.filter.clone() };

        let (file_results, tests_success) = if options.parallel {
            let jobs = config.parallel.jobs.unwrap_or_else(num_cpus_fallback);
            let pool = WorkerPool::new(jobs, self.exe.clone(), Vec::new());
            pool.run(&files)
        } else {
            let runner = Runner::new(RunnerConfig { fail_fast: false });
            let results: Vec<FileResult> = files
                .iter()
                .map(|file| {
                    let loader = self.loader.clone();
                    let file = file.clone();
                    runner.run_file(&file, &filter, |registry| loader.load(&file, registry))
                })
                .collect();
            let success = results.iter().all(|r| r.success);
            (results, success)
        };

        let coverage_report = if config.coverage.enabled {
            crate::coverage::with_current(|c| {
                let _ = c.save();
                c.report_data()
            })
        } else {
            None
        };
        crate::coverage::uninstall();

        let threshold_ok = match (config.coverage.threshold, &coverage_report) {
            (Some(threshold), Some(report)) => report.summary.coverage_percent >= threshold,
            _ => true,
        };

        let quality_report = if config.quality.enabled {
            let quality_config = QualityConfig { target_level: config.quality.level.max(1), ..QualityConfig::default() };
            Some(quality::grade(&file_results, &quality_config))
        } else {
            None
        };

        let now = Utc::now();
        let mut report_paths = Vec::new();
        let mut reporting_success = true;
        if options.report {
            let report_dir = config.reporting.dir.as_deref().map(PathBuf::from).unwrap_or_else(|| PathBuf::from("reports"));
            let formats = if config.reporting.formats.is_empty() { vec!["json".to_string()] } else { config.reporting.formats.clone() };
            let registry = FormatterRegistry::with_builtins();

            let results_report = normalize::from_results(&file_results, now);
            let mut entries = vec![AutoSaveEntry { report_type: ReportType::Results, report: &results_report }];
            let coverage_normalized = coverage_report.as_ref().map(|data| normalize::from_coverage(data, now));
            if let Some(report) = &coverage_normalized {
                entries.push(AutoSaveEntry { report_type: ReportType::Coverage, report });
            }
            let quality_normalized = quality_report.as_ref().map(|report| normalize::from_quality(report, now));
            if let Some(report) = &quality_normalized {
                entries.push(AutoSaveEntry { report_type: ReportType::Quality, report });
            }

            match reporting::auto_save(&registry, &entries, &formats, &report_dir, config.reporting.template.as_deref(), now, "") {
                Ok(paths) => report_paths = paths,
                Err(e) => {
                    tracing::error!("report generation failed: {e}");
                    reporting_success = false;
                }
            }
        }

        let success = tests_success && coverage_init_success && threshold_ok && reporting_success;

        Ok(RunOutcome { success, file_results, quality: quality_report, report_paths })
    }
}

fn num_cpus_fallback() -> usize {
    std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1)
}

fn coverage_config_from(config: &Config) -> CoverageConfig {
    let section = &config.coverage;
    let mut cfg = CoverageConfig::default();
    if !section.include.is_empty() {
        cfg.include = section.include.clone();
    }
    if !section.exclude.is_empty() {
        cfg.exclude = section.exclude.clone();
    }
    if let Some(stats_file) = &section.stats_file {
        cfg.statsfile = PathBuf::from(stats_file);
    }
    if let Some(tick) = section.tick {
        cfg.tick = tick > 0;
    }
    if let Some(step) = section.save_step_size {
        cfg.savestepsize = step;
    }
    cfg.threshold = section.threshold;
    cfg
}

/// Discovers test files from explicit paths and directories. The first
/// positional directory becomes the base search root for `pattern`;
/// explicit files are included verbatim.
pub fn discover_files(paths: &[PathBuf], pattern: Option<&str>, exclude: &[String]) -> Result<Vec<PathBuf>, FirmoError> {
    let exclude_set = config::build_ignore_set(exclude).map_err(|e| FirmoError::validation(format!("invalid exclude pattern: {e}")))?;
    let pattern = pattern.unwrap_or("**/*_test.*");
    let glob = globset::Glob::new(pattern).map_err(|e| FirmoError::validation(format!("invalid test pattern {pattern:?}: {e}")))?.compile_matcher();

    let roots: Vec<PathBuf> = if paths.is_empty() { vec![PathBuf::from(".")] } else { paths.to_vec() };
    let mut files = Vec::new();
    for root in &roots {
        if root.is_file() {
            files.push(root.clone());
            continue;
        }
        for entry in walkdir::WalkDir::new(root).into_iter().filter_map(Result::ok) {
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            if exclude_set.is_match(path) {
                continue;
            }
            if glob.is_match(path) {
                files.push(path.to_path_buf());
            }
        }
    }
    files.sort();
    files.dedup();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn discover_files_respects_exclude_patterns() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a_test.lua"), "").unwrap();
        fs::create_dir_all(dir.path().join("vendor")).unwrap();
        fs::write(dir.path().join("vendor/b_test.lua"), "").unwrap();
        let files = discover_files(&[dir.path().to_path_buf()], Some("**/*_test.lua"), &["**/vendor/**".to_string()]).unwrap();
        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with("a_test.lua"));
    }

    #[test]
    fn discover_files_accepts_an_explicit_file_regardless_of_pattern() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("anything.lua");
        fs::write(&file, "").unwrap();
        let files = discover_files(&[file.clone()], Some("**/*_test.lua"), &[]).unwrap();
        assert_eq!(files, vec![file]);
    }
}

//! Cross-process parallel file runner (C11, §4.9).
//!
//! One OS process per test file, bounded by a worker count. Each worker
//! re-invokes this binary for a single file with a JSON-emit flag; its
//! stdout interleaves human-readable output with one line bracketed
//! exactly by [`RESULTS_JSON_BEGIN`]/[`RESULTS_JSON_END`] carrying a
//! serialized [`FileResult`]. The parent scans for those markers (the last
//! occurrence wins per worker) and aggregates.

use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::thread;
use std::time::Instant;

use crate::error::FirmoError;
use crate::model::FileResult;

pub const RESULTS_JSON_BEGIN: &str = "RESULTS_JSON_BEGIN";
pub const RESULTS_JSON_END: &str = "RESULTS_JSON_END";

struct WorkerOutcome {
    file: PathBuf,
    result: Option<FileResult>,
    exit_success: bool,
    elapsed_s: f64,
}

/// Bounded pool of worker processes, one test file per invocation.
pub struct WorkerPool {
    jobs: usize,
    exe: PathBuf,
    extra_args: Vec<String>,
}

impl WorkerPool {
    pub fn new(jobs: usize, exe: PathBuf, extra_args: Vec<String>) -> Self {
        WorkerPool { jobs: jobs.max(1), exe, extra_args }
    }

    /// Runs `files` across up to `jobs` concurrent worker processes.
    /// Aggregated `success` is the AND of every worker's parsed
    /// `FileResult::success` and its exit code being 0; a worker that
    /// produces no markers at all counts as a structural failure for that
    /// file rather than aborting the whole run.
    pub fn run(&self, files: &[PathBuf]) -> (Vec<FileResult>, bool) {
        let slots: Mutex<Vec<Option<WorkerOutcome>>> = Mutex::new((0..files.len()).map(|_| None).collect());
        let next_index = AtomicUsize::new(0);
        let worker_count = self.jobs.min(files.len().max(1));

        thread::scope(|scope| {
            for _ in 0..worker_count {
                scope.spawn(|| loop {
                    let i = next_index.fetch_add(1, Ordering::SeqCst);
                    if i >= files.len() {
                        break;
                    }
                    let outcome = self.run_one(&files[i]);
                    slots.lock().expect("worker pool mutex poisoned")[i] = Some(outcome);
                });
            }
        });

        let outcomes: Vec<WorkerOutcome> = slots.into_inner().expect("worker pool mutex poisoned").into_iter().map(|o| o.expect("every index was visited by exactly one worker")).collect();

        let mut file_results = Vec::with_capacity(outcomes.len());
        let mut all_success = true;
        for outcome in outcomes {
            if !outcome.exit_success {
                all_success = false;
            }
            match outcome.result {
                Some(fr) => {
                    if !fr.success {
                        all_success = false;
                    }
                    file_results.push(fr);
                }
                None => {
                    all_success = false;
                    file_results.push(FileResult::structural_failure(
                        outcome.file,
                        FirmoError::execution("worker process produced no RESULTS_JSON block"),
                        outcome.elapsed_s,
                    ));
                }
            }
        }
        (file_results, all_success)
    }

    fn run_one(&self, file: &Path) -> WorkerOutcome {
        let start = Instant::now();
        let mut command = Command::new(&self.exe);
        command.arg("run").arg(file).arg("--json").args(&self.extra_args).stdout(Stdio::piped()).stderr(Stdio::inherit());

        let mut child = match command.spawn() {
            Ok(c) => c,
            Err(e) => {
                eprintln!("failed to spawn worker for {}: {e}", file.display());
                return WorkerOutcome {
                    file: file.to_path_buf(),
                    result: None,
                    exit_success: false,
                    elapsed_s: start.elapsed().as_secs_f64(),
                };
            }
        };

        let stdout = child.stdout.take().expect("stdout was piped");
        let mut last_json: Option<String> = None;
        let mut in_block = false;
        let mut current = String::new();
        for line in BufReader::new(stdout).lines().map_while(Result::ok) {
            if line.trim() == RESULTS_JSON_BEGIN {
                in_block = true;
                current.clear();
                continue;
            }
            if line.trim() == RESULTS_JSON_END {
                in_block = false;
                last_json = Some(current.clone());
                continue;
            }
            if in_block {
                current.push_str(&line);
            } else {
                println!("{line}");
            }
        }

        let exit_status = child.wait();
        let exit_success = matches!(exit_status, Ok(status) if status.success());
        let result = last_json.and_then(|json| serde_json::from_str(&json).ok());

        WorkerOutcome {
            file: file.to_path_buf(),
            result,
            exit_success,
            elapsed_s: start.elapsed().as_secs_f64(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_list_produces_no_outcomes() {
        let pool = WorkerPool::new(4, PathBuf::from("/bin/true"), vec![]);
        let (results, success) = pool.run(&[]);
        assert!(results.is_empty());
        assert!(success);
    }

    #[test]
    fn a_worker_with_no_markers_is_a_structural_failure() {
        // `/bin/true` exits 0 but emits nothing, so no RESULTS_JSON block
        // is ever seen for the file.
        let pool = WorkerPool::new(1, PathBuf::from("/bin/true"), vec![]);
        let (results, success) = pool.run(&[PathBuf::from("a_test.lua")]);
        assert_eq!(results.len(), 1);
        assert!(!results[0].success);
        assert!(!success);
    }
}

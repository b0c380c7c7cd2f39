//! Poll-based file watcher for watch mode (§4.9).
//!
//! Polling instead of OS file events: a directory snapshot of `{path ->
//! (mtime, size)}` is diffed on a fixed tick, with excluded paths dropped
//! from both the snapshot and the change set before anything is reported.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use globset::GlobSet;
use walkdir::WalkDir;

use crate::config::build_ignore_set;
use crate::error::FirmoError;

type Snapshot = HashMap<PathBuf, (SystemTime, u64)>;

#[derive(Debug, Clone)]
pub struct WatcherConfig {
    pub tick_s: f64,
    pub debounce_s: f64,
    pub exclude: Vec<String>,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        WatcherConfig {
            tick_s: 1.0,
            debounce_s: 0.5,
            exclude: Vec::new(),
        }
    }
}

fn scan(root: &Path, exclude_set: &GlobSet) -> Snapshot {
    let mut snapshot = Snapshot::new();
    for entry in WalkDir::new(root).into_iter().filter_map(Result::ok) {
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        if exclude_set.is_match(path) {
            continue;
        }
        if let Ok(meta) = entry.metadata() {
            let mtime = meta.modified().unwrap_or(SystemTime::UNIX_EPOCH);
            snapshot.insert(path.to_path_buf(), (mtime, meta.len()));
        }
    }
    snapshot
}

fn diff(old: &Snapshot, new: &Snapshot) -> Vec<PathBuf> {
    let mut changed = Vec::new();
    for (path, stamp) in new {
        match old.get(path) {
            Some(old_stamp) if old_stamp == stamp => {}
            _ => changed.push(path.clone()),
        }
    }
    for path in old.keys() {
        if !new.contains_key(path) {
            changed.push(path.clone());
        }
    }
    changed
}

/// Watches `root` for changes under the poll/snapshot/debounce model.
pub struct Watcher {
    root: PathBuf,
    exclude_set: GlobSet,
    config: WatcherConfig,
    snapshot: Snapshot,
}

impl Watcher {
    pub fn new(root: &Path, config: WatcherConfig) -> Result<Self, FirmoError> {
        let exclude_set = build_ignore_set(&config.exclude).map_err(|e| FirmoError::io(format!("building watcher exclude set: {e}")))?;
        let snapshot = scan(root, &exclude_set);
        Ok(Watcher {
            root: root.to_path_buf(),
            exclude_set,
            config,
            snapshot,
        })
    }

    /// Takes a fresh snapshot, diffs it against the last one, and replaces
    /// the stored snapshot. Returns the changed paths (empty if nothing
    /// changed since the last call).
    pub fn poll_once(&mut self) -> Vec<PathBuf> {
        let new_snapshot = scan(&self.root, &self.exclude_set);
        let changed = diff(&self.snapshot, &new_snapshot);
        self.snapshot = new_snapshot;
        changed
    }

    /// Blocks forever, calling `on_change` with the debounced change set
    /// whenever the watched tree differs from its last snapshot. A single
    /// file changing reports just that file; any other change (including a
    /// deletion, or more than one file) reports the union of every changed
    /// path observed during the debounce window.
    pub fn watch(&mut self, mut on_change: impl FnMut(&[PathBuf])) -> ! {
        loop {
            std::thread::sleep(Duration::from_secs_f64(self.config.tick_s));
            let mut changed = self.poll_once();
            if changed.is_empty() {
                continue;
            }
            std::thread::sleep(Duration::from_secs_f64(self.config.debounce_s));
            changed.extend(self.poll_once());
            changed.sort();
            changed.dedup();
            on_change(&changed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn unchanged_tree_reports_no_changes() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a_test.lua"), "return {}").unwrap();
        let mut watcher = Watcher::new(dir.path(), WatcherConfig::default()).unwrap();
        assert!(watcher.poll_once().is_empty());
    }

    #[test]
    fn modifying_a_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a_test.lua");
        fs::write(&file, "return {}").unwrap();
        let mut watcher = Watcher::new(dir.path(), WatcherConfig::default()).unwrap();
        fs::write(&file, "return {n=1}").unwrap();
        let changed = watcher.poll_once();
        assert_eq!(changed, vec![file]);
    }

    #[test]
    fn excluded_paths_are_never_reported() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("vendor")).unwrap();
        let excluded = dir.path().join("vendor/dep_test.lua");
        fs::write(&excluded, "return {}").unwrap();
        let config = WatcherConfig {
            exclude: vec!["**/vendor/**".to_string()],
            ..WatcherConfig::default()
        };
        let mut watcher = Watcher::new(dir.path(), config).unwrap();
        fs::write(&excluded, "return {n=1}").unwrap();
        assert!(watcher.poll_once().is_empty());
    }

    #[test]
    fn new_and_deleted_files_are_both_reported() {
        let dir = tempfile::tempdir().unwrap();
        let kept = dir.path().join("kept_test.lua");
        let removed = dir.path().join("removed_test.lua");
        fs::write(&kept, "return {}").unwrap();
        fs::write(&removed, "return {}").unwrap();
        let mut watcher = Watcher::new(dir.path(), WatcherConfig::default()).unwrap();
        fs::remove_file(&removed).unwrap();
        let added = dir.path().join("added_test.lua");
        fs::write(&added, "return {}").unwrap();
        let mut changed = watcher.poll_once();
        changed.sort();
        let mut expected = vec![added, removed];
        expected.sort();
        assert_eq!(changed, expected);
    }
}

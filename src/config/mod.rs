//! Central configuration (§6 "Config file"): typed sections per ambient
//! module, file-then-CLI overlay (CLI wins), upward directory search, and a
//! change-notification observer list for subscribers that must react to a
//! live config update.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::FirmoError;

pub const CONFIG_FILENAME: &str = ".firmo-config.json";

#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct CoverageSection {
    pub enabled: bool,
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    pub threshold: Option<f64>,
    pub stats_file: Option<String>,
    pub tick: Option<u64>,
    pub save_step_size: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct QualitySection {
    pub enabled: bool,
    pub level: u8,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ReportingSection {
    pub dir: Option<String>,
    pub formats: Vec<String>,
    pub template: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct TempFileSection {
    pub base_dir: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct InteractiveSection {
    pub enabled: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingSection {
    pub level: Option<String>,
    pub json: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct WatcherSection {
    pub tick_s: Option<f64>,
    pub debounce_s: Option<f64>,
    pub exclude: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ParallelSection {
    pub jobs: Option<usize>,
}

/// Declarative config record, `{coverage, quality, reporting, temp_file,
/// interactive, logging, watcher, parallel}` plus any unrecognized
/// top-level key (captured so `--key=value` can still target it).
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    pub coverage: CoverageSection,
    pub quality: QualitySection,
    pub reporting: ReportingSection,
    pub temp_file: TempFileSection,
    pub interactive: InteractiveSection,
    pub logging: LoggingSection,
    pub watcher: WatcherSection,
    pub parallel: ParallelSection,
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

impl Config {
    /// Sets a dotted path (e.g. `coverage.threshold`) to a value parsed as
    /// bool, then number, then falling back to string, matching the CLI's
    /// "arbitrary `--key=value` sets the central-config path `key` to
    /// `value` (typed parse)".
    pub fn set_path(&mut self, key: &str, raw_value: &str) -> Result<(), FirmoError> {
        let mut json = serde_json::to_value(&*self).map_err(FirmoError::from)?;
        set_json_path(&mut json, key, parse_cli_value(raw_value));
        *self = serde_json::from_value(json).map_err(|e| FirmoError::validation(format!("invalid value for {key}: {e}")))?;
        Ok(())
    }
}

fn parse_cli_value(raw: &str) -> Value {
    if let Ok(b) = raw.parse::<bool>() {
        return Value::Bool(b);
    }
    if let Ok(n) = raw.parse::<i64>() {
        return Value::Number(n.into());
    }
    if let Ok(f) = raw.parse::<f64>() {
        if let Some(num) = serde_json::Number::from_f64(f) {
            return Value::Number(num);
        }
    }
    Value::String(raw.to_string())
}

fn set_json_path(root: &mut Value, path: &str, value: Value) {
    let mut parts = path.split('.').peekable();
    let mut current = root;
    while let Some(part) = parts.next() {
        if !current.is_object() {
            *current = Value::Object(Default::default());
        }
        let object = current.as_object_mut().expect("just normalized to an object");
        if parts.peek().is_none() {
            object.insert(part.to_string(), value);
            return;
        }
        current = object.entry(part.to_string()).or_insert_with(|| Value::Object(Default::default()));
    }
}

/// Searches `dir` and its ancestors for [`CONFIG_FILENAME`].
pub fn find_config_in_parents(mut dir: &Path) -> Option<PathBuf> {
    loop {
        let candidate = dir.join(CONFIG_FILENAME);
        if candidate.exists() {
            return Some(candidate);
        }
        dir = dir.parent()?;
    }
}

/// Loads config from `custom_path` if given, else searches upward from
/// `work_dir`; falls back to `Config::default()` if nothing is found. A
/// user config file takes precedence over built-in defaults (§6).
pub fn load(work_dir: &Path, custom_path: Option<&Path>) -> Result<Config, FirmoError> {
    let path = match custom_path {
        Some(p) => {
            let full = if p.is_absolute() { p.to_path_buf() } else { work_dir.join(p) };
            if !full.exists() {
                return Err(FirmoError::validation(format!("config file not found: {}", full.display())));
            }
            Some(full)
        }
        None => find_config_in_parents(work_dir),
    };
    match path {
        Some(path) => {
            let content = fs::read_to_string(&path).map_err(|e| FirmoError::io(format!("reading config {}: {e}", path.display())))?;
            serde_json::from_str(&content).map_err(|e| FirmoError::validation(format!("invalid config {}: {e}", path.display())))
        }
        None => Ok(Config::default()),
    }
}

/// Builds a `GlobSet` from include/exclude patterns, shared by coverage and
/// the watcher.
pub fn build_ignore_set(patterns: &[String]) -> anyhow::Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern).map_err(|e| anyhow::anyhow!("invalid glob pattern {pattern:?}: {e}"))?);
    }
    builder.build().map_err(|e| anyhow::anyhow!("{e}"))
}

/// Live config cell with subscriber notification. Writes trigger
/// notification; subscribers must be idempotent, since a write can be
/// observed more than once under concurrent overlay (CLI then watch-mode
/// config reload).
pub struct ConfigCell {
    current: Mutex<Config>,
    observers: Mutex<Vec<Box<dyn Fn(&Config) + Send + Sync>>>,
}

impl ConfigCell {
    pub fn new(config: Config) -> Self {
        ConfigCell {
            current: Mutex::new(config),
            observers: Mutex::new(Vec::new()),
        }
    }

    pub fn get(&self) -> Config {
        self.current.lock().expect("config mutex poisoned").clone()
    }

    pub fn subscribe(&self, observer: Box<dyn Fn(&Config) + Send + Sync>) {
        self.observers.lock().expect("config mutex poisoned").push(observer);
    }

    pub fn set(&self, config: Config) {
        *self.current.lock().expect("config mutex poisoned") = config.clone();
        for observer in self.observers.lock().expect("config mutex poisoned").iter() {
            observer(&config);
        }
    }
}

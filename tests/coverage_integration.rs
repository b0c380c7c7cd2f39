//! Seed scenario 6: coverage accumulation, include/exclude filtering,
//! additive merge across runs, and threshold gating.

use firmo::coverage::{CoverageCollector, CoverageConfig};

fn glob_config(dir: &tempfile::TempDir) -> CoverageConfig {
    CoverageConfig {
        include: vec!["src/**".to_string()],
        exclude: vec!["src/vendor/**".to_string()],
        statsfile: dir.path().join("coverage.stats"),
        ..CoverageConfig::default()
    }
}

fn record_five_of_ten(collector: &mut CoverageCollector, file: &str) {
    for line in 1..=10 {
        collector.declare_executable(std::path::Path::new(file), line);
    }
    for line in 1..=5 {
        collector.record_hit(std::path::Path::new(file), line, false);
    }
}

#[test]
fn two_files_half_covered_yield_fifty_percent_summary() {
    let dir = tempfile::tempdir().unwrap();
    let mut collector = CoverageCollector::new(glob_config(&dir)).unwrap();
    record_five_of_ten(&mut collector, "src/a.rs");
    record_five_of_ten(&mut collector, "src/b.rs");

    let report = collector.report_data();
    assert_eq!(report.summary.total_executable, 20);
    assert_eq!(report.summary.total_covered, 10);
    assert_eq!(report.summary.coverage_percent, 50.0);
}

#[test]
fn running_the_same_suite_twice_merges_additively_without_new_covered_lines() {
    let dir = tempfile::tempdir().unwrap();
    {
        let mut collector = CoverageCollector::new(glob_config(&dir)).unwrap();
        record_five_of_ten(&mut collector, "src/a.rs");
        collector.save().unwrap();
    }
    let mut second = CoverageCollector::new(glob_config(&dir)).unwrap();
    record_five_of_ten(&mut second, "src/a.rs");
    second.load_and_merge().unwrap();

    let report = second.report_data();
    assert_eq!(report.summary.total_covered, 5, "no new lines became covered");
    let hits = &report.files[std::path::Path::new("src/a.rs")].hits;
    assert_eq!(hits[&1], 2, "hit counts double across the two runs");
}

#[test]
fn threshold_60_fails_threshold_40_passes_at_50_percent_coverage() {
    let dir = tempfile::tempdir().unwrap();
    let mut high = glob_config(&dir);
    high.threshold = Some(60.0);
    let mut collector = CoverageCollector::new(high).unwrap();
    record_five_of_ten(&mut collector, "src/a.rs");
    record_five_of_ten(&mut collector, "src/b.rs");
    let report = collector.report_data();
    assert!(report.summary.coverage_percent < 60.0);

    let mut low = glob_config(&dir);
    low.threshold = Some(40.0);
    let mut collector = CoverageCollector::new(low).unwrap();
    record_five_of_ten(&mut collector, "src/a.rs");
    record_five_of_ten(&mut collector, "src/b.rs");
    let report = collector.report_data();
    assert!(report.summary.coverage_percent >= 40.0);
}

#[test]
fn exclude_pattern_removes_vendored_files_from_the_report() {
    let dir = tempfile::tempdir().unwrap();
    let mut collector = CoverageCollector::new(glob_config(&dir)).unwrap();
    collector.record_hit(std::path::Path::new("src/vendor/x.rs"), 1, false);
    collector.record_hit(std::path::Path::new("other/y.rs"), 1, false);
    collector.record_hit(std::path::Path::new("src/main.rs"), 1, false);

    let report = collector.report_data();
    assert_eq!(report.files.len(), 1);
    assert!(report.files.contains_key(std::path::Path::new("src/main.rs")));
}


//! Five-level progressive grading over already-computed `TestResult`s (§4.7,
//! C8). Pure: takes the Runner's output, produces a `QualityReport`, keeps
//! no state of its own.

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::model::{FileResult, QualityIssue, QualityReport, QualitySummary, TestQuality, TestResult};

/// Matcher categories that count toward Level 2's restricted set.
const LEVEL2_CATEGORIES: [&str; 3] = ["Equality", "Truthiness", "Type"];

/// Tunables the spec leaves as an open question: what counts as an
/// "edge-case" or "boundary-condition" test is a name heuristic, and it's
/// deliberately a replaceable predicate rather than a hardcoded list.
pub struct QualityConfig {
    pub target_level: u8,
    pub edge_case_predicate: Box<dyn Fn(&str) -> bool>,
    pub boundary_case_predicate: Box<dyn Fn(&str) -> bool>,
}

impl Default for QualityConfig {
    fn default() -> Self {
        QualityConfig {
            target_level: 3,
            edge_case_predicate: Box::new(default_edge_case_predicate),
            boundary_case_predicate: Box::new(default_boundary_case_predicate),
        }
    }
}

fn default_edge_case_predicate(name: &str) -> bool {
    let lower = name.to_lowercase();
    ["edge", "boundary", "empty", "null", "invalid", "error"]
        .iter()
        .any(|k| lower.contains(k))
}

fn default_boundary_case_predicate(name: &str) -> bool {
    name.to_lowercase().contains("boundary")
}

/// Facts about the tests sharing one immediate enclosing `describe`, used by
/// the suite-level checks at Levels 3-5.
#[derive(Default)]
struct GroupFacts {
    uses_hooks: bool,
    all_mocks_restored: bool,
    has_edge_case: bool,
    has_boundary_case: bool,
    mock_verification_used: bool,
    has_expected_error_test: bool,
}

impl GroupFacts {
    fn new() -> Self {
        GroupFacts {
            all_mocks_restored: true,
            ..Default::default()
        }
    }
}

fn group_key(path: &[String]) -> String {
    if path.len() <= 1 {
        String::new()
    } else {
        path[..path.len() - 1].join(" > ")
    }
}

fn distinct_categories(test: &TestResult) -> HashSet<&str> {
    test.matcher_categories.iter().map(String::as_str).collect()
}

fn restricted_category_count(test: &TestResult) -> usize {
    let present = distinct_categories(test);
    LEVEL2_CATEGORIES.iter().filter(|c| present.contains(**c)).count()
}

fn path_mentions_unit_or_integration(path: &[String]) -> bool {
    path[..path.len().saturating_sub(1)].iter().any(|p| {
        let lower = p.to_lowercase();
        lower.contains("unit") || lower.contains("integration")
    })
}

fn issue(category: &str, message: impl Into<String>, example_fix: Option<&str>) -> QualityIssue {
    QualityIssue {
        category: category.to_string(),
        message: message.into(),
        example_fix: example_fix.map(str::to_string),
    }
}

/// Grades every test across `files` and rolls the result up into a report.
pub fn grade(files: &[FileResult], config: &QualityConfig) -> QualityReport {
    let all_tests: Vec<&TestResult> = files.iter().flat_map(|f| f.results.iter()).collect();

    let mut structural_issues = Vec::new();
    for f in files {
        for path in &f.empty_describes {
            structural_issues.push(issue(
                "empty_describe",
                format!("describe {path:?} has no tests in itself or any descendant"),
                Some("add an it(...) inside it, or remove the empty describe"),
            ));
        }
    }

    let mut groups: HashMap<String, GroupFacts> = HashMap::new();
    for t in &all_tests {
        let g = groups.entry(group_key(&t.path)).or_insert_with(GroupFacts::new);
        g.uses_hooks |= t.suite_uses_hooks;
        if t.mock_leaks > 0 {
            g.all_mocks_restored = false;
        }
        if (config.edge_case_predicate)(&t.name) {
            g.has_edge_case = true;
        }
        if (config.boundary_case_predicate)(&t.name) {
            g.has_boundary_case = true;
        }
        if t.matcher_categories.iter().any(|c| c == "Mock") {
            g.mock_verification_used = true;
        }
        if t.expect_error_expected {
            g.has_expected_error_test = true;
        }
    }

    let mut per_test = BTreeMap::new();
    let mut distribution: BTreeMap<String, usize> = BTreeMap::new();
    let mut tests_passing_quality = 0;

    for test in &all_tests {
        let group = groups.get(&group_key(&test.path)).expect("every test has a group entry");
        let (achieved, issues) = grade_one(test, group);

        for c in &test.matcher_categories {
            *distribution.entry(c.clone()).or_insert(0) += 1;
        }
        if achieved >= config.target_level {
            tests_passing_quality += 1;
        }
        per_test.insert(test.path_string.clone(), TestQuality { achieved, issues });
    }

    let achieved_level = if all_tests.is_empty() {
        0
    } else {
        (1u8..=5)
            .rev()
            .find(|&n| all_tests.iter().all(|t| per_test[&t.path_string].achieved >= n))
            .unwrap_or(0)
    };

    QualityReport {
        target_level: config.target_level,
        per_test,
        summary: QualitySummary {
            tests_analyzed: all_tests.len(),
            tests_passing_quality,
            assertion_type_distribution: distribution,
            achieved_level,
        },
        structural_issues,
    }
}

fn grade_one(test: &TestResult, group: &GroupFacts) -> (u8, Vec<QualityIssue>) {
    let mut issues = Vec::new();

    let check1 = test.assertion_count >= 1 && test.path.len() >= 2 && !test.name.trim().is_empty();
    if !check1 {
        issues.push(issue(
            "level_1",
            "test has no assertions, is not nested in a describe, or has an empty name",
            Some("add expect(...) assertions inside a named describe block"),
        ));
        return (0, issues);
    }

    let check2 = test.assertion_count >= 2 && restricted_category_count(test) >= 2;
    if !check2 {
        issues.push(issue(
            "level_2",
            "fewer than 2 assertions, or fewer than 2 distinct matcher categories among equality/truthiness/type",
            Some("exercise at least two different kinds of assertion, e.g. expect(x).to.equal(y) and expect(x).to.be_a(\"table\")"),
        ));
        return (1, issues);
    }

    let check3 = distinct_categories(test).len() >= 3
        && group.uses_hooks
        && group.all_mocks_restored
        && group.has_edge_case;
    if !check3 {
        issues.push(issue(
            "level_3",
            "missing one of: 3 distinct matcher categories, before/after in the suite, a restored mock, or a sibling edge-case test",
            Some("add a describe-level before/after and at least one edge-case-named test (e.g. \"handles empty input\")"),
        ));
        return (2, issues);
    }

    let check4 = group.has_boundary_case && group.mock_verification_used && path_mentions_unit_or_integration(&test.path);
    if !check4 {
        issues.push(issue(
            "level_4",
            "missing one of: a boundary-condition sibling test, mock call verification, or unit/integration grouping in the describe path",
            Some("nest the suite under a \"unit\"/\"integration\" describe and call mock:verify() on at least one stubbed call"),
        ));
        return (3, issues);
    }

    let check5 = distinct_categories(test).len() >= 5 && group.has_expected_error_test && group.all_mocks_restored;
    if !check5 {
        issues.push(issue(
            "level_5",
            "missing one of: 5 distinct matcher categories, a sibling expected-error test, or a fully leak-free mock lifecycle",
            Some("add an it(\"rejects invalid input\", {expect_error = true}, ...) test to the suite"),
        ));
        return (4, issues);
    }

    (5, issues)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FileResult, TestStatus};
    use std::path::PathBuf;

    fn test_result(path: Vec<&str>, assertion_count: usize, categories: &[&str]) -> TestResult {
        let path: Vec<String> = path.into_iter().map(String::from).collect();
        TestResult {
            name: path.last().cloned().unwrap_or_default(),
            path_string: TestResult::path_string(&path),
            path,
            status: TestStatus::Pass,
            error_message: None,
            error_value: None,
            reason: None,
            execution_time_s: 0.0,
            file_path: PathBuf::from("f.lua"),
            expect_error_expected: false,
            tags: Vec::new(),
            matcher_categories: categories.iter().map(|s| s.to_string()).collect(),
            assertion_count,
            mock_leaks: 0,
            suite_uses_hooks: false,
        }
    }

    #[test]
    fn bare_test_with_no_assertions_is_level_zero() {
        let t = test_result(vec!["suite", "does nothing"], 0, &[]);
        let files = vec![FileResult::from_results(PathBuf::from("f.lua"), vec![t], 0.0)];
        let report = grade(&files, &QualityConfig::default());
        assert_eq!(report.per_test["suite > does nothing"].achieved, 0);
    }

    #[test]
    fn two_restricted_categories_reaches_level_two() {
        let t = test_result(vec!["suite", "adds"], 2, &["Equality", "Truthiness"]);
        let files = vec![FileResult::from_results(PathBuf::from("f.lua"), vec![t], 0.0)];
        let report = grade(&files, &QualityConfig::default());
        assert_eq!(report.per_test["suite > adds"].achieved, 2);
    }

    #[test]
    fn level_three_requires_group_level_facts() {
        let mut t = test_result(vec!["suite", "adds numbers"], 3, &["Equality", "Truthiness", "Type"]);
        t.suite_uses_hooks = true;
        let mut edge = test_result(vec!["suite", "handles empty input"], 1, &["Equality"]);
        edge.suite_uses_hooks = true;
        let files = vec![FileResult::from_results(PathBuf::from("f.lua"), vec![t, edge], 0.0)];
        let report = grade(&files, &QualityConfig::default());
        assert_eq!(report.per_test["suite > adds numbers"].achieved, 3);
    }

    #[test]
    fn empty_describes_become_structural_issues() {
        let mut file = FileResult::from_results(PathBuf::from("f.lua"), vec![], 0.0);
        file.empty_describes.push("suite > nested".to_string());
        let report = grade(&[file], &QualityConfig::default());
        assert_eq!(report.structural_issues.len(), 1);
        assert_eq!(report.structural_issues[0].category, "empty_describe");
    }

    #[test]
    fn suite_achieved_level_is_the_minimum_across_tests() {
        let weak = test_result(vec!["suite", "weak"], 0, &[]);
        let strong = test_result(vec!["suite", "strong"], 5, &["Equality", "Truthiness", "Type", "Numeric", "Collection"]);
        let files = vec![FileResult::from_results(PathBuf::from("f.lua"), vec![weak, strong], 0.0)];
        let report = grade(&files, &QualityConfig::default());
        assert_eq!(report.summary.achieved_level, 0);
    }
}

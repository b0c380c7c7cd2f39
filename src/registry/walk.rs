//! Depth-first traversal with focus/skip resolution and hook-chain
//! accumulation (§4.2).

use std::collections::HashSet;

use crate::error::FirmoError;

use super::hooks::{HookBody, TestBody};
use super::{Block, Suite, TestBlock};

/// Restricts the runnable set by tag and/or name, applied as an AND on top
/// of focus/skip resolution.
#[derive(Default, Clone)]
pub struct RunFilter {
    pub tags: Vec<String>,
    pub name_pattern: Option<String>,
}

impl RunFilter {
    fn matches(&self, path: &[String], tags: &HashSet<String>) -> bool {
        if !self.tags.is_empty() && !self.tags.iter().any(|t| tags.contains(t)) {
            return false;
        }
        if let Some(pattern) = &self.name_pattern {
            let joined = path.join(" ");
            if !joined.contains(pattern.as_str()) {
                return false;
            }
        }
        true
    }
}

/// One runnable (or skip-resolved) test, with its fully-resolved hook
/// chain, handed to the Runner during a walk.
pub struct TestContext<'a> {
    pub path: Vec<String>,
    pub tags: HashSet<String>,
    pub focused: bool,
    pub skipped: bool,
    pub skip_reason: Option<String>,
    pub timeout_ms: u32,
    pub expect_error: bool,
    pub body: Option<&'a TestBody>,
    pub before_each: Vec<&'a HookBody>,
    pub after_each: Vec<&'a HookBody>,
    pub build_error: Option<&'a FirmoError>,
    /// Whether any enclosing suite registered a before/after hook — feeds
    /// Quality's "suite uses before/after" check (Level 3).
    pub suite_uses_hooks: bool,
}

/// Full dotted paths of every suite with no `it` in itself or any
/// descendant (§4.7 "empty describes reported as structural issues").
/// Returns whether `suite`'s own subtree contains at least one test.
pub(super) fn empty_describes(suite: &Suite, path_prefix: &[String], out: &mut Vec<String>) -> bool {
    let mut path = path_prefix.to_vec();
    if !suite.name.is_empty() {
        path.push(suite.name.clone());
    }
    let mut has_test = suite.children.iter().any(|c| matches!(c, Block::Test(_)));
    for child in &suite.children {
        if let Block::Suite(s) = child {
            has_test |= empty_describes(s, &path, out);
        }
    }
    if !has_test && !suite.name.is_empty() {
        out.push(path.join(" > "));
    }
    has_test
}

pub(super) fn any_focused(suite: &Suite) -> bool {
    if suite.focused {
        return true;
    }
    suite.children.iter().any(|c| match c {
        Block::Suite(s) => any_focused(s),
        Block::Test(t) => t.focused,
    })
}

/// Ancestor state threaded down the recursion: whether the path so far
/// already entered a focused subtree, and the nearest enclosing skip
/// (`skipped`, `reason`) if any.
#[derive(Clone, Copy)]
struct Ancestry<'a> {
    focused: bool,
    skipped: bool,
    skip_reason: Option<&'a str>,
    build_error: Option<&'a FirmoError>,
}

#[allow(clippy::too_many_arguments)]
pub(super) fn walk_suite<'a>(
    suite: &'a Suite,
    path_prefix: &[String],
    before_chain: &mut Vec<&'a HookBody>,
    after_levels: &mut Vec<Vec<&'a HookBody>>,
    any_focused: bool,
    filter: &RunFilter,
    visit: &mut dyn FnMut(TestContext<'a>),
) {
    let ancestry = Ancestry {
        focused: suite.focused,
        skipped: suite.skipped,
        skip_reason: suite.skip_reason.as_deref(),
        build_error: suite.build_error.as_ref(),
    };
    walk_suite_inner(suite, path_prefix, before_chain, after_levels, any_focused, ancestry, filter, visit);
}

#[allow(clippy::too_many_arguments)]
fn walk_suite_inner<'a>(
    suite: &'a Suite,
    path_prefix: &[String],
    before_chain: &mut Vec<&'a HookBody>,
    after_levels: &mut Vec<Vec<&'a HookBody>>,
    any_focused: bool,
    ancestry: Ancestry<'a>,
    filter: &RunFilter,
    visit: &mut dyn FnMut(TestContext<'a>),
) {
    let mut path = path_prefix.to_vec();
    if !suite.name.is_empty() {
        path.push(suite.name.clone());
    }

    let pushed_before = suite.before_each.len();
    before_chain.extend(suite.before_each.iter());
    after_levels.push(suite.after_each.iter().rev().collect());

    for child in &suite.children {
        match child {
            Block::Suite(s) => {
                let child_ancestry = Ancestry {
                    focused: ancestry.focused || s.focused,
                    skipped: ancestry.skipped || s.skipped,
                    skip_reason: ancestry.skip_reason.or(s.skip_reason.as_deref()),
                    build_error: s.build_error.as_ref().or(ancestry.build_error),
                };
                walk_suite_inner(s, &path, before_chain, after_levels, any_focused, child_ancestry, filter, visit);
            }
            Block::Test(t) => {
                visit_test(t, &path, before_chain, after_levels, any_focused, ancestry, filter, visit);
            }
        }
    }

    after_levels.pop();
    before_chain.truncate(before_chain.len() - pushed_before);
}

#[allow(clippy::too_many_arguments)]
fn visit_test<'a>(
    test: &'a TestBlock,
    path_prefix: &[String],
    before_chain: &[&'a HookBody],
    after_levels: &[Vec<&'a HookBody>],
    any_focused: bool,
    ancestry: Ancestry<'a>,
    filter: &RunFilter,
    visit: &mut dyn FnMut(TestContext<'a>),
) {
    let mut path = path_prefix.to_vec();
    path.push(test.name.clone());

    if !filter.matches(&path, &test.tags) {
        return;
    }

    let in_focused_subtree = ancestry.focused;
    let runnable_by_focus = !any_focused || in_focused_subtree || test.focused;
    let skipped = test.skipped || ancestry.skipped || !runnable_by_focus;
    let skip_reason = test
        .skip_reason
        .clone()
        .or_else(|| ancestry.skip_reason.map(str::to_string))
        .or_else(|| if !runnable_by_focus { Some("focus".to_string()) } else { None });

    let after_each: Vec<&HookBody> = after_levels.iter().rev().flatten().copied().collect();
    let suite_uses_hooks = !before_chain.is_empty() || after_levels.iter().any(|l| !l.is_empty());

    visit(TestContext {
        path,
        tags: test.tags.clone(),
        focused: test.focused,
        skipped,
        skip_reason,
        timeout_ms: test.timeout_ms,
        expect_error: test.expect_error,
        body: test.body.as_ref(),
        before_each: before_chain.to_vec(),
        after_each,
        build_error: ancestry.build_error,
        suite_uses_hooks,
    });
}

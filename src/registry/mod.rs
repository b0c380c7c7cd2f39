//! Nested suite/test tree, tags, focus/skip, hooks (C3).
//!
//! User code builds the tree by calling [`Registry::describe`] / `it` (and
//! the `_async`, `f*`, `x*` variants) with an explicit registry handle —
//! there is no process-global "current describe"; the handle is threaded
//! through the build closures instead, per SPEC_FULL.md's design notes.

mod hooks;
mod walk;

pub use hooks::{AsyncHookBody, AsyncTestBody, HookBody, TestBody};
pub use walk::{RunFilter, TestContext};

use std::collections::HashSet;

use crate::error::FirmoError;

/// Options accepted by `it`/`it_async`.
#[derive(Default, Clone)]
pub struct TestOptions {
    pub expect_error: bool,
    pub timeout_ms: Option<u32>,
    pub tags: Vec<String>,
}

/// Options accepted by `describe`.
#[derive(Default, Clone)]
pub struct SuiteOptions {
    pub tags: Vec<String>,
}

pub(crate) struct TestBlock {
    pub name: String,
    pub focused: bool,
    pub skipped: bool,
    pub skip_reason: Option<String>,
    pub tags: HashSet<String>,
    pub timeout_ms: u32,
    pub expect_error: bool,
    pub body: Option<TestBody>,
}

pub(crate) struct Suite {
    pub name: String,
    pub focused: bool,
    pub skipped: bool,
    pub skip_reason: Option<String>,
    pub tags: HashSet<String>,
    pub children: Vec<Block>,
    pub before_each: Vec<HookBody>,
    pub after_each: Vec<HookBody>,
    pub build_error: Option<FirmoError>,
}

impl Suite {
    fn new(name: impl Into<String>, tags: HashSet<String>) -> Self {
        Suite {
            name: name.into(),
            focused: false,
            skipped: false,
            skip_reason: None,
            tags,
            children: Vec::new(),
            before_each: Vec::new(),
            after_each: Vec::new(),
            build_error: None,
        }
    }
}

pub(crate) enum Block {
    Suite(Suite),
    Test(TestBlock),
}

const DEFAULT_TIMEOUT_MS: u32 = 5_000;

/// Owns the Block tree exclusively until a run completes, then is reset for
/// the next file — the registry never persists a "current" test/suite
/// between files (§3 lifecycle & ownership).
pub struct Registry {
    pub(crate) root: Suite,
    stack: Vec<usize>,
    tag_stack: Vec<HashSet<String>>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    pub fn new() -> Self {
        Registry {
            root: Suite::new("", HashSet::new()),
            stack: Vec::new(),
            tag_stack: vec![HashSet::new()],
        }
    }

    /// Drops the whole tree. Called by the Runner between files.
    pub fn reset(&mut self) {
        *self = Registry::new();
    }

    fn current_suite_mut(&mut self) -> &mut Suite {
        let mut suite = &mut self.root;
        for &idx in &self.stack {
            match &mut suite.children[idx] {
                Block::Suite(s) => suite = s,
                Block::Test(_) => unreachable!("stack never points at a test block"),
            }
        }
        suite
    }

    fn ambient_tags(&self) -> HashSet<String> {
        self.tag_stack.last().cloned().unwrap_or_default()
    }

    /// Adds `tags` to the tags applied to every child registered from this
    /// point until the current suite pops.
    pub fn tags(&mut self, tags: &[&str]) {
        if let Some(top) = self.tag_stack.last_mut() {
            top.extend(tags.iter().map(|t| t.to_string()));
        }
    }

    fn push_suite(&mut self, name: &str, opts: SuiteOptions, focused: bool, skipped: bool, skip_reason: Option<String>) {
        let mut tags = self.ambient_tags();
        tags.extend(opts.tags);
        let mut suite = Suite::new(name, tags.clone());
        suite.focused = focused;
        suite.skipped = skipped;
        suite.skip_reason = skip_reason;
        let parent = self.current_suite_mut();
        parent.children.push(Block::Suite(suite));
        let idx = parent.children.len() - 1;
        self.stack.push(idx);
        self.tag_stack.push(tags);
    }

    fn pop_suite(&mut self) {
        self.tag_stack.pop();
        self.stack.pop();
    }

    fn describe_impl(&mut self, name: &str, opts: SuiteOptions, focused: bool, skipped: bool, skip_reason: Option<String>, body: impl FnOnce(&mut Registry)) {
        self.push_suite(name, opts, focused, skipped, skip_reason);
        body(self);
        self.pop_suite();
    }

    pub fn describe(&mut self, name: &str, opts: SuiteOptions, body: impl FnOnce(&mut Registry)) {
        self.describe_impl(name, opts, false, false, None, body);
    }

    pub fn fdescribe(&mut self, name: &str, opts: SuiteOptions, body: impl FnOnce(&mut Registry)) {
        self.describe_impl(name, opts, true, false, None, body);
    }

    pub fn xdescribe(&mut self, name: &str, reason: Option<&str>, opts: SuiteOptions, body: impl FnOnce(&mut Registry)) {
        self.describe_impl(name, opts, false, true, reason.map(str::to_string), body);
    }

    /// Records that the current suite's body raised during evaluation — all
    /// descendant tests become fail results carrying this error at run time
    /// (§4.2 invariants).
    pub fn mark_build_error(&mut self, error: FirmoError) {
        self.current_suite_mut().build_error = Some(error);
    }

    fn push_test(&mut self, name: &str, opts: TestOptions, focused: bool, skipped: bool, skip_reason: Option<String>, body: Option<TestBody>) {
        let mut tags = self.ambient_tags();
        tags.extend(opts.tags);
        let test = TestBlock {
            name: name.to_string(),
            focused,
            skipped,
            skip_reason,
            tags,
            timeout_ms: opts.timeout_ms.unwrap_or(DEFAULT_TIMEOUT_MS),
            expect_error: opts.expect_error,
            body,
        };
        self.current_suite_mut().children.push(Block::Test(test));
    }

    pub fn it(&mut self, name: &str, opts: TestOptions, body: impl Fn() -> Result<(), FirmoError> + 'static) {
        self.push_test(name, opts, false, false, None, Some(TestBody::Sync(Box::new(body))));
    }

    pub fn it_pending(&mut self, name: &str) {
        self.push_test(name, TestOptions::default(), false, false, None, None);
    }

    pub fn fit(&mut self, name: &str, opts: TestOptions, body: impl Fn() -> Result<(), FirmoError> + 'static) {
        self.push_test(name, opts, true, false, None, Some(TestBody::Sync(Box::new(body))));
    }

    pub fn xit(&mut self, name: &str, reason: Option<&str>, opts: TestOptions) {
        self.push_test(name, opts, false, true, reason.map(str::to_string), None);
    }

    pub fn it_async(&mut self, name: &str, opts: TestOptions, body: impl AsyncTestBody + 'static) {
        self.push_test(name, opts, false, false, None, Some(TestBody::Async(Box::new(body))));
    }

    pub fn before(&mut self, f: impl Fn() -> Result<(), FirmoError> + 'static) {
        self.current_suite_mut().before_each.push(HookBody::Sync(Box::new(f)));
    }

    pub fn after(&mut self, f: impl Fn() -> Result<(), FirmoError> + 'static) {
        self.current_suite_mut().after_each.push(HookBody::Sync(Box::new(f)));
    }

    pub fn before_async(&mut self, f: impl AsyncHookBody + 'static) {
        self.current_suite_mut().before_each.push(HookBody::Async(Box::new(f)));
    }

    pub fn after_async(&mut self, f: impl AsyncHookBody + 'static) {
        self.current_suite_mut().after_each.push(HookBody::Async(Box::new(f)));
    }

    pub fn any_focused(&self) -> bool {
        walk::any_focused(&self.root)
    }

    /// Depth-first, pre-order traversal over runnable tests, invoking
    /// `visit` with the accumulated hook chain and resolved focus/skip
    /// status for each.
    pub fn walk(&self, filter: &RunFilter, visit: &mut dyn FnMut(TestContext)) {
        let any_focused = self.any_focused();
        walk::walk_suite(&self.root, &[], &mut Vec::new(), &mut Vec::new(), any_focused, filter, visit);
    }

    /// Dotted paths of every suite (by name) with no test in itself or any
    /// descendant.
    pub fn empty_describes(&self) -> Vec<String> {
        let mut out = Vec::new();
        walk::empty_describes(&self.root, &[], &mut out);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    #[test]
    fn describe_and_it_register_in_order() {
        let mut registry = Registry::new();
        registry.describe("math", SuiteOptions::default(), |r| {
            r.it("adds", TestOptions::default(), || Ok(()));
            r.it("muls", TestOptions::default(), || Ok(()));
        });
        let mut names = Vec::new();
        registry.walk(&RunFilter::default(), &mut |ctx| names.push(ctx.path.last().cloned().unwrap()));
        assert_eq!(names, vec!["adds", "muls"]);
    }

    #[test]
    fn tags_propagate_to_descendants() {
        let mut registry = Registry::new();
        registry.describe("suite", SuiteOptions { tags: vec!["slow".into()] }, |r| {
            r.it("t1", TestOptions::default(), || Ok(()));
        });
        let mut tags_seen = Vec::new();
        registry.walk(&RunFilter::default(), &mut |ctx| tags_seen.push(ctx.tags.clone()));
        assert!(tags_seen[0].contains("slow"));
    }

    #[test]
    fn focus_restricts_to_focused_minus_skipped() {
        let mut registry = Registry::new();
        registry.describe("A", SuiteOptions::default(), |r| {
            r.it("a1", TestOptions::default(), || Ok(()));
            r.fit("a2", TestOptions::default(), || Ok(()));
            r.xit("a3", None, TestOptions::default());
        });
        registry.describe("B", SuiteOptions::default(), |r| {
            r.it("b1", TestOptions::default(), || Ok(()));
        });
        let mut runnable = Vec::new();
        registry.walk(&RunFilter::default(), &mut |ctx| {
            if !ctx.skipped {
                runnable.push(ctx.path.last().cloned().unwrap());
            }
        });
        assert_eq!(runnable, vec!["a2"]);
    }

    #[test]
    fn hooks_run_outer_to_inner_then_inner_to_outer() {
        let mut registry = Registry::new();
        registry.describe("outer", SuiteOptions::default(), |r| {
            r.before(|| Ok(()));
            r.after(|| Ok(()));
            r.describe("inner", SuiteOptions::default(), |r| {
                r.before(|| Ok(()));
                r.after(|| Ok(()));
                r.it("t", TestOptions::default(), || Ok(()));
            });
        });
        let mut before_count = 0;
        let mut after_count = 0;
        registry.walk(&RunFilter::default(), &mut |ctx| {
            before_count = ctx.before_each.len();
            after_count = ctx.after_each.len();
        });
        assert_eq!(before_count, 2);
        assert_eq!(after_count, 2);
    }

    #[test]
    fn test_without_body_is_pending() {
        let mut registry = Registry::new();
        registry.describe("s", SuiteOptions::default(), |r| {
            r.it_pending("someday");
        });
        let mut pending = false;
        registry.walk(&RunFilter::default(), &mut |ctx| pending = ctx.body.is_none());
        assert!(pending);
        let _ = Value::Nil;
    }
}

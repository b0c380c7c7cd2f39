//! Scoped run context: the "current test context" threaded implicitly
//! through a thread-local stack rather than a process-global (§3, §5).

use std::cell::RefCell;
use std::path::PathBuf;

use crate::mocking::MockHandle;

#[derive(Clone, Copy, PartialEq, Eq)]
pub enum ContextKind {
    File,
    Test,
}

pub struct RunContext {
    pub kind: ContextKind,
    pub path: PathBuf,
    pub active_mocks: Vec<MockHandle>,
    pub temp_files: Vec<PathBuf>,
}

thread_local! {
    static STACK: RefCell<Vec<RunContext>> = const { RefCell::new(Vec::new()) };
}

pub fn push(kind: ContextKind, path: PathBuf) {
    STACK.with(|s| {
        s.borrow_mut().push(RunContext {
            kind,
            path,
            active_mocks: Vec::new(),
            temp_files: Vec::new(),
        })
    });
}

pub fn pop() -> Option<RunContext> {
    STACK.with(|s| s.borrow_mut().pop())
}

/// Registers `mock` with the innermost active context so the runner's
/// teardown can restore it even if the test panics or errors.
pub fn track_mock(mock: MockHandle) {
    STACK.with(|s| {
        if let Some(ctx) = s.borrow_mut().last_mut() {
            ctx.active_mocks.push(mock);
        }
    });
}

pub fn track_temp_file(path: PathBuf) {
    STACK.with(|s| {
        if let Some(ctx) = s.borrow_mut().last_mut() {
            ctx.temp_files.push(path);
        }
    });
}

/// Drains the active mocks/temp files from the innermost context without
/// popping it, for use at test teardown.
pub fn drain_current() -> (Vec<MockHandle>, Vec<PathBuf>) {
    STACK.with(|s| {
        if let Some(ctx) = s.borrow_mut().last_mut() {
            (std::mem::take(&mut ctx.active_mocks), std::mem::take(&mut ctx.temp_files))
        } else {
            (Vec::new(), Vec::new())
        }
    })
}

pub fn current_file_path() -> Option<PathBuf> {
    STACK.with(|s| {
        s.borrow()
            .iter()
            .rev()
            .find(|c| c.kind == ContextKind::File)
            .map(|c| c.path.clone())
    })
}

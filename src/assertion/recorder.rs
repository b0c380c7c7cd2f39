//! Per-test matcher-usage recorder, consumed by the Quality module (C8) to
//! count distinct matcher categories without threading extra state through
//! every assertion call.

use std::cell::RefCell;
use std::collections::HashSet;

/// The broad family a matcher belongs to. Quality's level checks count
/// *distinct categories*, not distinct matcher names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatcherCategory {
    Equality,
    Truthiness,
    Type,
    Collection,
    Numeric,
    Error,
    Mock,
    Schema,
}

#[derive(Default)]
pub struct AssertionRecorder {
    pub categories: HashSet<MatcherCategory>,
    pub count: usize,
}

thread_local! {
    static RECORDER: RefCell<Option<AssertionRecorder>> = const { RefCell::new(None) };
}

/// Called by the runner before executing a test body.
pub fn begin_recording() {
    RECORDER.with(|r| *r.borrow_mut() = Some(AssertionRecorder::default()));
}

/// Called by the runner after a test body finishes; returns and clears the
/// accumulated state.
pub fn take_recorded() -> AssertionRecorder {
    RECORDER.with(|r| r.borrow_mut().take()).unwrap_or_default()
}

/// Called by every matcher on evaluation (pass or fail — usage is what
/// Quality counts, not success).
pub fn record_matcher(category: MatcherCategory) {
    RECORDER.with(|r| {
        if let Some(rec) = r.borrow_mut().as_mut() {
            rec.categories.insert(category);
            rec.count += 1;
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_only_while_active() {
        record_matcher(MatcherCategory::Equality);
        begin_recording();
        record_matcher(MatcherCategory::Equality);
        record_matcher(MatcherCategory::Numeric);
        let rec = take_recorded();
        assert_eq!(rec.count, 2);
        assert_eq!(rec.categories.len(), 2);
    }
}

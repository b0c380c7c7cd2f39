//! Matcher resolution table: normalizes terminal names to categories and
//! hosts the small set of comparison helpers shared by several matchers.

use crate::value::{deep_equal, Value};

use super::recorder::MatcherCategory;

/// Flat dispatch table mapping a normalized matcher name to its category,
/// used by Quality's "distinct matcher categories" checks.
pub fn category_for(matcher: &str) -> MatcherCategory {
    match matcher {
        "equal" | "deep_equal" | "change" => MatcherCategory::Equality,
        "exist" | "be_truthy" | "be_nil" => MatcherCategory::Truthiness,
        "be_a" => MatcherCategory::Type,
        "match" | "match_regex" | "have_length" | "have_property" => MatcherCategory::Collection,
        "be_greater_than" | "be_less_than" | "be_approximately" | "increase" | "decrease" => MatcherCategory::Numeric,
        "match_schema" => MatcherCategory::Schema,
        _ => MatcherCategory::Equality,
    }
}

/// `equal` defers to `deep_equal` for composites; scalars compare directly
/// (numbers still use `PartialEq` so `NaN != NaN` holds for `equal` too).
pub fn structural_or_scalar_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Array(_), _) | (Value::Table(_), _) | (_, Value::Array(_)) | (_, Value::Table(_)) => {
            deep_equal(a, b)
        }
        _ => deep_equal(a, b),
    }
}

/// The host's simplified string-pattern dialect: `%w`, `%d`, `%s`, `%a`
/// character classes, `*`/`+` quantifiers on the immediately preceding
/// class, and `^`/`$` anchors — a small, fixed subset translated to an
/// equivalent regex rather than a bespoke matcher, since the semantics
/// (character classes + anchors + quantifiers) are a strict subset of regex.
pub fn host_pattern_matches(pattern: &str, text: &str) -> bool {
    let translated = translate_host_pattern(pattern);
    regex::Regex::new(&translated)
        .map(|re| re.is_match(text))
        .unwrap_or(false)
}

fn translate_host_pattern(pattern: &str) -> String {
    let mut out = String::new();
    let mut chars = pattern.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '%' => match chars.next() {
                Some('w') => out.push_str(r"\w"),
                Some('d') => out.push_str(r"\d"),
                Some('s') => out.push_str(r"\s"),
                Some('a') => out.push_str("[A-Za-z]"),
                Some(other) => out.push_str(&regex::escape(&other.to_string())),
                None => {}
            },
            '^' | '$' | '*' | '+' | '.' | '(' | ')' | '[' | ']' => out.push(c),
            _ => out.push_str(&regex::escape(&c.to_string())),
        }
    }
    out
}

//! The dynamic value model (§3.1 of SPEC_FULL.md).
//!
//! Firmo tests observe values from a dynamically-typed host. Rather than
//! pretend Rust test bodies are themselves dynamically typed, this crate
//! gives matchers and mocks a small `Value` enum that can represent the
//! structural shapes the assertion engine needs to compare: nil, booleans,
//! numbers, strings, arrays, tables (insertion-ordered key/value lists) and
//! callables (spies).

use std::cell::RefCell;
use std::collections::HashSet;
use std::fmt;
use std::rc::Rc;

use crate::error::FirmoError;
use crate::mocking::Spy;

/// A table is an insertion-ordered list of string-keyed pairs.
///
/// `f64` values make a `HashMap` unsound (no total `Eq`/`Hash`); an ordered
/// `Vec` also matches `deep_equal`'s "ignores key order" requirement more
/// directly than hinting at iteration order on a hash map would.
pub type Table = Vec<(String, Value)>;

/// A dynamic value as observed by assertions, mocks, and the registry.
#[derive(Clone)]
pub enum Value {
    Nil,
    Bool(bool),
    Number(f64),
    Str(String),
    Array(Rc<RefCell<Vec<Value>>>),
    Table(Rc<RefCell<Table>>),
    Callable(Spy),
    Error(Box<FirmoError>),
}

impl Value {
    pub fn array(items: Vec<Value>) -> Self {
        Value::Array(Rc::new(RefCell::new(items)))
    }

    pub fn table(pairs: Table) -> Self {
        Value::Table(Rc::new(RefCell::new(pairs)))
    }

    pub fn str(s: impl Into<String>) -> Self {
        Value::Str(s.into())
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    /// Host-language "truthiness": everything except `nil` and `false`.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Nil | Value::Bool(false))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::Str(_) => "string",
            Value::Array(_) => "array",
            Value::Table(_) => "table",
            Value::Callable(_) => "callable",
            Value::Error(_) => "error",
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn length(&self) -> Option<usize> {
        match self {
            Value::Array(a) => Some(a.borrow().len()),
            Value::Table(t) => Some(t.borrow().len()),
            Value::Str(s) => Some(s.chars().count()),
            _ => None,
        }
    }

    pub fn get_property(&self, key: &str) -> Option<Value> {
        match self {
            Value::Table(t) => t
                .borrow()
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.clone()),
            _ => None,
        }
    }

    /// Structural identity used for cycle detection: two composite values
    /// alias the same heap allocation.
    fn identity(&self) -> Option<usize> {
        match self {
            Value::Array(a) => Some(Rc::as_ptr(a) as usize),
            Value::Table(t) => Some(Rc::as_ptr(t) as usize),
            _ => None,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        render(self, f)
    }
}

fn render(v: &Value, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match v {
        Value::Nil => write!(f, "nil"),
        Value::Bool(b) => write!(f, "{b}"),
        Value::Number(n) => write!(f, "{n}"),
        Value::Str(s) => write!(f, "{s:?}"),
        Value::Array(a) => {
            write!(f, "[")?;
            for (i, item) in a.borrow().iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                render(item, f)?;
            }
            write!(f, "]")
        }
        Value::Table(t) => {
            write!(f, "{{")?;
            for (i, (k, val)) in t.borrow().iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{k} = ")?;
                render(val, f)?;
            }
            write!(f, "}}")
        }
        Value::Callable(_) => write!(f, "<function>"),
        Value::Error(e) => write!(f, "<error: {e}>"),
    }
}

/// Renders a value for diff/failure messages (same shape as `Debug`, kept
/// separate so callers don't depend on the `Debug` impl's exact format).
pub fn render_value(v: &Value) -> String {
    format!("{v:?}")
}

/// Structural deep comparison.
///
/// `NaN != NaN`; cycles are tracked by an identity-pair set so a self
/// referential table or array never causes infinite recursion; key order is
/// ignored for tables.
pub fn deep_equal(a: &Value, b: &Value) -> bool {
    let mut seen = HashSet::new();
    deep_equal_inner(a, b, &mut seen)
}

fn deep_equal_inner(a: &Value, b: &Value, seen: &mut HashSet<(usize, usize)>) -> bool {
    match (a, b) {
        (Value::Nil, Value::Nil) => true,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Number(x), Value::Number(y)) => x == y, // NaN != NaN falls out of f64 PartialEq
        (Value::Str(x), Value::Str(y)) => x == y,
        (Value::Array(x), Value::Array(y)) => {
            let (px, py) = (Rc::as_ptr(x) as usize, Rc::as_ptr(y) as usize);
            if seen.contains(&(px, py)) {
                return true;
            }
            seen.insert((px, py));
            let (xb, yb) = (x.borrow(), y.borrow());
            if xb.len() != yb.len() {
                return false;
            }
            xb.iter().zip(yb.iter()).all(|(xi, yi)| deep_equal_inner(xi, yi, seen))
        }
        (Value::Table(x), Value::Table(y)) => {
            let (px, py) = (Rc::as_ptr(x) as usize, Rc::as_ptr(y) as usize);
            if seen.contains(&(px, py)) {
                return true;
            }
            seen.insert((px, py));
            let (xb, yb) = (x.borrow(), y.borrow());
            if xb.len() != yb.len() {
                return false;
            }
            xb.iter().all(|(k, v)| {
                yb.iter()
                    .find(|(yk, _)| yk == k)
                    .is_some_and(|(_, yv)| deep_equal_inner(v, yv, seen))
            })
        }
        (Value::Error(x), Value::Error(y)) => {
            x.category == y.category && x.message == y.message
        }
        (Value::Callable(x), Value::Callable(y)) => x.id() == y.id(),
        _ => false,
    }
}

/// Structural diff for failure messages: lists added/removed/changed keys
/// for tables, or the first mismatch offset for strings. Returns `None`
/// when there is nothing useful beyond "not equal" (e.g. scalars).
pub fn diff(a: &Value, b: &Value) -> Option<String> {
    match (a, b) {
        (Value::Str(x), Value::Str(y)) => {
            let offset = x
                .chars()
                .zip(y.chars())
                .position(|(cx, cy)| cx != cy)
                .unwrap_or_else(|| x.len().min(y.len()));
            Some(format!("strings differ at offset {offset}"))
        }
        (Value::Table(x), Value::Table(y)) => {
            let xb = x.borrow();
            let yb = y.borrow();
            let mut parts = Vec::new();
            for (k, v) in xb.iter() {
                match yb.iter().find(|(yk, _)| yk == k) {
                    None => parts.push(format!("-{k}")),
                    Some((_, yv)) if !deep_equal(v, yv) => parts.push(format!("~{k}")),
                    _ => {}
                }
            }
            for (k, _) in yb.iter() {
                if !xb.iter().any(|(xk, _)| xk == k) {
                    parts.push(format!("+{k}"));
                }
            }
            if parts.is_empty() {
                None
            } else {
                Some(parts.join(", "))
            }
        }
        (Value::Array(x), Value::Array(y)) => {
            let xb = x.borrow();
            let yb = y.borrow();
            let mismatch = xb
                .iter()
                .zip(yb.iter())
                .position(|(xi, yi)| !deep_equal(xi, yi));
            mismatch
                .map(|i| format!("index {i} differs"))
                .or_else(|| Some(format!("length {} vs {}", xb.len(), yb.len())))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nan_is_not_equal_to_itself() {
        assert!(!deep_equal(&Value::Number(f64::NAN), &Value::Number(f64::NAN)));
    }

    #[test]
    fn reflexive_for_scalars_and_composites() {
        let t = Value::table(vec![("a".into(), Value::Number(1.0))]);
        assert!(deep_equal(&t, &t.clone()));
        assert!(deep_equal(&Value::str("x"), &Value::str("x")));
    }

    #[test]
    fn table_equality_ignores_key_order() {
        let a = Value::table(vec![
            ("a".into(), Value::Number(1.0)),
            ("b".into(), Value::Number(2.0)),
        ]);
        let b = Value::table(vec![
            ("b".into(), Value::Number(2.0)),
            ("a".into(), Value::Number(1.0)),
        ]);
        assert!(deep_equal(&a, &b));
    }

    #[test]
    fn symmetry_holds() {
        let a = Value::array(vec![Value::Number(1.0)]);
        let b = Value::array(vec![Value::Number(1.0)]);
        assert_eq!(deep_equal(&a, &b), deep_equal(&b, &a));
    }

    #[test]
    fn cyclic_table_does_not_infinite_loop() {
        let a = Rc::new(RefCell::new(Vec::<(String, Value)>::new()));
        let a_val = Value::Table(a.clone());
        a.borrow_mut().push(("self".into(), a_val.clone()));

        let b = Rc::new(RefCell::new(Vec::<(String, Value)>::new()));
        let b_val = Value::Table(b.clone());
        b.borrow_mut().push(("self".into(), b_val.clone()));

        assert!(deep_equal(&a_val, &b_val));
    }

    #[test]
    fn diff_reports_changed_table_keys() {
        let a = Value::table(vec![("x".into(), Value::Number(1.0))]);
        let b = Value::table(vec![("x".into(), Value::Number(2.0))]);
        assert_eq!(diff(&a, &b), Some("~x".to_string()));
    }
}

//! A minimal [`FileLoader`] for standalone use of the `firmo` binary.
//!
//! This crate is the execution engine only — it ships no parser for the
//! dynamically-typed host language a real Firmo embedding would run tests
//! written in. This loader reads a small JSON fixture format instead, so
//! the binary is runnable on its own (demos, the test suite's end-to-end
//! coverage, `--parallel` workers) without a host language interpreter.
//! A production embedding provides its own [`FileLoader`] that evaluates
//! real test files.
//!
//! Fixture format: a JSON array of nodes, each either
//! `{"describe": name, "children": [...], "tags": [...], "focus"|"skip": bool}`
//! or `{"it": name, "assert_eq": [actual, expected], "tags": [...],
//! "expect_error"|"pending"|"focus"|"skip": bool}`.

use std::path::Path;

use serde_json::Value as Json;

use firmo::assertion::expect;
use firmo::error::FirmoError;
use firmo::orchestrator::FileLoader;
use firmo::registry::{Registry, SuiteOptions, TestOptions};
use firmo::value::Value;

pub struct FixtureLoader;

impl FileLoader for FixtureLoader {
    fn load(&self, path: &Path, registry: &mut Registry) -> Result<(), FirmoError> {
        let content = std::fs::read_to_string(path).map_err(FirmoError::from)?;
        let root: Json = serde_json::from_str(&content).map_err(FirmoError::from)?;
        let nodes = match &root {
            Json::Array(nodes) => nodes.clone(),
            Json::Object(_) => vec![root],
            _ => return Err(FirmoError::validation("fixture must be a JSON array or object")),
        };
        for node in &nodes {
            build_node(registry, node);
        }
        Ok(())
    }
}

fn string_array(value: Option<&Json>) -> Vec<String> {
    value
        .and_then(Json::as_array)
        .map(|items| items.iter().filter_map(Json::as_str).map(str::to_string).collect())
        .unwrap_or_default()
}

fn json_to_value(json: &Json) -> Value {
    match json {
        Json::Null => Value::Nil,
        Json::Bool(b) => Value::Bool(*b),
        Json::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
        Json::String(s) => Value::str(s.clone()),
        Json::Array(items) => Value::array(items.iter().map(json_to_value).collect()),
        Json::Object(map) => Value::table(map.iter().map(|(k, v)| (k.clone(), json_to_value(v))).collect()),
    }
}

fn build_node(registry: &mut Registry, node: &Json) {
    let Some(obj) = node.as_object() else {
        registry.mark_build_error(FirmoError::validation("fixture node must be an object"));
        return;
    };

    if let Some(name) = obj.get("describe").and_then(Json::as_str) {
        let opts = SuiteOptions { tags: string_array(obj.get("tags")) };
        let children = obj.get("children").and_then(Json::as_array).cloned().unwrap_or_default();
        let focused = obj.get("focus").and_then(Json::as_bool).unwrap_or(false);
        let skipped = obj.get("skip").and_then(Json::as_bool).unwrap_or(false);
        let reason = obj.get("reason").and_then(Json::as_str);
        let build_children = move |r: &mut Registry| {
            for child in &children {
                build_node(r, child);
            }
        };
        if focused {
            registry.fdescribe(name, opts, build_children);
        } else if skipped {
            registry.xdescribe(name, reason, opts, build_children);
        } else {
            registry.describe(name, opts, build_children);
        }
        return;
    }

    let Some(name) = obj.get("it").and_then(Json::as_str) else {
        registry.mark_build_error(FirmoError::validation("fixture node has neither \"describe\" nor \"it\""));
        return;
    };

    let opts = TestOptions {
        expect_error: obj.get("expect_error").and_then(Json::as_bool).unwrap_or(false),
        timeout_ms: None,
        tags: string_array(obj.get("tags")),
    };

    if obj.get("pending").and_then(Json::as_bool).unwrap_or(false) {
        registry.it_pending(name);
        return;
    }
    if obj.get("skip").and_then(Json::as_bool).unwrap_or(false) {
        let reason = obj.get("reason").and_then(Json::as_str);
        registry.xit(name, reason, opts);
        return;
    }

    let assertion = match obj.get("assert_eq").and_then(Json::as_array) {
        Some(pair) if pair.len() == 2 => {
            let actual = json_to_value(&pair[0]);
            let expected = json_to_value(&pair[1]);
            move || expect(actual.clone()).to().equal(expected.clone())
        }
        _ => {
            registry.mark_build_error(FirmoError::validation(format!("test {name:?} has no recognized assertion")));
            return;
        }
    };

    if obj.get("focus").and_then(Json::as_bool).unwrap_or(false) {
        registry.fit(name, opts, assertion);
    } else {
        registry.it(name, opts, assertion);
    }
}

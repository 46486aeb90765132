//! Response matching and variable capture
//!
//! A matcher is built once per step from the merged expectation, with every
//! `${var}` reference already resolved. It can then be checked against any
//! number of responses (polling re-checks the same matcher).

use serde_json::Value;
use std::collections::BTreeMap;

use crate::common::{Error, Result};
use crate::context::Variables;

use super::client::HttpResponse;
use super::template::{expand_map, expand_value};
use super::RoundTrip;

/// Where a captured variable is read from
#[derive(Debug, Clone, PartialEq, Eq)]
enum Selector {
    Status,
    Header(String),
    Body(Vec<String>),
}

impl Selector {
    fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        if raw == "status" {
            return Ok(Selector::Status);
        }
        if raw == "body" {
            return Ok(Selector::Body(Vec::new()));
        }
        if let Some(name) = raw.strip_prefix("headers.") {
            if !name.is_empty() {
                return Ok(Selector::Header(name.to_ascii_lowercase()));
            }
        }
        if let Some(path) = raw.strip_prefix("body.") {
            let parts: Vec<String> = path.split('.').map(str::to_string).collect();
            if parts.iter().all(|p| !p.is_empty()) {
                return Ok(Selector::Body(parts));
            }
        }
        Err(Error::MatcherBuild(format!(
            "invalid variable selector '{}' (expected 'status', 'headers.<name>' or 'body.<path>')",
            raw
        )))
    }
}

/// Expected response of a merged step
#[derive(Debug, Clone)]
pub struct ResponseMatcher {
    status_code: Option<u16>,
    headers: BTreeMap<String, String>,
    body: Option<Value>,
    captures: Vec<(String, Selector)>,
}

impl ResponseMatcher {
    /// Build a matcher for `rt`'s expected response against the bound variables
    pub fn new(rt: &RoundTrip, vars: &Variables) -> Result<Self> {
        let expected = &rt.response;

        let headers = expand_map(&expected.headers, vars)
            .map_err(|e| Error::MatcherBuild(e.to_string()))?
            .into_iter()
            .map(|(k, v)| (k.to_ascii_lowercase(), v))
            .collect();

        let body = expected
            .body
            .as_ref()
            .map(|b| expand_value(b, vars))
            .transpose()
            .map_err(|e| Error::MatcherBuild(e.to_string()))?;

        let captures = expected
            .variables
            .iter()
            .map(|(name, raw)| Ok((name.clone(), Selector::parse(raw)?)))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            status_code: expected.status_code,
            headers,
            body,
            captures,
        })
    }

    /// Check a response, returning a mismatch description on failure
    pub fn check(&self, resp: &HttpResponse) -> Result<()> {
        if let Some(expected) = self.status_code {
            if resp.status != expected {
                return Err(Error::Mismatch(format!(
                    "expected status {}, got {} (body: {})",
                    expected,
                    resp.status,
                    truncate(&resp.body, 200)
                )));
            }
        }

        for (name, expected) in &self.headers {
            match resp.header(name) {
                Some(actual) if actual == expected => {}
                Some(actual) => {
                    return Err(Error::Mismatch(format!(
                        "expected header '{}' to be '{}', got '{}'",
                        name, expected, actual
                    )))
                }
                None => {
                    return Err(Error::Mismatch(format!("missing header '{}'", name)));
                }
            }
        }

        if let Some(expected) = &self.body {
            match resp.json() {
                Some(actual) => match_value(expected, &actual, "body").map_err(Error::Mismatch)?,
                None => match expected {
                    Value::String(text) if *text == resp.body => {}
                    _ => {
                        return Err(Error::Mismatch(format!(
                            "expected JSON body, got '{}'",
                            truncate(&resp.body, 200)
                        )))
                    }
                },
            }
        }

        Ok(())
    }

    /// Extract the declared variables from a matched response
    pub fn variables(&self, resp: &HttpResponse) -> Result<Variables> {
        let mut captured = Variables::new();
        if self.captures.is_empty() {
            return Ok(captured);
        }
        let json = resp.json();

        for (name, selector) in &self.captures {
            let value = match selector {
                Selector::Status => Value::from(resp.status),
                Selector::Header(header) => resp
                    .header(header)
                    .map(|v| Value::String(v.to_string()))
                    .ok_or_else(|| {
                        Error::variable_extraction(name, format!("missing header '{}'", header))
                    })?,
                Selector::Body(path) => {
                    let root = json
                        .as_ref()
                        .ok_or_else(|| Error::variable_extraction(name, "body is not JSON"))?;
                    lookup(root, path).cloned().ok_or_else(|| {
                        Error::variable_extraction(
                            name,
                            format!("path 'body.{}' not found", path.join(".")),
                        )
                    })?
                }
            };
            captured.insert(name.clone(), value);
        }

        Ok(captured)
    }
}

fn lookup<'a>(root: &'a Value, path: &[String]) -> Option<&'a Value> {
    path.iter().try_fold(root, |current, part| match current {
        Value::Object(map) => map.get(part),
        Value::Array(items) => part.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

/// Objects match when every expected key matches; everything else compares equal
fn match_value(expected: &Value, actual: &Value, at: &str) -> std::result::Result<(), String> {
    match (expected, actual) {
        (Value::Object(exp), Value::Object(act)) => {
            for (key, exp_value) in exp {
                let path = format!("{}.{}", at, key);
                let act_value = act
                    .get(key)
                    .ok_or_else(|| format!("missing field '{}'", path))?;
                match_value(exp_value, act_value, &path)?;
            }
            Ok(())
        }
        (Value::Array(exp), Value::Array(act)) => {
            if exp.len() != act.len() {
                return Err(format!(
                    "expected {} items at '{}', got {}",
                    exp.len(),
                    at,
                    act.len()
                ));
            }
            exp.iter()
                .zip(act)
                .enumerate()
                .try_for_each(|(i, (e, a))| match_value(e, a, &format!("{}.{}", at, i)))
        }
        _ if expected == actual => Ok(()),
        _ => Err(format!("expected {} at '{}', got {}", expected, at, actual)),
    }
}

fn truncate(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

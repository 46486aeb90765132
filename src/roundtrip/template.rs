//! `${name}` variable references in requests and expectations
//!
//! A JSON string that consists of a single reference is replaced by the bound
//! value itself, keeping its type. References embedded in longer text are
//! rendered as text. Referencing an unbound name is an error.

use regex::{Captures, Regex};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::LazyLock;

use crate::common::{Error, Result};
use crate::context::Variables;

static PLACEHOLDER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{\s*([A-Za-z0-9_.\-]+)\s*\}").expect("placeholder regex is valid")
});

static WHOLE_PLACEHOLDER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\$\{\s*([A-Za-z0-9_.\-]+)\s*\}$").expect("placeholder regex is valid")
});

/// Expand every reference in `text`
pub fn expand_str(text: &str, vars: &Variables) -> Result<String> {
    if let Some(missing) = PLACEHOLDER_RE
        .captures_iter(text)
        .map(|caps| caps[1].to_string())
        .find(|name| !vars.contains_key(name))
    {
        return Err(Error::Template(format!(
            "undefined variable '{}' in '{}'",
            missing, text
        )));
    }

    Ok(PLACEHOLDER_RE
        .replace_all(text, |caps: &Captures| match vars.get(&caps[1]) {
            Some(value) => render(value),
            None => caps[0].to_string(),
        })
        .into_owned())
}

/// Expand references inside a JSON value
pub fn expand_value(value: &Value, vars: &Variables) -> Result<Value> {
    match value {
        Value::String(text) => {
            if let Some(caps) = WHOLE_PLACEHOLDER_RE.captures(text) {
                let name = &caps[1];
                return vars.get(name).cloned().ok_or_else(|| {
                    Error::Template(format!("undefined variable '{}'", name))
                });
            }
            expand_str(text, vars).map(Value::String)
        }
        Value::Array(items) => items
            .iter()
            .map(|item| expand_value(item, vars))
            .collect::<Result<Vec<_>>>()
            .map(Value::Array),
        Value::Object(map) => {
            let mut expanded = serde_json::Map::with_capacity(map.len());
            for (key, item) in map {
                expanded.insert(key.clone(), expand_value(item, vars)?);
            }
            Ok(Value::Object(expanded))
        }
        other => Ok(other.clone()),
    }
}

/// Expand the values of a string map
pub fn expand_map(
    map: &BTreeMap<String, String>,
    vars: &Variables,
) -> Result<BTreeMap<String, String>> {
    map.iter()
        .map(|(k, v)| Ok((k.clone(), expand_str(v, vars)?)))
        .collect()
}

/// Render a bound value for use inside text
pub fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

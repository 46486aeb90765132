//! Round-trip model
//!
//! A round trip is one request plus the response it is expected to produce.
//! Templates inherited from groups and the steps of a case share this type;
//! a step is always executed as the merge of the two.

pub mod client;
pub mod executor;
pub mod matcher;
pub mod merge;
pub mod template;

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;

pub use client::{HttpClient, HttpResponse, Transport};
pub use executor::Executor;
pub use matcher::ResponseMatcher;
pub use merge::merge;

/// One request/expected-response step
#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct RoundTrip {
    /// Human-readable step description
    pub description: String,
    /// Request to send
    pub request: Request,
    /// Expected response
    pub response: Response,
}

/// Outbound request specification
#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Request {
    /// HTTP method (default: GET)
    pub method: Option<String>,
    /// Path appended to the target host, may reference `${var}`
    pub path: Option<String>,
    /// Request headers
    pub headers: BTreeMap<String, String>,
    /// Query string parameters
    pub query: BTreeMap<String, String>,
    /// JSON request body
    pub body: Option<Value>,
}

/// Expected response specification
#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Response {
    /// Expected status code
    pub status_code: Option<u16>,
    /// Expected header values (names are case-insensitive)
    pub headers: BTreeMap<String, String>,
    /// Expected JSON body; objects match partially, everything else exactly
    pub body: Option<Value>,
    /// Variables to capture: name -> selector (`status`, `headers.<name>`, `body.<path>`)
    pub variables: BTreeMap<String, String>,
    /// Poll until the response matches
    pub eventually: Option<Eventually>,
}

/// Polling policy for a step
#[derive(Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(default)]
pub struct Eventually {
    /// Overall wait before giving up
    #[serde(deserialize_with = "deserialize_duration")]
    pub timeout: Option<Duration>,
    /// Sleep between attempts
    #[serde(deserialize_with = "deserialize_duration")]
    pub interval: Option<Duration>,
}

/// Parse a duration such as `500ms`, `1s`, `1.5s` or `2m`
///
/// A bare number is read as milliseconds.
pub fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    let split = s
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(s.len());
    let (number, unit) = s.split_at(split);
    let value: f64 = number.parse().ok()?;
    let millis = match unit.trim() {
        "" | "ms" => value,
        "s" => value * 1_000.0,
        "m" => value * 60_000.0,
        _ => return None,
    };
    if !millis.is_finite() || millis < 0.0 {
        return None;
    }
    Some(Duration::from_micros((millis * 1_000.0).round() as u64))
}

fn deserialize_duration<'de, D>(deserializer: D) -> std::result::Result<Option<Duration>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Millis(u64),
        Text(String),
    }

    match Option::<Raw>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Raw::Millis(ms)) => Ok(Some(Duration::from_millis(ms))),
        Some(Raw::Text(text)) => parse_duration(&text)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid duration '{}'", text))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration_units() {
        assert_eq!(parse_duration("500ms"), Some(Duration::from_millis(500)));
        assert_eq!(parse_duration("1s"), Some(Duration::from_secs(1)));
        assert_eq!(parse_duration("1.5s"), Some(Duration::from_millis(1500)));
        assert_eq!(parse_duration("2m"), Some(Duration::from_secs(120)));
        assert_eq!(parse_duration("250"), Some(Duration::from_millis(250)));
        assert_eq!(parse_duration("fast"), None);
        assert_eq!(parse_duration("3h"), None);
    }

    #[test]
    fn test_deserialize_round_trip() {
        let rt: RoundTrip = serde_yaml::from_str(
            r#"
description: create a user
request:
  method: POST
  path: /users
  headers:
    Content-Type: application/json
  body:
    name: alice
response:
  statusCode: 201
  body:
    name: alice
  variables:
    userId: body.id
  eventually:
    timeout: 500ms
    interval: 100
"#,
        )
        .unwrap();

        assert_eq!(rt.request.method.as_deref(), Some("POST"));
        assert_eq!(rt.response.status_code, Some(201));
        assert_eq!(rt.response.variables["userId"], "body.id");
        let ev = rt.response.eventually.unwrap();
        assert_eq!(ev.timeout, Some(Duration::from_millis(500)));
        assert_eq!(ev.interval, Some(Duration::from_millis(100)));
    }

    #[test]
    fn test_empty_eventually_uses_defaults_later() {
        let rt: RoundTrip = serde_yaml::from_str("response:\n  eventually: {}\n").unwrap();
        assert_eq!(rt.response.eventually, Some(Eventually::default()));
    }
}

//! HTTP transport for round trips

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;

use crate::common::{Error, Result};
use crate::context::Variables;

use super::template::{expand_map, expand_str, expand_value};
use super::RoundTrip;

/// Response as seen by matchers
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HttpResponse {
    /// Status code
    pub status: u16,
    /// Headers, names lowercased
    pub headers: HashMap<String, String>,
    /// Raw body text
    pub body: String,
}

impl HttpResponse {
    /// Body parsed as JSON, if it is JSON
    pub fn json(&self) -> Option<Value> {
        serde_json::from_str(&self.body).ok()
    }

    /// Header lookup by case-insensitive name
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }
}

/// Sends the request half of a merged round trip
#[async_trait]
pub trait Transport: Send + Sync {
    /// Dispatch the request of `rt`, expanding `${var}` references from `vars`
    async fn do_request(&self, vars: &Variables, rt: &RoundTrip) -> Result<HttpResponse>;
}

/// `reqwest`-backed transport against a fixed host
pub struct HttpClient {
    host: String,
    client: reqwest::Client,
}

impl HttpClient {
    /// Create a client for `host` (e.g. `http://localhost:8080`)
    pub fn new(host: &str, request_timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .user_agent(concat!("aloe/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            host: host.trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Resolve a request path against the host
    fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else if path.starts_with('/') {
            format!("{}{}", self.host, path)
        } else {
            format!("{}/{}", self.host, path)
        }
    }
}

#[async_trait]
impl Transport for HttpClient {
    async fn do_request(&self, vars: &Variables, rt: &RoundTrip) -> Result<HttpResponse> {
        let req = &rt.request;
        let method_name = req.method.as_deref().unwrap_or("GET").to_ascii_uppercase();
        let method = reqwest::Method::from_bytes(method_name.as_bytes())
            .map_err(|_| Error::Transport(format!("invalid HTTP method '{}'", method_name)))?;
        let url = self.url(&expand_str(req.path.as_deref().unwrap_or("/"), vars)?);

        let mut builder = self.client.request(method, &url);
        for (name, value) in expand_map(&req.headers, vars)? {
            builder = builder.header(name, value);
        }
        if !req.query.is_empty() {
            builder = builder.query(&expand_map(&req.query, vars)?);
        }
        if let Some(body) = &req.body {
            builder = builder.json(&expand_value(body, vars)?);
        }

        tracing::debug!("{} {}", method_name, url);
        let response = builder.send().await?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_ascii_lowercase(), v.to_string()))
            })
            .collect();
        let body = response.text().await?;
        tracing::debug!("{} {} -> {}", method_name, url, status);

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joining() {
        let client = HttpClient::new("http://api.local:8080/", Duration::from_secs(1)).unwrap();
        assert_eq!(client.url("/users"), "http://api.local:8080/users");
        assert_eq!(client.url("users"), "http://api.local:8080/users");
        assert_eq!(client.url("https://other/x"), "https://other/x");
    }

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let resp = HttpResponse {
            status: 200,
            headers: HashMap::from([("x-request-id".to_string(), "r1".to_string())]),
            body: String::new(),
        };
        assert_eq!(resp.header("X-Request-Id"), Some("r1"));
        assert_eq!(resp.json(), None);
    }
}

//! Presetters supply default context values during group construction

use serde_json::Value;
use std::sync::Arc;

use crate::common::{Error, Result};
use crate::context::Context;
use crate::registry::{Named, Registry};
use crate::roundtrip::template::render;

/// Named supplier of context defaults
pub trait Presetter: Named + Send + Sync {
    /// Apply `args` (from the group's `presetters` entry) to the context
    fn preset(&self, args: &Value, ctx: &mut Context) -> Result<()>;
}

pub type PresetterRegistry = Registry<dyn Presetter>;

impl PresetterRegistry {
    /// Registry holding the built-in header presetters
    pub fn presetters() -> Self {
        let mut registry: Self = Registry::new("presetter");
        let builtins: [Arc<dyn Presetter>; 2] = [
            Arc::new(HeaderPresetter::new(HeaderTarget::Request)),
            Arc::new(HeaderPresetter::new(HeaderTarget::Response)),
        ];
        registry
            .register(builtins)
            .expect("built-in presetter names are distinct");
        registry
    }
}

/// Which half of the template a header presetter writes to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderTarget {
    Request,
    Response,
}

/// Default headers for outbound requests or expected responses
///
/// Args are a map of header name to value. Headers already present on the
/// template are left untouched.
#[derive(Debug)]
pub struct HeaderPresetter {
    target: HeaderTarget,
}

impl HeaderPresetter {
    pub const REQUEST: &'static str = "request-header";
    pub const RESPONSE: &'static str = "response-header";

    pub fn new(target: HeaderTarget) -> Self {
        Self { target }
    }
}

impl Named for HeaderPresetter {
    fn name(&self) -> &str {
        match self.target {
            HeaderTarget::Request => Self::REQUEST,
            HeaderTarget::Response => Self::RESPONSE,
        }
    }
}

impl Presetter for HeaderPresetter {
    fn preset(&self, args: &Value, ctx: &mut Context) -> Result<()> {
        let headers = args.as_object().ok_or_else(|| Error::Preset {
            name: self.name().to_string(),
            message: format!("expected a map of headers, got {}", args),
        })?;

        let template = &mut ctx.round_trip_template;
        let target = match self.target {
            HeaderTarget::Request => &mut template.request.headers,
            HeaderTarget::Response => &mut template.response.headers,
        };
        for (name, value) in headers {
            target
                .entry(name.clone())
                .or_insert_with(|| render(value));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_builtins_registered() {
        let registry = PresetterRegistry::presetters();
        assert!(registry.get(HeaderPresetter::REQUEST).is_some());
        assert!(registry.get(HeaderPresetter::RESPONSE).is_some());
        assert!(registry.get("auth").is_none());
    }

    #[test]
    fn test_request_headers_are_defaults() {
        let mut ctx = Context::default();
        ctx.round_trip_template
            .request
            .headers
            .insert("Accept".into(), "text/plain".into());

        HeaderPresetter::new(HeaderTarget::Request)
            .preset(
                &json!({"Accept": "application/json", "X-Retry": 3}),
                &mut ctx,
            )
            .unwrap();

        let headers = &ctx.round_trip_template.request.headers;
        assert_eq!(headers["Accept"], "text/plain");
        assert_eq!(headers["X-Retry"], "3");
        assert!(ctx.round_trip_template.response.headers.is_empty());
    }

    #[test]
    fn test_response_headers() {
        let mut ctx = Context::default();
        HeaderPresetter::new(HeaderTarget::Response)
            .preset(&json!({"Content-Type": "application/json"}), &mut ctx)
            .unwrap();
        assert_eq!(
            ctx.round_trip_template.response.headers["Content-Type"],
            "application/json"
        );
    }

    #[test]
    fn test_rejects_non_map_args() {
        let mut ctx = Context::default();
        let err = HeaderPresetter::new(HeaderTarget::Request)
            .preset(&json!(["Accept"]), &mut ctx)
            .unwrap_err();
        assert!(matches!(err, Error::Preset { .. }));
    }
}

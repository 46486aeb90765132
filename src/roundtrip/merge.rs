//! Field-level merge of a step onto an inherited template
//!
//! Fields the override sets replace the template's; fields it leaves unset fall
//! back to the template. Maps merge key by key with the override winning.

use std::collections::BTreeMap;

use super::{Request, Response, RoundTrip};

/// Merge `over` onto `template`
pub fn merge(template: &RoundTrip, over: &RoundTrip) -> RoundTrip {
    RoundTrip {
        description: if over.description.is_empty() {
            template.description.clone()
        } else {
            over.description.clone()
        },
        request: merge_request(&template.request, &over.request),
        response: merge_response(&template.response, &over.response),
    }
}

fn merge_request(template: &Request, over: &Request) -> Request {
    Request {
        method: over.method.clone().or_else(|| template.method.clone()),
        path: over.path.clone().or_else(|| template.path.clone()),
        headers: merge_map(&template.headers, &over.headers),
        query: merge_map(&template.query, &over.query),
        body: over.body.clone().or_else(|| template.body.clone()),
    }
}

fn merge_response(template: &Response, over: &Response) -> Response {
    Response {
        status_code: over.status_code.or(template.status_code),
        headers: merge_map(&template.headers, &over.headers),
        body: over.body.clone().or_else(|| template.body.clone()),
        variables: merge_map(&template.variables, &over.variables),
        eventually: over.eventually.or(template.eventually),
    }
}

fn merge_map(
    template: &BTreeMap<String, String>,
    over: &BTreeMap<String, String>,
) -> BTreeMap<String, String> {
    let mut merged = template.clone();
    merged.extend(over.iter().map(|(k, v)| (k.clone(), v.clone())));
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roundtrip::Eventually;
    use serde_json::json;
    use std::time::Duration;

    fn template() -> RoundTrip {
        let mut rt = RoundTrip {
            description: "template".into(),
            ..Default::default()
        };
        rt.request.method = Some("GET".into());
        rt.request.path = Some("/items".into());
        rt.request.headers.insert("Accept".into(), "application/json".into());
        rt.request.headers.insert("X-Tenant".into(), "t1".into());
        rt.response.status_code = Some(200);
        rt.response.eventually = Some(Eventually {
            timeout: Some(Duration::from_secs(2)),
            interval: None,
        });
        rt
    }

    #[test]
    fn test_empty_override_keeps_template() {
        let t = template();
        assert_eq!(merge(&t, &RoundTrip::default()), t);
    }

    #[test]
    fn test_override_replaces_only_set_fields() {
        let t = template();
        let mut over = RoundTrip::default();
        over.request.method = Some("POST".into());
        over.request.body = Some(json!({"name": "x"}));
        over.request.headers.insert("X-Tenant".into(), "t2".into());
        over.response.status_code = Some(201);

        let merged = merge(&t, &over);

        let mut expected = t.clone();
        expected.request.method = Some("POST".into());
        expected.request.body = Some(json!({"name": "x"}));
        expected.request.headers.insert("X-Tenant".into(), "t2".into());
        expected.response.status_code = Some(201);
        assert_eq!(merged, expected);
        assert_eq!(merged.request.headers["Accept"], "application/json");
    }

    #[test]
    fn test_description_falls_back_to_template() {
        let t = template();
        let over = RoundTrip {
            description: "step".into(),
            ..Default::default()
        };
        assert_eq!(merge(&t, &over).description, "step");
        assert_eq!(merge(&t, &RoundTrip::default()).description, "template");
    }
}

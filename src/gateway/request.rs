// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Description of one outbound API call.

use reqwest::Method;
use serde_json::Value;

/// Per-call extras.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestOptions {
    /// Additional headers (applied after the API key, before `Authorization`)
    pub headers: Vec<(String, String)>,
    /// Query string parameters
    pub query: Vec<(String, String)>,
}

impl RequestOptions {
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }
}

/// An API call routed through the gateway.
///
/// Authenticated by default; use [`ApiRequest::public`] for calls made before
/// login (e.g. the login call itself).
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub path: String,
    pub method: Method,
    pub body: Option<Value>,
    pub options: RequestOptions,
    pub require_auth: bool,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            method,
            body: None,
            options: RequestOptions::default(),
            require_auth: true,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self::new(Method::POST, path).with_body(body)
    }

    pub fn put(path: impl Into<String>, body: Value) -> Self {
        Self::new(Method::PUT, path).with_body(body)
    }

    pub fn patch(path: impl Into<String>, body: Value) -> Self {
        Self::new(Method::PATCH, path).with_body(body)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_options(mut self, options: RequestOptions) -> Self {
        self.options = options;
        self
    }

    /// Send without the bearer token.
    pub fn public(mut self) -> Self {
        self.require_auth = false;
        self
    }

    /// The body, if this method carries one. Only POST/PUT/PATCH do.
    pub fn effective_body(&self) -> Option<&Value> {
        if carries_body(&self.method) {
            self.body.as_ref()
        } else {
            None
        }
    }
}

pub fn carries_body(method: &Method) -> bool {
    *method == Method::POST || *method == Method::PUT || *method == Method::PATCH
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn requests_require_auth_by_default() {
        assert!(ApiRequest::get("/products").require_auth);
        assert!(!ApiRequest::post("/auth/login", json!({})).public().require_auth);
    }

    #[test]
    fn body_only_sent_for_write_methods() {
        let get = ApiRequest::get("/orders").with_body(json!({ "ignored": true }));
        assert!(get.effective_body().is_none());

        let delete = ApiRequest::delete("/orders/1").with_body(json!({ "ignored": true }));
        assert!(delete.effective_body().is_none());

        let put = ApiRequest::put("/settings", json!({ "fee": 12 }));
        assert_eq!(put.effective_body(), Some(&json!({ "fee": 12 })));
    }

    #[test]
    fn options_accumulate() {
        let options = RequestOptions::default()
            .query("page", "2")
            .query("limit", "20")
            .header("x-request-source", "admin");
        assert_eq!(options.query.len(), 2);
        assert_eq!(options.headers[0].0, "x-request-source");
    }
}

//! Inbound requests and request records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

use super::ids::{RequestId, UserId};

/// Environment keys copied into `http_meta` besides `HTTP_*` headers
pub const META_OPTIONS: [&str; 8] = [
    "CONTENT_LENGTH",
    "CONTENT_TYPE",
    "REMOTE_ADDR",
    "REMOTE_HOST",
    "REMOTE_USER",
    "REQUEST_METHOD",
    "SERVER_NAME",
    "SERVER_PORT",
];

/// Methods whose body is stored on the request record
const BODY_METHODS: [&str; 3] = ["POST", "PUT", "PATCH"];

/// Identity of one inbound request object
///
/// Clones of an [`InboundRequest`] share the token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestToken(Uuid);

impl fmt::Display for RequestToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A request as seen by the dispatch wrapper
#[derive(Debug, Clone)]
pub struct InboundRequest {
    token: RequestToken,
    pub method: String,
    pub path: String,
    /// Server environment and `HTTP_*` headers
    pub meta: BTreeMap<String, String>,
    pub query: Map<String, Value>,
    pub body: Option<Value>,
    /// Authenticated user; `None` for anonymous requests
    pub user: Option<UserId>,
}

impl InboundRequest {
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            token: RequestToken(Uuid::new_v4()),
            method: method.into().to_uppercase(),
            path: path.into(),
            meta: BTreeMap::new(),
            query: Map::new(),
            body: None,
            user: None,
        }
    }

    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.meta.insert(key.into(), value.into());
        self
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_user(mut self, user: impl Into<UserId>) -> Self {
        self.user = Some(user.into());
        self
    }

    pub fn token(&self) -> RequestToken {
        self.token
    }

    pub fn remote_addr(&self) -> Option<&str> {
        self.meta_value("REMOTE_ADDR")
    }

    pub fn remote_host(&self) -> Option<&str> {
        self.meta_value("REMOTE_HOST")
    }

    fn meta_value(&self, key: &str) -> Option<&str> {
        self.meta
            .get(key)
            .map(String::as_str)
            .filter(|value| !value.is_empty())
    }
}

/// One logged inbound request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestRecord {
    pub id: RequestId,

    pub timestamp: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,

    /// Accessing IP or other origin information
    #[serde(default)]
    pub remote_addr: String,

    pub http_method: String,

    /// Selected environment keys and header fields
    #[serde(default)]
    pub http_meta: BTreeMap<String, String>,

    /// Query parameters
    #[serde(default)]
    pub http_params: Map<String, Value>,

    /// POST, PUT or PATCH body
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,

    pub path: String,
}

impl RequestRecord {
    /// Build a record from an inbound request
    ///
    /// Only known environment keys and `HTTP_*` headers are kept.
    pub fn from_request(request: &InboundRequest) -> Self {
        let http_meta = request
            .meta
            .iter()
            .filter(|(key, _)| META_OPTIONS.contains(&key.as_str()) || key.starts_with("HTTP_"))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        let data = if BODY_METHODS.contains(&request.method.as_str()) {
            request.body.clone()
        } else {
            None
        };

        Self {
            id: RequestId::new(),
            timestamp: Utc::now(),
            user_id: request.user.clone(),
            remote_addr: request.remote_addr().unwrap_or_default().to_string(),
            http_method: request.method.clone(),
            http_meta,
            http_params: request.query.clone(),
            data,
            path: request.path.clone(),
        }
    }
}

impl fmt::Display for RequestRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.http_method, self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_request(method: &str) -> InboundRequest {
        InboundRequest::new(method, "/items/")
            .with_meta("REMOTE_ADDR", "1.2.3.4")
            .with_meta("HTTP_USER_AGENT", "curl/8.0")
            .with_meta("wsgi.input", "<stream>")
            .with_meta("SERVER_PORT", "8000")
            .with_query("page", "2")
            .with_body(json!({"x": "y"}))
            .with_user("test_user_2")
    }

    #[test]
    fn test_meta_is_filtered() {
        let record = RequestRecord::from_request(&sample_request("post"));

        assert!(record.http_meta.contains_key("HTTP_USER_AGENT"));
        assert!(record.http_meta.contains_key("SERVER_PORT"));
        assert!(!record.http_meta.contains_key("wsgi.input"));
        assert_eq!(record.remote_addr, "1.2.3.4");
        assert_eq!(record.http_method, "POST");
        assert_eq!(record.http_params["page"], json!("2"));
        assert_eq!(record.user_id, Some(UserId::new("test_user_2")));
    }

    #[test]
    fn test_body_only_for_mutating_methods() {
        let post = RequestRecord::from_request(&sample_request("POST"));
        assert_eq!(post.data, Some(json!({"x": "y"})));

        let patch = RequestRecord::from_request(&sample_request("PATCH"));
        assert!(patch.data.is_some());

        let get = RequestRecord::from_request(&sample_request("GET"));
        assert!(get.data.is_none());
    }

    #[test]
    fn test_missing_remote_addr_is_empty() {
        let record = RequestRecord::from_request(&InboundRequest::new("GET", "/"));
        assert_eq!(record.remote_addr, "");
        assert!(record.user_id.is_none());
    }

    #[test]
    fn test_clones_share_identity() {
        let request = InboundRequest::new("GET", "/");
        let other = InboundRequest::new("GET", "/");
        assert_eq!(request.token(), request.clone().token());
        assert_ne!(request.token(), other.token());
    }

    #[test]
    fn test_display() {
        let record = RequestRecord::from_request(&InboundRequest::new("get", "/reports/"));
        assert_eq!(record.to_string(), "GET - /reports/");
    }
}

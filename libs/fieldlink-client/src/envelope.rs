//! Request envelope and settled call outcomes.
//!
//! A [`RequestEnvelope`] is created per facade call, mutated by the request
//! hooks, sent by the service client, and handed to the response hooks
//! together with the [`Outcome`] of the network call.

use std::time::{Duration, Instant};

use bytes::Bytes;
use reqwest::header::HeaderMap;
use reqwest::Method;
use serde::Serialize;
use serde_json::Value;

use crate::error::ApiError;

/// Outgoing call before it hits the network.
#[derive(Debug, Clone)]
pub struct RequestEnvelope {
    pub method: Method,
    /// Path relative to the service base URL, e.g. `/api/user/info`.
    pub url: String,
    /// Query parameters, in insertion order.
    pub params: Vec<(String, String)>,
    pub body: Body,
    pub headers: HeaderMap,
    pub metadata: RequestMetadata,
}

/// Bookkeeping attached by the request hooks.
#[derive(Debug, Clone, Default)]
pub struct RequestMetadata {
    pub start_time: Option<Instant>,
}

/// Request body encodings understood by the backends.
#[derive(Debug, Clone, Default)]
pub enum Body {
    #[default]
    Empty,
    /// `application/json`.
    Json(Value),
    /// `application/x-www-form-urlencoded`, one pair per named field.
    Form(Vec<(String, String)>),
    /// `multipart/form-data`.
    Multipart(Vec<FilePart>),
}

/// One file field of a multipart body.
#[derive(Debug, Clone)]
pub struct FilePart {
    pub field: String,
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

impl FilePart {
    pub fn new(
        field: impl Into<String>,
        file_name: impl Into<String>,
        bytes: impl Into<Bytes>,
    ) -> Self {
        Self {
            field: field.into(),
            file_name: file_name.into(),
            content_type: None,
            bytes: bytes.into(),
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

impl RequestEnvelope {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            params: Vec::new(),
            body: Body::Empty,
            headers: HeaderMap::new(),
            metadata: RequestMetadata::default(),
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::POST, url)
    }

    pub fn put(url: impl Into<String>) -> Self {
        Self::new(Method::PUT, url)
    }

    pub fn delete(url: impl Into<String>) -> Self {
        Self::new(Method::DELETE, url)
    }

    /// Append a query parameter.
    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.params.push((key.to_string(), value.to_string()));
        self
    }

    /// Append a query parameter only when a value is present.
    pub fn query_opt<V: ToString>(self, key: &str, value: Option<V>) -> Self {
        match value {
            Some(value) => self.query(key, value),
            None => self,
        }
    }

    /// Attach a JSON body.
    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self, ApiError> {
        let value = serde_json::to_value(body)
            .map_err(|e| ApiError::Request(format!("failed to serialize body: {e}")))?;
        self.body = Body::Json(value);
        Ok(self)
    }

    /// Attach a url-encoded form body built from the fields of `body`.
    ///
    /// `body` must serialize to a flat object. Null fields are left out;
    /// nested values are sent as their JSON text.
    pub fn form<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self, ApiError> {
        let value = serde_json::to_value(body)
            .map_err(|e| ApiError::Request(format!("failed to serialize form: {e}")))?;
        let Value::Object(map) = value else {
            return Err(ApiError::Request("form body must be an object".to_string()));
        };

        let fields = map
            .into_iter()
            .filter_map(|(key, value)| match value {
                Value::Null => None,
                Value::String(s) => Some((key, s)),
                other => Some((key, other.to_string())),
            })
            .collect();
        self.body = Body::Form(fields);
        Ok(self)
    }

    /// Attach a multipart body.
    pub fn multipart(mut self, parts: Vec<FilePart>) -> Self {
        self.body = Body::Multipart(parts);
        self
    }

    pub fn has_body(&self) -> bool {
        !matches!(self.body, Body::Empty)
    }

    /// Module name used in action records: the third path segment
    /// (`/api/user/info` → `info`), or `unknown`.
    pub fn module(&self) -> &str {
        self.url
            .split('/')
            .nth(3)
            .filter(|segment| !segment.is_empty())
            .unwrap_or("unknown")
    }

    /// Time since the start stamp, if one was set.
    pub fn elapsed(&self) -> Option<Duration> {
        self.metadata.start_time.map(|start| start.elapsed())
    }
}

/// A 2xx answer from a backend.
#[derive(Debug, Clone, PartialEq)]
pub struct RawResponse {
    pub status: u16,
    /// Parsed JSON body; a non-JSON body is kept as a string, an empty one
    /// as `null`.
    pub body: Value,
}

/// How a call failed before producing a 2xx answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The client timeout elapsed.
    Timeout,
    /// The backend answered with a non-2xx status.
    Status,
    /// The connection could not be established.
    Connect,
    Other,
}

/// A failed call, before classification.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportFailure {
    pub kind: FailureKind,
    pub status: Option<u16>,
    pub body: Option<Value>,
    pub message: String,
}

impl TransportFailure {
    pub fn timeout(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Timeout,
            status: None,
            body: None,
            message: message.into(),
        }
    }

    pub fn status(status: u16, body: Value) -> Self {
        Self {
            kind: FailureKind::Status,
            status: Some(status),
            body: Some(body),
            message: format!("request failed with status code {status}"),
        }
    }

    pub fn from_reqwest(err: &reqwest::Error) -> Self {
        let kind = if err.is_timeout() {
            FailureKind::Timeout
        } else if err.is_connect() {
            FailureKind::Connect
        } else {
            FailureKind::Other
        };

        Self {
            kind,
            status: err.status().map(|s| s.as_u16()),
            body: None,
            message: err.to_string(),
        }
    }

    /// The `message` field of the backend body, if any.
    pub fn backend_message(&self) -> Option<&str> {
        self.body
            .as_ref()
            .and_then(|body| body.get("message"))
            .and_then(Value::as_str)
            .filter(|message| !message.is_empty())
    }
}

/// Settled network call as seen by the response hooks.
pub type Outcome = Result<RawResponse, TransportFailure>;

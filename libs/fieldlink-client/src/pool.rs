//! One configured HTTP client per backend service.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::multipart::{Form, Part};
use reqwest::redirect::Policy;
use serde_json::Value;
use tracing::{info, warn};

use crate::env::EnvironmentConfig;
use crate::envelope::{Body, FilePart, Outcome, RawResponse, RequestEnvelope, TransportFailure};
use crate::error::ApiError;
use crate::pipeline::Pipeline;
use crate::response::ApiResponse;
use crate::session::Session;

/// Timeout for ordinary backends.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Timeout for the agent backend; generated answers are slow.
pub const AGENT_TIMEOUT: Duration = Duration::from_secs(60);

/// Redirects followed before giving up.
pub const MAX_REDIRECTS: usize = 5;

/// Backend services.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Service {
    User,
    Forum,
    Content,
    Answer,
    Agent,
}

impl Service {
    pub const ALL: [Service; 5] = [
        Service::User,
        Service::Forum,
        Service::Content,
        Service::Answer,
        Service::Agent,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Service::User => "user-service",
            Service::Forum => "forum-service",
            Service::Content => "content-service",
            Service::Answer => "answer-service",
            Service::Agent => "agent-service",
        }
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Client construction knobs.
#[derive(Debug, Clone)]
pub struct PoolOptions {
    pub timeout: Duration,
    pub agent_timeout: Duration,
    pub max_redirects: usize,
}

impl Default for PoolOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            agent_timeout: AGENT_TIMEOUT,
            max_redirects: MAX_REDIRECTS,
        }
    }
}

impl PoolOptions {
    pub fn timeout_for(&self, service: Service) -> Duration {
        match service {
            Service::Agent => self.agent_timeout,
            _ => self.timeout,
        }
    }
}

/// HTTP client bound to one backend.
#[derive(Debug, Clone)]
pub struct ServiceClient {
    service: Service,
    base_url: String,
    timeout: Duration,
    http: reqwest::Client,
    pipeline: Arc<Pipeline>,
    session: Session,
}

impl ServiceClient {
    fn new(
        service: Service,
        base_url: &str,
        options: &PoolOptions,
        pipeline: Arc<Pipeline>,
        session: Session,
    ) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let timeout = options.timeout_for(service);
        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .redirect(Policy::limited(options.max_redirects))
            .build()
            .map_err(|e| ApiError::Request(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            service,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
            http,
            pipeline,
            session,
        })
    }

    pub fn service(&self) -> Service {
        self.service
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Build a URL for an endpoint.
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Run one call through the pipeline.
    pub async fn send(&self, envelope: RequestEnvelope) -> Result<ApiResponse, ApiError> {
        let envelope = self.pipeline.prepare(envelope)?;
        let outcome = self.dispatch(&envelope).await?;
        let result = self.pipeline.settle(&envelope, outcome);

        if matches!(result, Err(ApiError::SessionExpired { .. })) {
            self.expire_session();
        }

        result
    }

    fn expire_session(&self) {
        match self.session.logout() {
            Ok(()) => info!(service = %self.service, "Session expired, token cleared"),
            Err(e) => warn!(service = %self.service, error = %e, "Failed to clear expired session"),
        }
    }

    /// Send the prepared envelope. Only request construction errors are
    /// returned as `Err`; everything the network does ends up in the outcome.
    async fn dispatch(&self, envelope: &RequestEnvelope) -> Result<Outcome, ApiError> {
        let mut request = self
            .http
            .request(envelope.method.clone(), self.url(&envelope.url))
            .headers(envelope.headers.clone());

        if !envelope.params.is_empty() {
            request = request.query(&envelope.params);
        }

        request = match &envelope.body {
            Body::Empty => request,
            Body::Json(value) => request.json(value),
            Body::Form(fields) => request.form(fields),
            Body::Multipart(parts) => request.multipart(multipart_form(parts)?),
        };

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => return Ok(Err(TransportFailure::from_reqwest(&e))),
        };

        let status = response.status();
        let bytes = match response.bytes().await {
            Ok(bytes) => bytes,
            Err(e) => return Ok(Err(TransportFailure::from_reqwest(&e))),
        };
        let body = parse_body(&bytes);

        if status.is_success() {
            Ok(Ok(RawResponse {
                status: status.as_u16(),
                body,
            }))
        } else {
            Ok(Err(TransportFailure::status(status.as_u16(), body)))
        }
    }
}

fn multipart_form(parts: &[FilePart]) -> Result<Form, ApiError> {
    parts.iter().try_fold(Form::new(), |form, part| {
        let mut file = Part::bytes(part.bytes.to_vec()).file_name(part.file_name.clone());
        if let Some(content_type) = &part.content_type {
            file = file.mime_str(content_type).map_err(|e| {
                ApiError::Request(format!("invalid content type '{content_type}': {e}"))
            })?;
        }
        Ok(form.part(part.field.clone(), file))
    })
}

/// JSON if possible, text otherwise, `null` when empty.
fn parse_body(bytes: &Bytes) -> Value {
    if bytes.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(bytes).into_owned()))
}

/// The per-service clients of one environment.
#[derive(Debug, Clone)]
pub struct ClientPool {
    user: ServiceClient,
    forum: ServiceClient,
    content: ServiceClient,
    answer: ServiceClient,
    agent: ServiceClient,
}

impl ClientPool {
    pub fn new(
        env: &EnvironmentConfig,
        pipeline: Arc<Pipeline>,
        session: Session,
        options: &PoolOptions,
    ) -> Result<Self, ApiError> {
        let build = |service: Service| {
            ServiceClient::new(
                service,
                env.base_url(service),
                options,
                Arc::clone(&pipeline),
                session.clone(),
            )
        };

        Ok(Self {
            user: build(Service::User)?,
            forum: build(Service::Forum)?,
            content: build(Service::Content)?,
            answer: build(Service::Answer)?,
            agent: build(Service::Agent)?,
        })
    }

    pub fn client(&self, service: Service) -> &ServiceClient {
        match service {
            Service::User => &self.user,
            Service::Forum => &self.forum,
            Service::Content => &self.content,
            Service::Answer => &self.answer,
            Service::Agent => &self.agent,
        }
    }
}

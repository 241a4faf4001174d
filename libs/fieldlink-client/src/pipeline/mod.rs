//! Request/response pipeline.
//!
//! Every call runs through an ordered chain of [`RequestHook`]s before it is
//! sent and an ordered chain of [`ResponseHook`]s after it settles. The
//! [`Classifier`] then maps whatever failure is left into an [`ApiError`].
//!
//! Hooks are plain values over [`RequestEnvelope`] and [`Outcome`], so the
//! whole chain can be exercised without a network.

pub mod request;
pub mod response;

use std::fmt;
use std::sync::Arc;

pub use request::{is_public_endpoint, AttachToken, LogRequest, StampStart, PUBLIC_ENDPOINTS};
pub use response::{Classifier, LogResponse, NormalizeSuccess, RecordAction};

use crate::envelope::{Outcome, RequestEnvelope};
use crate::error::ApiError;
use crate::response::ApiResponse;
use crate::session::Session;
use crate::telemetry::ActionLog;

/// Transform applied to every outgoing envelope.
pub trait RequestHook: Send + Sync {
    /// Return the (possibly modified) envelope, or abort the call.
    fn on_request(&self, envelope: RequestEnvelope) -> Result<RequestEnvelope, ApiError>;
}

/// Transform applied to every settled outcome.
pub trait ResponseHook: Send + Sync {
    fn on_response(&self, envelope: &RequestEnvelope, outcome: Outcome) -> Outcome;
}

/// Ordered hook chains plus the terminal classifier.
#[derive(Clone, Default)]
pub struct Pipeline {
    request: Vec<Arc<dyn RequestHook>>,
    response: Vec<Arc<dyn ResponseHook>>,
    classifier: Classifier,
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("request_hooks", &self.request.len())
            .field("response_hooks", &self.response.len())
            .field("classifier", &self.classifier)
            .finish()
    }
}

impl Pipeline {
    /// Empty pipeline with the default classifier.
    pub fn new() -> Self {
        Self::default()
    }

    /// The chain every service client uses:
    /// token → start stamp → request log, then
    /// success normalization → response log → action record.
    pub fn standard(session: Session, actions: ActionLog) -> Self {
        Self::new()
            .with_request_hook(AttachToken::new(session))
            .with_request_hook(StampStart)
            .with_request_hook(LogRequest)
            .with_response_hook(NormalizeSuccess)
            .with_response_hook(LogResponse)
            .with_response_hook(RecordAction::new(actions))
    }

    pub fn with_request_hook(mut self, hook: impl RequestHook + 'static) -> Self {
        self.request.push(Arc::new(hook));
        self
    }

    pub fn with_response_hook(mut self, hook: impl ResponseHook + 'static) -> Self {
        self.response.push(Arc::new(hook));
        self
    }

    pub fn with_classifier(mut self, classifier: Classifier) -> Self {
        self.classifier = classifier;
        self
    }

    /// Run the request hooks in order. The first error aborts the chain.
    pub fn prepare(&self, envelope: RequestEnvelope) -> Result<RequestEnvelope, ApiError> {
        self.request
            .iter()
            .try_fold(envelope, |envelope, hook| hook.on_request(envelope))
    }

    /// Run the response hooks in order and settle the call.
    pub fn settle(
        &self,
        envelope: &RequestEnvelope,
        outcome: Outcome,
    ) -> Result<ApiResponse, ApiError> {
        let outcome = self
            .response
            .iter()
            .fold(outcome, |outcome, hook| hook.on_response(envelope, outcome));

        match outcome {
            Ok(raw) => Ok(ApiResponse::from_body(raw.body)),
            Err(failure) => Err(self.classifier.classify(envelope, &failure)),
        }
    }
}

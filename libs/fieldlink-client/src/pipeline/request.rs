//! Request hooks.

use std::time::Instant;

use reqwest::header::{HeaderValue, AUTHORIZATION};
use tracing::debug;

use super::RequestHook;
use crate::envelope::RequestEnvelope;
use crate::error::ApiError;
use crate::session::Session;

/// Endpoints that never carry a token and never expire a session.
///
/// Matched as substrings of the request path; must stay in line with the
/// backend route design.
pub const PUBLIC_ENDPOINTS: [&str; 5] = [
    "/api/auth/captcha",
    "/api/auth/login",
    "/api/auth/quick-login",
    "/api/user/register",
    "/api/user/avatar/temp-upload",
];

pub fn is_public_endpoint(url: &str) -> bool {
    PUBLIC_ENDPOINTS.iter().any(|endpoint| url.contains(endpoint))
}

/// Sets `Authorization: Bearer <token>` on protected endpoints.
///
/// The token is read from the session when the call is prepared; a call
/// already past this hook keeps the token it captured.
#[derive(Debug, Clone)]
pub struct AttachToken {
    session: Session,
}

impl AttachToken {
    pub fn new(session: Session) -> Self {
        Self { session }
    }
}

impl RequestHook for AttachToken {
    fn on_request(&self, mut envelope: RequestEnvelope) -> Result<RequestEnvelope, ApiError> {
        if is_public_endpoint(&envelope.url) {
            envelope.headers.remove(AUTHORIZATION);
            return Ok(envelope);
        }

        // No token is not an error here; the backend answers 401.
        if let Some(token) = self.session.token() {
            let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|_| ApiError::Request("invalid token format".to_string()))?;
            value.set_sensitive(true);
            envelope.headers.insert(AUTHORIZATION, value);
        }

        Ok(envelope)
    }
}

/// Stamps `metadata.start_time`.
#[derive(Debug, Clone, Copy)]
pub struct StampStart;

impl RequestHook for StampStart {
    fn on_request(&self, mut envelope: RequestEnvelope) -> Result<RequestEnvelope, ApiError> {
        envelope.metadata.start_time = Some(Instant::now());
        Ok(envelope)
    }
}

/// Emits one debug line per outgoing call.
#[derive(Debug, Clone, Copy)]
pub struct LogRequest;

impl RequestHook for LogRequest {
    fn on_request(&self, envelope: RequestEnvelope) -> Result<RequestEnvelope, ApiError> {
        debug!(
            method = %envelope.method,
            url = %envelope.url,
            params = ?envelope.params,
            has_body = envelope.has_body(),
            authorized = envelope.headers.contains_key(AUTHORIZATION),
            "Sending request"
        );
        Ok(envelope)
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn session_with_token() -> Session {
        let session = Session::in_memory();
        session.set_token("secret-token").unwrap();
        session
    }

    #[rstest]
    #[case("/api/auth/captcha")]
    #[case("/api/auth/login")]
    #[case("/api/auth/quick-login")]
    #[case("/api/user/register")]
    #[case("/api/user/avatar/temp-upload")]
    fn public_endpoints_never_get_a_token(#[case] url: &str) {
        let hook = AttachToken::new(session_with_token());
        let envelope = hook.on_request(RequestEnvelope::post(url)).unwrap();
        assert!(envelope.headers.get(AUTHORIZATION).is_none());
    }

    #[test]
    fn public_endpoint_drops_preset_header() {
        let hook = AttachToken::new(session_with_token());
        let mut envelope = RequestEnvelope::post("/api/auth/login");
        envelope
            .headers
            .insert(AUTHORIZATION, HeaderValue::from_static("Bearer stale"));

        let envelope = hook.on_request(envelope).unwrap();
        assert!(envelope.headers.get(AUTHORIZATION).is_none());
    }

    #[test]
    fn protected_endpoint_gets_exactly_one_header() {
        let hook = AttachToken::new(session_with_token());
        let mut envelope = RequestEnvelope::get("/api/user/info");
        envelope
            .headers
            .insert(AUTHORIZATION, HeaderValue::from_static("Bearer stale"));

        let envelope = hook.on_request(envelope).unwrap();
        let values: Vec<_> = envelope.headers.get_all(AUTHORIZATION).iter().collect();
        assert_eq!(values.len(), 1);
        assert_eq!(values[0], "Bearer secret-token");
    }

    #[test]
    fn missing_token_is_not_an_error() {
        let hook = AttachToken::new(Session::in_memory());
        let envelope = hook.on_request(RequestEnvelope::get("/api/user/info")).unwrap();
        assert!(envelope.headers.get(AUTHORIZATION).is_none());
    }

    #[test]
    fn unprintable_token_aborts_the_call() {
        let session = Session::in_memory();
        session.set_token("bad\ntoken").unwrap();
        let hook = AttachToken::new(session);

        let err = hook
            .on_request(RequestEnvelope::get("/api/user/info"))
            .unwrap_err();
        assert!(matches!(err, ApiError::Request(_)));
    }

    #[test]
    fn temp_delete_is_not_public() {
        assert!(!is_public_endpoint("/api/user/avatar/temp-delete"));
        assert!(!is_public_endpoint("/api/user/avatar/update"));
        assert!(is_public_endpoint("/api/auth/login"));
    }

    #[test]
    fn stamp_sets_start_time() {
        let envelope = StampStart
            .on_request(RequestEnvelope::get("/api/content/news"))
            .unwrap();
        assert!(envelope.metadata.start_time.is_some());
        assert!(envelope.elapsed().is_some());
    }
}

//! Response hooks and error classification.

use serde_json::json;
use tracing::{debug, warn};

use super::request::is_public_endpoint;
use super::ResponseHook;
use crate::envelope::{FailureKind, Outcome, RequestEnvelope, TransportFailure};
use crate::error::ApiError;
use crate::response::derive_success;
use crate::telemetry::ActionLog;

pub const TIMEOUT_MESSAGE: &str = "请求超时，请检查网络连接";
pub const SESSION_EXPIRED_MESSAGE: &str = "登录已过期，请重新登录";
pub const AUTH_MISCONFIGURED_MESSAGE: &str = "认证配置异常，请联系管理员";
pub const SERVER_ERROR_MESSAGE: &str = "服务器错误，请稍后重试";
pub const NETWORK_ERROR_MESSAGE: &str = "网络请求失败";

/// Default login entry point carried by [`ApiError::SessionExpired`].
pub const LOGIN_PATH: &str = "/login";

fn duration_ms(envelope: &RequestEnvelope) -> Option<u64> {
    envelope
        .elapsed()
        .map(|elapsed| u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX))
}

/// Fills in `success` for bodies that only carry a numeric `code`.
#[derive(Debug, Clone, Copy)]
pub struct NormalizeSuccess;

impl ResponseHook for NormalizeSuccess {
    fn on_response(&self, envelope: &RequestEnvelope, outcome: Outcome) -> Outcome {
        outcome.map(|mut raw| {
            if derive_success(&mut raw.body) {
                debug!(
                    url = %envelope.url,
                    success = %raw.body["success"],
                    "Derived success from code"
                );
            }
            raw
        })
    }
}

/// Emits one debug line per settled call, with latency.
#[derive(Debug, Clone, Copy)]
pub struct LogResponse;

impl ResponseHook for LogResponse {
    fn on_response(&self, envelope: &RequestEnvelope, outcome: Outcome) -> Outcome {
        let duration_ms = duration_ms(envelope);
        match &outcome {
            Ok(raw) => debug!(
                method = %envelope.method,
                url = %envelope.url,
                status = raw.status,
                duration_ms = ?duration_ms,
                body = %raw.body,
                "Received response"
            ),
            Err(failure) => debug!(
                method = %envelope.method,
                url = %envelope.url,
                status = ?failure.status,
                kind = ?failure.kind,
                duration_ms = ?duration_ms,
                error = %failure.message,
                "Request failed"
            ),
        }
        outcome
    }
}

/// Appends `api_success` / `api_error` records to the action log.
#[derive(Debug, Clone)]
pub struct RecordAction {
    actions: ActionLog,
}

impl RecordAction {
    pub fn new(actions: ActionLog) -> Self {
        Self { actions }
    }
}

impl ResponseHook for RecordAction {
    fn on_response(&self, envelope: &RequestEnvelope, outcome: Outcome) -> Outcome {
        match &outcome {
            Ok(_) => self.actions.record(
                "api_success",
                envelope.module(),
                json!({ "url": envelope.url, "duration": duration_ms(envelope) }),
            ),
            Err(failure) => self.actions.record(
                "api_error",
                envelope.module(),
                json!({
                    "url": envelope.url,
                    "status": failure.status,
                    "message": failure.backend_message().unwrap_or(&failure.message),
                }),
            ),
        }
        outcome
    }
}

/// Maps a failed call to the single [`ApiError`] shape.
///
/// Precedence: timeout, 401 (public endpoint vs. session expiry), 500,
/// backend message, generic network failure.
#[derive(Debug, Clone)]
pub struct Classifier {
    login_path: String,
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(LOGIN_PATH)
    }
}

impl Classifier {
    pub fn new(login_path: impl Into<String>) -> Self {
        Self {
            login_path: login_path.into(),
        }
    }

    pub fn classify(&self, envelope: &RequestEnvelope, failure: &TransportFailure) -> ApiError {
        if failure.kind == FailureKind::Timeout {
            return ApiError::Timeout {
                message: TIMEOUT_MESSAGE.to_string(),
            };
        }

        match failure.status {
            Some(401) if is_public_endpoint(&envelope.url) => {
                warn!(
                    url = %envelope.url,
                    "Public endpoint answered 401; backend auth configuration is wrong"
                );
                ApiError::AuthMisconfigured {
                    message: AUTH_MISCONFIGURED_MESSAGE.to_string(),
                }
            }
            Some(401) => ApiError::SessionExpired {
                message: SESSION_EXPIRED_MESSAGE.to_string(),
                redirect_to: self.login_path.clone(),
            },
            Some(500) => ApiError::Server {
                message: SERVER_ERROR_MESSAGE.to_string(),
            },
            status => match failure.backend_message() {
                Some(message) => ApiError::Backend {
                    status,
                    message: message.to_string(),
                },
                None => ApiError::Network {
                    status,
                    message: NETWORK_ERROR_MESSAGE.to_string(),
                },
            },
        }
    }
}

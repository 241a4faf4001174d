//! Agent service: AI assistant chat.

use serde::Serialize;

use crate::envelope::RequestEnvelope;
use crate::error::ApiError;
use crate::pool::ServiceClient;
use crate::response::ApiResponse;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ChatRequest<'a> {
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    session_id: Option<&'a str>,
}

/// Agent service methods. Calls use the long agent timeout.
#[derive(Debug, Clone, Copy)]
pub struct AgentApi<'a> {
    client: &'a ServiceClient,
}

impl<'a> AgentApi<'a> {
    pub fn new(client: &'a ServiceClient) -> Self {
        Self { client }
    }

    /// `POST /api/agent/chat`. Without `session_id` the backend starts a
    /// new conversation.
    pub async fn chat(
        &self,
        message: &str,
        session_id: Option<&str>,
    ) -> Result<ApiResponse, ApiError> {
        let body = ChatRequest {
            message,
            session_id,
        };
        self.client
            .send(RequestEnvelope::post("/api/agent/chat").json(&body)?)
            .await
    }
}

//! Content service: home carousel, news and agricultural information.

use serde::Serialize;

use crate::envelope::RequestEnvelope;
use crate::error::ApiError;
use crate::pool::ServiceClient;
use crate::response::ApiResponse;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ReadCountRequest<'a> {
    content_id: i64,
    #[serde(rename = "type")]
    kind: &'a str,
}

/// Content service methods.
#[derive(Debug, Clone, Copy)]
pub struct ContentApi<'a> {
    client: &'a ServiceClient,
}

impl<'a> ContentApi<'a> {
    pub fn new(client: &'a ServiceClient) -> Self {
        Self { client }
    }

    /// `GET /api/content/carousel`.
    pub async fn get_carousel(&self) -> Result<ApiResponse, ApiError> {
        self.client
            .send(RequestEnvelope::get("/api/content/carousel"))
            .await
    }

    /// `GET /api/content/news?page=&limit=`.
    pub async fn get_news(&self, page: u32, limit: u32) -> Result<ApiResponse, ApiError> {
        self.client
            .send(
                RequestEnvelope::get("/api/content/news")
                    .query("page", page)
                    .query("limit", limit),
            )
            .await
    }

    /// `GET /api/content/information?category=&page=&limit=`.
    pub async fn get_information(
        &self,
        category: &str,
        page: u32,
        limit: u32,
    ) -> Result<ApiResponse, ApiError> {
        self.client
            .send(
                RequestEnvelope::get("/api/content/information")
                    .query("category", category)
                    .query("page", page)
                    .query("limit", limit),
            )
            .await
    }

    /// `GET /api/content/news/{news_id}`.
    pub async fn get_news_detail(&self, news_id: i64) -> Result<ApiResponse, ApiError> {
        self.client
            .send(RequestEnvelope::get(format!("/api/content/news/{news_id}")))
            .await
    }

    /// `POST /api/content/read`; `kind` is the content type, e.g. `news`.
    pub async fn increment_read_count(
        &self,
        content_id: i64,
        kind: &str,
    ) -> Result<ApiResponse, ApiError> {
        let body = ReadCountRequest { content_id, kind };
        self.client
            .send(RequestEnvelope::post("/api/content/read").json(&body)?)
            .await
    }
}

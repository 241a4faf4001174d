//! Forum service: posts and comments.

use serde::Serialize;

use crate::envelope::RequestEnvelope;
use crate::error::ApiError;
use crate::pool::ServiceClient;
use crate::response::ApiResponse;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CommentRequest<'a> {
    post_id: i64,
    content: &'a str,
    parent_id: Option<i64>,
}

/// Forum service methods.
#[derive(Debug, Clone, Copy)]
pub struct ForumApi<'a> {
    client: &'a ServiceClient,
}

impl<'a> ForumApi<'a> {
    pub fn new(client: &'a ServiceClient) -> Self {
        Self { client }
    }

    /// `GET /api/forum/posts?page=&limit=[&category=]`.
    pub async fn get_posts(
        &self,
        page: u32,
        limit: u32,
        category: Option<&str>,
    ) -> Result<ApiResponse, ApiError> {
        self.client
            .send(
                RequestEnvelope::get("/api/forum/posts")
                    .query("page", page)
                    .query("limit", limit)
                    .query_opt("category", category),
            )
            .await
    }

    /// `GET /api/forum/post/{post_id}`.
    pub async fn get_post_detail(&self, post_id: i64) -> Result<ApiResponse, ApiError> {
        self.client
            .send(RequestEnvelope::get(format!("/api/forum/post/{post_id}")))
            .await
    }

    /// `POST /api/forum/post`.
    pub async fn create_post<T: Serialize + ?Sized>(
        &self,
        post: &T,
    ) -> Result<ApiResponse, ApiError> {
        self.client
            .send(RequestEnvelope::post("/api/forum/post").json(post)?)
            .await
    }

    /// `GET /api/forum/post/{post_id}/comments?page=&limit=`.
    pub async fn get_comments(
        &self,
        post_id: i64,
        page: u32,
        limit: u32,
    ) -> Result<ApiResponse, ApiError> {
        self.client
            .send(
                RequestEnvelope::get(format!("/api/forum/post/{post_id}/comments"))
                    .query("page", page)
                    .query("limit", limit),
            )
            .await
    }

    /// `POST /api/forum/comment`; `parent_id` is sent as `null` for
    /// top-level comments.
    pub async fn create_comment(
        &self,
        post_id: i64,
        content: &str,
        parent_id: Option<i64>,
    ) -> Result<ApiResponse, ApiError> {
        let body = CommentRequest {
            post_id,
            content,
            parent_id,
        };
        self.client
            .send(RequestEnvelope::post("/api/forum/comment").json(&body)?)
            .await
    }
}

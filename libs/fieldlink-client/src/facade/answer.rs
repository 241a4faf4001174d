//! Answer service: quiz questions, submissions, points and rankings.

use serde::Serialize;

use crate::envelope::RequestEnvelope;
use crate::error::ApiError;
use crate::pool::ServiceClient;
use crate::response::ApiResponse;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SubmitRequest<'a> {
    question_id: i64,
    user_answer: &'a str,
}

/// Answer service methods.
#[derive(Debug, Clone, Copy)]
pub struct AnswerApi<'a> {
    client: &'a ServiceClient,
}

impl<'a> AnswerApi<'a> {
    pub fn new(client: &'a ServiceClient) -> Self {
        Self { client }
    }

    /// `GET /api/answer/questions?[category=&][difficulty=&]limit=`.
    pub async fn get_questions(
        &self,
        category: Option<&str>,
        difficulty: Option<&str>,
        limit: u32,
    ) -> Result<ApiResponse, ApiError> {
        self.client
            .send(
                RequestEnvelope::get("/api/answer/questions")
                    .query_opt("category", category)
                    .query_opt("difficulty", difficulty)
                    .query("limit", limit),
            )
            .await
    }

    /// `POST /api/answer/submit`.
    pub async fn submit_answer(
        &self,
        question_id: i64,
        user_answer: &str,
    ) -> Result<ApiResponse, ApiError> {
        let body = SubmitRequest {
            question_id,
            user_answer,
        };
        self.client
            .send(RequestEnvelope::post("/api/answer/submit").json(&body)?)
            .await
    }

    /// `GET /api/answer/points?userId=`.
    pub async fn get_user_points(&self, user_id: i64) -> Result<ApiResponse, ApiError> {
        self.client
            .send(RequestEnvelope::get("/api/answer/points").query("userId", user_id))
            .await
    }

    /// `GET /api/answer/leaderboard?type=&limit=`; `kind` is `daily`,
    /// `weekly` or `total`.
    pub async fn get_leaderboard(&self, kind: &str, limit: u32) -> Result<ApiResponse, ApiError> {
        self.client
            .send(
                RequestEnvelope::get("/api/answer/leaderboard")
                    .query("type", kind)
                    .query("limit", limit),
            )
            .await
    }

    /// `GET /api/answer/history?userId=&page=&limit=`.
    pub async fn get_answer_history(
        &self,
        user_id: i64,
        page: u32,
        limit: u32,
    ) -> Result<ApiResponse, ApiError> {
        self.client
            .send(
                RequestEnvelope::get("/api/answer/history")
                    .query("userId", user_id)
                    .query("page", page)
                    .query("limit", limit),
            )
            .await
    }
}

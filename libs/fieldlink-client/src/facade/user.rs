//! User service: auth, registration, avatars, profile and regions.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::envelope::{FilePart, RequestEnvelope};
use crate::error::ApiError;
use crate::pool::ServiceClient;
use crate::response::ApiResponse;

/// Multipart field name the avatar endpoints read.
const AVATAR_FIELD: &str = "avatar";

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    phone: &'a str,
    password: &'a str,
    captcha: &'a str,
}

#[derive(Debug, Serialize)]
struct QuickLoginRequest<'a> {
    phone: &'a str,
    captcha: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AvatarBatch<'a> {
    avatar_urls: &'a [String],
}

/// Registration fields, sent url-encoded one field per entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterForm {
    pub phone: String,
    pub password: String,
    pub captcha: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
    /// URL returned by a temporary avatar upload.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

/// Guess an image content type from a file name.
pub fn image_content_type(file_name: &str) -> Option<&'static str> {
    let (_, ext) = file_name.rsplit_once('.')?;
    match ext.to_ascii_lowercase().as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        _ => None,
    }
}

fn avatar_part(file_name: &str, bytes: Bytes) -> FilePart {
    let part = FilePart::new(AVATAR_FIELD, file_name, bytes);
    match image_content_type(file_name) {
        Some(content_type) => part.with_content_type(content_type),
        None => part,
    }
}

/// User service methods.
#[derive(Debug, Clone, Copy)]
pub struct UserApi<'a> {
    client: &'a ServiceClient,
}

impl<'a> UserApi<'a> {
    pub fn new(client: &'a ServiceClient) -> Self {
        Self { client }
    }

    /// `POST /api/auth/login` (public).
    pub async fn login(
        &self,
        phone: &str,
        password: &str,
        captcha: &str,
    ) -> Result<ApiResponse, ApiError> {
        let body = LoginRequest {
            phone,
            password,
            captcha,
        };
        self.client
            .send(RequestEnvelope::post("/api/auth/login").json(&body)?)
            .await
    }

    /// `POST /api/auth/quick-login` (public).
    pub async fn quick_login(&self, phone: &str, captcha: &str) -> Result<ApiResponse, ApiError> {
        let body = QuickLoginRequest { phone, captcha };
        self.client
            .send(RequestEnvelope::post("/api/auth/quick-login").json(&body)?)
            .await
    }

    /// `GET /api/auth/captcha?phone=` (public).
    pub async fn get_captcha(&self, phone: &str) -> Result<ApiResponse, ApiError> {
        self.client
            .send(RequestEnvelope::get("/api/auth/captcha").query("phone", phone))
            .await
    }

    /// `POST /api/user/register` (public), url-encoded.
    pub async fn register(&self, form: &RegisterForm) -> Result<ApiResponse, ApiError> {
        self.client
            .send(RequestEnvelope::post("/api/user/register").form(form)?)
            .await
    }

    /// `POST /api/user/avatar/temp-upload` (public), multipart `avatar`.
    pub async fn upload_temp_avatar(
        &self,
        file_name: &str,
        bytes: impl Into<Bytes>,
    ) -> Result<ApiResponse, ApiError> {
        let part = avatar_part(file_name, bytes.into());
        self.client
            .send(RequestEnvelope::post("/api/user/avatar/temp-upload").multipart(vec![part]))
            .await
    }

    /// `POST /api/user/avatar/update`, multipart `avatar`.
    pub async fn update_avatar(
        &self,
        file_name: &str,
        bytes: impl Into<Bytes>,
    ) -> Result<ApiResponse, ApiError> {
        let part = avatar_part(file_name, bytes.into());
        self.client
            .send(RequestEnvelope::post("/api/user/avatar/update").multipart(vec![part]))
            .await
    }

    /// `DELETE /api/user/avatar/temp-delete?avatarUrl=`.
    pub async fn delete_temp_avatar(&self, avatar_url: &str) -> Result<ApiResponse, ApiError> {
        self.client
            .send(
                RequestEnvelope::delete("/api/user/avatar/temp-delete")
                    .query("avatarUrl", avatar_url),
            )
            .await
    }

    /// `POST /api/user/avatar/temp-delete-batch`.
    pub async fn delete_temp_avatar_batch(
        &self,
        avatar_urls: &[String],
    ) -> Result<ApiResponse, ApiError> {
        let body = AvatarBatch { avatar_urls };
        self.client
            .send(RequestEnvelope::post("/api/user/avatar/temp-delete-batch").json(&body)?)
            .await
    }

    /// `GET /api/user/profile?userId=`.
    pub async fn get_profile(&self, user_id: i64) -> Result<ApiResponse, ApiError> {
        self.client
            .send(RequestEnvelope::get("/api/user/profile").query("userId", user_id))
            .await
    }

    /// `PUT /api/user/profile`.
    pub async fn update_profile<T: Serialize + ?Sized>(
        &self,
        profile: &T,
    ) -> Result<ApiResponse, ApiError> {
        self.client
            .send(RequestEnvelope::put("/api/user/profile").json(profile)?)
            .await
    }

    /// `GET /api/user/gender/options`.
    pub async fn get_gender_options(&self) -> Result<ApiResponse, ApiError> {
        self.client
            .send(RequestEnvelope::get("/api/user/gender/options"))
            .await
    }

    /// `GET /api/user/region/provinces`.
    pub async fn get_provinces(&self) -> Result<ApiResponse, ApiError> {
        self.client
            .send(RequestEnvelope::get("/api/user/region/provinces"))
            .await
    }

    /// `GET /api/user/region/cities/{province_id}`.
    pub async fn get_cities(&self, province_id: i64) -> Result<ApiResponse, ApiError> {
        self.client
            .send(RequestEnvelope::get(format!("/api/user/region/cities/{province_id}")))
            .await
    }

    /// `GET /api/user/region/districts/{city_id}`.
    pub async fn get_districts(&self, city_id: i64) -> Result<ApiResponse, ApiError> {
        self.client
            .send(RequestEnvelope::get(format!("/api/user/region/districts/{city_id}")))
            .await
    }

    /// `POST /api/user/info/fill`.
    pub async fn fill_user_info<T: Serialize + ?Sized>(
        &self,
        info: &T,
    ) -> Result<ApiResponse, ApiError> {
        self.client
            .send(RequestEnvelope::post("/api/user/info/fill").json(info)?)
            .await
    }

    /// `GET /api/user/info`.
    pub async fn get_user_info(&self) -> Result<ApiResponse, ApiError> {
        self.client.send(RequestEnvelope::get("/api/user/info")).await
    }

    /// `GET /api/user/info/edit`: current values plus the option lists.
    pub async fn get_edit_user_info(&self) -> Result<ApiResponse, ApiError> {
        self.client
            .send(RequestEnvelope::get("/api/user/info/edit"))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_type_from_extension() {
        assert_eq!(image_content_type("me.PNG"), Some("image/png"));
        assert_eq!(image_content_type("me.jpeg"), Some("image/jpeg"));
        assert_eq!(image_content_type("me.bmp"), None);
        assert_eq!(image_content_type("noext"), None);
    }

    #[test]
    fn register_form_uses_camel_case_and_skips_absent() {
        let form = RegisterForm {
            phone: "13800000000".to_string(),
            password: "pw".to_string(),
            captcha: "1234".to_string(),
            nickname: None,
            avatar_url: Some("/tmp/a.png".to_string()),
        };
        let value = serde_json::to_value(&form).unwrap();
        assert_eq!(value["avatarUrl"], "/tmp/a.png");
        assert!(value.get("nickname").is_none());
    }
}

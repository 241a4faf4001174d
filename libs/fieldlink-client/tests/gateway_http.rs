//! End-to-end tests of the facades against mock backends.
//!
//! All services are pointed at one wiremock server; each test checks what
//! went over the wire and what the caller got back.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use fieldlink_client::session::TOKEN_KEY;
use fieldlink_client::{
    ApiError, EnvName, EnvironmentConfig, Gateway, MemoryStore, PoolOptions, RequestEnvelope,
    Service, Session, SessionStore, StoreError,
};
use fieldlink_client::facade::RegisterForm;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Memory store that counts token removals.
#[derive(Debug, Default)]
struct CountingStore {
    inner: MemoryStore,
    token_removals: AtomicUsize,
}

impl SessionStore for CountingStore {
    fn get(&self, key: &str) -> Option<String> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.inner.set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        if key == TOKEN_KEY {
            self.token_removals.fetch_add(1, Ordering::SeqCst);
        }
        self.inner.remove(key)
    }
}

fn gateway_for(server: &MockServer, session: Session) -> Gateway {
    let env = Arc::new(EnvironmentConfig::single_host(EnvName::Development, &server.uri()));
    Gateway::new(env, session).unwrap()
}

fn logged_in() -> Session {
    let session = Session::in_memory();
    session.set_token("tok-123").unwrap();
    session
}

#[tokio::test]
async fn login_posts_json_without_authorization() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .and(body_json(json!({
            "phone": "13800000000",
            "password": "x",
            "captcha": "1234",
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": { "token": "fresh-token", "userId": 7 },
        })))
        .expect(1)
        .mount(&server)
        .await;

    // A stale token is present but must not be sent to a public endpoint.
    let gateway = gateway_for(&server, logged_in());
    let response = gateway
        .user()
        .login("13800000000", "x", "1234")
        .await
        .unwrap();

    assert!(response.success);
    assert_eq!(response.data["token"], "fresh-token");

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].headers.get("authorization").is_none());
}

#[tokio::test]
async fn user_info_carries_bearer_token_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/user/info"))
        .and(header("authorization", "Bearer tok-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 0,
            "data": { "nickname": "老王" },
        })))
        .expect(1)
        .mount(&server)
        .await;

    let gateway = gateway_for(&server, logged_in());
    let response = gateway.user().get_user_info().await.unwrap();

    assert!(response.success, "success is derived from code 0");
    assert_eq!(response.code, Some(0));
    assert_eq!(response.data["nickname"], "老王");

    let requests = server.received_requests().await.unwrap();
    let auth: Vec<_> = requests[0].headers.get_all("authorization").iter().collect();
    assert_eq!(auth.len(), 1);
}

#[tokio::test]
async fn nonzero_code_normalizes_to_failure_flag() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/content/carousel"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "code": 1001, "message": "暂无数据" })),
        )
        .mount(&server)
        .await;

    let gateway = gateway_for(&server, Session::in_memory());
    let response = gateway.content().get_carousel().await.unwrap();

    assert!(!response.success);
    assert_eq!(response.message.as_deref(), Some("暂无数据"));
}

#[tokio::test]
async fn unauthorized_protected_call_clears_session_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/user/info"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "message": "token expired" })))
        .mount(&server)
        .await;

    let store = Arc::new(CountingStore::default());
    store.set(TOKEN_KEY, "tok-123").unwrap();
    let session = Session::new(store.clone());
    let gateway = gateway_for(&server, session.clone());

    let err = gateway.user().get_user_info().await.unwrap_err();

    assert_eq!(
        err,
        ApiError::SessionExpired {
            message: "登录已过期，请重新登录".to_string(),
            redirect_to: "/login".to_string(),
        }
    );
    assert_eq!(err.classified().status, Some(401));
    assert_eq!(store.token_removals.load(Ordering::SeqCst), 1);
    assert!(!session.is_authenticated());
}

#[tokio::test]
async fn unauthorized_public_call_keeps_session() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let store = Arc::new(CountingStore::default());
    store.set(TOKEN_KEY, "tok-123").unwrap();
    let session = Session::new(store.clone());
    let gateway = gateway_for(&server, session.clone());

    let err = gateway.user().login("138", "x", "1234").await.unwrap_err();

    assert!(matches!(err, ApiError::AuthMisconfigured { .. }));
    assert!(!err.is_session_expired());
    assert_eq!(store.token_removals.load(Ordering::SeqCst), 0);
    assert_eq!(session.token().as_deref(), Some("tok-123"));
}

#[tokio::test]
async fn slow_backend_yields_timeout_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/forum/posts"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "success": true }))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let env = Arc::new(EnvironmentConfig::single_host(EnvName::Development, &server.uri()));
    let options = PoolOptions {
        timeout: Duration::from_millis(200),
        ..PoolOptions::default()
    };
    let gateway = Gateway::with_options(env, Session::in_memory(), options).unwrap();

    let err = gateway.forum().get_posts(1, 10, None).await.unwrap_err();
    assert_eq!(
        err,
        ApiError::Timeout {
            message: "请求超时，请检查网络连接".to_string()
        }
    );
}

#[tokio::test]
async fn server_error_uses_fixed_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/answer/submit"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({ "message": "stack trace" })))
        .mount(&server)
        .await;

    let gateway = gateway_for(&server, logged_in());
    let err = gateway.answer().submit_answer(3, "B").await.unwrap_err();

    assert_eq!(err.message(), "服务器错误，请稍后重试");
    assert_eq!(err.status(), Some(500));
}

#[tokio::test]
async fn client_error_surfaces_backend_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/forum/comment"))
        .and(body_json(json!({ "postId": 9, "content": "", "parentId": null })))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(json!({ "success": false, "message": "评论内容不能为空" })),
        )
        .mount(&server)
        .await;

    let gateway = gateway_for(&server, logged_in());
    let err = gateway.forum().create_comment(9, "", None).await.unwrap_err();

    assert_eq!(
        err,
        ApiError::Backend {
            status: Some(400),
            message: "评论内容不能为空".to_string()
        }
    );
}

#[tokio::test]
async fn unreachable_backend_yields_network_error() {
    // Nothing listens on port 1.
    let env = Arc::new(EnvironmentConfig::single_host(EnvName::Development, "http://127.0.0.1:1"));
    let gateway = Gateway::new(env, Session::in_memory()).unwrap();

    let err = gateway.content().get_news(1, 10).await.unwrap_err();
    assert_eq!(err.message(), "网络请求失败");
    assert_eq!(err.status(), None);

    let records = gateway.actions().snapshot();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].action, "api_error");
    assert_eq!(records[0].module, "news");
}

#[tokio::test]
async fn register_sends_url_encoded_fields() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/user/register"))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .expect(1)
        .mount(&server)
        .await;

    let gateway = gateway_for(&server, logged_in());
    let form = RegisterForm {
        phone: "13800000000".to_string(),
        password: "secret".to_string(),
        captcha: "1234".to_string(),
        nickname: Some("farmer".to_string()),
        avatar_url: None,
    };
    gateway.user().register(&form).await.unwrap();

    let requests = server.received_requests().await.unwrap();
    let body = String::from_utf8(requests[0].body.clone()).unwrap();
    assert!(body.contains("phone=13800000000"));
    assert!(body.contains("nickname=farmer"));
    assert!(!body.contains("avatarUrl"));
    assert!(requests[0].headers.get("authorization").is_none());
}

#[tokio::test]
async fn temp_avatar_upload_is_public_multipart() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/user/avatar/temp-upload"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "success": true, "data": { "avatarUrl": "/tmp/a.png" } })),
        )
        .mount(&server)
        .await;

    let gateway = gateway_for(&server, logged_in());
    let response = gateway
        .user()
        .upload_temp_avatar("a.png", vec![0x89u8, b'P', b'N', b'G'])
        .await
        .unwrap();
    assert_eq!(response.data["avatarUrl"], "/tmp/a.png");

    let requests = server.received_requests().await.unwrap();
    let content_type = requests[0]
        .headers
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(content_type.starts_with("multipart/form-data"));
    let body = String::from_utf8_lossy(&requests[0].body);
    assert!(body.contains("name=\"avatar\""));
    assert!(body.contains("filename=\"a.png\""));
    assert!(requests[0].headers.get("authorization").is_none());
}

#[tokio::test]
async fn avatar_update_requires_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/user/avatar/update"))
        .and(header("authorization", "Bearer tok-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .expect(1)
        .mount(&server)
        .await;

    let gateway = gateway_for(&server, logged_in());
    gateway
        .user()
        .update_avatar("me.jpg", vec![1u8, 2, 3])
        .await
        .unwrap();
}

#[tokio::test]
async fn absent_query_values_are_not_sent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/forum/posts"))
        .and(query_param("page", "2"))
        .and(query_param("limit", "10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true, "data": [] })))
        .expect(1)
        .mount(&server)
        .await;

    let gateway = gateway_for(&server, Session::in_memory());
    gateway.forum().get_posts(2, 10, None).await.unwrap();

    let requests = server.received_requests().await.unwrap();
    let query = requests[0].url.query().unwrap_or_default();
    assert!(!query.contains("category"));
}

#[tokio::test]
async fn temp_avatar_delete_encodes_url_parameter() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/user/avatar/temp-delete"))
        .and(query_param("avatarUrl", "/uploads/tmp/a b.png"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .expect(1)
        .mount(&server)
        .await;

    let gateway = gateway_for(&server, logged_in());
    gateway
        .user()
        .delete_temp_avatar("/uploads/tmp/a b.png")
        .await
        .unwrap();
}

#[tokio::test]
async fn agent_chat_posts_message_and_session() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/agent/chat"))
        .and(body_json(json!({ "message": "小麦锈病怎么防治？", "sessionId": "s-1" })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "code": 0, "data": { "reply": "..." } })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let gateway = gateway_for(&server, logged_in());
    let response = gateway
        .agent()
        .chat("小麦锈病怎么防治？", Some("s-1"))
        .await
        .unwrap();
    assert!(response.success);
}

#[tokio::test]
async fn successful_calls_are_recorded() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/answer/leaderboard"))
        .and(query_param("type", "daily"))
        .and(query_param("limit", "20"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true, "data": [] })))
        .mount(&server)
        .await;

    let gateway = gateway_for(&server, Session::in_memory());
    gateway.answer().get_leaderboard("daily", 20).await.unwrap();

    let records = gateway.actions().snapshot();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].action, "api_success");
    assert_eq!(records[0].module, "leaderboard");
    assert_eq!(records[0].data["url"], "/api/answer/leaderboard");
    assert!(records[0].data["duration"].is_u64());
}

/// Mount `hops` redirects `/api/user/r0 -> r1 -> ...` ending in a 200.
async fn mount_redirect_chain(server: &MockServer, hops: usize) {
    for i in 0..hops {
        Mock::given(method("GET"))
            .and(path(format!("/api/user/r{i}")))
            .respond_with(
                ResponseTemplate::new(302)
                    .insert_header("location", format!("{}/api/user/r{}", server.uri(), i + 1)),
            )
            .mount(server)
            .await;
    }
    Mock::given(method("GET"))
        .and(path(format!("/api/user/r{hops}")))
        .respond_with(ResponseTemplate::new(200).set_body_string("end"))
        .mount(server)
        .await;
}

#[tokio::test]
async fn redirects_are_followed_up_to_the_limit() {
    let server = MockServer::start().await;
    mount_redirect_chain(&server, 5).await;

    let gateway = gateway_for(&server, Session::in_memory());
    let response = gateway
        .client(Service::User)
        .send(RequestEnvelope::get("/api/user/r0"))
        .await
        .unwrap();

    assert!(response.success);
    assert_eq!(response.data, json!("end"));
}

#[tokio::test]
async fn too_many_redirects_is_a_network_error() {
    let server = MockServer::start().await;
    mount_redirect_chain(&server, 6).await;

    let gateway = gateway_for(&server, Session::in_memory());
    let err = gateway
        .client(Service::User)
        .send(RequestEnvelope::get("/api/user/r0"))
        .await
        .unwrap_err();

    assert_eq!(
        err,
        ApiError::Network {
            status: None,
            message: "网络请求失败".to_string(),
        }
    );
}

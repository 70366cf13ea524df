//! 통합 테스트 공용 헬퍼.

#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    response::Response,
    Router,
};
use chrono::Duration;
use secrecy::SecretString;
use serde_json::Value;
use tower::ServiceExt;

use taskhub_api::auth::{PasswordHasher, TokenIssuer};
use taskhub_api::repository::Repositories;
use taskhub_api::routes::create_api_router;
use taskhub_api::services::{ExternalTask, ExternalTaskClient};
use taskhub_api::state::AppState;
use taskhub_core::TaskHubResult;

pub const ACCESS_SECRET: &str = "integration-access-secret";
pub const REFRESH_SECRET: &str = "integration-refresh-secret";

/// 고정 목록을 반환하는 외부 소스.
pub struct StaticSource(pub Vec<ExternalTask>);

#[async_trait]
impl ExternalTaskClient for StaticSource {
    async fn fetch_all(&self) -> TaskHubResult<Vec<ExternalTask>> {
        Ok(self.0.clone())
    }
}

pub fn issuer_with(refresh_secret: &str, refresh_ttl: Duration) -> TokenIssuer {
    TokenIssuer::from_parts(
        &SecretString::new(ACCESS_SECRET.into()),
        &SecretString::new(refresh_secret.into()),
        Duration::minutes(15),
        refresh_ttl,
    )
}

/// 메모리 저장소 + 낮은 해싱 비용으로 라우터를 생성합니다.
pub fn app_with_source(source: Vec<ExternalTask>) -> Router {
    let state = AppState::new(
        Repositories::in_memory(),
        PasswordHasher::new(1024, 1, 1).unwrap(),
        issuer_with(REFRESH_SECRET, Duration::days(7)),
        Arc::new(StaticSource(source)),
    );
    create_api_router().with_state(Arc::new(state))
}

pub fn app() -> Router {
    app_with_source(Vec::new())
}

pub fn json_request(method: Method, uri: &str, body: Value, bearer: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = bearer {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn empty_request(method: Method, uri: &str, bearer: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = bearer {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

pub fn refresh_request(cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(Method::POST).uri("/auth/refresh");
    if let Some(value) = cookie {
        builder = builder.header(header::COOKIE, format!("refresh_token={}", value));
    }
    builder.body(Body::empty()).unwrap()
}

pub async fn send(app: &Router, request: Request<Body>) -> Response {
    app.clone().oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    }
}

/// Set-Cookie 헤더 원문.
pub fn set_cookie_header(response: &Response) -> String {
    response
        .headers()
        .get(header::SET_COOKIE)
        .expect("Set-Cookie header")
        .to_str()
        .unwrap()
        .to_string()
}

/// Set-Cookie 헤더에서 refresh_token 값만 추출합니다.
pub fn refresh_cookie_value(response: &Response) -> String {
    let header = set_cookie_header(response);
    header
        .split(';')
        .next()
        .and_then(|pair| pair.strip_prefix("refresh_token="))
        .expect("refresh_token cookie")
        .to_string()
}

pub async fn register(app: &Router, username: &str, password: &str) -> Value {
    let response = send(
        app,
        json_request(
            Method::POST,
            "/auth/register",
            serde_json::json!({ "username": username, "password": password }),
            None,
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await
}

/// 로그인 결과.
pub struct Session {
    pub user_id: i64,
    pub access_token: String,
    pub refresh_token: String,
}

pub async fn login(app: &Router, username: &str, password: &str) -> Session {
    let response = send(
        app,
        json_request(
            Method::POST,
            "/auth/login",
            serde_json::json!({ "username": username, "password": password }),
            None,
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let refresh_token = refresh_cookie_value(&response);
    let body = body_json(response).await;

    Session {
        user_id: body["userId"].as_i64().unwrap(),
        access_token: body["access_token"].as_str().unwrap().to_string(),
        refresh_token,
    }
}

/// 등록 후 로그인.
pub async fn signup(app: &Router, username: &str) -> Session {
    register(app, username, "password1").await;
    login(app, username, "password1").await
}

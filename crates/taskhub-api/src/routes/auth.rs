//! 인증 API 라우트
//!
//! # 엔드포인트
//!
//! - `POST /auth/register` - 회원 가입
//! - `POST /auth/login` - 로그인 (Access Token + Refresh Token 쿠키)
//! - `POST /auth/refresh` - Refresh Token 회전

use axum::{
    extract::State,
    http::{header::SET_COOKIE, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use taskhub_core::{UserId, UserProfile};
use validator::Validate;

use crate::auth::{build_refresh_cookie, AuthOutcome, RefreshAuth};
use crate::error::ApiResult;
use crate::extract::ValidatedJson;
use crate::state::AppState;

// ================================================================================================
// Request/Response Types
// ================================================================================================

/// 회원 가입 요청
#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 20, message = "username must be 1-20 characters"))]
    pub username: String,
    #[validate(length(min = 6, message = "password must be at least 6 characters"))]
    pub password: String,
}

/// 로그인 요청
#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "username is required"))]
    pub username: String,
    #[validate(length(min = 1, message = "password is required"))]
    pub password: String,
}

/// 로그인/갱신 응답. Refresh Token은 쿠키로만 전달됩니다.
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(rename = "userId")]
    pub user_id: UserId,
}

// ================================================================================================
// Handlers
// ================================================================================================

/// POST /auth/register - 회원 가입
async fn register(
    State(state): State<Arc<AppState>>,
    ValidatedJson(input): ValidatedJson<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<UserProfile>)> {
    let profile = state.users.register(&input.username, &input.password).await?;
    Ok((StatusCode::CREATED, Json(profile)))
}

/// POST /auth/login - 로그인
async fn login(
    State(state): State<Arc<AppState>>,
    ValidatedJson(input): ValidatedJson<LoginRequest>,
) -> ApiResult<Response> {
    let outcome = state.auth.login(&input.username, &input.password).await?;
    Ok(token_response(&state, outcome))
}

/// POST /auth/refresh - Refresh Token 회전
///
/// 서명/만료는 [`RefreshAuth`]가 검증하고(실패 시 401),
/// 세대 검증은 서비스가 수행합니다(실패 시 403).
async fn refresh(
    State(state): State<Arc<AppState>>,
    RefreshAuth { claims, token }: RefreshAuth,
) -> ApiResult<Response> {
    let outcome = state.auth.refresh_tokens(claims.sub, &token).await?;
    Ok(token_response(&state, outcome))
}

fn token_response(state: &AppState, outcome: AuthOutcome) -> Response {
    let cookie = build_refresh_cookie(
        &outcome.tokens.refresh.token,
        state.auth.issuer().refresh_ttl(),
        state.cookie_secure,
    );
    let body = TokenResponse {
        access_token: outcome.tokens.access_token,
        user_id: outcome.user_id,
    };

    ([(SET_COOKIE, cookie)], Json(body)).into_response()
}

/// 인증 라우터 생성.
pub fn auth_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/refresh", post(refresh))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_request_rules() {
        let ok = RegisterRequest {
            username: "alice".to_string(),
            password: "secret".to_string(),
        };
        assert!(ok.validate().is_ok());

        let short = RegisterRequest {
            username: "alice".to_string(),
            password: "12345".to_string(),
        };
        assert!(short.validate().is_err());

        let long_name = RegisterRequest {
            username: "a".repeat(21),
            password: "secret".to_string(),
        };
        assert!(long_name.validate().is_err());
    }

    #[test]
    fn test_register_rejects_role_field() {
        let parsed: Result<RegisterRequest, _> = serde_json::from_str(
            r#"{"username":"mallory","password":"secret","role":"admin"}"#,
        );
        assert!(parsed.is_err());
    }
}

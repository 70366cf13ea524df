//! Axum용 인증 추출기.
//!
//! - [`JwtAuth`]: `Authorization: Bearer` Access Token 검증
//! - [`AdminAuth`]: Access Token + 관리자 역할
//! - [`RefreshAuth`]: `refresh_token` 쿠키의 서명/만료 검증
//!
//! 전송 계층 실패는 401(역할 부족은 403)로 응답하며,
//! Refresh Token의 세대 검증은 [`AuthService`](super::AuthService)가 담당합니다.

use std::sync::Arc;

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use tracing::debug;

use super::cookie::extract_refresh_cookie;
use super::jwt::{AccessClaims, JwtError, RefreshClaims};
use super::rbac::Caller;
use crate::error::ApiErrorResponse;
use crate::state::AppState;

/// JWT 인증 추출기.
///
/// # 사용 예시
///
/// ```rust,ignore
/// async fn protected_handler(
///     JwtAuth(claims): JwtAuth,
/// ) -> impl IntoResponse {
///     format!("Authenticated user: {}", claims.username)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct JwtAuth(pub AccessClaims);

impl JwtAuth {
    /// RBAC 판정용 요청 주체.
    pub fn caller(&self) -> Caller {
        Caller::from(&self.0)
    }
}

/// 인증 추출 에러.
#[derive(Debug, thiserror::Error)]
pub enum JwtAuthError {
    #[error("인증 토큰이 필요합니다")]
    MissingToken,
    #[error("잘못된 Authorization 헤더 형식")]
    InvalidAuthHeader,
    #[error("Refresh Token 쿠키가 필요합니다")]
    MissingRefreshToken,
    #[error("토큰이 만료되었습니다")]
    TokenExpired,
    #[error("유효하지 않은 토큰")]
    InvalidToken,
    #[error("권한이 부족합니다")]
    InsufficientPermission,
}

impl From<JwtError> for JwtAuthError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::TokenExpired => JwtAuthError::TokenExpired,
            _ => JwtAuthError::InvalidToken,
        }
    }
}

impl IntoResponse for JwtAuthError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            JwtAuthError::MissingToken => (StatusCode::UNAUTHORIZED, "MISSING_TOKEN"),
            JwtAuthError::InvalidAuthHeader => (StatusCode::UNAUTHORIZED, "INVALID_AUTH_HEADER"),
            JwtAuthError::MissingRefreshToken => {
                (StatusCode::UNAUTHORIZED, "MISSING_REFRESH_TOKEN")
            }
            JwtAuthError::TokenExpired => (StatusCode::UNAUTHORIZED, "TOKEN_EXPIRED"),
            JwtAuthError::InvalidToken => (StatusCode::UNAUTHORIZED, "INVALID_TOKEN"),
            JwtAuthError::InsufficientPermission => {
                (StatusCode::FORBIDDEN, "INSUFFICIENT_PERMISSION")
            }
        };

        (status, Json(ApiErrorResponse::new(code, self.to_string()))).into_response()
    }
}

impl<S> FromRequestParts<S> for JwtAuth
where
    Arc<AppState>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = JwtAuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = Arc::<AppState>::from_ref(state);

        // Authorization 헤더에서 토큰 추출
        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or(JwtAuthError::MissingToken)?;

        // Bearer 토큰 형식 확인
        let token = auth_header
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(JwtAuthError::InvalidAuthHeader)?;

        let claims = state.auth.issuer().verify_access(token).map_err(|e| {
            debug!(error = %e, "Access token rejected");
            JwtAuthError::from(e)
        })?;

        Ok(JwtAuth(claims))
    }
}

/// Admin 권한을 요구하는 추출기.
#[derive(Debug, Clone)]
pub struct AdminAuth(pub AccessClaims);

impl AdminAuth {
    pub fn caller(&self) -> Caller {
        Caller::from(&self.0)
    }
}

impl<S> FromRequestParts<S> for AdminAuth
where
    Arc<AppState>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = JwtAuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let JwtAuth(claims) = JwtAuth::from_request_parts(parts, state).await?;
        if !claims.role.is_admin() {
            return Err(JwtAuthError::InsufficientPermission);
        }
        Ok(AdminAuth(claims))
    }
}

/// Refresh Token 쿠키 추출기.
///
/// 서명과 만료만 검증합니다. 현재 세대인지는 원장에서 확인합니다.
#[derive(Debug, Clone)]
pub struct RefreshAuth {
    pub claims: RefreshClaims,
    /// 제시된 토큰 원문 (원장 해시 비교용)
    pub token: String,
}

impl<S> FromRequestParts<S> for RefreshAuth
where
    Arc<AppState>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = JwtAuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = Arc::<AppState>::from_ref(state);

        let token =
            extract_refresh_cookie(&parts.headers).ok_or(JwtAuthError::MissingRefreshToken)?;

        let claims = state.auth.issuer().verify_refresh(&token).map_err(|e| {
            debug!(error = %e, "Refresh token rejected at transport guard");
            JwtAuthError::from(e)
        })?;

        Ok(RefreshAuth { claims, token })
    }
}

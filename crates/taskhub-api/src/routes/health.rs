//! 헬스 체크 endpoint.
//!
//! 로드밸런서나 오케스트레이션 시스템(Kubernetes 등)에서 사용됩니다.

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::state::AppState;

/// 헬스 체크 응답 구조체.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// 전체 상태 ("ok" | "degraded")
    pub status: String,

    /// API 버전
    pub version: String,

    /// 서버 업타임(초)
    pub uptime_secs: i64,

    /// 데이터베이스 상태 ("up" | "down" | "not_configured")
    pub database: String,
}

/// GET /health
///
/// 데이터베이스가 설정되어 있는데 응답하지 않으면 503을 반환합니다.
pub async fn health_check(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<HealthResponse>) {
    let (status_code, status, database) = match state.is_db_healthy().await {
        Some(true) => (StatusCode::OK, "ok", "up"),
        Some(false) => (StatusCode::SERVICE_UNAVAILABLE, "degraded", "down"),
        None => (StatusCode::OK, "ok", "not_configured"),
    };

    let response = HealthResponse {
        status: status.to_string(),
        version: state.version.clone(),
        uptime_secs: state.uptime_secs(),
        database: database.to_string(),
    };

    (status_code, Json(response))
}

/// 헬스 체크 라우터 생성.
pub fn health_router() -> Router<Arc<AppState>> {
    Router::new().route("/", get(health_check))
}

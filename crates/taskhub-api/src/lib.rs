//! 태스크 관리 REST API 서버.
//!
//! 이 크레이트는 다음을 제공합니다:
//! - Axum 기반 REST API
//! - Access/Refresh JWT 인증 (Refresh Token 회전 및 재사용 탐지)
//! - 역할 + 소유권 기반 권한 판정
//! - 헬스 체크 엔드포인트
//! - Prometheus 메트릭
//!
//! # 모듈 구성
//!
//! - [`state`]: 애플리케이션 공유 상태 (AppState)
//! - [`routes`]: REST API 엔드포인트
//! - [`auth`]: 인증 및 권한 관리
//! - [`services`]: 사용자/태스크 서비스
//! - [`repository`]: 저장소 트레이트와 구현
//! - [`metrics`]: Prometheus 메트릭 수집
//! - [`middleware`]: HTTP 미들웨어

pub mod auth;
pub mod error;
pub mod extract;
pub mod metrics;
pub mod middleware;
pub mod repository;
pub mod routes;
pub mod services;
pub mod state;

pub use auth::{AccessClaims, AdminAuth, JwtAuth, JwtAuthError, RefreshAuth};
pub use error::{ApiError, ApiErrorResponse, ApiResult};
pub use metrics::setup_metrics_recorder;
pub use middleware::metrics_layer;
pub use routes::create_api_router;
pub use state::AppState;

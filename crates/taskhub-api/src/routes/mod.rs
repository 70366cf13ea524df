//! API 라우트.
//!
//! # 라우트 구조
//!
//! - `/health` - 헬스 체크
//! - `/auth` - 회원 가입, 로그인, 토큰 갱신
//! - `/user` - 역할 변경, 사용자 삭제
//! - `/tasks` - 태스크 관리

pub mod auth;
pub mod health;
pub mod tasks;
pub mod users;

pub use auth::{auth_router, LoginRequest, RegisterRequest, TokenResponse};
pub use health::{health_router, HealthResponse};
pub use tasks::{tasks_router, CreateTaskRequest, UpdateTaskRequest};
pub use users::{users_router, RoleResponse, UpdateRoleRequest};

use axum::Router;
use std::sync::Arc;

use crate::state::AppState;

/// 전체 API 라우터 생성.
pub fn create_api_router() -> Router<Arc<AppState>> {
    Router::new()
        .nest("/health", health_router())
        .nest("/auth", auth_router())
        .nest("/user", users_router())
        .nest("/tasks", tasks_router())
}

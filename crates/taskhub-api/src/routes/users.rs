//! 사용자 관리 API 라우트
//!
//! # 엔드포인트
//!
//! - `PATCH /user/{id}/role` - 역할 변경 (관리자 전용)
//! - `DELETE /user/{id}` - 사용자 삭제 (본인 또는 관리자)

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, patch},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use taskhub_core::{Role, UserId};
use validator::Validate;

use crate::auth::JwtAuth;
use crate::error::ApiResult;
use crate::extract::ValidatedJson;
use crate::state::AppState;

/// 역할 변경 요청
#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct UpdateRoleRequest {
    pub role: Role,
}

/// 역할 변경 응답
#[derive(Debug, Serialize, Deserialize)]
pub struct RoleResponse {
    pub id: UserId,
    pub role: Role,
}

/// PATCH /user/{id}/role - 역할 변경
async fn update_role(
    State(state): State<Arc<AppState>>,
    auth: JwtAuth,
    Path(id): Path<UserId>,
    ValidatedJson(input): ValidatedJson<UpdateRoleRequest>,
) -> ApiResult<Json<RoleResponse>> {
    let profile = state.users.update_role(auth.caller(), id, input.role).await?;
    Ok(Json(RoleResponse {
        id: profile.id,
        role: profile.role,
    }))
}

/// DELETE /user/{id} - 사용자 삭제
async fn delete_user(
    State(state): State<Arc<AppState>>,
    auth: JwtAuth,
    Path(id): Path<UserId>,
) -> ApiResult<StatusCode> {
    state.users.delete(auth.caller(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// 사용자 라우터 생성.
pub fn users_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/{id}/role", patch(update_role))
        .route("/{id}", delete(delete_user))
}

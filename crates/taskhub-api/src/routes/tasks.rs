//! 태스크 API 라우트
//!
//! # 엔드포인트
//!
//! - `POST /tasks` - 태스크 생성
//! - `GET /tasks` - 내 태스크 목록 (페이지네이션)
//! - `GET /tasks/{id}` - 내 태스크 조회
//! - `PATCH /tasks/{id}` - 태스크 수정
//! - `DELETE /tasks/{id}` - 태스크 삭제
//! - `PATCH /tasks/sync-external` - 외부 소스 동기화 (관리자 전용)

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch},
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use taskhub_core::{Page, Task, TaskChanges, UserId};
use tracing::debug;
use uuid::Uuid;
use validator::Validate;

use crate::auth::{AdminAuth, JwtAuth};
use crate::error::ApiResult;
use crate::extract::ValidatedJson;
use crate::services::{CreateTask, SyncReport};
use crate::state::AppState;

// ================================================================================================
// Request Types
// ================================================================================================

/// 태스크 생성 요청
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateTaskRequest {
    #[validate(length(min = 1, max = 255, message = "title must be 1-255 characters"))]
    pub title: String,
    #[validate(length(max = 1000, message = "description must be at most 1000 characters"))]
    pub description: Option<String>,
    /// 담당자 ID
    #[validate(range(min = 1, message = "userId must be positive"))]
    pub user_id: UserId,
    pub completed: Option<bool>,
}

/// 목록 조회 쿼리
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListTasksQuery {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

/// 태스크 수정 요청
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateTaskRequest {
    /// 태스크 담당자 ID
    #[validate(range(min = 1, message = "userId must be positive"))]
    pub user_id: UserId,
    #[validate(length(min = 1, max = 255, message = "title must be 1-255 characters"))]
    pub title: Option<String>,
    pub completed: Option<bool>,
}

/// 태스크 삭제 요청
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct DeleteTaskRequest {
    /// 태스크 담당자 ID
    #[validate(range(min = 1, message = "userId must be positive"))]
    pub user_id: UserId,
}

// ================================================================================================
// Handlers
// ================================================================================================

/// POST /tasks - 태스크 생성
async fn create_task(
    State(state): State<Arc<AppState>>,
    auth: JwtAuth,
    ValidatedJson(input): ValidatedJson<CreateTaskRequest>,
) -> ApiResult<(StatusCode, Json<Task>)> {
    let task = state
        .tasks
        .create(
            auth.caller(),
            CreateTask {
                title: input.title,
                description: input.description,
                completed: input.completed.unwrap_or(false),
                user_id: input.user_id,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(task)))
}

/// GET /tasks - 내 태스크 목록
async fn list_tasks(
    State(state): State<Arc<AppState>>,
    auth: JwtAuth,
    Query(query): Query<ListTasksQuery>,
) -> ApiResult<Json<Page<Task>>> {
    let page = state.tasks.page_request(query.page, query.page_size);
    debug!(user_id = auth.0.sub, page = page.page, page_size = page.page_size, "Listing tasks");
    Ok(Json(state.tasks.list(auth.caller(), page).await?))
}

/// GET /tasks/{id} - 내 태스크 조회
async fn get_task(
    State(state): State<Arc<AppState>>,
    auth: JwtAuth,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Task>> {
    Ok(Json(state.tasks.get(auth.caller(), id).await?))
}

/// PATCH /tasks/{id} - 태스크 수정
async fn update_task(
    State(state): State<Arc<AppState>>,
    auth: JwtAuth,
    Path(id): Path<Uuid>,
    ValidatedJson(input): ValidatedJson<UpdateTaskRequest>,
) -> ApiResult<Json<Task>> {
    let changes = TaskChanges {
        title: input.title,
        completed: input.completed,
    };
    let task = state
        .tasks
        .update(auth.caller(), id, input.user_id, changes)
        .await?;
    Ok(Json(task))
}

/// DELETE /tasks/{id} - 태스크 삭제
async fn delete_task(
    State(state): State<Arc<AppState>>,
    auth: JwtAuth,
    Path(id): Path<Uuid>,
    ValidatedJson(input): ValidatedJson<DeleteTaskRequest>,
) -> ApiResult<StatusCode> {
    state.tasks.delete(auth.caller(), id, input.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// PATCH /tasks/sync-external - 외부 소스 동기화
async fn sync_external(
    State(state): State<Arc<AppState>>,
    auth: AdminAuth,
) -> ApiResult<Json<SyncReport>> {
    Ok(Json(state.tasks.sync_external(auth.caller()).await?))
}

/// 태스크 라우터 생성.
pub fn tasks_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_tasks).post(create_task))
        .route("/sync-external", patch(sync_external))
        .route(
            "/{id}",
            get(get_task).patch(update_task).delete(delete_task),
        )
}

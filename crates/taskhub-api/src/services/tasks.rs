//! 태스크 서비스.
//!
//! 수정/삭제는 두 단계로 판정합니다:
//! 1. 클라이언트가 보낸 소유자 ID에 대한 권한 검사
//! 2. 그 소유자 범위 내에서 태스크 조회 (없으면 `TaskNotFound`)
//!
//! 소유자 ID를 위조하면 1단계는 통과할 수 있어도 2단계에서 404가 됩니다.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use taskhub_core::{
    NewTask, Page, PageRequest, Task, TaskChanges, TaskHubError, TaskHubResult, UserId,
};
use tracing::{info, warn};
use uuid::Uuid;

use super::external::ExternalTaskClient;
use crate::auth::{ensure_admin, ensure_owner_or_admin, Caller, GuardedAction};
use crate::metrics::{record_task_event, record_tasks_synced};
use crate::repository::{TaskRepository, UserRepository};

/// 태스크 생성 입력.
#[derive(Debug, Clone)]
pub struct CreateTask {
    pub title: String,
    pub description: Option<String>,
    pub completed: bool,
    /// 담당자
    pub user_id: UserId,
}

/// 외부 동기화 결과.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    /// 외부 소스에서 가져온 항목 수
    pub processed_tasks: u64,
    /// 새로 저장된 항목 수
    pub synced_tasks: u64,
}

/// 태스크 서비스.
#[derive(Clone)]
pub struct TasksService {
    tasks: Arc<dyn TaskRepository>,
    users: Arc<dyn UserRepository>,
    external: Arc<dyn ExternalTaskClient>,
    default_page_size: u32,
    max_page_size: u32,
}

impl TasksService {
    pub fn new(
        tasks: Arc<dyn TaskRepository>,
        users: Arc<dyn UserRepository>,
        external: Arc<dyn ExternalTaskClient>,
    ) -> Self {
        Self {
            tasks,
            users,
            external,
            default_page_size: 10,
            max_page_size: 100,
        }
    }

    /// 페이지 크기 기본값/최대값 설정.
    pub fn with_page_sizes(mut self, default_page_size: u32, max_page_size: u32) -> Self {
        self.default_page_size = default_page_size;
        self.max_page_size = max_page_size;
        self
    }

    /// 페이지 요청 정규화.
    pub fn page_request(&self, page: Option<u32>, page_size: Option<u32>) -> PageRequest {
        PageRequest::new(page, page_size, self.default_page_size, self.max_page_size)
    }

    /// 태스크를 생성합니다. 담당자가 본인이 아니면 관리자 권한이 필요합니다.
    ///
    /// 담당자 존재 여부를 먼저 확인하므로, 없는 담당자는 권한과 무관하게 `UserNotFound`입니다.
    pub async fn create(&self, caller: Caller, input: CreateTask) -> TaskHubResult<Task> {
        if self.users.find_by_id(input.user_id).await?.is_none() {
            return Err(TaskHubError::UserNotFound);
        }

        ensure_owner_or_admin(caller, input.user_id, GuardedAction::TaskAccess)?;

        let task = self
            .tasks
            .insert(NewTask {
                title: input.title,
                description: input.description,
                completed: input.completed,
                assigned_user_id: input.user_id,
                created_by_user_id: caller.id,
            })
            .await?;

        emit_created(&task);
        Ok(task)
    }

    /// 호출자에게 할당된 태스크 목록 (최신순).
    pub async fn list(&self, caller: Caller, page: PageRequest) -> TaskHubResult<Page<Task>> {
        let (data, total) = self.tasks.list_for_user(caller.id, page).await?;
        Ok(Page::new(data, total, page))
    }

    /// 호출자에게 할당된 태스크 단건 조회.
    pub async fn get(&self, caller: Caller, id: Uuid) -> TaskHubResult<Task> {
        self.tasks
            .find_for_user(id, caller.id)
            .await?
            .ok_or(TaskHubError::TaskNotFound)
    }

    /// 태스크를 수정합니다.
    ///
    /// # Arguments
    ///
    /// * `owner_id` - 클라이언트가 보낸 담당자 ID
    pub async fn update(
        &self,
        caller: Caller,
        id: Uuid,
        owner_id: UserId,
        changes: TaskChanges,
    ) -> TaskHubResult<Task> {
        ensure_owner_or_admin(caller, owner_id, GuardedAction::TaskAccess)?;

        let mut task = self
            .tasks
            .find_for_user(id, owner_id)
            .await?
            .ok_or(TaskHubError::TaskNotFound)?;

        if changes.is_empty() {
            return Ok(task);
        }

        let completed_now = changes.apply_to(&mut task, Utc::now());
        let task = self.tasks.save(&task).await?;

        if completed_now {
            emit_completed(&task);
        }
        Ok(task)
    }

    /// 태스크를 삭제합니다.
    pub async fn delete(&self, caller: Caller, id: Uuid, owner_id: UserId) -> TaskHubResult<()> {
        ensure_owner_or_admin(caller, owner_id, GuardedAction::TaskAccess)?;

        self.tasks
            .find_for_user(id, owner_id)
            .await?
            .ok_or(TaskHubError::TaskNotFound)?;

        if !self.tasks.delete(id).await? {
            return Err(TaskHubError::TaskNotFound);
        }

        info!(task_id = %id, actor_id = caller.id, "Task deleted");
        Ok(())
    }

    /// 외부 소스의 태스크를 가져와 저장합니다 (관리자 전용).
    ///
    /// 담당자가 존재하고, 같은 담당자에게 같은 제목의 태스크가 없는 항목만 저장합니다.
    pub async fn sync_external(&self, caller: Caller) -> TaskHubResult<SyncReport> {
        ensure_admin(caller, GuardedAction::ExternalSync)?;

        let fetched = self.external.fetch_all().await?;
        let processed_tasks = fetched.len() as u64;

        let candidate_ids: Vec<UserId> = fetched
            .iter()
            .map(|t| t.user_id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let existing: BTreeSet<UserId> = self
            .users
            .existing_ids(&candidate_ids)
            .await?
            .into_iter()
            .collect();

        let mut synced_tasks = 0u64;
        for item in fetched {
            if !existing.contains(&item.user_id) {
                continue;
            }
            if self
                .tasks
                .exists_with_title(&item.title, item.user_id)
                .await?
            {
                continue;
            }

            let task = self
                .tasks
                .insert(NewTask {
                    title: item.title,
                    description: None,
                    completed: item.completed,
                    assigned_user_id: item.user_id,
                    created_by_user_id: caller.id,
                })
                .await?;
            emit_created(&task);
            synced_tasks += 1;
        }

        if synced_tasks < processed_tasks {
            warn!(
                skipped = processed_tasks - synced_tasks,
                "External tasks skipped (unknown user or duplicate title)"
            );
        }

        record_tasks_synced(synced_tasks);
        info!(
            actor_id = caller.id,
            processed_tasks, synced_tasks, "External tasks synchronized"
        );
        Ok(SyncReport {
            processed_tasks,
            synced_tasks,
        })
    }
}

// ============================================================================
// 도메인 이벤트
// ============================================================================

fn emit_created(task: &Task) {
    record_task_event("created");
    info!(
        event = "TASK_CREATED",
        task_id = %task.id,
        user_id = task.assigned_user_id,
        created_by = ?task.created_by_user_id,
        "Task created"
    );
}

fn emit_completed(task: &Task) {
    record_task_event("completed");
    info!(
        event = "TASK_COMPLETED",
        task_id = %task.id,
        user_id = task.assigned_user_id,
        "Task completed"
    );
}

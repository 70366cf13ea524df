//! 태스크 모델.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::UserId;

/// 저장된 태스크.
///
/// `assigned_user_id`가 소유자이며, 조회/수정/삭제 범위는 이 값으로 제한됩니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "sqlx-support", derive(sqlx::FromRow))]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub completed: bool,
    #[serde(rename = "userId")]
    pub assigned_user_id: UserId,
    /// 생성자. 생성자 계정이 삭제되면 `None`.
    #[serde(skip_serializing)]
    pub created_by_user_id: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 새 태스크 입력.
#[derive(Debug, Clone)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub completed: bool,
    pub assigned_user_id: UserId,
    pub created_by_user_id: UserId,
}

/// 태스크 부분 수정 입력.
#[derive(Debug, Clone, Default)]
pub struct TaskChanges {
    pub title: Option<String>,
    pub completed: Option<bool>,
}

impl TaskChanges {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.completed.is_none()
    }

    /// 변경 사항을 태스크에 적용하고, 미완료→완료 전환 여부를 반환합니다.
    pub fn apply_to(&self, task: &mut Task, now: DateTime<Utc>) -> bool {
        let was_completed = task.completed;
        if let Some(title) = &self.title {
            task.title = title.clone();
        }
        if let Some(completed) = self.completed {
            task.completed = completed;
        }
        if !self.is_empty() {
            task.updated_at = now;
        }
        !was_completed && task.completed
    }
}

//! 태스크 저장소 (PostgreSQL).

use async_trait::async_trait;
use sqlx::PgPool;
use taskhub_core::{NewTask, PageRequest, Task, TaskHubResult, UserId};
use uuid::Uuid;

use super::TaskRepository;

const COLUMNS: &str = "id, title, description, completed, assigned_user_id, created_by_user_id, created_at, updated_at";

/// `tasks` 테이블 저장소.
#[derive(Clone)]
pub struct PgTaskRepository {
    pool: PgPool,
}

impl PgTaskRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TaskRepository for PgTaskRepository {
    async fn insert(&self, new_task: NewTask) -> TaskHubResult<Task> {
        let task = sqlx::query_as::<_, Task>(&format!(
            r#"
            INSERT INTO tasks (id, title, description, completed, assigned_user_id, created_by_user_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(&new_task.title)
        .bind(&new_task.description)
        .bind(new_task.completed)
        .bind(new_task.assigned_user_id)
        .bind(new_task.created_by_user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(task)
    }

    async fn find_for_user(&self, id: Uuid, user_id: UserId) -> TaskHubResult<Option<Task>> {
        let task = sqlx::query_as::<_, Task>(&format!(
            "SELECT {COLUMNS} FROM tasks WHERE id = $1 AND assigned_user_id = $2"
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(task)
    }

    async fn list_for_user(
        &self,
        user_id: UserId,
        page: PageRequest,
    ) -> TaskHubResult<(Vec<Task>, u64)> {
        let tasks = sqlx::query_as::<_, Task>(&format!(
            r#"
            SELECT {COLUMNS} FROM tasks
            WHERE assigned_user_id = $1
            ORDER BY created_at DESC, id
            LIMIT $2 OFFSET $3
            "#
        ))
        .bind(user_id)
        .bind(page.limit() as i64)
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tasks WHERE assigned_user_id = $1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;

        Ok((tasks, total.max(0) as u64))
    }

    async fn save(&self, task: &Task) -> TaskHubResult<Task> {
        let saved = sqlx::query_as::<_, Task>(&format!(
            r#"
            UPDATE tasks SET title = $2, completed = $3, updated_at = $4
            WHERE id = $1
            RETURNING {COLUMNS}
            "#
        ))
        .bind(task.id)
        .bind(&task.title)
        .bind(task.completed)
        .bind(task.updated_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(saved)
    }

    async fn delete(&self, id: Uuid) -> TaskHubResult<bool> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn exists_with_title(&self, title: &str, user_id: UserId) -> TaskHubResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM tasks WHERE title = $1 AND assigned_user_id = $2)",
        )
        .bind(title)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }
}

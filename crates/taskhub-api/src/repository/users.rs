//! 사용자 저장소 (PostgreSQL).

use async_trait::async_trait;
use sqlx::PgPool;
use taskhub_core::{NewUser, Role, TaskHubError, TaskHubResult, User, UserId};

use super::{is_unique_violation, UserRepository};

/// `users` 테이블 저장소.
#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_id(&self, id: UserId) -> TaskHubResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, password, role FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_by_username(&self, username: &str) -> TaskHubResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, password, role FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn insert_with_bootstrap_role(&self, new_user: NewUser) -> TaskHubResult<User> {
        let mut tx = self.pool.begin().await?;

        // 첫 사용자 판정과 삽입 사이에 다른 가입이 끼어들지 못하게 잠금
        sqlx::query("LOCK TABLE users IN SHARE ROW EXCLUSIVE MODE")
            .execute(&mut *tx)
            .await?;

        let taken: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE username = $1)")
                .bind(&new_user.username)
                .fetch_one(&mut *tx)
                .await?;
        if taken {
            return Err(TaskHubError::UserAlreadyExists);
        }

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&mut *tx)
            .await?;
        let role = if count == 0 { Role::Admin } else { Role::User };

        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, password, role)
            VALUES ($1, $2, $3)
            RETURNING id, username, password, role
            "#,
        )
        .bind(&new_user.username)
        .bind(&new_user.password_hash)
        .bind(role)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                TaskHubError::UserAlreadyExists
            } else {
                TaskHubError::from(e)
            }
        })?;

        tx.commit().await?;
        Ok(user)
    }

    async fn update_role(&self, id: UserId, role: Role) -> TaskHubResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users SET role = $2
            WHERE id = $1
            RETURNING id, username, password, role
            "#,
        )
        .bind(id)
        .bind(role)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn delete(&self, id: UserId) -> TaskHubResult<bool> {
        // user_auth와 할당된 tasks는 CASCADE, 생성자 참조는 SET NULL
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn existing_ids(&self, ids: &[UserId]) -> TaskHubResult<Vec<UserId>> {
        let found: Vec<UserId> = sqlx::query_scalar("SELECT id FROM users WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;

        Ok(found)
    }
}

//! 인증 기록 저장소 (PostgreSQL).

use async_trait::async_trait;
use sqlx::PgPool;
use taskhub_core::{RefreshGeneration, TaskHubResult, UserAuth, UserId};
use uuid::Uuid;

use super::UserAuthRepository;

const COLUMNS: &str =
    "id, user_id, hashed_refresh_token, refresh_token_jti, last_login_at, token_expires_at";

/// `user_auth` 테이블 저장소.
#[derive(Clone)]
pub struct PgUserAuthRepository {
    pool: PgPool,
}

impl PgUserAuthRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserAuthRepository for PgUserAuthRepository {
    async fn find_by_user_id(&self, user_id: UserId) -> TaskHubResult<Option<UserAuth>> {
        let record = sqlx::query_as::<_, UserAuth>(&format!(
            "SELECT {COLUMNS} FROM user_auth WHERE user_id = $1"
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    async fn upsert(&self, generation: RefreshGeneration) -> TaskHubResult<UserAuth> {
        // 마지막 쓰기가 승리: 이전 세대는 이 시점에 무효화됨
        let record = sqlx::query_as::<_, UserAuth>(&format!(
            r#"
            INSERT INTO user_auth
                (id, user_id, hashed_refresh_token, refresh_token_jti, last_login_at, token_expires_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (user_id) DO UPDATE SET
                hashed_refresh_token = EXCLUDED.hashed_refresh_token,
                refresh_token_jti = EXCLUDED.refresh_token_jti,
                last_login_at = EXCLUDED.last_login_at,
                token_expires_at = EXCLUDED.token_expires_at
            RETURNING {COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(generation.user_id)
        .bind(&generation.hashed_refresh_token)
        .bind(&generation.refresh_token_jti)
        .bind(generation.issued_at)
        .bind(generation.expires_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(record)
    }
}

//! 모든 핸들러에서 공유되는 애플리케이션 상태.
//!
//! 시작 시 한 번 조립되며, `Arc`로 래핑되어 요청 간에 공유됩니다.
//! 비밀 키/TTL/해싱 비용은 이 시점에 확정되고 이후 변경되지 않습니다.

use std::sync::Arc;

use anyhow::Context;
use taskhub_core::AppConfig;

use crate::auth::{AuthService, PasswordHasher, RefreshTokenLedger, TokenIssuer};
use crate::repository::Repositories;
use crate::services::{ExternalTaskClient, TasksService, UsersService};

/// 애플리케이션 공유 상태.
#[derive(Clone)]
pub struct AppState {
    /// 로그인/토큰 갱신
    pub auth: AuthService,

    /// 사용자 등록/역할 변경/삭제
    pub users: UsersService,

    /// 태스크 CRUD 및 외부 동기화
    pub tasks: TasksService,

    /// Refresh Token 쿠키의 Secure 속성
    pub cookie_secure: bool,

    /// 데이터베이스 연결 풀 (메모리 저장소 사용 시 None)
    pub db_pool: Option<sqlx::PgPool>,

    /// 서버 시작 시간 (업타임 계산용)
    pub started_at: chrono::DateTime<chrono::Utc>,

    /// API 버전
    pub version: String,
}

impl AppState {
    /// 구성 요소를 직접 지정하여 상태를 조립합니다.
    ///
    /// # Arguments
    ///
    /// * `repos` - 저장소 묶음
    /// * `hasher` - 비밀번호/토큰 해셔
    /// * `issuer` - 토큰 발급기
    /// * `external` - 외부 태스크 소스
    pub fn new(
        repos: Repositories,
        hasher: PasswordHasher,
        issuer: TokenIssuer,
        external: Arc<dyn ExternalTaskClient>,
    ) -> Self {
        let ledger = RefreshTokenLedger::new(repos.user_auth.clone(), hasher.clone());
        let auth = AuthService::new(repos.users.clone(), hasher.clone(), issuer, ledger);
        let users = UsersService::new(repos.users.clone(), hasher);
        let tasks = TasksService::new(repos.tasks, repos.users, external);

        Self {
            auth,
            users,
            tasks,
            cookie_secure: false,
            db_pool: None,
            started_at: chrono::Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// 설정에서 상태를 조립합니다.
    ///
    /// 비밀 키나 TTL이 없거나 잘못되었으면 에러를 반환합니다.
    pub fn from_config(
        config: &AppConfig,
        repos: Repositories,
        external: Arc<dyn ExternalTaskClient>,
    ) -> anyhow::Result<Self> {
        let hasher =
            PasswordHasher::from_config(&config.auth).context("비밀번호 해싱 설정 오류")?;
        let issuer = TokenIssuer::new(&config.auth).context("토큰 발급기 설정 오류")?;

        let mut state = Self::new(repos, hasher, issuer, external);
        state.tasks = state
            .tasks
            .with_page_sizes(config.tasks.default_page_size, config.tasks.max_page_size);
        state.cookie_secure = config.refresh_cookie_secure();
        Ok(state)
    }

    /// 데이터베이스 연결 설정.
    pub fn with_db_pool(mut self, pool: sqlx::PgPool) -> Self {
        self.db_pool = Some(pool);
        self
    }

    /// 서버 업타임(초) 반환.
    pub fn uptime_secs(&self) -> i64 {
        chrono::Utc::now()
            .signed_duration_since(self.started_at)
            .num_seconds()
    }

    /// 데이터베이스 연결 상태 확인. 메모리 저장소면 None.
    pub async fn is_db_healthy(&self) -> Option<bool> {
        match &self.db_pool {
            Some(pool) => Some(sqlx::query("SELECT 1").fetch_one(pool).await.is_ok()),
            None => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::ExternalTask;
    use async_trait::async_trait;
    use secrecy::SecretString;
    use taskhub_core::{Environment, TaskHubResult};

    struct EmptySource;

    #[async_trait]
    impl ExternalTaskClient for EmptySource {
        async fn fetch_all(&self) -> TaskHubResult<Vec<ExternalTask>> {
            Ok(Vec::new())
        }
    }

    fn config() -> AppConfig {
        let mut config = AppConfig::default();
        config.auth.access_secret = Some(SecretString::new("access".into()));
        config.auth.refresh_secret = Some(SecretString::new("refresh".into()));
        config.auth.hash_memory_kib = 1024;
        config.auth.hash_iterations = 1;
        config
    }

    #[test]
    fn test_from_config_requires_secrets() {
        let mut config = config();
        config.auth.refresh_secret = None;

        let result = AppState::from_config(&config, Repositories::in_memory(), Arc::new(EmptySource));
        assert!(result.is_err());
    }

    #[test]
    fn test_cookie_secure_follows_environment() {
        let mut config = config();
        let state =
            AppState::from_config(&config, Repositories::in_memory(), Arc::new(EmptySource))
                .unwrap();
        assert!(!state.cookie_secure);
        assert!(state.db_pool.is_none());

        config.environment = Environment::Production;
        let state =
            AppState::from_config(&config, Repositories::in_memory(), Arc::new(EmptySource))
                .unwrap();
        assert!(state.cookie_secure);
    }
}

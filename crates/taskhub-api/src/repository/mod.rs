//! 저장소 계층.
//!
//! 서비스는 트레이트 객체로만 저장소에 접근합니다.
//! PostgreSQL 구현과 메모리 구현이 같은 트레이트를 구현하며,
//! `database.url`이 없으면 메모리 구현으로 동작합니다.

mod memory;
mod tasks;
mod user_auth;
mod users;

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::PgPool;
use taskhub_core::{
    NewTask, NewUser, PageRequest, RefreshGeneration, Role, Task, TaskHubResult, User, UserAuth,
    UserId,
};
use uuid::Uuid;

pub use memory::InMemoryStore;
pub use tasks::PgTaskRepository;
pub use user_auth::PgUserAuthRepository;
pub use users::PgUserRepository;

/// 사용자 저장소.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: UserId) -> TaskHubResult<Option<User>>;

    async fn find_by_username(&self, username: &str) -> TaskHubResult<Option<User>>;

    /// 사용자를 생성합니다.
    ///
    /// 저장된 사용자가 하나도 없으면 `admin`, 아니면 `user` 역할을 부여합니다.
    /// 개수 확인과 삽입은 하나의 직렬화된 구간에서 수행되어
    /// 동시 가입 시에도 관리자는 한 명만 생깁니다.
    /// 이름이 중복되면 `UserAlreadyExists`를 반환합니다.
    async fn insert_with_bootstrap_role(&self, new_user: NewUser) -> TaskHubResult<User>;

    async fn update_role(&self, id: UserId, role: Role) -> TaskHubResult<Option<User>>;

    /// 사용자를 삭제합니다. 인증 기록과 할당된 태스크도 함께 삭제됩니다.
    async fn delete(&self, id: UserId) -> TaskHubResult<bool>;

    /// 주어진 ID 중 실제로 존재하는 것만 반환합니다.
    async fn existing_ids(&self, ids: &[UserId]) -> TaskHubResult<Vec<UserId>>;
}

/// 인증 기록(Refresh Token 세대) 저장소.
#[async_trait]
pub trait UserAuthRepository: Send + Sync {
    async fn find_by_user_id(&self, user_id: UserId) -> TaskHubResult<Option<UserAuth>>;

    /// 사용자당 한 행만 유지합니다 (`user_id` 기준 upsert).
    async fn upsert(&self, generation: RefreshGeneration) -> TaskHubResult<UserAuth>;
}

/// 태스크 저장소.
#[async_trait]
pub trait TaskRepository: Send + Sync {
    async fn insert(&self, new_task: NewTask) -> TaskHubResult<Task>;

    /// 담당자 범위 내에서 태스크를 조회합니다.
    async fn find_for_user(&self, id: Uuid, user_id: UserId) -> TaskHubResult<Option<Task>>;

    /// 담당자의 태스크를 최신순으로 조회하고 전체 개수를 함께 반환합니다.
    async fn list_for_user(
        &self,
        user_id: UserId,
        page: PageRequest,
    ) -> TaskHubResult<(Vec<Task>, u64)>;

    /// 제목/완료 여부/수정 시각을 저장합니다.
    async fn save(&self, task: &Task) -> TaskHubResult<Task>;

    async fn delete(&self, id: Uuid) -> TaskHubResult<bool>;

    async fn exists_with_title(&self, title: &str, user_id: UserId) -> TaskHubResult<bool>;
}

/// 서비스에 주입되는 저장소 묶음.
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub user_auth: Arc<dyn UserAuthRepository>,
    pub tasks: Arc<dyn TaskRepository>,
}

impl Repositories {
    /// PostgreSQL 저장소.
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            users: Arc::new(PgUserRepository::new(pool.clone())),
            user_auth: Arc::new(PgUserAuthRepository::new(pool.clone())),
            tasks: Arc::new(PgTaskRepository::new(pool)),
        }
    }

    /// 프로세스 메모리 저장소.
    pub fn in_memory() -> Self {
        let store = InMemoryStore::default();
        Self {
            users: Arc::new(store.clone()),
            user_auth: Arc::new(store.clone()),
            tasks: Arc::new(store),
        }
    }
}

/// PostgreSQL 고유 제약 위반 여부.
fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.code().as_deref() == Some("23505"))
}

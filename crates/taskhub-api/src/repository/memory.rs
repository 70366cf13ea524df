//! 프로세스 메모리 저장소.
//!
//! 단일 `RwLock` 아래에 모든 테이블을 두어, 쓰기 잠금 구간이
//! PostgreSQL의 트랜잭션/테이블 잠금과 같은 직렬화 경계 역할을 합니다.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use taskhub_core::{
    NewTask, NewUser, PageRequest, RefreshGeneration, Role, Task, TaskHubError, TaskHubResult,
    User, UserAuth, UserId,
};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{TaskRepository, UserAuthRepository, UserRepository};

#[derive(Default)]
struct Tables {
    users: BTreeMap<UserId, User>,
    last_user_id: UserId,
    user_auth: HashMap<UserId, UserAuth>,
    tasks: HashMap<Uuid, Task>,
}

/// 메모리 기반 저장소. 복제본은 같은 데이터를 공유합니다.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<RwLock<Tables>>,
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn find_by_id(&self, id: UserId) -> TaskHubResult<Option<User>> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> TaskHubResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn insert_with_bootstrap_role(&self, new_user: NewUser) -> TaskHubResult<User> {
        let mut tables = self.tables.write().await;

        if tables.users.values().any(|u| u.username == new_user.username) {
            return Err(TaskHubError::UserAlreadyExists);
        }

        let role = if tables.users.is_empty() {
            Role::Admin
        } else {
            Role::User
        };
        tables.last_user_id += 1;
        let user = User {
            id: tables.last_user_id,
            username: new_user.username,
            password_hash: new_user.password_hash,
            role,
        };
        tables.users.insert(user.id, user.clone());

        Ok(user)
    }

    async fn update_role(&self, id: UserId, role: Role) -> TaskHubResult<Option<User>> {
        let mut tables = self.tables.write().await;
        Ok(tables.users.get_mut(&id).map(|user| {
            user.role = role;
            user.clone()
        }))
    }

    async fn delete(&self, id: UserId) -> TaskHubResult<bool> {
        let mut tables = self.tables.write().await;
        if tables.users.remove(&id).is_none() {
            return Ok(false);
        }
        tables.user_auth.remove(&id);
        tables.tasks.retain(|_, t| t.assigned_user_id != id);
        for task in tables.tasks.values_mut() {
            if task.created_by_user_id == Some(id) {
                task.created_by_user_id = None;
            }
        }
        Ok(true)
    }

    async fn existing_ids(&self, ids: &[UserId]) -> TaskHubResult<Vec<UserId>> {
        let tables = self.tables.read().await;
        Ok(ids
            .iter()
            .copied()
            .filter(|id| tables.users.contains_key(id))
            .collect())
    }
}

#[async_trait]
impl UserAuthRepository for InMemoryStore {
    async fn find_by_user_id(&self, user_id: UserId) -> TaskHubResult<Option<UserAuth>> {
        Ok(self.tables.read().await.user_auth.get(&user_id).cloned())
    }

    async fn upsert(&self, generation: RefreshGeneration) -> TaskHubResult<UserAuth> {
        let mut tables = self.tables.write().await;
        if !tables.users.contains_key(&generation.user_id) {
            // FK 위반에 해당
            return Err(TaskHubError::Database(format!(
                "user {} does not exist",
                generation.user_id
            )));
        }

        let record = tables
            .user_auth
            .entry(generation.user_id)
            .or_insert_with(|| UserAuth {
                id: Uuid::new_v4(),
                user_id: generation.user_id,
                hashed_refresh_token: None,
                refresh_token_jti: None,
                last_login_at: None,
                token_expires_at: None,
            });
        record.hashed_refresh_token = Some(generation.hashed_refresh_token);
        record.refresh_token_jti = Some(generation.refresh_token_jti);
        record.last_login_at = Some(generation.issued_at);
        record.token_expires_at = Some(generation.expires_at);

        Ok(record.clone())
    }
}

#[async_trait]
impl TaskRepository for InMemoryStore {
    async fn insert(&self, new_task: NewTask) -> TaskHubResult<Task> {
        let mut tables = self.tables.write().await;
        for owner in [new_task.assigned_user_id, new_task.created_by_user_id] {
            if !tables.users.contains_key(&owner) {
                return Err(TaskHubError::Database(format!(
                    "user {owner} does not exist"
                )));
            }
        }

        let now = Utc::now();
        let task = Task {
            id: Uuid::new_v4(),
            title: new_task.title,
            description: new_task.description,
            completed: new_task.completed,
            assigned_user_id: new_task.assigned_user_id,
            created_by_user_id: Some(new_task.created_by_user_id),
            created_at: now,
            updated_at: now,
        };
        tables.tasks.insert(task.id, task.clone());

        Ok(task)
    }

    async fn find_for_user(&self, id: Uuid, user_id: UserId) -> TaskHubResult<Option<Task>> {
        let tables = self.tables.read().await;
        Ok(tables
            .tasks
            .get(&id)
            .filter(|t| t.assigned_user_id == user_id)
            .cloned())
    }

    async fn list_for_user(
        &self,
        user_id: UserId,
        page: PageRequest,
    ) -> TaskHubResult<(Vec<Task>, u64)> {
        let tables = self.tables.read().await;
        let mut owned: Vec<&Task> = tables
            .tasks
            .values()
            .filter(|t| t.assigned_user_id == user_id)
            .collect();
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));

        let total = owned.len() as u64;
        let data = owned
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit() as usize)
            .cloned()
            .collect();

        Ok((data, total))
    }

    async fn save(&self, task: &Task) -> TaskHubResult<Task> {
        let mut tables = self.tables.write().await;
        let stored = tables
            .tasks
            .get_mut(&task.id)
            .ok_or(TaskHubError::TaskNotFound)?;
        stored.title = task.title.clone();
        stored.completed = task.completed;
        stored.updated_at = task.updated_at;
        Ok(stored.clone())
    }

    async fn delete(&self, id: Uuid) -> TaskHubResult<bool> {
        Ok(self.tables.write().await.tasks.remove(&id).is_some())
    }

    async fn exists_with_title(&self, title: &str, user_id: UserId) -> TaskHubResult<bool> {
        let tables = self.tables.read().await;
        Ok(tables
            .tasks
            .values()
            .any(|t| t.title == title && t.assigned_user_id == user_id))
    }
}

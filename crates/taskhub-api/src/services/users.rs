//! 사용자 관리 서비스.

use std::sync::Arc;

use taskhub_core::{NewUser, Role, TaskHubError, TaskHubResult, UserId, UserProfile};
use tracing::info;

use crate::auth::{ensure_admin, ensure_owner_or_admin, Caller, GuardedAction, PasswordHasher};
use crate::repository::UserRepository;

/// 사용자 서비스.
#[derive(Clone)]
pub struct UsersService {
    users: Arc<dyn UserRepository>,
    hasher: PasswordHasher,
}

impl UsersService {
    pub fn new(users: Arc<dyn UserRepository>, hasher: PasswordHasher) -> Self {
        Self { users, hasher }
    }

    /// 새 사용자를 등록합니다.
    ///
    /// 첫 번째 사용자는 `admin`, 이후 사용자는 `user` 역할을 받습니다.
    pub async fn register(&self, username: &str, password: &str) -> TaskHubResult<UserProfile> {
        // 해싱 비용을 쓰기 전에 중복을 먼저 거른다. 최종 판정은 저장소가 한다.
        if self.users.find_by_username(username).await?.is_some() {
            return Err(TaskHubError::UserAlreadyExists);
        }

        let password_hash = self
            .hasher
            .hash_async(password.to_string())
            .await
            .map_err(|e| TaskHubError::Internal(e.to_string()))?;

        let user = self
            .users
            .insert_with_bootstrap_role(NewUser {
                username: username.to_string(),
                password_hash,
            })
            .await?;

        info!(user_id = user.id, role = %user.role, "User registered");
        Ok(UserProfile::from(&user))
    }

    /// 사용자 역할을 변경합니다 (관리자 전용).
    pub async fn update_role(
        &self,
        caller: Caller,
        user_id: UserId,
        role: Role,
    ) -> TaskHubResult<UserProfile> {
        ensure_admin(caller, GuardedAction::UserRoleUpdate)?;

        let user = self
            .users
            .update_role(user_id, role)
            .await?
            .ok_or(TaskHubError::UserNotFound)?;

        info!(
            actor_id = caller.id,
            user_id = user.id,
            role = %user.role,
            "User role updated"
        );
        Ok(UserProfile::from(&user))
    }

    /// 사용자를 삭제합니다 (본인 또는 관리자).
    pub async fn delete(&self, caller: Caller, user_id: UserId) -> TaskHubResult<()> {
        ensure_owner_or_admin(caller, user_id, GuardedAction::UserDelete)?;

        if !self.users.delete(user_id).await? {
            return Err(TaskHubError::UserNotFound);
        }

        info!(actor_id = caller.id, user_id, "User deleted");
        Ok(())
    }
}

//! 역할 기반 접근 제어 (RBAC).
//!
//! 역할은 닫힌 집합 `{user, admin}`이며, 각 작업에 필요한 권한은
//! [`Permission`]으로 표현합니다.

use serde::{Deserialize, Serialize};

/// 사용자 역할.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "sqlx-support", derive(sqlx::Type))]
#[cfg_attr(
    feature = "sqlx-support",
    sqlx(type_name = "user_role", rename_all = "lowercase")
)]
pub enum Role {
    /// 일반 사용자 - 본인 리소스만 접근
    #[default]
    User,
    /// 관리자 - 모든 권한 보유
    Admin,
}

impl Role {
    /// 역할이 특정 권한을 가지는지 확인.
    ///
    /// 일반 사용자는 소유권이 확인된 리소스에 대한 권한만 가지므로,
    /// 여기서 `true`를 반환하는 `User` 권한은 "본인 리소스" 한정입니다.
    pub fn has_permission(&self, permission: Permission) -> bool {
        match self {
            Role::Admin => true,
            Role::User => matches!(
                permission,
                Permission::ManageOwnTasks | Permission::DeleteOwnAccount
            ),
        }
    }

    /// 관리자 여부.
    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 시스템 권한.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    /// 본인에게 할당된 태스크 관리
    ManageOwnTasks,
    /// 본인 계정 삭제
    DeleteOwnAccount,
    /// 다른 사용자의 태스크 관리
    ManageAnyTask,
    /// 다른 사용자 계정 삭제
    DeleteAnyUser,
    /// 사용자 역할 변경
    ManageRoles,
    /// 외부 소스에서 태스크 동기화
    SyncExternalTasks,
}

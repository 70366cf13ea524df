//! 역할 + 소유권 기반 권한 판정.
//!
//! 판정은 순수 함수이며 저장소에 접근하지 않습니다.
//! 거부 시 반환하는 에러는 작업 종류에 따라 다릅니다.

use taskhub_core::{Permission, Role, TaskHubError, TaskHubResult, UserId};

use super::jwt::AccessClaims;

/// 요청 주체.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    pub id: UserId,
    pub role: Role,
}

impl From<&AccessClaims> for Caller {
    fn from(claims: &AccessClaims) -> Self {
        Self {
            id: claims.sub,
            role: claims.role,
        }
    }
}

/// 권한 검사가 필요한 작업.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardedAction {
    /// 태스크 생성/수정/삭제
    TaskAccess,
    /// 사용자 역할 변경
    UserRoleUpdate,
    /// 사용자 삭제
    UserDelete,
    /// 외부 태스크 동기화
    ExternalSync,
}

impl GuardedAction {
    /// 타인 리소스에 대해 필요한 권한.
    fn cross_user_permission(self) -> Permission {
        match self {
            GuardedAction::TaskAccess => Permission::ManageAnyTask,
            GuardedAction::UserRoleUpdate => Permission::ManageRoles,
            GuardedAction::UserDelete => Permission::DeleteAnyUser,
            GuardedAction::ExternalSync => Permission::SyncExternalTasks,
        }
    }

    fn denial(self) -> TaskHubError {
        match self {
            GuardedAction::TaskAccess => TaskHubError::ForbiddenTaskAccess,
            GuardedAction::UserRoleUpdate => TaskHubError::ForbiddenUserRoleUpdate,
            GuardedAction::UserDelete => TaskHubError::ForbiddenUserRoleDelete,
            GuardedAction::ExternalSync => TaskHubError::ForbiddenTaskAccess,
        }
    }
}

/// 본인 리소스이거나 관리자 권한이 있으면 허용합니다.
///
/// # Arguments
///
/// * `caller` - 인증된 요청 주체
/// * `target` - 리소스 소유자 ID
/// * `action` - 수행할 작업 (거부 에러 종류 결정)
pub fn ensure_owner_or_admin(
    caller: Caller,
    target: UserId,
    action: GuardedAction,
) -> TaskHubResult<()> {
    if caller.id == target || caller.role.has_permission(action.cross_user_permission()) {
        Ok(())
    } else {
        Err(action.denial())
    }
}

/// 관리자 권한을 요구합니다. 본인 예외는 없습니다.
pub fn ensure_admin(caller: Caller, action: GuardedAction) -> TaskHubResult<()> {
    if caller.role.has_permission(action.cross_user_permission()) {
        Ok(())
    } else {
        Err(action.denial())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADMIN: Caller = Caller {
        id: 1,
        role: Role::Admin,
    };
    const ALICE: Caller = Caller {
        id: 2,
        role: Role::User,
    };

    #[test]
    fn test_owner_is_allowed() {
        assert!(ensure_owner_or_admin(ALICE, 2, GuardedAction::TaskAccess).is_ok());
        assert!(ensure_owner_or_admin(ALICE, 2, GuardedAction::UserDelete).is_ok());
    }

    #[test]
    fn test_admin_is_allowed_for_others() {
        assert!(ensure_owner_or_admin(ADMIN, 2, GuardedAction::TaskAccess).is_ok());
        assert!(ensure_owner_or_admin(ADMIN, 2, GuardedAction::UserDelete).is_ok());
        assert!(ensure_admin(ADMIN, GuardedAction::UserRoleUpdate).is_ok());
    }

    #[test]
    fn test_denials_depend_on_action() {
        assert!(matches!(
            ensure_owner_or_admin(ALICE, 3, GuardedAction::TaskAccess),
            Err(TaskHubError::ForbiddenTaskAccess)
        ));
        assert!(matches!(
            ensure_owner_or_admin(ALICE, 3, GuardedAction::UserDelete),
            Err(TaskHubError::ForbiddenUserRoleDelete)
        ));
        assert!(matches!(
            ensure_admin(ALICE, GuardedAction::UserRoleUpdate),
            Err(TaskHubError::ForbiddenUserRoleUpdate)
        ));
    }

    #[test]
    fn test_role_update_has_no_self_exception() {
        assert!(ensure_admin(ALICE, GuardedAction::UserRoleUpdate).is_err());
        assert!(ensure_admin(ALICE, GuardedAction::ExternalSync).is_err());
    }
}

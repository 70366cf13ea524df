//! 태스크 API의 도메인 에러 타입.
//!
//! 서비스 계층은 이 타입만 반환하며, HTTP 상태 코드로의 변환은
//! API 크레이트의 단일 매퍼(`ApiError`)에서 이루어집니다.

use thiserror::Error;

/// 핵심 도메인 에러.
#[derive(Debug, Error)]
pub enum TaskHubError {
    /// 로그인/토큰 갱신 거부 (사유는 노출하지 않음)
    #[error("Access denied")]
    ForbiddenAuthAccess,

    /// 사용자 이름 중복
    #[error("User already exists")]
    UserAlreadyExists,

    /// 사용자를 찾을 수 없음
    #[error("User not found")]
    UserNotFound,

    /// 태스크를 찾을 수 없음
    #[error("Task not found")]
    TaskNotFound,

    /// 관리자가 아닌 사용자의 역할 변경 시도
    #[error("Only admins can update user roles")]
    ForbiddenUserRoleUpdate,

    /// 본인 또는 관리자가 아닌 사용자의 계정 삭제 시도
    #[error("Only own user or admin can delete user")]
    ForbiddenUserRoleDelete,

    /// 다른 사용자의 태스크 접근
    #[error("Forbidden resource access")]
    ForbiddenTaskAccess,

    /// 설정 에러
    #[error("설정 에러: {0}")]
    Config(String),

    /// 데이터베이스 에러
    #[error("데이터베이스 에러: {0}")]
    Database(String),

    /// 외부 서비스 호출 실패
    #[error("외부 서비스 에러: {0}")]
    ExternalService(String),

    /// 내부 에러
    #[error("내부 에러: {0}")]
    Internal(String),
}

/// 도메인 작업을 위한 Result 타입.
pub type TaskHubResult<T> = Result<T, TaskHubError>;

impl TaskHubError {
    /// 클라이언트에 상세 내용을 노출하면 안 되는 에러인지 확인합니다.
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            TaskHubError::Config(_)
                | TaskHubError::Database(_)
                | TaskHubError::ExternalService(_)
                | TaskHubError::Internal(_)
        )
    }
}

#[cfg(feature = "sqlx-support")]
impl From<sqlx::Error> for TaskHubError {
    fn from(err: sqlx::Error) -> Self {
        TaskHubError::Database(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_internal_classification() {
        assert!(TaskHubError::Database("pool timeout".to_string()).is_internal());
        assert!(TaskHubError::ExternalService("502".to_string()).is_internal());
        assert!(!TaskHubError::TaskNotFound.is_internal());
    }

    #[test]
    fn test_messages() {
        assert_eq!(TaskHubError::ForbiddenAuthAccess.to_string(), "Access denied");
        assert_eq!(
            TaskHubError::UserAlreadyExists.to_string(),
            "User already exists"
        );
        assert_eq!(
            TaskHubError::ForbiddenTaskAccess.to_string(),
            "Forbidden resource access"
        );
    }
}

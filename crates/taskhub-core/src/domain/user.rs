//! 사용자 및 인증 기록 모델.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Role;

/// 사용자 식별자.
pub type UserId = i64;

/// 저장된 사용자.
///
/// `password_hash`는 PHC 형식 해시이며 응답으로 직렬화하지 않습니다.
/// 외부에 노출할 때는 [`UserProfile`]을 사용합니다.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "sqlx-support", derive(sqlx::FromRow))]
pub struct User {
    pub id: UserId,
    pub username: String,
    #[cfg_attr(feature = "sqlx-support", sqlx(rename = "password"))]
    pub password_hash: String,
    pub role: Role,
}

/// 새 사용자 입력 (비밀번호는 이미 해싱된 상태).
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
}

/// 외부 노출용 사용자 정보.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    pub username: String,
    pub role: Role,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            role: user.role,
        }
    }
}

/// 사용자별 인증 기록 (1:1).
///
/// 현재 유효한 Refresh Token 세대 하나만 보관합니다.
/// 로그인/갱신 성공 시마다 덮어쓰며, 이전 세대는 즉시 무효가 됩니다.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "sqlx-support", derive(sqlx::FromRow))]
pub struct UserAuth {
    pub id: Uuid,
    pub user_id: UserId,
    /// Refresh Token 원문의 해시
    pub hashed_refresh_token: Option<String>,
    /// 현재 세대의 jti
    pub refresh_token_jti: Option<String>,
    pub last_login_at: Option<DateTime<Utc>>,
    pub token_expires_at: Option<DateTime<Utc>>,
}

/// 인증 기록 upsert 입력.
#[derive(Debug, Clone)]
pub struct RefreshGeneration {
    pub user_id: UserId,
    pub hashed_refresh_token: String,
    pub refresh_token_jti: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

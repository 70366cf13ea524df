//! Refresh Token 원장.
//!
//! 사용자당 현재 세대 하나만 유지합니다. 발급 시마다 덮어쓰고(회전),
//! 제시된 토큰이 현재 세대가 아니면 거부합니다(재사용 탐지).
//!
//! 검증 순서:
//! 1. 인증 기록에 해시와 jti가 모두 있어야 함
//! 2. 제시된 토큰의 jti(서명 미검증 디코드)가 저장된 jti와 같아야 함
//! 3. 제시된 토큰 원문이 저장된 해시와 일치해야 함

use std::sync::Arc;

use taskhub_core::{RefreshGeneration, TaskHubError, TaskHubResult, UserId};
use tracing::debug;

use super::jwt::{IssuedRefreshToken, TokenIssuer};
use super::password::PasswordHasher;
use crate::repository::UserAuthRepository;

/// 원장 검증 실패 사유.
///
/// 외부로는 사유를 구분하지 않고 모두 접근 거부로 응답합니다.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("저장된 Refresh Token 세대가 없습니다")]
    NoEntry,
    #[error("jti 불일치 (이미 교체된 토큰)")]
    JtiMismatch,
    #[error("토큰 해시 불일치")]
    HashMismatch,
    #[error(transparent)]
    Storage(#[from] TaskHubError),
}

impl LedgerError {
    /// 메트릭 라벨.
    pub fn outcome(&self) -> &'static str {
        match self {
            LedgerError::NoEntry => "no_entry",
            LedgerError::JtiMismatch => "reuse_rejected",
            LedgerError::HashMismatch => "hash_mismatch",
            LedgerError::Storage(_) => "storage_error",
        }
    }
}

/// Refresh Token 원장.
#[derive(Clone)]
pub struct RefreshTokenLedger {
    records: Arc<dyn UserAuthRepository>,
    hasher: PasswordHasher,
}

impl RefreshTokenLedger {
    pub fn new(records: Arc<dyn UserAuthRepository>, hasher: PasswordHasher) -> Self {
        Self { records, hasher }
    }

    /// 새 세대를 저장합니다. 이전 세대는 즉시 무효가 됩니다.
    pub async fn store(&self, user_id: UserId, issued: &IssuedRefreshToken) -> TaskHubResult<()> {
        let hashed = self
            .hasher
            .hash_async(issued.token.clone())
            .await
            .map_err(|e| TaskHubError::Internal(e.to_string()))?;

        self.records
            .upsert(RefreshGeneration {
                user_id,
                hashed_refresh_token: hashed,
                refresh_token_jti: issued.jti.clone(),
                issued_at: issued.issued_at,
                expires_at: issued.expires_at,
            })
            .await?;

        debug!(user_id, "Refresh token generation stored");
        Ok(())
    }

    /// 제시된 토큰이 현재 세대인지 확인합니다.
    pub async fn validate(&self, user_id: UserId, presented: &str) -> Result<(), LedgerError> {
        let record = self.records.find_by_user_id(user_id).await?;

        let (stored_hash, stored_jti) = match record {
            Some(auth) => match (auth.hashed_refresh_token, auth.refresh_token_jti) {
                (Some(hash), Some(jti)) => (hash, jti),
                _ => return Err(LedgerError::NoEntry),
            },
            None => return Err(LedgerError::NoEntry),
        };

        if TokenIssuer::peek_jti(presented).as_deref() != Some(stored_jti.as_str()) {
            return Err(LedgerError::JtiMismatch);
        }

        if !self
            .hasher
            .verify_async(presented.to_string(), stored_hash)
            .await
        {
            return Err(LedgerError::HashMismatch);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::{InMemoryStore, UserRepository};
    use chrono::Duration;
    use secrecy::SecretString;
    use taskhub_core::NewUser;

    async fn setup() -> (RefreshTokenLedger, TokenIssuer, UserId, InMemoryStore) {
        let store = InMemoryStore::default();
        let user = store
            .insert_with_bootstrap_role(NewUser {
                username: "alice".to_string(),
                password_hash: "x".to_string(),
            })
            .await
            .unwrap();
        let ledger = RefreshTokenLedger::new(
            Arc::new(store.clone()),
            PasswordHasher::new(1024, 1, 1).unwrap(),
        );
        let issuer = TokenIssuer::from_parts(
            &SecretString::new("a".into()),
            &SecretString::new("r".into()),
            Duration::minutes(15),
            Duration::days(7),
        );
        (ledger, issuer, user.id, store)
    }

    #[tokio::test]
    async fn test_no_entry() {
        let (ledger, issuer, user_id, _) = setup().await;
        let token = issuer.issue_refresh(user_id).unwrap().token;
        assert!(matches!(
            ledger.validate(user_id, &token).await,
            Err(LedgerError::NoEntry)
        ));
    }

    #[tokio::test]
    async fn test_current_generation_validates() {
        let (ledger, issuer, user_id, store) = setup().await;
        let issued = issuer.issue_refresh(user_id).unwrap();
        ledger.store(user_id, &issued).await.unwrap();

        ledger.validate(user_id, &issued.token).await.unwrap();

        // 원문이 아닌 해시만 저장됨
        let record = store.find_by_user_id(user_id).await.unwrap().unwrap();
        assert_ne!(record.hashed_refresh_token.as_deref(), Some(issued.token.as_str()));
        assert_eq!(record.refresh_token_jti.as_deref(), Some(issued.jti.as_str()));
    }

    #[tokio::test]
    async fn test_superseded_generation_is_rejected() {
        let (ledger, issuer, user_id, _) = setup().await;
        let old = issuer.issue_refresh(user_id).unwrap();
        ledger.store(user_id, &old).await.unwrap();
        let new = issuer.issue_refresh(user_id).unwrap();
        ledger.store(user_id, &new).await.unwrap();

        assert!(matches!(
            ledger.validate(user_id, &old.token).await,
            Err(LedgerError::JtiMismatch)
        ));
        ledger.validate(user_id, &new.token).await.unwrap();
    }

    #[tokio::test]
    async fn test_forged_token_with_current_jti_is_rejected() {
        let (ledger, issuer, user_id, _) = setup().await;
        let issued = issuer.issue_refresh(user_id).unwrap();
        ledger.store(user_id, &issued).await.unwrap();

        // 같은 jti를 다른 키로 서명한 위조 토큰
        let forged = jsonwebtoken::encode(
            &jsonwebtoken::Header::default(),
            &super::super::jwt::RefreshClaims {
                sub: user_id,
                jti: issued.jti.clone(),
                iat: 0,
                exp: i64::MAX / 2,
            },
            &jsonwebtoken::EncodingKey::from_secret(b"attacker"),
        )
        .unwrap();

        assert!(matches!(
            ledger.validate(user_id, &forged).await,
            Err(LedgerError::HashMismatch)
        ));
    }
}

//! 로그인 및 토큰 갱신 오케스트레이션.

use std::sync::Arc;

use taskhub_core::{TaskHubError, TaskHubResult, User, UserId};
use tracing::{info, warn};

use super::jwt::{JwtError, TokenIssuer, TokenPair};
use super::ledger::{LedgerError, RefreshTokenLedger};
use super::password::PasswordHasher;
use crate::metrics::{record_login, record_refresh};
use crate::repository::UserRepository;

/// 인증 성공 결과.
#[derive(Debug, Clone)]
pub struct AuthOutcome {
    pub user_id: UserId,
    pub tokens: TokenPair,
}

/// 인증 서비스.
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserRepository>,
    hasher: PasswordHasher,
    issuer: TokenIssuer,
    ledger: RefreshTokenLedger,
    dummy_digest: String,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        hasher: PasswordHasher,
        issuer: TokenIssuer,
        ledger: RefreshTokenLedger,
    ) -> Self {
        let dummy_digest = hasher.dummy_digest();
        Self {
            users,
            hasher,
            issuer,
            ledger,
            dummy_digest,
        }
    }

    /// 토큰 발급기 (전송 계층 가드에서 사용).
    pub fn issuer(&self) -> &TokenIssuer {
        &self.issuer
    }

    /// 자격 증명을 확인하고 새 토큰 쌍을 발급합니다.
    ///
    /// 존재하지 않는 사용자와 틀린 비밀번호는 구분 없이 `ForbiddenAuthAccess`입니다.
    /// 존재하지 않는 사용자도 더미 다이제스트로 같은 비용의 검증을 거칩니다.
    pub async fn login(&self, username: &str, password: &str) -> TaskHubResult<AuthOutcome> {
        let Some(user) = self.users.find_by_username(username).await? else {
            self.hasher
                .verify_async(password.to_string(), self.dummy_digest.clone())
                .await;
            record_login("unknown_user");
            warn!("Login rejected: unknown user");
            return Err(TaskHubError::ForbiddenAuthAccess);
        };

        if !self
            .hasher
            .verify_async(password.to_string(), user.password_hash.clone())
            .await
        {
            record_login("bad_password");
            warn!(user_id = user.id, "Login rejected: bad credentials");
            return Err(TaskHubError::ForbiddenAuthAccess);
        }

        let outcome = self.issue_and_store(&user).await?;
        record_login("success");
        info!(user_id = user.id, "User logged in");
        Ok(outcome)
    }

    /// 현재 세대의 Refresh Token을 소비하고 새 토큰 쌍으로 교체합니다.
    ///
    /// `presented`는 전송 계층에서 서명과 만료가 이미 검증된 토큰입니다.
    /// 원장 검증 실패는 사유와 관계없이 `ForbiddenAuthAccess`로 응답합니다.
    pub async fn refresh_tokens(
        &self,
        user_id: UserId,
        presented: &str,
    ) -> TaskHubResult<AuthOutcome> {
        let Some(user) = self.users.find_by_id(user_id).await? else {
            record_refresh("unknown_user");
            warn!(user_id, "Refresh rejected: user no longer exists");
            return Err(TaskHubError::ForbiddenAuthAccess);
        };

        match self.ledger.validate(user_id, presented).await {
            Ok(()) => {}
            Err(LedgerError::Storage(e)) => {
                record_refresh("storage_error");
                return Err(e);
            }
            Err(e) => {
                record_refresh(e.outcome());
                warn!(user_id, reason = %e, "Refresh rejected");
                return Err(TaskHubError::ForbiddenAuthAccess);
            }
        }

        let outcome = self.issue_and_store(&user).await?;
        record_refresh("success");
        info!(user_id, "Refresh token rotated");
        Ok(outcome)
    }

    async fn issue_and_store(&self, user: &User) -> TaskHubResult<AuthOutcome> {
        let tokens = self.issuer.issue_pair(user).map_err(jwt_to_internal)?;
        self.ledger.store(user.id, &tokens.refresh).await?;

        Ok(AuthOutcome {
            user_id: user.id,
            tokens,
        })
    }
}

fn jwt_to_internal(err: JwtError) -> TaskHubError {
    TaskHubError::Internal(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::{InMemoryStore, UserAuthRepository};
    use chrono::Duration;
    use secrecy::SecretString;
    use taskhub_core::NewUser;

    async fn service_with_user() -> (AuthService, InMemoryStore, User) {
        let store = InMemoryStore::default();
        let hasher = PasswordHasher::new(1024, 1, 1).unwrap();
        let user = store
            .insert_with_bootstrap_role(NewUser {
                username: "alice".to_string(),
                password_hash: hasher.hash("s3cret!").unwrap(),
            })
            .await
            .unwrap();
        let issuer = TokenIssuer::from_parts(
            &SecretString::new("access".into()),
            &SecretString::new("refresh".into()),
            Duration::minutes(15),
            Duration::days(7),
        );
        let ledger = RefreshTokenLedger::new(Arc::new(store.clone()), hasher.clone());
        let service = AuthService::new(Arc::new(store.clone()), hasher, issuer, ledger);
        (service, store, user)
    }

    #[tokio::test]
    async fn test_login_success_stores_generation() {
        let (service, store, user) = service_with_user().await;
        let outcome = service.login("alice", "s3cret!").await.unwrap();

        assert_eq!(outcome.user_id, user.id);
        let claims = service
            .issuer()
            .verify_access(&outcome.tokens.access_token)
            .unwrap();
        assert_eq!(claims.sub, user.id);

        let record = store.find_by_user_id(user.id).await.unwrap().unwrap();
        assert_eq!(
            record.refresh_token_jti.as_deref(),
            Some(outcome.tokens.refresh.jti.as_str())
        );
        assert!(record.last_login_at.is_some());
    }

    #[tokio::test]
    async fn test_login_rejections_are_indistinguishable() {
        let (service, _, _) = service_with_user().await;

        let unknown = service.login("bob", "s3cret!").await.unwrap_err();
        let bad = service.login("alice", "wrong").await.unwrap_err();

        assert!(matches!(unknown, TaskHubError::ForbiddenAuthAccess));
        assert!(matches!(bad, TaskHubError::ForbiddenAuthAccess));
        assert_eq!(unknown.to_string(), bad.to_string());
    }

    #[tokio::test]
    async fn test_refresh_rotates_and_detects_reuse() {
        let (service, _, user) = service_with_user().await;
        let first = service.login("alice", "s3cret!").await.unwrap();

        let second = service
            .refresh_tokens(user.id, &first.tokens.refresh.token)
            .await
            .unwrap();
        assert_ne!(first.tokens.refresh.jti, second.tokens.refresh.jti);

        let replay = service
            .refresh_tokens(user.id, &first.tokens.refresh.token)
            .await
            .unwrap_err();
        assert!(matches!(replay, TaskHubError::ForbiddenAuthAccess));

        service
            .refresh_tokens(user.id, &second.tokens.refresh.token)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_new_login_invalidates_previous_refresh_token() {
        let (service, _, user) = service_with_user().await;
        let first = service.login("alice", "s3cret!").await.unwrap();
        let _second = service.login("alice", "s3cret!").await.unwrap();

        assert!(service
            .refresh_tokens(user.id, &first.tokens.refresh.token)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_refresh_without_prior_login() {
        let (service, _, user) = service_with_user().await;
        let token = service.issuer().issue_refresh(user.id).unwrap().token;
        assert!(matches!(
            service.refresh_tokens(user.id, &token).await,
            Err(TaskHubError::ForbiddenAuthAccess)
        ));
    }
}

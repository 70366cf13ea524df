//! 비밀번호 및 Refresh Token 해싱.
//!
//! Argon2id 기반의 적응형 단방향 해시. 솔트는 매번 OS 난수로 생성되고
//! 작업 비용(메모리, 반복, 병렬도)은 설정에서 주입됩니다.

use argon2::{
    password_hash::{
        rand_core::OsRng, PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString,
    },
    Algorithm, Argon2, Params, Version,
};
use taskhub_core::AuthConfig;

/// 더미 다이제스트의 고정 솔트 ("somesaltsomesalt").
const DUMMY_SALT_B64: &str = "c29tZXNhbHRzb21lc2FsdA";
/// 더미 다이제스트의 고정 출력 (32바이트 0).
const DUMMY_OUTPUT_B64: &str = "AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA";

/// 해싱 에러.
#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    #[error("잘못된 해시 파라미터: {0}")]
    InvalidParams(String),
    #[error("비밀번호 해싱 실패")]
    HashingFailed,
}

/// Argon2id 해셔.
///
/// 복제 비용이 작아 서비스마다 하나씩 보유해도 됩니다.
#[derive(Debug, Clone)]
pub struct PasswordHasher {
    params: Params,
}

impl PasswordHasher {
    /// 작업 비용을 지정하여 해셔를 생성합니다.
    ///
    /// # Arguments
    ///
    /// * `memory_kib` - 메모리 비용 (KiB)
    /// * `iterations` - 반복 횟수
    /// * `parallelism` - 병렬도 (lanes)
    pub fn new(memory_kib: u32, iterations: u32, parallelism: u32) -> Result<Self, PasswordError> {
        let params = Params::new(memory_kib, iterations, parallelism, None)
            .map_err(|e| PasswordError::InvalidParams(e.to_string()))?;
        Ok(Self { params })
    }

    /// 인증 설정의 작업 비용으로 해셔를 생성합니다.
    pub fn from_config(config: &AuthConfig) -> Result<Self, PasswordError> {
        Self::new(
            config.hash_memory_kib,
            config.hash_iterations,
            config.hash_parallelism,
        )
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    /// 평문을 해싱하여 PHC 문자열을 반환합니다.
    ///
    /// 입력이 이미 Argon2 PHC 문자열이면 그대로 반환합니다.
    /// 같은 엔티티가 두 번 저장되어도 이중 해싱되지 않습니다.
    pub fn hash(&self, plaintext: &str) -> Result<String, PasswordError> {
        if is_hashed(plaintext) {
            return Ok(plaintext.to_string());
        }

        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2()
            .hash_password(plaintext.as_bytes(), &salt)
            .map_err(|_| PasswordError::HashingFailed)?;

        Ok(hash.to_string())
    }

    /// 평문이 해시와 일치하는지 확인합니다.
    ///
    /// 비교는 해시 구현의 상수 시간 검증기를 사용하며,
    /// 해시 형식이 잘못된 경우에도 `false`를 반환합니다.
    pub fn verify(&self, plaintext: &str, digest: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(digest) else {
            return false;
        };
        self.argon2()
            .verify_password(plaintext.as_bytes(), &parsed)
            .is_ok()
    }

    /// 현재 작업 비용이 기록된 고정 PHC 문자열.
    ///
    /// 존재하지 않는 계정의 로그인 시도도 실제 검증과 같은 비용을 치르도록
    /// 이 값에 대해 검증합니다. 출력이 모두 0이라 어떤 입력과도 일치하지 않습니다.
    pub fn dummy_digest(&self) -> String {
        format!(
            "$argon2id$v=19$m={},t={},p={}${}${}",
            self.params.m_cost(),
            self.params.t_cost(),
            self.params.p_cost(),
            DUMMY_SALT_B64,
            DUMMY_OUTPUT_B64,
        )
    }

    /// 블로킹 스레드풀에서 해싱합니다.
    pub async fn hash_async(&self, plaintext: String) -> Result<String, PasswordError> {
        let hasher = self.clone();
        tokio::task::spawn_blocking(move || hasher.hash(&plaintext))
            .await
            .map_err(|_| PasswordError::HashingFailed)?
    }

    /// 블로킹 스레드풀에서 검증합니다. 작업이 취소되면 `false`.
    pub async fn verify_async(&self, plaintext: String, digest: String) -> bool {
        let hasher = self.clone();
        tokio::task::spawn_blocking(move || hasher.verify(&plaintext, &digest))
            .await
            .unwrap_or(false)
    }
}

/// Argon2 PHC 문자열인지 확인.
pub fn is_hashed(value: &str) -> bool {
    value.starts_with("$argon2") && PasswordHash::new(value).is_ok()
}

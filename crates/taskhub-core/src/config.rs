//! 설정 관리.
//!
//! 기본값 → 설정 파일(선택) → 환경 변수 순서로 덮어씁니다.
//! 환경 변수는 `TASKHUB` 접두사와 `__` 구분자를 사용합니다
//! (예: `TASKHUB__AUTH__ACCESS_SECRET`).
//!
//! 비밀 키와 TTL은 시작 시 한 번만 해석되며 이후 변경되지 않습니다.
//! 필수 값이 없으면 [`AuthConfig::validate`]가 에러를 반환하고 서버는 기동하지 않습니다.

use chrono::Duration;
use secrecy::SecretString;
use serde::{Deserialize, Deserializer};
use std::path::Path;

/// 설정 검증 에러.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("필수 비밀 키가 설정되지 않았습니다: {0}")]
    MissingSecret(&'static str),

    #[error("잘못된 TTL 형식 ({key}): '{value}'")]
    InvalidTtl { key: &'static str, value: String },

    #[error("설정 로드 실패: {0}")]
    Load(#[from] config::ConfigError),
}

/// 실행 환경.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Test,
    Production,
}

/// 애플리케이션 설정.
#[derive(Debug, Default, Deserialize)]
pub struct AppConfig {
    /// 실행 환경
    #[serde(default)]
    pub environment: Environment,
    /// 서버 설정
    #[serde(default)]
    pub server: ServerConfig,
    /// 데이터베이스 설정
    #[serde(default)]
    pub database: DatabaseConfig,
    /// 로깅 설정
    #[serde(default)]
    pub logging: LoggingConfig,
    /// 인증 설정
    #[serde(default)]
    pub auth: AuthConfig,
    /// CORS 설정
    #[serde(default)]
    pub cors: CorsConfig,
    /// 태스크 설정
    #[serde(default)]
    pub tasks: TasksConfig,
}

/// 서버 설정.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// 바인딩할 호스트
    pub host: String,
    /// 리스닝할 포트
    pub port: u16,
    /// 요청 타임아웃 (초)
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            request_timeout_secs: 30,
        }
    }
}

/// 데이터베이스 설정.
///
/// `url`이 없으면 메모리 저장소로 동작합니다.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// PostgreSQL 연결 URL
    pub url: Option<String>,
    /// 최대 연결 수
    pub max_connections: u32,
    /// 연결 타임아웃 (초)
    pub connection_timeout_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: 10,
            connection_timeout_secs: 10,
        }
    }
}

/// 로깅 설정.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// 로그 레벨
    pub level: String,
    /// 로그 형식 (pretty, json, compact)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "taskhub_api=info,tower_http=info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

/// 인증 설정.
///
/// Access/Refresh 토큰은 서로 다른 비밀 키로 서명합니다.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Access Token 서명 키
    #[serde(deserialize_with = "deserialize_secret")]
    pub access_secret: Option<SecretString>,
    /// Access Token 수명 (예: "15m")
    pub access_ttl: Option<String>,
    /// Refresh Token 서명 키
    #[serde(deserialize_with = "deserialize_secret")]
    pub refresh_secret: Option<SecretString>,
    /// Refresh Token 수명 (예: "7d")
    pub refresh_ttl: Option<String>,
    /// Argon2 메모리 비용 (KiB)
    pub hash_memory_kib: u32,
    /// Argon2 반복 횟수
    pub hash_iterations: u32,
    /// Argon2 병렬도
    pub hash_parallelism: u32,
    /// Refresh 쿠키의 Secure 플래그 강제 지정 (없으면 production에서만 설정)
    pub cookie_secure: Option<bool>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            access_secret: None,
            access_ttl: Some("15m".to_string()),
            refresh_secret: None,
            refresh_ttl: Some("7d".to_string()),
            hash_memory_kib: 19_456,
            hash_iterations: 2,
            hash_parallelism: 1,
            cookie_secure: None,
        }
    }
}

fn deserialize_secret<'de, D>(deserializer: D) -> Result<Option<SecretString>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw
        .filter(|s| !s.trim().is_empty())
        .map(|s| SecretString::new(s.into())))
}

impl AuthConfig {
    /// Access Token 서명 키.
    pub fn access_secret(&self) -> Result<&SecretString, ConfigError> {
        self.access_secret
            .as_ref()
            .ok_or(ConfigError::MissingSecret("auth.access_secret"))
    }

    /// Refresh Token 서명 키.
    pub fn refresh_secret(&self) -> Result<&SecretString, ConfigError> {
        self.refresh_secret
            .as_ref()
            .ok_or(ConfigError::MissingSecret("auth.refresh_secret"))
    }

    /// Access Token 수명.
    pub fn access_ttl(&self) -> Result<Duration, ConfigError> {
        required_ttl("auth.access_ttl", self.access_ttl.as_deref())
    }

    /// Refresh Token 수명.
    pub fn refresh_ttl(&self) -> Result<Duration, ConfigError> {
        required_ttl("auth.refresh_ttl", self.refresh_ttl.as_deref())
    }

    /// 서명 키와 TTL이 모두 유효한지 확인합니다.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.access_secret()?;
        self.refresh_secret()?;
        self.access_ttl()?;
        self.refresh_ttl()?;
        Ok(())
    }
}

fn required_ttl(key: &'static str, value: Option<&str>) -> Result<Duration, ConfigError> {
    let value = value.ok_or(ConfigError::InvalidTtl {
        key,
        value: String::new(),
    })?;
    parse_ttl(value).ok_or_else(|| ConfigError::InvalidTtl {
        key,
        value: value.to_string(),
    })
}

/// `"<n>[s|m|h|d]"` 형식의 수명 문자열을 해석합니다.
///
/// 단위가 없으면 초로 간주합니다. 0 이하의 값은 거부합니다.
///
/// ```
/// use taskhub_core::config::parse_ttl;
///
/// assert_eq!(parse_ttl("15m"), Some(chrono::Duration::minutes(15)));
/// assert_eq!(parse_ttl("7d"), Some(chrono::Duration::days(7)));
/// assert_eq!(parse_ttl("abc"), None);
/// ```
pub fn parse_ttl(value: &str) -> Option<Duration> {
    let value = value.trim();
    let split = value
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(value.len());
    let (digits, unit) = value.split_at(split);
    let amount: i64 = digits.parse().ok()?;
    if amount <= 0 {
        return None;
    }

    match unit {
        "" | "s" => Duration::try_seconds(amount),
        "m" => Duration::try_minutes(amount),
        "h" => Duration::try_hours(amount),
        "d" => Duration::try_days(amount),
        _ => None,
    }
}

/// CORS 설정.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CorsConfig {
    /// 허용 origin 목록 (비어 있으면 모든 origin 허용)
    pub origins: Vec<String>,
}

/// 태스크 설정.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TasksConfig {
    /// 외부 태스크 소스 기본 URL (`{url}/todos`)
    pub external_api_url: String,
    /// 기본 페이지 크기
    pub default_page_size: u32,
    /// 최대 페이지 크기
    pub max_page_size: u32,
}

impl Default for TasksConfig {
    fn default() -> Self {
        Self {
            external_api_url: "https://jsonplaceholder.typicode.com".to_string(),
            default_page_size: 10,
            max_page_size: 100,
        }
    }
}

impl AppConfig {
    /// 파일과 환경 변수에서 설정을 로드합니다.
    ///
    /// 파일이 없으면 기본값과 환경 변수만 사용합니다.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let builder = config::Config::builder()
            .add_source(config::File::from(path.as_ref()).required(false))
            .add_source(
                config::Environment::with_prefix("TASKHUB")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("cors.origins")
                    .try_parsing(true),
            );

        let config = builder.build()?;
        Ok(config.try_deserialize()?)
    }

    /// 기본 경로에서 설정을 로드합니다.
    pub fn load_default() -> Result<Self, ConfigError> {
        Self::load("config/default.toml")
    }

    /// Refresh 쿠키에 Secure 플래그를 붙일지 결정합니다.
    pub fn refresh_cookie_secure(&self) -> bool {
        self.auth
            .cookie_secure
            .unwrap_or(self.environment == Environment::Production)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn auth_with_secrets() -> AuthConfig {
        AuthConfig {
            access_secret: Some(SecretString::new("access-secret".into())),
            refresh_secret: Some(SecretString::new("refresh-secret".into())),
            ..Default::default()
        }
    }

    #[test]
    fn test_parse_ttl_units() {
        assert_eq!(parse_ttl("30"), Some(Duration::seconds(30)));
        assert_eq!(parse_ttl("30s"), Some(Duration::seconds(30)));
        assert_eq!(parse_ttl("15m"), Some(Duration::minutes(15)));
        assert_eq!(parse_ttl("2h"), Some(Duration::hours(2)));
        assert_eq!(parse_ttl(" 7d "), Some(Duration::days(7)));
    }

    #[test]
    fn test_parse_ttl_rejects_garbage() {
        assert_eq!(parse_ttl(""), None);
        assert_eq!(parse_ttl("m"), None);
        assert_eq!(parse_ttl("0m"), None);
        assert_eq!(parse_ttl("-5m"), None);
        assert_eq!(parse_ttl("10w"), None);
        assert_eq!(parse_ttl("1.5h"), None);
    }

    #[test]
    fn test_validate_requires_secrets() {
        let cfg = AuthConfig::default();
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::MissingSecret("auth.access_secret"))
        ));

        let cfg = AuthConfig {
            refresh_secret: None,
            ..auth_with_secrets()
        };
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::MissingSecret("auth.refresh_secret"))
        ));

        assert!(auth_with_secrets().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_ttl() {
        let cfg = AuthConfig {
            access_ttl: Some("soon".to_string()),
            ..auth_with_secrets()
        };
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::InvalidTtl { key: "auth.access_ttl", .. })
        ));

        let cfg = AuthConfig {
            refresh_ttl: None,
            ..auth_with_secrets()
        };
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::InvalidTtl { key: "auth.refresh_ttl", .. })
        ));
    }

    #[test]
    fn test_cookie_secure_follows_environment() {
        let mut cfg = AppConfig::default();
        assert!(!cfg.refresh_cookie_secure());

        cfg.environment = Environment::Production;
        assert!(cfg.refresh_cookie_secure());

        cfg.auth.cookie_secure = Some(false);
        assert!(!cfg.refresh_cookie_secure());
    }

    #[test]
    fn test_blank_secret_is_treated_as_missing() {
        let cfg: AuthConfig =
            serde_json::from_str(r#"{"access_secret": "   ", "refresh_secret": "r"}"#).unwrap();
        assert!(cfg.access_secret.is_none());
        assert!(cfg.refresh_secret.is_some());
    }

    proptest! {
        #[test]
        fn prop_minutes_roundtrip(n in 1i64..100_000) {
            prop_assert_eq!(parse_ttl(&format!("{}m", n)), Some(Duration::minutes(n)));
        }
    }
}

//! JWT 토큰 처리.
//!
//! Access Token과 Refresh Token은 서로 다른 비밀 키로 서명(HS256)합니다.
//! Refresh Token의 `jti`는 현재 세대를 식별하며, 저장소의 값과 비교하여
//! 재사용(이미 교체된 토큰)을 탐지하는 데 사용됩니다.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use rand::{rngs::OsRng, RngCore};
use secrecy::{ExposeSecret, SecretString};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use taskhub_core::{AuthConfig, ConfigError, Role, User, UserId};

/// jti 난수 길이 (바이트).
const JTI_BYTES: usize = 32;

/// Access Token 페이로드.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Subject - 사용자 ID
    pub sub: UserId,
    /// 사용자 이름
    pub username: String,
    /// 사용자 역할
    pub role: Role,
    /// Issued At (Unix timestamp)
    pub iat: i64,
    /// Expiration (Unix timestamp)
    pub exp: i64,
}

/// Refresh Token 페이로드.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshClaims {
    /// Subject - 사용자 ID
    pub sub: UserId,
    /// JWT ID - 세대 식별자
    pub jti: String,
    pub iat: i64,
    pub exp: i64,
}

/// 발급된 Refresh Token.
#[derive(Debug, Clone)]
pub struct IssuedRefreshToken {
    pub jti: String,
    pub token: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Access Token + Refresh Token 쌍.
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh: IssuedRefreshToken,
}

/// JWT 처리 에러.
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    #[error("토큰 인코딩 실패: {0}")]
    Encoding(#[from] jsonwebtoken::errors::Error),
    #[error("토큰이 만료되었습니다")]
    TokenExpired,
    #[error("유효하지 않은 토큰")]
    InvalidToken,
}

/// 토큰 발급/검증기.
///
/// 시작 시 한 번 생성되며 이후 불변입니다.
#[derive(Clone)]
pub struct TokenIssuer {
    access_encoding: EncodingKey,
    access_decoding: DecodingKey,
    refresh_encoding: EncodingKey,
    refresh_decoding: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish_non_exhaustive()
    }
}

impl TokenIssuer {
    /// 인증 설정에서 발급기를 생성합니다.
    ///
    /// 비밀 키나 TTL이 없거나 잘못되면 에러를 반환합니다.
    pub fn new(config: &AuthConfig) -> Result<Self, ConfigError> {
        Ok(Self::from_parts(
            config.access_secret()?,
            config.refresh_secret()?,
            config.access_ttl()?,
            config.refresh_ttl()?,
        ))
    }

    /// 비밀 키와 수명을 직접 지정하여 생성합니다.
    ///
    /// # Arguments
    ///
    /// * `access_secret` - Access Token 서명 키
    /// * `refresh_secret` - Refresh Token 서명 키
    /// * `access_ttl` - Access Token 수명
    /// * `refresh_ttl` - Refresh Token 수명
    pub fn from_parts(
        access_secret: &SecretString,
        refresh_secret: &SecretString,
        access_ttl: Duration,
        refresh_ttl: Duration,
    ) -> Self {
        let access = access_secret.expose_secret().as_bytes();
        let refresh = refresh_secret.expose_secret().as_bytes();
        Self {
            access_encoding: EncodingKey::from_secret(access),
            access_decoding: DecodingKey::from_secret(access),
            refresh_encoding: EncodingKey::from_secret(refresh),
            refresh_decoding: DecodingKey::from_secret(refresh),
            access_ttl,
            refresh_ttl,
        }
    }

    /// Refresh Token 수명 (쿠키 Max-Age에 사용).
    pub fn refresh_ttl(&self) -> Duration {
        self.refresh_ttl
    }

    /// Access Token 발급.
    pub fn issue_access(&self, user: &User) -> Result<String, JwtError> {
        let now = Utc::now();
        let claims = AccessClaims {
            sub: user.id,
            username: user.username.clone(),
            role: user.role,
            iat: now.timestamp(),
            exp: (now + self.access_ttl).timestamp(),
        };
        Ok(encode(&Header::default(), &claims, &self.access_encoding)?)
    }

    /// Refresh Token 발급.
    ///
    /// 매 발급마다 CSPRNG로 새 jti를 생성합니다.
    pub fn issue_refresh(&self, user_id: UserId) -> Result<IssuedRefreshToken, JwtError> {
        let issued_at = Utc::now();
        let expires_at = issued_at + self.refresh_ttl;
        let jti = generate_jti();
        let claims = RefreshClaims {
            sub: user_id,
            jti: jti.clone(),
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
        };
        let token = encode(&Header::default(), &claims, &self.refresh_encoding)?;

        Ok(IssuedRefreshToken {
            jti,
            token,
            issued_at,
            expires_at,
        })
    }

    /// Access/Refresh 토큰 쌍 발급.
    pub fn issue_pair(&self, user: &User) -> Result<TokenPair, JwtError> {
        Ok(TokenPair {
            access_token: self.issue_access(user)?,
            refresh: self.issue_refresh(user.id)?,
        })
    }

    /// Access Token 서명/만료 검증.
    pub fn verify_access(&self, token: &str) -> Result<AccessClaims, JwtError> {
        verify(token, &self.access_decoding)
    }

    /// Refresh Token 서명/만료 검증.
    pub fn verify_refresh(&self, token: &str) -> Result<RefreshClaims, JwtError> {
        verify(token, &self.refresh_decoding)
    }

    /// 서명 검증 없이 jti만 읽습니다.
    ///
    /// 저장된 세대와 비교하는 용도로만 사용해야 하며,
    /// 신뢰 판단은 반드시 해시 비교로 마무리합니다.
    pub fn peek_jti(token: &str) -> Option<String> {
        #[derive(Deserialize)]
        struct JtiOnly {
            jti: Option<String>,
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.insecure_disable_signature_validation();
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        decode::<JtiOnly>(token, &DecodingKey::from_secret(&[]), &validation)
            .ok()
            .and_then(|data| data.claims.jti)
    }
}

fn verify<T: DeserializeOwned>(token: &str, key: &DecodingKey) -> Result<T, JwtError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;
    validation.validate_exp = true;

    decode::<T>(token, key, &validation)
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => JwtError::TokenExpired,
            _ => JwtError::InvalidToken,
        })
}

fn generate_jti() -> String {
    let mut bytes = [0u8; JTI_BYTES];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

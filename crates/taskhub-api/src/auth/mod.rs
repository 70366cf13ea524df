//! 인증 및 권한 부여.
//!
//! # 구성 요소
//!
//! - [`PasswordHasher`]: Argon2id 비밀번호/토큰 해싱
//! - [`TokenIssuer`]: Access/Refresh JWT 발급 및 검증
//! - [`RefreshTokenLedger`]: 사용자당 단일 Refresh Token 세대 관리
//! - [`AuthService`]: 로그인/토큰 갱신
//! - [`JwtAuth`], [`AdminAuth`], [`RefreshAuth`]: Axum 추출기
//! - RBAC 판정 함수
//!
//! # 사용 예시
//!
//! ```rust,ignore
//! async fn protected_handler(
//!     JwtAuth(claims): JwtAuth,
//! ) -> impl IntoResponse {
//!     format!("Hello, {}!", claims.username)
//! }
//! ```

mod cookie;
mod jwt;
mod ledger;
mod middleware;
mod password;
mod rbac;
mod service;

pub use cookie::{
    build_refresh_cookie, extract_refresh_cookie, REFRESH_COOKIE_NAME, REFRESH_COOKIE_PATH,
};
pub use jwt::{AccessClaims, IssuedRefreshToken, JwtError, RefreshClaims, TokenIssuer, TokenPair};
pub use ledger::{LedgerError, RefreshTokenLedger};
pub use middleware::{AdminAuth, JwtAuth, JwtAuthError, RefreshAuth};
pub use password::{is_hashed, PasswordError, PasswordHasher};
pub use rbac::{ensure_admin, ensure_owner_or_admin, Caller, GuardedAction};
pub use service::{AuthOutcome, AuthService};

//! # TaskHub Core
//!
//! 멀티 테넌트 태스크 관리 API의 핵심 타입을 제공합니다:
//! - 사용자/인증 기록/태스크 도메인 모델
//! - 역할 및 권한 정의
//! - 도메인 에러 타입
//! - 설정 관리
//! - 로깅 인프라

pub mod config;
pub mod domain;
pub mod error;
pub mod logging;

pub use config::*;
pub use domain::*;
pub use error::*;
pub use logging::*;

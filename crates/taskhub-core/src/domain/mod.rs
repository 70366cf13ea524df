//! 사용자, 인증 기록, 태스크 도메인 모델.

mod pagination;
mod role;
mod task;
mod user;

pub use pagination::*;
pub use role::*;
pub use task::*;
pub use user::*;

//! 사용자/태스크 서비스.
//!
//! 핸들러는 요청을 해석한 뒤 이 계층에 위임하며,
//! 권한 판정과 도메인 이벤트 발행은 서비스에서 수행합니다.

pub mod external;
pub mod tasks;
pub mod users;

pub use external::{ExternalTask, ExternalTaskClient, HttpExternalTaskClient};
pub use tasks::{CreateTask, SyncReport, TasksService};
pub use users::UsersService;

//! Prometheus 메트릭 설정 및 유틸리티.
//!
//! HTTP 요청 메트릭과 인증/태스크 이벤트 메트릭을 수집하고
//! `/metrics` 엔드포인트로 노출합니다.

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{BuildError, Matcher, PrometheusBuilder, PrometheusHandle};

/// Prometheus 메트릭 레코더를 설치하고 핸들을 반환합니다.
///
/// # 에러
///
/// 레코더가 이미 설치되어 있으면 에러를 반환합니다.
pub fn setup_metrics_recorder() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full("http_request_duration_seconds".to_string()),
            &[0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0],
        )?
        .install_recorder()
}

// ============================================================================
// HTTP 메트릭
// ============================================================================

/// HTTP 요청 카운터 증가.
pub fn record_http_request(method: &str, path: &str) {
    counter!("http_requests_total", "method" => method.to_string(), "path" => path.to_string())
        .increment(1);
}

/// HTTP 응답 카운터 증가.
pub fn record_http_response(method: &str, path: &str, status: u16) {
    counter!(
        "http_responses_total",
        "method" => method.to_string(),
        "path" => path.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// HTTP 요청 지속 시간 기록.
pub fn record_http_duration(method: &str, path: &str, duration_secs: f64) {
    histogram!(
        "http_request_duration_seconds",
        "method" => method.to_string(),
        "path" => path.to_string()
    )
    .record(duration_secs);
}

// ============================================================================
// 인증/태스크 메트릭
// ============================================================================

/// 로그인 결과 카운터 (`success`, `unknown_user`, `bad_password`).
pub fn record_login(outcome: &'static str) {
    counter!("auth_login_total", "outcome" => outcome).increment(1);
}

/// 토큰 갱신 결과 카운터 (`success`, `reuse_rejected` 등).
pub fn record_refresh(outcome: &'static str) {
    counter!("auth_refresh_total", "outcome" => outcome).increment(1);
}

/// 태스크 도메인 이벤트 카운터 (`created`, `completed`).
pub fn record_task_event(event: &'static str) {
    counter!("task_events_total", "event" => event).increment(1);
}

/// 외부 소스에서 동기화된 태스크 수.
pub fn record_tasks_synced(count: u64) {
    counter!("tasks_synced_total").increment(count);
}

// ============================================================================
// 경로 정규화
// ============================================================================

/// 경로의 동적 세그먼트를 `:id`로 치환하여 라벨 카디널리티를 제한합니다.
///
/// 예: `/tasks/123e4567-e89b-12d3-a456-426614174000` → `/tasks/:id`
pub fn normalize_path(path: &str) -> String {
    path.split('/')
        .map(|segment| {
            let is_uuid = uuid::Uuid::try_parse(segment).is_ok();
            let is_numeric = !segment.is_empty() && segment.chars().all(|c| c.is_ascii_digit());
            if is_uuid || is_numeric {
                ":id"
            } else {
                segment
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_task_path() {
        assert_eq!(
            normalize_path("/tasks/123e4567-e89b-12d3-a456-426614174000"),
            "/tasks/:id"
        );
    }

    #[test]
    fn test_normalize_user_role_path() {
        assert_eq!(normalize_path("/user/42/role"), "/user/:id/role");
    }

    #[test]
    fn test_normalize_static_paths() {
        assert_eq!(normalize_path("/auth/refresh"), "/auth/refresh");
        assert_eq!(normalize_path("/tasks/sync-external"), "/tasks/sync-external");
    }
}

//! API 에러 응답.
//!
//! 서비스 계층의 [`TaskHubError`]는 이 모듈의 [`ApiError`]를 거쳐서만
//! HTTP 응답으로 변환됩니다. 내부 에러의 상세 내용은 로그에만 남기고
//! 클라이언트에는 일반 메시지만 반환합니다.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use taskhub_core::TaskHubError;
use tracing::error;
use validator::ValidationErrors;

/// 에러 응답 본문.
///
/// ```json
/// {
///   "code": "USER_NOT_FOUND",
///   "message": "User not found",
///   "timestamp": 1738300800
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    /// 에러 코드 (예: "FORBIDDEN_AUTH_ACCESS", "VALIDATION_ERROR")
    pub code: String,
    /// 사람이 읽을 수 있는 에러 메시지
    pub message: String,
    /// 추가 상세 정보 (검증 에러 목록 등)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
    /// 에러 발생 타임스탬프 (Unix timestamp)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

impl ApiErrorResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
            timestamp: Some(chrono::Utc::now().timestamp()),
        }
    }

    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: Value,
    ) -> Self {
        Self {
            details: Some(details),
            ..Self::new(code, message)
        }
    }
}

impl std::fmt::Display for ApiErrorResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

/// 핸들러 에러.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// 도메인 에러
    #[error(transparent)]
    Domain(#[from] TaskHubError),

    /// 요청 본문 필드 검증 실패
    #[error("요청 값 검증 실패")]
    Validation(ValidationErrors),

    /// 본문 파싱 실패 (잘못된 JSON, 허용되지 않은 필드 등)
    #[error("잘못된 요청: {0}")]
    BadRequest(String),
}

/// 핸들러 Result 타입.
pub type ApiResult<T> = Result<T, ApiError>;

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        ApiError::Validation(errors)
    }
}

/// 도메인 에러 → (상태 코드, 에러 코드).
fn classify(err: &TaskHubError) -> (StatusCode, &'static str) {
    match err {
        TaskHubError::ForbiddenAuthAccess => (StatusCode::FORBIDDEN, "FORBIDDEN_AUTH_ACCESS"),
        TaskHubError::UserAlreadyExists => (StatusCode::CONFLICT, "USER_ALREADY_EXISTS"),
        TaskHubError::UserNotFound => (StatusCode::NOT_FOUND, "USER_NOT_FOUND"),
        TaskHubError::TaskNotFound => (StatusCode::NOT_FOUND, "TASK_NOT_FOUND"),
        TaskHubError::ForbiddenUserRoleUpdate => {
            (StatusCode::FORBIDDEN, "FORBIDDEN_USER_ROLE_UPDATE")
        }
        TaskHubError::ForbiddenUserRoleDelete => {
            (StatusCode::FORBIDDEN, "FORBIDDEN_USER_ROLE_DELETE")
        }
        TaskHubError::ForbiddenTaskAccess => (StatusCode::FORBIDDEN, "FORBIDDEN_TASK_ACCESS"),
        TaskHubError::ExternalService(_) => (StatusCode::BAD_GATEWAY, "EXTERNAL_SERVICE_ERROR"),
        TaskHubError::Config(_) | TaskHubError::Database(_) | TaskHubError::Internal(_) => {
            (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
        }
    }
}

/// 필드별 검증 에러를 `[{field, code, message}]` 목록으로 변환합니다.
fn validation_details(errors: &ValidationErrors) -> Value {
    let mut fields = Vec::new();
    for (field, errs) in errors.field_errors() {
        for e in errs.iter() {
            let message = match &e.message {
                Some(m) => m.to_string(),
                None => format!("{}: 유효하지 않은 값", field),
            };
            fields.push(serde_json::json!({
                "field": field,
                "code": e.code,
                "message": message,
            }));
        }
    }
    fields.sort_by(|a, b| a["field"].as_str().cmp(&b["field"].as_str()));
    Value::Array(fields)
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            ApiError::Domain(err) => {
                let (status, code) = classify(err);
                let message = match err {
                    TaskHubError::ExternalService(_) => {
                        error!(error = %err, "External service failure");
                        "External service unavailable".to_string()
                    }
                    e if e.is_internal() => {
                        error!(error = %err, "Internal error");
                        "Internal server error".to_string()
                    }
                    e => e.to_string(),
                };
                (status, ApiErrorResponse::new(code, message))
            }
            ApiError::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                ApiErrorResponse::with_details(
                    "VALIDATION_ERROR",
                    "Validation failed",
                    validation_details(errors),
                ),
            ),
            ApiError::BadRequest(message) => (
                StatusCode::BAD_REQUEST,
                ApiErrorResponse::new("BAD_REQUEST", message.clone()),
            ),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_domain_error_mapping() {
        let cases = [
            (TaskHubError::ForbiddenAuthAccess, StatusCode::FORBIDDEN),
            (TaskHubError::UserAlreadyExists, StatusCode::CONFLICT),
            (TaskHubError::UserNotFound, StatusCode::NOT_FOUND),
            (TaskHubError::TaskNotFound, StatusCode::NOT_FOUND),
            (TaskHubError::ForbiddenUserRoleUpdate, StatusCode::FORBIDDEN),
            (TaskHubError::ForbiddenUserRoleDelete, StatusCode::FORBIDDEN),
            (TaskHubError::ForbiddenTaskAccess, StatusCode::FORBIDDEN),
        ];

        for (err, expected) in cases {
            let message = err.to_string();
            let response = ApiError::from(err).into_response();
            assert_eq!(response.status(), expected);
            assert_eq!(body_json(response).await["message"], message);
        }
    }

    #[tokio::test]
    async fn test_internal_details_are_hidden() {
        let response =
            ApiError::from(TaskHubError::Database("password=hunter2 host=db".to_string()))
                .into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_json(response).await;
        assert_eq!(body["code"], "INTERNAL_ERROR");
        assert_eq!(body["message"], "Internal server error");
        assert!(!body.to_string().contains("hunter2"));
    }

    #[tokio::test]
    async fn test_external_service_maps_to_bad_gateway() {
        let response =
            ApiError::from(TaskHubError::ExternalService("timeout".to_string())).into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[derive(Debug, Validate)]
    struct Sample {
        #[validate(length(min = 6, message = "too short"))]
        password: String,
    }

    #[tokio::test]
    async fn test_validation_details() {
        let errors = Sample {
            password: "abc".to_string(),
        }
        .validate()
        .unwrap_err();

        let response = ApiError::from(errors).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_json(response).await;
        assert_eq!(body["code"], "VALIDATION_ERROR");
        assert_eq!(body["details"][0]["field"], "password");
        assert_eq!(body["details"][0]["message"], "too short");
    }
}

//! 검증 포함 JSON 추출기.
//!
//! 본문을 역직렬화한 뒤 `validator` 규칙을 검사합니다.
//! 파싱 실패와 규칙 위반 모두 400으로 응답합니다.

use axum::{
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::error::ApiError;

/// 검증된 JSON 본문.
///
/// ```rust,ignore
/// async fn handler(ValidatedJson(body): ValidatedJson<RegisterRequest>) { ... }
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection: JsonRejection| ApiError::BadRequest(rejection.body_text()))?;

        value.validate()?;
        Ok(ValidatedJson(value))
    }
}

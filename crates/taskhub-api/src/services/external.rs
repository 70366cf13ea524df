//! 외부 태스크 소스 클라이언트.
//!
//! 관리자 동기화 작업에서 `{base}/todos` 목록을 가져옵니다.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use taskhub_core::{TaskHubError, TaskHubResult, UserId};
use tracing::debug;

/// 외부 API 요청 타임아웃.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// 외부 소스의 태스크 항목.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalTask {
    pub user_id: UserId,
    pub id: i64,
    pub title: String,
    pub completed: bool,
}

/// 외부 태스크 소스.
#[async_trait]
pub trait ExternalTaskClient: Send + Sync {
    async fn fetch_all(&self) -> TaskHubResult<Vec<ExternalTask>>;
}

/// reqwest 기반 기본 구현.
#[derive(Debug, Clone)]
pub struct HttpExternalTaskClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpExternalTaskClient {
    /// # Arguments
    ///
    /// * `base_url` - 외부 API 기본 URL (끝의 `/`는 무시)
    pub fn new(base_url: impl Into<String>) -> TaskHubResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| TaskHubError::Internal(format!("HTTP 클라이언트 생성 실패: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl ExternalTaskClient for HttpExternalTaskClient {
    async fn fetch_all(&self) -> TaskHubResult<Vec<ExternalTask>> {
        let url = format!("{}/todos", self.base_url);
        debug!(url = %url, "Fetching external tasks");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| TaskHubError::ExternalService(e.to_string()))?;

        response
            .json::<Vec<ExternalTask>>()
            .await
            .map_err(|e| TaskHubError::ExternalService(format!("응답 파싱 실패: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fetch_all_parses_todos() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/todos")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"[
                    {"userId": 1, "id": 1, "title": "delectus aut autem", "completed": false},
                    {"userId": 2, "id": 2, "title": "quis ut nam", "completed": true}
                ]"#,
            )
            .create_async()
            .await;

        let client = HttpExternalTaskClient::new(format!("{}/", server.url())).unwrap();
        let tasks = client.fetch_all().await.unwrap();

        mock.assert_async().await;
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].user_id, 1);
        assert_eq!(tasks[1].title, "quis ut nam");
        assert!(tasks[1].completed);
    }

    #[tokio::test]
    async fn test_upstream_error_status() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/todos")
            .with_status(503)
            .create_async()
            .await;

        let client = HttpExternalTaskClient::new(server.url()).unwrap();
        assert!(matches!(
            client.fetch_all().await,
            Err(TaskHubError::ExternalService(_))
        ));
    }

    #[tokio::test]
    async fn test_malformed_body() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/todos")
            .with_status(200)
            .with_body("not json")
            .create_async()
            .await;

        let client = HttpExternalTaskClient::new(server.url()).unwrap();
        assert!(matches!(
            client.fetch_all().await,
            Err(TaskHubError::ExternalService(_))
        ));
    }
}

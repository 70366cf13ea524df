//! TaskHub API 서버.
//!
//! 설정을 로드하고 저장소/서비스를 조립한 뒤 Axum 서버를 시작합니다.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{http::StatusCode, middleware, routing::get, Router};
use metrics_exporter_prometheus::PrometheusHandle;
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use taskhub_api::metrics::setup_metrics_recorder;
use taskhub_api::middleware::metrics_layer;
use taskhub_api::repository::Repositories;
use taskhub_api::routes::create_api_router;
use taskhub_api::services::HttpExternalTaskClient;
use taskhub_api::state::AppState;
use taskhub_core::{init_logging, AppConfig, CorsConfig, DatabaseConfig, LogConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // .env 파일 로드 (있는 경우)
    let _ = dotenvy::dotenv();

    let config = AppConfig::load_default()?;
    init_logging(LogConfig::from(&config.logging))?;

    info!(environment = ?config.environment, "Starting TaskHub API server...");

    // 비밀 키/TTL 누락 시 기동 중단
    if let Err(e) = config.auth.validate() {
        error!(error = %e, "인증 설정이 유효하지 않습니다. TASKHUB__AUTH__* 환경변수를 확인하세요.");
        return Err(e.into());
    }

    // Prometheus 메트릭 레코더 설정
    let metrics_handle = setup_metrics_recorder()?;
    info!("Prometheus metrics recorder initialized");

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .map_err(|e| {
            error!(
                host = %config.server.host,
                port = config.server.port,
                error = %e,
                "소켓 주소 설정이 유효하지 않습니다."
            );
            e
        })?;

    let (repos, db_pool) = connect_repositories(&config.database).await?;
    let external = Arc::new(HttpExternalTaskClient::new(
        config.tasks.external_api_url.clone(),
    )?);

    let mut state = AppState::from_config(&config, repos, external)?;
    if let Some(pool) = db_pool {
        state = state.with_db_pool(pool);
    }
    let state = Arc::new(state);

    info!(
        version = %state.version,
        has_db = state.db_pool.is_some(),
        cookie_secure = state.cookie_secure,
        "Application state initialized"
    );

    let app = create_router(
        state,
        metrics_handle,
        &config.cors,
        Duration::from_secs(config.server.request_timeout_secs),
    );

    info!(%addr, "API server listening");
    info!("Metrics available at http://{}/metrics", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped gracefully");
    Ok(())
}

/// 저장소 생성.
///
/// `database.url`이 있으면 PostgreSQL에 연결하고 마이그레이션을 적용합니다.
/// 없으면 메모리 저장소를 사용합니다 (재시작 시 데이터 유실).
async fn connect_repositories(
    config: &DatabaseConfig,
) -> Result<(Repositories, Option<sqlx::PgPool>), Box<dyn std::error::Error>> {
    let Some(url) = config.url.as_deref() else {
        warn!("database.url not set, using in-memory storage (data is lost on restart)");
        return Ok((Repositories::in_memory(), None));
    };

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(config.connection_timeout_secs))
        .connect(url)
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to connect to database");
            e
        })?;

    sqlx::migrate!("../../migrations").run(&pool).await?;
    info!("Connected to PostgreSQL, migrations applied");

    Ok((Repositories::postgres(pool.clone()), Some(pool)))
}

/// CORS 레이어 생성.
///
/// `cors.origins`가 비어 있으면 모든 origin을 허용합니다 (개발 모드).
/// 목록이 있으면 해당 origin만 허용하고 자격 증명(쿠키) 전송을 허용합니다.
fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let origins: Vec<_> = config
        .origins
        .iter()
        .filter_map(|s| s.trim().parse().ok())
        .collect();

    let layer = CorsLayer::new()
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::PATCH,
            axum::http::Method::DELETE,
            axum::http::Method::OPTIONS,
        ])
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            axum::http::header::AUTHORIZATION,
            axum::http::header::ACCEPT,
        ])
        .max_age(Duration::from_secs(3600));

    if origins.is_empty() {
        if !config.origins.is_empty() {
            warn!("cors.origins contains no valid origins, allowing any");
        } else {
            warn!("cors.origins not set, allowing any origin (development mode)");
        }
        layer.allow_origin(AllowOrigin::any())
    } else {
        info!("CORS configured with {} allowed origins", origins.len());
        layer
            .allow_origin(AllowOrigin::list(origins))
            .allow_credentials(true)
    }
}

/// /metrics 엔드포인트 핸들러.
async fn metrics_handler(
    axum::extract::State(handle): axum::extract::State<PrometheusHandle>,
) -> String {
    handle.render()
}

/// 전체 라우터 생성.
fn create_router(
    state: Arc<AppState>,
    metrics_handle: PrometheusHandle,
    cors: &CorsConfig,
    request_timeout: Duration,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(metrics_handler))
        .with_state(metrics_handle);

    Router::new()
        .merge(metrics_router)
        .merge(create_api_router().with_state(state))
        .layer(middleware::from_fn(metrics_layer))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            request_timeout,
        ))
        .layer(cors_layer(cors))
}

/// Graceful shutdown 시그널 대기.
///
/// Ctrl+C 또는 SIGTERM 시그널을 수신하면 반환합니다.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            warn!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            warn!("Received SIGTERM, initiating graceful shutdown...");
        }
    }
}

//! HTTP API server implementation

use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn};

use crate::core::config::AppConfig;
use crate::core::errors::SlugError;
use crate::core::models::{GenerateOptions, GenerationMode, ProviderCredential, ProviderKind, TestReport};
use crate::core::orchestrator::SlugOrchestrator;
use crate::core::settings::{Settings, SettingsPatch};
use crate::core::uniqueness::{check_slug, CheckResult, SlugIndex, SlugQuery, UniquenessChecker};

/// Application state
#[derive(Clone)]
pub struct AppState {
    orchestrator: SlugOrchestrator,
    checker: Arc<dyn UniquenessChecker>,
}

impl AppState {
    /// State shared by all handlers
    pub fn new(orchestrator: SlugOrchestrator, checker: Arc<dyn UniquenessChecker>) -> Self {
        Self { orchestrator, checker }
    }
}

/// Health check response
#[derive(Serialize)]
struct HealthResponse {
    status: String,
    service: String,
    version: String,
}

/// Slug generation request
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    /// Source text
    #[serde(default)]
    pub text: String,
    pub mode: Option<GenerationMode>,
    pub target_lang: Option<String>,
}

/// Slug generation response
#[derive(Serialize)]
pub struct GenerateResponse {
    pub slug: String,
}

/// Translator self-test request
#[derive(Deserialize)]
pub struct TestTranslatorRequest {
    /// Provider name
    pub translator: String,
    /// Credential to test, not yet saved
    #[serde(default)]
    pub config: ProviderCredential,
}

/// Usage reset acknowledgement
#[derive(Serialize)]
pub struct ResetResponse {
    pub success: bool,
    pub message: String,
}

/// Error response
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

/// Error message and machine-readable code
#[derive(Serialize)]
pub struct ErrorDetail {
    pub message: String,
    pub code: String,
}

/// Error carried back to the HTTP caller
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }
}

impl From<SlugError> for ApiError {
    fn from(err: SlugError) -> Self {
        let (status, code) = match &err {
            SlugError::EmptyInput => (StatusCode::BAD_REQUEST, "invalid_request"),
            SlugError::UnknownProvider { .. } => (StatusCode::BAD_REQUEST, "unknown_translator"),
            SlugError::AllProvidersFailed => (StatusCode::BAD_GATEWAY, "translation_failed"),
            SlugError::CheckUnavailable { .. } => (StatusCode::SERVICE_UNAVAILABLE, "check_unavailable"),
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        };
        Self::new(status, code, err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error: ErrorDetail {
                message: self.message,
                code: self.code.to_string(),
            },
        };
        (self.status, axum::Json(body)).into_response()
    }
}

type ApiResult<T> = Result<axum::Json<T>, ApiError>;

/// Settings plus the derived usage projection
async fn settings_view(state: &AppState, settings: Settings) -> Result<Value, ApiError> {
    let stats = state.orchestrator.ledger().stats_snapshot().await?;
    let mut view = serde_json::to_value(settings).map_err(SlugError::from)?;
    view["usageStats"] = serde_json::to_value(stats).map_err(SlugError::from)?;
    Ok(view)
}

/// Health check handler
async fn health_check() -> axum::Json<HealthResponse> {
    axum::Json(HealthResponse {
        status: "ok".to_string(),
        service: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

async fn get_settings(State(state): State<Arc<AppState>>) -> ApiResult<Value> {
    let settings = state.orchestrator.settings().load().await?;
    Ok(axum::Json(settings_view(&state, settings).await?))
}

async fn update_settings(
    State(state): State<Arc<AppState>>,
    Json(patch): Json<SettingsPatch>,
) -> ApiResult<Value> {
    let settings = state.orchestrator.settings().update(patch).await?;
    info!("Settings updated");
    Ok(axum::Json(settings_view(&state, settings).await?))
}

async fn generate(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<GenerateRequest>,
) -> ApiResult<GenerateResponse> {
    if payload.text.trim().is_empty() {
        return Err(ApiError::new(StatusCode::BAD_REQUEST, "invalid_request", "Text is required"));
    }

    let options = GenerateOptions {
        mode: payload.mode,
        target_lang: payload.target_lang,
    };

    let generated = state
        .orchestrator
        .generate_slug(&payload.text, &options)
        .await
        .map_err(|e| {
            warn!("Slug generation failed: {}", e);
            ApiError::from(e)
        })?;

    if generated.slug.is_empty() {
        return Err(ApiError::new(
            StatusCode::UNPROCESSABLE_ENTITY,
            "empty_slug",
            "Generated slug is empty",
        ));
    }

    Ok(axum::Json(GenerateResponse { slug: generated.slug }))
}

async fn check(
    State(state): State<Arc<AppState>>,
    Json(query): Json<SlugQuery>,
) -> ApiResult<CheckResult> {
    let result = check_slug(state.checker.as_ref(), &query).await?;
    Ok(axum::Json(result))
}

async fn test_translator(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<TestTranslatorRequest>,
) -> axum::Json<TestReport> {
    axum::Json(
        state
            .orchestrator
            .test_translator(&payload.translator, &payload.config)
            .await,
    )
}

async fn get_usage(State(state): State<Arc<AppState>>) -> ApiResult<Value> {
    let stats = state.orchestrator.ledger().stats_snapshot().await?;
    Ok(axum::Json(serde_json::to_value(stats).map_err(SlugError::from)?))
}

async fn reset_usage(
    State(state): State<Arc<AppState>>,
    Path(translator): Path<String>,
) -> ApiResult<ResetResponse> {
    let kind: ProviderKind = translator.parse()?;
    state.orchestrator.ledger().reset(kind.as_str()).await?;

    Ok(axum::Json(ResetResponse {
        success: true,
        message: format!("Usage stats reset for {}", kind),
    }))
}

/// Build the API router
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(health_check))
        .route("/settings", get(get_settings).put(update_settings))
        .route("/generate", post(generate))
        .route("/check-slug", post(check))
        .route("/test-translator", post(test_translator))
        .route("/usage", get(get_usage))
        .route("/usage/:translator/reset", post(reset_usage))
        .with_state(state)
}

/// Run the HTTP server
pub async fn run_server(config: AppConfig) -> anyhow::Result<()> {
    let orchestrator = SlugOrchestrator::from_config(&config)?;

    let checker: Arc<dyn UniquenessChecker> = match &config.slug_index_path {
        Some(path) => Arc::new(SlugIndex::from_file(path).await?),
        None => Arc::new(SlugIndex::new()),
    };

    let state = Arc::new(AppState::new(orchestrator, checker));
    let app = router(state);

    // Bind address
    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;

    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

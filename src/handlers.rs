use std::sync::Arc;
use std::time::Instant;

use axum::body::Bytes;
use axum::extract::{Path, Request, State};
use axum::middleware::Next;
use axum::response::Response;
use axum::{Json, Router, middleware};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tower_http::cors::{Any, CorsLayer};

use crate::error::{AppError, Result, log_error};
use crate::init::AppState;
use crate::stream::DecodedAnswer;
use crate::tools::{ToolDefinition, ToolOutput, model_key};

// ============================================================================
// Middleware
// ============================================================================

pub async fn request_log_middleware(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let started = Instant::now();

    let response = next.run(request).await;

    log::info!(
        "{} {} -> {} ({} ms)",
        method,
        path,
        response.status().as_u16(),
        started.elapsed().as_millis()
    );
    response
}

// ============================================================================
// Health
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub version: String,
}

pub async fn health_check() -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============================================================================
// TOOLS
// ============================================================================

/// GET /api/tools
pub async fn list_tools_handler(State(state): State<Arc<AppState>>) -> Json<Vec<ToolDefinition>> {
    Json(state.tools.definitions())
}

/// POST /api/tools/{name}
///
/// Body: JSON arguments for the tool (may be empty).
/// Tool failures come back as `isError: true` with HTTP 200; only a body
/// that is not JSON is rejected.
pub async fn call_tool_handler(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    body: Bytes,
) -> Result<Json<ToolOutput>> {
    let args = if body.iter().all(u8::is_ascii_whitespace) {
        Value::Null
    } else {
        serde_json::from_slice(&body)?
    };
    Ok(Json(state.tools.call(&name, args).await))
}

// ============================================================================
// ASK
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    pub query: String,
    #[serde(default, deserialize_with = "model_key")]
    pub model: Option<String>,
}

/// POST /api/ask
///
/// Returns the decoded answer, or an error whose status follows the
/// upstream failure class.
pub async fn ask_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AskRequest>,
) -> Result<Json<DecodedAnswer>> {
    if request.query.trim().is_empty() {
        return Err(AppError::bad_request("query is required"));
    }

    let model = state
        .tools
        .registry()
        .resolve(request.model.as_deref())
        .ok_or_else(|| AppError::internal("no models registered"))?;

    let client = state.tools.client().await;
    let decoded = client.ask(&request.query, &model.id).await.inspect_err(log_error)?;
    Ok(Json(decoded))
}

// ============================================================================
// Router Setup
// ============================================================================

pub fn create_app_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/ask", axum::routing::post(ask_handler))
        .route("/api/tools", axum::routing::get(list_tools_handler))
        .route("/api/tools/{name}", axum::routing::post(call_tool_handler))
        .route("/health", axum::routing::get(health_check))
        .layer(middleware::from_fn(request_log_middleware))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

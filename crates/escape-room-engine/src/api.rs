//! HTTP API for the escape room.
//!
//! The API is stateless: game state lives with the client, and the server
//! only grades selections, hands out hints and serves the catalog.
//!
//! # Endpoints
//!
//! - `POST /api/hints` - Get a hint for a scenario
//! - `GET /api/hints` - Hint quota and provider
//! - `POST /api/grade` - Grade a selection
//! - `GET /api/scenarios` - Scenario catalog, without rubrics
//! - `GET /api/controls` - Control library
//!
//! # Example
//!
//! ```no_run
//! use escape_room_engine::{create_router, AppState, Config};
//!
//! # async fn example() -> escape_room_engine::Result<()> {
//! let state = AppState::new(Config::default())?;
//! let router = create_router(state);
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
//! axum::serve(listener, router).await?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{error, info};

use crate::content::{Control, ContentStore, Scenario};
use crate::error::{EscapeRoomError, Result};
use crate::grading::{grade_submission, GradingResult};
use crate::hints::{HintArbiter, HintContext, HintInfo, HintResult};
use crate::Config;

const HINT_FAILED_MESSAGE: &str = "Failed to get hint";

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for the grade endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeRequest {
    /// Scenario to grade against.
    #[serde(default)]
    pub scenario_id: String,
    /// Controls the player selected.
    #[serde(default)]
    pub selected_control_ids: Vec<String>,
}

/// Error response body returned on failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Description of the error.
    pub error: String,
}

// ============================================================================
// Application State
// ============================================================================

/// Shared, read-only application state for the HTTP server.
#[derive(Clone)]
pub struct AppState {
    /// Loaded configuration.
    pub config: Config,
    /// Control and scenario catalog.
    pub content: Arc<ContentStore>,
    /// Hint provider selection.
    pub arbiter: Arc<HintArbiter>,
}

impl AppState {
    /// Creates state from configuration using the built-in catalog.
    pub fn new(config: Config) -> Result<Self> {
        let content = ContentStore::builtin()?;
        let arbiter = HintArbiter::from_config(&config.hints, Arc::clone(&content))?;
        Ok(Self::with_parts(config, content, arbiter))
    }

    /// Creates state from pre-built parts.
    #[must_use]
    pub fn with_parts(config: Config, content: Arc<ContentStore>, arbiter: HintArbiter) -> Self {
        Self {
            config,
            content,
            arbiter: Arc::new(arbiter),
        }
    }
}

// ============================================================================
// API Error Type
// ============================================================================

/// Internal error type for API handlers.
#[derive(Debug)]
enum ApiError {
    /// The request was malformed or refused.
    BadRequest(String),
    /// The requested scenario does not exist.
    NotFound(String),
    /// Something failed on our side.
    Internal(String),
}

impl From<EscapeRoomError> for ApiError {
    fn from(err: EscapeRoomError) -> Self {
        match err {
            EscapeRoomError::MissingScenarioId | EscapeRoomError::HintQuotaExceeded { .. } => {
                Self::BadRequest(err.user_message())
            }
            EscapeRoomError::RubricNotFound { .. } => Self::NotFound(err.to_string()),
            EscapeRoomError::HintUnavailable { .. } | EscapeRoomError::HintProviderError { .. } => {
                error!(error = %err, "Hint request failed");
                Self::Internal(HINT_FAILED_MESSAGE.to_string())
            }
            other => {
                error!(error = %other, "Request failed");
                Self::Internal(other.user_message())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            Self::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(ErrorResponse { error: message });
        (status, body).into_response()
    }
}

// ============================================================================
// Router Setup
// ============================================================================

/// Creates the HTTP router with all API endpoints.
///
/// Routes are nested under `/api` with permissive CORS and request tracing.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        .route("/hints", post(handle_hint).get(handle_hint_info))
        .route("/grade", post(handle_grade))
        .route("/scenarios", get(handle_scenarios))
        .route("/controls", get(handle_controls));

    Router::new()
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(Arc::new(state))
}

// ============================================================================
// Handlers
// ============================================================================

/// Parses a request body that must carry a non-blank string `scenarioId`.
///
/// Extractor rejections and field type errors are reported as `BadRequest`.
fn parse_scenario_request<T: DeserializeOwned>(
    payload: std::result::Result<Json<Value>, JsonRejection>,
) -> std::result::Result<T, ApiError> {
    let Json(body) = payload.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;

    let has_scenario = body
        .get("scenarioId")
        .and_then(Value::as_str)
        .is_some_and(|id| !id.trim().is_empty());
    if !has_scenario {
        return Err(EscapeRoomError::MissingScenarioId.into());
    }

    serde_json::from_value(body).map_err(|e| ApiError::BadRequest(format!("Invalid request: {e}")))
}

/// Handler for `POST /api/hints`.
async fn handle_hint(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<Value>, JsonRejection>,
) -> std::result::Result<Json<HintResult>, ApiError> {
    let request: HintContext = parse_scenario_request(payload)?;
    info!(
        scenario = %request.scenario_id,
        category = ?request.category,
        hints_used = request.hints_used,
        "Hint requested"
    );
    let result = state.arbiter.get_hint(&request).await?;
    Ok(Json(result))
}

/// Handler for `GET /api/hints`.
async fn handle_hint_info(State(state): State<Arc<AppState>>) -> Json<HintInfo> {
    Json(state.arbiter.info())
}

/// Handler for `POST /api/grade`.
async fn handle_grade(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<Value>, JsonRejection>,
) -> std::result::Result<Json<GradingResult>, ApiError> {
    let request: GradeRequest = parse_scenario_request(payload)?;
    let result = grade_submission(
        &state.content,
        &request.scenario_id,
        &request.selected_control_ids,
    )?;
    info!(
        scenario = %request.scenario_id,
        score = result.score,
        grade = %result.grade,
        "Graded submission"
    );
    Ok(Json(result))
}

/// Handler for `GET /api/scenarios`.
async fn handle_scenarios(State(state): State<Arc<AppState>>) -> Json<Vec<Scenario>> {
    Json(state.content.scenarios().to_vec())
}

/// Handler for `GET /api/controls`.
async fn handle_controls(State(state): State<Arc<AppState>>) -> Json<Vec<Control>> {
    Json(state.content.controls().to_vec())
}

// ============================================================================
// Tests
// ============================================================================

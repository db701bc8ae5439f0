// IBAN Check - Web Server
// REST API with Axum around the validation pipeline

use anyhow::{Context, Result};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use iban_check::{
    validate, BatchEntry, BatchSummary, BatchValidator, CountryRegistry, ErrorKind, ServerConfig,
    ValidationError,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Shared application state
#[derive(Clone)]
struct AppState {
    config: Arc<ServerConfig>,
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
            error: None,
        }
    }

    fn err(data: T, error: String) -> Self {
        Self {
            success: false,
            data,
            error: Some(error),
        }
    }
}

/// Rejection details for a single IBAN
#[derive(Serialize)]
struct RejectionResponse {
    kind: ErrorKind,
    message: String,
    advisory: bool,
}

impl From<&ValidationError> for RejectionResponse {
    fn from(err: &ValidationError) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
            advisory: err.is_advisory(),
        }
    }
}

#[derive(Deserialize)]
struct BatchRequest {
    ibans: Vec<String>,
}

#[derive(Serialize)]
struct BatchResponse {
    summary: BatchSummary,
    entries: Vec<BatchEntry>,
}

#[derive(Serialize)]
struct CountryResponse {
    code: &'static str,
    length: usize,
    layout: &'static str,
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/validate/:iban - Validate one IBAN
async fn validate_one(Path(input): Path<String>) -> Response {
    match validate(&input) {
        Ok(iban) => (StatusCode::OK, Json(ApiResponse::ok(Some(iban)))).into_response(),
        Err(err) => {
            if err.is_internal() {
                error!(input = %input, error = %err, "internal validation failure");
            }
            let status = if err.is_internal() {
                StatusCode::INTERNAL_SERVER_ERROR
            } else {
                StatusCode::UNPROCESSABLE_ENTITY
            };
            (
                status,
                Json(ApiResponse::err(RejectionResponse::from(&err), err.to_string())),
            )
                .into_response()
        }
    }
}

/// POST /api/validate - Validate a batch of IBANs
async fn validate_batch(
    State(state): State<AppState>,
    Json(request): Json<BatchRequest>,
) -> Response {
    if request.ibans.len() > state.config.max_batch {
        let message = format!(
            "batch of {} exceeds the limit of {}",
            request.ibans.len(),
            state.config.max_batch
        );
        return (
            StatusCode::PAYLOAD_TOO_LARGE,
            Json(ApiResponse::err(None::<BatchResponse>, message)),
        )
            .into_response();
    }

    let report = BatchValidator::default().check_all("request", &request.ibans);
    info!("{}", report.summary.summary());

    let response = BatchResponse {
        summary: report.summary,
        entries: report.entries,
    };
    (StatusCode::OK, Json(ApiResponse::ok(Some(response)))).into_response()
}

/// GET /api/countries - Supported countries
async fn list_countries() -> impl IntoResponse {
    let countries: Vec<CountryResponse> = CountryRegistry::global()
        .rules()
        .into_iter()
        .map(|rule| CountryResponse {
            code: rule.code,
            length: rule.length,
            layout: rule.layout,
        })
        .collect();

    Json(ApiResponse::ok(countries))
}

fn app(config: ServerConfig) -> Router {
    let state = AppState {
        config: Arc::new(config),
    };

    // Build API routes
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/validate", post(validate_batch))
        .route("/validate/:iban", get(validate_one))
        .route("/countries", get(list_countries))
        .with_state(state);

    Router::new()
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive())
}

// ============================================================================
// Main Server
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env().context("Failed to load server configuration")?;
    let addr = config.addr;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!(%addr, countries = CountryRegistry::global().len(), "IBAN server listening");

    axum::serve(listener, app(config))
        .await
        .context("Server terminated")?;

    Ok(())
}

// ============================================================================
// Tests
// ============================================================================

use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit, State},
    http::{header, HeaderValue, Method, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{SecondsFormat, Utc};
use personal_sign_verifier::common::config::{ServerConfig, BODY_LIMIT_BYTES};
use personal_sign_verifier::common::error::ErrorKind;
use personal_sign_verifier::common::service::VerificationService;
use personal_sign_verifier::common::types::{ApiResponse, HealthResponse, VerifyRequest};
use serde_json::json;
use std::any::Any;
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, info_span, warn};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

type SharedService = Arc<VerificationService>;

// Create a new router with the verify endpoints
pub fn create_router(config: &ServerConfig) -> Router {
    let service: SharedService = Arc::new(VerificationService::new());

    let routes = Router::new()
        .route("/verify", post(handle_verify_request))
        .route("/api/messages/verify", post(handle_verify_request))
        .route("/health", get(handle_health))
        .fallback(handle_not_found)
        .with_state(service);

    with_middleware(routes, config)
}

// Shared layer stack: panics become 500 envelopes, timeouts become 408 envelopes
fn with_middleware(routes: Router, config: &ServerConfig) -> Router {
    routes
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
        .layer(TimeoutLayer::new(config.request_timeout))
        .layer(middleware::map_response(timeout_envelope))
        .layer(cors_layer(&config.allowed_origins))
        .layer(TraceLayer::new_for_http())
}

fn handle_panic(panic: Box<dyn Any + Send + 'static>) -> Response {
    let details = if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else {
        "Unknown error".to_string()
    };
    error!(%details, "Handler panicked");

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ApiResponse::error(
            ErrorKind::Internal.label(),
            Some(json!(details)),
        )),
    )
        .into_response()
}

async fn timeout_envelope(response: Response) -> Response {
    if response.status() != StatusCode::REQUEST_TIMEOUT {
        return response;
    }
    warn!("Request timed out");
    (
        StatusCode::REQUEST_TIMEOUT,
        Json(ApiResponse::error(
            "Request timed out",
            Some(json!("The verifier did not answer in time")),
        )),
    )
        .into_response()
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring malformed CORS origin {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE])
        .allow_credentials(true)
}

// Handle the verify request
async fn handle_verify_request(
    State(service): State<SharedService>,
    request: Result<Json<VerifyRequest>, JsonRejection>,
) -> (StatusCode, Json<ApiResponse>) {
    let request_id = Uuid::new_v4();

    info_span!("verify", %request_id).in_scope(|| {
        let Json(request) = match request {
            Ok(request) => request,
            Err(rejection) => {
                warn!(error = %rejection.body_text(), "Malformed verify request body");
                return (
                    StatusCode::BAD_REQUEST,
                    Json(ApiResponse::error(
                        "Validation failed",
                        Some(json!(rejection.body_text())),
                    )),
                );
            }
        };

        let result = service.verify(&request);
        let status = StatusCode::from_u16(result.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(result.into_response()))
    })
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        success: true,
        status: "OK".to_string(),
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    })
}

async fn handle_not_found() -> (StatusCode, Json<ApiResponse>) {
    (
        StatusCode::NOT_FOUND,
        Json(ApiResponse::error("Route not found", None)),
    )
}


#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ServerConfig::from_env()?;
    let app = create_router(&config);

    info!("Verifier service listening on {}", config.addr);

    // Run the server
    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

use lambda_http::{run, service_fn, Body, Request, Response};
use lambda_runtime::Error;
use personal_sign_verifier::common::service::VerificationService;
use personal_sign_verifier::common::types::{ApiResponse, VerifyRequest};
use serde_json::json;
use tracing::{info, warn};

const VERIFY_PATHS: [&str; 3] = ["/", "/verify", "/api/messages/verify"];

/// Main function for the Lambda handler
#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_target(false)
        .without_time()
        .with_line_number(false)
        .init();

    let service = VerificationService::new();
    run(service_fn(move |event| handle_request(event, service))).await
}

/// Route the incoming request
async fn handle_request(event: Request, service: VerificationService) -> Result<Response<Body>, Error> {
    let path = event.uri().path().to_string();
    info!(%path, method = %event.method(), "Received request");

    if VERIFY_PATHS.contains(&path.as_str()) {
        handle_verify_request(event, service).await
    } else {
        json_response(404, &ApiResponse::error("Route not found", None))
    }
}

/// Handle the verify request
async fn handle_verify_request(event: Request, service: VerificationService) -> Result<Response<Body>, Error> {
    let request: VerifyRequest = match serde_json::from_slice(event.body()) {
        Ok(request) => request,
        Err(e) => {
            warn!(error = %e, "Malformed verify request body");
            return json_response(
                400,
                &ApiResponse::error("Validation failed", Some(json!(e.to_string()))),
            );
        }
    };

    let result = service.verify(&request);
    json_response(result.status_code(), &result.into_response())
}

fn json_response(status: u16, body: &ApiResponse) -> Result<Response<Body>, Error> {
    let response = Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .body(Body::from(serde_json::to_string(body)?))?;
    Ok(response)
}

use serde_json::{json, Value};
use tracing::{info, warn};

use super::api::{ClientError, VerifierClient};
use crate::common::signer::MessageSigner;
use crate::common::types::ApiResponse;
use crate::history::{BlobStore, HistoryStore, NewHistoryItem, Notifier};

/// Signs `message`, submits it for verification and records the attempt.
///
/// Every attempt that reaches the signer is recorded, including ones that
/// fail to sign or fail to reach the verifier. Blank messages are rejected
/// up front and not recorded.
pub async fn sign_and_record<M, S, N>(
    signer: &M,
    client: &VerifierClient,
    history: &HistoryStore<S, N>,
    message: &str,
) -> ApiResponse
where
    M: MessageSigner + ?Sized,
    S: BlobStore,
    N: Notifier,
{
    if message.trim().is_empty() {
        return ApiResponse::error(
            "Validation failed",
            Some(json!("Message cannot be empty")),
        );
    }

    let mut record = NewHistoryItem::now(message);

    let signature = match signer.sign_message(message).await {
        Ok(signature) => signature,
        Err(e) => {
            warn!(error = %e, "Signing failed");
            let response = ApiResponse::error("Signing failed", Some(json!(e.to_string())));
            record.verification_result = to_value(&response);
            history.add(record);
            return response;
        }
    };
    record.signature = signature.clone();

    let response = match client.verify(message, &signature).await {
        Ok(response) => response,
        Err(ClientError::Network(reason)) => ApiResponse::error(
            "Network error",
            Some(json!(format!(
                "could not reach {}: {}",
                client.base_url(),
                reason
            ))),
        ),
        Err(e) => ApiResponse::error("Verification error", Some(json!(e.to_string()))),
    };

    record.recovered_address = response
        .data
        .as_ref()
        .map(|data| data.recovered_address.clone())
        .or_else(|| signer.address_hint())
        .unwrap_or_default();
    record.verified = response.success;
    record.verification_result = to_value(&response);

    if response.success {
        info!(address = %record.recovered_address, "Message verified");
    } else {
        warn!(error = ?response.error, "Verification did not succeed");
    }

    history.add(record);
    response
}

fn to_value(response: &ApiResponse) -> Value {
    serde_json::to_value(response).unwrap_or(Value::Null)
}

use reqwest::StatusCode;
use serde::Deserialize;

use crate::store::error::{
    aborted, deadline_exceeded, internal_error, invalid_argument, not_found, permission_denied,
    resource_exhausted, unauthenticated, unavailable, unimplemented, StoreError,
};

#[derive(Debug, Deserialize)]
struct GoogleErrorBody {
    error: Option<GoogleError>,
}

#[derive(Debug, Deserialize)]
struct GoogleError {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    status: Option<String>,
}

pub fn map_http_error(status: StatusCode, body: &str) -> StoreError {
    let payload = extract_error_payload(body);
    let message = payload
        .as_ref()
        .and_then(|payload| payload.message.clone())
        .filter(|message| !message.is_empty())
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("HTTP error").to_string());

    if let Some(status_string) = payload.as_ref().and_then(|payload| payload.status.as_deref()) {
        return map_status_code(status_string, &message);
    }

    match status {
        StatusCode::BAD_REQUEST => invalid_argument(message),
        StatusCode::UNAUTHORIZED => unauthenticated(message),
        StatusCode::FORBIDDEN => permission_denied(message),
        StatusCode::NOT_FOUND => not_found(message),
        StatusCode::CONFLICT => aborted(message),
        StatusCode::TOO_MANY_REQUESTS => resource_exhausted(message),
        StatusCode::NOT_IMPLEMENTED => unimplemented(message),
        StatusCode::BAD_GATEWAY | StatusCode::SERVICE_UNAVAILABLE => unavailable(message),
        StatusCode::GATEWAY_TIMEOUT | StatusCode::REQUEST_TIMEOUT => deadline_exceeded(message),
        status if status.is_client_error() => invalid_argument(message),
        _ => internal_error(message),
    }
}

fn map_status_code(status: &str, message: &str) -> StoreError {
    match status {
        "INVALID_ARGUMENT" | "FAILED_PRECONDITION" | "OUT_OF_RANGE" | "ALREADY_EXISTS" => {
            invalid_argument(message)
        }
        "UNAUTHENTICATED" => unauthenticated(message),
        "PERMISSION_DENIED" => permission_denied(message),
        "NOT_FOUND" => not_found(message),
        "ABORTED" => aborted(message),
        "RESOURCE_EXHAUSTED" => resource_exhausted(message),
        "UNIMPLEMENTED" => unimplemented(message),
        "UNAVAILABLE" => unavailable(message),
        "DEADLINE_EXCEEDED" => deadline_exceeded(message),
        "CANCELLED" | "DATA_LOSS" | "UNKNOWN" | "INTERNAL" => internal_error(message),
        other => internal_error(format!("Unhandled store error status: {other}")),
    }
}

fn extract_error_payload(body: &str) -> Option<GoogleError> {
    serde_json::from_str::<GoogleErrorBody>(body)
        .ok()
        .and_then(|parsed| parsed.error)
}

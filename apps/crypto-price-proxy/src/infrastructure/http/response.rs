//! HTTP response DTOs.

use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

use crate::domain::outcome::{FetchOutcome, OutcomeKind};
use crate::domain::quotes::PriceQuoteSet;

/// Message returned when the upstream quota is exhausted.
pub const RATE_LIMITED_MESSAGE: &str = "Rate limit exceeded. Please try again later.";

/// Message returned when the upstream could not be reached.
pub const TRANSPORT_FAILURE_MESSAGE: &str = "Failed to fetch crypto prices.";

/// Message returned when the upstream answered with an unusable body.
pub const MALFORMED_PAYLOAD_MESSAGE: &str = "Upstream returned an unexpected payload.";

/// Status code served for an outcome.
#[must_use]
pub const fn status_for(kind: OutcomeKind) -> StatusCode {
    match kind {
        OutcomeKind::Success => StatusCode::OK,
        OutcomeKind::RateLimited => StatusCode::TOO_MANY_REQUESTS,
        OutcomeKind::TransportFailure => StatusCode::SERVICE_UNAVAILABLE,
        OutcomeKind::MalformedPayload => StatusCode::BAD_GATEWAY,
    }
}

/// Error body for a failed quote request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Human-readable summary.
    pub error: String,
    /// Underlying cause, when one is known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Split an outcome into the quote set or the error body to serve instead.
///
/// # Errors
///
/// Returns the error body for every failed outcome.
pub fn quotes_or_error(outcome: FetchOutcome) -> Result<PriceQuoteSet, ErrorResponse> {
    let (error, details) = match outcome {
        FetchOutcome::Success(quotes) => return Ok(quotes),
        FetchOutcome::RateLimited => (RATE_LIMITED_MESSAGE, None),
        FetchOutcome::TransportFailure(details) => (TRANSPORT_FAILURE_MESSAGE, Some(details)),
        FetchOutcome::MalformedPayload(details) => (MALFORMED_PAYLOAD_MESSAGE, Some(details)),
    };
    Err(ErrorResponse {
        error: error.to_string(),
        details,
    })
}

/// Body of `GET /`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WelcomeResponse {
    /// Greeting.
    pub message: String,
    /// Absolute URL of the API index.
    pub api_root: String,
}

/// Body of `GET /api/`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiIndexResponse {
    /// Greeting.
    pub message: String,
    /// Absolute URL of this index.
    pub api_root: String,
    /// Absolute URLs of the served endpoints.
    pub endpoints: EndpointLinks,
}

/// Links listed by the API index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointLinks {
    /// JSON quote endpoint.
    #[serde(rename = "Crypto Prices API")]
    pub crypto_prices: String,
    /// HTML chart endpoint.
    #[serde(rename = "Crypto Chart")]
    pub crypto_chart: String,
    /// Health endpoint.
    #[serde(rename = "Health")]
    pub health: String,
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    #[test_case(OutcomeKind::Success, StatusCode::OK)]
    #[test_case(OutcomeKind::RateLimited, StatusCode::TOO_MANY_REQUESTS)]
    #[test_case(OutcomeKind::TransportFailure, StatusCode::SERVICE_UNAVAILABLE)]
    #[test_case(OutcomeKind::MalformedPayload, StatusCode::BAD_GATEWAY)]
    fn status_mapping(kind: OutcomeKind, expected: StatusCode) {
        assert_eq!(status_for(kind), expected);
    }

    #[test]
    fn success_passes_quotes_through() {
        let outcome = FetchOutcome::Success(PriceQuoteSet::new());
        assert_eq!(quotes_or_error(outcome), Ok(PriceQuoteSet::new()));
    }

    #[test]
    fn rate_limited_body_has_no_details() {
        let body = quotes_or_error(FetchOutcome::RateLimited).unwrap_err();
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({"error": "Rate limit exceeded. Please try again later."})
        );
    }

    #[test]
    fn transport_failure_body_carries_details() {
        let outcome = FetchOutcome::TransportFailure("request timed out after 5s".to_string());
        let body = quotes_or_error(outcome).unwrap_err();
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({
                "error": "Failed to fetch crypto prices.",
                "details": "request timed out after 5s"
            })
        );
    }

    #[test]
    fn index_links_use_display_names() {
        let links = EndpointLinks {
            crypto_prices: "http://h/api/crypto-prices/".to_string(),
            crypto_chart: "http://h/api/crypto-chart/".to_string(),
            health: "http://h/health".to_string(),
        };
        let value = serde_json::to_value(&links).unwrap();
        assert_eq!(value["Crypto Prices API"], "http://h/api/crypto-prices/");
        assert_eq!(value["Crypto Chart"], "http://h/api/crypto-chart/");
    }
}

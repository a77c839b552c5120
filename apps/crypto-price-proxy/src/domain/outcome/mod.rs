//! Fetch Outcomes
//!
//! The result of asking for the current quote set. Failures are values,
//! not errors: every caller branches on the outcome kind and decides how
//! to present it.
//!
//! [`classify_payload`] turns the body of a successful (2xx) upstream
//! response into an outcome. Transport-level failures never reach it.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::quotes::PriceQuoteSet;

/// Result of a single `get_quotes` call.
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub enum FetchOutcome {
    /// Quotes served from cache or freshly fetched.
    Success(PriceQuoteSet),
    /// Upstream answered 2xx but signalled quota exhaustion.
    RateLimited,
    /// Timeout, connection failure or non-2xx status.
    TransportFailure(String),
    /// Upstream answered 2xx with a body that is not a usable quote set.
    MalformedPayload(String),
}

impl FetchOutcome {
    /// The kind of this outcome, without its payload.
    pub const fn kind(&self) -> OutcomeKind {
        match self {
            Self::Success(_) => OutcomeKind::Success,
            Self::RateLimited => OutcomeKind::RateLimited,
            Self::TransportFailure(_) => OutcomeKind::TransportFailure,
            Self::MalformedPayload(_) => OutcomeKind::MalformedPayload,
        }
    }

    /// Whether quotes are available.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// The quotes, when successful.
    #[must_use]
    pub const fn quotes(&self) -> Option<&PriceQuoteSet> {
        match self {
            Self::Success(quotes) => Some(quotes),
            _ => None,
        }
    }
}

/// Discriminant of [`FetchOutcome`], used for stats and metric labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    /// See [`FetchOutcome::Success`].
    Success,
    /// See [`FetchOutcome::RateLimited`].
    RateLimited,
    /// See [`FetchOutcome::TransportFailure`].
    TransportFailure,
    /// See [`FetchOutcome::MalformedPayload`].
    MalformedPayload,
}

impl OutcomeKind {
    /// Label used in logs and metrics.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::RateLimited => "rate_limited",
            Self::TransportFailure => "transport_failure",
            Self::MalformedPayload => "malformed_payload",
        }
    }

    /// Whether this kind is a failure.
    #[must_use]
    pub const fn is_failure(self) -> bool {
        !matches!(self, Self::Success)
    }
}

// =============================================================================
// Classification
// =============================================================================

/// CoinGecko reports quota exhaustion either as a top-level `error_code`
/// or nested under `status`.
fn has_error_code(payload: &Value) -> bool {
    payload.get("error_code").is_some()
        || payload
            .get("status")
            .is_some_and(|status| status.get("error_code").is_some())
}

/// Classify a 2xx upstream body.
///
/// - a body carrying `error_code` is [`FetchOutcome::RateLimited`];
/// - a body that does not parse as a quote set, or in which any asset lacks
///   a price in `currency`, is [`FetchOutcome::MalformedPayload`];
/// - anything else is [`FetchOutcome::Success`].
pub fn classify_payload(body: &[u8], currency: &str) -> FetchOutcome {
    // `Value` keeps object order (serde_json `preserve_order`).
    let payload: Value = match serde_json::from_slice(body) {
        Ok(payload) => payload,
        Err(e) => return FetchOutcome::MalformedPayload(format!("invalid quote payload: {e}")),
    };

    if has_error_code(&payload) {
        return FetchOutcome::RateLimited;
    }

    let quotes = match PriceQuoteSet::deserialize(&payload) {
        Ok(quotes) => quotes,
        Err(e) => return FetchOutcome::MalformedPayload(format!("invalid quote payload: {e}")),
    };

    if let Some(asset) = quotes.first_missing_price(currency) {
        return FetchOutcome::MalformedPayload(format!("asset '{asset}' has no {currency} price"));
    }

    FetchOutcome::Success(quotes)
}

// =============================================================================
// Tests
// =============================================================================

// =============================================================================
// Error types — engine contract, ingest, upstream storage, API mapping
// =============================================================================
//
// The indicator engine is pure computation: its errors are either bad input
// (`Validation`, `InvalidPeriod`) or contract violations between engine and
// store (`ColumnNotFound`, `LengthMismatch`). The latter two are bugs and are
// never retried. Upstream I/O lives in `StorageError`; the HTTP layer folds
// everything into `ApiError` for status-code mapping.
// =============================================================================

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

// =============================================================================
// Engine errors
// =============================================================================

/// Errors produced by the price-series store and the indicator functions.
#[derive(Debug, Error, PartialEq)]
pub enum EngineError {
    /// Input bars are malformed or out of order. Aborts the whole symbol.
    #[error("bar validation failed: {0}")]
    Validation(String),

    /// Indicator period is outside `1..=bar_count`. Aborts that indicator only.
    #[error("invalid period {period} for a series of {len} bars")]
    InvalidPeriod { period: usize, len: usize },

    /// A column was requested that was never computed. Engine bug.
    #[error("unknown indicator column `{0}`")]
    ColumnNotFound(String),

    /// A column write did not match the bar count. Engine bug.
    #[error("column `{name}` has {got} values for a series of {expected} bars")]
    LengthMismatch {
        name: String,
        got: usize,
        expected: usize,
    },
}

// =============================================================================
// Ingest errors
// =============================================================================

/// Errors from the blob-payload repair and parse stage.
#[derive(Debug, Error)]
pub enum IngestError {
    /// The payload ends in the middle of a backslash escape.
    #[error("truncated escape sequence at byte offset {0}")]
    TruncatedEscape(usize),

    /// A `\uXXXX` / `\xNN` escape did not contain valid hex digits.
    #[error("invalid escape sequence at byte offset {0}")]
    InvalidEscape(usize),

    /// The repaired text still failed to parse as a JSON bar array.
    #[error("repaired payload is not a valid bar array: {0}")]
    Parse(#[from] serde_json::Error),
}

// =============================================================================
// Storage errors
// =============================================================================

/// Errors from the upstream blob store client.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The blob for the requested symbol does not exist upstream.
    #[error("blob `{0}` not found upstream")]
    BlobNotFound(String),

    /// Transport-level failure (DNS, TLS, timeout, connection reset).
    #[error("upstream request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The store answered with a non-success status other than 404.
    #[error("upstream returned {status}: {body}")]
    Status { status: u16, body: String },
}

// =============================================================================
// API error — HTTP status mapping
// =============================================================================

/// Unified error type for API responses.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("missing required query parameter `symbol`")]
    MissingSymbol,

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Ingest(#[from] IngestError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::MissingSymbol => StatusCode::BAD_REQUEST,
            // Bad input data for the requested symbol.
            Self::Engine(EngineError::Validation(_)) | Self::Ingest(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            // Contract violations inside the engine are our bugs.
            Self::Engine(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Storage(StorageError::BlobNotFound(_)) => StatusCode::NOT_FOUND,
            Self::Storage(_) => StatusCode::BAD_GATEWAY,
        };

        let body = json!({ "error": self.to_string() });
        (status, axum::Json(body)).into_response()
    }
}

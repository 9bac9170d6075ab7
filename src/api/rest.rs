// =============================================================================
// REST API Endpoints — Axum 0.7
// =============================================================================
//
// All endpoints live under `/api/v1/`. Both are public: a health probe and
// the prices endpoint, which takes a single `symbol` query parameter and
// answers with the enriched record array.
//
// CORS is configured permissively for development; tighten `allowed_origins`
// in production.
// =============================================================================

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tower_http::cors::{Any, CorsLayer};
use tracing::{debug, info, warn};

use crate::app_state::AppState;
use crate::config::Config;
use crate::error::{ApiError, EngineError};
use crate::indicators::{apply_ema, apply_rsi, apply_sma};
use crate::ingest;
use crate::series::PriceSeries;
use crate::types::{Bar, BarField};

// =============================================================================
// Router construction
// =============================================================================

/// Build the full REST API router with CORS middleware and shared state.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/v1/health", get(health))
        .route("/api/v1/prices", get(prices))
        .layer(cors)
        .with_state(state)
}

// =============================================================================
// Health
// =============================================================================

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    requests_served: u64,
    cached_symbols: usize,
    server_time: i64,
}

async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let resp = HealthResponse {
        status: "ok",
        requests_served: state.requests_served(),
        cached_symbols: state.cache.len(),
        server_time: chrono::Utc::now().timestamp_millis(),
    };
    Json(resp)
}

// =============================================================================
// Prices
// =============================================================================

#[derive(Deserialize)]
struct PricesQuery {
    symbol: Option<String>,
}

/// GET /api/v1/prices?symbol=MSFT
///
/// Fetches the symbol's raw price-history blob, repairs and parses it,
/// computes the configured indicator columns, and returns one JSON object per
/// bar. Served from cache when a fresh copy exists.
async fn prices(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PricesQuery>,
) -> Result<Json<Vec<Value>>, ApiError> {
    let symbol = normalize_symbol(query.symbol.as_deref()).ok_or(ApiError::MissingSymbol)?;
    info!(%symbol, "symbol captured");

    if let Some(records) = state.cache.get(&symbol) {
        debug!(%symbol, "serving cached records");
        return Ok(Json(records.as_ref().clone()));
    }

    let raw = state.storage.fetch_blob(&symbol).await?;
    let bars = ingest::parse_bars(&raw)?;
    info!(%symbol, bars = bars.len(), "price data captured");

    let records = Arc::new(enrich(bars, &state.config)?);
    state.cache.insert(&symbol, records.clone());
    let served = state.record_served();
    debug!(%symbol, served, "request complete");

    Ok(Json(records.as_ref().clone()))
}

/// Trim and upper-case the symbol; empty or absent yields `None`.
fn normalize_symbol(raw: Option<&str>) -> Option<String> {
    let s = raw?.trim();
    if s.is_empty() {
        None
    } else {
        Some(s.to_uppercase())
    }
}

/// Load the series and attach every configured indicator column.
///
/// An out-of-bounds period aborts only that indicator — the column is simply
/// absent from the output and the skip is logged. Any other engine error is a
/// contract violation and propagates.
fn enrich(bars: Vec<Bar>, config: &Config) -> Result<Vec<Value>, EngineError> {
    let mut series = PriceSeries::load(bars, config.bar_ordering)?;
    let ind = &config.indicators;

    let outcomes = [
        ("rsi", apply_rsi(&mut series, ind.rsi_period, BarField::Close)),
        ("sma", apply_sma(&mut series, ind.sma_period, BarField::Close)),
        (
            "ema",
            apply_ema(&mut series, ind.ema_period, ind.ema_alpha, BarField::Close),
        ),
    ];

    for (name, outcome) in outcomes {
        match outcome {
            Ok(()) => debug!(indicator = name, "column computed"),
            Err(err @ EngineError::InvalidPeriod { .. }) => {
                warn!(indicator = name, error = %err, "indicator skipped");
            }
            Err(err) => return Err(err),
        }
    }

    Ok(series.to_records())
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Bar;

    /// Raw upstream-shaped blob bytes: BOM + CRLF-joined record lines.
    fn feed_bytes(closes: &[f64]) -> Vec<u8> {
        let mut raw = vec![0xEF, 0xBB, 0xBF];
        for (i, close) in closes.iter().enumerate() {
            let line = format!(
                r#"{{"timestamp":"2021-03-{:02}","open":{close},"high":{close},"low":{close},"close":{close},"volume":10}}"#,
                i + 1
            );
            raw.extend_from_slice(line.as_bytes());
            raw.extend_from_slice(b"\r\n");
        }
        raw
    }

    fn small_config() -> Config {
        let mut config = Config::default();
        config.indicators.rsi_period = 2;
        config.indicators.sma_period = 3;
        config.indicators.ema_period = 2;
        config.indicators.ema_alpha = 0.5;
        config
    }

    // ---- normalize_symbol --------------------------------------------------

    #[test]
    fn symbol_is_trimmed_and_uppercased() {
        assert_eq!(normalize_symbol(Some(" msft ")), Some("MSFT".into()));
        assert_eq!(normalize_symbol(Some("")), None);
        assert_eq!(normalize_symbol(Some("   ")), None);
        assert_eq!(normalize_symbol(None), None);
    }

    // ---- enrich ------------------------------------------------------------

    #[test]
    fn enrich_attaches_all_three_columns() {
        let bars = ingest::parse_bars(&feed_bytes(&[1.0, 2.0, 3.0, 4.0, 5.0])).unwrap();
        let records = enrich(bars, &small_config()).unwrap();

        assert_eq!(records.len(), 5);
        // SMA(3) over [1..5]: markers then 2, 3, 4.
        assert_eq!(records[1]["sma"], Value::Null);
        assert_eq!(records[2]["sma"], 2.0);
        assert_eq!(records[4]["sma"], 4.0);
        // EMA(2, 0.5): seed 1.5 at index 1, then the recurrence.
        assert_eq!(records[0]["ema"], Value::Null);
        assert_eq!(records[1]["ema"], 1.5);
        assert_eq!(records[2]["ema"], 2.25);
        // RSI(2): strictly rising closes pin at 100 from index 2 on.
        assert_eq!(records[1]["rsi"], Value::Null);
        assert_eq!(records[2]["rsi"], 100.0);
        assert_eq!(records[4]["rsi"], 100.0);
    }

    #[test]
    fn enrich_skips_oversized_periods_but_keeps_the_rest() {
        // Five bars against the production defaults: RSI(14), SMA(100) and
        // EMA(50) are all out of bounds, so no columns — but no failure.
        let bars = ingest::parse_bars(&feed_bytes(&[1.0, 2.0, 3.0, 4.0, 5.0])).unwrap();
        let records = enrich(bars, &Config::default()).unwrap();
        assert_eq!(records.len(), 5);
        assert!(records[0].get("rsi").is_none());
        assert!(records[0].get("sma").is_none());
        assert!(records[0].get("ema").is_none());

        // One oversized period only skips that one column.
        let mut config = small_config();
        config.indicators.sma_period = 99;
        let bars = ingest::parse_bars(&feed_bytes(&[1.0, 2.0, 3.0, 4.0, 5.0])).unwrap();
        let records = enrich(bars, &config).unwrap();
        assert!(records[0].get("sma").is_none());
        assert!(records[0].get("rsi").is_some());
        assert!(records[0].get("ema").is_some());
    }

    #[test]
    fn enrich_rejects_unordered_bars() {
        let mut raw = feed_bytes(&[1.0, 2.0]);
        // Append a record whose timestamp rewinds.
        raw.extend_from_slice(
            br#"{"timestamp":"2021-02-01","open":3.0,"high":3.0,"low":3.0,"close":3.0,"volume":10}"#,
        );
        raw.extend_from_slice(b"\r\n");
        let bars = ingest::parse_bars(&raw).unwrap();
        assert!(matches!(
            enrich(bars, &small_config()).unwrap_err(),
            EngineError::Validation(_)
        ));
    }

    // ---- round trip --------------------------------------------------------

    #[test]
    fn ingest_compute_serialize_reparse_round_trip() {
        let closes = [1.0, 2.0, 3.0, 4.0, 5.0, 4.0, 3.5, 4.5];
        let bars = ingest::parse_bars(&feed_bytes(&closes)).unwrap();
        let records = enrich(bars.clone(), &small_config()).unwrap();

        let body = serde_json::to_string(&records).unwrap();
        let reparsed: Vec<Value> = serde_json::from_str(&body).unwrap();
        assert_eq!(reparsed, records);

        // The original bar fields survive the trip byte-for-byte enough to
        // re-deserialize as bars (extra indicator keys are ignored).
        let bars_again: Vec<Bar> = serde_json::from_str(&body).unwrap();
        assert_eq!(bars_again, bars);

        // Marker positions are stable: recompute from the reparsed values.
        let records_again = enrich(bars_again, &small_config()).unwrap();
        for (a, b) in records.iter().zip(records_again.iter()) {
            for key in ["rsi", "sma", "ema"] {
                match (a[key].as_f64(), b[key].as_f64()) {
                    (Some(x), Some(y)) => assert!((x - y).abs() < 1e-9),
                    (None, None) => {}
                    other => panic!("marker mismatch for {key}: {other:?}"),
                }
            }
        }
    }
}

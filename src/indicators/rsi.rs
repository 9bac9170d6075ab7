// =============================================================================
// Relative Strength Index (RSI) — Wilder's Smoothing
// =============================================================================
//
// Step 1 — Signed deltas between consecutive values: d[i] = x[i] - x[i-1].
// Step 2 — Seed average gain / average loss with the simple mean of the first
//          `period` gains / losses.
// Step 3 — Wilder's smoothing for every later delta:
//            avg_gain = (prev_avg_gain * (period - 1) + gain) / period
//            avg_loss = (prev_avg_loss * (period - 1) + loss) / period
// Step 4 — RS  = avg_gain / avg_loss
//          RSI = 100 - 100 / (1 + RS)
//
// When avg_loss is zero the series had no down moves inside the window and
// RSI is 100 by definition, never a division by zero. The first `period`
// entries of the column are markers: `period` deltas are consumed before the
// averages exist, so the first value lands at index `period`.

use crate::error::EngineError;
use crate::indicators::check_period;
use crate::series::PriceSeries;
use crate::types::BarField;

/// Column name written by [`apply_rsi`].
pub const RSI_COLUMN: &str = "rsi";

/// Compute the full RSI column for `values` using Wilder's smoothing.
///
/// Indices `0..period` hold `None`; later indices hold RSI in `[0, 100]`.
/// With `period == values.len()` the column is valid but entirely markers —
/// there are only `period - 1` deltas, not enough to seed the averages.
///
/// # Errors
/// `EngineError::InvalidPeriod` when `period < 1` or `period > values.len()`.
pub fn calculate_rsi(values: &[f64], period: usize) -> Result<Vec<Option<f64>>, EngineError> {
    check_period(period, values.len())?;

    let mut column = vec![None; values.len()];
    if values.len() < period + 1 {
        return Ok(column);
    }

    let period_f = period as f64;

    // Seed with the simple mean of the first `period` gains / losses.
    let mut sum_gain = 0.0_f64;
    let mut sum_loss = 0.0_f64;
    for i in 1..=period {
        let delta = values[i] - values[i - 1];
        if delta > 0.0 {
            sum_gain += delta;
        } else {
            sum_loss += delta.abs();
        }
    }
    let mut avg_gain = sum_gain / period_f;
    let mut avg_loss = sum_loss / period_f;
    column[period] = Some(rsi_from_averages(avg_gain, avg_loss));

    // Wilder's smoothing for the rest of the series.
    for i in (period + 1)..values.len() {
        let delta = values[i] - values[i - 1];
        let gain = if delta > 0.0 { delta } else { 0.0 };
        let loss = if delta < 0.0 { delta.abs() } else { 0.0 };

        avg_gain = (avg_gain * (period_f - 1.0) + gain) / period_f;
        avg_loss = (avg_loss * (period_f - 1.0) + loss) / period_f;
        column[i] = Some(rsi_from_averages(avg_gain, avg_loss));
    }

    Ok(column)
}

/// Compute the RSI over `field` and commit it as the `"rsi"` column.
pub fn apply_rsi(
    series: &mut PriceSeries,
    period: usize,
    field: BarField,
) -> Result<(), EngineError> {
    let values = series.field_values(field);
    let column = calculate_rsi(&values, period)?;
    series.set_column(RSI_COLUMN, column)
}

/// Convert average gain / average loss into an RSI value in [0, 100].
/// `avg_loss == 0` means no down moves in the window: RSI is 100.
fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        return 100.0;
    }
    let rs = avg_gain / avg_loss;
    100.0 - 100.0 / (1.0 + rs)
}

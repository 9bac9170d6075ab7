// =============================================================================
// Simple Moving Average (SMA)
// =============================================================================
//
// SMA[i] = mean of the trailing `period` values ending at i. Maintained with
// a running sum, one pass, O(n) regardless of period.

use crate::error::EngineError;
use crate::indicators::check_period;
use crate::series::PriceSeries;
use crate::types::BarField;

/// Column name written by [`apply_sma`].
pub const SMA_COLUMN: &str = "sma";

/// Compute the full SMA column for `values`.
///
/// Indices below `period - 1` hold `None` (insufficient history); every later
/// index holds the arithmetic mean of the trailing `period` values.
///
/// # Errors
/// `EngineError::InvalidPeriod` when `period < 1` or `period > values.len()`.
pub fn calculate_sma(values: &[f64], period: usize) -> Result<Vec<Option<f64>>, EngineError> {
    check_period(period, values.len())?;

    let mut column = vec![None; values.len()];
    let mut running = 0.0_f64;

    for (i, &v) in values.iter().enumerate() {
        running += v;
        if i >= period {
            running -= values[i - period];
        }
        if i + 1 >= period {
            column[i] = Some(running / period as f64);
        }
    }

    Ok(column)
}

/// Compute the SMA over `field` and commit it as the `"sma"` column.
pub fn apply_sma(
    series: &mut PriceSeries,
    period: usize,
    field: BarField,
) -> Result<(), EngineError> {
    let values = series.field_values(field);
    let column = calculate_sma(&values, period)?;
    series.set_column(SMA_COLUMN, column)
}

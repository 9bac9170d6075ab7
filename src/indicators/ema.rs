// =============================================================================
// Exponential Moving Average (EMA)
// =============================================================================
//
// The first EMA value sits at index `period - 1` and is seeded with the SMA
// of the first `period` values. From index `period` onward:
//
//   EMA[i] = alpha * x[i] + (1 - alpha) * EMA[i-1]
//
// `alpha` is caller-supplied rather than derived from the period. The caller
// owns consistency between `period` and `alpha` (the conventional smoothing
// is `alpha = 2 / (period + 1)`; the upstream feed pipeline uses `1/period`).

use crate::error::EngineError;
use crate::indicators::check_period;
use crate::series::PriceSeries;
use crate::types::BarField;

/// Column name written by [`apply_ema`].
pub const EMA_COLUMN: &str = "ema";

/// Compute the full EMA column for `values`.
///
/// Indices below `period - 1` hold `None`; index `period - 1` holds the SMA
/// seed; later indices follow the smoothing recurrence.
///
/// # Errors
/// `EngineError::InvalidPeriod` when `period < 1` or `period > values.len()`.
pub fn calculate_ema(
    values: &[f64],
    period: usize,
    alpha: f64,
) -> Result<Vec<Option<f64>>, EngineError> {
    check_period(period, values.len())?;

    let mut column = vec![None; values.len()];

    let seed = values[..period].iter().sum::<f64>() / period as f64;
    column[period - 1] = Some(seed);

    let mut prev = seed;
    for (i, &v) in values.iter().enumerate().skip(period) {
        prev = alpha * v + (1.0 - alpha) * prev;
        column[i] = Some(prev);
    }

    Ok(column)
}

/// Compute the EMA over `field` and commit it as the `"ema"` column.
pub fn apply_ema(
    series: &mut PriceSeries,
    period: usize,
    alpha: f64,
    field: BarField,
) -> Result<(), EngineError> {
    let values = series.field_values(field);
    let column = calculate_ema(&values, period, alpha)?;
    series.set_column(EMA_COLUMN, column)
}

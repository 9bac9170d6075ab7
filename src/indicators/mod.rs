// =============================================================================
// Technical Indicators Module
// =============================================================================
//
// Pure, side-effect-free indicator math over a `PriceSeries`. Each indicator
// comes in two layers: `calculate_*` produces a full-length column (`None`
// where history is insufficient) from a raw value slice, and `apply_*` reads
// the configured bar field from the store and commits the finished column via
// `set_column`. Nothing is written until the whole column exists.

pub mod ema;
pub mod rsi;
pub mod sma;

pub use ema::{apply_ema, calculate_ema};
pub use rsi::{apply_rsi, calculate_rsi};
pub use sma::{apply_sma, calculate_sma};

use crate::error::EngineError;

/// Shared period guard: every indicator rejects `period < 1` and
/// `period > len` before doing any work.
pub(crate) fn check_period(period: usize, len: usize) -> Result<(), EngineError> {
    if period < 1 || period > len {
        return Err(EngineError::InvalidPeriod { period, len });
    }
    Ok(())
}

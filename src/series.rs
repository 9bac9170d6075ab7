// =============================================================================
// PriceSeries — ordered bars plus named indicator columns
// =============================================================================
//
// The store owns one symbol's bars and every computed column. Columns are
// always exactly as long as the bar list; positions without enough history
// hold `None`. Rows are fixed after load; columns may be added or replaced.
//
// Not internally synchronized — one writer at a time. The request handler
// builds one `PriceSeries` per request and never shares it across tasks.
// =============================================================================

use std::collections::BTreeMap;

use serde_json::{json, Value};

use crate::error::EngineError;
use crate::types::{Bar, BarField, BarOrdering};

/// Ordered price bars for a single symbol plus computed indicator columns.
#[derive(Debug, Clone)]
pub struct PriceSeries {
    bars: Vec<Bar>,
    // BTreeMap keeps record keys deterministic in the serialized output.
    columns: BTreeMap<String, Vec<Option<f64>>>,
}

impl PriceSeries {
    // -------------------------------------------------------------------------
    // Construction
    // -------------------------------------------------------------------------

    /// Build a series from ingested bars.
    ///
    /// Bars must be strictly ordered by timestamp in the declared direction;
    /// every price field must be finite and non-negative. Descending input is
    /// reversed so the stored series is always oldest-first.
    ///
    /// # Errors
    /// `EngineError::Validation` on any ordering or numeric violation.
    pub fn load(mut bars: Vec<Bar>, ordering: BarOrdering) -> Result<Self, EngineError> {
        if ordering == BarOrdering::Descending {
            bars.reverse();
        }

        for (i, bar) in bars.iter().enumerate() {
            for (name, v) in [
                ("open", bar.open),
                ("high", bar.high),
                ("low", bar.low),
                ("close", bar.close),
            ] {
                if !v.is_finite() {
                    return Err(EngineError::Validation(format!(
                        "bar {i}: `{name}` is not finite"
                    )));
                }
                if v < 0.0 {
                    return Err(EngineError::Validation(format!(
                        "bar {i}: `{name}` is negative ({v})"
                    )));
                }
            }
            if i > 0 && bars[i - 1].timestamp >= bar.timestamp {
                return Err(EngineError::Validation(format!(
                    "bars {} and {i} are not strictly ordered by timestamp",
                    i - 1
                )));
            }
        }

        Ok(Self {
            bars,
            columns: BTreeMap::new(),
        })
    }

    // -------------------------------------------------------------------------
    // Bar access
    // -------------------------------------------------------------------------

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    /// Extract one field across all bars, oldest-first.
    pub fn field_values(&self, field: BarField) -> Vec<f64> {
        self.bars.iter().map(|b| field.value(b)).collect()
    }

    /// The `size` most recent bars up to and including `end_index`.
    ///
    /// Returns fewer bars when there is not enough history, and an empty
    /// slice for an empty series. `end_index` past the last bar is clamped.
    pub fn window(&self, end_index: usize, size: usize) -> &[Bar] {
        if self.bars.is_empty() || size == 0 {
            return &[];
        }
        let end = end_index.min(self.bars.len() - 1);
        let start = (end + 1).saturating_sub(size);
        &self.bars[start..=end]
    }

    // -------------------------------------------------------------------------
    // Columns
    // -------------------------------------------------------------------------

    /// Read a computed column.
    ///
    /// # Errors
    /// `EngineError::ColumnNotFound` when no column of that name exists.
    pub fn get_column(&self, name: &str) -> Result<&[Option<f64>], EngineError> {
        self.columns
            .get(name)
            .map(Vec::as_slice)
            .ok_or_else(|| EngineError::ColumnNotFound(name.to_string()))
    }

    /// Write (or overwrite) a column. The whole column is committed at once;
    /// indicator functions compute into a buffer first, so a failed
    /// computation never leaves a partial column behind.
    ///
    /// # Errors
    /// `EngineError::LengthMismatch` unless `values.len()` equals the bar count.
    pub fn set_column(
        &mut self,
        name: impl Into<String>,
        values: Vec<Option<f64>>,
    ) -> Result<(), EngineError> {
        let name = name.into();
        if values.len() != self.bars.len() {
            return Err(EngineError::LengthMismatch {
                name,
                got: values.len(),
                expected: self.bars.len(),
            });
        }
        self.columns.insert(name, values);
        Ok(())
    }

    /// Names of the columns computed so far, in output order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    // -------------------------------------------------------------------------
    // Serialization
    // -------------------------------------------------------------------------

    /// One JSON object per bar: the bar's own fields plus every computed
    /// column under its name. Marker positions serialize as `null`.
    pub fn to_records(&self) -> Vec<Value> {
        self.bars
            .iter()
            .enumerate()
            .map(|(i, bar)| {
                let mut obj = serde_json::Map::new();
                obj.insert(
                    "timestamp".into(),
                    json!(bar
                        .timestamp
                        .to_rfc3339_opts(chrono::SecondsFormat::Secs, true)),
                );
                obj.insert("open".into(), json!(bar.open));
                obj.insert("high".into(), json!(bar.high));
                obj.insert("low".into(), json!(bar.low));
                obj.insert("close".into(), json!(bar.close));
                obj.insert("volume".into(), json!(bar.volume));
                for (name, col) in &self.columns {
                    let cell = match col[i] {
                        Some(v) if v.is_finite() => json!(v),
                        _ => Value::Null,
                    };
                    obj.insert(name.clone(), cell);
                }
                Value::Object(obj)
            })
            .collect()
    }
}

// =============================================================================
// Shared types — price bars and their addressing
// =============================================================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One OHLCV observation from the upstream price feed.
///
/// Field names are case-sensitive and match the feed exactly. The feed is not
/// consistent about timestamp encoding, so `timestamp` accepts RFC 3339
/// strings, bare `YYYY-MM-DD` dates (midnight UTC), or epoch milliseconds;
/// it always serializes back out as RFC 3339.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    #[serde(with = "flexible_timestamp")]
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

/// Which bar field an indicator reads its input from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BarField {
    Open,
    High,
    Low,
    Close,
    Volume,
}

impl Default for BarField {
    fn default() -> Self {
        Self::Close
    }
}

impl BarField {
    /// Extract this field's value from a bar as `f64`.
    pub fn value(&self, bar: &Bar) -> f64 {
        match self {
            Self::Open => bar.open,
            Self::High => bar.high,
            Self::Low => bar.low,
            Self::Close => bar.close,
            Self::Volume => bar.volume as f64,
        }
    }
}

impl std::fmt::Display for BarField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open => write!(f, "open"),
            Self::High => write!(f, "high"),
            Self::Low => write!(f, "low"),
            Self::Close => write!(f, "close"),
            Self::Volume => write!(f, "volume"),
        }
    }
}

/// Chronological direction of the ingested feed. The stored series is always
/// ascending; descending input is reversed at load time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BarOrdering {
    Ascending,
    Descending,
}

impl Default for BarOrdering {
    fn default() -> Self {
        Self::Ascending
    }
}

// =============================================================================
// Timestamp (de)serialization
// =============================================================================

mod flexible_timestamp {
    use chrono::{DateTime, NaiveDate, SecondsFormat, TimeZone, Utc};
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::Secs, true))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Millis(i64),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Millis(ms) => Utc
                .timestamp_millis_opt(ms)
                .single()
                .ok_or_else(|| de::Error::custom(format!("epoch millis out of range: {ms}"))),
            Raw::Text(s) => {
                if let Ok(dt) = DateTime::parse_from_rfc3339(&s) {
                    return Ok(dt.with_timezone(&Utc));
                }
                if let Ok(d) = NaiveDate::parse_from_str(&s, "%Y-%m-%d") {
                    // Date-only feeds mean midnight UTC.
                    return Ok(d.and_hms_opt(0, 0, 0).unwrap().and_utc());
                }
                Err(de::Error::custom(format!("unparseable timestamp `{s}`")))
            }
        }
    }
}

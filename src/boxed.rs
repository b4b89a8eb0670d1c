//! The boxed record stored in the cache, and its wire codec.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                     Boxed<T> lifecycle                           │
//! │                                                                  │
//! │  source load ──► Boxed::now(value) ──► direct store: Arc<Boxed>  │
//! │                        │                                         │
//! │                        └─────────────► text store: to_json()     │
//! │                                            │                     │
//! │  cache read  ◄── from_json() ◄─────────────┘                     │
//! │                                                                  │
//! │  Wire shape: {"T": <value>, "Timestamp": <unix seconds>}         │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Key Concepts
//!
//! - The timestamp is written at box creation and is the only freshness
//!   signal the policies consult; store-level TTL is a safety net.
//! - `Timestamp == 0` is reserved for "never written". A successful path
//!   never produces it, and readers treat it as unusable.
//! - Decoding rejects unknown fields (schema drift) and negative
//!   timestamps.
//!
//! ## Example Usage
//!
//! ```
//! use cachefront::boxed::Boxed;
//!
//! let boxed = Boxed::now(7_i64);
//! let wire = boxed.to_json().unwrap();
//! let back: Boxed<i64> = Boxed::from_json(&wire).unwrap();
//! assert_eq!(back, boxed);
//! ```

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::CacheError;

/// Seconds since the Unix epoch.
pub(crate) fn unix_now() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}

/// A cached value together with its creation time.
///
/// The canonical in-cache record. Serializes to a JSON object with exactly
/// two fields, `"T"` and `"Timestamp"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Boxed<T> {
    /// The cached value.
    #[serde(rename = "T")]
    pub value: T,
    /// Creation time in seconds since the Unix epoch. `0` means "never
    /// written".
    #[serde(rename = "Timestamp")]
    pub timestamp: i64,
}

impl<T> Boxed<T> {
    /// Boxes a value stamped with the current wall clock.
    pub fn now(value: T) -> Self {
        Self {
            value,
            timestamp: unix_now(),
        }
    }

    /// Age of this record in whole seconds relative to `now`.
    pub fn age(&self, now: i64) -> i64 {
        now - self.timestamp
    }
}

impl<T: Serialize> Boxed<T> {
    /// Serializes the record for a non-direct store.
    pub fn to_json(&self) -> Result<String, CacheError> {
        Ok(serde_json::to_string(self)?)
    }
}

impl<T: DeserializeOwned> Boxed<T> {
    /// Parses a record previously produced by [`to_json`](Self::to_json).
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Unpacking`] on malformed JSON, unknown fields,
    /// or a negative timestamp.
    pub fn from_json(payload: &str) -> Result<Self, CacheError> {
        let boxed: Self = serde_json::from_str(payload)?;
        if boxed.timestamp < 0 {
            return Err(CacheError::Unpacking(format!(
                "negative box timestamp {}",
                boxed.timestamp
            )));
        }
        Ok(boxed)
    }
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Round-tripping preserves value and timestamp exactly.
        #[test]
        fn prop_round_trip_preserves_record(
            value in any::<i64>(),
            timestamp in 0_i64..=i64::MAX / 2,
        ) {
            let boxed = Boxed { value, timestamp };
            let back: Boxed<i64> = Boxed::from_json(&boxed.to_json().unwrap()).unwrap();
            prop_assert_eq!(back, boxed);
        }

        /// String payloads survive arbitrary content.
        #[test]
        fn prop_string_values_round_trip(value in ".*", timestamp in 0_i64..=1 << 40) {
            let boxed = Boxed { value: value.clone(), timestamp };
            let back: Boxed<String> = Boxed::from_json(&boxed.to_json().unwrap()).unwrap();
            prop_assert_eq!(back.value, value);
            prop_assert_eq!(back.timestamp, timestamp);
        }
    }
}

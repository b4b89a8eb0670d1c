//! Store-layer TTL type and wire formatting helpers.
//!
//! ## Key Concepts
//!
//! - [`Ttl`] separates "expire after a duration" from the [`KEEP_TTL`]
//!   sentinel ("do not expire at the store layer") without overloading a
//!   magic duration value.
//! - Remote protocols usually take expiry as an integer. [`use_precise`]
//!   decides whether a duration needs millisecond precision;
//!   [`format_ms`] / [`format_secs`] produce the integer an adapter sends.
//!
//! ## Example Usage
//!
//! ```
//! use std::time::Duration;
//! use cachefront::ttl::{format_ms, format_secs, use_precise, Ttl, KEEP_TTL};
//!
//! assert!(KEEP_TTL.is_keep());
//! assert!(!Ttl::After(Duration::from_secs(5)).is_keep());
//!
//! // Sub-second expiries travel as milliseconds, whole seconds as seconds.
//! assert!(use_precise(Duration::from_millis(250)));
//! assert!(!use_precise(Duration::from_secs(2)));
//! assert_eq!(format_ms(Duration::from_millis(250)), 250);
//! assert_eq!(format_secs(Duration::from_secs(2)), 2);
//! ```

use std::time::Duration;

/// Store-layer expiry for a cache write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ttl {
    /// Never expire at the store layer; business expiry lives in the boxed
    /// record's timestamp.
    Keep,
    /// Expire after the given duration.
    After(Duration),
}

/// Sentinel meaning "no store-layer expiry".
pub const KEEP_TTL: Ttl = Ttl::Keep;

impl Ttl {
    /// Shorthand for an expiry of whole seconds.
    pub fn secs(secs: u64) -> Self {
        Ttl::After(Duration::from_secs(secs))
    }

    /// Shorthand for an expiry of milliseconds.
    pub fn millis(millis: u64) -> Self {
        Ttl::After(Duration::from_millis(millis))
    }

    /// Whether this is the no-expiry sentinel.
    pub fn is_keep(&self) -> bool {
        matches!(self, Ttl::Keep)
    }
}

impl From<Duration> for Ttl {
    fn from(dur: Duration) -> Self {
        Ttl::After(dur)
    }
}

/// Whether a duration requires millisecond precision on the wire.
///
/// True for sub-second durations and durations that are not a whole multiple
/// of a second.
pub fn use_precise(dur: Duration) -> bool {
    dur < Duration::from_secs(1) || dur.subsec_nanos() != 0
}

/// Formats a duration as whole milliseconds for a remote protocol.
///
/// Durations below one millisecond are clamped up to 1 so a positive expiry
/// never truncates to "no expiry".
pub fn format_ms(dur: Duration) -> u64 {
    if dur > Duration::ZERO && dur < Duration::from_millis(1) {
        return 1;
    }
    dur.as_millis() as u64
}

/// Formats a duration as whole seconds for a remote protocol.
///
/// Durations below one second are clamped up to 1.
pub fn format_secs(dur: Duration) -> u64 {
    if dur > Duration::ZERO && dur < Duration::from_secs(1) {
        return 1;
    }
    dur.as_secs()
}

//! # SmartShop Model
//!
//! Record types and pure transforms for the SmartShop sync core.
//!
//! This crate defines:
//! - [`Record`] — the wire/UI shape of a product, free of sync metadata
//! - [`LocalRecord`] — the durable local shape with sync bookkeeping
//! - [`mapper`] — pure bidirectional transforms between the two, including
//!   local id generation for offline-created records
//! - Field validation applied before either store is touched
//!
//! Everything here is pure: no I/O, no shared state, no clocks beyond
//! reading the system time for timestamps and generated ids.

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod mapper;
mod record;
mod validate;

pub use record::{LocalRecord, Record};
pub use validate::{validate, ValidationError};

use std::time::{SystemTime, UNIX_EPOCH};

/// Prefix carried by locally generated temporary ids.
///
/// Local ids are distinguishable from remote-assigned ids only by this
/// convention; both are plain strings everywhere.
pub const LOCAL_ID_PREFIX: &str = "local_";

/// Returns true if `id` was generated locally and has not yet been
/// replaced by a remote-assigned id.
#[must_use]
pub fn is_local_id(id: &str) -> bool {
    id.starts_with(LOCAL_ID_PREFIX)
}

/// Current unix time in milliseconds.
///
/// All timestamps in the system are unix millis; sub-millisecond precision
/// is deliberately dropped so local and remote copies compare equal after a
/// round trip.
#[must_use]
pub fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_id_convention() {
        assert!(is_local_id("local_1700000000000_4821"));
        assert!(!is_local_id("f47ac10b58cc4372a5670e02b2c3d479"));
        assert!(!is_local_id(""));
    }

    #[test]
    fn now_millis_is_monotonic_enough() {
        let a = now_millis();
        let b = now_millis();
        assert!(b >= a);
        assert!(a > 1_600_000_000_000); // sanity: after 2020
    }
}

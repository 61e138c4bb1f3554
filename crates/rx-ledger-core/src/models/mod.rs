//! Domain models for the inventory ledger.

mod alert;
mod batch;
mod forecast;
mod medicine;
mod transaction;

pub use alert::*;
pub use batch::*;
pub use forecast::*;
pub use medicine::*;
pub use transaction::*;

/// Current UTC timestamp in the single text format used throughout the store.
///
/// All timestamps are written from Rust in RFC 3339 (UTC) so that window
/// filters can compare them lexicographically.
pub(crate) fn now_timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}

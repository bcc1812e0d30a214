//! Commission ledger: the persisted per-order money splits and the
//! aggregate queries over them.
//!
//! Stats are computed by summing stored records, never by re-running the
//! receipt calculator at query time.

pub mod sqlite_ledger;
pub mod stats;
pub mod store;

pub use sqlite_ledger::*;
pub use stats::*;
pub use store::*;

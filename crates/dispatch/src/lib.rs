//! Driver dispatch: batch assignment creation, notification fan-out, and the
//! accept-one-wins protocol.
//!
//! Every acceptance race is resolved by a single conditional update at the
//! storage layer. The application never holds a lock across a round trip and
//! never does read-modify-write for acceptance.

pub mod coordinator;
pub mod error;
pub mod notify;
pub mod sqlite_store;
pub mod store;
pub mod sweeper;

pub use coordinator::*;
pub use error::*;
pub use notify::*;
pub use sqlite_store::*;
pub use store::*;
pub use sweeper::*;

//! CourseMax core: delivery pricing, receipt settlement and driver
//! dispatch.
//!
//! This crate wires the pure calculators to their external collaborators:
//! the distance provider feeds the pricing engine through [`QuoteService`],
//! checkout persists each order's money split through [`CheckoutService`],
//! and the dispatch coordinator (re-exported from `coursemax_dispatch`)
//! runs the accept-one-wins protocol.

pub mod checkout;
pub mod quote;

pub use checkout::*;
pub use quote::*;

pub use coursemax_dispatch::{
    AcceptOutcome, AssignmentCoordinator, AssignmentStore, BroadcastNotifier, DispatchConfig,
    DriverNotifier, InMemoryStore, NullNotifier, SqliteStore,
};
pub use coursemax_distance::{DistanceError, DistanceProvider, RetryPolicy, StraightLineProvider};
pub use coursemax_ledger::{CommissionLedger, CommissionStats, InMemoryLedger, SqliteLedger};
pub use coursemax_pricing::{
    calculate_delivery_fee, calculate_receipt, suggested_tips, ReceiptOptions, TipSuggestions,
};
pub use coursemax_types::{
    AssignmentStatus, CartLine, ClientInfo, CommissionRecord, DeliveryFeeRequest,
    DeliveryFeeResponse, DeliveryQuote, DriverAssignment, ReceiptBreakdown, StoreInfo,
};

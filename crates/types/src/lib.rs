pub mod assignment;
pub mod cart;
pub mod commission;
pub mod party;
pub mod quote;
pub mod receipt;

pub use assignment::*;
pub use cart::*;
pub use commission::*;
pub use party::*;
pub use quote::*;
pub use receipt::*;

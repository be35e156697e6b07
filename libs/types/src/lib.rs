//! Types library for the restricted security token and its market
//!
//! This library provides the core type definitions shared by the ledger and
//! market contracts: identifiers, 18-decimal fixed-point amounts, and orders.
//!
//! # Version
//! v1.0.0
//!
//! # Modules
//! - `ids`: Identifiers (Address, TokenId, OrderId)
//! - `numeric`: Fixed-point amounts scaled by 10^18 (Amount, Price)
//! - `order`: Order book intent types
//! - `errors`: Arithmetic and parse error taxonomy

// Public modules
pub mod ids;
pub mod numeric;
pub mod order;
pub mod errors;

// Library version constant
pub const LIB_VERSION: &str = "1.0.0";

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::ids::*;
    pub use crate::numeric::*;
    pub use crate::order::*;
    pub use crate::errors::*;
}

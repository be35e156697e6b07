//! Contract logic for restricted security tokens and their market
//!
//! This crate implements the contract layer: a whitelist-gated token ledger
//! with time-locked vesting, a plain settlement token, and an escrowed order
//! book market with its token registry.
//!
//! # Modules
//! - `events`: Contract events
//! - `errors`: Contract-specific error types
//! - `security`: Role-based access control
//! - `vesting`: Per-account tranche schedules with lazy release
//! - `ledger`: Security token (whitelist, vesting, unlocked balances)
//! - `settlement`: Settlement asset (stable token)
//! - `token`: Fungible-token interface and address directory
//! - `registry`: Listed-token registry
//! - `market`: Order placement with synchronous escrow
//! - `config`: Deployment wiring from JSON
//!
//! # Version
//! v0.1.0

pub mod errors;
pub mod events;
pub mod security;
pub mod vesting;
pub mod token;
pub mod ledger;
pub mod settlement;
pub mod registry;
pub mod market;
pub mod config;

/// Contract ABI version — frozen after release
pub const CONTRACT_ABI_VERSION: &str = "1.0.0";

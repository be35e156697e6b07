//! Contract-specific error types
//!
//! Error taxonomy for ledger, market and deployment operations. Every
//! operation either commits fully or returns one of these with no state
//! change.

use thiserror::Error;
use types::errors::{ArithmeticError, ParseError};

/// Token ledger errors (security token and settlement token)
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LedgerError {
    #[error("Account not whitelisted: {account}")]
    NotWhitelisted { account: String },

    #[error("Insufficient unlocked balance for {account}: required {required}, available {available}")]
    InsufficientUnlockedBalance {
        account: String,
        required: String,
        available: String,
    },

    #[error("Insufficient balance for {account}: required {required}, available {available}")]
    InsufficientBalance {
        account: String,
        required: String,
        available: String,
    },

    #[error("Insufficient allowance from {owner} to {spender}: required {required}, available {available}")]
    InsufficientAllowance {
        owner: String,
        spender: String,
        required: String,
        available: String,
    },

    #[error("Vesting schedule mismatch: {reason}")]
    VestingScheduleMismatch { reason: String },

    #[error("Unauthorized: caller {caller} lacks the required role")]
    Unauthorized { caller: String },

    #[error("Amount must be positive")]
    InvalidAmount,

    #[error("Arithmetic overflow in balance calculation")]
    Overflow,

    #[error("Arithmetic underflow in balance calculation")]
    Underflow,
}

impl From<ArithmeticError> for LedgerError {
    fn from(err: ArithmeticError) -> Self {
        match err {
            ArithmeticError::Overflow => LedgerError::Overflow,
            ArithmeticError::Underflow => LedgerError::Underflow,
        }
    }
}

/// Market and token registry errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MarketError {
    #[error("Token already registered: {token}")]
    DuplicateToken { token: String },

    #[error("Unknown token: {token}")]
    UnknownToken { token: String },

    #[error("Token is not active: {token}")]
    InactiveToken { token: String },

    #[error("Invalid listing: {reason}")]
    InvalidListing { reason: String },

    #[error("Invalid order parameters: {reason}")]
    InvalidOrderParameters { reason: String },

    #[error("Insufficient allowance from {owner} to market: required {required}, available {available}")]
    InsufficientAllowance {
        owner: String,
        required: String,
        available: String,
    },

    #[error("Escrow transfer failed: {0}")]
    Escrow(LedgerError),

    #[error("Unauthorized: caller {caller} is not market admin")]
    Unauthorized { caller: String },

    #[error("Arithmetic overflow in escrow calculation")]
    Overflow,

    #[error("Arithmetic underflow in escrow calculation")]
    Underflow,
}

impl From<ArithmeticError> for MarketError {
    fn from(err: ArithmeticError) -> Self {
        match err {
            ArithmeticError::Overflow => MarketError::Overflow,
            ArithmeticError::Underflow => MarketError::Underflow,
        }
    }
}

/// An allowance shortfall surfaces as a market-level condition; any other
/// token failure is reported as a failed escrow pull.
impl From<LedgerError> for MarketError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::InsufficientAllowance {
                owner,
                required,
                available,
                ..
            } => MarketError::InsufficientAllowance {
                owner,
                required,
                available,
            },
            other => MarketError::Escrow(other),
        }
    }
}

/// Deployment configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid value in config: {0}")]
    Parse(#[from] ParseError),

    #[error("Duplicate address in config: {address}")]
    DuplicateAddress { address: String },

    #[error("Deployment setup failed: {0}")]
    Ledger(#[from] LedgerError),

    #[error("Deployment setup failed: {0}")]
    Market(#[from] MarketError),
}

//! Contract events
//!
//! Events are immutable records appended by successful contract operations.
//! Each carries the address of the emitting token contract so logs from
//! several contracts can be merged.

use serde::{Deserialize, Serialize};
use types::ids::{Address, OrderId, TokenId};
use types::numeric::{Amount, Price};
use types::order::Side;

/// Account admitted to the holder whitelist
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountWhitelisted {
    pub token: Address,
    pub account: Address,
}

/// Account removed from the holder whitelist
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountRemovedFromWhitelist {
    pub token: Address,
    pub account: Address,
}

/// Tokens minted, part unlocked immediately and the rest scheduled
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokensMinted {
    pub token: Address,
    pub account: Address,
    pub amount: Amount,
    pub unlocked_immediately: Amount,
    pub tranches_scheduled: usize,
}

/// Matured tranches folded into the unlocked balance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokensUnlocked {
    pub token: Address,
    pub account: Address,
    pub released: Amount,
    pub unlocked_balance: Amount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    pub token: Address,
    pub from: Address,
    pub to: Address,
    pub amount: Amount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Approval {
    pub token: Address,
    pub owner: Address,
    pub spender: Address,
    pub amount: Amount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokensBurned {
    pub token: Address,
    pub account: Address,
    pub amount: Amount,
}

/// Security token listed on the market
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRegistered {
    pub token: TokenId,
    pub name: String,
    pub symbol: String,
    pub related_asset: String,
}

/// Listing activated or deactivated
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenStatusChanged {
    pub token: TokenId,
    pub active: bool,
}

/// Order accepted and escrow pulled
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderPlaced {
    pub order_id: OrderId,
    pub side: Side,
    pub maker: Address,
    pub token: TokenId,
    pub amount: Amount,
    pub price: Price,
    pub escrow_asset: Address,
    pub escrowed: Amount,
}

/// Enum wrapper for all contract events, enabling uniform handling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContractEvent {
    AccountWhitelisted(AccountWhitelisted),
    AccountRemovedFromWhitelist(AccountRemovedFromWhitelist),
    TokensMinted(TokensMinted),
    TokensUnlocked(TokensUnlocked),
    Transfer(Transfer),
    Approval(Approval),
    TokensBurned(TokensBurned),
    TokenRegistered(TokenRegistered),
    TokenStatusChanged(TokenStatusChanged),
    OrderPlaced(OrderPlaced),
}

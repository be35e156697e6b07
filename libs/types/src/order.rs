//! Order book intent types
//!
//! Orders are resting buy/sell intents registered with the market. The
//! market only appends and lists them; there is no fill or cancel path.

use crate::ids::{Address, OrderId, TokenId};
use crate::numeric::{Amount, Price};
use serde::{Deserialize, Serialize};

/// Order side (buyer or seller)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    /// Buy order (bid), escrows settlement asset
    BUY,
    /// Sell order (ask), escrows the security token
    SELL,
}

impl Side {
    /// Get the opposite side
    pub fn opposite(&self) -> Self {
        match self {
            Side::BUY => Side::SELL,
            Side::SELL => Side::BUY,
        }
    }
}

/// Order status
///
/// Placement is the only transition: `None → Open`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderStatus {
    /// Accepted, escrow held, resting in its queue
    Open,
}

/// A resting order
///
/// Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub order_id: OrderId,
    pub side: Side,
    pub maker: Address,
    /// Security-token quantity (18-digit fixed point)
    pub amount: Amount,
    /// Settlement units per whole token
    pub price: Price,
    pub asset_id: TokenId,
    /// Asset pulled into escrow at placement: settlement asset for buys,
    /// the security token itself for sells
    pub escrow_asset: Address,
    pub escrowed: Amount,
    pub status: OrderStatus,
    pub created_at: i64, // Unix seconds
}

impl Order {
    /// Create a new open order
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        side: Side,
        maker: Address,
        amount: Amount,
        price: Price,
        asset_id: TokenId,
        escrow_asset: Address,
        escrowed: Amount,
        timestamp: i64,
    ) -> Self {
        Self {
            order_id: OrderId::new(),
            side,
            maker,
            amount,
            price,
            asset_id,
            escrow_asset,
            escrowed,
            status: OrderStatus::Open,
            created_at: timestamp,
        }
    }

    pub fn is_buy(&self) -> bool {
        self.side == Side::BUY
    }
}

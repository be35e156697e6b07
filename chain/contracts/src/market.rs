//! Market — escrowed order book registry
//!
//! Keeps per-token buy and sell queues of resting intents. Placing an order
//! pulls escrow from the maker synchronously (settlement asset for buys,
//! the security token for sells) and appends the order in FIFO position.
//! The pull and the append happen under one write lock: either both happen
//! or neither does. There is no matching, fill or cancel path.
//!
//! Lock order is always market → token. Token contracts never call back
//! into the market.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};
use types::ids::{Address, OrderId, TokenId};
use types::numeric::{Amount, Price};
use types::order::{Order, Side};

use crate::errors::MarketError;
use crate::events::{ContractEvent, OrderPlaced, TokenRegistered, TokenStatusChanged};
use crate::registry::{TokenRegistration, TokenRegistry};
use crate::security::AccessControl;
use crate::token::{FungibleToken, TokenDirectory};

#[derive(Debug)]
struct MarketState {
    registry: TokenRegistry,
    buy_orders: HashMap<TokenId, Vec<Order>>,
    sell_orders: HashMap<TokenId, Vec<Order>>,
    /// order → (side, token, position in its queue)
    order_index: HashMap<OrderId, (Side, TokenId, usize)>,
    /// (maker, escrowed asset) → amount held
    escrow: HashMap<(Address, Address), Amount>,
    /// escrowed asset → amount held across makers
    escrow_totals: HashMap<Address, Amount>,
    access_control: AccessControl,
    events: Vec<ContractEvent>,
}

impl MarketState {
    fn queue(&self, side: Side, token: &TokenId) -> Option<&Vec<Order>> {
        match side {
            Side::BUY => self.buy_orders.get(token),
            Side::SELL => self.sell_orders.get(token),
        }
    }

    fn queue_mut(&mut self, side: Side, token: TokenId) -> &mut Vec<Order> {
        match side {
            Side::BUY => self.buy_orders.entry(token).or_default(),
            Side::SELL => self.sell_orders.entry(token).or_default(),
        }
    }

    fn escrowed(&self, maker: &Address, asset: &Address) -> Amount {
        self.escrow
            .get(&(*maker, *asset))
            .copied()
            .unwrap_or(Amount::ZERO)
    }

    fn total_escrowed(&self, asset: &Address) -> Amount {
        self.escrow_totals.get(asset).copied().unwrap_or(Amount::ZERO)
    }
}

/// Order book market for listed security tokens.
#[derive(Debug)]
pub struct Market {
    address: Address,
    settlement: Arc<dyn FungibleToken>,
    directory: TokenDirectory,
    state: RwLock<MarketState>,
}

impl Market {
    /// Create a market at `address` settling in `settlement`. Security
    /// tokens are resolved through `directory`.
    pub fn new(
        address: Address,
        admin: Address,
        settlement: Arc<dyn FungibleToken>,
        directory: TokenDirectory,
    ) -> Self {
        Self {
            address,
            settlement,
            directory,
            state: RwLock::new(MarketState {
                registry: TokenRegistry::new(),
                buy_orders: HashMap::new(),
                sell_orders: HashMap::new(),
                order_index: HashMap::new(),
                escrow: HashMap::new(),
                escrow_totals: HashMap::new(),
                access_control: AccessControl::new(admin),
                events: Vec::new(),
            }),
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Address of the settlement asset
    pub fn settlement_asset(&self) -> Address {
        self.settlement.address()
    }

    // ───────────────────────── Token Registry ─────────────────────────

    /// List a security token. The token contract must be known to the
    /// market's directory.
    pub fn register_token(
        &self,
        token_address: TokenId,
        name: &str,
        symbol: &str,
        related_asset: &str,
        doc_uri: &str,
    ) -> Result<TokenRegistration, MarketError> {
        if token_address == self.settlement.address() {
            return Err(MarketError::InvalidListing {
                reason: "settlement asset cannot be listed".to_string(),
            });
        }
        let mut state = self.state.write();
        if state.registry.get(&token_address).is_some() {
            return Err(MarketError::DuplicateToken {
                token: token_address.to_string(),
            });
        }
        if !self.directory.contains(&token_address) {
            return Err(MarketError::UnknownToken {
                token: token_address.to_string(),
            });
        }

        let registration = state
            .registry
            .register(token_address, name, symbol, related_asset, doc_uri)?
            .clone();
        state.events.push(ContractEvent::TokenRegistered(TokenRegistered {
            token: token_address,
            name: registration.name.clone(),
            symbol: registration.symbol.clone(),
            related_asset: registration.related_asset.clone(),
        }));
        info!(
            token = %token_address,
            symbol = %registration.symbol,
            related_asset = %registration.related_asset,
            "Registered token"
        );
        Ok(registration)
    }

    /// Activate or deactivate a listing. Admin-only.
    pub fn set_token_active(&self, caller: &Address, token: &TokenId, active: bool) -> Result<(), MarketError> {
        let mut state = self.state.write();
        if !state.access_control.is_admin(caller) {
            return Err(MarketError::Unauthorized {
                caller: caller.to_string(),
            });
        }
        if state.registry.set_active(token, active)? {
            state.events.push(ContractEvent::TokenStatusChanged(TokenStatusChanged {
                token: *token,
                active,
            }));
            info!(token = %token, active, "Token status changed");
        }
        Ok(())
    }

    /// All registrations in insertion order, inactive included.
    pub fn get_registered_tokens(&self) -> Vec<TokenRegistration> {
        self.state.read().registry.all().to_vec()
    }

    pub fn get_token(&self, token: &TokenId) -> Option<TokenRegistration> {
        self.state.read().registry.get(token).cloned()
    }

    pub fn active_tokens(&self) -> Vec<TokenRegistration> {
        self.state.read().registry.active().cloned().collect()
    }

    // ───────────────────────── Orders ─────────────────────────

    /// Escrow `amount * price` of the settlement asset from `maker` and
    /// append a buy order. The maker must have approved the market.
    pub fn place_buy_order(
        &self,
        maker: Address,
        amount: Amount,
        price: Price,
        token: TokenId,
        current_time: i64,
    ) -> Result<Order, MarketError> {
        self.place_order(Side::BUY, maker, amount, price, token, current_time)
    }

    /// Escrow `amount` of the security token from `maker` and append a
    /// sell order. The maker must have approved the market.
    pub fn place_sell_order(
        &self,
        maker: Address,
        amount: Amount,
        price: Price,
        token: TokenId,
        current_time: i64,
    ) -> Result<Order, MarketError> {
        self.place_order(Side::SELL, maker, amount, price, token, current_time)
    }

    fn place_order(
        &self,
        side: Side,
        maker: Address,
        amount: Amount,
        price: Price,
        token: TokenId,
        current_time: i64,
    ) -> Result<Order, MarketError> {
        if amount.is_zero() {
            return Err(MarketError::InvalidOrderParameters {
                reason: "amount must be positive".to_string(),
            });
        }
        if price.is_zero() {
            return Err(MarketError::InvalidOrderParameters {
                reason: "price must be positive".to_string(),
            });
        }
        // Escrow must come from outside the market
        if maker == self.address {
            return Err(MarketError::InvalidOrderParameters {
                reason: "market cannot place orders on itself".to_string(),
            });
        }

        let mut state = self.state.write();
        state.registry.require_active(&token)?;

        let (escrow_token, escrowed) = match side {
            Side::BUY => (Arc::clone(&self.settlement), amount.mul_price(price)?),
            Side::SELL => {
                let handle = self.directory.get(&token).ok_or_else(|| MarketError::UnknownToken {
                    token: token.to_string(),
                })?;
                (handle, amount)
            }
        };
        if escrowed.is_zero() {
            return Err(MarketError::InvalidOrderParameters {
                reason: "order value rounds to zero".to_string(),
            });
        }

        let escrow_asset = escrow_token.address();
        let maker_escrow = state.escrowed(&maker, &escrow_asset).checked_add(escrowed)?;
        let asset_escrow = state.total_escrowed(&escrow_asset).checked_add(escrowed)?;

        if let Err(err) = escrow_token.transfer_from(self.address, maker, self.address, escrowed, current_time) {
            warn!(
                maker = %maker,
                token = %token,
                side = ?side,
                escrow = %escrowed,
                error = %err,
                "Escrow pull rejected"
            );
            return Err(err.into());
        }

        state.escrow.insert((maker, escrow_asset), maker_escrow);
        state.escrow_totals.insert(escrow_asset, asset_escrow);

        let order = Order::new(side, maker, amount, price, token, escrow_asset, escrowed, current_time);
        let queue = state.queue_mut(side, token);
        queue.push(order.clone());
        let position = queue.len() - 1;
        state.order_index.insert(order.order_id, (side, token, position));

        state.events.push(ContractEvent::OrderPlaced(OrderPlaced {
            order_id: order.order_id,
            side,
            maker,
            token,
            amount,
            price,
            escrow_asset,
            escrowed,
        }));
        info!(
            order_id = %order.order_id,
            side = ?side,
            maker = %maker,
            token = %token,
            amount = %amount,
            price = %price,
            escrow = %escrowed,
            "Order placed"
        );
        Ok(order)
    }

    /// Buy orders for `token` in placement order; empty if none.
    pub fn get_buy_orders(&self, token: &TokenId) -> Vec<Order> {
        self.orders(Side::BUY, token)
    }

    /// Sell orders for `token` in placement order; empty if none.
    pub fn get_sell_orders(&self, token: &TokenId) -> Vec<Order> {
        self.orders(Side::SELL, token)
    }

    fn orders(&self, side: Side, token: &TokenId) -> Vec<Order> {
        self.state
            .read()
            .queue(side, token)
            .cloned()
            .unwrap_or_default()
    }

    pub fn get_order(&self, order_id: &OrderId) -> Option<Order> {
        let state = self.state.read();
        let (side, token, position) = state.order_index.get(order_id)?;
        state.queue(*side, token)?.get(*position).cloned()
    }

    // ───────────────────────── Escrow ─────────────────────────

    /// Amount of `asset` held in escrow for `maker`.
    pub fn escrowed_balance(&self, maker: &Address, asset: &Address) -> Amount {
        self.state.read().escrowed(maker, asset)
    }

    /// Amount of `asset` held in escrow across all makers.
    pub fn total_escrowed(&self, asset: &Address) -> Amount {
        self.state.read().total_escrowed(asset)
    }

    // ───────────────────────── Events ─────────────────────────

    /// Get all emitted events.
    pub fn events(&self) -> Vec<ContractEvent> {
        self.state.read().events.clone()
    }

    /// Drain all events (consume and clear).
    pub fn drain_events(&self) -> Vec<ContractEvent> {
        std::mem::take(&mut self.state.write().events)
    }
}

//! Fungible-token seam between the market and the token contracts
//!
//! The market never touches balances directly. It pulls escrow through this
//! interface, implemented by both the settlement asset and the security
//! token, and resolves token addresses through a `TokenDirectory` handed to
//! it at construction.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use types::ids::Address;
use types::numeric::Amount;

use crate::errors::LedgerError;

/// Standard fungible-token surface used for escrow pulls.
///
/// Implementations serialise their own mutations; each call is atomic.
pub trait FungibleToken: Send + Sync + fmt::Debug {
    /// Contract address of this token
    fn address(&self) -> Address;

    fn symbol(&self) -> String;

    fn balance_of(&self, account: &Address) -> Amount;

    fn allowance(&self, owner: &Address, spender: &Address) -> Amount;

    /// Set `spender`'s allowance over `owner`'s balance to `amount`.
    fn approve(&self, owner: Address, spender: Address, amount: Amount) -> Result<(), LedgerError>;

    /// Move `amount` from `from` to `to` on behalf of `spender`, consuming
    /// allowance. All-or-nothing.
    fn transfer_from(
        &self,
        spender: Address,
        from: Address,
        to: Address,
        amount: Amount,
        current_time: i64,
    ) -> Result<(), LedgerError>;
}

/// Address → token contract handle.
///
/// Replaces a shared deployed-address file: whoever wires the contracts
/// together builds one and passes it in.
#[derive(Debug, Clone, Default)]
pub struct TokenDirectory {
    tokens: HashMap<Address, Arc<dyn FungibleToken>>,
}

impl TokenDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a token under its own address. Returns `false` if the
    /// address is already taken.
    pub fn insert(&mut self, token: Arc<dyn FungibleToken>) -> bool {
        let address = token.address();
        if self.tokens.contains_key(&address) {
            return false;
        }
        self.tokens.insert(address, token);
        true
    }

    pub fn get(&self, address: &Address) -> Option<Arc<dyn FungibleToken>> {
        self.tokens.get(address).cloned()
    }

    pub fn contains(&self, address: &Address) -> bool {
        self.tokens.contains_key(address)
    }
}

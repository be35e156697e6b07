//! Settlement asset — a plain stable fungible token (e.g. USDT)
//!
//! Unrestricted: any account may hold and move it. Buy orders escrow it
//! through `FungibleToken::transfer_from`.

use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::info;
use types::ids::Address;
use types::numeric::Amount;

use crate::errors::LedgerError;
use crate::events::{Approval, ContractEvent, Transfer};
use crate::security::AccessControl;
use crate::token::FungibleToken;

#[derive(Debug)]
struct StableState {
    balances: HashMap<Address, Amount>,
    allowances: HashMap<(Address, Address), Amount>,
    total_supply: Amount,
    access_control: AccessControl,
    events: Vec<ContractEvent>,
}

impl StableState {
    fn balance(&self, account: &Address) -> Amount {
        self.balances.get(account).copied().unwrap_or(Amount::ZERO)
    }

    fn allowance(&self, owner: &Address, spender: &Address) -> Amount {
        self.allowances
            .get(&(*owner, *spender))
            .copied()
            .unwrap_or(Amount::ZERO)
    }

    /// Move balance without allowance checks. All arithmetic is checked
    /// before anything is written.
    fn move_balance(&mut self, from: Address, to: Address, amount: Amount) -> Result<(), LedgerError> {
        let from_balance = self.balance(&from);
        if from_balance < amount {
            return Err(LedgerError::InsufficientBalance {
                account: from.to_string(),
                required: amount.to_string(),
                available: from_balance.to_string(),
            });
        }
        if from == to {
            return Ok(());
        }
        let new_from = from_balance.checked_sub(amount)?;
        let new_to = self.balance(&to).checked_add(amount)?;

        self.balances.insert(from, new_from);
        self.balances.insert(to, new_to);
        Ok(())
    }
}

/// Stable settlement token contract.
#[derive(Debug)]
pub struct StableToken {
    address: Address,
    name: String,
    symbol: String,
    state: RwLock<StableState>,
}

impl StableToken {
    /// Create a token contract at `address`, administered by `admin`.
    pub fn new(
        address: Address,
        admin: Address,
        name: impl Into<String>,
        symbol: impl Into<String>,
    ) -> Self {
        Self {
            address,
            name: name.into(),
            symbol: symbol.into(),
            state: RwLock::new(StableState {
                balances: HashMap::new(),
                allowances: HashMap::new(),
                total_supply: Amount::ZERO,
                access_control: AccessControl::new(admin),
                events: Vec::new(),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn decimals(&self) -> u32 {
        types::numeric::DECIMALS
    }

    pub fn total_supply(&self) -> Amount {
        self.state.read().total_supply
    }

    /// Issue new tokens. Admin-only.
    pub fn mint(&self, caller: &Address, to: Address, amount: Amount) -> Result<ContractEvent, LedgerError> {
        let mut state = self.state.write();
        if !state.access_control.is_admin(caller) {
            return Err(LedgerError::Unauthorized {
                caller: caller.to_string(),
            });
        }
        if amount.is_zero() {
            return Err(LedgerError::InvalidAmount);
        }

        let new_supply = state.total_supply.checked_add(amount)?;
        let new_balance = state.balance(&to).checked_add(amount)?;
        state.total_supply = new_supply;
        state.balances.insert(to, new_balance);

        let event = ContractEvent::Transfer(Transfer {
            token: self.address,
            from: Address::ZERO,
            to,
            amount,
        });
        state.events.push(event.clone());
        info!(token = %self.symbol, account = %to, amount = %amount, "Minted settlement asset");
        Ok(event)
    }

    /// Direct transfer by the holder.
    pub fn transfer(&self, from: Address, to: Address, amount: Amount) -> Result<ContractEvent, LedgerError> {
        let mut state = self.state.write();
        state.move_balance(from, to, amount)?;

        let event = ContractEvent::Transfer(Transfer {
            token: self.address,
            from,
            to,
            amount,
        });
        state.events.push(event.clone());
        Ok(event)
    }

    /// Get all emitted events.
    pub fn events(&self) -> Vec<ContractEvent> {
        self.state.read().events.clone()
    }

    /// Drain all events (consume and clear).
    pub fn drain_events(&self) -> Vec<ContractEvent> {
        std::mem::take(&mut self.state.write().events)
    }
}

impl FungibleToken for StableToken {
    fn address(&self) -> Address {
        self.address
    }

    fn symbol(&self) -> String {
        self.symbol.clone()
    }

    fn balance_of(&self, account: &Address) -> Amount {
        self.state.read().balance(account)
    }

    fn allowance(&self, owner: &Address, spender: &Address) -> Amount {
        self.state.read().allowance(owner, spender)
    }

    fn approve(&self, owner: Address, spender: Address, amount: Amount) -> Result<(), LedgerError> {
        let mut state = self.state.write();
        state.allowances.insert((owner, spender), amount);
        state.events.push(ContractEvent::Approval(Approval {
            token: self.address,
            owner,
            spender,
            amount,
        }));
        Ok(())
    }

    fn transfer_from(
        &self,
        spender: Address,
        from: Address,
        to: Address,
        amount: Amount,
        _current_time: i64,
    ) -> Result<(), LedgerError> {
        let mut state = self.state.write();
        let allowed = state.allowance(&from, &spender);
        if allowed < amount {
            return Err(LedgerError::InsufficientAllowance {
                owner: from.to_string(),
                spender: spender.to_string(),
                required: amount.to_string(),
                available: allowed.to_string(),
            });
        }

        state.move_balance(from, to, amount)?;
        state.allowances.insert((from, spender), allowed.checked_sub(amount)?);
        state.events.push(ContractEvent::Transfer(Transfer {
            token: self.address,
            from,
            to,
            amount,
        }));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn admin() -> Address {
        Address::from_low_u64(1)
    }

    fn alice() -> Address {
        Address::from_low_u64(2)
    }

    fn bob() -> Address {
        Address::from_low_u64(3)
    }

    fn market() -> Address {
        Address::from_low_u64(4)
    }

    fn setup_usdt() -> StableToken {
        let usdt = StableToken::new(Address::from_low_u64(20), admin(), "Tether USD", "USDT");
        usdt.mint(&admin(), alice(), Amount::from_whole(400)).unwrap();
        usdt
    }

    // ─── Mint tests ───

    #[test]
    fn test_mint_credits_balance_and_supply() {
        let usdt = setup_usdt();
        assert_eq!(usdt.balance_of(&alice()), Amount::from_whole(400));
        assert_eq!(usdt.total_supply(), Amount::from_whole(400));
        assert_eq!(usdt.decimals(), 18);
        assert_eq!(usdt.name(), "Tether USD");
    }

    #[test]
    fn test_mint_unauthorized() {
        let usdt = setup_usdt();
        let result = usdt.mint(&alice(), alice(), Amount::from_whole(1));
        assert!(matches!(result, Err(LedgerError::Unauthorized { .. })));
    }

    #[test]
    fn test_mint_zero_rejected() {
        let usdt = setup_usdt();
        assert_eq!(
            usdt.mint(&admin(), alice(), Amount::ZERO),
            Err(LedgerError::InvalidAmount)
        );
    }

    #[test]
    fn test_mint_overflow() {
        let usdt = setup_usdt();
        let result = usdt.mint(&admin(), bob(), Amount::MAX);
        assert_eq!(result, Err(LedgerError::Overflow));
        assert_eq!(usdt.balance_of(&bob()), Amount::ZERO);
    }

    // ─── Transfer tests ───

    #[test]
    fn test_transfer() {
        let usdt = setup_usdt();
        usdt.transfer(alice(), bob(), Amount::from_whole(150)).unwrap();
        assert_eq!(usdt.balance_of(&alice()), Amount::from_whole(250));
        assert_eq!(usdt.balance_of(&bob()), Amount::from_whole(150));
    }

    #[test]
    fn test_transfer_insufficient() {
        let usdt = setup_usdt();
        let result = usdt.transfer(bob(), alice(), Amount::from_whole(1));
        assert!(matches!(result, Err(LedgerError::InsufficientBalance { .. })));
    }

    // ─── Allowance tests ───

    #[test]
    fn test_approve_and_transfer_from() {
        let usdt = setup_usdt();
        usdt.approve(alice(), market(), Amount::from_whole(10)).unwrap();
        assert_eq!(usdt.allowance(&alice(), &market()), Amount::from_whole(10));

        usdt.transfer_from(market(), alice(), market(), Amount::from_whole(4), 0)
            .unwrap();
        assert_eq!(usdt.balance_of(&market()), Amount::from_whole(4));
        assert_eq!(usdt.allowance(&alice(), &market()), Amount::from_whole(6));
    }

    #[test]
    fn test_transfer_from_without_allowance() {
        let usdt = setup_usdt();
        let result = usdt.transfer_from(market(), alice(), market(), Amount::from_whole(1), 0);
        assert!(matches!(result, Err(LedgerError::InsufficientAllowance { .. })));
        assert_eq!(usdt.balance_of(&alice()), Amount::from_whole(400));
    }

    #[test]
    fn test_transfer_from_insufficient_balance_keeps_allowance() {
        let usdt = setup_usdt();
        usdt.approve(bob(), market(), Amount::from_whole(10)).unwrap();
        let result = usdt.transfer_from(market(), bob(), market(), Amount::from_whole(5), 0);
        assert!(matches!(result, Err(LedgerError::InsufficientBalance { .. })));
        assert_eq!(usdt.allowance(&bob(), &market()), Amount::from_whole(10));
    }

    // ─── Events tests ───

    #[test]
    fn test_events_emitted() {
        let usdt = setup_usdt();
        usdt.approve(alice(), market(), Amount::from_whole(1)).unwrap();
        assert_eq!(usdt.events().len(), 2);

        let drained = usdt.drain_events();
        assert_eq!(drained.len(), 2);
        assert!(usdt.events().is_empty());
    }
}

//! Restricted vesting ledger — the security token contract
//!
//! Per-account accounting for a whitelisted, vesting-controlled token:
//! - Holder whitelist gating every balance-affecting operation
//! - Minting with an optional schedule of time-locked tranches
//! - Pull-based unlocking: matured tranches fold into the unlocked balance
//!   on `update_unlocked_balance`, before transfers, and (on a working view)
//!   on every unlocked-balance read
//! - Transfers capped by the unlocked balance
//! - Allowances so the market can escrow sell-side tokens
//!
//! Invariant per account: `pending tranches + unlocked == total`.
//!
//! All state sits behind one `RwLock`; every mutation holds the write lock
//! for its whole duration and validates all arithmetic before writing.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info};
use types::ids::Address;
use types::numeric::{Amount, Price, DECIMALS};

use crate::errors::LedgerError;
use crate::events::{
    AccountRemovedFromWhitelist, AccountWhitelisted, Approval, ContractEvent, TokensBurned,
    TokensMinted, TokensUnlocked, Transfer,
};
use crate::security::{AccessControl, Role};
use crate::token::FungibleToken;
use crate::vesting::{Tranche, VestingSchedule};

/// Descriptive metadata fixed at deployment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenMetadata {
    pub name: String,
    pub symbol: String,
    /// Real-world instrument the token represents, e.g. "TSLA"
    pub related_asset: String,
    /// Settlement units per whole token at issuance
    pub reference_price: Price,
}

#[derive(Debug, Clone, Default)]
struct AccountRecord {
    whitelisted: bool,
    total_balance: Amount,
    unlocked_balance: Amount,
    schedule: VestingSchedule,
}

impl AccountRecord {
    /// Unlocked balance including tranches matured by `current_time`
    fn unlocked_at(&self, current_time: i64) -> Amount {
        let unlocked = self
            .unlocked_balance
            .checked_add(self.schedule.releasable(current_time));
        debug_assert!(unlocked.is_ok(), "unlocked balance exceeds total balance");
        unlocked.unwrap_or(self.total_balance)
    }
}

/// Point-in-time view of one account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountSnapshot {
    pub account: Address,
    pub whitelisted: bool,
    pub total_balance: Amount,
    pub unlocked_balance: Amount,
    pub pending_tranches: Vec<Tranche>,
}

#[derive(Debug)]
struct LedgerState {
    accounts: HashMap<Address, AccountRecord>,
    allowances: HashMap<(Address, Address), Amount>,
    total_supply: Amount,
    access_control: AccessControl,
    events: Vec<ContractEvent>,
}

impl LedgerState {
    fn record(&self, account: &Address) -> Option<&AccountRecord> {
        self.accounts.get(account)
    }

    fn is_whitelisted(&self, account: &Address) -> bool {
        self.record(account).is_some_and(|r| r.whitelisted)
    }

    fn require_whitelisted(&self, account: &Address) -> Result<(), LedgerError> {
        if !self.is_whitelisted(account) {
            return Err(LedgerError::NotWhitelisted {
                account: account.to_string(),
            });
        }
        Ok(())
    }

    fn require_issuer(&self, caller: &Address) -> Result<(), LedgerError> {
        if !self.access_control.can_issue(caller) {
            return Err(LedgerError::Unauthorized {
                caller: caller.to_string(),
            });
        }
        Ok(())
    }

    /// `(total, unlocked as of current_time)` for an account
    fn balances_at(&self, account: &Address, current_time: i64) -> (Amount, Amount) {
        self.record(account)
            .map(|r| (r.total_balance, r.unlocked_at(current_time)))
            .unwrap_or_default()
    }

    fn allowance(&self, owner: &Address, spender: &Address) -> Amount {
        self.allowances
            .get(&(*owner, *spender))
            .copied()
            .unwrap_or(Amount::ZERO)
    }

    /// Fold matured tranches for `account`; returns the released amount.
    fn fold(&mut self, account: &Address, current_time: i64) -> Result<Amount, LedgerError> {
        let Some(record) = self.accounts.get_mut(account) else {
            return Ok(Amount::ZERO);
        };
        let releasable = record.schedule.releasable(current_time);
        if releasable.is_zero() {
            return Ok(Amount::ZERO);
        }
        let new_unlocked = record.unlocked_balance.checked_add(releasable)?;
        let released = record.schedule.fold(current_time);
        record.unlocked_balance = new_unlocked;
        Ok(released)
    }

    /// Whitelist-gated, unlocked-capped move. Nothing is written unless
    /// every check passes.
    fn transfer(
        &mut self,
        from: Address,
        to: Address,
        amount: Amount,
        current_time: i64,
    ) -> Result<(), LedgerError> {
        if amount.is_zero() {
            return Err(LedgerError::InvalidAmount);
        }
        self.require_whitelisted(&from)?;
        self.require_whitelisted(&to)?;

        let (sender_total, available) = self.balances_at(&from, current_time);
        if amount > available {
            return Err(LedgerError::InsufficientUnlockedBalance {
                account: from.to_string(),
                required: amount.to_string(),
                available: available.to_string(),
            });
        }

        self.fold(&from, current_time)?;
        if from == to {
            return Ok(());
        }

        let sender_unlocked = available.checked_sub(amount)?;
        let sender_total = sender_total.checked_sub(amount)?;
        let (receiver_total, receiver_unlocked) = self
            .record(&to)
            .map(|r| (r.total_balance, r.unlocked_balance))
            .unwrap_or_default();
        let receiver_total = receiver_total.checked_add(amount)?;
        let receiver_unlocked = receiver_unlocked.checked_add(amount)?;

        let sender = self.accounts.entry(from).or_default();
        sender.unlocked_balance = sender_unlocked;
        sender.total_balance = sender_total;

        let receiver = self.accounts.entry(to).or_default();
        receiver.total_balance = receiver_total;
        receiver.unlocked_balance = receiver_unlocked;
        Ok(())
    }
}

/// Security token contract with vesting and whitelist restrictions.
#[derive(Debug)]
pub struct SecurityToken {
    address: Address,
    metadata: TokenMetadata,
    state: RwLock<LedgerState>,
}

impl SecurityToken {
    /// Deploy a token at `address`, administered by `admin`.
    pub fn new(address: Address, admin: Address, metadata: TokenMetadata) -> Self {
        Self {
            address,
            metadata,
            state: RwLock::new(LedgerState {
                accounts: HashMap::new(),
                allowances: HashMap::new(),
                total_supply: Amount::ZERO,
                access_control: AccessControl::new(admin),
                events: Vec::new(),
            }),
        }
    }

    pub fn metadata(&self) -> &TokenMetadata {
        &self.metadata
    }

    pub fn decimals(&self) -> u32 {
        DECIMALS
    }

    pub fn total_supply(&self) -> Amount {
        self.state.read().total_supply
    }

    // ───────────────────────── Access Control ─────────────────────────

    pub fn admin(&self) -> Address {
        self.state.read().access_control.admin()
    }

    /// Grant a role. Admin-only.
    pub fn grant_role(&self, caller: &Address, target: Address, role: Role) -> Result<(), LedgerError> {
        if !self.state.write().access_control.grant_role(caller, target, role) {
            return Err(LedgerError::Unauthorized {
                caller: caller.to_string(),
            });
        }
        Ok(())
    }

    /// Strip `target` of its role. Admin-only; the primary admin cannot be
    /// revoked.
    pub fn revoke_role(&self, caller: &Address, target: &Address) -> Result<(), LedgerError> {
        if !self.state.write().access_control.revoke_role(caller, target) {
            return Err(LedgerError::Unauthorized {
                caller: caller.to_string(),
            });
        }
        Ok(())
    }

    /// Transfer admin to a new address.
    pub fn set_admin(&self, current_admin: &Address, new_admin: Address) -> Result<(), LedgerError> {
        if !self
            .state
            .write()
            .access_control
            .transfer_admin(current_admin, new_admin)
        {
            return Err(LedgerError::Unauthorized {
                caller: current_admin.to_string(),
            });
        }
        Ok(())
    }

    // ───────────────────────── Whitelist ─────────────────────────

    /// Admit an account. Idempotent; emits an event only on change.
    pub fn add_to_whitelist(&self, caller: &Address, account: Address) -> Result<(), LedgerError> {
        let mut state = self.state.write();
        state.require_issuer(caller)?;

        let record = state.accounts.entry(account).or_default();
        if record.whitelisted {
            return Ok(());
        }
        record.whitelisted = true;
        state
            .events
            .push(ContractEvent::AccountWhitelisted(AccountWhitelisted {
                token: self.address,
                account,
            }));
        info!(token = %self.metadata.symbol, account = %account, "Account whitelisted");
        Ok(())
    }

    /// Revoke an account. Its balances stay but cannot move until it is
    /// whitelisted again.
    pub fn remove_from_whitelist(&self, caller: &Address, account: Address) -> Result<(), LedgerError> {
        let mut state = self.state.write();
        state.require_issuer(caller)?;

        let Some(record) = state.accounts.get_mut(&account) else {
            return Ok(());
        };
        if !record.whitelisted {
            return Ok(());
        }
        record.whitelisted = false;
        state
            .events
            .push(ContractEvent::AccountRemovedFromWhitelist(AccountRemovedFromWhitelist {
                token: self.address,
                account,
            }));
        info!(token = %self.metadata.symbol, account = %account, "Account removed from whitelist");
        Ok(())
    }

    pub fn is_whitelisted(&self, account: &Address) -> bool {
        self.state.read().is_whitelisted(account)
    }

    // ───────────────────────── Mint / Burn ─────────────────────────

    /// Mint `amount` to `account`, locking `vesting_amounts[i]` until
    /// `vesting_unlock_times[i]`. The remainder is unlocked immediately, as
    /// is any tranche whose unlock time has already passed.
    pub fn mint(
        &self,
        caller: &Address,
        account: Address,
        amount: Amount,
        vesting_amounts: &[Amount],
        vesting_unlock_times: &[i64],
        current_time: i64,
    ) -> Result<ContractEvent, LedgerError> {
        let mut state = self.state.write();
        state.require_issuer(caller)?;
        state.require_whitelisted(&account)?;

        if amount.is_zero() {
            return Err(LedgerError::InvalidAmount);
        }
        if vesting_amounts.len() != vesting_unlock_times.len() {
            return Err(LedgerError::VestingScheduleMismatch {
                reason: format!(
                    "{} amounts but {} unlock times",
                    vesting_amounts.len(),
                    vesting_unlock_times.len()
                ),
            });
        }
        let vesting_total = Amount::checked_sum(vesting_amounts)?;
        if vesting_total > amount {
            return Err(LedgerError::VestingScheduleMismatch {
                reason: format!("vesting total {} exceeds minted amount {}", vesting_total, amount),
            });
        }

        // Zero-amount tranches carry nothing and are dropped
        let (matured, pending): (Vec<Tranche>, Vec<Tranche>) = vesting_amounts
            .iter()
            .zip(vesting_unlock_times)
            .map(|(&amount, &unlock_time)| Tranche::new(amount, unlock_time))
            .filter(|t| !t.amount.is_zero())
            .partition(|t| t.is_mature(current_time));

        let matured_total = Amount::checked_sum(matured.iter().map(|t| &t.amount))?;
        let unlocked_immediately = amount.checked_sub(vesting_total)?.checked_add(matured_total)?;

        let (total_balance, unlocked_balance) = state
            .record(&account)
            .map(|r| (r.total_balance, r.unlocked_balance))
            .unwrap_or_default();
        let new_total = total_balance.checked_add(amount)?;
        let new_unlocked = unlocked_balance.checked_add(unlocked_immediately)?;
        let new_supply = state.total_supply.checked_add(amount)?;

        let record = state.accounts.entry(account).or_default();
        record.schedule.schedule(&pending)?;
        record.total_balance = new_total;
        record.unlocked_balance = new_unlocked;
        state.total_supply = new_supply;

        let event = ContractEvent::TokensMinted(TokensMinted {
            token: self.address,
            account,
            amount,
            unlocked_immediately,
            tranches_scheduled: pending.len(),
        });
        state.events.push(event.clone());
        info!(
            token = %self.metadata.symbol,
            account = %account,
            amount = %amount,
            unlocked = %unlocked_immediately,
            tranches = pending.len(),
            "Minted security tokens"
        );
        Ok(event)
    }

    /// Destroy unlocked tokens held by `account`. Issuer-only.
    pub fn burn(
        &self,
        caller: &Address,
        account: Address,
        amount: Amount,
        current_time: i64,
    ) -> Result<ContractEvent, LedgerError> {
        let mut state = self.state.write();
        state.require_issuer(caller)?;
        state.require_whitelisted(&account)?;
        if amount.is_zero() {
            return Err(LedgerError::InvalidAmount);
        }

        let (total_balance, available) = state.balances_at(&account, current_time);
        if amount > available {
            return Err(LedgerError::InsufficientUnlockedBalance {
                account: account.to_string(),
                required: amount.to_string(),
                available: available.to_string(),
            });
        }
        let new_unlocked = available.checked_sub(amount)?;
        let new_total = total_balance.checked_sub(amount)?;
        let new_supply = state.total_supply.checked_sub(amount)?;

        state.fold(&account, current_time)?;
        let record = state.accounts.entry(account).or_default();
        record.unlocked_balance = new_unlocked;
        record.total_balance = new_total;
        state.total_supply = new_supply;

        let event = ContractEvent::TokensBurned(TokensBurned {
            token: self.address,
            account,
            amount,
        });
        state.events.push(event.clone());
        info!(token = %self.metadata.symbol, account = %account, amount = %amount, "Burned security tokens");
        Ok(event)
    }

    // ───────────────────────── Unlocking ─────────────────────────

    /// Fold every matured tranche into the unlocked balance and return the
    /// refreshed unlocked balance. Idempotent.
    pub fn update_unlocked_balance(&self, account: &Address, current_time: i64) -> Result<Amount, LedgerError> {
        let mut state = self.state.write();
        let released = state.fold(account, current_time)?;
        let unlocked_balance = state
            .record(account)
            .map(|r| r.unlocked_balance)
            .unwrap_or(Amount::ZERO);

        if !released.is_zero() {
            state.events.push(ContractEvent::TokensUnlocked(TokensUnlocked {
                token: self.address,
                account: *account,
                released,
                unlocked_balance,
            }));
            debug!(
                token = %self.metadata.symbol,
                account = %account,
                released = %released,
                unlocked = %unlocked_balance,
                "Folded matured tranches"
            );
        }
        Ok(unlocked_balance)
    }

    // ───────────────────────── Balance Queries ─────────────────────────

    /// Unlocked balance as of `current_time`, counting matured tranches
    /// that have not been folded yet. Never under-reports.
    pub fn get_unlocked_balance_of(&self, account: &Address, current_time: i64) -> Amount {
        self.state
            .read()
            .record(account)
            .map(|r| r.unlocked_at(current_time))
            .unwrap_or(Amount::ZERO)
    }

    /// Total holdings, locked and unlocked.
    pub fn balance_of(&self, account: &Address) -> Amount {
        self.state
            .read()
            .record(account)
            .map(|r| r.total_balance)
            .unwrap_or(Amount::ZERO)
    }

    /// Still-locked holdings as of `current_time`.
    pub fn locked_balance_of(&self, account: &Address, current_time: i64) -> Amount {
        self.state
            .read()
            .record(account)
            .and_then(|r| r.total_balance.checked_sub(r.unlocked_at(current_time)).ok())
            .unwrap_or(Amount::ZERO)
    }

    /// Pending tranches in creation order.
    pub fn vesting_schedule(&self, account: &Address) -> Vec<Tranche> {
        self.state
            .read()
            .record(account)
            .map(|r| r.schedule.pending().copied().collect())
            .unwrap_or_default()
    }

    /// Consistent view of one account as stored (no folding applied).
    pub fn account_snapshot(&self, account: &Address) -> Option<AccountSnapshot> {
        let state = self.state.read();
        state.record(account).map(|r| AccountSnapshot {
            account: *account,
            whitelisted: r.whitelisted,
            total_balance: r.total_balance,
            unlocked_balance: r.unlocked_balance,
            pending_tranches: r.schedule.pending().copied().collect(),
        })
    }

    // ───────────────────────── Transfer ─────────────────────────

    /// Move unlocked tokens from `from` to `to`. The recipient receives
    /// them unlocked.
    pub fn transfer(
        &self,
        from: Address,
        to: Address,
        amount: Amount,
        current_time: i64,
    ) -> Result<ContractEvent, LedgerError> {
        let mut state = self.state.write();
        state.transfer(from, to, amount, current_time)?;

        let event = ContractEvent::Transfer(Transfer {
            token: self.address,
            from,
            to,
            amount,
        });
        state.events.push(event.clone());
        info!(token = %self.metadata.symbol, from = %from, to = %to, amount = %amount, "Transferred");
        Ok(event)
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

impl FungibleToken for SecurityToken {
    fn address(&self) -> Address {
        self.address
    }

    fn symbol(&self) -> String {
        self.metadata.symbol.clone()
    }

    fn balance_of(&self, account: &Address) -> Amount {
        SecurityToken::balance_of(self, account)
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
        current_time: i64,
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
        let remaining = allowed.checked_sub(amount)?;

        state.transfer(from, to, amount, current_time)?;
        state.allowances.insert((from, spender), remaining);
        state.events.push(ContractEvent::Transfer(Transfer {
            token: self.address,
            from,
            to,
            amount,
        }));
        Ok(())
    }
}

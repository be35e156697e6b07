//! Vesting schedule — ordered unlock tranches with lazy folding
//!
//! Tranches are kept in creation order and never reordered. Folding marks
//! every matured tranche as released; `first_unfolded` indexes the first
//! tranche still pending so scans skip the released prefix. Once released
//! slots number at least `COMPACT_THRESHOLD` and make up at least half of
//! the storage, all of them are dropped, wherever they sit.
//!
//! Unlock times are not required to be increasing, so a later tranche may
//! mature before an earlier one; folding scans the whole pending region.

use serde::{Deserialize, Serialize};
use types::errors::ArithmeticError;
use types::numeric::Amount;

/// Minimum released slot count before compaction is considered
const COMPACT_THRESHOLD: usize = 32;

/// One (amount, unlock time) pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tranche {
    pub amount: Amount,
    /// Unix seconds
    pub unlock_time: i64,
}

impl Tranche {
    pub fn new(amount: Amount, unlock_time: i64) -> Self {
        Self { amount, unlock_time }
    }

    pub fn is_mature(&self, current_time: i64) -> bool {
        self.unlock_time <= current_time
    }
}

#[derive(Debug, Clone)]
struct Slot {
    tranche: Tranche,
    released: bool,
}

/// Pending tranches for one account
#[derive(Debug, Clone, Default)]
pub struct VestingSchedule {
    slots: Vec<Slot>,
    first_unfolded: usize,
    /// released slots still held in `slots`
    released_slots: usize,
    pending_total: Amount,
}

impl VestingSchedule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append tranches in order.
    ///
    /// Either all tranches are appended or, on overflow of the pending
    /// total, none are.
    pub fn schedule(&mut self, tranches: &[Tranche]) -> Result<(), ArithmeticError> {
        let added = Amount::checked_sum(tranches.iter().map(|t| &t.amount))?;
        let new_total = self.pending_total.checked_add(added)?;

        self.slots.extend(tranches.iter().map(|&tranche| Slot {
            tranche,
            released: false,
        }));
        self.pending_total = new_total;
        Ok(())
    }

    /// Sum of matured, still-pending tranches. Read-only.
    pub fn releasable(&self, current_time: i64) -> Amount {
        let matured = Amount::checked_sum(
            self.pending()
                .filter(|t| t.is_mature(current_time))
                .map(|t| &t.amount),
        );
        debug_assert!(matured.is_ok(), "matured tranches exceed pending total");
        matured.unwrap_or(self.pending_total)
    }

    /// Release every matured tranche and return the released sum.
    ///
    /// Idempotent: a second call at the same time releases nothing.
    pub fn fold(&mut self, current_time: i64) -> Amount {
        let released = self.releasable(current_time);
        if released.is_zero() {
            return Amount::ZERO;
        }

        for slot in &mut self.slots[self.first_unfolded..] {
            if !slot.released && slot.tranche.is_mature(current_time) {
                slot.released = true;
                self.released_slots += 1;
            }
        }
        let remaining = self.pending_total.checked_sub(released);
        debug_assert!(remaining.is_ok(), "released more than pending total");
        self.pending_total = remaining.unwrap_or(Amount::ZERO);

        while self.first_unfolded < self.slots.len() && self.slots[self.first_unfolded].released {
            self.first_unfolded += 1;
        }
        self.compact();
        released
    }

    /// Pending tranches in creation order
    pub fn pending(&self) -> impl Iterator<Item = &Tranche> + '_ {
        self.slots[self.first_unfolded..]
            .iter()
            .filter(|slot| !slot.released)
            .map(|slot| &slot.tranche)
    }

    /// Total still locked
    pub fn pending_total(&self) -> Amount {
        self.pending_total
    }

    pub fn pending_count(&self) -> usize {
        self.pending().count()
    }

    pub fn is_empty(&self) -> bool {
        self.pending_total.is_zero() && self.pending_count() == 0
    }

    /// Earliest unlock time among pending tranches
    pub fn next_unlock_time(&self) -> Option<i64> {
        self.pending().map(|t| t.unlock_time).min()
    }

    /// Slots held in storage, released ones included
    fn storage_len(&self) -> usize {
        self.slots.len()
    }

    fn compact(&mut self) {
        if self.released_slots >= COMPACT_THRESHOLD && self.released_slots * 2 >= self.slots.len() {
            self.slots.retain(|slot| !slot.released);
            self.first_unfolded = 0;
            self.released_slots = 0;
        }
    }
}

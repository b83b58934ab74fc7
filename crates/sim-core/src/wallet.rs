//! Two-phase spending: reserve coins, then commit or cancel the reservation.

use crate::error::CoreError;
use crate::number::Amount;

/// Proof that coins were set aside. Must be handed back to the wallet that
/// issued it via [`Wallet::commit`] or [`Wallet::cancel`].
#[must_use = "a reservation must be committed or cancelled"]
#[derive(Debug, PartialEq, Eq)]
pub struct Receipt {
    amount: Amount,
}

impl Receipt {
    /// Issue a receipt. Only wallet implementations should call this.
    pub fn issue(amount: Amount) -> Self {
        Self { amount }
    }

    pub fn amount(&self) -> Amount {
        self.amount
    }
}

/// A reservation was refused; nothing was taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Denied {
    pub needed: Amount,
    pub available: Amount,
}

impl From<Denied> for CoreError {
    fn from(d: Denied) -> Self {
        CoreError::InsufficientFunds {
            needed: d.needed,
            available: d.available,
        }
    }
}

/// Anything that can pay.
pub trait Wallet {
    /// Spendable balance, excluding open reservations.
    fn balance(&self) -> Amount;
    /// Set `cost` aside or refuse without side effects.
    fn reserve(&mut self, cost: Amount) -> Result<Receipt, Denied>;
    /// Finalize the spend.
    fn commit(&mut self, receipt: Receipt);
    /// Return the reserved coins.
    fn cancel(&mut self, receipt: Receipt);
}

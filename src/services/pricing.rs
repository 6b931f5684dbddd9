//! Reservation pricing and payment reconciliation.
//!
//! A reservation owes `price * quantity + reservation_fee`. The fee is charged
//! once per reservation, not per unit.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Largest price, fee or payment a form may carry
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(999_999_999, 0, 0, false, 2);

/// Largest number of units a single reservation may hold
pub const MAX_QUANTITY: i32 = 10_000;

/// Whether `amount` is a non-negative value no larger than [`MAX_AMOUNT`]
pub fn amount_in_range(amount: Decimal) -> bool {
    (!amount.is_sign_negative() || amount.is_zero()) && amount <= MAX_AMOUNT
}

/// Derived payment state of a single reservation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentSummary {
    pub total: Decimal,
    pub paid: Decimal,
    /// Negative when the client overpaid
    pub pending: Decimal,
    pub fully_paid: bool,
}

pub fn summarize(
    price: Decimal,
    reservation_fee: Decimal,
    quantity: i32,
    paid: Decimal,
) -> PaymentSummary {
    // Saturating: rows imported before the ceilings existed must still list.
    let total = price
        .saturating_mul(Decimal::from(quantity))
        .saturating_add(reservation_fee);
    PaymentSummary {
        total,
        paid,
        pending: total.saturating_sub(paid),
        fully_paid: paid >= total,
    }
}

/// Sum of what is still owed across the summaries that are not settled
pub fn outstanding_balance<'a, I>(summaries: I) -> Decimal
where
    I: IntoIterator<Item = &'a PaymentSummary>,
{
    summaries
        .into_iter()
        .filter(|s| !s.fully_paid)
        .fold(Decimal::ZERO, |acc, s| acc.saturating_add(s.pending))
}

//! Numeric helpers around [`Decimal`], the amount type for coins, costs and rates.
//!
//! All economy math stays in `Decimal` so saves round-trip exactly; `f64` only
//! appears at the display boundary and for probabilities.

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;

/// Coins, costs and per-second rates.
pub type Amount = Decimal;

/// Wall-clock timestamp or duration in milliseconds since the UNIX epoch.
pub type Millis = i64;

/// Convert an amount to a display number. Never fails; values outside the
/// `f64` range saturate.
pub fn to_display(amount: Amount) -> f64 {
    match amount.to_f64() {
        Some(v) if v.is_finite() => v,
        _ if amount.is_sign_negative() => f64::MIN,
        _ => f64::MAX,
    }
}

/// Convert a display number back into an amount. Returns `None` for NaN/inf.
pub fn from_display(value: f64) -> Option<Amount> {
    if !value.is_finite() {
        return None;
    }
    Decimal::from_f64(value)
}

/// `pct / 100`, e.g. `percent(25) == 0.25`.
pub fn percent(pct: Amount) -> Amount {
    pct / Decimal::ONE_HUNDRED
}

/// Amount produced by `rate` (per second) over `elapsed_ms`. Negative or zero
/// elapsed time produces nothing.
pub fn per_elapsed(rate: Amount, elapsed_ms: Millis) -> Amount {
    if elapsed_ms <= 0 {
        return Decimal::ZERO;
    }
    saturating_mul(rate, Decimal::new(elapsed_ms, 3))
}

/// Addition clamped to the representable range.
pub fn saturating_add(a: Amount, b: Amount) -> Amount {
    a.checked_add(b).unwrap_or(if b.is_sign_negative() {
        Decimal::MIN
    } else {
        Decimal::MAX
    })
}

/// Multiplication clamped to the representable range.
pub fn saturating_mul(a: Amount, b: Amount) -> Amount {
    a.checked_mul(b).unwrap_or_else(|| {
        if a.is_sign_negative() != b.is_sign_negative() {
            Decimal::MIN
        } else {
            Decimal::MAX
        }
    })
}

/// Count as an amount.
pub fn from_count(n: u32) -> Amount {
    Decimal::from(n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn percent_of_hundred_is_one() {
        assert_eq!(percent(Decimal::ONE_HUNDRED), Decimal::ONE);
        assert_eq!(percent(Decimal::new(25, 0)), Decimal::new(25, 2));
    }

    #[test]
    fn per_elapsed_uses_seconds() {
        let rate = Decimal::new(8, 1); // 0.8/s
        assert_eq!(per_elapsed(rate, 2_500), Decimal::new(2, 0));
        assert_eq!(per_elapsed(rate, 0), Decimal::ZERO);
        assert_eq!(per_elapsed(rate, -10), Decimal::ZERO);
    }

    #[test]
    fn saturating_ops_clamp() {
        assert_eq!(saturating_add(Decimal::MAX, Decimal::ONE), Decimal::MAX);
        assert_eq!(saturating_mul(Decimal::MAX, Decimal::TWO), Decimal::MAX);
        assert_eq!(
            saturating_mul(Decimal::MAX, Decimal::NEGATIVE_ONE * Decimal::TWO),
            Decimal::MIN
        );
    }

    #[test]
    fn display_conversion() {
        assert_eq!(to_display(Decimal::new(55, 0)), 55.0);
        assert!(from_display(f64::NAN).is_none());
        assert_eq!(from_display(1.5), Some(Decimal::new(15, 1)));
    }

    proptest! {
        #[test]
        fn accrual_is_monotonic_in_time(
            cents in 0i64..1_000_000,
            a in 0i64..100_000,
            b in 0i64..100_000,
        ) {
            let rate = Decimal::new(cents, 2);
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(per_elapsed(rate, lo) <= per_elapsed(rate, hi));
        }
    }
}

//! Fixed-point amounts for balances and prices
//!
//! Every amount is an unsigned integer count of the smallest unit, scaled by
//! 10^18 ("wei-like" units). Arithmetic is checked and fails rather than
//! wrapping. Products go through a 256-bit intermediate and round toward
//! zero. `rust_decimal` is only used at the human-readable boundary
//! (parsing "254.11", presenting balances).

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::{ArithmeticError, ParseError};

uint::construct_uint! {
    /// 256-bit unsigned integer used for intermediate products.
    pub struct U256(4);
}

/// Number of fractional digits carried by every amount
pub const DECIMALS: u32 = 18;

/// One whole unit expressed in base units (10^18)
pub const WAD: u128 = 1_000_000_000_000_000_000;

/// Non-negative fixed-point quantity scaled by 10^18
///
/// Serialized as the base-unit integer in a string, e.g. one whole token is
/// `"1000000000000000000"`. `Display`/`FromStr` use human units instead
/// (`"1.5"`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Amount(u128);

/// Settlement-asset units per whole token, same 18-digit scale
pub type Price = Amount;

impl Amount {
    pub const ZERO: Amount = Amount(0);
    pub const MAX: Amount = Amount(u128::MAX);

    /// Create from base units
    pub const fn from_wei(wei: u128) -> Self {
        Self(wei)
    }

    /// Create from a whole number of units (`5` → 5.0)
    pub const fn from_whole(units: u64) -> Self {
        Self(units as u128 * WAD)
    }

    /// Base-unit integer value
    pub const fn as_wei(&self) -> u128 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, rhs: Amount) -> Result<Amount, ArithmeticError> {
        self.0
            .checked_add(rhs.0)
            .map(Amount)
            .ok_or(ArithmeticError::Overflow)
    }

    pub fn checked_sub(self, rhs: Amount) -> Result<Amount, ArithmeticError> {
        self.0
            .checked_sub(rhs.0)
            .map(Amount)
            .ok_or(ArithmeticError::Underflow)
    }

    /// Fixed-point product `self * price / 10^18`, rounded toward zero.
    ///
    /// Used to compute the settlement cost of `self` tokens at `price`.
    pub fn mul_price(self, price: Price) -> Result<Amount, ArithmeticError> {
        let product = U256::from(self.0) * U256::from(price.0);
        let scaled = product / U256::from(WAD);
        if scaled > U256::from(u128::MAX) {
            return Err(ArithmeticError::Overflow);
        }
        Ok(Amount(scaled.as_u128()))
    }

    /// Checked sum of a sequence of amounts
    pub fn checked_sum<'a, I>(amounts: I) -> Result<Amount, ArithmeticError>
    where
        I: IntoIterator<Item = &'a Amount>,
    {
        amounts
            .into_iter()
            .try_fold(Amount::ZERO, |acc, amount| acc.checked_add(*amount))
    }

    /// Convert a human-unit decimal (e.g. `254.11`) to a fixed-point amount.
    ///
    /// Rejects negative values and values with more than 18 fractional digits.
    pub fn from_decimal(value: Decimal) -> Result<Amount, ParseError> {
        let invalid = |reason: &str| ParseError::InvalidAmount {
            input: value.to_string(),
            reason: reason.to_string(),
        };

        if value.is_sign_negative() && !value.is_zero() {
            return Err(invalid("amount must not be negative"));
        }
        let scale = value.scale();
        if scale > DECIMALS {
            return Err(invalid("more than 18 fractional digits"));
        }

        let mantissa = value.mantissa().unsigned_abs();
        let factor = 10u128.pow(DECIMALS - scale);
        mantissa
            .checked_mul(factor)
            .map(Amount)
            .ok_or_else(|| invalid("amount out of range"))
    }

    /// Human-unit decimal view, if it fits in a `Decimal`
    pub fn to_decimal(&self) -> Option<Decimal> {
        let wei = i128::try_from(self.0).ok()?;
        Decimal::try_from_i128_with_scale(wei, DECIMALS)
            .ok()
            .map(|d| d.normalize())
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / WAD;
        let frac = self.0 % WAD;
        if frac == 0 {
            return write!(f, "{}", whole);
        }
        let digits = format!("{:018}", frac);
        write!(f, "{}.{}", whole, digits.trim_end_matches('0'))
    }
}

impl FromStr for Amount {
    type Err = ParseError;

    /// Parse human units, e.g. `"0.5"` or `"254.11"`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = Decimal::from_str(s.trim()).map_err(|e| ParseError::InvalidAmount {
            input: s.to_string(),
            reason: e.to_string(),
        })?;
        Amount::from_decimal(value)
    }
}

impl TryFrom<String> for Amount {
    type Error = ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value
            .parse::<u128>()
            .map(Amount)
            .map_err(|e| ParseError::InvalidAmount {
                input: value.clone(),
                reason: e.to_string(),
            })
    }
}

impl From<Amount> for String {
    fn from(amount: Amount) -> Self {
        amount.0.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_whole() {
        assert_eq!(Amount::from_whole(1).as_wei(), WAD);
        assert_eq!(Amount::from_whole(0), Amount::ZERO);
    }

    #[test]
    fn test_checked_add_overflow() {
        assert_eq!(
            Amount::MAX.checked_add(Amount::from_wei(1)),
            Err(ArithmeticError::Overflow)
        );
    }

    #[test]
    fn test_checked_sub_underflow() {
        assert_eq!(
            Amount::from_wei(1).checked_sub(Amount::from_wei(2)),
            Err(ArithmeticError::Underflow)
        );
        assert_eq!(
            Amount::from_wei(5).checked_sub(Amount::from_wei(2)),
            Ok(Amount::from_wei(3))
        );
    }

    #[test]
    fn test_mul_price_whole_units() {
        // 2 tokens at 1.0 costs 2.0
        let cost = Amount::from_whole(2).mul_price(Amount::from_whole(1)).unwrap();
        assert_eq!(cost, Amount::from_whole(2));
    }

    #[test]
    fn test_mul_price_fractional() {
        let amount: Amount = "1.5".parse().unwrap();
        let price: Amount = "254.11".parse().unwrap();
        let cost = amount.mul_price(price).unwrap();
        assert_eq!(cost, "381.165".parse().unwrap());
    }

    #[test]
    fn test_mul_price_rounds_toward_zero() {
        // 1 wei at 0.5 is half a wei, truncated to zero
        let cost = Amount::from_wei(1).mul_price("0.5".parse().unwrap()).unwrap();
        assert_eq!(cost, Amount::ZERO);

        let cost = Amount::from_wei(3).mul_price("0.5".parse().unwrap()).unwrap();
        assert_eq!(cost, Amount::from_wei(1));
    }

    #[test]
    fn test_mul_price_large_intermediate() {
        // Product exceeds u128 before scaling but the result fits
        let amount = Amount::from_whole(1_000_000_000);
        let price = Amount::from_whole(1_000_000_000);
        let cost = amount.mul_price(price).unwrap();
        assert_eq!(cost, Amount::from_whole(1_000_000_000_000_000_000));
    }

    #[test]
    fn test_mul_price_overflow() {
        let result = Amount::MAX.mul_price(Amount::from_whole(2));
        assert_eq!(result, Err(ArithmeticError::Overflow));
    }

    #[test]
    fn test_checked_sum() {
        let amounts = vec![Amount::from_whole(1), Amount::from_whole(2)];
        assert_eq!(Amount::checked_sum(&amounts), Ok(Amount::from_whole(3)));
        assert_eq!(Amount::checked_sum(&[]), Ok(Amount::ZERO));

        let overflow = vec![Amount::MAX, Amount::from_wei(1)];
        assert_eq!(Amount::checked_sum(&overflow), Err(ArithmeticError::Overflow));
    }

    #[test]
    fn test_parse_human_units() {
        assert_eq!("0.5".parse::<Amount>().unwrap().as_wei(), WAD / 2);
        assert_eq!("254.11".parse::<Amount>().unwrap().as_wei(), 254_110_000_000_000_000_000);
        assert_eq!("3".parse::<Amount>().unwrap(), Amount::from_whole(3));
    }

    #[test]
    fn test_parse_rejects_negative() {
        assert!(matches!(
            "-1".parse::<Amount>(),
            Err(ParseError::InvalidAmount { .. })
        ));
    }

    #[test]
    fn test_parse_rejects_excess_precision() {
        assert!(matches!(
            "0.0000000000000000001".parse::<Amount>(),
            Err(ParseError::InvalidAmount { .. })
        ));
    }

    #[test]
    fn test_display() {
        assert_eq!(Amount::from_whole(2).to_string(), "2");
        assert_eq!("0.5".parse::<Amount>().unwrap().to_string(), "0.5");
        assert_eq!(Amount::from_wei(1).to_string(), "0.000000000000000001");
    }

    #[test]
    fn test_to_decimal() {
        let amount: Amount = "254.11".parse().unwrap();
        assert_eq!(amount.to_decimal(), Some(Decimal::from_str("254.11").unwrap()));
        assert_eq!(Amount::MAX.to_decimal(), None);
    }

    #[test]
    fn test_serialization_uses_base_units() {
        let amount = Amount::from_whole(1);
        let json = serde_json::to_string(&amount).unwrap();
        assert_eq!(json, "\"1000000000000000000\"");

        let deserialized: Amount = serde_json::from_str(&json).unwrap();
        assert_eq!(amount, deserialized);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Multiplying by 1.0 is the identity
            #[test]
            fn fuzz_mul_price_unit_identity(wei in any::<u128>()) {
                let amount = Amount::from_wei(wei);
                prop_assert_eq!(amount.mul_price(Amount::from_whole(1)), Ok(amount));
            }

            /// Display output parses back to the same amount
            #[test]
            fn fuzz_display_parses_back(wei in 0u128..=u64::MAX as u128 * 1_000) {
                let amount = Amount::from_wei(wei);
                let parsed: Amount = amount.to_string().parse().unwrap();
                prop_assert_eq!(parsed, amount);
            }
        }
    }
}

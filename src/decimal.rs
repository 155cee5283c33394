//! Thin adapter over the arbitrary-precision decimal primitive.
//!
//! The engine treats decimals as an external collaborator (spec §6.3): this
//! module only needs to provide the algebraic contract, not a from-scratch
//! bignum implementation. `rust_decimal::Decimal` backs it; everything here
//! is a thin, immutable-value wrapper that adds the rounding-mode vocabulary
//! and scale/precision queries the rest of the engine depends on.

use std::cmp::Ordering;
use std::str::FromStr;

use rust_decimal::{Decimal as RdDecimal, MathematicalOps, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::error::DecimalError;

/// Rounding mode identifiers (spec §6.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoundingMode {
    Ceil,
    Floor,
    Down,
    Up,
    HalfUp,
    HalfDown,
    HalfEven,
    /// Implemented natively against `rust_decimal`'s half-away-from-zero-on-tie
    /// family rather than mapped onto `HalfCeil` as the original source did
    /// (spec §9(c)): ties round to the nearest odd digit.
    HalfOdd,
    /// Not part of spec §6.3's enumerated set, but `default_rounding` allows
    /// `NONE` to mean "do not round" (spec §6.2); kept here so callers can
    /// carry a single `RoundingMode` option end to end.
    None,
}

fn round_with_mode(d: RdDecimal, scale: u32, mode: RoundingMode) -> RdDecimal {
    match mode {
        RoundingMode::None => d,
        RoundingMode::Down => d.round_dp_with_strategy(scale, RoundingStrategy::ToZero),
        RoundingMode::Up => d.round_dp_with_strategy(scale, RoundingStrategy::AwayFromZero),
        RoundingMode::HalfUp => {
            d.round_dp_with_strategy(scale, RoundingStrategy::MidpointAwayFromZero)
        }
        RoundingMode::HalfDown => {
            d.round_dp_with_strategy(scale, RoundingStrategy::MidpointTowardZero)
        }
        RoundingMode::HalfEven => d.round_dp_with_strategy(scale, RoundingStrategy::MidpointNearestEven),
        RoundingMode::HalfOdd => round_half_odd(d, scale),
        RoundingMode::Ceil => round_ceil(d, scale),
        RoundingMode::Floor => round_floor(d, scale),
    }
}

fn round_ceil(d: RdDecimal, scale: u32) -> RdDecimal {
    let truncated = d.round_dp_with_strategy(scale, RoundingStrategy::ToZero);
    if d > truncated {
        truncated + smallest_unit(scale)
    } else {
        truncated
    }
}

fn round_floor(d: RdDecimal, scale: u32) -> RdDecimal {
    let truncated = d.round_dp_with_strategy(scale, RoundingStrategy::ToZero);
    if d < truncated {
        truncated - smallest_unit(scale)
    } else {
        truncated
    }
}

fn round_half_odd(d: RdDecimal, scale: u32) -> RdDecimal {
    let nearest_even = d.round_dp_with_strategy(scale, RoundingStrategy::MidpointNearestEven);
    let away = d.round_dp_with_strategy(scale, RoundingStrategy::MidpointAwayFromZero);
    // At a genuine midpoint the two strategies disagree; nearest-even picked the
    // even digit, so the odd candidate is whichever of {away, away-unit} is odd.
    if nearest_even == away {
        return nearest_even;
    }
    let unit = smallest_unit(scale);
    let lower = nearest_even - unit;
    if is_odd_last_digit(away, scale) {
        away
    } else if is_odd_last_digit(lower, scale) {
        lower
    } else {
        nearest_even
    }
}

fn is_odd_last_digit(d: RdDecimal, scale: u32) -> bool {
    let shifted = d * RdDecimal::from(10u64.pow(scale));
    let as_i128 = shifted.round().mantissa().unsigned_abs() % 10;
    as_i128 % 2 == 1
}

fn smallest_unit(scale: u32) -> RdDecimal {
    RdDecimal::new(1, scale)
}

/// Arbitrary-precision decimal value. Every operation returns a new value;
/// `Decimal` itself carries no mutable state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Decimal(RdDecimal);

impl Decimal {
    pub const ZERO: Decimal = Decimal(RdDecimal::ZERO);
    pub const ONE: Decimal = Decimal(RdDecimal::ONE);

    pub fn from_text(text: &str) -> Result<Self, DecimalError> {
        RdDecimal::from_str(text.trim())
            .map(Decimal)
            .map_err(|_| DecimalError::Invalid(text.to_string()))
    }

    pub fn from_i64(value: i64) -> Self {
        Decimal(RdDecimal::from(value))
    }

    pub fn from_f64(value: f64) -> Result<Self, DecimalError> {
        RdDecimal::try_from(value)
            .map(Decimal)
            .map_err(|_| DecimalError::Invalid(value.to_string()))
    }

    pub fn to_f64(self) -> f64 {
        use rust_decimal::prelude::ToPrimitive;
        self.0.to_f64().unwrap_or(f64::NAN)
    }

    /// Canonical decimal text representation (never scientific notation).
    pub fn to_canonical_text(self) -> String {
        self.0.normalize().to_string()
    }

    pub fn is_zero(self) -> bool {
        self.0.is_zero()
    }

    pub fn is_negative(self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    pub fn add(self, other: Decimal) -> Self {
        Decimal(self.0 + other.0)
    }

    pub fn sub(self, other: Decimal) -> Self {
        Decimal(self.0 - other.0)
    }

    pub fn mul(self, other: Decimal) -> Self {
        Decimal(self.0 * other.0)
    }

    pub fn div(self, other: Decimal, scale: u32, mode: RoundingMode) -> Result<Self, DecimalError> {
        if other.is_zero() {
            return Err(DecimalError::DivisionByZero);
        }
        let raw = self.0 / other.0;
        Ok(Decimal(round_with_mode(raw, scale, mode)))
    }

    pub fn rem(self, other: Decimal) -> Result<Self, DecimalError> {
        if other.is_zero() {
            return Err(DecimalError::DivisionByZero);
        }
        Ok(Decimal(self.0 % other.0))
    }

    pub fn neg(self) -> Self {
        Decimal(-self.0)
    }

    pub fn abs(self) -> Self {
        Decimal(self.0.abs())
    }

    pub fn pow(self, exponent: Decimal) -> Result<Self, DecimalError> {
        if exponent.0.fract().is_zero() {
            use rust_decimal::prelude::ToPrimitive;
            if let Some(exp) = exponent.0.to_i64() {
                return self
                    .0
                    .checked_powi(exp)
                    .map(Decimal)
                    .ok_or(DecimalError::Overflow);
            }
        }
        self.0
            .checked_powd(exponent.0)
            .map(Decimal)
            .ok_or(DecimalError::Overflow)
    }

    pub fn sqrt(self) -> Result<Self, DecimalError> {
        self.0.sqrt().map(Decimal).ok_or(DecimalError::Invalid(
            "square root of negative number".into(),
        ))
    }

    pub fn ln(self) -> Result<Self, DecimalError> {
        if self.0 <= RdDecimal::ZERO {
            return Err(DecimalError::Invalid("ln of non-positive number".into()));
        }
        Ok(Decimal(self.0.ln()))
    }

    pub fn log10(self) -> Result<Self, DecimalError> {
        if self.0 <= RdDecimal::ZERO {
            return Err(DecimalError::Invalid("log10 of non-positive number".into()));
        }
        Ok(Decimal(self.0.log10()))
    }

    pub fn round(self, scale: u32, mode: RoundingMode) -> Self {
        Decimal(round_with_mode(self.0, scale, mode))
    }

    pub fn floor_to(self, scale: u32) -> Self {
        Decimal(round_floor(self.0, scale))
    }

    pub fn ceil_to(self, scale: u32) -> Self {
        Decimal(round_ceil(self.0, scale))
    }

    pub fn truncate_to(self, scale: u32) -> Self {
        Decimal(self.0.round_dp_with_strategy(scale, RoundingStrategy::ToZero))
    }

    pub fn sign(self) -> i32 {
        if self.0.is_zero() {
            0
        } else if self.0.is_sign_negative() {
            -1
        } else {
            1
        }
    }

    /// Digits to the right of the decimal point.
    pub fn scale(self) -> u32 {
        self.0.scale()
    }

    /// Total count of significant digits.
    pub fn precision(self) -> u32 {
        let normalized = self.0.normalize();
        let digits = normalized.mantissa().unsigned_abs().to_string();
        digits.len() as u32
    }

    pub fn with_scale(self, scale: u32) -> Self {
        let mut v = self.0;
        v.rescale(scale);
        Decimal(v)
    }

    pub fn cmp3(self, other: Decimal) -> Ordering {
        self.0.cmp(&other.0)
    }

    /// Base-10 exponent of the most significant digit (`123.45` → `2`,
    /// `0.000123` → `-4`, `0` → `0`). Used to enforce `DecimalConfig`'s
    /// `max_exponent`/`min_exponent` bounds.
    pub fn exponent(self) -> i64 {
        if self.is_zero() {
            return 0;
        }
        let mantissa_digits = self.0.mantissa().unsigned_abs().to_string().len() as i64;
        mantissa_digits - 1 - self.0.scale() as i64
    }

    /// Checks this value's exponent and significant-digit count against the
    /// configured bounds, raising the same overflow/underflow errors a
    /// native bignum would raise on out-of-range results.
    pub fn enforce_bounds(
        self,
        max_exponent: i64,
        min_exponent: i64,
        max_precision: u32,
    ) -> Result<Self, DecimalError> {
        if !self.is_zero() {
            let exp = self.exponent();
            if exp > max_exponent {
                return Err(DecimalError::Overflow);
            }
            if exp < min_exponent {
                return Err(DecimalError::Underflow);
            }
        }
        if self.precision() > max_precision {
            return Err(DecimalError::Overflow);
        }
        Ok(self)
    }
}

impl std::fmt::Display for Decimal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_canonical_text())
    }
}

impl PartialOrd for Decimal {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp3(*other))
    }
}

impl Ord for Decimal {
    fn cmp(&self, other: &Self) -> Ordering {
        self.cmp3(*other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_decimal_addition() {
        let a = Decimal::from_text("0.1").unwrap();
        let b = Decimal::from_text("0.2").unwrap();
        assert_eq!(a.add(b).to_canonical_text(), "0.3");
    }

    #[test]
    fn exact_decimal_subtraction() {
        let a = Decimal::from_text("1000.10").unwrap();
        let b = Decimal::from_text("1000.00").unwrap();
        assert_eq!(a.sub(b).to_canonical_text(), "0.1");
    }

    #[test]
    fn exact_decimal_multiplication() {
        let a = Decimal::from_text("19.99").unwrap();
        let b = Decimal::from_i64(3);
        assert_eq!(a.mul(b).to_canonical_text(), "59.97");
    }

    #[test]
    fn division_by_zero_is_an_error() {
        let a = Decimal::from_i64(1);
        let z = Decimal::ZERO;
        assert_eq!(
            a.div(z, 10, RoundingMode::HalfUp).unwrap_err(),
            DecimalError::DivisionByZero
        );
    }

    #[test]
    fn round_half_up_matches_batch_example() {
        let a = Decimal::from_text("19.125").unwrap();
        assert_eq!(a.round(2, RoundingMode::HalfUp).to_canonical_text(), "19.13");
    }

    #[test]
    fn exponent_matches_leading_digit_position() {
        assert_eq!(Decimal::from_text("123.45").unwrap().exponent(), 2);
        assert_eq!(Decimal::from_text("0.000123").unwrap().exponent(), -4);
        assert_eq!(Decimal::ZERO.exponent(), 0);
    }

    #[test]
    fn enforce_bounds_rejects_exponent_outside_range() {
        let big = Decimal::from_text("10000000000").unwrap();
        assert_eq!(big.enforce_bounds(5, -5, 50).unwrap_err(), DecimalError::Overflow);
        let small = Decimal::from_text("0.0000001").unwrap();
        assert_eq!(small.enforce_bounds(5, -5, 50).unwrap_err(), DecimalError::Underflow);
        let fine = Decimal::from_text("12.5").unwrap();
        assert_eq!(fine.enforce_bounds(5, -5, 50).unwrap(), fine);
    }

    #[test]
    fn round_trip_stringify() {
        let a = Decimal::from_text("12345.6789").unwrap();
        let text = a.to_canonical_text();
        let back = Decimal::from_text(&text).unwrap();
        assert_eq!(a, back);
    }
}

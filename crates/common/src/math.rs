//! Exact 128-bit rational arithmetic for amount and price computations.
//!
//! Every amount exchanged by a trade is derived with a multiply-then-divide
//! over non-negative 64-bit operands. The product is formed in 128 bits so it
//! can never silently truncate, and the quotient is checked on the way back
//! into 64 bits so an out-of-range result is reported instead of wrapped.
//!
//! # Key Functions
//!
//! - [`mul_div_floor`]: `value * numerator / denominator`, rounded toward zero
//! - [`big_divide`]: the same computation with an explicit [`Rounding`] mode
//! - [`big_divide_unsigned`]: unsigned variant used by [`big_divide`]
//!
//! # Example
//!
//! ```
//! use newtrade_common::math::{mul_div_floor, MathError};
//!
//! assert_eq!(mul_div_floor(100, 3, 7), Ok(42));
//! assert_eq!(mul_div_floor(i64::MAX, 2, 1), Err(MathError::Overflow));
//! ```

use std::num::TryFromIntError;

use thiserror::Error;

/// Rounding mode for division operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rounding {
    /// Round toward zero (truncate).
    Down,
    /// Round away from zero (ceiling for positive results).
    Up,
}

/// Error type for math operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MathError {
    /// The result does not fit back into the operand width.
    #[error("overflow while performing big divide")]
    Overflow,
    /// Division by zero (or by a negative divisor) was attempted.
    #[error("division by zero")]
    DivisionByZero,
    /// An input was negative when non-negative was required.
    #[error("negative input where non-negative required")]
    NegativeInput,
}

impl From<TryFromIntError> for MathError {
    fn from(_: TryFromIntError) -> Self {
        MathError::Overflow
    }
}

/// Calculates `value * numerator / denominator`, rounding toward zero.
///
/// This is the single primitive behind every capacity bound and exchanged
/// amount. Callers decide what an [`MathError::Overflow`] means for them.
///
/// # Errors
///
/// - [`MathError::NegativeInput`] if `value` or `numerator` is negative
/// - [`MathError::DivisionByZero`] if `denominator <= 0`
/// - [`MathError::Overflow`] if the quotient exceeds `i64::MAX`
pub fn mul_div_floor(value: i64, numerator: i64, denominator: i64) -> Result<i64, MathError> {
    big_divide(value, numerator, denominator, Rounding::Down)
}

/// Calculates `A * B / C` when `A * B` might overflow 64 bits.
///
/// # Example
///
/// ```
/// use newtrade_common::math::{big_divide, Rounding};
///
/// let result = big_divide(1_000_000_000, 1_000_000, 1000, Rounding::Down);
/// assert_eq!(result, Ok(1_000_000_000_000));
/// assert_eq!(big_divide(10, 3, 4, Rounding::Up), Ok(8));
/// ```
pub fn big_divide(a: i64, b: i64, c: i64, rounding: Rounding) -> Result<i64, MathError> {
    if a < 0 || b < 0 {
        return Err(MathError::NegativeInput);
    }
    if c <= 0 {
        return Err(MathError::DivisionByZero);
    }

    let result = big_divide_unsigned(a as u64, b as u64, c as u64, rounding)?;
    Ok(i64::try_from(result)?)
}

/// Calculates `A * B / C` using unsigned arithmetic.
///
/// Returns [`MathError::Overflow`] if the result does not fit in `u64`.
pub fn big_divide_unsigned(a: u64, b: u64, c: u64, rounding: Rounding) -> Result<u64, MathError> {
    if c == 0 {
        return Err(MathError::DivisionByZero);
    }

    let product = big_multiply_unsigned(a, b);
    let c128 = c as u128;

    let result = match rounding {
        Rounding::Down => product / c128,
        // u64 * u64 + (u64 - 1) always fits in u128.
        Rounding::Up => product.div_ceil(c128),
    };

    Ok(u64::try_from(result)?)
}

/// Multiplies two u64 values, returning a u128 result.
///
/// This cannot overflow since u64 * u64 always fits in u128.
#[inline]
pub fn big_multiply_unsigned(a: u64, b: u64) -> u128 {
    (a as u128) * (b as u128)
}

//! Fibpipe Kernel: Arithmetic Primitives
//!
//! Sequence values are exact `BigUint`, pipeline values exact `BigInt`.
//! Native widths are only reached through checked narrowing, never by
//! truncation.

use num_bigint::{BigInt, BigUint};
use num_traits::ToPrimitive;

use crate::error::KernelError;

/// Values of the standard sequence that fit in `u64`: F(0) through F(93).
pub const MAX_U64_PULLS: u64 = 94;

/// Values of the standard sequence that fit in `u128`: F(0) through F(186).
pub const MAX_U128_PULLS: u64 = 187;

/// Exact addition. Cannot overflow.
pub fn exact_sum(a: &BigUint, b: &BigUint) -> BigUint {
    a + b
}

/// Narrow the value emitted at `index` to `u64`.
pub fn narrow_u64(value: &BigUint, index: u64) -> Result<u64, KernelError> {
    value
        .to_u64()
        .ok_or(KernelError::Overflow { index, target: "u64" })
}

/// Narrow the value emitted at `index` to `u128`.
pub fn narrow_u128(value: &BigUint, index: u64) -> Result<u128, KernelError> {
    value
        .to_u128()
        .ok_or(KernelError::Overflow { index, target: "u128" })
}

/// Parse a signed decimal integer. Surrounding whitespace is ignored.
pub fn parse_integer(text: &str) -> Result<BigInt, KernelError> {
    text.trim()
        .parse::<BigInt>()
        .map_err(|_| KernelError::InvalidInteger(text.to_string()))
}

/// Parse a non-negative decimal integer (sequence seeds, saved state).
pub fn parse_natural(text: &str) -> Result<BigUint, KernelError> {
    text.trim()
        .parse::<BigUint>()
        .map_err(|_| KernelError::InvalidInteger(text.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_sum_past_u64() {
        let max = BigUint::from(u64::MAX);
        let sum = exact_sum(&max, &BigUint::from(1u32));
        assert_eq!(sum.to_string(), "18446744073709551616");
    }

    #[test]
    fn test_narrow_u64_ok() {
        assert_eq!(narrow_u64(&BigUint::from(u64::MAX), 3).unwrap(), u64::MAX);
    }

    #[test]
    fn test_narrow_u64_overflow() {
        let too_big = BigUint::from(u64::MAX) + 1u32;
        let err = narrow_u64(&too_big, 94).unwrap_err();
        assert!(matches!(
            err,
            KernelError::Overflow { index: 94, target: "u64" }
        ));
    }

    #[test]
    fn test_narrow_u128_overflow() {
        let too_big = BigUint::from(u128::MAX) + 1u32;
        assert!(narrow_u128(&too_big, 187).is_err());
        assert_eq!(narrow_u128(&BigUint::from(u128::MAX), 0).unwrap(), u128::MAX);
    }

    #[test]
    fn test_parse_integer() {
        assert_eq!(parse_integer(" 42 ").unwrap(), BigInt::from(42));
        assert_eq!(parse_integer("-7").unwrap(), BigInt::from(-7));
        assert!(matches!(
            parse_integer(""),
            Err(KernelError::InvalidInteger(_))
        ));
        assert!(parse_integer("twelve").is_err());
    }

    #[test]
    fn test_parse_natural_rejects_sign() {
        assert_eq!(parse_natural("13").unwrap(), BigUint::from(13u32));
        assert!(parse_natural("-1").is_err());
    }
}

//! Overflow-free ratio arithmetic for reserve-based quotes

use num_bigint::BigUint;

/// `value * numerator / denominator`, floored.
///
/// Returns `None` on a zero denominator or when the result does not fit
/// in a u128.
pub fn mul_div(value: u128, numerator: u128, denominator: u128) -> Option<u128> {
    if denominator == 0 {
        return None;
    }

    let product = BigUint::from(value) * BigUint::from(numerator);
    let quotient = product / BigUint::from(denominator);
    u128::try_from(quotient).ok()
}

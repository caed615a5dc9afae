//! Checksum engine for 10-digit tax identifiers.
//!
//! The control digit is the weighted sum of the nine payload digits modulo 11.
//! A remainder of 10 has no single-digit representation, so any identifier whose
//! payload produces it is invalid.

/// Weight applied to each payload position.
pub const WEIGHTS: [u32; 9] = [6, 5, 7, 2, 3, 4, 5, 6, 7];

/// Number of digits in a complete identifier.
pub const NIP_LEN: usize = 10;

/// Remainder that marks a payload as unusable.
pub const INVALID_CHECKSUM: u8 = 10;

/// Compute the control value (0..=10) for a nine-digit payload.
///
/// Each element must be a single decimal digit.
#[must_use]
pub fn compute_checksum(payload: &[u8; 9]) -> u8 {
    let sum: u32 = payload
        .iter()
        .zip(WEIGHTS)
        .map(|(&digit, weight)| u32::from(digit) * weight)
        .sum();
    // Remainder is always < 11
    #[allow(clippy::cast_possible_truncation)]
    let checksum = (sum % 11) as u8;
    checksum
}

/// Check whether `candidate` is a structurally valid identifier.
///
/// Non-digit characters are stripped first, so formatted input such as
/// `526-000-12-46` is accepted. Returns `false` (never panics) when the
/// remaining digits are not exactly ten, when the computed checksum is 10, or
/// when it differs from the tenth digit. Leading zeros are allowed.
#[must_use]
pub fn is_valid(candidate: &str) -> bool {
    digits_of(candidate).is_some_and(|digits| checksum_matches(&digits))
}

/// Strip separators and return the ten digits, if there are exactly ten.
#[must_use]
pub fn digits_of(input: &str) -> Option<[u8; NIP_LEN]> {
    let mut digits = [0u8; NIP_LEN];
    let mut count = 0;

    for byte in input.bytes().filter(u8::is_ascii_digit) {
        if count == NIP_LEN {
            return None;
        }
        digits[count] = byte - b'0';
        count += 1;
    }

    (count == NIP_LEN).then_some(digits)
}

fn checksum_matches(digits: &[u8; NIP_LEN]) -> bool {
    let mut payload = [0u8; 9];
    payload.copy_from_slice(&digits[..9]);

    let checksum = compute_checksum(&payload);
    checksum != INVALID_CHECKSUM && checksum == digits[9]
}

//! Random candidate generation.
//!
//! Candidates are valid by construction: three non-zero leading digits, six
//! free digits, and the computed control digit. Payloads whose checksum is 10
//! are rejected and the whole payload is resampled.

use crate::checksum::{compute_checksum, INVALID_CHECKSUM};
use crate::types::Nip;
use rand::Rng;

/// Generate a random valid candidate using the thread-local RNG.
#[must_use]
pub fn generate() -> Nip {
    generate_with(&mut rand::thread_rng())
}

/// Generate a random valid candidate from the supplied RNG.
///
/// This is a rejection-sampling loop with no retry cap. Roughly one payload in
/// eleven is rejected, so termination relies on that probability rather than
/// on a bound.
pub fn generate_with<R: Rng + ?Sized>(rng: &mut R) -> Nip {
    loop {
        let mut payload = [0u8; 9];
        for digit in &mut payload[..3] {
            *digit = rng.gen_range(1..=9);
        }
        for digit in &mut payload[3..] {
            *digit = rng.gen_range(0..=9);
        }

        let checksum = compute_checksum(&payload);
        if checksum == INVALID_CHECKSUM {
            continue;
        }

        let mut digits = String::with_capacity(10);
        for digit in payload.iter().chain(std::iter::once(&checksum)) {
            digits.push(char::from(b'0' + digit));
        }
        return Nip::from_generated(digits);
    }
}

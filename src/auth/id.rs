//! Random identifiers.

use base64::Engine as _;

const ID_LENGTH_BYTES: usize = 9;

/// Generates a 12-character URL-safe random identifier.
///
/// Uses `getrandom` for entropy and encodes the result as URL-safe base64
/// without padding.
///
/// # Panics
///
/// Panics if the system random number generator fails.
pub fn generate_id() -> String {
    let mut buffer = [0u8; ID_LENGTH_BYTES];

    getrandom::fill(&mut buffer).expect("Failed to generate random bytes");

    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(buffer)
}

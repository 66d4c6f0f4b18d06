//! Salted password hashing.
//!
//! Stored form is `<salt>$<mac>`, both lowercase hex, where
//! `mac = HMAC-SHA256(key = pepper, salt || password)`.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

const SALT_LENGTH_BYTES: usize = 16;

#[derive(Clone, Default)]
pub struct PasswordHasher {
    pepper: String,
}

impl PasswordHasher {
    /// # Arguments
    ///
    /// - `pepper` - server-side secret mixed into every hash; may be empty
    pub fn new(pepper: impl Into<String>) -> Self {
        Self {
            pepper: pepper.into(),
        }
    }

    /// Hashes `password` with a fresh random salt.
    ///
    /// # Panics
    ///
    /// Panics if the system random number generator fails.
    pub fn hash(&self, password: &str) -> String {
        let mut salt = [0u8; SALT_LENGTH_BYTES];
        getrandom::fill(&mut salt).expect("Failed to generate random bytes");

        format!("{}${}", hex::encode(salt), hex::encode(self.mac(&salt, password)))
    }

    /// Checks `password` against a value produced by [`PasswordHasher::hash`].
    ///
    /// Malformed stored values never verify.
    pub fn verify(&self, password: &str, stored: &str) -> bool {
        let Some((salt, mac)) = stored.split_once('$') else {
            return false;
        };
        let (Ok(salt), Ok(mac)) = (hex::decode(salt), hex::decode(mac)) else {
            return false;
        };

        self.keyed(&salt, password).verify_slice(&mac).is_ok()
    }

    fn mac(&self, salt: &[u8], password: &str) -> Vec<u8> {
        self.keyed(salt, password).finalize().into_bytes().to_vec()
    }

    fn keyed(&self, salt: &[u8], password: &str) -> HmacSha256 {
        let mut mac = HmacSha256::new_from_slice(self.pepper.as_bytes())
            .expect("HMAC accepts any key length");
        mac.update(salt);
        mac.update(password.as_bytes());
        mac
    }
}

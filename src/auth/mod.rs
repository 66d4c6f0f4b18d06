//! Credentials: access tokens, password hashes and random identifiers.

pub mod id;
pub mod password;
pub mod token;

pub use id::generate_id;
pub use password::PasswordHasher;
pub use token::{Claims, TokenError, TokenService};

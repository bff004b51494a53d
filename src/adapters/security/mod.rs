//! Credential adapters: bcrypt password hashing and HS256 bearer tokens.

pub mod jwt;
pub mod password;

pub use jwt::JwtTokens;
pub use password::BcryptHasher;

//! bcrypt implementation of `PasswordPort`.

use crate::domain::DomainError;
use crate::ports::PasswordPort;

pub struct BcryptHasher {
    cost: u32,
}

impl BcryptHasher {
    /// `cost` is clamped to bcrypt's accepted range (4..=31).
    pub fn new(cost: u32) -> Self {
        Self {
            cost: cost.clamp(4, 31),
        }
    }
}

impl Default for BcryptHasher {
    fn default() -> Self {
        Self::new(bcrypt::DEFAULT_COST)
    }
}

impl PasswordPort for BcryptHasher {
    fn hash(&self, plain: &str) -> Result<String, DomainError> {
        bcrypt::hash(plain, self.cost).map_err(|e| DomainError::Auth(format!("hash failed: {e}")))
    }

    fn verify(&self, plain: &str, hash: &str) -> Result<bool, DomainError> {
        bcrypt::verify(plain, hash)
            .map_err(|e| DomainError::Auth(format!("stored hash unreadable: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_then_verify() {
        let hasher = BcryptHasher::new(4);
        let hash = hasher.hash("s3cret").unwrap();
        assert_ne!(hash, "s3cret");
        assert!(hasher.verify("s3cret", &hash).unwrap());
        assert!(!hasher.verify("wrong", &hash).unwrap());
    }

    #[test]
    fn test_garbage_hash_is_error() {
        let hasher = BcryptHasher::new(4);
        assert!(hasher.verify("x", "not-a-hash").is_err());
    }
}

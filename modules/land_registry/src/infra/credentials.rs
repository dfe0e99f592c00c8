//! bcrypt password hashing

use crate::domain::credentials::PasswordHasher;
use anyhow::Context;

/// bcrypt with a configurable cost factor
#[derive(Debug, Clone)]
pub struct BcryptPasswordHasher {
    cost: u32,
}

impl BcryptPasswordHasher {
    /// `cost` is clamped to the range bcrypt accepts
    pub fn new(cost: u32) -> Self {
        Self {
            cost: cost.clamp(4, 31),
        }
    }
}

impl Default for BcryptPasswordHasher {
    fn default() -> Self {
        Self::new(10)
    }
}

impl PasswordHasher for BcryptPasswordHasher {
    fn hash(&self, password: &str) -> anyhow::Result<String> {
        bcrypt::hash(password, self.cost).context("bcrypt hashing failed")
    }

    fn verify(&self, password: &str, hash: &str) -> anyhow::Result<bool> {
        bcrypt::verify(password, hash).context("bcrypt verification failed")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hasher = BcryptPasswordHasher::new(4);
        let hash = hasher.hash("parola-sigura").unwrap();

        assert_ne!(hash, "parola-sigura");
        assert!(hash.starts_with("$2"));
        assert!(hasher.verify("parola-sigura", &hash).unwrap());
        assert!(!hasher.verify("alta-parola", &hash).unwrap());
    }

    #[test]
    fn test_cost_is_clamped() {
        assert_eq!(BcryptPasswordHasher::new(1).cost, 4);
        assert_eq!(BcryptPasswordHasher::new(99).cost, 31);
    }
}

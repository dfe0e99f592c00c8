//! Password hashing seam

/// One-way password hashing used when accounts are created
pub trait PasswordHasher: Send + Sync {
    fn hash(&self, password: &str) -> anyhow::Result<String>;

    fn verify(&self, password: &str, hash: &str) -> anyhow::Result<bool>;
}

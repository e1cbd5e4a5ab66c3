/// Credential Hasher
///
/// One-way hash + compare for passwords, treated as an opaque collaborator by
/// the rest of the core. bcrypt keeps the comparison constant-time and the
/// stored hash salted; nothing outside this module touches the algorithm.
pub trait PasswordHasher: Send + Sync {
    fn hash(&self, plain: &str) -> Result<String, PasswordError>;
    fn compare(&self, plain: &str, hashed: &str) -> bool;
}

#[derive(Debug, thiserror::Error)]
#[error("password hashing failed")]
pub struct PasswordError;

pub struct BcryptHasher {
    cost: u32,
}

impl BcryptHasher {
    pub fn new() -> Self {
        Self {
            cost: bcrypt::DEFAULT_COST,
        }
    }

    /// Reduced-cost variant for tests, where DEFAULT_COST is needlessly slow.
    pub fn with_cost(cost: u32) -> Self {
        Self { cost }
    }
}

impl Default for BcryptHasher {
    fn default() -> Self {
        Self::new()
    }
}

impl PasswordHasher for BcryptHasher {
    fn hash(&self, plain: &str) -> Result<String, PasswordError> {
        bcrypt::hash(plain, self.cost).map_err(|e| {
            tracing::error!(error = ?e, "bcrypt hash failed");
            PasswordError
        })
    }

    fn compare(&self, plain: &str, hashed: &str) -> bool {
        // A hash that fails to parse compares unequal rather than erroring:
        // login must fail closed.
        bcrypt::verify(plain, hashed).unwrap_or(false)
    }
}

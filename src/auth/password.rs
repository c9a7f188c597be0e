//! Password hashing for login credentials.
//!
//! bcrypt embeds its salt and cost in the hash string, so verification
//! needs no state beyond the stored hash itself.

use bcrypt::{hash, verify, DEFAULT_COST};

/// Hash a plaintext password for storage.
pub fn hash_password(plain: &str) -> Result<String, bcrypt::BcryptError> {
    hash(plain, DEFAULT_COST)
}

/// Check a plaintext password against a stored hash.
///
/// A malformed hash string is a mismatch, not an error; the caller already
/// treats every failure as "invalid credentials".
pub fn verify_password(plain: &str, hashed: &str) -> bool {
    verify(plain, hashed).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_round_trips() {
        let hashed = hash_password("irfan123").unwrap();
        assert!(verify_password("irfan123", &hashed));
        assert!(!verify_password("wrong-password", &hashed));
    }

    #[test]
    fn hashes_are_salted() {
        let a = hash_password("same-input").unwrap();
        let b = hash_password("same-input").unwrap();
        assert_ne!(a, b);
        assert!(verify_password("same-input", &a));
        assert!(verify_password("same-input", &b));
    }

    #[test]
    fn malformed_hash_is_a_mismatch() {
        assert!(!verify_password("irfan123", "not-a-bcrypt-hash"));
        assert!(!verify_password("irfan123", ""));
    }
}

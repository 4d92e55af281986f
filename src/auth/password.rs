//! Salted SHA-256 password digests

use sha2::{Digest, Sha256};

/// Fresh random salt
pub fn generate_salt() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// Hex digest of `salt || password`
pub fn hash_password(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

/// Compare a candidate password against a stored salt and digest
pub fn verify_password(salt: &str, expected_hex: &str, candidate: &str) -> bool {
    let computed = hash_password(salt, candidate);
    // Length is fixed, compare every byte
    computed.len() == expected_hex.len()
        && computed
            .bytes()
            .zip(expected_hex.bytes())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let salt = generate_salt();
        let digest = hash_password(&salt, "admin123");
        assert_eq!(digest.len(), 64);
        assert!(verify_password(&salt, &digest, "admin123"));
        assert!(!verify_password(&salt, &digest, "admin124"));
        assert!(!verify_password("other", &digest, "admin123"));
    }

    #[test]
    fn test_salts_differ() {
        let a = hash_password(&generate_salt(), "pw");
        let b = hash_password(&generate_salt(), "pw");
        assert_ne!(a, b);
    }
}

//! Salted password hashing.
//!
//! Salts are 32 random bytes from the OS RNG, stored as 64 hex characters.
//! The stored hex text is itself the PBKDF2 salt input, so hashes produced by
//! older deployments with the same format keep verifying.

use rand::{rngs::OsRng, RngCore};
use sha2::Sha256;

pub const SALT_BYTES: usize = 32;
pub const HASH_BYTES: usize = 32;

/// Generate a fresh hex-encoded salt.
#[must_use]
pub fn generate_salt() -> String {
    let mut bytes = [0u8; SALT_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Derive the hex-encoded PBKDF2-HMAC-SHA256 key for `password` and `salt`.
#[must_use]
pub fn hash_password(password: &str, salt: &str, iterations: u32) -> String {
    let mut derived = [0u8; HASH_BYTES];
    pbkdf2::pbkdf2_hmac::<Sha256>(password.as_bytes(), salt.as_bytes(), iterations, &mut derived);
    hex::encode(derived)
}

/// Recompute the hash with the stored salt and compare in constant time.
#[must_use]
pub fn verify_password(password: &str, salt: &str, expected_hash: &str, iterations: u32) -> bool {
    let computed = hash_password(password, salt, iterations);
    constant_time_eq(computed.as_bytes(), expected_hash.as_bytes())
}

/// Byte comparison whose running time depends only on the lengths.
#[must_use]
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn salt_is_hex_of_32_bytes() {
        let salt = generate_salt();
        assert_eq!(salt.len(), SALT_BYTES * 2);
        assert!(salt.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn salts_are_not_reused() {
        assert_ne!(generate_salt(), generate_salt());
    }

    #[test]
    fn pbkdf2_hmac_sha256_known_vector() {
        assert_eq!(
            hash_password("password", "salt", 1),
            "120fb6cffcf8b32c43e7225256c4f837a86548c92ccc35480805987cb70be17b"
        );
        assert_eq!(
            hash_password("password", "salt", 2),
            "ae4d0c95af6b46d32d0adff928f06dd02a303f8ef3c251dfd6e2d85a95474c43"
        );
    }

    #[test]
    fn hash_is_deterministic() {
        let salt = generate_salt();
        assert_eq!(
            hash_password("foo", &salt, 1000),
            hash_password("foo", &salt, 1000)
        );
    }

    #[test]
    fn different_salts_give_different_hashes() {
        let a = hash_password("foo", &generate_salt(), 1000);
        let b = hash_password("foo", &generate_salt(), 1000);
        assert_ne!(a, b);
        assert_eq!(a.len(), HASH_BYTES * 2);
    }

    #[test]
    fn iteration_count_changes_the_hash() {
        let salt = generate_salt();
        assert_ne!(
            hash_password("foo", &salt, 1000),
            hash_password("foo", &salt, 1001)
        );
    }

    #[test]
    fn verify_password_matches_only_the_right_password() {
        let salt = generate_salt();
        let stored = hash_password("correct horse", &salt, 1000);
        assert!(verify_password("correct horse", &salt, &stored, 1000));
        assert!(!verify_password("wrong horse", &salt, &stored, 1000));
        assert!(!verify_password("correct horse", &generate_salt(), &stored, 1000));
        assert!(!verify_password("correct horse", &salt, &stored, 999));
    }

    #[test]
    fn constant_time_eq_works() {
        assert!(constant_time_eq(b"hello", b"hello"));
        assert!(!constant_time_eq(b"hello", b"world"));
        assert!(!constant_time_eq(b"short", b"longer"));
        assert!(constant_time_eq(b"", b""));
    }
}

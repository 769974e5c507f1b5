//! Salted PBKDF2-HMAC-SHA256 password hashing.
//!
//! Stored format: `pbkdf2:iterations:hex_salt:hex_hash`.

use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use sha2::Sha256;

const SCHEME: &str = "pbkdf2";
const ITERATIONS: u32 = 60_000;
const SALT_LEN: usize = 16;
const HASH_LEN: usize = 32;

pub fn hash_password(password: &str) -> String {
    let mut salt = [0u8; SALT_LEN];
    rand::thread_rng().fill_bytes(&mut salt);
    let hash = derive(password, &salt, ITERATIONS);
    format!(
        "{SCHEME}:{ITERATIONS}:{}:{}",
        hex::encode(salt),
        hex::encode(hash)
    )
}

/// Check `password` against a stored hash. Malformed stored values never match.
pub fn verify_password(password: &str, stored: &str) -> bool {
    let mut parts = stored.split(':');
    let (Some(scheme), Some(iterations), Some(salt), Some(expected), None) = (
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
    ) else {
        return false;
    };
    if scheme != SCHEME {
        return false;
    }
    let Ok(iterations) = iterations.parse::<u32>() else {
        return false;
    };
    let (Ok(salt), Ok(expected)) = (hex::decode(salt), hex::decode(expected)) else {
        return false;
    };
    if iterations == 0 || expected.len() != HASH_LEN {
        return false;
    }

    let actual = derive(password, &salt, iterations);
    actual
        .iter()
        .zip(expected.iter())
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}

fn derive(password: &str, salt: &[u8], iterations: u32) -> [u8; HASH_LEN] {
    let mut out = [0u8; HASH_LEN];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, iterations, &mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_roundtrip() {
        let stored = hash_password("s3cret");
        assert!(stored.starts_with("pbkdf2:60000:"));
        assert!(verify_password("s3cret", &stored));
        assert!(!verify_password("s3creT", &stored));
    }

    #[test]
    fn test_same_password_gets_distinct_salts() {
        assert_ne!(hash_password("pw"), hash_password("pw"));
    }

    #[test]
    fn test_plaintext_or_garbage_never_verifies() {
        assert!(!verify_password("pw", "pw"));
        assert!(!verify_password("pw", "pbkdf2:abc:00:00"));
        assert!(!verify_password("pw", "pbkdf2:1000:zz:zz"));
        assert!(!verify_password("pw", "bcrypt:1000:00:00"));
        assert!(!verify_password("pw", "pbkdf2:1000:00:00:extra"));
    }
}

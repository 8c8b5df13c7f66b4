use rand::RngCore;
use sha2::{Digest, Sha256};

const SALT_LENGTH: usize = 16;

/// Hashes a password with a fresh random salt. The result has the form `base64(salt)$base64(sha256(salt || password))`.
pub fn hash_password(password: &str) -> String {
    let mut salt = [0u8; SALT_LENGTH];
    rand::thread_rng().fill_bytes(&mut salt);
    format!("{}${}", base64::encode(salt), base64::encode(digest(&salt, password)))
}

/// Checks `password` against a hash produced by [`hash_password`]. Malformed hashes never verify.
pub fn verify_password(password: &str, hash: &str) -> bool {
    let Some((salt, expected)) = hash.split_once('$') else {
        return false;
    };
    let (Ok(salt), Ok(expected)) = (base64::decode(salt), base64::decode(expected)) else {
        return false;
    };
    let actual = digest(&salt, password);
    // constant time comparison
    actual.len() == expected.len() && actual.iter().zip(expected.iter()).fold(0u8, |acc, (a, b)| acc | (a ^ b)) == 0
}

fn digest(salt: &[u8], password: &str) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update(password.as_bytes());
    hasher.finalize().to_vec()
}

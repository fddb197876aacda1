//! Salted password hashing.
//!
//! Hashes are stored as `<salt>$<digest>`, both hex encoded, where the
//! digest is SHA3-256 over `salt || password`. Verification re-derives the
//! digest from the stored salt.

use rand::RngCore;
use sha3::{Digest, Sha3_256};

const SALT_LEN: usize = 16;

fn digest_hex(salt: &[u8], password: &str) -> String {
	let mut hasher = Sha3_256::new();
	hasher.update(salt);
	hasher.update(password.as_bytes());
	hex::encode(hasher.finalize())
}

/// Hashes a password with a fresh random salt.
pub fn hash_password(password: &str) -> String {
	let mut salt = [0u8; SALT_LEN];
	rand::thread_rng().fill_bytes(&mut salt);
	format!("{}${}", hex::encode(salt), digest_hex(&salt, password))
}

/// Checks a password against a stored `<salt>$<digest>` hash.
pub fn verify_password(password: &str, stored: &str) -> bool {
	let Some((salt_hex, digest)) = stored.split_once('$') else {
		return false;
	};
	let Ok(salt) = hex::decode(salt_hex) else {
		return false;
	};
	digest_hex(&salt, password) == digest
}

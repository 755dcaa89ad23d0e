//! Password hashing.

use domain::PasswordHasher;
use rand::RngCore;
use sha2::{Digest, Sha256};

const SCHEME: &str = "sha256";
const SALT_LEN: usize = 16;

/// Iterated, salted SHA-256.
///
/// Hashes are encoded as `sha256$<iterations>$<salt-hex>$<digest-hex>` so a
/// stored hash carries everything needed to verify it, including the
/// iteration count it was created with.
#[derive(Debug, Clone, Copy)]
pub struct SaltedSha256Hasher {
    iterations: u32,
}

impl SaltedSha256Hasher {
    pub const DEFAULT_ITERATIONS: u32 = 10_000;

    pub fn new(iterations: u32) -> Self {
        Self {
            iterations: iterations.max(1),
        }
    }

    fn digest(salt: &[u8], password: &str, iterations: u32) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(salt);
        hasher.update(password.as_bytes());
        let mut digest: [u8; 32] = hasher.finalize().into();

        for _ in 1..iterations {
            let mut hasher = Sha256::new();
            hasher.update(digest);
            hasher.update(salt);
            digest = hasher.finalize().into();
        }
        digest
    }
}

impl Default for SaltedSha256Hasher {
    fn default() -> Self {
        Self::new(Self::DEFAULT_ITERATIONS)
    }
}

impl PasswordHasher for SaltedSha256Hasher {
    fn hash(&self, password: &str) -> String {
        let mut salt = [0u8; SALT_LEN];
        rand::thread_rng().fill_bytes(&mut salt);
        let digest = Self::digest(&salt, password, self.iterations);
        format!(
            "{SCHEME}${}${}${}",
            self.iterations,
            to_hex(&salt),
            to_hex(&digest)
        )
    }

    fn verify(&self, hash: &str, password: &str) -> bool {
        let mut parts = hash.split('$');
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
        let (Ok(iterations), Some(salt), Some(expected)) = (
            iterations.parse::<u32>(),
            from_hex(salt),
            from_hex(expected),
        ) else {
            return false;
        };
        if iterations == 0 {
            return false;
        }

        let actual = Self::digest(&salt, password, iterations);
        constant_time_eq(&actual, &expected)
    }
}

fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

fn from_hex(s: &str) -> Option<Vec<u8>> {
    if s.len() % 2 != 0 || !s.is_ascii() {
        return None;
    }
    (0..s.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&s[i..i + 2], 16).ok())
        .collect()
}

/// Compares without short-circuiting on the first differing byte.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

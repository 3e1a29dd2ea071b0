//! Stable note GUIDs and numeric ids.

use sha2::{Digest, Sha256};

const BASE91_TABLE: &[u8] =
    b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789!#$%&()*+,-./:;<=>?@[]^_`{|}~";

/// GUID for a note built from `values`.
///
/// Values are joined with `__`, hashed with SHA-256, and the first eight
/// bytes (big-endian) are written in base91. Compatible with genanki's
/// `guid_for`, so notes keep their identity across rebuilds.
pub fn guid_for(values: &[&str]) -> String {
    let digest = Sha256::digest(values.join("__").as_bytes());
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    base91(u64::from_be_bytes(bytes))
}

fn base91(mut n: u64) -> String {
    let base = BASE91_TABLE.len() as u64;
    let mut out = Vec::new();
    while n > 0 {
        out.push(BASE91_TABLE[(n % base) as usize]);
        n /= base;
    }
    out.reverse();
    // Table is ASCII.
    out.into_iter().map(char::from).collect()
}

/// Deterministic id in `[1 << 30, 1 << 31)` derived from `name`.
///
/// Used for deck and note type ids when none is configured.
pub fn id_for(name: &str) -> i64 {
    let digest = Sha256::digest(name.as_bytes());
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    let n = u64::from_be_bytes(bytes) % (1 << 30);
    (n + (1 << 30)) as i64
}

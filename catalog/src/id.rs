//! Identifier generation strategies.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::IdGenerator;

const ALPHABET: &[u8; 62] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

/// Encode an unsigned 64-bit integer into base62 using the alphabet
/// 0-9, A-Z, a-z. Zero encodes to "0".
pub fn encode_base62(mut n: u64) -> String {
    if n == 0 {
        return "0".to_string();
    }
    // 62^11 > 2^64
    let mut buf = Vec::with_capacity(11);
    while n > 0 {
        buf.push(ALPHABET[(n % 62) as usize] as char);
        n /= 62;
    }
    buf.iter().rev().collect()
}

/// Monotonic base62 identifiers. Used by the in-memory store, where the demo
/// records already occupy the first few ids.
#[derive(Debug)]
pub struct SequentialIdGenerator {
    next: AtomicU64,
}

impl SequentialIdGenerator {
    /// Start handing out ids from `first`.
    pub fn starting_at(first: u64) -> Self {
        Self {
            next: AtomicU64::new(first),
        }
    }
}

impl Default for SequentialIdGenerator {
    fn default() -> Self {
        Self::starting_at(1)
    }
}

impl IdGenerator for SequentialIdGenerator {
    fn next_id(&self) -> String {
        encode_base62(self.next.fetch_add(1, Ordering::Relaxed))
    }
}

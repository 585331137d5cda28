//! Simulated transaction receipts.
//!
//! Nothing is submitted to a ledger. The hash is random and carries no
//! uniqueness or integrity guarantee; it only gives callers something to
//! show where a real transaction hash would go.

use crate::stream::StreamId;
use rand::Rng;
use serde::Serialize;
use std::fmt;

const HASH_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const HASH_BODY_LEN: usize = 26;

/// A stand-in transaction hash: `0x` followed by 26 base-36 characters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TxHash(String);

impl TxHash {
    /// Draws a fresh hash from the thread-local RNG.
    pub fn simulated() -> Self {
        Self::simulated_with(&mut rand::thread_rng())
    }

    pub fn simulated_with<R: Rng>(rng: &mut R) -> Self {
        let body: String = (0..HASH_BODY_LEN)
            .map(|_| HASH_ALPHABET[rng.gen_range(0..HASH_ALPHABET.len())] as char)
            .collect();
        TxHash(format!("0x{}", body))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Outcome of a simulated stream transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TxReceipt {
    pub hash: TxHash,
    pub stream_id: StreamId,

    /// Atomic units moved by the transaction: streamed to the recipient on
    /// create, paid out on withdraw, refunded to the sender on cancel.
    pub amount: u64,
}

impl TxReceipt {
    pub(crate) fn new(stream_id: StreamId, amount: u64) -> Self {
        TxReceipt {
            hash: TxHash::simulated(),
            stream_id,
            amount,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_hash_shape() {
        let hash = TxHash::simulated();
        let s = hash.as_str();

        assert!(s.starts_with("0x"));
        assert_eq!(s.len(), 2 + HASH_BODY_LEN);
        assert!(s[2..]
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
    }

    #[test]
    fn test_seeded_rng_is_reproducible() {
        let a = TxHash::simulated_with(&mut StdRng::seed_from_u64(7));
        let b = TxHash::simulated_with(&mut StdRng::seed_from_u64(7));
        assert_eq!(a, b);
    }
}

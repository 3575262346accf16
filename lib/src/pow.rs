use crate::codec;
use tracing::debug;

/// Default upper bound on the nonce search, inclusive.
pub const DEFAULT_MAX_NONCE: u64 = u32::MAX as u64;

const PROGRESS_INTERVAL: u64 = 1 << 20;

/// Hex digest of a byte string. Implementations must be pure.
pub trait Digest: Send + Sync + 'static {
    fn hash(&self, bytes: &[u8]) -> String;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256;

impl Digest for Sha256 {
    fn hash(&self, bytes: &[u8]) -> String {
        sha256::digest(bytes)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Solution {
    pub nonce: u64,
    pub hash: String,
}

pub fn meets_difficulty(hash: &str, difficulty: u32) -> bool {
    let difficulty = difficulty as usize;
    hash.len() >= difficulty && hash.bytes().take(difficulty).all(|b| b == b'0')
}

/// Find the smallest nonce in `0..=max_nonce` such that
/// `digest(prefix ‖ decimal(nonce))` starts with `difficulty` zero hex digits.
pub fn search<D: Digest + ?Sized>(
    prefix: &[u8],
    difficulty: u32,
    max_nonce: u64,
    digest: &D,
) -> Result<Solution, Error> {
    let mut buffer = Vec::with_capacity(prefix.len() + 20);
    buffer.extend_from_slice(prefix);
    for nonce in 0..=max_nonce {
        buffer.truncate(prefix.len());
        buffer.extend_from_slice(codec::encode_nonce(nonce).as_bytes());
        let hash = digest.hash(&buffer);
        if meets_difficulty(&hash, difficulty) {
            return Ok(Solution { nonce, hash });
        }
        if nonce > 0 && nonce % PROGRESS_INTERVAL == 0 {
            debug!(target: "toychain::pow", nonce, difficulty, "still searching");
        }
    }
    Err(Error::SearchExhausted { max_nonce })
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("no nonce up to {max_nonce} satisfies the difficulty")]
    SearchExhausted { max_nonce: u64 },
}

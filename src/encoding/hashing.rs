use super::EncodingError;
use md5::Md5;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Hash families a token can be bucketed with. The deployed model was
/// trained against `Md5`; switching strategy requires a retrained model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashStrategy {
    #[default]
    Md5,
    Sha256,
}

impl HashStrategy {
    fn digest(self, bytes: &[u8]) -> Vec<u8> {
        match self {
            HashStrategy::Md5 => Md5::digest(bytes).to_vec(),
            HashStrategy::Sha256 => Sha256::digest(bytes).to_vec(),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            HashStrategy::Md5 => "md5",
            HashStrategy::Sha256 => "sha256",
        }
    }
}

impl std::fmt::Display for HashStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Maps tokens onto slots `1..vocabulary_size` with the hashing trick.
/// Slot 0 is never produced; distinct tokens may share a slot.
#[derive(Debug, Clone, Copy)]
pub struct HashingEncoder {
    vocabulary_size: usize,
    strategy: HashStrategy,
}

impl HashingEncoder {
    pub fn new(vocabulary_size: usize, strategy: HashStrategy) -> Result<Self, EncodingError> {
        if vocabulary_size <= 1 {
            return Err(EncodingError::InvalidVocabularySize(vocabulary_size));
        }
        Ok(Self {
            vocabulary_size,
            strategy,
        })
    }

    pub fn vocabulary_size(&self) -> usize {
        self.vocabulary_size
    }

    pub fn strategy(&self) -> HashStrategy {
        self.strategy
    }

    /// Slot for a single token: `digest mod (N - 1) + 1`, digest read as a
    /// big-endian unsigned integer.
    pub fn slot(&self, token: &str) -> usize {
        let digest = self.strategy.digest(token.as_bytes());
        let modulus = (self.vocabulary_size - 1) as u64;
        reduce_big_endian(&digest, modulus) as usize + 1
    }

    pub fn encode<S: AsRef<str>>(&self, tokens: &[S]) -> Vec<usize> {
        tokens.iter().map(|t| self.slot(t.as_ref())).collect()
    }
}

/// Hashes `tokens` with the default strategy into `vocabulary_size` slots.
pub fn encode<S: AsRef<str>>(
    tokens: &[S],
    vocabulary_size: usize,
) -> Result<Vec<usize>, EncodingError> {
    Ok(HashingEncoder::new(vocabulary_size, HashStrategy::default())?.encode(tokens))
}

// Horner's rule over the digest bytes; the accumulator stays below
// modulus * 256, so u128 never overflows for any u64 modulus.
fn reduce_big_endian(bytes: &[u8], modulus: u64) -> u64 {
    let modulus = modulus as u128;
    let mut acc: u128 = 0;
    for &byte in bytes {
        acc = ((acc << 8) | byte as u128) % modulus;
    }
    acc as u64
}

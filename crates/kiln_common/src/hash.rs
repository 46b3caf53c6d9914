//! Content hashing for target fingerprints and file memoization.

use serde::{Deserialize, Serialize};
use std::fmt;
use xxhash_rust::xxh3::Xxh3;

/// A 128-bit content hash computed using XXH3.
///
/// Two inputs with the same `ContentHash` are assumed to be identical. The
/// hash is stable across machines and runs, which makes its hex rendering
/// usable as a cache key for build artifacts.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ContentHash([u8; 16]);

impl ContentHash {
    /// Computes a content hash from a byte slice using XXH3-128.
    pub fn from_bytes(data: &[u8]) -> Self {
        let hash = xxhash_rust::xxh3::xxh3_128(data);
        Self(hash.to_le_bytes())
    }

    /// Computes a hash over an ordered sequence of parts.
    ///
    /// Each part is length-prefixed, so `["ab", "c"]` and `["a", "bc"]` differ.
    pub fn from_parts<I, P>(parts: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<[u8]>,
    {
        let mut builder = HashBuilder::new();
        for part in parts {
            builder.update(part.as_ref());
        }
        builder.finish()
    }

    /// Returns the raw hash bytes.
    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({:02x}{:02x}..)", self.0[0], self.0[1])
    }
}

/// Streaming digest over length-prefixed parts.
///
/// Feed parts in a canonical order; the builder never sorts on its own.
pub struct HashBuilder {
    state: Xxh3,
}

impl HashBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self { state: Xxh3::new() }
    }

    /// Appends one part to the digest.
    pub fn update(&mut self, part: &[u8]) -> &mut Self {
        self.state.update(&(part.len() as u64).to_le_bytes());
        self.state.update(part);
        self
    }

    /// Appends a string part.
    pub fn update_str(&mut self, part: &str) -> &mut Self {
        self.update(part.as_bytes())
    }

    /// Appends an already-computed hash as a part.
    pub fn update_hash(&mut self, hash: &ContentHash) -> &mut Self {
        self.update(hash.as_bytes())
    }

    /// Produces the hash of everything appended so far.
    pub fn finish(&self) -> ContentHash {
        ContentHash(self.state.digest128().to_le_bytes())
    }
}

impl Default for HashBuilder {
    fn default() -> Self {
        Self::new()
    }
}

//! Content digests and exact comparison over memory-mapped files.
//!
//! # Overview
//!
//! This module provides the [`Hasher`] struct, which reads file contents
//! through read-only memory mappings. It is used twice in a run:
//! - the fingerprint phase computes a 256-bit [`DigestValue`] per file
//! - the resolver confirms digest matches with a full byte comparison
//!
//! Every mapping and file handle lives only for the duration of one call.
//!
//! The default digest is a 256-bit Jenkins-style mixer ([`JenkinsDigest`]).
//! It is fast and deterministic but not cryptographic, so equal digests are
//! always confirmed by [`Hasher::contents_equal`] before files are grouped.

use std::fmt;
use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use memmap2::Mmap;

use super::HashError;

/// Number of 32-bit words in a digest.
pub const HASH_WORDS: usize = 8;

/// A 256-bit content digest.
pub type DigestValue = [u32; HASH_WORDS];

/// Fingerprint attached to a candidate file.
///
/// `Unhashed` is used for buckets where hashing cannot pay off (exactly two
/// candidates, or empty files). It compares equal to every other `Unhashed`
/// and leaves the decision to the exact comparison step. It never collides
/// with a computed value, even an all-zero one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Digest {
    /// No digest was computed for this file.
    Unhashed,
    /// Digest computed over the full file content.
    Hashed(DigestValue),
}

impl Digest {
    /// Whether a digest was actually computed.
    #[must_use]
    pub fn is_hashed(&self) -> bool {
        matches!(self, Self::Hashed(_))
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unhashed => write!(f, "unhashed"),
            Self::Hashed(words) => {
                for word in words {
                    write!(f, "{word:08x}")?;
                }
                Ok(())
            }
        }
    }
}

/// A deterministic function from file content to a 256-bit digest.
///
/// Implementations must be pure: identical byte sequences always produce
/// identical values.
pub trait ContentDigest: Send + Sync {
    /// Compute the digest of `bytes`.
    fn digest(&self, bytes: &[u8]) -> DigestValue;
}

/// Bob Jenkins' 256-bit checksum mixer.
///
/// State starts with every word set to 1. Input is folded in 32-byte
/// little-endian blocks, each followed by four mixing rounds; the length
/// (mod 2^32) and the tail bytes are folded into the final block.
#[derive(Debug, Clone, Copy, Default)]
pub struct JenkinsDigest;

/// Block size consumed per round of mixing.
const BLOCK_LEN: usize = HASH_WORDS * 4;

#[inline]
fn mix(state: &mut DigestValue) {
    let [mut a, mut b, mut c, mut d, mut e, mut f, mut g, mut h] = *state;

    a ^= b << 11;
    d = d.wrapping_add(a);
    b = b.wrapping_add(c);
    b ^= c >> 2;
    e = e.wrapping_add(b);
    c = c.wrapping_add(d);
    c ^= d << 8;
    f = f.wrapping_add(c);
    d = d.wrapping_add(e);
    d ^= e >> 16;
    g = g.wrapping_add(d);
    e = e.wrapping_add(f);
    e ^= f << 10;
    h = h.wrapping_add(e);
    f = f.wrapping_add(g);
    f ^= g >> 4;
    a = a.wrapping_add(f);
    g = g.wrapping_add(h);
    g ^= h << 8;
    b = b.wrapping_add(g);
    h = h.wrapping_add(a);
    h ^= a >> 9;
    c = c.wrapping_add(h);
    a = a.wrapping_add(b);

    *state = [a, b, c, d, e, f, g, h];
}

#[inline]
fn mix_rounds(state: &mut DigestValue) {
    for _ in 0..4 {
        mix(state);
    }
}

impl ContentDigest for JenkinsDigest {
    fn digest(&self, bytes: &[u8]) -> DigestValue {
        let mut state: DigestValue = [1; HASH_WORDS];

        let mut blocks = bytes.chunks_exact(BLOCK_LEN);
        for block in &mut blocks {
            for (word, chunk) in state.iter_mut().zip(block.chunks_exact(4)) {
                let value = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
                *word = word.wrapping_add(value);
            }
            mix_rounds(&mut state);
        }

        // The low byte of the last word carries the length, so the last
        // three tail bytes land one byte higher than their position.
        state[HASH_WORDS - 1] = state[HASH_WORDS - 1].wrapping_add(bytes.len() as u32);
        for (i, &byte) in blocks.remainder().iter().enumerate() {
            let (word, shift) = if i < BLOCK_LEN - 4 {
                (i / 4, 8 * (i % 4))
            } else {
                (HASH_WORDS - 1, 8 * (i % 4 + 1))
            };
            state[word] = state[word].wrapping_add(u32::from(byte) << shift);
        }
        mix_rounds(&mut state);

        state
    }
}

/// Reads file contents for digesting and comparison.
///
/// Cheap to clone; the digest function is shared.
#[derive(Clone)]
pub struct Hasher {
    digest: Arc<dyn ContentDigest>,
}

impl fmt::Debug for Hasher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hasher")
            .field("digest", &"<digest>")
            .finish()
    }
}

impl Default for Hasher {
    fn default() -> Self {
        Self::new()
    }
}

impl Hasher {
    /// Create a hasher using [`JenkinsDigest`].
    #[must_use]
    pub fn new() -> Self {
        Self {
            digest: Arc::new(JenkinsDigest),
        }
    }

    /// Use a different digest function.
    #[must_use]
    pub fn with_digest(mut self, digest: Arc<dyn ContentDigest>) -> Self {
        self.digest = digest;
        self
    }

    /// Compute the digest of a file's full content.
    ///
    /// # Errors
    ///
    /// Returns [`HashError`] if the file cannot be opened or mapped, or no
    /// longer has the expected size.
    pub fn hash_file(&self, path: &Path, size: u64) -> Result<DigestValue, HashError> {
        let view = map_read_only(path, size)?;
        Ok(self.digest.digest(&view))
    }

    /// Compare the full contents of two files of the given size.
    ///
    /// Empty files are equal without being opened.
    ///
    /// # Errors
    ///
    /// Returns [`HashError`] if either file cannot be opened or mapped.
    pub fn contents_equal(&self, first: &Path, second: &Path, size: u64) -> Result<bool, HashError> {
        if size == 0 {
            return Ok(true);
        }
        let left = map_read_only(first, size)?;
        let right = map_read_only(second, size)?;
        Ok(*left == *right)
    }
}

/// Map a file read-only and check it still has the registered size.
///
/// The handle is closed before returning; the mapping is released when the
/// returned value is dropped.
fn map_read_only(path: &Path, size: u64) -> Result<Mmap, HashError> {
    let file = File::open(path).map_err(|source| HashError::Open {
        path: path.to_path_buf(),
        source,
    })?;

    // SAFETY: the mapping is read-only and dropped before the next file is
    // touched. A file resized since registration is rejected below before
    // any byte is read.
    let map = unsafe { Mmap::map(&file) }.map_err(|source| HashError::Map {
        path: path.to_path_buf(),
        source,
    })?;

    let actual = map.len() as u64;
    if actual != size {
        return Err(HashError::SizeChanged {
            path: path.to_path_buf(),
            expected: size,
            actual,
        });
    }

    log::trace!("Mapped {} ({} bytes)", path.display(), size);
    Ok(map)
}

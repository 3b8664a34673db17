//! Bloom filter over already-pushed paths.

use std::f64::consts::LN_2;

use crate::memory::codec::CodecError;

/// Largest filter accepted from a client, in bits.
pub const MAX_BITS: u64 = 1 << 20;

/// Largest number of hash rounds accepted from a client.
pub const MAX_ROUNDS: u32 = 64;

/// Size of the fixed header in the raw representation (m, k, word count).
pub(crate) const HEADER_LEN: usize = 24;

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Probabilistic set of paths already pushed to a client.
///
/// `test` may report a path that was never added (bounded by the
/// configured false-positive rate) but never misses one that was.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushMemory {
    m: u64,
    k: u32,
    words: Vec<u64>,
}

impl PushMemory {
    /// Create an empty filter of `m` bits probed with `k` hash rounds.
    ///
    /// Both are clamped to the range a client is allowed to send back,
    /// `1..=MAX_BITS` and `1..=MAX_ROUNDS`.
    pub fn new(m: u64, k: u32) -> Self {
        let m = m.clamp(1, MAX_BITS);
        let k = k.clamp(1, MAX_ROUNDS);
        Self {
            m,
            k,
            words: vec![0; word_count(m)],
        }
    }

    /// Create an empty filter sized for `expected` paths at the given
    /// false-positive rate.
    pub fn with_estimate(expected: u64, false_positive_rate: f64) -> Self {
        let (m, k) = estimate_parameters(expected, false_positive_rate);
        Self::new(m, k)
    }

    /// Number of bits in the filter.
    pub fn bits(&self) -> u64 {
        self.m
    }

    /// Number of hash rounds per path.
    pub fn rounds(&self) -> u32 {
        self.k
    }

    /// Returns true if nothing has been added.
    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|w| *w == 0)
    }

    /// Returns false only if `path` was definitely never added.
    pub fn test(&self, path: &str) -> bool {
        let (h1, h2) = base_hashes(path.as_bytes());
        (0..self.k).all(|i| {
            let bit = self.location(h1, h2, i);
            self.words[(bit / 64) as usize] & (1u64 << (bit % 64)) != 0
        })
    }

    /// Record `path` as pushed. Adding twice has no further effect.
    pub fn add(&mut self, path: &str) {
        let (h1, h2) = base_hashes(path.as_bytes());
        for i in 0..self.k {
            let bit = self.location(h1, h2, i);
            self.words[(bit / 64) as usize] |= 1u64 << (bit % 64);
        }
    }

    fn location(&self, h1: u64, h2: u64, round: u32) -> u64 {
        h1.wrapping_add(u64::from(round).wrapping_mul(h2)) % self.m
    }

    /// Length in bytes of the raw representation.
    pub fn encoded_len(&self) -> usize {
        HEADER_LEN + self.words.len() * 8
    }

    /// Append the raw big-endian representation to `out`.
    pub fn write_to(&self, out: &mut Vec<u8>) {
        out.reserve(self.encoded_len());
        out.extend_from_slice(&self.m.to_be_bytes());
        out.extend_from_slice(&u64::from(self.k).to_be_bytes());
        out.extend_from_slice(&(self.words.len() as u64).to_be_bytes());
        for word in &self.words {
            out.extend_from_slice(&word.to_be_bytes());
        }
    }

    /// Rebuild a filter from its raw representation.
    pub fn read_from(bytes: &[u8]) -> Result<Self, CodecError> {
        if bytes.len() < HEADER_LEN {
            return Err(CodecError::Truncated);
        }
        let m = read_u64(&bytes[0..8]);
        let k = read_u64(&bytes[8..16]);
        let count = read_u64(&bytes[16..24]);

        if m == 0 || m > MAX_BITS {
            return Err(CodecError::Malformed("bit count out of range"));
        }
        if k == 0 || k > u64::from(MAX_ROUNDS) {
            return Err(CodecError::Malformed("round count out of range"));
        }
        if count != word_count(m) as u64 {
            return Err(CodecError::Malformed("word count does not match bit count"));
        }

        let body = &bytes[HEADER_LEN..];
        let expected = count as usize * 8;
        if body.len() < expected {
            return Err(CodecError::Truncated);
        }
        if body.len() > expected {
            return Err(CodecError::Malformed("trailing bytes after filter"));
        }

        let words: Vec<u64> = body.chunks_exact(8).map(read_u64).collect();
        let spare = m % 64;
        if spare != 0 && words[words.len() - 1] >> spare != 0 {
            return Err(CodecError::Malformed("bits set beyond filter size"));
        }

        Ok(Self {
            m,
            k: k as u32,
            words,
        })
    }
}

/// Estimate `(m, k)` for `expected` entries at `false_positive_rate`.
pub fn estimate_parameters(expected: u64, false_positive_rate: f64) -> (u64, u32) {
    let n = expected.max(1) as f64;
    let m = (-n * false_positive_rate.ln() / (LN_2 * LN_2)).ceil().max(1.0);
    let k = (LN_2 * m / n).ceil().max(1.0);
    (m as u64, k as u32)
}

fn word_count(m: u64) -> usize {
    m.div_ceil(64) as usize
}

fn read_u64(bytes: &[u8]) -> u64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(bytes);
    u64::from_be_bytes(buf)
}

fn base_hashes(data: &[u8]) -> (u64, u64) {
    let mut h = FNV_OFFSET;
    for byte in data {
        h ^= u64::from(*byte);
        h = h.wrapping_mul(FNV_PRIME);
    }
    let h1 = splitmix64(h);
    (h1, splitmix64(h1 ^ 0x6a09_e667_f3bc_c909) | 1)
}

fn splitmix64(mut z: u64) -> u64 {
    z = z.wrapping_add(0x9e37_79b9_7f4a_7c15);
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

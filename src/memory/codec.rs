//! Cookie-safe encoding of a [`PushMemory`].
//!
//! Raw filter bytes are compressed with raw DEFLATE at the fastest level
//! and then base64 encoded with the standard alphabet and no padding.

use base64::engine::general_purpose::STANDARD_NO_PAD;
use base64::Engine;
use flate2::{Compress, Compression, Decompress, FlushCompress, FlushDecompress, Status};

use crate::memory::bloom::{PushMemory, HEADER_LEN, MAX_BITS};
use crate::memory::pool::ScratchPool;

/// Largest inflated representation accepted from a client.
const MAX_RAW_LEN: usize = HEADER_LEN + (MAX_BITS as usize) / 8;

/// Errors produced while encoding or decoding push memory.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("invalid base64 in push memory: {0}")]
    Encoding(#[from] base64::DecodeError),

    #[error("failed to compress push memory: {0}")]
    Compress(#[from] flate2::CompressError),

    #[error("failed to inflate push memory: {0}")]
    Decompress(#[from] flate2::DecompressError),

    #[error("push memory is truncated")]
    Truncated,

    #[error("push memory inflates past {limit} bytes")]
    TooLarge { limit: usize },

    #[error("malformed push memory: {0}")]
    Malformed(&'static str),
}

/// Encoder/decoder for the push memory cookie value.
///
/// Scratch compressors, decompressors and buffers are pooled and shared by
/// every request using this codec.
#[derive(Debug)]
pub struct StateCodec {
    level: Compression,
    compressors: ScratchPool<Compress>,
    decompressors: ScratchPool<Decompress>,
    buffers: ScratchPool<Vec<u8>>,
}

impl StateCodec {
    pub fn new() -> Self {
        Self {
            level: Compression::fast(),
            compressors: ScratchPool::default(),
            decompressors: ScratchPool::default(),
            buffers: ScratchPool::default(),
        }
    }

    /// Serialize, compress and text-encode `memory`.
    pub fn encode(&self, memory: &PushMemory) -> Result<String, CodecError> {
        let mut raw = self.buffers.checkout(Vec::new);
        memory.write_to(&mut raw);

        let mut compressed = self.buffers.checkout(Vec::new);
        let mut compressor = self.compressors.checkout(|| Compress::new(self.level, false));
        deflate(&mut compressor, &raw, &mut compressed)?;
        compressor.mark_clean();

        let encoded = STANDARD_NO_PAD.encode(compressed.as_slice());
        raw.mark_clean();
        compressed.mark_clean();
        Ok(encoded)
    }

    /// Inverse of [`StateCodec::encode`].
    pub fn decode(&self, value: &str) -> Result<PushMemory, CodecError> {
        let mut compressed = self.buffers.checkout(Vec::new);
        STANDARD_NO_PAD.decode_vec(value, &mut compressed)?;

        let mut raw = self.buffers.checkout(Vec::new);
        let mut decompressor = self.decompressors.checkout(|| Decompress::new(false));
        inflate(&mut decompressor, &compressed, &mut raw, MAX_RAW_LEN)?;
        decompressor.mark_clean();

        let memory = PushMemory::read_from(&raw)?;
        compressed.mark_clean();
        raw.mark_clean();
        Ok(memory)
    }
}

impl Default for StateCodec {
    fn default() -> Self {
        Self::new()
    }
}

fn deflate(compressor: &mut Compress, input: &[u8], out: &mut Vec<u8>) -> Result<(), CodecError> {
    out.reserve(input.len() / 2 + 64);
    loop {
        let consumed = compressor.total_in() as usize;
        if out.len() == out.capacity() {
            out.reserve(out.capacity().max(64));
        }
        match compressor.compress_vec(&input[consumed..], out, FlushCompress::Finish)? {
            Status::StreamEnd => return Ok(()),
            Status::Ok | Status::BufError => {}
        }
    }
}

fn inflate(
    decompressor: &mut Decompress,
    input: &[u8],
    out: &mut Vec<u8>,
    limit: usize,
) -> Result<(), CodecError> {
    // One byte of headroom tells a stream of exactly `limit` bytes apart
    // from one that keeps going.
    let cap = limit.saturating_add(1);
    out.reserve_exact(input.len().saturating_mul(4).clamp(64, cap));
    loop {
        let consumed = decompressor.total_in() as usize;
        let produced = decompressor.total_out();
        if out.len() == out.capacity() {
            if out.len() >= cap {
                return Err(CodecError::TooLarge { limit });
            }
            out.reserve_exact(out.capacity().min(cap - out.len()));
        }

        let status =
            decompressor.decompress_vec(&input[consumed..], out, FlushDecompress::None)?;
        if out.len() > limit {
            return Err(CodecError::TooLarge { limit });
        }
        if status == Status::StreamEnd {
            if (decompressor.total_in() as usize) < input.len() {
                return Err(CodecError::Malformed("trailing bytes after deflate stream"));
            }
            return Ok(());
        }

        let stalled = decompressor.total_in() as usize == consumed
            && decompressor.total_out() == produced;
        if stalled && out.len() < out.capacity() {
            return Err(CodecError::Truncated);
        }
    }
}

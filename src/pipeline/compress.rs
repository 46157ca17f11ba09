use crate::error::{ChronosealError, Result};
use crate::pipeline::huffman::{compress_huffman, decompress_huffman};
use crate::pipeline::traits::CompressionCodec;
use crate::settings::Compression;
use std::io::{Read, Write};

/// Magic bytes of a serialized `CompressedResult`
const RESULT_MAGIC: &[u8; 4] = b"CPR1";

/// Magic + algorithm + original length
const RESULT_HEADER: usize = 4 + 1 + 8;

/// Self-describing compressed payload
/// Layout: [magic: 4][algorithm: 1][original_len: 8 LE][payload...]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressedResult {
    pub algorithm: Compression,
    pub original_len: u64,
    pub payload: Vec<u8>,
}

impl CompressedResult {
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(RESULT_HEADER + self.payload.len());
        buf.extend_from_slice(RESULT_MAGIC);
        buf.push(self.algorithm.to_byte());
        buf.extend_from_slice(&self.original_len.to_le_bytes());
        buf.extend_from_slice(&self.payload);
        buf
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < RESULT_HEADER || &data[..4] != RESULT_MAGIC {
            return Err(ChronosealError::DecompressionFailure(
                "not a compressed payload".into(),
            ));
        }
        let algorithm = Compression::from_byte(data[4]).ok_or_else(|| {
            ChronosealError::DecompressionFailure(format!("unknown algorithm id {}", data[4]))
        })?;
        let mut len_bytes = [0u8; 8];
        len_bytes.copy_from_slice(&data[5..RESULT_HEADER]);
        Ok(Self {
            algorithm,
            original_len: u64::from_le_bytes(len_bytes),
            payload: data[RESULT_HEADER..].to_vec(),
        })
    }
}

/// Default codec: Huffman plus the zstd, lz4 and brotli backends
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardCompressor;

impl StandardCompressor {
    pub fn new() -> Self {
        Self
    }
}

impl CompressionCodec for StandardCompressor {
    fn compress(&self, data: &[u8], algorithm: Compression) -> Result<CompressedResult> {
        Ok(CompressedResult {
            algorithm,
            original_len: data.len() as u64,
            payload: compress(data, algorithm)?,
        })
    }

    fn decompress(&self, compressed: &CompressedResult) -> Result<Vec<u8>> {
        let original_len = usize::try_from(compressed.original_len).map_err(|_| {
            ChronosealError::DecompressionFailure("original length overflows usize".into())
        })?;
        let data = decompress(&compressed.payload, compressed.algorithm, original_len)?;
        if data.len() != original_len {
            return Err(ChronosealError::DecompressionFailure(format!(
                "expected {} bytes, got {}",
                original_len,
                data.len()
            )));
        }
        Ok(data)
    }
}

/// Compress data using the specified algorithm
pub fn compress(data: &[u8], algorithm: Compression) -> Result<Vec<u8>> {
    match algorithm {
        Compression::Huffman => compress_huffman(data),
        Compression::Zstd => compress_zstd(data),
        Compression::Lz4 => compress_lz4(data),
        Compression::Brotli => compress_brotli(data),
    }
}

/// Decompress data using the specified algorithm
pub fn decompress(data: &[u8], algorithm: Compression, original_len: usize) -> Result<Vec<u8>> {
    match algorithm {
        Compression::Huffman => decompress_huffman(data, original_len),
        Compression::Zstd => decompress_zstd(data),
        Compression::Lz4 => decompress_lz4(data),
        Compression::Brotli => decompress_brotli(data),
    }
}

fn compress_zstd(data: &[u8]) -> Result<Vec<u8>> {
    zstd::encode_all(data, 3)
        .map_err(|e| ChronosealError::CompressionFailure(format!("zstd: {}", e)))
}

fn decompress_zstd(data: &[u8]) -> Result<Vec<u8>> {
    zstd::decode_all(data)
        .map_err(|e| ChronosealError::DecompressionFailure(format!("zstd: {}", e)))
}

fn compress_lz4(data: &[u8]) -> Result<Vec<u8>> {
    Ok(lz4_flex::compress_prepend_size(data))
}

fn decompress_lz4(data: &[u8]) -> Result<Vec<u8>> {
    lz4_flex::decompress_size_prepended(data)
        .map_err(|e| ChronosealError::DecompressionFailure(format!("lz4: {}", e)))
}

fn compress_brotli(data: &[u8]) -> Result<Vec<u8>> {
    let mut output = Vec::new();
    let mut writer = brotli::CompressorWriter::new(&mut output, 4096, 9, 22);
    writer
        .write_all(data)
        .map_err(|e| ChronosealError::CompressionFailure(format!("brotli: {}", e)))?;
    drop(writer);
    Ok(output)
}

fn decompress_brotli(data: &[u8]) -> Result<Vec<u8>> {
    let mut output = Vec::new();
    let mut reader = brotli::Decompressor::new(data, 4096);
    reader
        .read_to_end(&mut output)
        .map_err(|e| ChronosealError::DecompressionFailure(format!("brotli: {}", e)))?;
    Ok(output)
}

//! Canonical Huffman coding.
//!
//! Payload layout: `[code length per byte value: 256][bitstream]`. Only the
//! code lengths are stored; both sides rebuild the same canonical codes from
//! them. The bitstream is MSB-first and zero padded to a whole byte, so the
//! caller must supply the symbol count on decode.

use crate::error::{ChronosealError, Result};
use bitvec::prelude::*;
use std::cmp::Reverse;
use std::collections::BinaryHeap;

const SYMBOLS: usize = 256;
const MAX_CODE_LEN: usize = 63;

/// Compress `data` into a Huffman payload
pub fn compress_huffman(data: &[u8]) -> Result<Vec<u8>> {
    let mut frequencies = [0u64; SYMBOLS];
    for &byte in data {
        frequencies[byte as usize] += 1;
    }

    let lengths = code_lengths(&frequencies)?;
    let codes = canonical_codes(&lengths);

    let mut stream: BitVec<u8, Msb0> = BitVec::with_capacity(data.len() * 4);
    for &byte in data {
        let (code, len) = codes[byte as usize];
        for shift in (0..len).rev() {
            stream.push((code >> shift) & 1 == 1);
        }
    }
    let padded = stream.len().div_ceil(8) * 8;
    stream.resize(padded, false);

    let mut output = Vec::with_capacity(SYMBOLS + padded / 8);
    output.extend_from_slice(&lengths);
    output.extend_from_slice(&stream.into_vec());
    Ok(output)
}

/// Decode `symbol_count` bytes from a Huffman payload
pub fn decompress_huffman(payload: &[u8], symbol_count: usize) -> Result<Vec<u8>> {
    if payload.len() < SYMBOLS {
        return Err(ChronosealError::DecompressionFailure(
            "huffman: missing code length table".into(),
        ));
    }
    let (table, stream) = payload.split_at(SYMBOLS);
    if symbol_count == 0 {
        return Ok(Vec::new());
    }

    let mut lengths = [0u8; SYMBOLS];
    lengths.copy_from_slice(table);
    let decoder = CanonicalDecoder::new(&lengths)?;

    let bits = stream.view_bits::<Msb0>();
    let mut output = Vec::with_capacity(symbol_count.min(bits.len()));
    let mut code = 0u64;
    let mut len = 0usize;

    for bit in bits.iter().by_vals() {
        code = (code << 1) | bit as u64;
        len += 1;
        if let Some(symbol) = decoder.lookup(code, len) {
            output.push(symbol);
            if output.len() == symbol_count {
                return Ok(output);
            }
            code = 0;
            len = 0;
        } else if len >= MAX_CODE_LEN {
            return Err(ChronosealError::DecompressionFailure(
                "huffman: invalid code in bitstream".into(),
            ));
        }
    }

    Err(ChronosealError::DecompressionFailure(format!(
        "huffman: bitstream ended after {} of {} symbols",
        output.len(),
        symbol_count
    )))
}

/// Code length per symbol from symbol frequencies
fn code_lengths(frequencies: &[u64; SYMBOLS]) -> Result<[u8; SYMBOLS]> {
    let mut lengths = [0u8; SYMBOLS];
    let used: Vec<usize> = (0..SYMBOLS).filter(|&s| frequencies[s] > 0).collect();

    match used.len() {
        0 => return Ok(lengths),
        1 => {
            lengths[used[0]] = 1;
            return Ok(lengths);
        }
        _ => {}
    }

    // Leaves are nodes 0..256, merged nodes are appended after them
    let mut parent: Vec<usize> = vec![usize::MAX; SYMBOLS];
    let mut heap: BinaryHeap<Reverse<(u64, usize)>> = used
        .iter()
        .map(|&s| Reverse((frequencies[s], s)))
        .collect();

    while heap.len() > 1 {
        let (Some(Reverse((w1, a))), Some(Reverse((w2, b)))) = (heap.pop(), heap.pop()) else {
            break;
        };
        let node = parent.len();
        parent.push(usize::MAX);
        parent[a] = node;
        parent[b] = node;
        heap.push(Reverse((w1 + w2, node)));
    }

    for &symbol in &used {
        let mut depth = 0usize;
        let mut node = symbol;
        while parent[node] != usize::MAX {
            node = parent[node];
            depth += 1;
        }
        if depth > MAX_CODE_LEN {
            return Err(ChronosealError::CompressionFailure(format!(
                "huffman: code length {} exceeds {} bits",
                depth, MAX_CODE_LEN
            )));
        }
        lengths[symbol] = depth as u8;
    }
    Ok(lengths)
}

/// Symbols with a code, ordered by (length, value)
fn canonical_order(lengths: &[u8; SYMBOLS]) -> Vec<usize> {
    let mut symbols: Vec<usize> = (0..SYMBOLS).filter(|&s| lengths[s] > 0).collect();
    symbols.sort_by_key(|&s| (lengths[s], s));
    symbols
}

/// (code, length) per symbol
fn canonical_codes(lengths: &[u8; SYMBOLS]) -> [(u64, u8); SYMBOLS] {
    let mut codes = [(0u64, 0u8); SYMBOLS];
    let mut code = 0u64;
    let mut prev_len = 0u8;
    for (i, symbol) in canonical_order(lengths).into_iter().enumerate() {
        let len = lengths[symbol];
        if i > 0 {
            code = (code + 1) << (len - prev_len);
        }
        codes[symbol] = (code, len);
        prev_len = len;
    }
    codes
}

struct CanonicalDecoder {
    /// Symbols in canonical order
    symbols: Vec<u8>,
    count: [u64; MAX_CODE_LEN + 1],
    first_code: [u64; MAX_CODE_LEN + 1],
    first_index: [usize; MAX_CODE_LEN + 1],
}

impl CanonicalDecoder {
    fn new(lengths: &[u8; SYMBOLS]) -> Result<Self> {
        let mut count = [0u64; MAX_CODE_LEN + 1];
        for &len in lengths.iter() {
            let len = len as usize;
            if len > MAX_CODE_LEN {
                return Err(ChronosealError::DecompressionFailure(format!(
                    "huffman: code length {} exceeds {} bits",
                    len, MAX_CODE_LEN
                )));
            }
            if len > 0 {
                count[len] += 1;
            }
        }
        if count.iter().all(|&c| c == 0) {
            return Err(ChronosealError::DecompressionFailure(
                "huffman: empty code table".into(),
            ));
        }

        let mut first_code = [0u64; MAX_CODE_LEN + 1];
        let mut first_index = [0usize; MAX_CODE_LEN + 1];
        let mut code = 0u64;
        let mut index = 0usize;
        for len in 1..=MAX_CODE_LEN {
            first_code[len] = code;
            first_index[len] = index;
            code = code.saturating_add(count[len]).saturating_mul(2);
            index += count[len] as usize;
        }

        let symbols = canonical_order(lengths)
            .into_iter()
            .map(|s| s as u8)
            .collect();

        Ok(Self {
            symbols,
            count,
            first_code,
            first_index,
        })
    }

    fn lookup(&self, code: u64, len: usize) -> Option<u8> {
        if len == 0 || len > MAX_CODE_LEN || code < self.first_code[len] {
            return None;
        }
        let offset = code - self.first_code[len];
        if offset >= self.count[len] {
            return None;
        }
        self.symbols
            .get(self.first_index[len] + offset as usize)
            .copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(data: &[u8]) {
        let payload = compress_huffman(data).unwrap();
        let restored = decompress_huffman(&payload, data.len()).unwrap();
        assert_eq!(restored, data);
    }

    #[test]
    fn test_roundtrip_text() {
        roundtrip(b"abracadabra, the quick brown fox jumps over the lazy dog");
    }

    #[test]
    fn test_roundtrip_single_symbol() {
        roundtrip(&[0xAB; 16]);
    }

    #[test]
    fn test_roundtrip_empty() {
        roundtrip(b"");
    }

    #[test]
    fn test_roundtrip_all_byte_values() {
        let data: Vec<u8> = (0..4096).map(|i| (i * 7 % 256) as u8).collect();
        roundtrip(&data);
    }

    #[test]
    fn test_skewed_input_shrinks() {
        let mut data = vec![b'a'; 10_000];
        data.extend_from_slice(b"bcdefg");
        let payload = compress_huffman(&data).unwrap();
        assert!(payload.len() < data.len() / 4);
    }

    #[test]
    fn test_canonical_codes_are_prefix_free() {
        let mut frequencies = [0u64; SYMBOLS];
        for (i, f) in [45u64, 13, 12, 16, 9, 5].into_iter().enumerate() {
            frequencies[b'a' as usize + i] = f;
        }
        let lengths = code_lengths(&frequencies).unwrap();
        let codes = canonical_codes(&lengths);
        let used: Vec<(u64, u8)> = (0..SYMBOLS)
            .filter(|&s| lengths[s] > 0)
            .map(|s| codes[s])
            .collect();
        for (i, &(a, la)) in used.iter().enumerate() {
            for (j, &(b, lb)) in used.iter().enumerate() {
                if i == j || la > lb {
                    continue;
                }
                assert_ne!(b >> (lb - la), a, "code {:b} prefixes {:b}", a, b);
            }
        }
        // Most frequent symbol gets the shortest code
        assert_eq!(lengths[b'a' as usize], 1);
    }

    #[test]
    fn test_truncated_stream_fails() {
        let data = b"truncate this payload please".to_vec();
        let mut payload = compress_huffman(&data).unwrap();
        payload.truncate(SYMBOLS + 2);
        assert!(matches!(
            decompress_huffman(&payload, data.len()),
            Err(ChronosealError::DecompressionFailure(_))
        ));
    }

    #[test]
    fn test_missing_table_fails() {
        assert!(decompress_huffman(&[0u8; 10], 3).is_err());
    }
}

use crate::error::{ChronosealError, Result};
use crate::pipeline::traits::{Bits, DecodeOutcome, ErrorCorrection};
use bitvec::prelude::*;

pub const MIN_STRENGTH: u8 = 1;
pub const MAX_STRENGTH: u8 = 6;

/// Bytes of length prefix encoded in front of the data
const LENGTH_PREFIX: usize = 8;

/// Shape of one Hamming codeword for a given strength
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HammingGeometry {
    /// Parity bits per codeword
    pub parity_bits: usize,
    /// Total bits per codeword (2^r - 1)
    pub codeword_bits: usize,
    /// Data bits per codeword (n - r)
    pub data_bits: usize,
}

impl HammingGeometry {
    /// Strength 1 is Hamming(127,120), strength 6 is Hamming(3,1)
    pub fn for_strength(strength: u8) -> Result<Self> {
        if !(MIN_STRENGTH..=MAX_STRENGTH).contains(&strength) {
            return Err(ChronosealError::InvalidStrength(strength));
        }
        let parity_bits = 8 - strength as usize;
        let codeword_bits = (1usize << parity_bits) - 1;
        Ok(Self {
            parity_bits,
            codeword_bits,
            data_bits: codeword_bits - parity_bits,
        })
    }

    /// Redundancy added per data bit
    pub fn overhead_ratio(&self) -> f64 {
        self.codeword_bits as f64 / self.data_bits as f64
    }
}

/// Single-error-correcting Hamming code
///
/// Codeword positions are numbered from 1; positions that are powers of two
/// hold parity, the rest hold data in order. The byte length of the input is
/// encoded ahead of the data so the zero padding of the last codeword and of
/// the final byte never reaches the decoded output.
#[derive(Debug, Clone, Copy, Default)]
pub struct HammingCodec;

impl HammingCodec {
    pub fn new() -> Self {
        Self
    }
}

impl ErrorCorrection for HammingCodec {
    fn encode(&self, data: &[u8], strength: u8) -> Result<Bits> {
        let geometry = HammingGeometry::for_strength(strength)?;

        let mut framed = Vec::with_capacity(LENGTH_PREFIX + data.len());
        framed.extend_from_slice(&(data.len() as u64).to_le_bytes());
        framed.extend_from_slice(data);
        let source = framed.view_bits::<Lsb0>();

        let codewords = source.len().div_ceil(geometry.data_bits);
        let mut encoded = Bits::with_capacity(codewords * geometry.codeword_bits + 8);
        for chunk in source.chunks(geometry.data_bits) {
            encode_codeword(chunk, &geometry, &mut encoded);
        }

        let padded = encoded.len().div_ceil(8) * 8;
        encoded.resize(padded, false);
        Ok(encoded)
    }

    fn decode(
        &self,
        bits: &BitSlice<u8, Lsb0>,
        strength: u8,
        correct: bool,
    ) -> Result<DecodeOutcome> {
        let geometry = HammingGeometry::for_strength(strength)?;

        // Trailing bits shorter than a codeword are byte padding
        let codewords = bits.len() / geometry.codeword_bits;
        let mut decoded = Bits::with_capacity(codewords * geometry.data_bits + 8);
        let mut damaged = 0usize;

        for codeword in bits.chunks_exact(geometry.codeword_bits) {
            let syndrome = syndrome(codeword);
            let mut codeword: Bits = codeword.to_bitvec();
            if syndrome != 0 {
                damaged += 1;
                if correct {
                    let flipped = !codeword[syndrome - 1];
                    codeword.set(syndrome - 1, flipped);
                }
            }
            extract_data(&codeword, &mut decoded);
        }

        if damaged > 0 && !correct {
            return Err(ChronosealError::UncorrectedErrors { chunks: damaged });
        }

        let padded = decoded.len().div_ceil(8) * 8;
        decoded.resize(padded, false);
        let bytes = decoded.into_vec();

        if bytes.len() < LENGTH_PREFIX {
            return Err(ChronosealError::CorruptedPayload(
                "too short to hold a length prefix".into(),
            ));
        }
        let mut prefix = [0u8; LENGTH_PREFIX];
        prefix.copy_from_slice(&bytes[..LENGTH_PREFIX]);
        let length = u64::from_le_bytes(prefix) as usize;
        let available = bytes.len() - LENGTH_PREFIX;
        if length > available {
            return Err(ChronosealError::CorruptedPayload(format!(
                "length prefix claims {} bytes but only {} were decoded",
                length, available
            )));
        }

        Ok(DecodeOutcome {
            data: bytes[LENGTH_PREFIX..LENGTH_PREFIX + length].to_vec(),
            corrected: damaged,
        })
    }

    fn codeword_bits(&self, strength: u8) -> Result<usize> {
        Ok(HammingGeometry::for_strength(strength)?.codeword_bits)
    }
}

fn encode_codeword(chunk: &BitSlice<u8, Lsb0>, geometry: &HammingGeometry, out: &mut Bits) {
    let start = out.len();
    out.resize(start + geometry.codeword_bits, false);
    let codeword = &mut out[start..];

    let mut data = chunk.iter().by_vals();
    for position in 1..=geometry.codeword_bits {
        if !position.is_power_of_two() {
            // Last chunk runs out early; the rest stays zero
            if let Some(bit) = data.next() {
                codeword.set(position - 1, bit);
            }
        }
    }

    for p in 0..geometry.parity_bits {
        let mask = 1usize << p;
        let parity = (1..=geometry.codeword_bits)
            .filter(|&position| position & mask != 0 && position != mask)
            .fold(false, |acc, position| acc ^ codeword[position - 1]);
        codeword.set(mask - 1, parity);
    }
}

/// XOR of the 1-based positions of all set bits; zero for a clean codeword
fn syndrome(codeword: &BitSlice<u8, Lsb0>) -> usize {
    codeword
        .iter_ones()
        .fold(0usize, |acc, index| acc ^ (index + 1))
}

fn extract_data(codeword: &BitSlice<u8, Lsb0>, out: &mut Bits) {
    for (index, bit) in codeword.iter().by_vals().enumerate() {
        if !(index + 1).is_power_of_two() {
            out.push(bit);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(data: &[u8], strength: u8) {
        let codec = HammingCodec::new();
        let encoded = codec.encode(data, strength).unwrap();
        let decoded = codec.decode(&encoded, strength, false).unwrap();
        assert_eq!(decoded.data, data, "strength {}", strength);
        assert_eq!(decoded.corrected, 0);
    }

    #[test]
    fn test_geometry() {
        let g = HammingGeometry::for_strength(3).unwrap();
        assert_eq!((g.codeword_bits, g.data_bits, g.parity_bits), (31, 26, 5));
        let g = HammingGeometry::for_strength(6).unwrap();
        assert_eq!((g.codeword_bits, g.data_bits, g.parity_bits), (3, 1, 2));
        let g = HammingGeometry::for_strength(1).unwrap();
        assert_eq!((g.codeword_bits, g.data_bits), (127, 120));
    }

    #[test]
    fn test_higher_strength_adds_more_redundancy() {
        let ratios: Vec<f64> = (MIN_STRENGTH..=MAX_STRENGTH)
            .map(|s| HammingGeometry::for_strength(s).unwrap().overhead_ratio())
            .collect();
        assert!(ratios.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_invalid_strength() {
        let codec = HammingCodec::new();
        assert!(matches!(
            codec.encode(b"x", 0),
            Err(ChronosealError::InvalidStrength(0))
        ));
        assert!(matches!(
            codec.encode(b"x", 7),
            Err(ChronosealError::InvalidStrength(7))
        ));
    }

    #[test]
    fn test_roundtrip_all_strengths() {
        let data: Vec<u8> = (0..300).map(|i| (i * 37 % 256) as u8).collect();
        for strength in MIN_STRENGTH..=MAX_STRENGTH {
            roundtrip(&data, strength);
        }
    }

    #[test]
    fn test_roundtrip_empty() {
        for strength in MIN_STRENGTH..=MAX_STRENGTH {
            roundtrip(b"", strength);
        }
    }

    #[test]
    fn test_encoded_length_is_byte_aligned() {
        let codec = HammingCodec::new();
        let encoded = codec.encode(&[0xAB; 16], 3).unwrap();
        // (8 + 16) bytes = 192 bits -> 8 codewords of 31 bits -> 248 bits
        assert_eq!(encoded.len(), 248);
        assert_eq!(encoded.len() % 8, 0);
    }

    #[test]
    fn test_single_bit_error_is_corrected() {
        let codec = HammingCodec::new();
        let data = b"error correcting codes".to_vec();
        let mut encoded = codec.encode(&data, 3).unwrap();
        let flipped = !encoded[40];
        encoded.set(40, flipped);

        let decoded = codec.decode(&encoded, 3, true).unwrap();
        assert_eq!(decoded.data, data);
        assert_eq!(decoded.corrected, 1);
    }

    #[test]
    fn test_single_bit_error_is_detected_without_correction() {
        let codec = HammingCodec::new();
        let mut encoded = codec.encode(b"detect me", 4).unwrap();
        let flipped = !encoded[3];
        encoded.set(3, flipped);

        match codec.decode(&encoded, 4, false) {
            Err(ChronosealError::UncorrectedErrors { chunks }) => assert_eq!(chunks, 1),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_parity_bit_error_is_corrected() {
        let codec = HammingCodec::new();
        let mut encoded = codec.encode(b"parity", 2).unwrap();
        // Position 1 of the first codeword is a parity bit
        let flipped = !encoded[0];
        encoded.set(0, flipped);
        let decoded = codec.decode(&encoded, 2, true).unwrap();
        assert_eq!(decoded.data, b"parity");
    }

    #[test]
    fn test_truncated_input_is_rejected() {
        let codec = HammingCodec::new();
        let bits = Bits::repeat(false, 10);
        assert!(matches!(
            codec.decode(&bits, 3, false),
            Err(ChronosealError::CorruptedPayload(_))
        ));
    }

    #[test]
    fn test_length_prefix_beyond_payload_is_rejected() {
        let codec = HammingCodec::new();
        let geometry = HammingGeometry::for_strength(5).unwrap();
        let mut forged = Vec::new();
        forged.extend_from_slice(&1000u64.to_le_bytes());
        forged.extend_from_slice(b"short");

        let mut bits = Bits::new();
        for chunk in forged.view_bits::<Lsb0>().chunks(geometry.data_bits) {
            encode_codeword(chunk, &geometry, &mut bits);
        }
        assert!(matches!(
            codec.decode(&bits, 5, false),
            Err(ChronosealError::CorruptedPayload(_))
        ));
    }
}

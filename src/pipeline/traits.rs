//! Capability traits the orchestrator is built from.
//!
//! Each collaborator is an opaque bidirectional transform. The orchestrator
//! holds them as `Box<dyn Trait>` so tests can swap in fakes (a fixed clock,
//! a compressor that always fails, ...).

use crate::error::Result;
use crate::pipeline::compress::CompressedResult;
use crate::pipeline::timelock::EnvelopeInfo;
use crate::settings::Compression;
use bitvec::prelude::*;
use chrono::{DateTime, Utc};

/// Bit view used by the error-correction layer; byte 0 holds bits 0..8
pub type Bits = BitVec<u8, Lsb0>;

/// Result of an error-correction decode
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeOutcome {
    pub data: Vec<u8>,
    /// Codewords that were repaired
    pub corrected: usize,
}

pub trait ErrorCorrection: Send + Sync {
    /// Add redundancy to `data`
    fn encode(&self, data: &[u8], strength: u8) -> Result<Bits>;

    /// Strip redundancy, repairing damaged codewords when `correct` is set
    fn decode(&self, bits: &BitSlice<u8, Lsb0>, strength: u8, correct: bool)
        -> Result<DecodeOutcome>;

    /// Length of one codeword in bits
    fn codeword_bits(&self, strength: u8) -> Result<usize>;
}

pub trait FaultInjector: Send + Sync {
    /// Corrupt bits inside every full `chunk_bits`-sized chunk, returning the
    /// number of flipped bits
    fn flip_random_bits_in_chunks(&self, bits: &mut BitSlice<u8, Lsb0>, chunk_bits: usize)
        -> usize;
}

pub trait CompressionCodec: Send + Sync {
    fn compress(&self, data: &[u8], algorithm: Compression) -> Result<CompressedResult>;

    fn decompress(&self, compressed: &CompressedResult) -> Result<Vec<u8>>;
}

pub trait TimeLock: Send + Sync {
    /// Wrap `data` so it can only be opened at or after `unlock_at`
    fn lock(&self, data: &[u8], unlock_at: DateTime<Utc>) -> Result<Vec<u8>>;

    /// Wrap `data` in an envelope without time restriction
    fn build_unlocked_file(&self, data: &[u8]) -> Result<Vec<u8>>;

    /// Open an envelope produced by `lock` or `build_unlocked_file`
    fn unlock(&self, envelope: &[u8]) -> Result<Vec<u8>>;

    /// Read the envelope header without opening it
    fn inspect(&self, envelope: &[u8]) -> Result<EnvelopeInfo>;
}

/// Source of the current instant
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

//! Time-lock envelope.
//!
//! ```text
//! [magic "TLK1": 4][state: 1][unlock_at millis: 8 LE][blake3(body): 32][body...]
//! ```
//!
//! Every artifact is wrapped, locked or not, so the inverse path always has
//! one format to parse. A sealed body is XORed with a Keccak keystream derived
//! from the unlock instant. That keeps the data unreadable to anything that
//! honours the envelope; it is not encryption. The digest covers the plain
//! body and catches tampering and stray bytes on unlock.

use crate::error::{ChronosealError, LockRejection, Result};
use crate::pipeline::traits::{Clock, TimeLock};
use chrono::{DateTime, TimeZone, Utc};
use sha3::{Digest, Keccak256};
use std::fmt;

const ENVELOPE_MAGIC: &[u8; 4] = b"TLK1";
const DIGEST_SIZE: usize = 32;

/// Magic + state + instant + digest
pub const ENVELOPE_HEADER: usize = 4 + 1 + 8 + DIGEST_SIZE;

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock frozen at one instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Lock state stored in the envelope
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeState {
    Open,
    Sealed,
}

impl EnvelopeState {
    fn to_byte(self) -> u8 {
        match self {
            EnvelopeState::Open => 0,
            EnvelopeState::Sealed => 1,
        }
    }

    fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(EnvelopeState::Open),
            1 => Some(EnvelopeState::Sealed),
            _ => None,
        }
    }
}

impl fmt::Display for EnvelopeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnvelopeState::Open => f.write_str("open"),
            EnvelopeState::Sealed => f.write_str("sealed"),
        }
    }
}

/// Envelope header as read by `inspect`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvelopeInfo {
    pub state: EnvelopeState,
    /// `None` for open envelopes
    pub unlock_at: Option<DateTime<Utc>>,
    pub digest: [u8; DIGEST_SIZE],
    pub body_len: usize,
}

/// Default `TimeLock`, reading time from `C`
#[derive(Debug, Clone, Default)]
pub struct EnvelopeLock<C = SystemClock> {
    clock: C,
}

impl EnvelopeLock<SystemClock> {
    pub fn new() -> Self {
        Self { clock: SystemClock }
    }
}

impl<C: Clock> EnvelopeLock<C> {
    pub fn with_clock(clock: C) -> Self {
        Self { clock }
    }

    fn wrap(&self, data: &[u8], state: EnvelopeState, unlock_at: Option<DateTime<Utc>>) -> Vec<u8> {
        let millis = unlock_at.map(|at| at.timestamp_millis()).unwrap_or(0);
        let digest = blake3::hash(data);

        let mut envelope = Vec::with_capacity(ENVELOPE_HEADER + data.len());
        envelope.extend_from_slice(ENVELOPE_MAGIC);
        envelope.push(state.to_byte());
        envelope.extend_from_slice(&millis.to_le_bytes());
        envelope.extend_from_slice(digest.as_bytes());
        envelope.extend_from_slice(data);

        if state == EnvelopeState::Sealed {
            mask(&mut envelope[ENVELOPE_HEADER..], millis);
        }
        envelope
    }
}

impl<C: Clock> TimeLock for EnvelopeLock<C> {
    fn lock(&self, data: &[u8], unlock_at: DateTime<Utc>) -> Result<Vec<u8>> {
        Ok(self.wrap(data, EnvelopeState::Sealed, Some(unlock_at)))
    }

    fn build_unlocked_file(&self, data: &[u8]) -> Result<Vec<u8>> {
        Ok(self.wrap(data, EnvelopeState::Open, None))
    }

    fn unlock(&self, envelope: &[u8]) -> Result<Vec<u8>> {
        let info = self.inspect(envelope)?;
        let mut body = envelope[ENVELOPE_HEADER..].to_vec();

        if let Some(unlock_at) = info.unlock_at {
            if self.clock.now() < unlock_at {
                return Err(ChronosealError::LockedOrMalformed(LockRejection::StillLocked {
                    unlock_at,
                }));
            }
            mask(&mut body, unlock_at.timestamp_millis());
        }

        if blake3::hash(&body).as_bytes() != &info.digest {
            return Err(ChronosealError::malformed("digest mismatch"));
        }
        Ok(body)
    }

    fn inspect(&self, envelope: &[u8]) -> Result<EnvelopeInfo> {
        if envelope.len() < ENVELOPE_HEADER {
            return Err(ChronosealError::malformed("shorter than the envelope header"));
        }
        if &envelope[..4] != ENVELOPE_MAGIC {
            return Err(ChronosealError::malformed("unknown envelope magic"));
        }
        let state = EnvelopeState::from_byte(envelope[4])
            .ok_or_else(|| ChronosealError::malformed(format!("unknown state {}", envelope[4])))?;

        let mut millis_bytes = [0u8; 8];
        millis_bytes.copy_from_slice(&envelope[5..13]);
        let millis = i64::from_le_bytes(millis_bytes);
        let unlock_at = match state {
            EnvelopeState::Open => None,
            EnvelopeState::Sealed => Some(
                Utc.timestamp_millis_opt(millis)
                    .single()
                    .ok_or_else(|| ChronosealError::malformed("unlock instant out of range"))?,
            ),
        };

        let mut digest = [0u8; DIGEST_SIZE];
        digest.copy_from_slice(&envelope[13..ENVELOPE_HEADER]);

        Ok(EnvelopeInfo {
            state,
            unlock_at,
            digest,
            body_len: envelope.len() - ENVELOPE_HEADER,
        })
    }
}

/// XOR `body` with the keystream for `millis`
fn mask(body: &mut [u8], millis: i64) {
    let mut counter = 0u64;
    for block in body.chunks_mut(32) {
        let mut hasher = Keccak256::new();
        hasher.update(b"chronoseal_envelope_mask_v1");
        hasher.update(millis.to_le_bytes());
        hasher.update(counter.to_le_bytes());
        let stream = hasher.finalize();
        for (byte, key) in block.iter_mut().zip(stream.iter()) {
            *byte ^= key;
        }
        counter += 1;
    }
}

use crate::error::{ChronosealError, Result};
use crate::settings::OperationMode;
use std::fmt;

/// Tag prefix placed inside every envelope
const TAG_MAGIC: &[u8; 2] = b"CS";

/// Tag length: magic + kind byte
pub const TAG_SIZE: usize = 3;

/// What a forward mode left inside the envelope
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Protected,
    Compressed,
    ProtectedCompressed,
    /// Kind byte this build does not know
    Unknown(u8),
}

impl ArtifactKind {
    /// Kind produced by (or expected by) a mode
    pub fn for_mode(mode: OperationMode) -> ArtifactKind {
        match mode {
            OperationMode::Protect | OperationMode::Unlock => ArtifactKind::Protected,
            OperationMode::Compress | OperationMode::Decompress => ArtifactKind::Compressed,
            OperationMode::ProtectAndCompress | OperationMode::UnlockAndDecompress => {
                ArtifactKind::ProtectedCompressed
            }
        }
    }

    fn to_byte(self) -> u8 {
        match self {
            ArtifactKind::Protected => 1,
            ArtifactKind::Compressed => 2,
            ArtifactKind::ProtectedCompressed => 3,
            ArtifactKind::Unknown(byte) => byte,
        }
    }

    fn from_byte(byte: u8) -> ArtifactKind {
        match byte {
            1 => ArtifactKind::Protected,
            2 => ArtifactKind::Compressed,
            3 => ArtifactKind::ProtectedCompressed,
            other => ArtifactKind::Unknown(other),
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtifactKind::Protected => f.write_str("protected"),
            ArtifactKind::Compressed => f.write_str("compressed"),
            ArtifactKind::ProtectedCompressed => f.write_str("protected+compressed"),
            ArtifactKind::Unknown(byte) => write!(f, "unknown (0x{:02x})", byte),
        }
    }
}

/// Prefix `payload` with the tag for `kind`
pub fn attach_tag(payload: Vec<u8>, kind: ArtifactKind) -> Vec<u8> {
    let mut tagged = Vec::with_capacity(TAG_SIZE + payload.len());
    tagged.extend_from_slice(TAG_MAGIC);
    tagged.push(kind.to_byte());
    tagged.extend_from_slice(&payload);
    tagged
}

/// Read the tag without consuming the buffer
pub fn peek_tag(data: &[u8]) -> Option<ArtifactKind> {
    if data.len() < TAG_SIZE || &data[..2] != TAG_MAGIC {
        return None;
    }
    Some(ArtifactKind::from_byte(data[2]))
}

/// Strip the tag, failing when it names a different kind
pub fn detach_tag(mut data: Vec<u8>, expected: ArtifactKind) -> Result<Vec<u8>> {
    let found = peek_tag(&data)
        .ok_or_else(|| ChronosealError::malformed("missing content tag"))?;
    if found != expected {
        return Err(ChronosealError::ModeMismatch { expected, found });
    }
    data.drain(..TAG_SIZE);
    Ok(data)
}

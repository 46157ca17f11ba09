use std::fmt;

/// Whether a mode produces an artifact or consumes one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Inverse,
}

/// One step of a composition
///
/// `Seal` and `Unseal` cover the content tag and the time-lock envelope
/// together; every forward mode ends with `Seal` and every inverse mode
/// starts with `Unseal`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Compress,
    Decompress,
    Protect,
    Unprotect,
    Seal,
    Unseal,
}

impl Stage {
    /// The stage that undoes this one
    pub fn inverse(self) -> Stage {
        match self {
            Stage::Compress => Stage::Decompress,
            Stage::Decompress => Stage::Compress,
            Stage::Protect => Stage::Unprotect,
            Stage::Unprotect => Stage::Protect,
            Stage::Seal => Stage::Unseal,
            Stage::Unseal => Stage::Seal,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Compress => "compress",
            Stage::Decompress => "decompress",
            Stage::Protect => "protect",
            Stage::Unprotect => "unprotect",
            Stage::Seal => "seal",
            Stage::Unseal => "unseal",
        };
        f.write_str(name)
    }
}

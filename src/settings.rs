use crate::error::{ChronosealError, Result};
use crate::pipeline::plan::{Direction, Stage};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Default protection strength (Hamming(31,26))
pub const DEFAULT_STRENGTH: u8 = 3;

/// Which combination of transforms a run applies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationMode {
    Protect,
    Unlock,
    Compress,
    Decompress,
    ProtectAndCompress,
    UnlockAndDecompress,
}

impl OperationMode {
    pub const ALL: [OperationMode; 6] = [
        OperationMode::Protect,
        OperationMode::Unlock,
        OperationMode::Compress,
        OperationMode::Decompress,
        OperationMode::ProtectAndCompress,
        OperationMode::UnlockAndDecompress,
    ];

    /// Ordered stages of this mode, first applied first
    pub fn stages(self) -> &'static [Stage] {
        match self {
            OperationMode::Protect => &[Stage::Protect, Stage::Seal],
            OperationMode::Unlock => &[Stage::Unseal, Stage::Unprotect],
            OperationMode::Compress => &[Stage::Compress, Stage::Seal],
            OperationMode::Decompress => &[Stage::Unseal, Stage::Decompress],
            OperationMode::ProtectAndCompress => &[Stage::Compress, Stage::Protect, Stage::Seal],
            OperationMode::UnlockAndDecompress => {
                &[Stage::Unseal, Stage::Unprotect, Stage::Decompress]
            }
        }
    }

    pub fn direction(self) -> Direction {
        match self {
            OperationMode::Protect | OperationMode::Compress | OperationMode::ProtectAndCompress => {
                Direction::Forward
            }
            OperationMode::Unlock
            | OperationMode::Decompress
            | OperationMode::UnlockAndDecompress => Direction::Inverse,
        }
    }

    /// The mode that undoes this one
    pub fn inverse(self) -> OperationMode {
        match self {
            OperationMode::Protect => OperationMode::Unlock,
            OperationMode::Unlock => OperationMode::Protect,
            OperationMode::Compress => OperationMode::Decompress,
            OperationMode::Decompress => OperationMode::Compress,
            OperationMode::ProtectAndCompress => OperationMode::UnlockAndDecompress,
            OperationMode::UnlockAndDecompress => OperationMode::ProtectAndCompress,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            OperationMode::Protect => "protect",
            OperationMode::Unlock => "unlock",
            OperationMode::Compress => "compress",
            OperationMode::Decompress => "decompress",
            OperationMode::ProtectAndCompress => "protect-and-compress",
            OperationMode::UnlockAndDecompress => "unlock-and-decompress",
        }
    }
}

impl fmt::Display for OperationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for OperationMode {
    type Err = ChronosealError;
    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_lowercase().replace('_', "-");
        OperationMode::ALL
            .into_iter()
            .find(|mode| mode.name() == normalized)
            .ok_or_else(|| ChronosealError::InvalidConfiguration(format!("unknown mode: {}", s)))
    }
}

/// Optional behaviour of the protect/unlock step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProtectionCustomSetting {
    #[default]
    None,
    /// Protect only: flip one random bit in every codeword
    AddRandomError,
    /// Unlock only: repair damaged codewords instead of rejecting them
    CorrectErrors,
}

impl std::str::FromStr for ProtectionCustomSetting {
    type Err = ChronosealError;
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "none" => Ok(Self::None),
            "add_random_error" => Ok(Self::AddRandomError),
            "correct_errors" => Ok(Self::CorrectErrors),
            _ => Err(ChronosealError::InvalidConfiguration(format!(
                "unknown protection setting: {}",
                s
            ))),
        }
    }
}

/// Compression algorithm options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    #[default]
    Huffman,
    Zstd,
    Lz4,
    Brotli,
}

impl Compression {
    /// File extension fragment naming this algorithm
    pub fn extension(self) -> &'static str {
        match self {
            Compression::Huffman => "huff",
            Compression::Zstd => "zst",
            Compression::Lz4 => "lz4",
            Compression::Brotli => "br",
        }
    }

    pub(crate) fn to_byte(self) -> u8 {
        match self {
            Compression::Huffman => 1,
            Compression::Zstd => 2,
            Compression::Lz4 => 3,
            Compression::Brotli => 4,
        }
    }

    pub(crate) fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            1 => Some(Compression::Huffman),
            2 => Some(Compression::Zstd),
            3 => Some(Compression::Lz4),
            4 => Some(Compression::Brotli),
            _ => None,
        }
    }
}

impl std::str::FromStr for Compression {
    type Err = ChronosealError;
    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "huffman" | "huff" => Ok(Self::Huffman),
            "zstd" => Ok(Self::Zstd),
            "lz4" => Ok(Self::Lz4),
            "brotli" => Ok(Self::Brotli),
            _ => Err(ChronosealError::InvalidConfiguration(format!(
                "unknown compression: {}",
                s
            ))),
        }
    }
}

/// Time-lock request for the forward modes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct TimeLockSettings {
    pub enabled: bool,
    pub unlock_at: Option<DateTime<Utc>>,
}

impl TimeLockSettings {
    /// No time restriction
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Locked until `unlock_at`
    pub fn until(unlock_at: DateTime<Utc>) -> Self {
        Self {
            enabled: true,
            unlock_at: Some(unlock_at),
        }
    }

    /// The instant to lock with, `None` when locking is disabled
    pub fn instant(&self) -> Result<Option<DateTime<Utc>>> {
        match (self.enabled, self.unlock_at) {
            (false, _) => Ok(None),
            (true, Some(at)) => Ok(Some(at)),
            (true, None) => Err(ChronosealError::MissingUnlockInstant),
        }
    }
}

/// Configuration of one run
///
/// Built once by the caller and read-only afterwards. Every field except the
/// two paths and the mode has a default, so settings files only need to name
/// what they change:
///
/// ```json
/// { "source_path": "notes.txt", "output_path": "notes.txt", "mode": "protect",
///   "time_lock": { "enabled": true, "unlock_at": "2030-01-01T00:00:00Z" } }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSettings {
    pub source_path: PathBuf,
    /// Output path before the extension is appended
    pub output_path: PathBuf,
    pub mode: OperationMode,
    #[serde(default = "default_strength")]
    pub protection_strength: u8,
    #[serde(default)]
    pub custom_setting: ProtectionCustomSetting,
    #[serde(default)]
    pub compression: Compression,
    #[serde(default)]
    pub time_lock: TimeLockSettings,
}

fn default_strength() -> u8 {
    DEFAULT_STRENGTH
}

impl RunSettings {
    pub fn new(
        source_path: impl Into<PathBuf>,
        output_path: impl Into<PathBuf>,
        mode: OperationMode,
    ) -> Self {
        Self {
            source_path: source_path.into(),
            output_path: output_path.into(),
            mode,
            protection_strength: DEFAULT_STRENGTH,
            custom_setting: ProtectionCustomSetting::default(),
            compression: Compression::default(),
            time_lock: TimeLockSettings::default(),
        }
    }

    pub fn with_strength(mut self, strength: u8) -> Self {
        self.protection_strength = strength;
        self
    }

    pub fn with_custom_setting(mut self, setting: ProtectionCustomSetting) -> Self {
        self.custom_setting = setting;
        self
    }

    pub fn with_compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }

    pub fn with_time_lock(mut self, time_lock: TimeLockSettings) -> Self {
        self.time_lock = time_lock;
        self
    }

    /// Load settings from a JSON file
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Checks that need no filesystem access
    pub fn validate(&self) -> Result<()> {
        validate_path(&self.source_path, "source path is empty")?;
        validate_path(&self.output_path, "output path is empty")?;
        if self.mode.direction() == Direction::Forward {
            self.time_lock.instant()?;
        }
        Ok(())
    }
}

fn validate_path(path: &Path, message: &str) -> Result<()> {
    if path.as_os_str().to_string_lossy().trim().is_empty() {
        return Err(ChronosealError::InvalidConfiguration(message.into()));
    }
    Ok(())
}

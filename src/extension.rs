//! Output file naming.
//!
//! The suffix names every transform a run applied, in application order, so
//! an artifact's format can be read off its name:
//!
//! | mode | suffix |
//! |---|---|
//! | protect | `ham3`, `ham3e` with injected errors |
//! | compress | `huff` / `zst` / `lz4` / `br` |
//! | protect-and-compress | `huff.ham3` |
//! | unlock | `unham3`, `unham3c` with error correction |
//! | decompress | `unpack` |
//! | unlock-and-decompress | `unham3.unpack` |
//!
//! Forward modes with an enabled time lock end in `.lock`.

use crate::pipeline::plan::Direction;
use crate::settings::{Compression, OperationMode, ProtectionCustomSetting, RunSettings};
use std::path::PathBuf;

/// The settings that influence the suffix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExtensionKey {
    pub mode: OperationMode,
    pub strength: u8,
    pub custom_setting: ProtectionCustomSetting,
    pub compression: Compression,
    pub locked: bool,
}

impl From<&RunSettings> for ExtensionKey {
    fn from(settings: &RunSettings) -> Self {
        Self {
            mode: settings.mode,
            strength: settings.protection_strength,
            custom_setting: settings.custom_setting,
            compression: settings.compression,
            locked: settings.time_lock.enabled,
        }
    }
}

/// Suffix for `key`, without the leading dot
pub fn build_extension(key: ExtensionKey) -> String {
    let protect = match key.custom_setting {
        ProtectionCustomSetting::AddRandomError => format!("ham{}e", key.strength),
        _ => format!("ham{}", key.strength),
    };
    let unprotect = match key.custom_setting {
        ProtectionCustomSetting::CorrectErrors => format!("unham{}c", key.strength),
        _ => format!("unham{}", key.strength),
    };
    let packed = key.compression.extension();

    let mut parts: Vec<String> = match key.mode {
        OperationMode::Protect => vec![protect],
        OperationMode::Compress => vec![packed.to_string()],
        OperationMode::ProtectAndCompress => vec![packed.to_string(), protect],
        OperationMode::Unlock => vec![unprotect],
        OperationMode::Decompress => vec!["unpack".to_string()],
        OperationMode::UnlockAndDecompress => vec![unprotect, "unpack".to_string()],
    };

    if key.mode.direction() == Direction::Forward && key.locked {
        parts.push("lock".to_string());
    }
    parts.join(".")
}

/// Output base path with the mode's suffix appended
pub fn output_path(settings: &RunSettings) -> PathBuf {
    let mut path = settings.output_path.clone().into_os_string();
    path.push(".");
    path.push(build_extension(ExtensionKey::from(settings)));
    PathBuf::from(path)
}

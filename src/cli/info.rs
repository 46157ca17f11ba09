use crate::error::{ChronosealError, IoPhase, Result};
use crate::pipeline::{peek_tag, EnvelopeLock, EnvelopeState, TimeLock, ENVELOPE_HEADER};
use chrono::Utc;
use std::path::Path;

/// Describe an artifact without opening it
pub fn show_info(path: &Path) -> Result<String> {
    let data = std::fs::read(path).map_err(|source| ChronosealError::IoFailure {
        phase: IoPhase::Read,
        path: path.to_path_buf(),
        source,
    })?;
    let info = EnvelopeLock::new().inspect(&data)?;

    let mut output = String::new();

    output.push_str("Chronoseal Artifact Information\n");
    output.push_str("===============================\n\n");

    output.push_str(&format!("File: {}\n", path.display()));
    output.push_str(&format!("Size: {}\n", format_size(data.len() as u64)));
    output.push_str("\n");

    output.push_str("Envelope:\n");
    output.push_str(&format!("  State: {}\n", info.state));
    if let Some(unlock_at) = info.unlock_at {
        output.push_str(&format!("  Unlocks at: {}\n", unlock_at.to_rfc3339()));
        let status = if Utc::now() < unlock_at {
            "still locked"
        } else {
            "can be unlocked"
        };
        output.push_str(&format!("  Status: {}\n", status));
    }
    output.push_str(&format!("  Body: {}\n", format_size(info.body_len as u64)));
    output.push_str(&format!("  Digest: {}\n", hex::encode(info.digest)));

    // Sealed bodies are masked, so the tag is only readable on open envelopes
    if info.state == EnvelopeState::Open {
        let content = match peek_tag(&data[ENVELOPE_HEADER..]) {
            Some(kind) => kind.to_string(),
            None => "untagged".to_string(),
        };
        output.push_str(&format!("  Content: {}\n", content));
    }

    Ok(output)
}

fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.1} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}

use crate::error::Result;
use crate::orchestrator::{Orchestrator, RunReport};
use crate::settings::{
    Compression, OperationMode, ProtectionCustomSetting, RunSettings, TimeLockSettings,
    DEFAULT_STRENGTH,
};
use chrono::{DateTime, Utc};
use std::path::Path;

/// Options for running a single mode from the command line
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub strength: u8,
    pub custom_setting: ProtectionCustomSetting,
    pub compression: Compression,
    /// Lock the artifact until this instant
    pub lock_until: Option<DateTime<Utc>>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            strength: DEFAULT_STRENGTH,
            custom_setting: ProtectionCustomSetting::None,
            compression: Compression::Huffman,
            lock_until: None,
        }
    }
}

impl RunOptions {
    /// Settings for running `mode` on `input`; the output base defaults to the input path
    pub fn to_settings(&self, input: &Path, output: Option<&Path>, mode: OperationMode) -> RunSettings {
        let time_lock = match self.lock_until {
            Some(at) => TimeLockSettings::until(at),
            None => TimeLockSettings::disabled(),
        };
        RunSettings::new(input, output.unwrap_or(input), mode)
            .with_strength(self.strength)
            .with_custom_setting(self.custom_setting)
            .with_compression(self.compression)
            .with_time_lock(time_lock)
    }
}

/// Run `mode` on `input` with the default codecs
pub fn run_mode(
    input: &Path,
    output: Option<&Path>,
    mode: OperationMode,
    options: &RunOptions,
) -> Result<RunReport> {
    Orchestrator::new().run(&options.to_settings(input, output, mode))
}

/// Run the settings stored in a JSON file
pub fn run_settings_file(path: &Path) -> Result<(OperationMode, RunReport)> {
    let settings = RunSettings::from_json_file(path)?;
    let report = Orchestrator::new().run(&settings)?;
    Ok((settings.mode, report))
}

pub fn format_report(mode: OperationMode, report: &RunReport) -> String {
    format!(
        "{}: wrote {} ({} -> {} bytes) in {} ms\n",
        mode,
        report.output_path.display(),
        report.input_bytes,
        report.output_bytes,
        report.elapsed.as_millis()
    )
}

use crate::error::{ChronosealError, IoPhase, Result};
use crate::extension::output_path;
use crate::pipeline::{
    attach_tag, detach_tag, ArtifactKind, Bits, CompressedResult, CompressionCodec,
    EnvelopeLock, ErrorCorrection, FaultInjector, HammingCodec, Intoxicator, Stage,
    StandardCompressor, TimeLock,
};
use crate::settings::{Compression, ProtectionCustomSetting, RunSettings, TimeLockSettings};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

/// Outcome of a successful run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub output_path: PathBuf,
    /// Time spent reading, transforming and writing
    pub elapsed: Duration,
    pub input_bytes: usize,
    pub output_bytes: usize,
}

/// Runs operation modes against a set of codecs
///
/// The codecs are injected capabilities; `Orchestrator::new()` wires the
/// default ones and the `with_*` methods replace them one at a time.
pub struct Orchestrator {
    error_correction: Box<dyn ErrorCorrection>,
    fault_injector: Box<dyn FaultInjector>,
    compressor: Box<dyn CompressionCodec>,
    time_lock: Box<dyn TimeLock>,
}

impl Default for Orchestrator {
    fn default() -> Self {
        Self::new()
    }
}

impl Orchestrator {
    pub fn new() -> Self {
        Self {
            error_correction: Box::new(HammingCodec::new()),
            fault_injector: Box::new(Intoxicator::new()),
            compressor: Box::new(StandardCompressor::new()),
            time_lock: Box::new(EnvelopeLock::new()),
        }
    }

    pub fn with_error_correction(mut self, codec: impl ErrorCorrection + 'static) -> Self {
        self.error_correction = Box::new(codec);
        self
    }

    pub fn with_fault_injector(mut self, injector: impl FaultInjector + 'static) -> Self {
        self.fault_injector = Box::new(injector);
        self
    }

    pub fn with_compressor(mut self, codec: impl CompressionCodec + 'static) -> Self {
        self.compressor = Box::new(codec);
        self
    }

    pub fn with_time_lock(mut self, lock: impl TimeLock + 'static) -> Self {
        self.time_lock = Box::new(lock);
        self
    }

    /// Read the source, apply the mode's composition, write the artifact
    ///
    /// Nothing is written unless every stage succeeds, and the artifact only
    /// appears at its final path once it is complete.
    pub fn run(&self, settings: &RunSettings) -> Result<RunReport> {
        // Step 1: Validate before touching the filesystem
        settings.validate()?;

        // Step 2: Name the artifact
        let output_path = output_path(settings);
        info!(
            mode = %settings.mode,
            source = %settings.source_path.display(),
            output = %output_path.display(),
            "starting run"
        );

        let started = Instant::now();

        // Step 3: Read the whole source
        let data = fs::read(&settings.source_path).map_err(|source| ChronosealError::IoFailure {
            phase: IoPhase::Read,
            path: settings.source_path.clone(),
            source,
        })?;
        let input_bytes = data.len();

        // Step 4: Transform
        let data = self.apply(settings, data)?;

        // Step 5: Write
        write_atomically(&output_path, &data)?;

        let elapsed = started.elapsed();
        info!(
            mode = %settings.mode,
            input_bytes,
            output_bytes = data.len(),
            elapsed_ms = elapsed.as_millis() as u64,
            "run complete"
        );

        Ok(RunReport {
            output_path,
            elapsed,
            input_bytes,
            output_bytes: data.len(),
        })
    }

    /// Apply the mode's composition to an in-memory buffer
    pub fn apply(&self, settings: &RunSettings, data: Vec<u8>) -> Result<Vec<u8>> {
        let mut buffer = data;
        for &stage in settings.mode.stages() {
            let before = buffer.len();
            buffer = self.apply_stage(stage, settings, buffer)?;
            debug!(%stage, before, after = buffer.len(), "stage complete");
        }
        Ok(buffer)
    }

    fn apply_stage(&self, stage: Stage, settings: &RunSettings, data: Vec<u8>) -> Result<Vec<u8>> {
        let kind = ArtifactKind::for_mode(settings.mode);
        match stage {
            Stage::Compress => self.compress(data, settings.compression),
            Stage::Decompress => self.decompress(data),
            Stage::Protect => {
                self.protect(data, settings.protection_strength, settings.custom_setting)
            }
            Stage::Unprotect => {
                self.unprotect(data, settings.protection_strength, settings.custom_setting)
            }
            Stage::Seal => self.seal(data, kind, &settings.time_lock),
            Stage::Unseal => self.unseal(data, kind),
        }
    }

    fn compress(&self, data: Vec<u8>, algorithm: Compression) -> Result<Vec<u8>> {
        Ok(self.compressor.compress(&data, algorithm)?.to_bytes())
    }

    fn decompress(&self, data: Vec<u8>) -> Result<Vec<u8>> {
        let compressed = CompressedResult::from_bytes(&data)?;
        self.compressor.decompress(&compressed)
    }

    fn protect(
        &self,
        data: Vec<u8>,
        strength: u8,
        setting: ProtectionCustomSetting,
    ) -> Result<Vec<u8>> {
        let mut bits = self.error_correction.encode(&data, strength)?;
        match setting {
            ProtectionCustomSetting::AddRandomError => {
                let chunk_bits = self.error_correction.codeword_bits(strength)?;
                let flips = self
                    .fault_injector
                    .flip_random_bits_in_chunks(&mut bits, chunk_bits);
                warn!(flips, chunk_bits, "injected random bit errors into protected data");
            }
            ProtectionCustomSetting::CorrectErrors => {
                debug!("error correction only applies when unlocking; ignored")
            }
            ProtectionCustomSetting::None => {}
        }
        Ok(bits.into_vec())
    }

    fn unprotect(
        &self,
        data: Vec<u8>,
        strength: u8,
        setting: ProtectionCustomSetting,
    ) -> Result<Vec<u8>> {
        if setting == ProtectionCustomSetting::AddRandomError {
            debug!("error injection only applies when protecting; ignored");
        }
        let correct = setting == ProtectionCustomSetting::CorrectErrors;
        let bits = Bits::from_vec(data);
        let outcome = self.error_correction.decode(&bits, strength, correct)?;
        if outcome.corrected > 0 {
            warn!(codewords = outcome.corrected, "repaired damaged codewords");
        }
        Ok(outcome.data)
    }

    fn seal(&self, data: Vec<u8>, kind: ArtifactKind, lock: &TimeLockSettings) -> Result<Vec<u8>> {
        // Checked before the time lock is ever called
        let unlock_at = lock.instant()?;
        let tagged = attach_tag(data, kind);
        match unlock_at {
            Some(at) => {
                debug!(unlock_at = %at.to_rfc3339(), "sealing envelope");
                self.time_lock.lock(&tagged, at)
            }
            None => self.time_lock.build_unlocked_file(&tagged),
        }
    }

    fn unseal(&self, data: Vec<u8>, kind: ArtifactKind) -> Result<Vec<u8>> {
        let body = self.time_lock.unlock(&data)?;
        detach_tag(body, kind)
    }
}

/// Stage `data` next to `path`, then rename it into place
fn write_atomically(path: &Path, data: &[u8]) -> Result<()> {
    let write_error = |source: std::io::Error| ChronosealError::IoFailure {
        phase: IoPhase::Write,
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut staged = NamedTempFile::new_in(dir).map_err(write_error)?;
    staged.write_all(data).map_err(write_error)?;
    staged.as_file().sync_all().map_err(write_error)?;
    staged.persist(path).map_err(|e| write_error(e.error))?;
    Ok(())
}

//! Chronoseal - error-correcting, compressing, time-locking file pipeline
//!
//! A run reads one file, applies the transforms of an operation mode and
//! writes the result next to a name that records what was applied.
//!
//! ## Operation Modes
//!
//! ```text
//! protect                 Input → Protect → Seal → Output
//! compress                Input → Compress → Seal → Output
//! protect-and-compress    Input → Compress → Protect → Seal → Output
//!
//! unlock                  Input → Unseal → Unprotect → Output
//! decompress              Input → Unseal → Decompress → Output
//! unlock-and-decompress   Input → Unseal → Unprotect → Decompress → Output
//! ```
//!
//! - **Protect**: Hamming single-error-correcting code, strength 1-6
//! - **Compress**: canonical Huffman (default), zstd, lz4 or brotli
//! - **Seal**: time-lock envelope; open when no unlock instant is set
//!
//! Every inverse mode undoes its forward partner exactly.
//!
//! ## Example
//!
//! ```no_run
//! use chronoseal::{Orchestrator, OperationMode, RunSettings, TimeLockSettings};
//! use chrono::{TimeZone, Utc};
//!
//! let unlock_at = Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap();
//! let settings = RunSettings::new("report.pdf", "report.pdf", OperationMode::ProtectAndCompress)
//!     .with_time_lock(TimeLockSettings::until(unlock_at));
//!
//! // Writes report.pdf.huff.ham3.lock
//! let report = Orchestrator::new().run(&settings).unwrap();
//! println!("{} in {:?}", report.output_path.display(), report.elapsed);
//! ```

pub mod cli;
pub mod error;
pub mod extension;
pub mod orchestrator;
pub mod pipeline;
pub mod settings;

pub use error::{ChronosealError, IoPhase, LockRejection, Result};
pub use extension::{build_extension, output_path, ExtensionKey};
pub use orchestrator::{Orchestrator, RunReport};
pub use settings::{
    Compression, OperationMode, ProtectionCustomSetting, RunSettings, TimeLockSettings,
};

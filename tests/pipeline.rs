use chrono::{Duration, TimeZone, Utc};
use chronoseal::pipeline::{
    CompressedResult, CompressionCodec, EnvelopeLock, FixedClock, Intoxicator,
};
use chronoseal::{
    build_extension, output_path, ChronosealError, Compression, ExtensionKey, LockRejection,
    OperationMode, Orchestrator, ProtectionCustomSetting, Result, RunSettings, TimeLockSettings,
};
use proptest::prelude::*;
use std::error::Error;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

/// Compressor that refuses every input
struct RefusingCompressor;

impl CompressionCodec for RefusingCompressor {
    fn compress(&self, _data: &[u8], algorithm: Compression) -> Result<CompressedResult> {
        Err(ChronosealError::CompressionFailure(format!(
            "{:?} refused the input",
            algorithm
        )))
    }

    fn decompress(&self, _compressed: &CompressedResult) -> Result<Vec<u8>> {
        Err(ChronosealError::DecompressionFailure("refused".into()))
    }
}

fn dir_entries(dir: &Path) -> usize {
    fs::read_dir(dir).map(|entries| entries.count()).unwrap_or(0)
}

#[test]
fn every_mode_pair_roundtrips_through_files() -> std::result::Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let source = dir.path().join("payload.bin");
    let original: Vec<u8> = (0..5000u32).map(|i| (i.wrapping_mul(31) % 97) as u8).collect();
    fs::write(&source, &original)?;

    let orchestrator = Orchestrator::new();
    let forward_modes = [
        OperationMode::Protect,
        OperationMode::Compress,
        OperationMode::ProtectAndCompress,
    ];

    for mode in forward_modes {
        for custom in [ProtectionCustomSetting::None, ProtectionCustomSetting::CorrectErrors] {
            let forward = RunSettings::new(&source, dir.path().join(mode.name()), mode);
            let artifact = orchestrator.run(&forward)?;

            let inverse = RunSettings::new(
                &artifact.output_path,
                dir.path().join(format!("{}-restored", mode.name())),
                mode.inverse(),
            )
            .with_custom_setting(custom);
            let restored = orchestrator.run(&inverse)?;

            assert_eq!(fs::read(&restored.output_path)?, original, "mode {}", mode);
        }
    }
    Ok(())
}

#[test]
fn passed_lock_roundtrips() -> std::result::Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let source = dir.path().join("memo.txt");
    fs::write(&source, b"already unlockable")?;

    let past = Utc.with_ymd_and_hms(2001, 1, 1, 0, 0, 0).unwrap();
    let orchestrator = Orchestrator::new();
    let locked = orchestrator.run(
        &RunSettings::new(&source, &source, OperationMode::ProtectAndCompress)
            .with_compression(Compression::Brotli)
            .with_time_lock(TimeLockSettings::until(past)),
    )?;
    assert!(locked.output_path.to_string_lossy().ends_with(".br.ham3.lock"));

    let restored = orchestrator.run(&RunSettings::new(
        &locked.output_path,
        &source,
        OperationMode::UnlockAndDecompress,
    ))?;
    assert_eq!(fs::read(&restored.output_path)?, b"already unlockable");
    Ok(())
}

#[test]
fn extension_builder_is_pure() {
    let settings = RunSettings::new("in", "out", OperationMode::ProtectAndCompress)
        .with_strength(4)
        .with_compression(Compression::Zstd);
    let first = build_extension(ExtensionKey::from(&settings));
    for _ in 0..10 {
        assert_eq!(build_extension(ExtensionKey::from(&settings)), first);
    }
    assert_eq!(first, "zst.ham4");
}

#[test]
fn blank_source_path_is_invalid_configuration() -> std::result::Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    for blank in ["", "   "] {
        let settings = RunSettings::new(blank, dir.path().join("out"), OperationMode::Compress);
        assert!(matches!(
            Orchestrator::new().run(&settings),
            Err(ChronosealError::InvalidConfiguration(_))
        ));
    }
    assert_eq!(dir_entries(dir.path()), 0);
    Ok(())
}

#[test]
fn lock_without_instant_writes_nothing() -> std::result::Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let source = dir.path().join("input.txt");
    fs::write(&source, b"never written")?;

    let settings = RunSettings::new(&source, dir.path().join("out"), OperationMode::Protect)
        .with_time_lock(TimeLockSettings {
            enabled: true,
            unlock_at: None,
        });
    assert!(matches!(
        Orchestrator::new().run(&settings),
        Err(ChronosealError::MissingUnlockInstant)
    ));
    assert!(!output_path(&settings).exists());
    assert_eq!(dir_entries(dir.path()), 1);
    Ok(())
}

#[test]
fn compression_failure_leaves_existing_output_untouched() -> std::result::Result<(), Box<dyn Error>>
{
    let dir = tempdir()?;
    let source = dir.path().join("input.txt");
    fs::write(&source, b"fresh data")?;

    let settings = RunSettings::new(&source, dir.path().join("out"), OperationMode::Compress);
    let target = output_path(&settings);
    fs::write(&target, b"previous artifact")?;

    let result = Orchestrator::new()
        .with_compressor(RefusingCompressor)
        .run(&settings);
    assert!(matches!(result, Err(ChronosealError::CompressionFailure(_))));
    assert_eq!(fs::read(&target)?, b"previous artifact");
    assert_eq!(dir_entries(dir.path()), 2);
    Ok(())
}

#[test]
fn lock_opens_only_after_instant() -> std::result::Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let source = dir.path().join("letter.txt");
    fs::write(&source, b"open me later")?;

    let unlock_at = Utc.with_ymd_and_hms(2040, 7, 1, 9, 30, 0).unwrap();
    let before = Orchestrator::new()
        .with_time_lock(EnvelopeLock::with_clock(FixedClock(unlock_at - Duration::days(1))));
    let after = Orchestrator::new()
        .with_time_lock(EnvelopeLock::with_clock(FixedClock(unlock_at + Duration::seconds(1))));

    let locked = before.run(
        &RunSettings::new(&source, &source, OperationMode::Protect)
            .with_time_lock(TimeLockSettings::until(unlock_at)),
    )?;

    let unlock = RunSettings::new(&locked.output_path, &source, OperationMode::Unlock);
    match before.run(&unlock) {
        Err(ChronosealError::LockedOrMalformed(LockRejection::StillLocked { unlock_at: at })) => {
            assert_eq!(at, unlock_at)
        }
        other => panic!("expected the envelope to stay locked, got {:?}", other),
    }
    assert!(!output_path(&unlock).exists());

    let restored = after.run(&unlock)?;
    assert_eq!(fs::read(&restored.output_path)?, b"open me later");
    Ok(())
}

#[test]
fn sixteen_bytes_protect_and_unlock() -> std::result::Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let source = dir.path().join("ab.bin");
    fs::write(&source, [0xABu8; 16])?;

    let orchestrator = Orchestrator::new();
    let protect = RunSettings::new(&source, dir.path().join("ab"), OperationMode::Protect);
    let first = orchestrator.run(&protect)?;
    let second = orchestrator.run(&protect)?;
    assert_eq!(first.output_path, second.output_path);
    assert_eq!(first.output_path, dir.path().join("ab.ham3"));

    let restored = orchestrator.run(&RunSettings::new(
        &first.output_path,
        dir.path().join("ab"),
        OperationMode::Unlock,
    ))?;
    assert_eq!(restored.output_path, dir.path().join("ab.unham3"));
    assert_eq!(fs::read(&restored.output_path)?, vec![0xABu8; 16]);
    Ok(())
}

#[test]
fn injected_errors_need_correction() -> std::result::Result<(), Box<dyn Error>> {
    let orchestrator = Orchestrator::new().with_fault_injector(Intoxicator::seeded(7));
    let original = b"bits will be flipped in every codeword".to_vec();

    let protect = RunSettings::new("in", "out", OperationMode::Protect)
        .with_custom_setting(ProtectionCustomSetting::AddRandomError);
    let damaged = orchestrator.apply(&protect, original.clone())?;

    let strict = RunSettings::new("in", "out", OperationMode::Unlock);
    assert!(matches!(
        orchestrator.apply(&strict, damaged.clone()),
        Err(ChronosealError::UncorrectedErrors { chunks }) if chunks > 0
    ));

    let repairing = strict.with_custom_setting(ProtectionCustomSetting::CorrectErrors);
    assert_eq!(orchestrator.apply(&repairing, damaged)?, original);
    Ok(())
}

#[test]
fn wrong_inverse_mode_is_mode_mismatch() -> std::result::Result<(), Box<dyn Error>> {
    let orchestrator = Orchestrator::new();
    let compressed = orchestrator.apply(
        &RunSettings::new("in", "out", OperationMode::Compress),
        b"only compressed".to_vec(),
    )?;
    for mode in [OperationMode::Unlock, OperationMode::UnlockAndDecompress] {
        assert!(matches!(
            orchestrator.apply(&RunSettings::new("in", "out", mode), compressed.clone()),
            Err(ChronosealError::ModeMismatch { .. })
        ));
    }
    Ok(())
}

fn compression_strategy() -> impl Strategy<Value = Compression> {
    prop_oneof![
        Just(Compression::Huffman),
        Just(Compression::Zstd),
        Just(Compression::Lz4),
        Just(Compression::Brotli),
    ]
}

fn forward_mode_strategy() -> impl Strategy<Value = OperationMode> {
    prop_oneof![
        Just(OperationMode::Protect),
        Just(OperationMode::Compress),
        Just(OperationMode::ProtectAndCompress),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn prop_inverse_mode_restores_input(
        data in prop::collection::vec(any::<u8>(), 0..600),
        mode in forward_mode_strategy(),
        strength in 1u8..=6,
        compression in compression_strategy(),
    ) {
        let orchestrator = Orchestrator::new();
        let forward = RunSettings::new("in", "out", mode)
            .with_strength(strength)
            .with_compression(compression);
        let inverse = RunSettings::new("in", "out", mode.inverse()).with_strength(strength);

        let artifact = orchestrator.apply(&forward, data.clone()).unwrap();
        let restored = orchestrator.apply(&inverse, artifact).unwrap();
        prop_assert_eq!(restored, data);
    }
}

use chrono::{DateTime, Utc};
use chronoseal::cli::{format_report, run_mode, run_settings_file, show_info, RunOptions};
use chronoseal::settings::{Compression, OperationMode, ProtectionCustomSetting, DEFAULT_STRENGTH};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Version info from build.rs
const VERSION: &str = env!("CHRONOSEAL_VERSION");
const BUILD: &str = env!("CHRONOSEAL_BUILD");
const PROFILE: &str = env!("CHRONOSEAL_PROFILE");
const GIT_HASH: &str = env!("CHRONOSEAL_GIT_HASH");

fn get_version() -> &'static str {
    use std::sync::OnceLock;
    static VERSION_STRING: OnceLock<String> = OnceLock::new();
    VERSION_STRING.get_or_init(|| format!("{} {} build {} ({})", PROFILE, VERSION, BUILD, GIT_HASH))
}

#[derive(Parser)]
#[command(name = "chronoseal")]
#[command(author, about = "Error-correcting, compressing, time-locking file pipeline", long_about = None)]
struct Cli {
    /// Print version
    #[arg(short = 'V', long)]
    version: bool,

    /// Log every pipeline stage (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Add error correction, then seal
    #[command(alias = "p")]
    Protect(ModeArgs),

    /// Open a protected artifact and strip its error correction
    #[command(alias = "u")]
    Unlock(ModeArgs),

    /// Compress, then seal
    #[command(alias = "c")]
    Compress(ModeArgs),

    /// Open a compressed artifact and decompress it
    #[command(alias = "d")]
    Decompress(ModeArgs),

    /// Compress, add error correction, then seal
    #[command(alias = "pc")]
    ProtectAndCompress(ModeArgs),

    /// Open, strip error correction, then decompress
    #[command(alias = "ud")]
    UnlockAndDecompress(ModeArgs),

    /// Run the settings stored in a JSON file
    Run {
        /// Settings file
        #[arg(long)]
        settings: PathBuf,
    },

    /// Show the envelope header of an artifact
    #[command(alias = "i")]
    Info {
        /// Artifact to inspect
        file: PathBuf,
    },
}

#[derive(Args)]
struct ModeArgs {
    /// Input file
    input: PathBuf,

    /// Output base path; the mode's extension is appended (defaults to the input path)
    output: Option<PathBuf>,

    /// Protection strength (1-6, higher adds more redundancy)
    #[arg(long, default_value_t = DEFAULT_STRENGTH)]
    strength: u8,

    /// Flip one random bit in every codeword after protecting
    #[arg(long, conflicts_with = "correct")]
    inject_errors: bool,

    /// Repair damaged codewords when unlocking
    #[arg(long)]
    correct: bool,

    /// Compression algorithm
    #[arg(long, default_value = "huffman", value_parser = parse_compression)]
    compression: Compression,

    /// Keep the artifact locked until this RFC 3339 instant
    #[arg(long, value_parser = parse_instant)]
    lock_until: Option<DateTime<Utc>>,
}

impl ModeArgs {
    fn options(&self) -> RunOptions {
        let custom_setting = if self.inject_errors {
            ProtectionCustomSetting::AddRandomError
        } else if self.correct {
            ProtectionCustomSetting::CorrectErrors
        } else {
            ProtectionCustomSetting::None
        };
        RunOptions {
            strength: self.strength,
            custom_setting,
            compression: self.compression,
            lock_until: self.lock_until,
        }
    }
}

fn parse_compression(s: &str) -> Result<Compression, String> {
    s.parse().map_err(|e| format!("{}", e))
}

fn parse_instant(s: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(s)
        .map(|at| at.with_timezone(&Utc))
        .map_err(|e| format!("expected an RFC 3339 instant: {}", e))
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run_cli_mode(mode: OperationMode, args: ModeArgs) -> chronoseal::Result<()> {
    let report = run_mode(&args.input, args.output.as_deref(), mode, &args.options())?;
    print!("{}", format_report(mode, &report));
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.version {
        println!("chronoseal {}", get_version());
        return ExitCode::SUCCESS;
    }

    let command = match cli.command {
        Some(cmd) => cmd,
        None => {
            use clap::CommandFactory;
            let _ = Cli::command().print_help();
            println!();
            return ExitCode::SUCCESS;
        }
    };

    init_tracing(cli.verbose);

    let result = match command {
        Commands::Protect(args) => run_cli_mode(OperationMode::Protect, args),
        Commands::Unlock(args) => run_cli_mode(OperationMode::Unlock, args),
        Commands::Compress(args) => run_cli_mode(OperationMode::Compress, args),
        Commands::Decompress(args) => run_cli_mode(OperationMode::Decompress, args),
        Commands::ProtectAndCompress(args) => run_cli_mode(OperationMode::ProtectAndCompress, args),
        Commands::UnlockAndDecompress(args) => {
            run_cli_mode(OperationMode::UnlockAndDecompress, args)
        }

        Commands::Run { settings } => run_settings_file(&settings).map(|(mode, report)| {
            print!("{}", format_report(mode, &report));
        }),

        Commands::Info { file } => show_info(&file).map(|info| {
            print!("{}", info);
        }),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

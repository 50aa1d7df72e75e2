//! Logmask command line.
//!
//! - `mask`: mask JSON Lines from stdin (or a file) to stdout
//! - `check`: validate the masking configuration and summarize it

use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use lm_core::config::{resolve_config, ConfigError, ResolvedConfig};
use lm_core::exit_codes::ExitCode;
use lm_core::logging::{init_logging, LogConfig, LogFormat, LogLevel, LogOverrides};
use lm_core::stream::mask_lines;
use lm_mask::{MaskValue, MaskerSet, MaskingConfig};

/// Logmask - mask sensitive fields and values in JSON logs
#[derive(Parser)]
#[command(name = "lm-core")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalOpts,
}

/// Global options available to all commands
#[derive(Args, Debug)]
struct GlobalOpts {
    /// Minimum log level
    #[arg(long, global = true)]
    log_level: Option<LogLevel>,

    /// Log format on stderr
    #[arg(long, global = true)]
    log_format: Option<LogFormat>,

    /// Show file and line in human log output
    #[arg(long, global = true)]
    log_source: bool,
}

impl GlobalOpts {
    fn log_overrides(&self) -> LogOverrides {
        LogOverrides {
            level: self.log_level,
            format: self.log_format,
            source_location: self.log_source,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Mask JSON Lines input
    Mask(MaskArgs),

    /// Validate masking configuration
    Check(CheckArgs),
}

#[derive(Args, Debug)]
struct MaskArgs {
    /// Masking config file (.json or .toml); falls back to LM_MASK_CONFIG
    #[arg(long)]
    config: Option<PathBuf>,

    /// Read input from a file instead of stdin
    #[arg(long, short = 'i')]
    input: Option<PathBuf>,

    /// Additional path to mask (repeatable)
    #[arg(long = "path", short = 'p')]
    paths: Vec<String>,

    /// Additional value regex to mask (repeatable)
    #[arg(long = "value")]
    values: Vec<String>,

    /// Default mask; a JSON scalar (null, 0, "x") or plain text
    #[arg(long)]
    mask: Option<String>,
}

#[derive(Args, Debug)]
struct CheckArgs {
    /// Masking config file (.json or .toml); falls back to LM_MASK_CONFIG
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            let code = if err.use_stderr() {
                ExitCode::ArgsError
            } else {
                ExitCode::Clean
            };
            std::process::exit(code.as_i32());
        }
    };

    let exit_code = match &cli.command {
        Commands::Mask(args) => run_mask(&cli.global, args),
        Commands::Check(args) => run_check(&cli.global, args),
    };

    tracing::debug!(exit_code = %exit_code, "exiting");
    std::process::exit(exit_code.as_i32());
}

fn init(global: &GlobalOpts, masks: Arc<MaskerSet>) {
    let config = LogConfig::from_env(&global.log_overrides());
    if let Err(err) = init_logging(&config, masks) {
        eprintln!("warning: logging not initialized: {}", err);
    }
}

/// Parse a `--mask` argument: JSON scalars keep their type, anything else is text.
fn parse_mask(raw: &str) -> MaskValue {
    serde_json::from_str(raw).unwrap_or_else(|_| MaskValue::from(raw))
}

fn build_masks(config: &MaskingConfig, args: &MaskArgs) -> lm_mask::Result<MaskerSet> {
    let mut builder = config.builder();
    if let Some(mask) = &args.mask {
        builder = builder.default_mask(parse_mask(mask));
    }
    if !args.paths.is_empty() {
        builder = builder.mask_paths(args.paths.iter().cloned());
    }
    if !args.values.is_empty() {
        builder = builder.mask_values(args.values.iter().cloned());
    }
    builder.build()
}

fn config_failure(err: &ConfigError) -> ExitCode {
    eprintln!("error: {}", err);
    ExitCode::from(err)
}

fn run_mask(global: &GlobalOpts, args: &MaskArgs) -> ExitCode {
    let resolved = match resolve_config(args.config.as_deref()) {
        Ok(resolved) => resolved,
        Err(err) => return config_failure(&err),
    };
    let masks = match build_masks(&resolved.config, args) {
        Ok(masks) => Arc::new(masks),
        Err(err) => return config_failure(&ConfigError::Rules(err)),
    };
    init(global, Arc::clone(&masks));
    tracing::debug!(source = %resolved.source, "masking config resolved");

    let input: Box<dyn BufRead> = match &args.input {
        Some(path) => match File::open(path) {
            Ok(file) => Box::new(BufReader::new(file)),
            Err(err) => {
                tracing::error!(path = %path.display(), error = %err, "cannot open input");
                eprintln!("error: cannot open {}: {}", path.display(), err);
                return ExitCode::IoError;
            }
        },
        None => Box::new(io::stdin().lock()),
    };

    let stdout = io::stdout();
    match mask_lines(input, BufWriter::new(stdout.lock()), &masks) {
        Ok(count) => {
            tracing::info!(documents = count, "masking complete");
            ExitCode::Clean
        }
        Err(err) => {
            tracing::error!(line = err.line, "masking failed");
            eprintln!("error: {}", err);
            ExitCode::for_mask_error(&err.error)
        }
    }
}

fn run_check(global: &GlobalOpts, args: &CheckArgs) -> ExitCode {
    let resolved: ResolvedConfig = match resolve_config(args.config.as_deref()) {
        Ok(resolved) => resolved,
        Err(err) => {
            let code = ExitCode::from(&err);
            return print_json(&serde_json::json!({
                "status": "error",
                "code": code.code_name(),
                "error": err.to_string(),
            }))
            .and(code);
        }
    };

    match resolved.config.builder().build() {
        Ok(masks) => {
            let stats = masks.stats();
            init(global, Arc::new(masks));
            tracing::debug!(source = %resolved.source, "masking config valid");
            print_json(&serde_json::json!({
                "status": "ok",
                "source": resolved.source,
                "path": resolved.path.as_ref().map(|p| p.display().to_string()),
                "schema_version": resolved.config.schema_version,
                "default_mask": resolved.config.default_mask,
                "maskers": stats,
            }))
        }
        Err(err) => {
            let code = ExitCode::ConfigError;
            print_json(&serde_json::json!({
                "status": "error",
                "code": code.code_name(),
                "source": resolved.source,
                "error": err.to_string(),
            }))
            .and(code)
        }
    }
}

/// Print `value` to stdout. Returns `Clean`, or the code for the failure.
fn print_json(value: &serde_json::Value) -> ExitCode {
    let text = match serde_json::to_string_pretty(value) {
        Ok(text) => text,
        Err(err) => {
            eprintln!("error: cannot render output: {}", err);
            return ExitCode::InternalError;
        }
    };
    match writeln!(io::stdout().lock(), "{}", text) {
        Ok(()) => ExitCode::Clean,
        Err(err) => {
            eprintln!("error: cannot write output: {}", err);
            ExitCode::IoError
        }
    }
}

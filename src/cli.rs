// Command-line front end for fossil-delta.
//
// Subcommands mirror the library surface: create, apply, size, info.
// Paths are optional everywhere; an absent path or `-` means stdin/stdout.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::process;

use clap::{ArgAction, Args, Parser, Subcommand, ValueHint};

use crate::engine::{self, ApplyOptions, CreateOptions};
use crate::format::decoder::InstructionIterator;
use crate::format::digits;
use crate::format::instruction::{DeltaStats, Instruction};
use crate::hash::config::{self, BLOCK_SIZE, DEFAULT_MAX_CANDIDATES, MatcherConfig};
use crate::io::{ApplyStats, CreateStats, apply_stream, create_stream};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

const DEFAULT_LEVEL: u32 = 5;

const BUF_SIZE: usize = 64 * 1024;

// ---------------------------------------------------------------------------
// Clap CLI definition
// ---------------------------------------------------------------------------

/// Fossil delta encoder/decoder.
#[derive(Parser, Debug)]
#[command(
    name = "fossil-delta",
    version,
    about = "Fossil binary delta encoder/decoder",
    arg_required_else_help = true
)]
struct Cli {
    #[command(subcommand)]
    command: Cmd,

    /// Force overwrite existing output files.
    #[arg(short = 'f', long, global = true)]
    force: bool,

    /// Quiet mode (suppress non-error output).
    #[arg(short = 'q', long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Verbose mode (use multiple times for more detail).
    #[arg(short = 'v', long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Output stats as JSON to stderr.
    #[arg(long = "json", global = true)]
    json_output: bool,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Create a delta from a source to a target.
    Create(CreateArgs),
    /// Apply a delta to a source.
    Apply(ApplyArgs),
    /// Print the declared output size of a delta (-1 if malformed).
    Size(PrintArgs),
    /// Print the header, instructions and checksum of a delta.
    Info(PrintArgs),
    /// Print build/configuration details.
    Config,
}

#[derive(Args, Debug)]
struct CreateArgs {
    /// Source file to copy from (default: empty source).
    #[arg(long, short = 's', value_hint = ValueHint::FilePath)]
    source: Option<PathBuf>,

    /// Matching level (0-5: aligned source blocks, 6-9: every source offset).
    #[arg(long, short = 'l', value_parser = clap::value_parser!(u32).range(0..=9), default_value_t = DEFAULT_LEVEL)]
    level: u32,

    /// Candidates examined per target window.
    #[arg(long = "max-candidates", value_parser = clap::value_parser!(u32).range(1..), default_value_t = DEFAULT_MAX_CANDIDATES as u32)]
    max_candidates: u32,

    /// Write output to stdout.
    #[arg(short = 'c', long)]
    stdout: bool,

    /// Check/compute only (do not write output).
    #[arg(long = "check-only")]
    no_output: bool,

    /// Target file (default: stdin).
    #[arg(value_hint = ValueHint::FilePath)]
    input: Option<PathBuf>,

    /// Delta output file (default: stdout).
    #[arg(value_hint = ValueHint::FilePath)]
    output: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct ApplyArgs {
    /// Source file to copy from (default: empty source).
    #[arg(long, short = 's', value_hint = ValueHint::FilePath)]
    source: Option<PathBuf>,

    /// Skip output checksum verification.
    #[arg(long = "no-checksum")]
    no_checksum: bool,

    /// Write output to stdout.
    #[arg(short = 'c', long)]
    stdout: bool,

    /// Check/compute only (do not write output).
    #[arg(long = "check-only")]
    no_output: bool,

    /// Delta file (default: stdin).
    #[arg(value_hint = ValueHint::FilePath)]
    input: Option<PathBuf>,

    /// Output file (default: stdout).
    #[arg(value_hint = ValueHint::FilePath)]
    output: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct PrintArgs {
    /// Delta file (default: stdin).
    #[arg(value_hint = ValueHint::FilePath)]
    input: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// Resolved command + options (flattened from Cli)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Create,
    Apply,
    Size,
    Info,
    Config,
}

#[derive(Debug)]
struct Options {
    command: Command,
    use_stdout: bool,
    force: bool,
    quiet: bool,
    verbose: u8,
    level: u32,
    max_candidates: usize,
    no_checksum: bool,
    no_output: bool,
    source_file: Option<PathBuf>,
    input_file: Option<PathBuf>,
    output_file: Option<PathBuf>,
    json_output: bool,
}

/// `-` stands for stdin/stdout.
fn stdio_path(path: Option<PathBuf>) -> Option<PathBuf> {
    path.filter(|p| p.as_os_str() != "-")
}

fn resolve_options(cli: Cli) -> Options {
    let mut opts = Options {
        command: Command::Config,
        use_stdout: false,
        force: cli.force,
        quiet: cli.quiet,
        verbose: cli.verbose.min(2),
        level: DEFAULT_LEVEL,
        max_candidates: DEFAULT_MAX_CANDIDATES,
        no_checksum: false,
        no_output: false,
        source_file: None,
        input_file: None,
        output_file: None,
        json_output: cli.json_output,
    };

    match cli.command {
        Cmd::Create(args) => {
            opts.command = Command::Create;
            opts.use_stdout = args.stdout;
            opts.level = args.level;
            opts.max_candidates = args.max_candidates as usize;
            opts.no_output = args.no_output;
            opts.source_file = args.source;
            opts.input_file = stdio_path(args.input);
            opts.output_file = stdio_path(args.output);
        }
        Cmd::Apply(args) => {
            opts.command = Command::Apply;
            opts.use_stdout = args.stdout;
            opts.no_checksum = args.no_checksum;
            opts.no_output = args.no_output;
            opts.source_file = args.source;
            opts.input_file = stdio_path(args.input);
            opts.output_file = stdio_path(args.output);
        }
        Cmd::Size(args) => {
            opts.command = Command::Size;
            opts.input_file = stdio_path(args.input);
        }
        Cmd::Info(args) => {
            opts.command = Command::Info;
            opts.input_file = stdio_path(args.input);
        }
        Cmd::Config => {}
    }

    opts
}

#[cfg(any(test, feature = "fuzzing"))]
pub fn fuzz_try_parse_args(args: &[String]) {
    let argv: Vec<String> = std::iter::once("fossil-delta".to_string())
        .chain(args.iter().cloned())
        .collect();
    if let Ok(cli) = Cli::try_parse_from(argv) {
        let opts = resolve_options(cli);
        let _ = build_create_options(&opts);
    }
}

fn build_create_options(opts: &Options) -> CreateOptions {
    CreateOptions {
        matcher: MatcherConfig {
            max_candidates: opts.max_candidates,
            ..config::config_for_level(opts.level)
        },
    }
}

// ---------------------------------------------------------------------------
// Input/output helpers
// ---------------------------------------------------------------------------

fn read_source(path: Option<&Path>) -> Result<Vec<u8>, String> {
    match path {
        Some(path) => {
            std::fs::read(path).map_err(|e| format!("source file: {}: {e}", path.display()))
        }
        None => Ok(Vec::new()),
    }
}

fn open_input(path: Option<&Path>) -> Result<Box<dyn Read>, String> {
    match path {
        Some(path) => match File::open(path) {
            Ok(f) => Ok(Box::new(BufReader::with_capacity(BUF_SIZE, f))),
            Err(e) => Err(format!("input file: {}: {e}", path.display())),
        },
        None => Ok(Box::new(BufReader::new(io::stdin()))),
    }
}

/// Write the finished bytes to the output file or stdout.
///
/// Existing files are only replaced with `-f`.
fn write_output(opts: &Options, data: &[u8]) -> Result<(), String> {
    if opts.no_output {
        return Ok(());
    }
    let mut writer: Box<dyn Write> = match (opts.use_stdout, &opts.output_file) {
        (true, _) | (_, None) => Box::new(BufWriter::with_capacity(BUF_SIZE, io::stdout().lock())),
        (false, Some(path)) => {
            if path.exists() && !opts.force {
                return Err(format!(
                    "output file exists, use -f to overwrite: {}",
                    path.display()
                ));
            }
            match File::create(path) {
                Ok(f) => Box::new(BufWriter::with_capacity(BUF_SIZE, f)),
                Err(e) => return Err(format!("output file: {}: {e}", path.display())),
            }
        }
    };
    writer
        .write_all(data)
        .and_then(|()| writer.flush())
        .map_err(|e| format!("write error: {e}"))
}

fn hex(digest: Option<[u8; 32]>) -> Option<String> {
    digest.map(|d| d.iter().map(|b| format!("{b:02x}")).collect())
}

// ---------------------------------------------------------------------------
// Config command
// ---------------------------------------------------------------------------

fn cmd_config() -> i32 {
    let version = env!("CARGO_PKG_VERSION");
    eprintln!("fossil-delta version {version} (Rust)");

    let file_io = cfg!(feature = "file-io") as u8;
    let parallel = cfg!(feature = "parallel") as u8;
    let ptr_size = std::mem::size_of::<*const ()>();

    eprintln!("FILE_IO={file_io}");
    eprintln!("PARALLEL={parallel}");
    eprintln!("BLOCK_SIZE={BLOCK_SIZE}");
    eprintln!("DEFAULT_LEVEL={DEFAULT_LEVEL}");
    eprintln!("DEFAULT_MAX_CANDIDATES={DEFAULT_MAX_CANDIDATES}");
    eprintln!("sizeof(usize)={ptr_size}");

    0
}

// ---------------------------------------------------------------------------
// Create command
// ---------------------------------------------------------------------------

fn cmd_create(opts: &Options) -> i32 {
    match run_create(opts) {
        Ok(stats) => {
            if opts.verbose > 0 && !opts.quiet {
                eprintln!(
                    "fossil-delta: create: source size: {}, target size: {}, delta size: {}",
                    stats.source_size, stats.target_size, stats.delta_size
                );
            }
            if opts.json_output {
                let json = serde_json::json!({
                    "command": "create",
                    "source_size": stats.source_size,
                    "target_size": stats.target_size,
                    "delta_size": stats.delta_size,
                    "level": opts.level,
                    "source_sha256": hex(stats.source_sha256),
                    "target_sha256": hex(stats.target_sha256),
                });
                eprintln!("{json:#}");
            }
            0
        }
        Err(e) => {
            eprintln!("fossil-delta: {e}");
            1
        }
    }
}

fn run_create(opts: &Options) -> Result<CreateStats, String> {
    let source = read_source(opts.source_file.as_deref())?;
    let target = open_input(opts.input_file.as_deref())?;

    let mut delta = Vec::new();
    let stats = create_stream(
        source.as_slice(),
        target,
        &mut delta,
        &build_create_options(opts),
    )
    .map_err(|e| format!("create: {e}"))?;

    write_output(opts, &delta)?;
    Ok(stats)
}

// ---------------------------------------------------------------------------
// Apply command
// ---------------------------------------------------------------------------

fn cmd_apply(opts: &Options) -> i32 {
    match run_apply(opts) {
        Ok(stats) => {
            if opts.verbose > 0 && !opts.quiet {
                eprintln!(
                    "fossil-delta: apply: source size: {}, delta size: {}, output size: {}",
                    stats.source_size, stats.delta_size, stats.output_size
                );
            }
            if opts.json_output {
                let json = serde_json::json!({
                    "command": "apply",
                    "source_size": stats.source_size,
                    "delta_size": stats.delta_size,
                    "output_size": stats.output_size,
                    "output_sha256": hex(stats.output_sha256),
                });
                eprintln!("{json:#}");
            }
            0
        }
        Err(e) => {
            eprintln!("fossil-delta: {e}");
            1
        }
    }
}

fn run_apply(opts: &Options) -> Result<ApplyStats, String> {
    let source = read_source(opts.source_file.as_deref())?;
    let delta = open_input(opts.input_file.as_deref())?;
    let apply_opts = ApplyOptions {
        verify_checksum: !opts.no_checksum,
    };

    let mut output = Vec::new();
    let stats = apply_stream(source.as_slice(), delta, &mut output, &apply_opts)
        .map_err(|e| format!("apply: {e}"))?;

    write_output(opts, &output)?;
    Ok(stats)
}

// ---------------------------------------------------------------------------
// Size command
// ---------------------------------------------------------------------------

fn cmd_size(opts: &Options) -> i32 {
    let input = match open_input(opts.input_file.as_deref()) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("fossil-delta: {e}");
            return 1;
        }
    };

    // The header is one digit run (leading zeros allowed) plus its newline;
    // stop at the first byte outside the alphabet.
    let mut header = Vec::with_capacity(digits::MAX_DIGITS + 1);
    for byte in input.bytes() {
        match byte {
            Ok(b) => {
                header.push(b);
                if digits::digit_value(b).is_none() {
                    break;
                }
            }
            Err(e) => {
                eprintln!("fossil-delta: read error: {e}");
                return 1;
            }
        }
    }

    let size = engine::output_size(&header);
    println!("{size}");
    if opts.json_output {
        eprintln!("{:#}", serde_json::json!({ "command": "size", "output_size": size }));
    }
    if size < 0 { 1 } else { 0 }
}

// ---------------------------------------------------------------------------
// Info command
// ---------------------------------------------------------------------------

fn cmd_info(opts: &Options) -> i32 {
    let mut delta = Vec::new();
    let read = open_input(opts.input_file.as_deref())
        .and_then(|mut r| r.read_to_end(&mut delta).map_err(|e| format!("read error: {e}")));
    if let Err(e) = read {
        eprintln!("fossil-delta: {e}");
        return 1;
    }

    let mut iter = match InstructionIterator::new(&delta) {
        Ok(iter) => iter,
        Err(e) => {
            eprintln!("fossil-delta: {e}");
            return 1;
        }
    };

    let output_size = iter.output_size();
    println!("Fossil delta length:          {}", delta.len());
    println!("Fossil delta output size:     {output_size}");
    println!("Fossil delta header size:     {}", iter.position());

    let mut stats = DeltaStats {
        output_size,
        ..DeltaStats::default()
    };
    let mut target_offset = 0usize;
    if !opts.quiet {
        println!();
        println!("  Offset Instruction");
    }
    for inst in &mut iter {
        let inst = match inst {
            Ok(inst) => inst,
            Err(e) => {
                eprintln!("fossil-delta: {e}");
                return 1;
            }
        };
        if !opts.quiet {
            print!("  {target_offset:06} {inst}");
            if let Instruction::Insert(data) = inst
                && opts.verbose > 0
            {
                print!("  {:?}", String::from_utf8_lossy(data));
            }
            println!();
        }
        stats.record(&inst);
        target_offset = target_offset.saturating_add(inst.output_len());
    }

    let Some(checksum) = iter.checksum() else {
        eprintln!("fossil-delta: delta is not terminated");
        return 1;
    };
    let trailing = iter.trailing().len();

    if !opts.quiet {
        println!();
    }
    println!("Fossil delta checksum:        {checksum:08X} ({})", digits::to_string(checksum));
    println!("Fossil delta copies:          {} ({} bytes)", stats.copies, stats.copied_bytes);
    println!("Fossil delta inserts:         {} ({} bytes)", stats.inserts, stats.inserted_bytes);
    if trailing > 0 {
        println!("Fossil delta trailing bytes:  {trailing}");
    }
    if target_offset != output_size {
        println!("Fossil delta size mismatch:   instructions produce {target_offset} bytes");
    }

    if opts.json_output {
        let json = serde_json::json!({
            "command": "info",
            "delta_size": delta.len(),
            "output_size": output_size,
            "copies": stats.copies,
            "copied_bytes": stats.copied_bytes,
            "inserts": stats.inserts,
            "inserted_bytes": stats.inserted_bytes,
            "checksum": checksum,
            "trailing_bytes": trailing,
        });
        eprintln!("{json:#}");
    }

    if target_offset == output_size { 0 } else { 1 }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn log_filter(opts: &Options) -> &'static str {
    match (opts.quiet, opts.verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, _) => "debug",
    }
}

/// Main CLI entry point. Parses arguments via clap, dispatches commands.
pub fn run() -> ! {
    let cli = Cli::parse();
    let mut opts = resolve_options(cli);

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_filter(&opts)))
        .format_timestamp(None)
        .format_target(false)
        .init();

    // Warn if -c overrides output filename.
    if opts.use_stdout
        && let Some(path) = opts.output_file.take()
        && !opts.quiet
    {
        eprintln!(
            "fossil-delta: warning: -c option overrides output filename: {}",
            path.display()
        );
    }

    let exit_code = match opts.command {
        Command::Create => cmd_create(&opts),
        Command::Apply => cmd_apply(&opts),
        Command::Size => cmd_size(&opts),
        Command::Info => cmd_info(&opts),
        Command::Config => cmd_config(),
    };

    process::exit(exit_code);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
